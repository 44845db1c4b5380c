use crate::db::TagStore;
use crate::error::OukaError;
use crate::types::reply::Reply;

/// `/tags create`.
pub async fn create(tags: &TagStore, name: &str, user_id: i64) -> Result<Reply, OukaError> {
    tags.create(name, user_id).await?;
    Ok(Reply::tag_created(name))
}

/// `/tags delete`. A missing tag surfaces as `TagDoesNotExist`, whose reply
/// carries the "Create" offer.
pub async fn delete(tags: &TagStore, name: &str) -> Result<Reply, OukaError> {
    tags.delete(name).await?;
    Ok(Reply::tag_deleted(name))
}

/// The "Create" button shown after a failed delete. Someone may have created
/// the tag in the meantime, which is answered as a normal reply.
pub async fn confirm_create(
    tags: &TagStore,
    name: &str,
    user_id: i64,
) -> Result<Reply, OukaError> {
    if tags.exists(name).await? {
        return Ok(Reply::from_error(&OukaError::TagExists(name.to_string())));
    }
    create(tags, name, user_id).await
}
