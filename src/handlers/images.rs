use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::{TypedHeader, headers::ContentType};

use crate::db::{DbImage, ImageRecord};
use crate::error::OukaError;
use crate::middleware::auth::RequireKeyAuth;
use crate::router::OukaState;
use crate::service::catalog::NewImage;
use crate::types::commands::{IngestQuery, ListImagesQuery, RequesterQuery};
use crate::types::reply::Reply;

/// POST /images?user_id=&file_name=&tags=a,b with the raw image as body.
pub async fn ingest(
    _auth: RequireKeyAuth,
    State(state): State<OukaState>,
    Query(q): Query<IngestQuery>,
    TypedHeader(content_type): TypedHeader<ContentType>,
    body: Bytes,
) -> Result<(StatusCode, Json<ImageRecord>), OukaError> {
    let tags = q.tag_list();
    let mime_type = content_type.to_string();
    let record = state
        .catalog
        .add(NewImage {
            content: body,
            user_id: q.user_id,
            file_name: &q.file_name,
            mime_type: &mime_type,
            tags: &tags,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /images?tag=
pub async fn list_by_tag(
    _auth: RequireKeyAuth,
    State(state): State<OukaState>,
    Query(q): Query<ListImagesQuery>,
) -> Result<Json<Vec<DbImage>>, OukaError> {
    Ok(Json(state.catalog.by_tag(&q.tag).await?))
}

/// GET /images/{id} -> raw bytes.
pub async fn download(
    _auth: RequireKeyAuth,
    State(state): State<OukaState>,
    Path(id): Path<String>,
) -> Result<Response, OukaError> {
    let (_record, data) = state.catalog.fetch(&id).await?;
    let disposition = format!(
        "inline; filename=\"{}\"",
        header_safe_file_name(&data.file_name)
    );
    Ok((
        [
            (header::CONTENT_TYPE, data.mime_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data.content,
    )
        .into_response())
}

/// DELETE /images/{id}?user_id=
pub async fn remove(
    _auth: RequireKeyAuth,
    State(state): State<OukaState>,
    Path(id): Path<String>,
    Query(q): Query<RequesterQuery>,
) -> Result<Json<Reply>, OukaError> {
    state.catalog.remove(&id, q.user_id).await?;
    Ok(Json(Reply::ephemeral(format!("Image `{id}` removed. 🗑️"))))
}

fn header_safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
