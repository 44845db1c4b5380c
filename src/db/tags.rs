use sqlx::SqlitePool;
use tracing::{debug, info};

use super::models::Tag;
use crate::error::OukaError;

/// Most choices a slash-command autocomplete can display.
pub const AUTOCOMPLETE_LIMIT: i64 = 25;

/// Tag lifecycle over the `tags` table.
#[derive(Clone)]
pub struct TagStore {
    pool: SqlitePool,
}

impl TagStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new tag. A duplicate name is detected by the primary key
    /// constraint, never by a separate lookup.
    pub async fn create(&self, name: &str, creator_id: i64) -> Result<Tag, OukaError> {
        // commas separate tags on ingestion
        if name.trim().is_empty() || name.contains(',') {
            return Err(OukaError::InvalidTagName);
        }

        let result = sqlx::query("INSERT INTO tags (name, creator_id) VALUES (?, ?)")
            .bind(name)
            .bind(creator_id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => {
                info!(tag = %name, creator_id, "tag created");
                Ok(Tag {
                    name: name.to_string(),
                    creator_id,
                })
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(OukaError::TagExists(name.to_string()))
            }
            Err(source) => Err(OukaError::TagCreationFailed {
                name: name.to_string(),
                source,
            }),
        }
    }

    /// Delete a tag by name. Zero affected rows means it never existed.
    pub async fn delete(&self, name: &str) -> Result<(), OukaError> {
        let result = sqlx::query("DELETE FROM tags WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|source| OukaError::TagDeletionFailed {
                name: name.to_string(),
                source,
            })?;

        if result.rows_affected() == 0 {
            return Err(OukaError::TagDoesNotExist(name.to_string()));
        }
        info!(tag = %name, "tag deleted");
        Ok(())
    }

    pub async fn exists(&self, name: &str) -> Result<bool, OukaError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(OukaError::TagQueryFailed)?;
        Ok(count > 0)
    }

    pub async fn get(&self, name: &str) -> Result<Option<Tag>, OukaError> {
        sqlx::query_as::<_, Tag>("SELECT name, creator_id FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(OukaError::TagQueryFailed)
    }

    /// Tag names containing `query`, for slash-command autocomplete.
    pub async fn autocomplete(&self, query: &str) -> Result<Vec<String>, OukaError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        debug!(query, "autocompleting tag names");

        let pattern = format!("%{}%", escape_like(query));
        sqlx::query_scalar(
            r#"SELECT name FROM tags WHERE name LIKE ? ESCAPE '\' ORDER BY name LIMIT ?"#,
        )
        .bind(pattern)
        .bind(AUTOCOMPLETE_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(OukaError::TagQueryFailed)
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), r"50\%\_off");
        assert_eq!(escape_like("plain"), "plain");
    }
}
