use sqlx::SqlitePool;

use super::models::DbImage;

/// Image rows and their `image_tags` associations.
///
/// Methods return raw `sqlx::Error`; the catalogue decides which domain
/// error a failure becomes.
#[derive(Clone)]
pub struct ImageStore {
    pool: SqlitePool,
}

impl ImageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the image row and one join row per tag in a single transaction.
    pub async fn insert_with_tags(
        &self,
        image: &DbImage,
        tags: &[String],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO images (id, user_id, file_name, mime_type, file_size, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&image.id)
        .bind(image.user_id)
        .bind(&image.file_name)
        .bind(&image.mime_type)
        .bind(image.file_size)
        .bind(image.created_at)
        .execute(&mut *tx)
        .await?;

        for tag in tags {
            sqlx::query("INSERT INTO image_tags (image_id, tag_id) VALUES (?, ?)")
                .bind(&image.id)
                .bind(tag)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Option<DbImage>, sqlx::Error> {
        sqlx::query_as::<_, DbImage>(
            r#"SELECT id, user_id, file_name, mime_type, file_size, created_at
               FROM images WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn tags_of(&self, id: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT tag_id FROM image_tags WHERE image_id = ? ORDER BY tag_id")
            .bind(id)
            .fetch_all(&self.pool)
            .await
    }

    /// Images carrying `tag`, newest first.
    pub async fn by_tag(&self, tag: &str) -> Result<Vec<DbImage>, sqlx::Error> {
        sqlx::query_as::<_, DbImage>(
            r#"SELECT i.id, i.user_id, i.file_name, i.mime_type, i.file_size, i.created_at
               FROM images i
               JOIN image_tags t ON t.image_id = i.id
               WHERE t.tag_id = ?
               ORDER BY i.created_at DESC, i.id"#,
        )
        .bind(tag)
        .fetch_all(&self.pool)
        .await
    }

    /// Returns false when no row matched.
    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
