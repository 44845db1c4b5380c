use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::{DbImage, ImageRecord, ImageStore, TagStore};
use crate::drive::{Drive, ImageData};
use crate::error::OukaError;

/// Coordinates the remote object store with the local image metadata.
#[derive(Clone)]
pub struct ImageCatalog {
    images: ImageStore,
    tags: TagStore,
    drive: Arc<Drive>,
    owner_id: i64,
}

/// A new image as handed over by the front-end.
pub struct NewImage<'a> {
    pub content: Bytes,
    pub user_id: i64,
    pub file_name: &'a str,
    pub mime_type: &'a str,
    pub tags: &'a [String],
}

impl ImageCatalog {
    pub fn new(images: ImageStore, tags: TagStore, drive: Arc<Drive>, owner_id: i64) -> Self {
        Self {
            images,
            tags,
            drive,
            owner_id,
        }
    }

    /// Upload, then record the image and its tags in one transaction.
    ///
    /// Nothing is written locally unless the upload succeeded. If the local
    /// write fails the uploaded object is deleted again so no orphan stays
    /// behind; a failed compensation is only logged.
    pub async fn add(&self, new: NewImage<'_>) -> Result<ImageRecord, OukaError> {
        let file_size = new.content.len() as i64;
        let id = self
            .drive
            .upload(new.content, new.file_name, new.mime_type)
            .await?;

        let mut tags: Vec<String> = Vec::with_capacity(new.tags.len());
        for tag in new.tags {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }

        let image = DbImage {
            id: id.clone(),
            user_id: new.user_id,
            file_name: new.file_name.to_string(),
            mime_type: new.mime_type.to_string(),
            file_size,
            created_at: Utc::now(),
        };

        if let Err(source) = self.images.insert_with_tags(&image, &tags).await {
            warn!(image_id = %id, error = %source, "metadata insert failed; removing upload");
            if let Err(e) = self.drive.delete(&id).await {
                warn!(image_id = %id, error = %e, "compensating delete failed; remote object orphaned");
            }
            return Err(OukaError::IngestionFailed {
                image_id: id,
                source,
            });
        }

        info!(image_id = %id, user_id = new.user_id, tags = tags.len(), "image ingested");
        Ok(ImageRecord { image, tags })
    }

    pub async fn get(&self, id: &str) -> Result<ImageRecord, OukaError> {
        let image = self
            .images
            .get(id)
            .await?
            .ok_or_else(|| OukaError::ImageNotFound(id.to_string()))?;
        let tags = self.images.tags_of(id).await?;
        Ok(ImageRecord { image, tags })
    }

    /// Record plus content, served from the download cache when possible.
    pub async fn fetch(&self, id: &str) -> Result<(ImageRecord, ImageData), OukaError> {
        let record = self.get(id).await?;
        let data = self.drive.download(id).await?;
        Ok((record, data))
    }

    pub async fn by_tag(&self, tag: &str) -> Result<Vec<DbImage>, OukaError> {
        if !self.tags.exists(tag).await? {
            return Err(OukaError::TagDoesNotExist(tag.to_string()));
        }
        Ok(self.images.by_tag(tag).await?)
    }

    /// Owner-only. The row goes first so a failed remote delete leaves an
    /// orphaned object rather than a row pointing at nothing.
    pub async fn remove(&self, id: &str, requester_id: i64) -> Result<(), OukaError> {
        ensure_owner(requester_id, self.owner_id)?;
        if !self.images.delete(id).await? {
            return Err(OukaError::ImageNotFound(id.to_string()));
        }
        self.drive.delete(id).await?;
        info!(image_id = %id, "image removed");
        Ok(())
    }
}

pub fn ensure_owner(user_id: i64, owner_id: i64) -> Result<(), OukaError> {
    if user_id != owner_id {
        return Err(OukaError::NotOwner(user_id));
    }
    Ok(())
}
