//! Remote image storage: the Drive transport and the cached client in front
//! of it.

mod api;
mod cache;

pub use api::{DriveEndpoints, GoogleDriveApi};
pub use cache::LruCache;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::error::OukaError;

/// A downloaded object together with its remote metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub content: Bytes,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: usize,
}

/// Raw transfers against a remote object store. Identifiers are opaque and
/// chosen by the store.
#[async_trait]
pub trait DriveTransport: Send + Sync {
    async fn create(
        &self,
        content: Bytes,
        file_name: &str,
        mime_type: &str,
    ) -> Result<String, OukaError>;
    async fn fetch(&self, file_id: &str) -> Result<ImageData, OukaError>;
    async fn remove(&self, file_id: &str) -> Result<(), OukaError>;
}

/// Drive client with a bounded download cache keyed by remote identifier.
pub struct Drive {
    transport: Arc<dyn DriveTransport>,
    cache: Mutex<LruCache<ImageData>>,
}

impl Drive {
    pub fn new(transport: Arc<dyn DriveTransport>, cache_size: usize) -> Self {
        Self {
            transport,
            cache: Mutex::new(LruCache::new(cache_size)),
        }
    }

    /// Upload under the configured folder. No retry; failures propagate.
    pub async fn upload(
        &self,
        content: Bytes,
        file_name: &str,
        mime_type: &str,
    ) -> Result<String, OukaError> {
        let id = self.transport.create(content, file_name, mime_type).await?;
        debug!(file_id = %id, file_name, "uploaded to Drive");
        Ok(id)
    }

    /// Download through the cache. Entries are never revalidated; a changed
    /// remote object stays stale until evicted or deleted through here.
    pub async fn download(&self, file_id: &str) -> Result<ImageData, OukaError> {
        let cached = self.lock_cache().get(file_id);
        if let Some(hit) = cached {
            debug!(file_id, "download cache hit");
            return Ok(hit);
        }

        let data = self.transport.fetch(file_id).await?;
        let evicted = self.lock_cache().insert(file_id.to_string(), data.clone());
        if let Some(evicted) = evicted {
            debug!(evicted = %evicted, "download cache evicted entry");
        }
        Ok(data)
    }

    pub async fn delete(&self, file_id: &str) -> Result<(), OukaError> {
        self.transport.remove(file_id).await?;
        self.lock_cache().remove(file_id);
        Ok(())
    }

    pub fn is_cached(&self, file_id: &str) -> bool {
        self.lock_cache().contains(file_id)
    }

    fn lock_cache(&self) -> MutexGuard<'_, LruCache<ImageData>> {
        // the cache holds no invariant a panicking holder could break
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
