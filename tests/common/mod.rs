#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, Utc};
use ouka2::OukaError;
use ouka2::db::{self, ImageStore, SqlitePool, TagStore};
use ouka2::drive::{Drive, DriveTransport, ImageData};
use ouka2::google_oauth::StoredToken;
use ouka2::service::catalog::ImageCatalog;
use ouka2::service::drive_session::{self, DriveSessionArgs, DriveSessionHandle};
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const OWNER_ID: i64 = 1000;

/// Single connection so every query sees the same in-memory database.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .expect("enable foreign keys");
    db::init_schema(&pool).await.expect("schema");
    pool
}

/// In-process stand-in for Google Drive that counts transfers.
#[derive(Default)]
pub struct FakeTransport {
    objects: Mutex<HashMap<String, ImageData>>,
    next_id: AtomicUsize,
    pub creates: AtomicUsize,
    pub fetches: AtomicUsize,
    pub removes: AtomicUsize,
    pub fail_uploads: AtomicBool,
}

impl FakeTransport {
    pub fn stored(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.objects.lock().unwrap().contains_key(id)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DriveTransport for FakeTransport {
    async fn create(
        &self,
        content: Bytes,
        file_name: &str,
        mime_type: &str,
    ) -> Result<String, OukaError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(OukaError::Oauth2Token("upload refused".to_string()));
        }
        let id = format!("file-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let data = ImageData {
            file_size: content.len(),
            content,
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
        };
        self.objects.lock().unwrap().insert(id.clone(), data);
        Ok(id)
    }

    async fn fetch(&self, file_id: &str) -> Result<ImageData, OukaError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| OukaError::DriveObjectNotFound(file_id.to_string()))
    }

    async fn remove(&self, file_id: &str) -> Result<(), OukaError> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        self.objects.lock().unwrap().remove(file_id);
        Ok(())
    }
}

pub struct Fixture {
    pub pool: SqlitePool,
    pub tags: TagStore,
    pub transport: Arc<FakeTransport>,
    pub drive: Arc<Drive>,
    pub catalog: ImageCatalog,
}

pub async fn fixture() -> Fixture {
    let pool = memory_pool().await;
    let tags = TagStore::new(pool.clone());
    let transport = Arc::new(FakeTransport::default());
    let drive = Arc::new(Drive::new(transport.clone(), 50));
    let catalog = ImageCatalog::new(
        ImageStore::new(pool.clone()),
        tags.clone(),
        drive.clone(),
        OWNER_ID,
    );
    Fixture {
        pool,
        tags,
        transport,
        drive,
        catalog,
    }
}

/// Session actor backed by throwaway secrets; never reaches the network
/// unless a route asks it for a token.
pub async fn session(dir: &tempfile::TempDir) -> DriveSessionHandle {
    let secrets_path = dir.path().join("client_secrets.json");
    std::fs::write(
        &secrets_path,
        r#"{"installed": {"client_id": "cid", "client_secret": "secret"}}"#,
    )
    .expect("write secrets");
    drive_session::spawn(DriveSessionArgs {
        http: reqwest::Client::new(),
        client_secrets_path: secrets_path,
        token_path: dir.path().join("token.json"),
        redirect_url: url::Url::parse("http://localhost:8000/auth/callback").unwrap(),
    })
    .await
    .expect("spawn session")
}

/// Session that already holds a long-lived access token.
pub async fn authorized_session(dir: &tempfile::TempDir, access_token: &str) -> DriveSessionHandle {
    StoredToken {
        access_token: access_token.to_string(),
        refresh_token: Some("refresh".to_string()),
        expiry: Some(Utc::now() + Duration::hours(1)),
        scopes: vec![],
    }
    .save(&dir.path().join("token.json"))
    .await
    .expect("write token");
    session(dir).await
}

pub async fn count_rows(pool: &SqlitePool, sql: &str) -> i64 {
    sqlx::query_scalar(sql).fetch_one(pool).await.expect("count")
}
