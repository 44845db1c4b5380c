use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

use super::{DriveTransport, ImageData};
use crate::config::{DRIVE_FILES_URL, DRIVE_UPLOAD_URL};
use crate::error::OukaError;
use crate::service::drive_session::DriveSessionHandle;

/// Base URLs of the Drive v3 files and upload collections.
#[derive(Debug, Clone)]
pub struct DriveEndpoints {
    pub files_url: String,
    pub upload_url: String,
}

impl Default for DriveEndpoints {
    fn default() -> Self {
        Self {
            files_url: DRIVE_FILES_URL.to_string(),
            upload_url: DRIVE_UPLOAD_URL.to_string(),
        }
    }
}

/// Google Drive v3 backend. Every request asks the session for a token, so
/// authorization happens lazily on first use.
pub struct GoogleDriveApi {
    client: Client,
    session: DriveSessionHandle,
    parent_folder: String,
    endpoints: DriveEndpoints,
}

#[derive(Deserialize)]
struct CreatedFile {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata {
    name: String,
    mime_type: String,
}

impl GoogleDriveApi {
    pub fn new(
        client: Client,
        session: DriveSessionHandle,
        parent_folder: String,
        endpoints: DriveEndpoints,
    ) -> Self {
        Self {
            client,
            session,
            parent_folder,
            endpoints,
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "{}?uploadType=multipart&fields=id",
            self.endpoints.upload_url
        )
    }

    fn media_url(&self, file_id: &str) -> String {
        format!("{}/{file_id}?alt=media", self.endpoints.files_url)
    }

    fn metadata_url(&self, file_id: &str) -> String {
        format!("{}/{file_id}?fields=name,mimeType", self.endpoints.files_url)
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/{file_id}", self.endpoints.files_url)
    }

    async fn check(
        resp: reqwest::Response,
        operation: &'static str,
        file_id: &str,
    ) -> Result<reqwest::Response, OukaError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(OukaError::DriveObjectNotFound(file_id.to_string()));
        }
        let body = resp.text().await.unwrap_or_default();
        Err(OukaError::DriveStatus {
            operation,
            status,
            body,
        })
    }
}

/// `multipart/related` body: JSON metadata part followed by the media part.
fn multipart_related(boundary: &str, metadata: &[u8], mime_type: &str, content: &[u8]) -> Bytes {
    let mut body = BytesMut::with_capacity(content.len() + metadata.len() + 256);
    body.put_slice(format!("--{boundary}\r\n").as_bytes());
    body.put_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.put_slice(metadata);
    body.put_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.put_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
    body.put_slice(content);
    body.put_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body.freeze()
}

fn new_boundary() -> String {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();
    format!("ouka2-part-{nanos:x}")
}

#[async_trait]
impl DriveTransport for GoogleDriveApi {
    async fn create(
        &self,
        content: Bytes,
        file_name: &str,
        mime_type: &str,
    ) -> Result<String, OukaError> {
        let token = self.session.access_token().await?;
        let metadata = serde_json::to_vec(&json!({
            "name": file_name,
            "parents": [self.parent_folder],
        }))?;
        let boundary = new_boundary();
        let body = multipart_related(&boundary, &metadata, mime_type, &content);

        let resp = self
            .client
            .post(self.upload_url())
            .bearer_auth(&token)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;
        let created: CreatedFile = Self::check(resp, "upload", file_name).await?.json().await?;
        Ok(created.id)
    }

    async fn fetch(&self, file_id: &str) -> Result<ImageData, OukaError> {
        let token = self.session.access_token().await?;

        let resp = self
            .client
            .get(self.media_url(file_id))
            .bearer_auth(&token)
            .send()
            .await?;
        let content = Self::check(resp, "download", file_id).await?.bytes().await?;

        let resp = self
            .client
            .get(self.metadata_url(file_id))
            .bearer_auth(&token)
            .send()
            .await?;
        let meta: FileMetadata = Self::check(resp, "metadata", file_id).await?.json().await?;

        Ok(ImageData {
            file_size: content.len(),
            content,
            file_name: meta.name,
            mime_type: meta.mime_type,
        })
    }

    async fn remove(&self, file_id: &str) -> Result<(), OukaError> {
        let token = self.session.access_token().await?;
        let resp = self
            .client
            .delete(self.file_url(file_id))
            .bearer_auth(&token)
            .send()
            .await?;
        match Self::check(resp, "delete", file_id).await {
            // already gone
            Ok(_) | Err(OukaError::DriveObjectNotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
