use axum::{Json, http::StatusCode, response::IntoResponse};
use oauth2::basic::BasicErrorResponseType;
use oauth2::reqwest::Error as ReqwestClientError;
use oauth2::{HttpClientError, RequestTokenError, StandardErrorResponse};
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

use crate::types::reply::Reply;

#[derive(Debug, ThisError)]
pub enum OukaError {
    #[error("Tag '{0}' already exists.")]
    TagExists(String),

    #[error("Tag '{0}' does not exist.")]
    TagDoesNotExist(String),

    #[error("Tag name must be non-empty and free of commas")]
    InvalidTagName,

    #[error("Failed to create tag '{name}': {source}")]
    TagCreationFailed {
        name: String,
        #[source]
        source: SqlxError,
    },

    #[error("Failed to delete tag '{name}': {source}")]
    TagDeletionFailed {
        name: String,
        #[source]
        source: SqlxError,
    },

    #[error("Failed to query tags: {0}")]
    TagQueryFailed(#[source] SqlxError),

    #[error("Failed to record image '{image_id}': {source}")]
    IngestionFailed {
        image_id: String,
        #[source]
        source: SqlxError,
    },

    #[error("Image '{0}' not found")]
    ImageNotFound(String),

    #[error("User {0} is not the owner of this bot")]
    NotOwner(i64),

    #[error("Drive object '{0}' not found")]
    DriveObjectNotFound(String),

    #[error("Drive {operation} failed with status {status}: {body}")]
    DriveStatus {
        operation: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("OAuth2 token request error: {0}")]
    Oauth2Token(String),

    #[error("OAuth2 server error: {error}")]
    Oauth2Server { error: String },

    #[error("OAuth flow error: {0}")]
    OauthFlow(String),

    #[error("Client secrets file has neither an `installed` nor a `web` client")]
    MissingClientSecrets,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Ractor error: {0}")]
    Ractor(String),
}

const GENERIC_MESSAGE: &str = "❌ An error occurred while processing your request. ❌";

impl OukaError {
    /// Text shown to the person who issued the command.
    ///
    /// Only the kinds a user can act on get their own wording; everything
    /// else collapses into one generic message so internals never leak.
    pub fn user_message(&self) -> String {
        match self {
            OukaError::TagExists(name) => format!(
                "❌ Tag `{name}` already exists. Please choose a different name. ❌"
            ),
            OukaError::TagDoesNotExist(name) => format!(
                "❌ Tag `{name}` does not exist. Please check the name and try again. ❌"
            ),
            OukaError::NotOwner(_) => {
                "❌ You are not the owner of this bot. You cannot use this command. ❌".to_string()
            }
            _ => GENERIC_MESSAGE.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            OukaError::TagExists(_) => StatusCode::CONFLICT,
            OukaError::TagDoesNotExist(_)
            | OukaError::ImageNotFound(_)
            | OukaError::DriveObjectNotFound(_) => StatusCode::NOT_FOUND,
            OukaError::InvalidTagName => StatusCode::BAD_REQUEST,
            OukaError::NotOwner(_) => StatusCode::FORBIDDEN,
            OukaError::Oauth2Token(_)
            | OukaError::Oauth2Server { .. }
            | OukaError::OauthFlow(_) => StatusCode::UNAUTHORIZED,
            OukaError::DriveStatus { .. } | OukaError::Reqwest(_) | OukaError::UrlParse(_) => {
                StatusCode::BAD_GATEWAY
            }
            OukaError::TagCreationFailed { .. }
            | OukaError::TagDeletionFailed { .. }
            | OukaError::TagQueryFailed(_)
            | OukaError::IngestionFailed { .. }
            | OukaError::MissingClientSecrets
            | OukaError::Json(_)
            | OukaError::Io(_)
            | OukaError::Database(_)
            | OukaError::Ractor(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl
    From<
        RequestTokenError<
            HttpClientError<ReqwestClientError>,
            StandardErrorResponse<BasicErrorResponseType>,
        >,
    > for OukaError
{
    fn from(
        e: RequestTokenError<
            HttpClientError<ReqwestClientError>,
            StandardErrorResponse<BasicErrorResponseType>,
        >,
    ) -> Self {
        match e {
            RequestTokenError::ServerResponse(err) => OukaError::Oauth2Server {
                error: err.error().to_string(),
            },
            RequestTokenError::Request(req_e) => {
                OukaError::Oauth2Token(format!("request failed: {}", req_e))
            }
            RequestTokenError::Parse(parse_err, _body) => OukaError::Json(parse_err.into_inner()),
            RequestTokenError::Other(s) => OukaError::Oauth2Token(s),
        }
    }
}

impl IntoResponse for OukaError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "command failed");
        }
        (status, Json(Reply::from_error(&self))).into_response()
    }
}
