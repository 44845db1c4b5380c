use chrono::{DateTime, Duration, Utc};
use oauth2::TokenResponse;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::error::OukaError;

/// Tokens this close to expiry are treated as already expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// One OAuth client entry of a Google `client_secrets.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub fn from_json(contents: &str) -> Result<Self, OukaError> {
        let file: ClientSecretsFile = serde_json::from_str(contents)?;
        file.installed
            .or(file.web)
            .ok_or(OukaError::MissingClientSecrets)
    }

    pub async fn load(path: &Path) -> Result<Self, OukaError> {
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_json(&contents)
    }
}

/// Token persisted between runs so consent is only asked for once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    /// `token` is what Python google-auth writes.
    #[serde(alias = "token")]
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl StoredToken {
    /// Build from a token endpoint response. Refresh responses usually omit
    /// the refresh token, so the previous one is carried over.
    pub fn from_response<T: TokenResponse>(resp: &T, previous_refresh: Option<String>) -> Self {
        let expiry = resp
            .expires_in()
            .and_then(|d| Duration::from_std(d).ok())
            .map(|d| Utc::now() + d);
        Self {
            access_token: resp.access_token().secret().to_string(),
            refresh_token: resp
                .refresh_token()
                .map(|t| t.secret().to_string())
                .or(previous_refresh),
            expiry,
            scopes: resp
                .scopes()
                .map(|s| s.iter().map(|scope| scope.as_str().to_string()).collect())
                .unwrap_or_default(),
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_SKEW_SECS) > now,
            None => false,
        }
    }

    /// Read the token file. A missing or unreadable file means "not yet
    /// authorized" rather than a startup failure.
    pub async fn load(path: &Path) -> Option<Self> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no stored Drive token");
                return None;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read Drive token");
                return None;
            }
        };
        serde_json::from_str(&contents)
            .inspect_err(|e| {
                warn!(path = %path.display(), error = %e, "ignoring malformed Drive token")
            })
            .ok()
    }

    pub async fn save(&self, path: &Path) -> Result<(), OukaError> {
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        Ok(())
    }
}
