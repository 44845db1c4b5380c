//! Payloads accepted by the command gateway.

use serde::Deserialize;

pub type UserId = i64;

#[derive(Debug, Deserialize)]
pub struct CreateTagCommand {
    pub name: String,
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmCreateCommand {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct AutocompleteQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct IngestQuery {
    pub user_id: UserId,
    pub file_name: String,
    /// Comma separated tag names.
    #[serde(default)]
    pub tags: String,
}

impl IngestQuery {
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct ListImagesQuery {
    pub tag: String,
}

#[derive(Debug, Deserialize)]
pub struct RequesterQuery {
    pub user_id: UserId,
}
