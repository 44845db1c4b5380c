use serde::{Deserialize, Serialize};

use crate::error::OukaError;

/// Framework-neutral answer to a command, rendered by the chat front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub content: String,
    pub ephemeral: bool,
    /// Tag name the front-end should offer a "Create" button for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_create: Option<String>,
}

impl Reply {
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
            offer_create: None,
        }
    }

    pub fn tag_created(name: &str) -> Self {
        Self::ephemeral(format!("Tag `{name}` created successfully! 🎉"))
    }

    pub fn tag_deleted(name: &str) -> Self {
        Self::ephemeral(format!("Tag `{name}` deleted successfully! 🎉"))
    }

    pub fn from_error(err: &OukaError) -> Self {
        let mut reply = Self::ephemeral(err.user_message());
        if let OukaError::TagDoesNotExist(name) = err {
            reply.offer_create = Some(name.clone());
        }
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tag_reply_offers_creation() {
        let reply = Reply::from_error(&OukaError::TagDoesNotExist("cute".into()));
        assert_eq!(reply.offer_create.as_deref(), Some("cute"));
        assert!(reply.content.contains("`cute` does not exist"));
        assert!(reply.ephemeral);
    }

    #[test]
    fn internal_errors_collapse_to_generic_text() {
        let reply = Reply::from_error(&OukaError::TagQueryFailed(sqlx::Error::PoolTimedOut));
        assert_eq!(
            reply.content,
            "❌ An error occurred while processing your request. ❌"
        );
        assert!(reply.offer_create.is_none());
    }
}
