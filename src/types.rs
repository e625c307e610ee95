use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation log.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Set only on the synthetic assistant turn produced by a failed send.
    pub is_error: bool,
    pub created_at: OffsetDateTime,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), false)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into(), false)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into(), true)
    }

    fn new(role: Role, content: String, is_error: bool) -> Self {
        Self {
            role,
            content,
            is_error,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Metadata for one file the document service has indexed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub name: String,
    #[serde(rename = "chunks")]
    pub chunk_count: u64,
    #[serde(rename = "url")]
    pub location_ref: String,
}

/// Models the chat endpoint accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChatModel {
    #[default]
    Gpt4o,
    Gpt35Turbo,
}

impl ChatModel {
    pub const ALL: [ChatModel; 2] = [ChatModel::Gpt4o, ChatModel::Gpt35Turbo];

    /// Identifier sent in the `model` field of a chat request.
    pub fn id(self) -> &'static str {
        match self {
            ChatModel::Gpt4o => "gpt-4o",
            ChatModel::Gpt35Turbo => "gpt-3.5-turbo",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChatModel::Gpt4o => "GPT-4o",
            ChatModel::Gpt35Turbo => "GPT-3.5 Turbo",
        }
    }
}

impl fmt::Display for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown model: {0}")]
pub struct UnknownModel(pub String);

impl FromStr for ChatModel {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ChatModel::ALL
            .into_iter()
            .find(|model| model.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownModel(wanted.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_round_trips_through_id() {
        for model in ChatModel::ALL {
            assert_eq!(model.id().parse::<ChatModel>(), Ok(model));
        }
        assert_eq!(" GPT-4O ".parse::<ChatModel>(), Ok(ChatModel::Gpt4o));
        assert!("claude".parse::<ChatModel>().is_err());
    }

    #[test]
    fn test_uploaded_document_wire_names() {
        let doc: UploadedDocument = serde_json::from_str(
            r#"{"name":"refunds.pdf","chunks":12,"url":"http://localhost:8000/uploads/refunds.pdf"}"#,
        )
        .unwrap();
        assert_eq!(doc.name, "refunds.pdf");
        assert_eq!(doc.chunk_count, 12);
        assert_eq!(doc.location_ref, "http://localhost:8000/uploads/refunds.pdf");
    }

    #[test]
    fn test_error_turn_is_assistant() {
        let msg = ChatMessage::error("oops");
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.is_error);
        assert!(!ChatMessage::assistant("fine").is_error);
    }
}
