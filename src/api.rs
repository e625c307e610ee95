//! Client side of the document service.
//!
//! The service owns parsing, chunking, embedding and generation; this crate
//! only talks to it through [`RagBackend`]. [`HttpBackend`] is the reqwest
//! implementation used by the binary; tests script their own backend.
mod http;

pub use http::HttpBackend;

use crate::types::{Role, UploadedDocument};
use crate::upload::LocalFile;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("service error {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Status { status: u16, detail: Option<String> },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("service reported status {0:?}")]
    NotActive(String),
}

impl ApiError {
    /// Human-readable detail supplied by the service, if it sent one.
    pub fn user_detail(&self) -> Option<&str> {
        match self {
            ApiError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Body of `GET /`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct StatusReport {
    pub status: String,
    #[serde(default)]
    pub llm_ready: bool,
}

/// Body of a successful `POST /upload`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    pub message: String,
    /// The whole indexed corpus, not just the files of this batch.
    #[serde(default)]
    pub files: Vec<UploadedDocument>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryTurn {
    pub role: Role,
    pub content: String,
}

/// Body of `POST /chat`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub question: String,
    pub model: String,
    pub history: Vec<HistoryTurn>,
}

#[async_trait]
pub trait RagBackend: Send + Sync {
    async fn status(&self) -> ApiResult<StatusReport>;

    /// Sends the whole batch as one multipart request.
    async fn upload(&self, files: &[LocalFile]) -> ApiResult<UploadReceipt>;

    /// Returns the answer text.
    async fn chat(&self, request: &ChatRequest) -> ApiResult<String>;

    /// Drops whatever conversational memory the service holds.
    async fn clear(&self) -> ApiResult<()>;
}
