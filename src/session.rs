//! One user session: the three components wired to a shared backend.

use crate::api::RagBackend;
use crate::config::AppConfig;
use crate::connectivity::{ConnectionStatus, ConnectivityMonitor};
use crate::conversation::ConversationSession;
use crate::types::{ChatMessage, ChatModel, UploadedDocument};
use crate::upload::{UploadBanner, UploadOrchestrator};
use std::sync::Arc;

/// Everything the presentation layer needs to draw one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub status: ConnectionStatus,
    pub advisory: Option<&'static str>,
    pub messages: Vec<ChatMessage>,
    pub input: String,
    pub model: ChatModel,
    pub sending: bool,
    pub uploading: bool,
    pub dragging: bool,
    pub documents: Vec<UploadedDocument>,
    pub upload_banner: Option<UploadBanner>,
}

/// Built once per user session.
///
/// Components never touch each other's state; upload and chat may be in
/// flight at the same time.
pub struct Session {
    pub connectivity: ConnectivityMonitor,
    pub uploads: UploadOrchestrator,
    pub conversation: ConversationSession,
}

impl Session {
    pub fn new(backend: Arc<dyn RagBackend>, config: &AppConfig) -> Self {
        Self {
            connectivity: ConnectivityMonitor::new(backend.clone()),
            uploads: UploadOrchestrator::new(backend.clone(), config.max_upload_bytes),
            conversation: ConversationSession::new(backend, config.default_model),
        }
    }

    /// Runs the startup probe.
    pub async fn start(&self) -> ConnectionStatus {
        self.connectivity.check_status().await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.connectivity.status(),
            advisory: self.connectivity.advisory(),
            messages: self.conversation.messages(),
            input: self.conversation.input(),
            model: self.conversation.model(),
            sending: self.conversation.is_sending(),
            uploading: self.uploads.is_uploading(),
            dragging: self.uploads.is_dragging(),
            documents: self.uploads.documents(),
            upload_banner: self.uploads.banner(),
        }
    }
}
