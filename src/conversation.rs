//! The conversation log and the single-flight send.

use crate::api::{ChatRequest, HistoryTurn, RagBackend};
use crate::flight::InFlight;
use crate::types::{ChatMessage, ChatModel};
use std::cell::{Cell, RefCell};
use std::sync::Arc;

/// Content of the assistant turn appended when a send fails.
pub const SEND_FAILURE_TEXT: &str =
    "Sorry, I encountered an error processing your request. Please try again.";

pub const EMPTY_LOG_HINT: &str = "Upload documents and start chatting!";

/// Why a send was refused. A refused send changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendRejected {
    #[error("a message is already being sent")]
    Busy,

    #[error("message cannot be empty")]
    EmptyQuestion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Answered,
    /// The error turn was appended.
    Failed,
}

/// Builds the `history` payload: every prior turn except error turns.
pub fn history_payload(log: &[ChatMessage]) -> Vec<HistoryTurn> {
    log.iter()
        .filter(|msg| !msg.is_error)
        .map(|msg| HistoryTurn {
            role: msg.role,
            content: msg.content.clone(),
        })
        .collect()
}

pub struct ConversationSession {
    backend: Arc<dyn RagBackend>,
    messages: RefCell<Vec<ChatMessage>>,
    input: RefCell<String>,
    model: Cell<ChatModel>,
    sending: Cell<bool>,
    // Bumped whenever the log is truncated.
    generation: Cell<u64>,
}

impl ConversationSession {
    pub fn new(backend: Arc<dyn RagBackend>, model: ChatModel) -> Self {
        Self {
            backend,
            messages: RefCell::new(Vec::new()),
            input: RefCell::new(String::new()),
            model: Cell::new(model),
            sending: Cell::new(false),
            generation: Cell::new(0),
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }

    /// Counts completed clears. Renderers compare it to notice a truncated log.
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    pub fn is_sending(&self) -> bool {
        self.sending.get()
    }

    pub fn model(&self) -> ChatModel {
        self.model.get()
    }

    pub fn set_model(&self, model: ChatModel) {
        self.model.set(model);
    }

    pub fn input(&self) -> String {
        self.input.borrow().clone()
    }

    pub fn set_input(&self, text: impl Into<String>) {
        *self.input.borrow_mut() = text.into();
    }

    /// Sends whatever is in the input buffer.
    pub async fn submit(&self) -> Result<SendOutcome, SendRejected> {
        let text = self.input();
        self.send(&text).await
    }

    /// Appends the question, asks the service and appends the reply.
    ///
    /// The user turn is appended before the request goes out. Transport and
    /// service errors become an error turn; they are only logged, never
    /// returned. The reply is appended even if the log was cleared meanwhile.
    pub async fn send(&self, question: &str) -> Result<SendOutcome, SendRejected> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SendRejected::EmptyQuestion);
        }
        let Some(_flight) = InFlight::begin(&self.sending) else {
            return Err(SendRejected::Busy);
        };

        let history = history_payload(&self.messages.borrow());
        self.messages
            .borrow_mut()
            .push(ChatMessage::user(question));
        self.input.borrow_mut().clear();

        let request = ChatRequest {
            question: question.to_string(),
            model: self.model.get().id().to_string(),
            history,
        };
        let result = self.backend.chat(&request).await;

        let (reply, outcome) = match result {
            Ok(answer) => (ChatMessage::assistant(answer), SendOutcome::Answered),
            Err(err) => {
                tracing::error!("chat request failed: {}", err);
                (ChatMessage::error(SEND_FAILURE_TEXT), SendOutcome::Failed)
            }
        };
        self.messages.borrow_mut().push(reply);
        Ok(outcome)
    }

    /// Asks the service to forget the conversation, then empties the local log
    /// whatever the service said.
    pub async fn clear(&self) {
        if let Err(err) = self.backend.clear().await {
            tracing::warn!("remote conversation reset failed: {}", err);
        }
        self.messages.borrow_mut().clear();
        self.generation.set(self.generation.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_history_skips_error_turns() {
        let log = vec![
            ChatMessage::user("first"),
            ChatMessage::error(SEND_FAILURE_TEXT),
            ChatMessage::user("second"),
            ChatMessage::assistant("answer"),
        ];
        let history = history_payload(&log);
        assert_eq!(
            history,
            vec![
                HistoryTurn {
                    role: Role::User,
                    content: "first".to_string()
                },
                HistoryTurn {
                    role: Role::User,
                    content: "second".to_string()
                },
                HistoryTurn {
                    role: Role::Assistant,
                    content: "answer".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_history_of_empty_log() {
        assert!(history_payload(&[]).is_empty());
    }
}
