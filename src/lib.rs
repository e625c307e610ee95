//! Client core for chatting with uploaded documents.
//!
//! A [`Session`] owns the conversation log, the uploaded-document list and the
//! connectivity state. Retrieval and generation happen in a remote service
//! reached through [`api::RagBackend`].

pub mod api;
pub mod config;
pub mod connectivity;
pub mod conversation;
mod flight;
pub mod session;
pub mod types;
pub mod upload;

pub use api::{ApiError, HttpBackend, RagBackend};
pub use config::AppConfig;
pub use session::{Session, SessionSnapshot};
