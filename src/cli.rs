//! Command line arguments and the line-oriented command set of the terminal client.

use anyhow::Context;
use clap::Parser;
use docuchat::config::AppConfig;
use docuchat::connectivity::ConnectionStatus;
use docuchat::types::{ChatMessage, ChatModel, Role, UploadedDocument};
use docuchat::upload::UploadBanner;
use std::path::PathBuf;
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

/// Chat with your documents through a remote retrieval service.
#[derive(Parser, Debug)]
#[command(name = "docuchat", version, about)]
pub struct CliArgs {
    /// Base URL of the document service (overrides DOCUCHAT_API_URL).
    #[arg(short = 'u', long = "api-url")]
    pub api_url: Option<String>,

    /// Model to answer with (gpt-4o, gpt-3.5-turbo).
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Log level (trace, debug, info, warn, error). RUST_LOG wins when set.
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    pub fn apply(&self, config: &mut AppConfig) -> anyhow::Result<()> {
        if let Some(url) = &self.api_url {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = &self.model {
            config.default_model = model.parse::<ChatModel>().context("invalid --model")?;
        }
        Ok(())
    }
}

pub const HELP: &str = "\
Commands:
  /upload <file>...  upload PDF or TXT files
  /docs              list indexed documents
  /model [id]        show or switch the model
  /clear             clear the conversation
  /status            probe the document service again
  /dismiss           hide the upload banner
  /help              show this help
  /quit              exit
Anything else is sent as a question.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Upload(Vec<PathBuf>),
    Docs,
    Model(Option<String>),
    Clear,
    Status,
    Dismiss,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Ask(line.to_string());
    };
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    match name {
        "upload" => Command::Upload(parts.map(PathBuf::from).collect()),
        "docs" => Command::Docs,
        "model" => Command::Model(parts.next().map(str::to_string)),
        "clear" => Command::Clear,
        "status" => Command::Status,
        "dismiss" => Command::Dismiss,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

const MESSAGE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]");

fn format_timestamp(timestamp: OffsetDateTime) -> Option<String> {
    let mut datetime = timestamp;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    datetime.format(MESSAGE_TIME_FORMAT).ok()
}

pub fn format_message(msg: &ChatMessage) -> String {
    let speaker = match (msg.role, msg.is_error) {
        (Role::User, _) => "you",
        (Role::Assistant, false) => "assistant",
        (Role::Assistant, true) => "assistant (error)",
    };
    match format_timestamp(msg.created_at) {
        Some(ts) => format!("[{ts}] {speaker}: {}", msg.content),
        None => format!("{speaker}: {}", msg.content),
    }
}

pub fn format_documents(docs: &[UploadedDocument]) -> String {
    if docs.is_empty() {
        return "No documents uploaded.".to_string();
    }
    let width = docs.iter().map(|doc| doc.name.len()).max().unwrap_or(0).max(9);
    let mut out = format!("{:<width$}  {:>6}  {}", "File Name", "Chunks", "Link");
    for doc in docs {
        out.push('\n');
        out.push_str(&format!(
            "{:<width$}  {:>6}  {}",
            doc.name, doc.chunk_count, doc.location_ref
        ));
    }
    out
}

pub fn format_banner(banner: &UploadBanner) -> String {
    match banner {
        UploadBanner::Success(message) => format!("upload ok: {message}"),
        UploadBanner::Error(message) => format!("upload error: {message}"),
    }
}

pub fn format_status(status: ConnectionStatus, advisory: Option<&str>) -> String {
    match advisory {
        Some(text) => format!("{} - {}", status.label(), text),
        None => status.label().to_string(),
    }
}

pub fn format_models(current: ChatModel) -> String {
    ChatModel::ALL
        .iter()
        .map(|model| {
            let marker = if *model == current { '*' } else { ' ' };
            format!("{marker} {:<14} {}", model.id(), model.label())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("   "), Command::Empty);
        assert_eq!(
            parse_command(" What is the refund policy? "),
            Command::Ask("What is the refund policy?".to_string())
        );
        assert_eq!(
            parse_command("/upload a.pdf notes.txt"),
            Command::Upload(vec![PathBuf::from("a.pdf"), PathBuf::from("notes.txt")])
        );
        assert_eq!(parse_command("/upload"), Command::Upload(Vec::new()));
        assert_eq!(parse_command("/model"), Command::Model(None));
        assert_eq!(
            parse_command("/model gpt-4o"),
            Command::Model(Some("gpt-4o".to_string()))
        );
        assert_eq!(parse_command("/exit"), Command::Quit);
        assert_eq!(parse_command("/nope"), Command::Unknown("nope".to_string()));
    }

    #[test]
    fn test_format_documents_table() {
        let docs = vec![UploadedDocument {
            name: "refunds.pdf".to_string(),
            chunk_count: 4,
            location_ref: "http://localhost:8000/uploads/refunds.pdf".to_string(),
        }];
        let table = format_documents(&docs);
        assert!(table.starts_with("File Name"));
        assert!(table.contains("refunds.pdf"));
        assert!(table.contains("http://localhost:8000/uploads/refunds.pdf"));
        assert_eq!(format_documents(&[]), "No documents uploaded.");
    }

    #[test]
    fn test_format_error_turn() {
        let line = format_message(&ChatMessage::error("boom"));
        assert!(line.contains("assistant (error): boom"));
    }

    #[test]
    fn test_apply_overrides() {
        let args = CliArgs {
            api_url: Some("http://rag.local:9000/".to_string()),
            model: Some("gpt-3.5-turbo".to_string()),
            log_level: None,
        };
        let mut config = AppConfig::default();
        args.apply(&mut config).unwrap();
        assert_eq!(config.api_url, "http://rag.local:9000");
        assert_eq!(config.default_model, ChatModel::Gpt35Turbo);

        let bad = CliArgs {
            api_url: None,
            model: Some("llama".to_string()),
            log_level: None,
        };
        assert!(bad.apply(&mut AppConfig::default()).is_err());
    }
}
