mod cli;

use clap::Parser;
use cli::{CliArgs, Command, HELP, parse_command};
use docuchat::conversation::{EMPTY_LOG_HINT, SendOutcome, SendRejected};
use docuchat::types::ChatModel;
use docuchat::upload::{LocalFile, UploadError, UploadOutcome};
use docuchat::{AppConfig, HttpBackend, Session};
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

fn init_tracing(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("info")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// How much of the log has reached the terminal.
#[derive(Default)]
struct Printed {
    generation: u64,
    count: usize,
}

/// Prints turns appended since the last call, starting over after a clear.
fn print_new_messages(session: &Session, printed: &mut Printed) {
    let generation = session.conversation.generation();
    if generation != printed.generation {
        *printed = Printed {
            generation,
            count: 0,
        };
    }
    let messages = session.conversation.messages();
    for msg in messages.iter().skip(printed.count) {
        println!("{}", cli::format_message(msg));
    }
    printed.count = messages.len();
}

async fn upload_paths(session: &Session, paths: Vec<PathBuf>) -> String {
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        match LocalFile::read(path).await {
            Ok(file) => files.push(file),
            Err(err) => return format!("upload error: {err}"),
        }
    }
    match session.uploads.upload(files).await {
        Ok(UploadOutcome::Accepted { .. }) => {
            let snapshot = session.snapshot();
            let mut out = snapshot
                .upload_banner
                .as_ref()
                .map(cli::format_banner)
                .unwrap_or_default();
            out.push('\n');
            out.push_str(&cli::format_documents(&snapshot.documents));
            out
        }
        Ok(UploadOutcome::Failed { detail }) => format!("upload error: {detail}"),
        Err(UploadError::EmptyBatch) => "usage: /upload <file>...".to_string(),
        Err(err) => format!("upload error: {err}"),
    }
}

async fn ask(session: &Session, question: String) -> String {
    match session.conversation.send(&question).await {
        Ok(SendOutcome::Answered | SendOutcome::Failed) => String::new(),
        Err(SendRejected::Busy) => "still waiting for the previous answer".to_string(),
        Err(SendRejected::EmptyQuestion) => String::new(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_level.as_deref());

    let mut config = AppConfig::from_env()?;
    args.apply(&mut config)?;
    tracing::info!("docuchat v{} using {}", env!("CARGO_PKG_VERSION"), config.api_url);

    let backend = Arc::new(HttpBackend::new(&config.api_url, config.request_timeout)?);
    let session = Session::new(backend, &config);
    let session = &session;

    let status = session.start().await;
    println!(
        "{}",
        cli::format_status(status, session.connectivity.advisory())
    );
    println!("{EMPTY_LOG_HINT} Type /help for commands.");

    let mut printed = Printed::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight: FuturesUnordered<LocalBoxFuture<'_, String>> = FuturesUnordered::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Command::Ask(question) => {
                        in_flight.push(ask(session, question).boxed_local());
                    }
                    Command::Upload(paths) => {
                        in_flight.push(upload_paths(session, paths).boxed_local());
                    }
                    Command::Clear => {
                        in_flight.push(
                            async move {
                                session.conversation.clear().await;
                                "conversation cleared".to_string()
                            }
                            .boxed_local(),
                        );
                    }
                    Command::Status => {
                        in_flight.push(
                            async move {
                                let status = session.connectivity.check_status().await;
                                cli::format_status(status, session.connectivity.advisory())
                            }
                            .boxed_local(),
                        );
                    }
                    Command::Docs => println!("{}", cli::format_documents(&session.uploads.documents())),
                    Command::Model(None) => println!("{}", cli::format_models(session.conversation.model())),
                    Command::Model(Some(id)) => match id.parse::<ChatModel>() {
                        Ok(model) => {
                            session.conversation.set_model(model);
                            println!("model set to {}", model.label());
                        }
                        Err(err) => println!("{err}"),
                    },
                    Command::Dismiss => session.uploads.dismiss_banner(),
                    Command::Help => println!("{HELP}"),
                    Command::Quit => break,
                    Command::Empty => {}
                    Command::Unknown(name) => println!("unknown command /{name}, try /help"),
                }
                print_new_messages(session, &mut printed);
            }
            Some(report) = in_flight.next(), if !in_flight.is_empty() => {
                print_new_messages(session, &mut printed);
                if !report.is_empty() {
                    println!("{report}");
                }
            }
        }
    }

    if !in_flight.is_empty() {
        tracing::info!("exiting with {} request(s) still in flight", in_flight.len());
    }
    Ok(())
}
