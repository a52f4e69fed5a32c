mod chat;
mod render;

use std::time::Duration;

use chat_sync::config::SyncConfig;
use chat_sync::store::{HttpStore, MessageStore};
use chat_sync::reconcile;
use chat_sync::types::MessageList;
use chat_sync::{ChatClient, ChatState, StoreError, ValidationError};
use clap::{Parser, Subcommand};
use time::UtcOffset;
use tracing::Level;

use crate::chat::ChatOptions;
use crate::render::message_lines;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("message store request failed: {0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("invalid UTC offset: {0}")]
    Offset(#[from] time::error::ComponentRange),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "plaza-chat", about = "Plaza group chat terminal client")]
struct Cli {
    /// Messages endpoint. Defaults to CHAT_ENDPOINT or the local store.
    #[arg(long, env = "CHAT_ENDPOINT")]
    endpoint: Option<String>,

    /// Poll cadence in milliseconds.
    #[arg(long, env = "CHAT_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// Log at debug level (to stderr).
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join the room interactively.
    Chat {
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value_t = 20)]
        rows: usize,
        #[arg(long, default_value_t = 72)]
        width: usize,
        /// Hours east of UTC for message clocks.
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        utc_offset: i8,
    },
    /// Print the recent history once.
    List {
        #[arg(long)]
        limit: Option<usize>,
        /// Raw JSON instead of formatted lines.
        #[arg(long)]
        json: bool,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        utc_offset: i8,
    },
    /// Append one message and exit.
    Post {
        #[arg(long)]
        name: Option<String>,
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = resolve_config(SyncConfig::from_env(), cli.endpoint, cli.poll_interval_ms);
    match cli.command {
        Command::Chat { name, rows, width, utc_offset } => {
            let offset = UtcOffset::from_hms(utc_offset, 0, 0)?;
            let store = HttpStore::from_config(&config)?;
            let client = ChatClient::new(store, config);
            chat::run(client, ChatOptions { name, rows, width, offset }).await
        }
        Command::List { limit, json, utc_offset } => {
            let offset = UtcOffset::from_hms(utc_offset, 0, 0)?;
            run_list(&config, limit, json, offset).await
        }
        Command::Post { name, message } => run_post(&config, name.as_deref(), &message).await,
    }
}

/// Command-line flags win over the environment.
fn resolve_config(mut config: SyncConfig, endpoint: Option<String>, poll_interval_ms: Option<u64>) -> SyncConfig {
    if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
        config.endpoint = endpoint;
    }
    if let Some(ms) = poll_interval_ms.filter(|ms| *ms > 0) {
        config.poll_interval = Duration::from_millis(ms);
    }
    config
}

async fn run_list(config: &SyncConfig, limit: Option<usize>, json: bool, offset: UtcOffset) -> Result<(), CliError> {
    let mut store = HttpStore::from_config(config)?;
    if let Some(limit) = limit {
        store = store.with_limit(limit);
    }
    let messages = store.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&MessageList { messages })?);
        return Ok(());
    }

    let mut state = ChatState::default();
    reconcile::apply(&mut state, messages);
    for line in message_lines(&state, 72, offset) {
        println!("{line}");
    }
    Ok(())
}

async fn run_post(config: &SyncConfig, name: Option<&str>, message: &str) -> Result<(), CliError> {
    let body = message.trim();
    if body.is_empty() {
        return Err(CliError::EmptyMessage);
    }
    let author = match name {
        Some(raw) => chat_sync::session::DisplayName::parse(raw)?.as_str().to_owned(),
        None => config.guest_label.clone(),
    };

    let store = HttpStore::from_config(config)?;
    store.append(&author, body).await?;
    eprintln!("sent as {author}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_environment() {
        let config = resolve_config(SyncConfig::default(), Some("http://chat.example/api".to_owned()), Some(250));
        assert_eq!(config.endpoint, "http://chat.example/api");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn blank_or_zero_flags_are_ignored() {
        let base = SyncConfig::default();
        let config = resolve_config(base.clone(), Some("  ".to_owned()), Some(0));
        assert_eq!(config, base);
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["plaza-chat", "--poll-interval-ms", "1000", "chat", "--name", "Ann", "--utc-offset", "-5"]).unwrap();
        assert_eq!(cli.poll_interval_ms, Some(1000));
        match cli.command {
            Command::Chat { name, utc_offset, rows, .. } => {
                assert_eq!(name.as_deref(), Some("Ann"));
                assert_eq!(utc_offset, -5);
                assert_eq!(rows, 20);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn post_requires_message() {
        assert!(Cli::try_parse_from(["plaza-chat", "post", "--name", "Ann"]).is_err());
    }
}
