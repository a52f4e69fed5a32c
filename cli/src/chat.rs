//! Interactive chat session on stdin/stdout.
//!
//! Three event sources drive the loop: lines typed on stdin, state changes
//! published by the client, and completions of background sends. Sends run off
//! the loop so the pane keeps redrawing while one is in flight.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use chat_sync::send::SkipReason;
use chat_sync::state::SendState;
use chat_sync::{ChatClient, ChatState, HttpStore, SendOutcome};
use time::UtcOffset;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::CliError;
use crate::render::Pane;

const CLEAR: &str = "\x1b[2J\x1b[H";

/// Shown when a line arrives while the previous message is still in flight.
pub const STILL_SENDING: &str = "still sending…, type that line again once it goes through";

/// What one stdin line asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum InputCommand {
    Quit,
    ScrollUp,
    ScrollDown,
    /// Blank line: resubmit whatever the composer still holds.
    Retry,
    Text(String),
}

impl InputCommand {
    #[must_use]
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "/quit" | "/q" => Self::Quit,
            "/up" => Self::ScrollUp,
            "/down" => Self::ScrollDown,
            "" => Self::Retry,
            _ => Self::Text(line.trim_end_matches(['\r', '\n']).to_owned()),
        }
    }
}

pub struct ChatOptions {
    pub name: Option<String>,
    pub rows: usize,
    pub width: usize,
    pub offset: UtcOffset,
}

/// Run until `/quit` or end of input. The poll loop is stopped on the way out.
///
/// # Errors
///
/// Terminal I/O failures. Store failures never end the session.
pub async fn run(client: ChatClient<HttpStore>, options: ChatOptions) -> Result<(), CliError> {
    let mut pane = Pane::new(options.rows, options.width, options.offset);
    let mut footer: Option<String> = None;

    if let Some(name) = options.name.as_deref() {
        if let Err(error) = client.submit_name(name) {
            footer = Some(error.to_string());
        }
    }

    let mut changes = client.subscribe();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut sends: JoinSet<SendOutcome> = JoinSet::new();

    draw(&mut stdout, &mut pane, &client, footer.as_deref()).await?;

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            line = stdin.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                footer = None;
                match InputCommand::parse(&line) {
                    InputCommand::Quit => break,
                    InputCommand::ScrollUp => pane.scroll_up(),
                    InputCommand::ScrollDown => pane.scroll_down(),
                    InputCommand::Retry if client.state().identity.is_set() => {
                        footer = busy_notice(&client.state());
                        if footer.is_none() {
                            let client = client.clone();
                            sends.spawn(async move { client.submit().await });
                        }
                    }
                    InputCommand::Retry => {}
                    InputCommand::Text(text) if client.state().identity.is_set() => {
                        footer = busy_notice(&client.state());
                        if footer.is_none() {
                            let client = client.clone();
                            sends.spawn(async move { client.send(&text).await });
                        }
                    }
                    InputCommand::Text(text) => {
                        if let Err(error) = client.submit_name(&text) {
                            footer = Some(error.to_string());
                        }
                    }
                }
            }
            Some(done) = sends.join_next() => {
                match done {
                    Ok(SendOutcome::Skipped(SkipReason::InFlight)) => footer = Some(STILL_SENDING.to_owned()),
                    Ok(outcome) => debug!(?outcome, "send finished"),
                    Err(error) => debug!(%error, "send task ended early"),
                }
            }
        }
        draw(&mut stdout, &mut pane, &client, footer.as_deref()).await?;
    }

    client.deactivate();
    sends.shutdown().await;
    info!("chat session closed");
    Ok(())
}

/// Footer for a line that cannot be sent yet. The terminal cannot disable
/// input, so the line is dropped and the user is told to retype it.
fn busy_notice(state: &ChatState) -> Option<String> {
    (state.send == SendState::Sending).then(|| STILL_SENDING.to_owned())
}

async fn draw(
    out: &mut tokio::io::Stdout,
    pane: &mut Pane,
    client: &ChatClient<HttpStore>,
    footer: Option<&str>,
) -> Result<(), CliError> {
    let frame = pane.render(&client.state(), footer);
    let mut buf = String::from(CLEAR);
    for line in frame {
        buf.push_str(&line);
        buf.push('\n');
    }
    out.write_all(buf.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}
