//! Terminal rendering of the chat view.
//!
//! Pure functions from [`ChatState`] to lines of text. The [`Pane`] keeps the
//! scroll position between frames and lets the anchor pull it back to the
//! newest message whenever the tail changes.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use chat_sync::ChatState;
use chat_sync::scroll::{ScrollAnchor, Viewport};
use chat_sync::state::{Alignment, Connectivity, Notice, SendState, Surface};
use time::UtcOffset;

pub const NAME_PROMPT: &str = "Enter your name to join the chat:";
pub const LOADING: &str = "Loading…";
pub const EMPTY_ROOM: &str = "No messages yet";

/// Scrollable message pane plus status and composer lines.
#[derive(Debug)]
pub struct Pane {
    anchor: ScrollAnchor,
    viewport: Viewport,
    width: usize,
    offset: UtcOffset,
}

impl Pane {
    #[must_use]
    pub fn new(rows: usize, width: usize, offset: UtcOffset) -> Self {
        Self { anchor: ScrollAnchor::default(), viewport: Viewport::new(rows.max(1)), width: width.max(8), offset }
    }

    pub fn scroll_up(&mut self) {
        self.viewport.scroll_up(self.page());
    }

    pub fn scroll_down(&mut self) {
        self.viewport.scroll_down(self.page());
    }

    fn page(&self) -> usize {
        (self.viewport.rows / 2).max(1)
    }

    /// Lay out one frame. `footer` is an extra line for local errors.
    pub fn render(&mut self, state: &ChatState, footer: Option<&str>) -> Vec<String> {
        let mut out = Vec::new();

        if state.surface() == Surface::NamePrompt {
            out.push(NAME_PROMPT.to_owned());
            out.extend(footer.map(str::to_owned));
            return out;
        }

        let lines = message_lines(state, self.width, self.offset);
        self.viewport.set_content_rows(lines.len());
        self.anchor.follow(&state.messages, &mut self.viewport);

        if state.is_loading() {
            out.push(LOADING.to_owned());
        } else if lines.is_empty() {
            out.push(EMPTY_ROOM.to_owned());
        } else {
            out.extend(lines[self.viewport.visible()].iter().cloned());
        }

        out.push("─".repeat(self.width));
        out.push(status_line(state));
        out.push(format!("> {}", state.input));
        out.extend(footer.map(str::to_owned));
        out
    }
}

/// Every message as display rows: a header with author and clock, then the
/// wrapped body. Own messages are right-aligned.
#[must_use]
pub fn message_lines(state: &ChatState, width: usize, offset: UtcOffset) -> Vec<String> {
    let bubble = (width * 3 / 4).max(1);
    let mut out = Vec::new();

    for message in &state.messages {
        let clock = message.clock_label(offset);
        let header = if clock.is_empty() {
            message.author.clone()
        } else {
            format!("{} · {clock}", message.author)
        };

        let mut rows = vec![header];
        rows.extend(wrap(&message.body, bubble).into_iter().map(|line| format!("  {line}")));

        match state.alignment(message) {
            Alignment::Start => out.extend(rows),
            Alignment::End => out.extend(rows.into_iter().map(|row| format!("{row:>width$}"))),
        }
    }
    out
}

/// Connectivity and send status under the pane.
#[must_use]
pub fn status_line(state: &ChatState) -> String {
    let mut line = match state.connectivity {
        Connectivity::Connecting => "connecting…".to_owned(),
        Connectivity::Online => "online".to_owned(),
        Connectivity::Degraded => "offline, retrying".to_owned(),
    };
    if let Some(name) = state.identity.name() {
        line.push_str(&format!(" · {name}"));
    }
    if state.send == SendState::Sending {
        line.push_str(" · sending…");
    }
    if state.notice == Some(Notice::SendFailed) {
        line.push_str(" · message not sent, press Enter to retry");
    }
    line
}

/// Hard-wrap `text` into rows of at most `width` characters.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut rows = Vec::new();
    for line in text.lines() {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            rows.push(String::new());
            continue;
        }
        rows.extend(chars.chunks(width).map(|chunk| chunk.iter().collect::<String>()));
    }
    if rows.is_empty() {
        rows.push(String::new());
    }
    rows
}
