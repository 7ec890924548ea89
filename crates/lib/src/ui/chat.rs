//! Chat view state: transcript, compose box, typing indicator, relay request building and the
//! two-click close confirmation.
//!
//! The view never performs I/O. [`ChatView::submit`] hands back the [`RelayRequest`] to send and
//! the caller feeds the outcome into [`ChatView::receive_reply`].

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use super::shell::Session;
use crate::relay::{HistoryEntry, RelayRequest, GREETING};

/// Delay before the greeting's typing indicator appears.
pub const GREETING_DELAY: Duration = Duration::from_millis(500);

/// How long the typing indicator shows before the greeting lands.
pub const GREETING_TYPING: Duration = Duration::from_millis(1200);

/// Most recent messages sent as history with each request.
pub const HISTORY_WINDOW: usize = 20;

pub const CLOSE_WARNING: &str =
    "Are you sure you want to close this conversation? Click the close button again to confirm.";

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: u64,
    pub sender: String,
    pub text: String,
    pub timestamp: DateTime<Local>,
    /// Fixed when the line is added; display names can collide.
    pub kind: SenderKind,
    /// The canned opening line, synthesized locally.
    pub greeting: bool,
}

/// Who wrote a transcript line; drives the sender color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderKind {
    Me,
    Buddy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Greeting {
    Waiting { typing_at: Instant },
    Typing { lands_at: Instant },
    Done,
}

pub struct ChatView {
    session: Session,
    buddy: String,
    messages: Vec<Message>,
    next_id: u64,
    /// Compose box contents; edited directly by the renderer.
    pub input: String,
    greeting: Greeting,
    in_flight: bool,
    close_armed: bool,
}

impl ChatView {
    pub fn new(session: &Session, buddy: impl Into<String>, now: Instant) -> Self {
        Self {
            session: session.clone(),
            buddy: buddy.into(),
            messages: Vec::new(),
            next_id: 1,
            input: String::new(),
            greeting: Greeting::Waiting {
                typing_at: now + GREETING_DELAY,
            },
            in_flight: false,
            close_armed: false,
        }
    }

    pub fn buddy(&self) -> &str {
        &self.buddy
    }

    pub fn screen_name(&self) -> &str {
        &self.session.screen_name
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn close_armed(&self) -> bool {
        self.close_armed
    }

    /// Window title, e.g. "WiserChild - Instant Message".
    pub fn title(&self) -> String {
        format!("{} - Instant Message", self.buddy)
    }

    /// Advance the greeting timers.
    pub fn tick(&mut self, now: Instant) {
        if let Greeting::Waiting { typing_at } = self.greeting {
            if now >= typing_at {
                self.greeting = Greeting::Typing {
                    lands_at: typing_at + GREETING_TYPING,
                };
            }
        }
        if let Greeting::Typing { lands_at } = self.greeting {
            if now >= lands_at {
                self.greeting = Greeting::Done;
                let buddy = self.buddy.clone();
                self.push(buddy, SenderKind::Buddy, GREETING.to_string(), true);
            }
        }
    }

    /// Next instant at which [`ChatView::tick`] changes something, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.greeting {
            Greeting::Waiting { typing_at } => Some(typing_at),
            Greeting::Typing { lands_at } => Some(lands_at),
            Greeting::Done => None,
        }
    }

    /// "<buddy> is typing..." shown while the greeting is being typed or a reply is outstanding.
    pub fn typing_visible(&self) -> bool {
        self.in_flight || matches!(self.greeting, Greeting::Typing { .. })
    }

    /// Send is enabled only with non-blank input and nothing outstanding.
    pub fn can_send(&self) -> bool {
        !self.in_flight && !self.input.trim().is_empty()
    }

    /// Compose box edited; any keystroke disarms a pending close confirmation.
    pub fn on_input_changed(&mut self) {
        self.close_armed = false;
    }

    /// Submit the compose box. Returns the relay request to send, or None when the input is
    /// blank or a request is already outstanding (nothing changes in that case).
    pub fn submit(&mut self) -> Option<RelayRequest> {
        if self.in_flight {
            return None;
        }
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return None;
        }
        let sender = self.session.screen_name.clone();
        self.push(sender, SenderKind::Me, text.clone(), false);
        self.input.clear();
        self.in_flight = true;
        Some(RelayRequest {
            message: Some(text),
            screen_name: Some(self.session.screen_name.clone()),
            api_key: Some(self.session.credential().to_string()),
            history: Some(self.history()),
        })
    }

    /// Trailing window of the transcript (new message included) as role-tagged entries.
    pub fn history(&self) -> Vec<HistoryEntry> {
        let eligible: Vec<&Message> = self
            .messages
            .iter()
            .filter(|m| !m.greeting || m.kind == SenderKind::Buddy)
            .collect();
        let start = eligible.len().saturating_sub(HISTORY_WINDOW);
        eligible[start..]
            .iter()
            .map(|m| {
                let role = if m.kind == SenderKind::Me {
                    "user"
                } else {
                    "assistant"
                };
                HistoryEntry::new(role, m.text.clone())
            })
            .collect()
    }

    /// Outcome of the outstanding relay call. Failures become an ordinary bot message.
    pub fn receive_reply<E: fmt::Display>(&mut self, result: Result<String, E>) {
        self.in_flight = false;
        let text = match result {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("relay call failed: {}", e);
                error_reply_text(&e.to_string())
            }
        };
        let buddy = self.buddy.clone();
        self.push(buddy, SenderKind::Buddy, text, false);
    }

    /// Close button pressed. Returns true when the window should close now; otherwise the
    /// confirmation banner is armed and the window stays open.
    pub fn request_close(&mut self) -> bool {
        if self.messages.len() > 1 && !self.close_armed {
            self.close_armed = true;
            return false;
        }
        true
    }

    pub fn sender_kind(&self, message: &Message) -> SenderKind {
        message.kind
    }

    /// Status line text: "Last message received at <time>" or "--" when empty.
    pub fn last_message_label(&self) -> String {
        let when = self
            .messages
            .last()
            .map(|m| format_time(&m.timestamp))
            .unwrap_or_else(|| "--".to_string());
        format!("Last message received at {}", when)
    }

    fn push(&mut self, sender: String, kind: SenderKind, text: String, greeting: bool) {
        self.messages.push(Message {
            id: self.next_id,
            sender,
            text,
            timestamp: Local::now(),
            kind,
            greeting,
        });
        self.next_id += 1;
    }
}

/// Transcript timestamp, e.g. "3:07:42 PM".
pub fn format_time<Tz: chrono::TimeZone>(t: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    t.format("%-I:%M:%S %p").to_string()
}

/// Bot message shown in place of a reply when the relay call fails.
pub fn error_reply_text(reason: &str) -> String {
    format!(
        "Oops! Something went wrong. 😬\n\n{}\n\nMake sure your API key is valid!",
        reason
    )
}

/// What Enter does in the compose box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterAction {
    Submit,
    Newline,
}

/// Plain Enter sends; Shift+Enter inserts a line break.
pub fn enter_action(shift_held: bool) -> EnterAction {
    if shift_held {
        EnterAction::Newline
    } else {
        EnterAction::Submit
    }
}
