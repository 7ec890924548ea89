//! History normalization: turn caller-supplied history into a provider-ready sequence that starts
//! with a user entry and strictly alternates user/assistant.

use crate::llm::{ChatMessage, Role};

use super::protocol::HistoryEntry;

/// Placeholder user entry inserted when the sequence would otherwise open with the assistant.
pub const CONVERSATION_STARTED: &str = "(conversation started)";

/// Exactly "user" maps to [`Role::User`]; every other role string is assistant.
pub fn coerce_role(role: &str) -> Role {
    if role == "user" {
        Role::User
    } else {
        Role::Assistant
    }
}

/// Build the provider-bound sequence from `history` plus the new `message`.
///
/// Consecutive entries with the same role are merged (joined with a newline) so no content is
/// dropped. `message` is appended as a user entry unless the merged history already ends on one
/// (callers normally include the new message as the last history entry). A leading assistant
/// entry gets [`CONVERSATION_STARTED`] in front of it.
pub fn normalize_history(history: &[HistoryEntry], message: &str) -> Vec<ChatMessage> {
    let mut out: Vec<ChatMessage> = Vec::with_capacity(history.len() + 2);
    for entry in history {
        let role = coerce_role(&entry.role);
        match out.last_mut() {
            Some(prev) if prev.role == role => {
                prev.content.push('\n');
                prev.content.push_str(&entry.content);
            }
            _ => out.push(ChatMessage {
                role,
                content: entry.content.clone(),
            }),
        }
    }

    if out.last().map(|m| m.role) != Some(Role::User) {
        out.push(ChatMessage::user(message));
    }

    if out.first().map(|m| m.role) == Some(Role::Assistant) {
        out.insert(0, ChatMessage::user(CONVERSATION_STARTED));
    }
    out
}
