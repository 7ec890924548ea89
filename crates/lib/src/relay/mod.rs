//! Chat relay: stateless HTTP endpoint between chat clients and the language-model provider.
//!
//! Each `POST /api/chat` carries the message, screen name, API key and prior history. The relay
//! repairs the history into a user-first, strictly alternating sequence, adds the persona prompt,
//! calls the provider once and returns `{ reply }` or a classified `{ error }`.

mod history;
mod persona;
mod protocol;
mod server;

pub use history::{coerce_role, normalize_history, CONVERSATION_STARTED};
pub use persona::{system_prompt, BOT_NAME, BOT_TAGLINE, CONFUSED_REPLY, GREETING};
pub use protocol::{HistoryEntry, RelayErrorBody, RelayReply, RelayRequest};
pub use server::{
    classify_provider_error, parse_request, relay_chat, router, run_relay, serve, RelayError, RelayState,
};
