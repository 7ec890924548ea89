//! Client-side UI state: sign-on form, desktop shell with its window manager, buddy list and chat
//! view. Everything here is plain state driven by explicit events and `Instant`s; rendering lives
//! in the desktop crate.

pub mod chat;
pub mod shell;
pub mod signon;
pub mod window;

pub use chat::{
    enter_action, error_reply_text, format_time, ChatView, EnterAction, Message, SenderKind,
};
pub use shell::{clock_label, taskbar_clock, BuddyListView, DesktopShell, Session, WindowId};
pub use signon::{status_caption, validate, SignOnError, SignOnForm, SignOnProgress};
pub use window::{HitTarget, Point, PointerMode, Size, WindowSpec, WindowState};
