//! Desktop shell: the single owner of session state, open windows and focus order.
//!
//! Signed-out → signed-in only through [`DesktopShell::sign_in`] with a validated session;
//! [`DesktopShell::sign_off`] drops everything. Views get a cloned [`Session`], never a
//! reference back into the shell.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use super::chat::ChatView;
use super::window::{HitTarget, Point, Size, WindowSpec, WindowState};
use crate::relay::BOT_NAME;

/// z-index of the bottom-most window; each rank above adds one.
pub const BASE_Z_INDEX: u32 = 10;

/// Signed-in identity. The credential is the provider API key; it is never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub screen_name: String,
    credential: String,
}

impl Session {
    pub fn new(screen_name: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            screen_name: screen_name.into(),
            credential: credential.into(),
        }
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("screen_name", &self.screen_name)
            .field("credential", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WindowId {
    BuddyList,
    Chat,
}

impl WindowId {
    /// Initial geometry for each window kind.
    pub fn spec(self) -> WindowSpec {
        match self {
            WindowId::BuddyList => WindowSpec {
                position: Point::new(40.0, 40.0),
                size: Size::new(200.0, 420.0),
                min_size: Size::new(160.0, 250.0),
                resizable: true,
            },
            WindowId::Chat => WindowSpec {
                position: Point::new(280.0, 60.0),
                size: Size::new(480.0, 450.0),
                min_size: Size::new(350.0, 300.0),
                resizable: true,
            },
        }
    }

    /// Only the chat window has a close button; the buddy list goes away via Sign Off.
    pub fn closable(self) -> bool {
        matches!(self, WindowId::Chat)
    }

    /// Label on the taskbar button.
    pub fn taskbar_label(self) -> &'static str {
        match self {
            WindowId::BuddyList => "Buddy List",
            WindowId::Chat => BOT_NAME,
        }
    }
}

/// Buddy list contents state: one "Buddies" group that can be collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuddyListView {
    buddies_expanded: bool,
}

impl Default for BuddyListView {
    fn default() -> Self {
        Self {
            buddies_expanded: true,
        }
    }
}

impl BuddyListView {
    pub fn buddies_expanded(&self) -> bool {
        self.buddies_expanded
    }

    pub fn toggle_buddies(&mut self) {
        self.buddies_expanded = !self.buddies_expanded;
    }

    /// The one static contact: (name, tagline).
    pub fn buddies(&self) -> &'static [(&'static str, &'static str)] {
        &[(BOT_NAME, crate::relay::BOT_TAGLINE)]
    }
}

/// State for everything behind the sign-on screen.
struct SignedIn {
    session: Session,
    buddy_list: BuddyListView,
    chat: Option<ChatView>,
    windows: BTreeMap<WindowId, WindowState>,
    /// Back to front; the last entry is topmost. Only open windows appear here.
    focus_order: Vec<WindowId>,
}

/// Top-level UI state machine over {signed-out, signed-in}.
#[derive(Default)]
pub struct DesktopShell {
    signed_in: Option<SignedIn>,
}

impl DesktopShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_signed_in(&self) -> bool {
        self.signed_in.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.signed_in.as_ref().map(|s| &s.session)
    }

    /// Enter the desktop with the buddy list open. Replaces any previous session.
    pub fn sign_in(&mut self, session: Session) {
        log::info!("signed on as {}", session.screen_name);
        let mut windows = BTreeMap::new();
        windows.insert(
            WindowId::BuddyList,
            WindowState::new(WindowId::BuddyList.spec()),
        );
        self.signed_in = Some(SignedIn {
            session,
            buddy_list: BuddyListView::default(),
            chat: None,
            windows,
            focus_order: vec![WindowId::BuddyList],
        });
    }

    /// Back to the sign-on screen; clears the session and closes every window.
    pub fn sign_off(&mut self) {
        if let Some(s) = self.signed_in.take() {
            log::info!("signed off {}", s.session.screen_name);
        }
    }

    /// Open the chat window (or keep the existing one) and order focus as [buddy list, chat].
    pub fn open_chat(&mut self, now: Instant) {
        let Some(s) = self.signed_in.as_mut() else {
            return;
        };
        if s.chat.is_none() {
            s.chat = Some(ChatView::new(&s.session, BOT_NAME, now));
            s.windows
                .insert(WindowId::Chat, WindowState::new(WindowId::Chat.spec()));
        }
        s.focus_order = vec![WindowId::BuddyList, WindowId::Chat];
    }

    /// Close the chat window; its transcript is discarded.
    pub fn close_chat(&mut self) {
        if let Some(s) = self.signed_in.as_mut() {
            s.chat = None;
            s.windows.remove(&WindowId::Chat);
            s.focus_order.retain(|id| *id != WindowId::Chat);
        }
    }

    /// Move an open window to the top of the focus order.
    pub fn bring_to_front(&mut self, id: WindowId) {
        let Some(s) = self.signed_in.as_mut() else {
            return;
        };
        if !s.windows.contains_key(&id) {
            return;
        }
        s.focus_order.retain(|w| *w != id);
        s.focus_order.push(id);
    }

    /// Open windows back to front (render order).
    pub fn focus_order(&self) -> &[WindowId] {
        self.signed_in
            .as_ref()
            .map(|s| s.focus_order.as_slice())
            .unwrap_or(&[])
    }

    pub fn topmost(&self) -> Option<WindowId> {
        self.focus_order().last().copied()
    }

    pub fn is_open(&self, id: WindowId) -> bool {
        self.focus_order().contains(&id)
    }

    /// Strictly increasing in focus rank; None for closed windows.
    pub fn z_index(&self, id: WindowId) -> Option<u32> {
        self.focus_order()
            .iter()
            .position(|w| *w == id)
            .map(|rank| BASE_Z_INDEX + rank as u32)
    }

    pub fn window(&self, id: WindowId) -> Option<&WindowState> {
        self.signed_in.as_ref().and_then(|s| s.windows.get(&id))
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut WindowState> {
        self.signed_in.as_mut().and_then(|s| s.windows.get_mut(&id))
    }

    /// Route a pointer-down to a window and raise it when the window asks for focus.
    pub fn pointer_down(&mut self, id: WindowId, target: HitTarget, pointer: Point) {
        let focus = match self.window_mut(id) {
            Some(w) => w.pointer_down(target, pointer),
            None => return,
        };
        if focus {
            self.bring_to_front(id);
        }
    }

    /// Pointer moved on the desktop; every window applies it to its own grab (if any).
    pub fn pointer_moved(&mut self, pointer: Point) {
        if let Some(s) = self.signed_in.as_mut() {
            for w in s.windows.values_mut() {
                w.pointer_moved(pointer);
            }
        }
    }

    pub fn pointer_released(&mut self) {
        if let Some(s) = self.signed_in.as_mut() {
            for w in s.windows.values_mut() {
                w.pointer_released();
            }
        }
    }

    pub fn buddy_list(&self) -> Option<&BuddyListView> {
        self.signed_in.as_ref().map(|s| &s.buddy_list)
    }

    pub fn buddy_list_mut(&mut self) -> Option<&mut BuddyListView> {
        self.signed_in.as_mut().map(|s| &mut s.buddy_list)
    }

    pub fn chat(&self) -> Option<&ChatView> {
        self.signed_in.as_ref().and_then(|s| s.chat.as_ref())
    }

    pub fn chat_mut(&mut self) -> Option<&mut ChatView> {
        self.signed_in.as_mut().and_then(|s| s.chat.as_mut())
    }

    /// Close button on the chat window: closes only when the chat view confirms.
    pub fn request_close_chat(&mut self) -> bool {
        let close = match self.chat_mut() {
            Some(chat) => chat.request_close(),
            None => return false,
        };
        if close {
            self.close_chat();
        }
        close
    }
}

/// Taskbar clock text, e.g. "3:07 PM".
pub fn clock_label<Tz: chrono::TimeZone>(now: &chrono::DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    now.format("%-I:%M %p").to_string()
}

/// Taskbar clock for the current local time.
pub fn taskbar_clock() -> String {
    clock_label(&chrono::Local::now())
}
