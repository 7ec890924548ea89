//! Sign-on screen: screen name + password (the API key) with a simulated connection sequence.
//!
//! Nothing is verified here; a bad key only shows up on the first relay call.

use std::time::{Duration, Instant};

use super::shell::Session;

/// Percentages shown by the progress bar, one per tick.
pub const PROGRESS_STEPS: [u8; 8] = [10, 25, 40, 55, 70, 85, 95, 100];

/// Time between progress ticks. Sign-on completes one tick after the last step.
pub const STEP_INTERVAL: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignOnError {
    #[error("Please enter a Screen Name.")]
    EmptyName,
    #[error("Please enter your password (Anthropic API Key).")]
    EmptyCredential,
}

/// Trim and check both fields.
pub fn validate(screen_name: &str, password: &str) -> Result<Session, SignOnError> {
    let name = screen_name.trim();
    if name.is_empty() {
        return Err(SignOnError::EmptyName);
    }
    let key = password.trim();
    if key.is_empty() {
        return Err(SignOnError::EmptyCredential);
    }
    Ok(Session::new(name, key))
}

/// A running sign-on animation. Progress is a pure function of elapsed time.
#[derive(Debug, Clone)]
pub struct SignOnProgress {
    started: Instant,
    session: Session,
}

impl SignOnProgress {
    pub fn start(session: Session, now: Instant) -> Self {
        Self {
            started: now,
            session,
        }
    }

    fn ticks(&self, now: Instant) -> usize {
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_millis() / STEP_INTERVAL.as_millis()) as usize
    }

    /// Progress bar percentage at `now` (0 before the first tick).
    pub fn percent(&self, now: Instant) -> u8 {
        match self.ticks(now).min(PROGRESS_STEPS.len()) {
            0 => 0,
            n => PROGRESS_STEPS[n - 1],
        }
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        self.ticks(now) > PROGRESS_STEPS.len()
    }

    /// Time until the next tick, for repaint scheduling.
    pub fn until_next_tick(&self, now: Instant) -> Duration {
        let next = self.ticks(now) as u32 + 1;
        (self.started + STEP_INTERVAL * next).saturating_duration_since(now)
    }

    pub fn screen_name(&self) -> &str {
        &self.session.screen_name
    }
}

/// Caption under the progress bar for a given percentage.
pub fn status_caption(percent: u8) -> &'static str {
    if percent < 30 {
        "Connecting..."
    } else if percent < 60 {
        "Verifying name and password..."
    } else if percent < 90 {
        "Starting services..."
    } else {
        "Almost there..."
    }
}

/// Sign-on form state: field contents, last validation error, and the running animation.
#[derive(Debug, Clone, Default)]
pub struct SignOnForm {
    pub screen_name: String,
    pub password: String,
    error: Option<SignOnError>,
    progress: Option<SignOnProgress>,
}

impl SignOnForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self) -> Option<SignOnError> {
        self.error
    }

    pub fn progress(&self) -> Option<&SignOnProgress> {
        self.progress.as_ref()
    }

    pub fn is_signing_on(&self) -> bool {
        self.progress.is_some()
    }

    /// "Sign On" pressed: validate and start the animation. Ignored while already signing on.
    pub fn submit(&mut self, now: Instant) -> Result<(), SignOnError> {
        if self.progress.is_some() {
            return Ok(());
        }
        self.error = None;
        match validate(&self.screen_name, &self.password) {
            Ok(session) => {
                log::debug!("sign-on started for {}", session.screen_name);
                self.progress = Some(SignOnProgress::start(session, now));
                Ok(())
            }
            Err(e) => {
                self.error = Some(e);
                Err(e)
            }
        }
    }

    /// Advance the animation. Returns the session exactly once, when the sequence completes.
    pub fn poll(&mut self, now: Instant) -> Option<Session> {
        let done = self.progress.as_ref().is_some_and(|p| p.is_complete(now));
        if !done {
            return None;
        }
        self.progress.take().map(|p| p.session)
    }
}
