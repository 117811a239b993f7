//! Foreground/background signal handling and the collaborator ports the
//! engine calls out to.

use crate::core::event::{Event, LifecycleEvent, Visibility};
use crate::core::session::Session;
use std::sync::mpsc::Sender;
use tracing::{debug, info};

/// Turns raw visibility observations into transition events.
///
/// Hosts often report the same visibility more than once; only changes are
/// forwarded, so each real transition reaches the engine exactly once.
#[derive(Debug)]
pub struct LifecycleSignal {
    current: Visibility,
    sink: Sender<Event>,
}

impl LifecycleSignal {
    /// Start in the foreground, posting transitions to `sink`.
    #[must_use]
    pub fn new(sink: Sender<Event>) -> Self {
        Self {
            current: Visibility::Foreground,
            sink,
        }
    }

    /// Last observed visibility.
    #[must_use]
    pub fn current(&self) -> Visibility {
        self.current
    }

    /// Record an observation. Returns the transition it produced, if any.
    pub fn observe(&mut self, visibility: Visibility) -> Option<LifecycleEvent> {
        let transition = match (self.current, visibility) {
            (Visibility::Foreground, Visibility::Background) => LifecycleEvent::EnteredBackground,
            (Visibility::Background, Visibility::Foreground) => LifecycleEvent::EnteredForeground,
            _ => {
                debug!(?visibility, "duplicate visibility observation");
                return None;
            }
        };

        self.current = transition.target();
        if self.sink.send(Event::Lifecycle(transition)).is_err() {
            debug!(?transition, "engine loop gone; lifecycle event dropped");
        }
        Some(transition)
    }
}

/// Asks the user whether a background-paused session should resume.
///
/// The request is fire-and-forget; the answer comes back later as
/// [`Event::ResumeAnswer`].
pub trait ResumePrompt {
    /// Ask for confirmation.
    fn request_confirmation(&mut self, remaining_seconds: u32, distraction_count: u32);
}

/// Prompt that never asks; the session stays paused until `resume()`.
#[derive(Debug, Default)]
pub struct NoPrompt;

impl ResumePrompt for NoPrompt {
    fn request_confirmation(&mut self, remaining_seconds: u32, distraction_count: u32) {
        debug!(
            remaining_seconds,
            distraction_count, "resume confirmation requested with no prompt attached"
        );
    }
}

/// Outbound notifications. All hooks default to no-ops.
pub trait Notifier {
    /// A countdown ran to zero and the session was saved.
    fn session_completed(&mut self, _session: &Session) {}

    /// The user left the app and a distraction was counted.
    fn distraction_recorded(&mut self, _distraction_count: u32) {}
}

/// Notifier that writes to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn session_completed(&mut self, session: &Session) {
        info!(
            category = %session.category,
            duration_seconds = session.duration_seconds,
            "focus time is done"
        );
    }

    fn distraction_recorded(&mut self, distraction_count: u32) {
        info!(distraction_count, "session paused, distraction counted");
    }
}
