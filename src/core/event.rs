//! Events consumed by the engine loop.

/// One elapsed interval from an armed clock.
///
/// `epoch` identifies the arming that produced the tick, so ticks still queued
/// after a disarm can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Arming generation that scheduled this tick.
    pub epoch: u64,
}

/// Host application visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// App is in front of the user.
    Foreground,
    /// User has left the app.
    Background,
}

/// A foreground/background transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// foreground → background.
    EnteredBackground,
    /// background → foreground.
    EnteredForeground,
}

impl LifecycleEvent {
    /// Visibility after the transition.
    #[must_use]
    pub fn target(self) -> Visibility {
        match self {
            Self::EnteredBackground => Visibility::Background,
            Self::EnteredForeground => Visibility::Foreground,
        }
    }
}

/// User action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Begin a session.
    Start {
        /// Category label.
        category: String,
        /// Countdown length.
        minutes: u32,
    },
    /// Pause a running session.
    Pause,
    /// Resume a paused session.
    Resume,
    /// Finish early and save.
    Stop,
    /// Discard without saving.
    Reset,
    /// Re-attempt a failed save.
    RetrySave,
}

impl Command {
    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
            Self::Reset => "reset",
            Self::RetrySave => "retry_save",
        }
    }
}

/// Everything the engine loop can receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Clock tick.
    Tick(Tick),
    /// Visibility change.
    Lifecycle(LifecycleEvent),
    /// Answer to a resume confirmation request.
    ResumeAnswer(bool),
    /// User action.
    Command(Command),
    /// Stop the loop.
    Shutdown,
}
