//! Session state machine.
//!
//! The engine owns the in-progress session and is the only thing that arms or
//! disarms the clock. Every input (tick, visibility change, prompt answer,
//! user command) is applied one at a time through `&mut self`, so two
//! transitions never overlap.
//!
//! Inputs that make no sense in the current state are logged and ignored
//! rather than treated as failures. Validation failures are returned to the
//! caller untouched. Store failures park the finished record in `Error` until
//! `retry_save` or `reset`.

use crate::config::{Config, DeclinePolicy, EngineConfig};
use crate::core::clock::Clock;
use crate::core::event::{Command, Event, LifecycleEvent, Tick};
use crate::core::lifecycle::{LogNotifier, NoPrompt, Notifier, ResumePrompt};
use crate::core::session::{Session, is_default_category, normalize_category, today};
use crate::error::{Error, Result};
use crate::storage::{CategoryRegistry, SessionStore};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Engine rest states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No session.
    Idle,
    /// Counting down.
    Running,
    /// Session held, clock stopped.
    Paused,
    /// Finished record being written.
    Saving,
    /// Write failed; record retained.
    Error,
}

impl EngineState {
    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Saving => "saving",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an input did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The input was acted on; carries the resulting state.
    Applied(EngineState),
    /// The input was dropped; carries the unchanged state.
    Ignored(EngineState),
}

impl Outcome {
    /// State after the input.
    #[must_use]
    pub fn state(self) -> EngineState {
        match self {
            Self::Applied(state) | Self::Ignored(state) => state,
        }
    }

    /// Whether the input was acted on.
    #[must_use]
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// In-progress session. Never persisted directly.
#[derive(Debug, Clone)]
struct ActiveSession {
    run_id: Uuid,
    category: String,
    initial_seconds: u32,
    remaining_seconds: u32,
    distraction_count: u32,
    /// Paused by a background signal and eligible for a confirmed resume.
    resume_candidate: bool,
    /// A confirmation request is outstanding.
    awaiting_answer: bool,
}

impl ActiveSession {
    fn elapsed_seconds(&self) -> u32 {
        self.initial_seconds - self.remaining_seconds
    }
}

/// Finished record waiting to be written.
#[derive(Debug, Clone)]
struct PendingSave {
    session: Session,
    completed: bool,
}

/// Focus session state machine.
pub struct Engine<C: Clock> {
    clock: C,
    sessions: Arc<dyn SessionStore>,
    categories: Arc<dyn CategoryRegistry>,
    prompt: Box<dyn ResumePrompt>,
    notifier: Box<dyn Notifier>,
    policy: EngineConfig,
    state: EngineState,
    active: Option<ActiveSession>,
    pending: Option<PendingSave>,
    preset_seconds: u32,
    last_error: Option<String>,
    last_saved_id: Option<i64>,
}

impl<C: Clock> fmt::Debug for Engine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("active", &self.active)
            .field("pending", &self.pending)
            .field("preset_seconds", &self.preset_seconds)
            .finish_non_exhaustive()
    }
}

impl<C: Clock> Engine<C> {
    /// Create an idle engine with no prompt and a logging notifier.
    pub fn new(
        clock: C,
        sessions: Arc<dyn SessionStore>,
        categories: Arc<dyn CategoryRegistry>,
        config: &Config,
    ) -> Self {
        Self {
            clock,
            sessions,
            categories,
            prompt: Box::new(NoPrompt),
            notifier: Box::new(LogNotifier),
            policy: config.engine.clone(),
            state: EngineState::Idle,
            active: None,
            pending: None,
            preset_seconds: config.timer.default_minutes.saturating_mul(60),
            last_error: None,
            last_saved_id: None,
        }
    }

    /// Attach the resume confirmation collaborator.
    #[must_use]
    pub fn with_prompt(mut self, prompt: Box<dyn ResumePrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    /// Attach the notification collaborator.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Seconds left on the countdown.
    ///
    /// With no session this is the preset the next `start` is expected to use.
    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.active
            .as_ref()
            .map_or(self.preset_seconds, |a| a.remaining_seconds)
    }

    /// Seconds counted so far in the current session.
    #[must_use]
    pub fn elapsed_seconds(&self) -> u32 {
        self.active.as_ref().map_or(0, ActiveSession::elapsed_seconds)
    }

    /// Distractions counted in the current session.
    #[must_use]
    pub fn distraction_count(&self) -> u32 {
        self.active.as_ref().map_or(0, |a| a.distraction_count)
    }

    /// Category of the current session.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.category.as_str())
    }

    /// Whether a background pause is waiting on a confirmed resume.
    #[must_use]
    pub fn is_resume_candidate(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.resume_candidate)
    }

    /// Whether a confirmation request is outstanding.
    #[must_use]
    pub fn awaiting_confirmation(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.awaiting_answer)
    }

    /// Record retained after a failed write.
    #[must_use]
    pub fn pending_session(&self) -> Option<&Session> {
        self.pending.as_ref().map(|p| &p.session)
    }

    /// Message from the last failed write.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Id assigned to the most recent successful write.
    #[must_use]
    pub fn last_saved_id(&self) -> Option<i64> {
        self.last_saved_id
    }

    /// The clock driving this engine.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Apply one queued event.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when a start command is rejected.
    pub fn handle(&mut self, event: Event) -> Result<Outcome> {
        match event {
            Event::Tick(tick) => Ok(self.on_tick(tick)),
            Event::Lifecycle(LifecycleEvent::EnteredBackground) => Ok(self.on_background()),
            Event::Lifecycle(LifecycleEvent::EnteredForeground) => Ok(self.on_foreground()),
            Event::ResumeAnswer(confirmed) => self.answer_resume(confirmed),
            Event::Command(command) => self.apply(command),
            Event::Shutdown => Ok(Outcome::Ignored(self.state)),
        }
    }

    /// Apply one user command.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when a start command is rejected.
    pub fn apply(&mut self, command: Command) -> Result<Outcome> {
        debug!(command = command.name(), state = %self.state, "applying command");
        match command {
            Command::Start { category, minutes } => self.start(&category, minutes),
            Command::Pause => Ok(self.pause()),
            Command::Resume => Ok(self.resume()),
            Command::Stop => self.stop(),
            Command::Reset => Ok(self.reset()),
            Command::RetrySave => self.retry_save(),
        }
    }

    /// Begin a countdown of `minutes` under `category`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a blank category or a zero or
    /// overflowing duration. Nothing changes and the clock is not armed.
    pub fn start(&mut self, category: &str, minutes: u32) -> Result<Outcome> {
        if self.state != EngineState::Idle {
            return Ok(self.reject("start"));
        }

        let category = normalize_category(category)?;
        if minutes == 0 {
            return Err(Error::validation("duration must be at least one minute"));
        }
        let initial_seconds = minutes
            .checked_mul(60)
            .ok_or_else(|| Error::validation(format!("duration of {minutes} minutes is too long")))?;

        if self.policy.register_categories && !is_default_category(category) {
            if let Err(err) = self.categories.add_category(category) {
                warn!(error = %err, category, "failed to record category");
            }
        }

        let active = ActiveSession {
            run_id: Uuid::new_v4(),
            category: category.to_string(),
            initial_seconds,
            remaining_seconds: initial_seconds,
            distraction_count: 0,
            resume_candidate: false,
            awaiting_answer: false,
        };
        info!(run_id = %active.run_id, category, initial_seconds, "session started");

        self.preset_seconds = initial_seconds;
        self.active = Some(active);
        self.last_error = None;
        self.clock.arm();
        self.state = EngineState::Running;
        Ok(Outcome::Applied(self.state))
    }

    /// Apply a clock tick.
    pub fn on_tick(&mut self, tick: Tick) -> Outcome {
        if !self.clock.admits(tick) {
            debug!(epoch = tick.epoch, state = %self.state, "dropping stale tick");
            return Outcome::Ignored(self.state);
        }
        if self.state != EngineState::Running {
            return Outcome::Ignored(self.state);
        }
        let Some(active) = self.active.as_mut() else {
            return Outcome::Ignored(self.state);
        };

        if active.remaining_seconds > 1 {
            active.remaining_seconds -= 1;
            return Outcome::Applied(self.state);
        }

        active.remaining_seconds = 0;
        self.clock.disarm();
        info!(run_id = %active.run_id, "countdown complete");
        let duration = active.initial_seconds;
        match self.begin_save(duration, true) {
            Ok(outcome) => outcome,
            Err(err) => {
                // Already parked in Error; a tick has no caller to report to.
                warn!(error = %err, "completed session could not be saved");
                Outcome::Applied(self.state)
            }
        }
    }

    /// Pause a running session.
    pub fn pause(&mut self) -> Outcome {
        if self.state != EngineState::Running {
            return self.reject("pause");
        }
        self.clock.disarm();
        self.state = EngineState::Paused;
        debug!(remaining = self.remaining_seconds(), "session paused");
        Outcome::Applied(self.state)
    }

    /// The user left the app.
    pub fn on_background(&mut self) -> Outcome {
        match self.state {
            EngineState::Running => {
                self.clock.disarm();
                let Some(active) = self.active.as_mut() else {
                    return Outcome::Ignored(self.state);
                };
                active.distraction_count += 1;
                active.resume_candidate = true;
                let count = active.distraction_count;
                self.state = EngineState::Paused;
                info!(distraction_count = count, "left app; session paused");
                self.notifier.distraction_recorded(count);
                Outcome::Applied(self.state)
            }
            EngineState::Paused if self.awaiting_confirmation() => {
                // Left again before answering; ask afresh on the next return.
                if let Some(active) = self.active.as_mut() {
                    active.awaiting_answer = false;
                }
                Outcome::Applied(self.state)
            }
            _ => {
                debug!(state = %self.state, "background signal ignored");
                Outcome::Ignored(self.state)
            }
        }
    }

    /// The user came back to the app.
    pub fn on_foreground(&mut self) -> Outcome {
        if self.state != EngineState::Paused {
            return Outcome::Ignored(self.state);
        }
        let Some(active) = self.active.as_mut() else {
            return Outcome::Ignored(self.state);
        };
        if !active.resume_candidate || active.awaiting_answer {
            return Outcome::Ignored(self.state);
        }

        active.awaiting_answer = true;
        let (remaining, distractions) = (active.remaining_seconds, active.distraction_count);
        debug!(remaining, "requesting resume confirmation");
        self.prompt.request_confirmation(remaining, distractions);
        Outcome::Applied(self.state)
    }

    /// Answer to an outstanding resume confirmation.
    ///
    /// # Errors
    ///
    /// Propagates a validation error from the stop policy's save.
    pub fn answer_resume(&mut self, confirmed: bool) -> Result<Outcome> {
        if self.state != EngineState::Paused || !self.awaiting_confirmation() {
            debug!(confirmed, state = %self.state, "stale resume answer ignored");
            return Ok(Outcome::Ignored(self.state));
        }

        if confirmed {
            return Ok(self.resume());
        }

        if let Some(active) = self.active.as_mut() {
            active.awaiting_answer = false;
            active.resume_candidate = false;
        }
        match self.policy.on_resume_declined {
            DeclinePolicy::StayPaused => {
                debug!("resume declined; staying paused");
                Ok(Outcome::Applied(self.state))
            }
            DeclinePolicy::Stop => {
                info!("resume declined; stopping session");
                self.stop()
            }
        }
    }

    /// Resume a paused session where it left off.
    pub fn resume(&mut self) -> Outcome {
        if self.state != EngineState::Paused {
            return self.reject("resume");
        }
        if let Some(active) = self.active.as_mut() {
            active.resume_candidate = false;
            active.awaiting_answer = false;
        }
        self.clock.arm();
        self.state = EngineState::Running;
        debug!(remaining = self.remaining_seconds(), "session resumed");
        Outcome::Applied(self.state)
    }

    /// Finish early and save the time counted so far.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the finished record is rejected by the
    /// store.
    pub fn stop(&mut self) -> Result<Outcome> {
        if !matches!(self.state, EngineState::Running | EngineState::Paused) {
            return Ok(self.reject("stop"));
        }
        self.clock.disarm();
        let Some(active) = self.active.as_ref() else {
            return Ok(self.reject("stop"));
        };
        let duration = active.elapsed_seconds();
        info!(run_id = %active.run_id, duration, "session stopped");
        self.begin_save(duration, false)
    }

    /// Discard the session without saving.
    pub fn reset(&mut self) -> Outcome {
        if self.state == EngineState::Saving {
            return self.reject("reset");
        }
        self.clock.disarm();
        if let Some(active) = self.active.take() {
            info!(run_id = %active.run_id, "session discarded");
        }
        self.pending = None;
        self.last_error = None;
        self.state = EngineState::Idle;
        Outcome::Applied(self.state)
    }

    /// Re-attempt the failed write.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the store rejects the record.
    pub fn retry_save(&mut self) -> Result<Outcome> {
        if self.state != EngineState::Error {
            return Ok(self.reject("retry_save"));
        }
        info!("retrying save");
        self.persist()
    }

    fn begin_save(&mut self, duration_seconds: u32, completed: bool) -> Result<Outcome> {
        let Some(active) = self.active.as_ref() else {
            return Ok(self.reject("save"));
        };
        let session = Session::new(
            duration_seconds,
            &active.category,
            active.distraction_count,
            today(),
        );
        self.pending = Some(PendingSave { session, completed });
        self.persist()
    }

    /// Write the pending record. Only one write runs at a time because the
    /// engine is `&mut` for its whole duration and `Saving` rejects `stop`.
    fn persist(&mut self) -> Result<Outcome> {
        let Some(pending) = self.pending.clone() else {
            return Ok(self.reject("save"));
        };
        self.state = EngineState::Saving;

        match self.sessions.insert_session(&pending.session) {
            Ok(id) => {
                info!(
                    id,
                    duration = pending.session.duration_seconds,
                    distractions = pending.session.distraction_count,
                    "session saved"
                );
                self.active = None;
                self.pending = None;
                self.last_error = None;
                self.last_saved_id = Some(id);
                self.state = EngineState::Idle;
                if pending.completed {
                    let saved = Session {
                        id: Some(id),
                        ..pending.session
                    };
                    self.notifier.session_completed(&saved);
                }
                Ok(Outcome::Applied(self.state))
            }
            Err(err) if err.is_persistence() => {
                error!(error = %err, "failed to save session; keeping it for retry");
                self.last_error = Some(err.to_string());
                self.state = EngineState::Error;
                Ok(Outcome::Applied(self.state))
            }
            Err(err) => Err(self.park_rejected(err)),
        }
    }

    /// A record the store refuses outright is still kept until reset.
    fn park_rejected(&mut self, err: Error) -> Error {
        error!(error = %err, "store rejected session record");
        self.last_error = Some(err.to_string());
        self.state = EngineState::Error;
        err
    }

    fn reject(&self, event: &'static str) -> Outcome {
        let err = Error::Protocol {
            event,
            state: self.state.as_str(),
        };
        warn!(error = %err, "ignoring event");
        Outcome::Ignored(self.state)
    }
}
