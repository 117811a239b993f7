//! Single-consumer event loop.
//!
//! Ticks, visibility changes, prompt answers and user commands are all posted
//! to one channel and applied to the engine in arrival order by one loop.

use crate::config::Config;
use crate::core::engine::{Engine, Outcome};
use crate::core::event::Event;
use crate::core::lifecycle::{LifecycleSignal, Notifier, ResumePrompt};
use crate::core::{Clock, ThreadClock};
use crate::error::Result;
use crate::storage::{CategoryRegistry, SessionStore};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::debug;

/// Whether the loop should keep going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Wait for the next event.
    Continue,
    /// Leave the loop.
    Exit,
}

/// Apply events from `events` until `Shutdown`, until `observe` says
/// `Flow::Exit`, or until every sender is gone. Returns the number of events
/// applied.
pub fn run_loop<C, F>(engine: &mut Engine<C>, events: &Receiver<Event>, mut observe: F) -> usize
where
    C: Clock,
    F: FnMut(&Engine<C>, &Event, &Result<Outcome>) -> Flow,
{
    let mut applied = 0;
    while let Ok(event) = events.recv() {
        if event == Event::Shutdown {
            debug!("event loop shutting down");
            break;
        }
        let result = engine.handle(event.clone());
        applied += 1;
        if observe(engine, &event, &result) == Flow::Exit {
            break;
        }
    }
    applied
}

/// Engine wired to a thread clock and an event channel.
#[derive(Debug)]
pub struct Runtime {
    engine: Engine<ThreadClock>,
    events: Receiver<Event>,
    sender: Sender<Event>,
}

impl Runtime {
    /// Build an idle runtime over the given stores.
    #[must_use]
    pub fn new(
        config: &Config,
        sessions: Arc<dyn SessionStore>,
        categories: Arc<dyn CategoryRegistry>,
    ) -> Self {
        let (sender, events) = mpsc::channel();
        let clock = ThreadClock::new(config.timer.tick_interval(), sender.clone());
        let engine = Engine::new(clock, sessions, categories, config);
        Self {
            engine,
            events,
            sender,
        }
    }

    /// Attach the resume confirmation collaborator.
    #[must_use]
    pub fn with_prompt(mut self, prompt: Box<dyn ResumePrompt>) -> Self {
        self.engine = self.engine.with_prompt(prompt);
        self
    }

    /// Attach the notification collaborator.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.engine = self.engine.with_notifier(notifier);
        self
    }

    /// Handle for posting commands and answers into the loop.
    #[must_use]
    pub fn sender(&self) -> Sender<Event> {
        self.sender.clone()
    }

    /// A visibility tracker that feeds this loop.
    #[must_use]
    pub fn lifecycle_signal(&self) -> LifecycleSignal {
        LifecycleSignal::new(self.sender.clone())
    }

    /// Start a session before the loop runs, so a rejected start reaches the
    /// caller directly.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a blank category or a bad duration.
    pub fn start(&mut self, category: &str, minutes: u32) -> Result<Outcome> {
        self.engine.start(category, minutes)
    }

    /// The engine, for reading state between runs.
    #[must_use]
    pub fn engine(&self) -> &Engine<ThreadClock> {
        &self.engine
    }

    /// Run the loop on the current thread. See [`run_loop`].
    pub fn run<F>(&mut self, observe: F) -> usize
    where
        F: FnMut(&Engine<ThreadClock>, &Event, &Result<Outcome>) -> Flow,
    {
        run_loop(&mut self.engine, &self.events, observe)
    }
}
