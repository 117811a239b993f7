//! Tick sources.
//!
//! A clock is armed and disarmed by the engine. Ticks travel through the
//! engine's event queue, so a tick scheduled just before a disarm may still be
//! sitting in the queue afterwards. Every tick carries the epoch of the arming
//! that produced it and [`Clock::admits`] rejects anything from an older epoch
//! or delivered while disarmed.

use crate::core::event::{Event, Tick};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Source of one-per-interval ticks.
pub trait Clock {
    /// Start delivering ticks.
    ///
    /// Returns `false` and changes nothing if the clock is already armed.
    fn arm(&mut self) -> bool;

    /// Stop delivering ticks. Idempotent.
    fn disarm(&mut self);

    /// Whether the clock is armed.
    fn is_armed(&self) -> bool;

    /// Whether `tick` belongs to the current arming.
    fn admits(&self, tick: Tick) -> bool;
}

/// Clock backed by a sleeper thread that posts ticks into an event channel.
#[derive(Debug)]
pub struct ThreadClock {
    interval: Duration,
    sink: Sender<Event>,
    epoch: u64,
    alive: Option<Arc<AtomicBool>>,
}

impl ThreadClock {
    /// Create a disarmed clock that posts to `sink` every `interval`.
    #[must_use]
    pub fn new(interval: Duration, sink: Sender<Event>) -> Self {
        Self {
            interval,
            sink,
            epoch: 0,
            alive: None,
        }
    }
}

impl Clock for ThreadClock {
    fn arm(&mut self) -> bool {
        if self.alive.is_some() {
            debug!(epoch = self.epoch, "clock already armed");
            return false;
        }

        self.epoch += 1;
        let alive = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&alive);
        let sink = self.sink.clone();
        let interval = self.interval;
        let epoch = self.epoch;

        thread::spawn(move || {
            loop {
                thread::sleep(interval);
                if !flag.load(Ordering::Acquire) {
                    break;
                }
                if sink.send(Event::Tick(Tick { epoch })).is_err() {
                    break;
                }
            }
        });

        self.alive = Some(alive);
        debug!(epoch, "clock armed");
        true
    }

    fn disarm(&mut self) {
        if let Some(alive) = self.alive.take() {
            alive.store(false, Ordering::Release);
            debug!(epoch = self.epoch, "clock disarmed");
        }
    }

    fn is_armed(&self) -> bool {
        self.alive.is_some()
    }

    fn admits(&self, tick: Tick) -> bool {
        self.alive.is_some() && tick.epoch == self.epoch
    }
}

impl Drop for ThreadClock {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// Clock driven by hand, for tests and embedders with their own timer.
///
/// Clones share state, so a caller can keep a handle after moving the clock
/// into an engine.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualState>>,
}

#[derive(Debug, Default)]
struct ManualState {
    epoch: u64,
    armed: bool,
    arm_count: usize,
    disarm_count: usize,
}

impl ManualClock {
    /// Create a disarmed clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ManualState) -> T) -> T {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// A tick stamped with the latest epoch, whether or not the clock is armed.
    #[must_use]
    pub fn tick(&self) -> Tick {
        Tick {
            epoch: self.with_state(|s| s.epoch),
        }
    }

    /// Number of successful arm calls.
    #[must_use]
    pub fn arm_count(&self) -> usize {
        self.with_state(|s| s.arm_count)
    }

    /// Number of disarm calls that actually stopped the clock.
    #[must_use]
    pub fn disarm_count(&self) -> usize {
        self.with_state(|s| s.disarm_count)
    }
}

impl Clock for ManualClock {
    fn arm(&mut self) -> bool {
        self.with_state(|s| {
            if s.armed {
                return false;
            }
            s.armed = true;
            s.epoch += 1;
            s.arm_count += 1;
            true
        })
    }

    fn disarm(&mut self) {
        self.with_state(|s| {
            if s.armed {
                s.armed = false;
                s.disarm_count += 1;
            }
        });
    }

    fn is_armed(&self) -> bool {
        self.with_state(|s| s.armed)
    }

    fn admits(&self, tick: Tick) -> bool {
        self.with_state(|s| s.armed && s.epoch == tick.epoch)
    }
}
