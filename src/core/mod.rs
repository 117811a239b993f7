//! Session engine and the types it works with.

pub mod clock;
pub mod engine;
pub mod event;
pub mod lifecycle;
pub mod report;
pub mod session;

pub use clock::{Clock, ManualClock, ThreadClock};
pub use engine::{Engine, EngineState, Outcome};
pub use event::{Command, Event, LifecycleEvent, Tick, Visibility};
pub use lifecycle::{LifecycleSignal, LogNotifier, NoPrompt, Notifier, ResumePrompt};
pub use session::{Category, DEFAULT_CATEGORIES, Session};
