//! stint - focus session timer.
//!
//! Runs a countdown, counts every trip away from the app as a distraction,
//! and records finished sessions and custom categories in SQLite.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
