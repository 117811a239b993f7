//! `stint run` command: an interactive focus session on the terminal.
//!
//! Lines typed on stdin become engine commands, visibility changes or prompt
//! answers. They are posted to the same queue as the timer ticks, so the
//! engine sees everything in arrival order.

use crate::config::Config;
use crate::core::engine::{Engine, EngineState, Outcome};
use crate::core::event::{Command, Event, Visibility};
use crate::core::lifecycle::{LifecycleSignal, Notifier, ResumePrompt};
use crate::core::report::{format_clock, format_duration};
use crate::core::{Clock, Session};
use crate::error::{Error, Result};
use crate::runtime::{Flow, Runtime};
use std::io::{self, BufRead, Write};
use std::sync::mpsc::Sender;
use std::thread;
use tracing::debug;

const HELP: &str = "commands: pause | resume | stop | reset | retry | away | back | yes | no | quit";

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Event(Event),
    Visibility(Visibility),
    Quit,
}

/// Run an interactive session.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the session cannot
/// be started.
pub fn run(config: &Config, category: &str, minutes: Option<u32>) -> Result<()> {
    let store = super::open_store(config)?;
    let mut runtime = Runtime::new(config, store.clone(), store)
        .with_prompt(Box::new(ConsolePrompt))
        .with_notifier(Box::new(ConsoleNotifier));

    let minutes = minutes.unwrap_or(config.timer.default_minutes);
    runtime.start(category, minutes)?;
    println!("{HELP}");
    render_clock(runtime.engine());

    spawn_input_reader(runtime.sender(), runtime.lifecycle_signal());

    runtime.run(|engine, event, result| match result {
        Err(err) => {
            println!("\n{err}");
            render_state(engine);
            Flow::Continue
        }
        Ok(outcome) => on_outcome(engine, event, *outcome),
    });
    finish(runtime.engine())
}

/// A session still held after a failed save must not vanish quietly on exit.
fn finish<C: Clock>(engine: &Engine<C>) -> Result<()> {
    if engine.state() != EngineState::Error {
        return Ok(());
    }
    let detail = match engine.pending_session() {
        Some(session) => format!(
            "{} of {} on {}",
            format_duration(u64::from(session.duration_seconds)),
            session.category,
            session.date
        ),
        None => "pending session".to_string(),
    };
    Err(Error::Persistence(format!(
        "session not saved ({detail}): {}",
        engine.last_error().unwrap_or("unknown error")
    )))
}

/// React to an applied or ignored event. Leaves the loop once a session ends.
fn on_outcome<C: Clock>(engine: &Engine<C>, event: &Event, outcome: Outcome) -> Flow {
    if !outcome.is_applied() {
        if !matches!(event, Event::Tick(_)) {
            debug!(?event, state = %outcome.state(), "input had no effect");
        }
        return Flow::Continue;
    }

    if engine.state() == EngineState::Idle {
        match (event, engine.last_saved_id()) {
            (Event::Command(Command::Reset), _) | (_, None) => println!("\nSession discarded."),
            (_, Some(id)) => println!("\nSession {id} saved."),
        }
        return Flow::Exit;
    }

    if matches!(event, Event::Tick(_)) {
        render_clock(engine);
    } else {
        render_state(engine);
    }
    Flow::Continue
}

fn render_clock<C: Clock>(engine: &Engine<C>) {
    print!(
        "\r{}  {}  distractions: {}  ",
        engine.category().unwrap_or_default(),
        format_clock(engine.remaining_seconds()),
        engine.distraction_count()
    );
    let _ = io::stdout().flush();
}

fn render_state<C: Clock>(engine: &Engine<C>) {
    match engine.state() {
        EngineState::Running => {
            println!();
            render_clock(engine);
        }
        EngineState::Paused if !engine.awaiting_confirmation() => {
            println!(
                "\nPaused at {}. Type 'resume' to continue.",
                format_clock(engine.remaining_seconds())
            );
        }
        EngineState::Error => {
            println!(
                "\nCould not save the session: {}. Type 'retry' or 'reset'.",
                engine.last_error().unwrap_or("unknown error")
            );
        }
        _ => {}
    }
}

/// Forward stdin to the engine until EOF or `quit`.
fn spawn_input_reader(sender: Sender<Event>, mut signal: LifecycleSignal) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_input(&line) {
                Some(Input::Event(event)) => {
                    if sender.send(event).is_err() {
                        return;
                    }
                }
                Some(Input::Visibility(visibility)) => {
                    signal.observe(visibility);
                }
                Some(Input::Quit) => break,
                None if line.trim().is_empty() => {}
                None => println!("{HELP}"),
            }
        }
        let _ = sender.send(Event::Shutdown);
    });
}

fn parse_input(line: &str) -> Option<Input> {
    let input = match line.trim().to_lowercase().as_str() {
        "p" | "pause" => Input::Event(Event::Command(Command::Pause)),
        "r" | "resume" => Input::Event(Event::Command(Command::Resume)),
        "s" | "stop" => Input::Event(Event::Command(Command::Stop)),
        "reset" => Input::Event(Event::Command(Command::Reset)),
        "retry" => Input::Event(Event::Command(Command::RetrySave)),
        "y" | "yes" => Input::Event(Event::ResumeAnswer(true)),
        "n" | "no" => Input::Event(Event::ResumeAnswer(false)),
        "away" | "bg" => Input::Visibility(Visibility::Background),
        "back" | "fg" => Input::Visibility(Visibility::Foreground),
        "q" | "quit" => Input::Quit,
        _ => return None,
    };
    Some(input)
}

/// Asks on the terminal; the answer arrives as a later `yes`/`no` line.
#[derive(Debug)]
struct ConsolePrompt;

impl ResumePrompt for ConsolePrompt {
    fn request_confirmation(&mut self, remaining_seconds: u32, distraction_count: u32) {
        println!(
            "\nWelcome back. {} left, {distraction_count} distraction(s) so far. Resume? [yes/no]",
            format_clock(remaining_seconds)
        );
    }
}

#[derive(Debug)]
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn session_completed(&mut self, session: &Session) {
        println!(
            "\nSession finished. {} of {} focus time is done.",
            format_duration(u64::from(session.duration_seconds)),
            session.category
        );
    }

    fn distraction_recorded(&mut self, distraction_count: u32) {
        println!("\nSession paused. You left, distraction #{distraction_count} counted.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use crate::runtime::run_loop;
    use crate::storage::{MemoryBackend, SessionStore};
    use std::sync::Arc;
    use std::sync::mpsc;

    /// Store whose writes always fail.
    struct BrokenStore;

    impl SessionStore for BrokenStore {
        fn insert_session(&self, _session: &Session) -> Result<i64> {
            Err(Error::Persistence("disk full".into()))
        }

        fn fetch_all_sessions(&self) -> Result<Vec<Session>> {
            Ok(Vec::new())
        }

        fn fetch_sessions_by_date(&self, _date: &str) -> Result<Vec<Session>> {
            Ok(Vec::new())
        }

        fn delete_session(&self, _id: i64) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn quitting_with_unsaved_session_is_an_error() {
        let mut engine = Engine::new(
            ManualClock::new(),
            Arc::new(BrokenStore),
            Arc::new(MemoryBackend::new()),
            &Config::default(),
        );
        engine.start("Work", 5).unwrap();

        let (tx, rx) = mpsc::channel();
        tx.send(Event::Command(Command::Stop)).unwrap();
        tx.send(Event::Shutdown).unwrap();
        run_loop(&mut engine, &rx, |engine, event, result| match result {
            Ok(outcome) => on_outcome(engine, event, *outcome),
            Err(_) => Flow::Continue,
        });

        assert_eq!(engine.state(), EngineState::Error);
        assert!(engine.pending_session().is_some());
        let err = finish(&engine).unwrap_err();
        assert!(err.is_persistence());
        assert!(err.to_string().contains("disk full"));
        assert!(err.to_string().contains("Work"));
    }

    #[test]
    fn finishing_after_save_is_ok() {
        let store = Arc::new(MemoryBackend::new());
        let mut engine = Engine::new(
            ManualClock::new(),
            store.clone(),
            store,
            &Config::default(),
        );
        engine.start("Work", 5).unwrap();
        engine.stop().unwrap();
        assert!(finish(&engine).is_ok());
    }

    #[test]
    fn parse_commands() {
        assert_eq!(
            parse_input(" Pause "),
            Some(Input::Event(Event::Command(Command::Pause)))
        );
        assert_eq!(
            parse_input("retry"),
            Some(Input::Event(Event::Command(Command::RetrySave)))
        );
        assert_eq!(
            parse_input("n"),
            Some(Input::Event(Event::ResumeAnswer(false)))
        );
        assert_eq!(
            parse_input("away"),
            Some(Input::Visibility(Visibility::Background))
        );
        assert_eq!(parse_input("quit"), Some(Input::Quit));
        assert_eq!(parse_input("dance"), None);
    }

    #[test]
    fn loop_exits_once_session_is_saved() {
        let store = Arc::new(MemoryBackend::new());
        let mut engine = Engine::new(
            ManualClock::new(),
            store.clone(),
            store,
            &Config::default(),
        );

        engine.start("Work", 5).unwrap();
        let tick = Event::Tick(engine.clock().tick());
        let outcome = engine.handle(tick.clone()).unwrap();
        assert_eq!(on_outcome(&engine, &tick, outcome), Flow::Continue);

        let stop = Event::Command(Command::Stop);
        let outcome = engine.handle(stop.clone()).unwrap();
        assert_eq!(on_outcome(&engine, &stop, outcome), Flow::Exit);
    }

    #[test]
    fn ignored_input_keeps_looping() {
        let store = Arc::new(MemoryBackend::new());
        let mut engine = Engine::new(
            ManualClock::new(),
            store.clone(),
            store,
            &Config::default(),
        );
        let pause = Event::Command(Command::Pause);
        let outcome = engine.handle(pause.clone()).unwrap();
        assert_eq!(on_outcome(&engine, &pause, outcome), Flow::Continue);
    }
}
