//! Integration tests for a full session lifecycle against the SQLite store.

use std::sync::{Arc, Mutex};
use stint::Config;
use stint::core::session::today;
use stint::core::{
    Clock, Command, Engine, EngineState, Event, LifecycleEvent, ManualClock, ResumePrompt,
};
use stint::storage::{CategoryRegistry, SessionStore, SqliteBackend};
use tempfile::TempDir;

/// Prompt that records each confirmation request.
#[derive(Clone, Default)]
struct Prompts(Arc<Mutex<Vec<(u32, u32)>>>);

impl ResumePrompt for Prompts {
    fn request_confirmation(&mut self, remaining_seconds: u32, distraction_count: u32) {
        self.0
            .lock()
            .unwrap()
            .push((remaining_seconds, distraction_count));
    }
}

struct Fixture {
    _dir: TempDir,
    store: Arc<SqliteBackend>,
    clock: ManualClock,
    prompts: Prompts,
    engine: Engine<ManualClock>,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteBackend::open_in(dir.path()).unwrap());
    let clock = ManualClock::new();
    let prompts = Prompts::default();
    let engine = Engine::new(clock.clone(), store.clone(), store.clone(), &Config::default())
        .with_prompt(Box::new(prompts.clone()));
    Fixture {
        _dir: dir,
        store,
        clock,
        prompts,
        engine,
    }
}

impl Fixture {
    fn ticks(&mut self, n: u32) {
        for _ in 0..n {
            let tick = self.clock.tick();
            self.engine.handle(Event::Tick(tick)).unwrap();
        }
    }
}

#[test]
fn start_arms_countdown() {
    let mut f = fixture();
    f.engine
        .handle(Event::Command(Command::Start {
            category: "Study".into(),
            minutes: 25,
        }))
        .unwrap();

    assert_eq!(f.engine.state(), EngineState::Running);
    assert_eq!(f.engine.remaining_seconds(), 1500);
    assert!(f.clock.is_armed());
}

#[test]
fn uninterrupted_countdown_is_saved() {
    let mut f = fixture();
    f.engine.start("Study", 25).unwrap();
    f.ticks(1500);

    assert_eq!(f.engine.state(), EngineState::Idle);
    assert!(!f.clock.is_armed());

    let saved = f.store.fetch_all_sessions().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].duration_seconds, 1500);
    assert_eq!(saved[0].category, "Study");
    assert_eq!(saved[0].distraction_count, 0);
    assert_eq!(saved[0].date, today());
    assert_eq!(saved[0].id, f.engine.last_saved_id());
}

#[test]
fn background_round_trip_resumes_where_it_left_off() {
    let mut f = fixture();
    f.engine.start("Study", 25).unwrap();
    f.ticks(10);
    let in_flight = f.clock.tick();

    f.engine
        .handle(Event::Lifecycle(LifecycleEvent::EnteredBackground))
        .unwrap();
    assert_eq!(f.engine.state(), EngineState::Paused);
    assert_eq!(f.engine.distraction_count(), 1);

    // A tick posted before the pause lands afterwards and is dropped.
    f.engine.handle(Event::Tick(in_flight)).unwrap();
    assert_eq!(f.engine.remaining_seconds(), 1490);

    f.engine
        .handle(Event::Lifecycle(LifecycleEvent::EnteredForeground))
        .unwrap();
    assert_eq!(*f.prompts.0.lock().unwrap(), vec![(1490, 1)]);

    f.engine.handle(Event::ResumeAnswer(true)).unwrap();
    assert_eq!(f.engine.state(), EngineState::Running);
    assert_eq!(f.engine.remaining_seconds(), 1490);
    assert_eq!(f.engine.distraction_count(), 1);

    // The stale tick stays stale after re-arming.
    f.engine.handle(Event::Tick(in_flight)).unwrap();
    assert_eq!(f.engine.remaining_seconds(), 1490);
}

#[test]
fn stop_saves_elapsed_time_and_restores_preset() {
    let mut f = fixture();
    f.engine.start("Work", 25).unwrap();
    f.ticks(100);
    assert_eq!(f.engine.remaining_seconds(), 1400);

    f.engine.handle(Event::Command(Command::Stop)).unwrap();

    assert_eq!(f.engine.state(), EngineState::Idle);
    assert_eq!(f.engine.remaining_seconds(), 1500);
    let saved = f.store.fetch_all_sessions().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].duration_seconds, 100);
    assert_eq!(saved[0].distraction_count, 0);
}

#[test]
fn duplicate_category_is_stored_once() {
    let f = fixture();
    assert!(f.store.add_category("Study").unwrap());
    assert!(!f.store.add_category("Study").unwrap());

    let names: Vec<String> = f
        .store
        .list_categories()
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Study"]);
}

#[test]
fn delete_is_idempotent() {
    let mut f = fixture();
    for _ in 0..3 {
        f.engine.start("Other", 1).unwrap();
        f.ticks(5);
        f.engine.stop().unwrap();
    }
    let ids: Vec<i64> = f
        .store
        .fetch_all_sessions()
        .unwrap()
        .iter()
        .filter_map(|s| s.id)
        .collect();
    assert_eq!(ids.len(), 3);
    let target = ids[1];

    f.store.delete_session(target).unwrap();
    let remaining = f.store.fetch_all_sessions().unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|s| s.id != Some(target)));

    f.store.delete_session(target).unwrap();
    assert_eq!(f.store.fetch_all_sessions().unwrap().len(), 2);
}

#[test]
fn custom_category_is_registered_on_start() {
    let mut f = fixture();
    f.engine.start("  Reading ", 10).unwrap();
    assert_eq!(f.engine.category(), Some("Reading"));

    let names: Vec<String> = f
        .store
        .list_categories()
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Reading"]);
}

#[test]
fn sessions_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = Arc::new(SqliteBackend::open_in(dir.path()).unwrap());
        let mut engine =
            Engine::new(ManualClock::new(), store.clone(), store, &Config::default());
        engine.start("Sport", 30).unwrap();
        engine.stop().unwrap();
    }

    let store = SqliteBackend::open_in(dir.path()).unwrap();
    let saved = store.fetch_sessions_by_date(&today()).unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].category, "Sport");
    assert_eq!(saved[0].duration_seconds, 0);
}
