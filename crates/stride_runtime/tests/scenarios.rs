//! End-to-end tick loop scenarios

use glam::Vec2;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use stride_input::{
    DirectionalKeys, FrameKind, InputConfig, InputEvent, PersistenceWorker, RecorderEvent,
    RecordingStore,
};
use stride_motion::MovementBackend;
use stride_runtime::{InputSource, InputSystem, Settings};

fn smoothed_settings(smooth_time: f32) -> Settings {
    let mut settings = Settings {
        input: InputConfig::default().with_smooth_time(smooth_time),
        ..Settings::default()
    };
    settings.recorder.auto_save = false;
    settings
}

fn settings() -> Settings {
    let mut settings = Settings {
        input: InputConfig::default().with_smooth_time(0.0),
        ..Settings::default()
    };
    settings.recorder.auto_save = false;
    settings
}

fn script() -> Vec<DirectionalKeys> {
    let mut keys = Vec::new();
    keys.extend(std::iter::repeat(DirectionalKeys::NONE).take(5));
    keys.extend(std::iter::repeat(DirectionalKeys::forward()).take(20));
    keys.extend(
        std::iter::repeat(DirectionalKeys::forward().and(DirectionalKeys::right())).take(15),
    );
    keys.extend(std::iter::repeat(DirectionalKeys::left()).take(10));
    keys.extend(std::iter::repeat(DirectionalKeys::NONE).take(30));
    keys
}

fn record(system: &mut InputSystem) -> Arc<stride_input::Recording> {
    system.start_recording();
    for keys in script() {
        system.tick(&keys);
    }
    system.stop_recording().expect("sealed recording")
}

#[test]
fn recording_captures_edges_and_direction_changes() {
    let mut system = InputSystem::new(&settings(), MovementBackend::DirectIntegration);
    let recording = record(&mut system);

    let kinds: Vec<FrameKind> = recording.frames().iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![
            FrameKind::InputStart,
            FrameKind::Movement,
            FrameKind::Movement,
            FrameKind::Movement,
            FrameKind::InputEnd,
        ]
    );
    let directions: Vec<Vec2> = recording.movement_frames().map(|f| f.direction).collect();
    assert_eq!(directions[0], Vec2::new(0.0, 1.0));
    assert!((directions[1].length() - 1.0).abs() < 1e-6);
    assert_eq!(directions[2], Vec2::new(-1.0, 0.0));

    let tick = system.delta_secs();
    assert!((recording.duration() - 80.0 * tick).abs() < 1e-4);
    assert!((recording.frames()[0].timestamp - 5.0 * tick).abs() < 1e-4);
}

#[test]
fn playback_reproduces_live_movement() {
    let mut live = InputSystem::new(&settings(), MovementBackend::DirectIntegration);
    let recording = record(&mut live);
    let live_end = live.executor().position();

    let mut replay = InputSystem::new(&settings(), MovementBackend::DirectIntegration);
    let replayed = Rc::new(RefCell::new(Vec::new()));
    let sink = replayed.clone();
    replay.subscribe(move |e| sink.borrow_mut().push(*e));

    replay.start_playback(recording.clone());
    let mut guard = 0;
    while replay.recorder().is_playing() && guard < 1000 {
        let report = replay.tick(&DirectionalKeys::NONE);
        assert_eq!(report.source, InputSource::Playback);
        guard += 1;
    }
    for _ in 0..30 {
        replay.tick(&DirectionalKeys::NONE);
    }

    let movements: Vec<Vec2> = replayed
        .borrow()
        .iter()
        .filter_map(|e| match e {
            InputEvent::Movement(d) => Some(*d),
            _ => None,
        })
        .collect();
    let recorded: Vec<Vec2> = recording.movement_frames().map(|f| f.direction).collect();
    assert_eq!(movements, recorded);
    assert_eq!(replayed.borrow().first(), Some(&InputEvent::Started));
    assert_eq!(replayed.borrow().last(), Some(&InputEvent::Ended));

    // Same inputs held for the same number of ticks land in the same place.
    let drift = live_end.distance(replay.executor().position());
    assert!(drift < 0.05, "drift {drift}");
}

#[test]
fn live_keys_are_ignored_during_playback() {
    let mut system = InputSystem::new(&settings(), MovementBackend::DirectIntegration);
    let recording = record(&mut system);
    let history_before = system.history().count();

    system.start_playback(recording);
    let report = system.tick(&DirectionalKeys::back());
    assert_eq!(report.source, InputSource::Playback);
    assert_eq!(report.dispatched, 0);
    assert!(system
        .history()
        .skip(history_before)
        .all(|entry| entry.source == InputSource::Playback));
}

#[test]
fn seek_resumes_from_target() {
    let mut system = InputSystem::new(&settings(), MovementBackend::DirectIntegration);
    let recording = record(&mut system);
    let target = 0.3 * recording.duration();

    system.start_playback(recording.clone());
    system.tick(&DirectionalKeys::NONE);
    assert!(system.seek(0.3));

    let replayed = Rc::new(RefCell::new(Vec::new()));
    let sink = replayed.clone();
    system.subscribe(move |e| sink.borrow_mut().push(*e));
    while system.recorder().is_playing() {
        system.tick(&DirectionalKeys::NONE);
    }

    let expected: Vec<InputEvent> = recording
        .frames()
        .iter()
        .filter(|f| f.timestamp >= target)
        .map(InputEvent::from)
        .collect();
    assert_eq!(*replayed.borrow(), expected);
}

#[test]
fn recorder_events_follow_lifecycle() {
    let mut system = InputSystem::new(&settings(), MovementBackend::DirectIntegration);
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    system.subscribe_recorder(move |e| {
        sink.borrow_mut().push(matches!(e, RecorderEvent::PlaybackEnded));
    });

    let recording = record(&mut system);
    system.start_playback(recording);
    while system.recorder().is_playing() {
        system.tick(&DirectionalKeys::NONE);
    }
    assert_eq!(*log.borrow(), vec![false, false, false, true]);
}

#[test]
fn max_duration_auto_stops_inside_tick() {
    let mut settings = settings();
    settings.recorder.set_max_recording_duration(0.5);
    let mut system = InputSystem::new(&settings, MovementBackend::DirectIntegration);

    system.start_recording();
    for _ in 0..40 {
        system.tick(&DirectionalKeys::forward());
    }
    assert!(!system.status().is_recording);
    let sealed = system.recorder().last_recording().expect("auto-stopped");
    assert!((sealed.duration() - 0.5).abs() < 0.02);
}

#[test]
fn replay_of_held_input_comes_to_rest() {
    let mut live = InputSystem::new(&smoothed_settings(0.1), MovementBackend::DirectIntegration);
    live.start_recording();
    for _ in 0..30 {
        live.tick(&DirectionalKeys::forward());
    }
    let recording = live.stop_recording().expect("sealed with key held");
    assert!(recording
        .frames()
        .iter()
        .all(|f| f.kind != FrameKind::InputEnd));

    let mut replay = InputSystem::new(&smoothed_settings(0.1), MovementBackend::DirectIntegration);
    let replayed = Rc::new(RefCell::new(Vec::new()));
    let sink = replayed.clone();
    replay.subscribe(move |e| sink.borrow_mut().push(*e));

    replay.start_playback(recording);
    while replay.recorder().is_playing() {
        replay.tick(&DirectionalKeys::NONE);
    }
    assert_eq!(replayed.borrow().last(), Some(&InputEvent::Ended));

    for _ in 0..120 {
        replay.tick(&DirectionalKeys::NONE);
    }
    assert!(!replay.executor().is_moving());
    let settled = replay.executor().position();
    for _ in 0..480 {
        replay.tick(&DirectionalKeys::NONE);
    }
    assert!(settled.distance(replay.executor().position()) < 1e-3);
}

#[test]
fn smoothed_ramp_is_sampled_every_tick() {
    let mut system = InputSystem::new(&smoothed_settings(0.5), MovementBackend::DirectIntegration);
    let live_moves = Rc::new(RefCell::new(0usize));
    let sink = live_moves.clone();
    system.subscribe(move |e| {
        if matches!(e, InputEvent::Movement(_)) {
            *sink.borrow_mut() += 1;
        }
    });

    system.start_recording();
    system.tick(&DirectionalKeys::NONE);
    for _ in 0..60 {
        system.tick(&DirectionalKeys::right());
    }
    let recording = system.stop_recording().expect("sealed");

    let moves = *live_moves.borrow();
    assert!(moves >= 50, "only {moves} movement ticks");
    assert_eq!(recording.movement_frames().count(), moves);

    let tick = system.delta_secs();
    let stamps: Vec<f32> = recording.movement_frames().map(|f| f.timestamp).collect();
    for pair in stamps.windows(2) {
        assert!(pair[1] - pair[0] < 1.5 * tick, "gap {:?}", pair);
    }
}

#[tokio::test]
async fn auto_save_goes_through_worker() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(Mutex::new(RecordingStore::open(dir.path(), 5).expect("open")));
    let (queue, worker) = PersistenceWorker::spawn(store.clone());

    let mut settings = settings();
    settings.recorder.auto_save = true;
    let mut system =
        InputSystem::new(&settings, MovementBackend::DirectIntegration).with_sink(queue);
    let recording = record(&mut system);
    drop(system);

    assert_eq!(worker.await.expect("joined"), 1);
    let loaded = stride_input::persist::load(store, recording.name().to_string())
        .await
        .expect("persisted");
    assert_eq!(loaded.frames(), recording.frames());
    assert_eq!(loaded.id(), recording.id());
}
