//! Stride Runtime
//!
//! Boots logging and settings, then drives a scripted session through the
//! input system: record, persist, reload and replay.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stride_input::persist::{self, PersistenceWorker};
use stride_input::{Key, KeyboardState, RecordingStore};
use stride_motion::MovementBackend;
use stride_runtime::{InputSystem, Settings};
use tracing_subscriber::EnvFilter;

/// Held keys and how long to hold them.
const SCRIPT: &[(&[Key], f32)] = &[
    (&[], 0.25),
    (&[Key::W], 0.75),
    (&[Key::W, Key::D], 0.5),
    (&[Key::D], 0.5),
    (&[], 0.4),
    (&[Key::A], 0.3),
    (&[], 0.5),
];

/// Variable frame pacing fed to the fixed stepper.
const FRAME_TIMES_MS: [u64; 4] = [16, 17, 21, 13];

fn run_script(system: &mut InputSystem) {
    let mut keyboard = KeyboardState::new();
    let mut frame = 0usize;

    for (keys, hold) in SCRIPT {
        keyboard.release_all();
        for key in keys.iter() {
            keyboard.press(*key);
        }
        let mut held = Duration::ZERO;
        let hold = Duration::from_secs_f32(*hold);
        while held < hold {
            let frame_time = Duration::from_millis(FRAME_TIMES_MS[frame % FRAME_TIMES_MS.len()]);
            system.advance(frame_time, &keyboard);
            held += frame_time;
            frame += 1;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Stride v{}", stride_core::VERSION);

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("stride.json"));
    let settings = Settings::load_or_default(&settings_path);

    let store = RecordingStore::open(
        &settings.recorder.directory,
        settings.recorder.max_recording_count(),
    )
    .context("opening recording store")?;
    let store = Arc::new(Mutex::new(store));
    let (queue, worker) = PersistenceWorker::spawn(store.clone());

    // Record a scripted session; auto-save hands it to the worker.
    let mut system =
        InputSystem::new(&settings, MovementBackend::DirectIntegration).with_sink(queue);
    system.start_recording();
    run_script(&mut system);
    let recorded = system
        .stop_recording()
        .context("recorder was not recording")?;
    let live_end = system.executor().position();
    tracing::info!(
        recording = %recorded,
        position = ?live_end,
        "live session finished"
    );
    system.log_metrics();

    // Dropping the system drops the last queue handle and lets the worker drain.
    drop(system);
    let saved = worker.await.context("persistence worker panicked")?;
    tracing::info!(saved, "recordings persisted");

    let names = persist::list(store.clone()).await;
    tracing::info!(count = names.len(), "stored recordings");

    let replay = if names.iter().any(|n| n == recorded.name()) {
        persist::load(store.clone(), recorded.name().to_string())
            .await
            .unwrap_or_else(|| recorded.clone())
    } else {
        recorded.clone()
    };

    // Replay into a fresh entity with no live keys held.
    let mut playback = InputSystem::new(&settings, MovementBackend::DirectIntegration);
    playback.start_playback(replay.clone());
    let idle = KeyboardState::new();
    let tick = playback.tick_duration();
    let limit = (replay.duration() / playback.recorder().playback_speed() + 2.0)
        / playback.delta_secs();
    let mut ticks = 0u32;
    while playback.recorder().is_playing() && (ticks as f32) < limit {
        playback.advance(tick, &idle);
        ticks += 1;
    }
    // Let deceleration settle.
    for _ in 0..120 {
        playback.advance(tick, &idle);
    }

    let replay_end = playback.executor().position();
    tracing::info!(
        position = ?replay_end,
        drift = live_end.distance(replay_end),
        "playback finished"
    );
    playback.log_metrics();

    Ok(())
}
