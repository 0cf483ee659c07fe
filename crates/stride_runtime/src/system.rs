//! Input system context
//!
//! One explicitly constructed owner for the provider, recorder and movement
//! executor. Every fixed tick runs the same order: sample, then either
//! record the live stream or dispatch playback, then integrate movement.
//! Shortcuts are polled before anything else, even while paused.

use crate::settings::Settings;
use crate::shortcuts::{Shortcut, ShortcutAction, ShortcutRegistry, SystemCommand};
use glam::{Vec2, Vec3};
use std::sync::Arc;
use std::time::Duration;
use stride_core::ring::BoundedRing;
use stride_core::time::{FixedStepper, SimulationTime};
use stride_input::{
    EventBus, InputEvent, InputProvider, InputRecorder, KeySource, PlaybackTick, Recording,
    RecorderEvent, RecordingSink, SubscriptionId,
};
use stride_metrics::{time_scope, Counter, StageProfiler, TickTimer};
use stride_motion::{MovementBackend, MovementExecutor};
use tracing::{debug, info};

pub const HISTORY_CAPACITY: usize = 1000;

/// Where a dispatched event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Live,
    Playback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    pub time: f32,
    pub event: InputEvent,
    pub source: InputSource,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemStatus {
    pub enabled: bool,
    pub ticks: u64,
    pub elapsed: f32,
    pub history_len: usize,
    pub is_recording: bool,
    pub is_playing: bool,
    pub is_moving: bool,
    pub position: Vec3,
}

/// Result of one fixed tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub time: f32,
    pub source: InputSource,
    pub dispatched: usize,
}

pub struct InputSystem {
    provider: InputProvider,
    recorder: InputRecorder,
    executor: MovementExecutor,
    subscribers: EventBus<InputEvent>,
    time: SimulationTime,
    stepper: FixedStepper,
    history: BoundedRing<HistoryEntry>,
    enabled: bool,
    dispatch_buffer: Vec<InputEvent>,
    shortcuts: ShortcutRegistry,
    shortcuts_enabled: bool,
    command_buffer: Vec<SystemCommand>,
    /// Last replayed edge left input active.
    replay_active: bool,

    profiler: StageProfiler,
    counters: Counter,
    tick_timer: TickTimer,
}

impl InputSystem {
    pub fn new(settings: &Settings, backend: MovementBackend) -> Self {
        let time = SimulationTime::with_rate(settings.input.update_rate());
        let stepper = FixedStepper::new(time.tick_duration());
        info!(
            tick_rate = time.tick_rate_hz(),
            backend = %backend.kind(),
            "input system created"
        );

        Self {
            provider: InputProvider::new(settings.input.clone()),
            recorder: InputRecorder::new(settings.recorder.clone()),
            executor: MovementExecutor::new(settings.movement.clone(), backend),
            subscribers: EventBus::new(),
            tick_timer: TickTimer::new(time.tick_rate_hz() as usize * 2, time.tick_duration()),
            time,
            stepper,
            history: BoundedRing::new(HISTORY_CAPACITY),
            enabled: true,
            dispatch_buffer: Vec::new(),
            shortcuts: ShortcutRegistry::with_defaults(),
            shortcuts_enabled: settings.input.enable_shortcuts,
            command_buffer: Vec::new(),
            replay_active: false,
            profiler: StageProfiler::new(),
            counters: Counter::new(),
        }
    }

    pub fn with_sink(mut self, sink: impl RecordingSink + 'static) -> Self {
        self.recorder.set_sink(sink);
        self
    }

    pub fn provider(&self) -> &InputProvider {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut InputProvider {
        &mut self.provider
    }

    pub fn recorder(&self) -> &InputRecorder {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut InputRecorder {
        &mut self.recorder
    }

    pub fn executor(&self) -> &MovementExecutor {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut MovementExecutor {
        &mut self.executor
    }

    /// Simulation time of the next tick, in seconds.
    pub fn now(&self) -> f32 {
        self.time.elapsed_secs()
    }

    pub fn tick_duration(&self) -> Duration {
        self.time.tick_duration()
    }

    pub fn delta_secs(&self) -> f32 {
        self.time.delta_secs()
    }

    /// Listen to every dispatched input event, live or replayed.
    pub fn subscribe(&mut self, handler: impl FnMut(&InputEvent) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn subscribe_recorder(
        &mut self,
        handler: impl FnMut(&RecorderEvent) + 'static,
    ) -> SubscriptionId {
        self.recorder.subscribe(handler)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Gate sampling and movement together.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.provider.set_enabled(enabled);
        self.executor.set_enabled(enabled);
        info!(enabled, "input system toggled");
    }

    pub fn pause(&mut self) {
        self.set_enabled(false);
    }

    pub fn resume(&mut self) {
        self.set_enabled(true);
    }

    /// Stop movement, forget history and re-initialize the provider.
    pub fn reset(&mut self) {
        self.executor.stop();
        self.history.clear();
        self.provider.initialize();
        info!("input system reset");
    }

    pub fn start_recording(&mut self) {
        let now = self.now();
        self.recorder.start_recording(now);
        self.close_replay(now);
    }

    pub fn stop_recording(&mut self) -> Option<Arc<Recording>> {
        let now = self.now();
        self.recorder.stop_recording(now)
    }

    pub fn toggle_recording(&mut self) -> Option<Arc<Recording>> {
        let now = self.now();
        let sealed = self.recorder.toggle_recording(now);
        self.close_replay(now);
        sealed
    }

    pub fn start_playback(&mut self, recording: Arc<Recording>) {
        let now = self.now();
        self.close_replay(now);
        self.recorder.start_playback(recording, now);
    }

    pub fn stop_playback(&mut self) -> bool {
        let stopped = self.recorder.stop_playback();
        let now = self.now();
        self.close_replay(now);
        stopped
    }

    pub fn seek(&mut self, normalized: f32) -> bool {
        let now = self.now();
        self.recorder.seek(normalized, now)
    }

    pub fn set_playback_speed(&mut self, speed: f32) {
        let now = self.now();
        self.recorder.set_playback_speed(speed, now);
    }

    /// Bind a named shortcut, replacing any binding with the same name.
    pub fn register_shortcut(
        &mut self,
        name: impl Into<String>,
        shortcut: Shortcut,
        action: impl Into<ShortcutAction>,
    ) {
        self.shortcuts.register(name, shortcut, action);
    }

    pub fn unregister_shortcut(&mut self, name: &str) -> bool {
        self.shortcuts.unregister(name)
    }

    pub fn shortcuts(&self) -> &ShortcutRegistry {
        &self.shortcuts
    }

    /// Feed a variable frame time; runs as many fixed ticks as it covers.
    pub fn advance(&mut self, frame_time: Duration, keys: &impl KeySource) -> u32 {
        let steps = self.stepper.advance(frame_time);
        for _ in 0..steps {
            self.tick(keys);
        }
        steps
    }

    /// Run one fixed tick. A disabled system does not advance its clock.
    pub fn tick(&mut self, keys: &impl KeySource) -> TickReport {
        if self.shortcuts_enabled {
            self.run_shortcuts(keys);
        }

        let now = self.now();
        let dt = self.time.delta_secs();
        if !self.enabled {
            return TickReport {
                time: now,
                source: InputSource::Live,
                dispatched: 0,
            };
        }
        self.tick_timer.begin();

        let live = time_scope!(self.profiler, "sample", { self.provider.tick(keys, dt) });

        let mut events = std::mem::take(&mut self.dispatch_buffer);
        events.clear();

        let mut playback_ended = false;
        let source = if self.recorder.is_playing() {
            let outcome = time_scope!(self.profiler, "playback", {
                self.recorder.update(now, |event| events.push(event))
            });
            if let PlaybackTick::Ended { .. } = outcome {
                self.counters.increment("playbacks_finished", 1);
                playback_ended = true;
            }
            InputSource::Playback
        } else {
            time_scope!(self.profiler, "record", {
                for event in live.iter() {
                    self.recorder.observe(&event, now);
                }
                self.recorder.update(now, |_| {});
            });
            events.extend(live.iter());
            InputSource::Live
        };

        for event in &events {
            self.route(*event, now, source);
        }
        let mut dispatched = events.len();
        self.dispatch_buffer = events;
        if playback_ended && self.close_replay(now) {
            dispatched += 1;
        }

        time_scope!(self.profiler, "movement", { self.executor.fixed_update(dt) });

        self.time.advance_tick();
        self.tick_timer.end();
        self.counters.increment("ticks", 1);
        self.counters.increment("events_dispatched", dispatched as u64);

        TickReport {
            time: now,
            source,
            dispatched,
        }
    }

    fn run_shortcuts(&mut self, keys: &impl KeySource) {
        let mut commands = std::mem::take(&mut self.command_buffer);
        commands.clear();
        self.shortcuts.poll(keys, &mut commands);
        for command in commands.drain(..) {
            self.apply(command);
        }
        self.command_buffer = commands;
    }

    fn apply(&mut self, command: SystemCommand) {
        debug!(?command, "applying shortcut command");
        match command {
            SystemCommand::Reset => self.reset(),
            SystemCommand::TogglePause => self.set_enabled(!self.enabled),
            SystemCommand::ToggleRecording => {
                self.toggle_recording();
            }
            SystemCommand::StopPlayback => {
                self.stop_playback();
            }
        }
    }

    /// Route a closing `Ended` when a replay stops while its input is still
    /// active. Returns whether one was routed.
    fn close_replay(&mut self, now: f32) -> bool {
        if !self.replay_active {
            return false;
        }
        debug!("replay stopped with input active");
        self.route(InputEvent::Ended, now, InputSource::Playback);
        true
    }

    fn route(&mut self, event: InputEvent, now: f32, source: InputSource) {
        if source == InputSource::Playback {
            self.replay_active = !matches!(event, InputEvent::Ended);
        }
        self.history.push(HistoryEntry {
            time: now,
            event,
            source,
        });
        self.subscribers.emit(&event);

        match event {
            InputEvent::Movement(direction) => self.executor.handle_movement(direction),
            InputEvent::Ended => self.executor.handle_movement(Vec2::ZERO),
            InputEvent::Started => {}
        }
    }

    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn status(&self) -> SystemStatus {
        SystemStatus {
            enabled: self.enabled,
            ticks: self.time.tick_count(),
            elapsed: self.now(),
            history_len: self.history.len(),
            is_recording: self.recorder.is_recording(),
            is_playing: self.recorder.is_playing(),
            is_moving: self.executor.is_moving(),
            position: self.executor.position(),
        }
    }

    /// Emit collected timings at debug level.
    pub fn log_metrics(&self) {
        debug!(
            average_ms = self.tick_timer.average_ms(),
            worst_ms = self.tick_timer.worst_ms(),
            over_budget = self.tick_timer.over_budget(),
            "tick timing"
        );
        for (stage, timing) in self.profiler.iter() {
            debug!(
                stage,
                calls = timing.calls,
                average_us = timing.average().as_micros() as u64,
                "stage timing"
            );
        }
        for (name, value) in self.counters.iter() {
            debug!(counter = name, value, "counter");
        }
    }
}
