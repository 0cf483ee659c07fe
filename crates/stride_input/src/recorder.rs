//! Recorder state machine
//!
//! Owns one [`Capture`] and one [`Playback`]. At most one of them is active:
//! starting either force-stops the other.

use crate::capture::Capture;
use crate::config::RecorderConfig;
use crate::events::{EventBus, InputEvent, SubscriptionId};
use crate::frame::{FrameKind, Recording};
use crate::persist::RecordingSink;
use crate::playback::{Playback, PlaybackTick};
use chrono::Local;
use std::sync::Arc;
use stride_core::pool::PoolStats;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Playing,
}

/// Lifecycle notifications.
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    RecordingStarted,
    RecordingStopped(Arc<Recording>),
    PlaybackStarted(Arc<Recording>),
    PlaybackLooped,
    PlaybackEnded,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecorderStats {
    pub is_recording: bool,
    pub is_playing: bool,
    pub recording_duration: f32,
    pub playback_progress: f32,
    pub current_frame_count: usize,
    pub max_recording_duration: f32,
    pub playback_speed: f32,
    pub pool: PoolStats,
}

/// `Recording_YYYY-MM-DD_HH-MM-SS` in local time.
pub fn generated_name() -> String {
    Local::now().format("Recording_%Y-%m-%d_%H-%M-%S").to_string()
}

/// Suffix `_2`, `_3`, ... while `base` repeats the previous name.
fn disambiguate(base: String, previous: &mut Option<(String, u32)>) -> String {
    match previous {
        Some((last, count)) if *last == base => {
            *count += 1;
            format!("{base}_{count}")
        }
        _ => {
            *previous = Some((base.clone(), 1));
            base
        }
    }
}

pub struct InputRecorder {
    config: RecorderConfig,
    capture: Capture,
    playback: Playback,
    recording: bool,
    last_recording: Option<Arc<Recording>>,
    last_name: Option<(String, u32)>,
    sink: Option<Box<dyn RecordingSink>>,
    events: EventBus<RecorderEvent>,
}

impl InputRecorder {
    pub fn new(config: RecorderConfig) -> Self {
        let mut capture = Capture::new(
            config.buffer_size(),
            config.sample_interval(),
            config.pool_capacity(),
        );
        capture.prewarm(config.pool_prewarm());
        let playback = Playback::new(config.playback_speed(), config.loop_playback);

        debug!(
            buffer_size = config.buffer_size(),
            sample_rate = config.sample_rate(),
            "input recorder initialized"
        );
        Self {
            config,
            capture,
            playback,
            recording: false,
            last_recording: None,
            last_name: None,
            sink: None,
            events: EventBus::new(),
        }
    }

    /// Where sealed recordings go when auto-save is on.
    pub fn with_sink(mut self, sink: impl RecordingSink + 'static) -> Self {
        self.set_sink(sink);
        self
    }

    pub fn set_sink(&mut self, sink: impl RecordingSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    pub fn clear_sink(&mut self) {
        self.sink = None;
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Capture limits take effect at the next recording start; playback
    /// settings apply immediately.
    pub fn set_config(&mut self, config: RecorderConfig, now: f32) {
        self.playback.set_speed(config.playback_speed(), now);
        self.playback.set_looping(config.loop_playback);
        self.config = config;
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&RecorderEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn state(&self) -> RecorderState {
        if self.recording {
            RecorderState::Recording
        } else if self.playback.is_playing() {
            RecorderState::Playing
        } else {
            RecorderState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn last_recording(&self) -> Option<&Arc<Recording>> {
        self.last_recording.as_ref()
    }

    pub fn start_recording(&mut self, now: f32) {
        if self.recording {
            warn!("start_recording ignored: already recording");
            return;
        }
        if self.playback.is_playing() {
            self.stop_playback();
        }

        self.capture.reconfigure(
            self.config.buffer_size(),
            self.config.sample_interval(),
            self.config.pool_capacity(),
        );
        self.capture.begin(now);
        self.recording = true;

        info!(start = now, "recording started");
        self.events.emit(&RecorderEvent::RecordingStarted);
    }

    /// Seal the active capture. `None` if nothing was recording.
    pub fn stop_recording(&mut self, now: f32) -> Option<Arc<Recording>> {
        if !self.recording {
            warn!("stop_recording ignored: not recording");
            return None;
        }
        self.recording = false;

        let name = disambiguate(generated_name(), &mut self.last_name);
        let recording = Arc::new(self.capture.seal(name.clone(), now));
        info!(
            duration = recording.duration(),
            frames = recording.frame_count(),
            "recording stopped"
        );
        self.last_recording = Some(recording.clone());
        self.events
            .emit(&RecorderEvent::RecordingStopped(recording.clone()));

        if self.config.auto_save {
            match self.sink.as_mut() {
                Some(sink) => {
                    sink.submit(&name, recording.clone());
                }
                None => debug!("auto-save on but no sink attached"),
            }
        }
        Some(recording)
    }

    pub fn toggle_recording(&mut self, now: f32) -> Option<Arc<Recording>> {
        if self.recording {
            self.stop_recording(now)
        } else {
            self.start_recording(now);
            None
        }
    }

    /// Feed one live input notification. Ignored unless recording.
    pub fn observe(&mut self, event: &InputEvent, now: f32) {
        if !self.recording {
            return;
        }
        match *event {
            InputEvent::Movement(direction) => {
                self.capture.offer_movement(direction, now);
            }
            InputEvent::Started => self.capture.push_edge(FrameKind::InputStart, now),
            InputEvent::Ended => self.capture.push_edge(FrameKind::InputEnd, now),
        }
    }

    pub fn start_playback(&mut self, recording: Arc<Recording>, now: f32) {
        if self.recording {
            self.stop_recording(now);
        }
        info!(
            name = recording.name(),
            duration = recording.duration(),
            frames = recording.frame_count(),
            "playback started"
        );
        self.playback.start(recording.clone(), now);
        self.events.emit(&RecorderEvent::PlaybackStarted(recording));
    }

    /// Returns `false` (and emits nothing) if nothing was playing.
    pub fn stop_playback(&mut self) -> bool {
        if self.playback.stop().is_none() {
            return false;
        }
        info!("playback stopped");
        self.events.emit(&RecorderEvent::PlaybackEnded);
        true
    }

    pub fn seek(&mut self, normalized: f32, now: f32) -> bool {
        self.playback.seek(normalized, now)
    }

    pub fn playback_speed(&self) -> f32 {
        self.playback.speed()
    }

    pub fn set_playback_speed(&mut self, speed: f32, now: f32) {
        self.playback.set_speed(speed, now);
        self.config.set_playback_speed(self.playback.speed());
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.playback.set_looping(looping);
        self.config.loop_playback = looping;
    }

    /// Per-tick housekeeping: replay due frames through `dispatch`, then
    /// enforce the maximum recording duration.
    pub fn update(&mut self, now: f32, dispatch: impl FnMut(InputEvent)) -> PlaybackTick {
        let tick = self.playback.update(now, dispatch);
        match tick {
            PlaybackTick::Looped { .. } => {
                debug!("playback looped");
                self.events.emit(&RecorderEvent::PlaybackLooped);
            }
            PlaybackTick::Ended { .. } => {
                info!("playback ended");
                self.events.emit(&RecorderEvent::PlaybackEnded);
            }
            PlaybackTick::Idle | PlaybackTick::Playing { .. } => {}
        }

        let limit = self.config.max_recording_duration();
        if self.recording && limit > 0.0 && self.recording_duration(now) >= limit {
            info!(limit, "maximum recording duration reached");
            self.stop_recording(now);
        }
        tick
    }

    /// Seconds since the active recording started, or 0.
    pub fn recording_duration(&self, now: f32) -> f32 {
        if self.recording {
            now - self.capture.start_time()
        } else {
            0.0
        }
    }

    pub fn playback_progress(&self, now: f32) -> f32 {
        self.playback.progress(now)
    }

    pub fn current_frame_count(&self) -> usize {
        self.capture.len()
    }

    pub fn stats(&self, now: f32) -> RecorderStats {
        RecorderStats {
            is_recording: self.recording,
            is_playing: self.playback.is_playing(),
            recording_duration: self.recording_duration(now),
            playback_progress: self.playback_progress(now),
            current_frame_count: self.capture.len(),
            max_recording_duration: self.config.max_recording_duration(),
            playback_speed: self.playback.speed(),
            pool: self.capture.pool_stats(),
        }
    }
}
