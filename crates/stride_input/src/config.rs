//! Input and recorder configuration
//!
//! Numeric fields are clamped when assigned (setters and `with_*` builders)
//! and once after deserialization via `clamped()`. Readers never re-check.

use crate::keys::KeyBindings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEAD_ZONE_RANGE: (f32, f32) = (0.0, 0.5);
pub const SMOOTH_TIME_RANGE: (f32, f32) = (0.0, 0.5);
pub const SENSITIVITY_RANGE: (f32, f32) = (0.5, 3.0);
pub const UPDATE_RATE_RANGE: (u32, u32) = (30, 120);
pub const PLAYBACK_SPEED_RANGE: (f32, f32) = (0.1, 10.0);
pub const SAMPLE_RATE_RANGE: (f32, f32) = (1.0, 240.0);

fn clamp_range(value: f32, (min, max): (f32, f32)) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Sampling and filtering parameters for the input provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub bindings: KeyBindings,
    dead_zone: f32,
    smooth_time: f32,
    sensitivity: f32,
    /// Diagonals are normalized so they never exceed straight-input magnitude.
    pub eight_directional: bool,
    update_rate: u32,
    /// Run registered key shortcuts each tick.
    pub enable_shortcuts: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            bindings: KeyBindings::default(),
            dead_zone: 0.1,
            smooth_time: 0.1,
            sensitivity: 1.0,
            eight_directional: true,
            update_rate: 60,
            enable_shortcuts: true,
        }
    }
}

impl InputConfig {
    pub fn dead_zone(&self) -> f32 {
        self.dead_zone
    }

    pub fn smooth_time(&self) -> f32 {
        self.smooth_time
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    /// Fixed tick rate in Hz.
    pub fn update_rate(&self) -> u32 {
        self.update_rate
    }

    pub fn set_dead_zone(&mut self, value: f32) {
        self.dead_zone = clamp_range(value, DEAD_ZONE_RANGE);
    }

    pub fn set_smooth_time(&mut self, value: f32) {
        self.smooth_time = clamp_range(value, SMOOTH_TIME_RANGE);
    }

    pub fn set_sensitivity(&mut self, value: f32) {
        self.sensitivity = clamp_range(value, SENSITIVITY_RANGE);
    }

    pub fn set_update_rate(&mut self, value: u32) {
        self.update_rate = value.clamp(UPDATE_RATE_RANGE.0, UPDATE_RATE_RANGE.1);
    }

    pub fn with_dead_zone(mut self, value: f32) -> Self {
        self.set_dead_zone(value);
        self
    }

    pub fn with_smooth_time(mut self, value: f32) -> Self {
        self.set_smooth_time(value);
        self
    }

    pub fn with_sensitivity(mut self, value: f32) -> Self {
        self.set_sensitivity(value);
        self
    }

    pub fn with_eight_directional(mut self, enabled: bool) -> Self {
        self.eight_directional = enabled;
        self
    }

    pub fn with_update_rate(mut self, value: u32) -> Self {
        self.set_update_rate(value);
        self
    }

    pub fn with_shortcuts(mut self, enabled: bool) -> Self {
        self.enable_shortcuts = enabled;
        self
    }

    /// Re-apply every clamp. Used after loading from disk.
    pub fn clamped(mut self) -> Self {
        self.set_dead_zone(self.dead_zone);
        self.set_smooth_time(self.smooth_time);
        self.set_sensitivity(self.sensitivity);
        self.set_update_rate(self.update_rate);
        self
    }
}

/// Capture, playback and persistence parameters for the recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Persist every sealed recording under a generated name.
    pub auto_save: bool,
    pub directory: PathBuf,
    max_recording_count: usize,
    max_recording_duration: f32,
    pub loop_playback: bool,
    playback_speed: f32,
    buffer_size: usize,
    sample_rate: f32,
    pool_capacity: usize,
    pool_prewarm: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            auto_save: true,
            directory: PathBuf::from("InputRecordings"),
            max_recording_count: 50,
            max_recording_duration: 300.0,
            loop_playback: false,
            playback_speed: 1.0,
            buffer_size: 10_000,
            sample_rate: 60.0,
            pool_capacity: 200,
            pool_prewarm: 100,
        }
    }
}

impl RecorderConfig {
    /// Retention cap for the recording store.
    pub fn max_recording_count(&self) -> usize {
        self.max_recording_count
    }

    /// Seconds after which an active recording stops itself. Zero disables.
    pub fn max_recording_duration(&self) -> f32 {
        self.max_recording_duration
    }

    pub fn playback_speed(&self) -> f32 {
        self.playback_speed
    }

    /// Upper bound on frames held by an active capture.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Movement samples accepted per second.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn sample_interval(&self) -> f32 {
        1.0 / self.sample_rate
    }

    /// Recycled frames retained between captures.
    pub fn pool_capacity(&self) -> usize {
        self.pool_capacity
    }

    pub fn pool_prewarm(&self) -> usize {
        self.pool_prewarm
    }

    pub fn set_max_recording_count(&mut self, value: usize) {
        self.max_recording_count = value.max(1);
    }

    pub fn set_max_recording_duration(&mut self, value: f32) {
        self.max_recording_duration = if value.is_nan() { 0.0 } else { value.max(0.0) };
    }

    pub fn set_playback_speed(&mut self, value: f32) {
        self.playback_speed = clamp_range(value, PLAYBACK_SPEED_RANGE);
    }

    pub fn set_buffer_size(&mut self, value: usize) {
        self.buffer_size = value.max(1);
    }

    pub fn set_sample_rate(&mut self, value: f32) {
        self.sample_rate = clamp_range(value, SAMPLE_RATE_RANGE);
    }

    pub fn set_pool_capacity(&mut self, value: usize) {
        self.pool_capacity = value;
        self.pool_prewarm = self.pool_prewarm.min(value);
    }

    pub fn set_pool_prewarm(&mut self, value: usize) {
        self.pool_prewarm = value.min(self.pool_capacity);
    }

    pub fn with_auto_save(mut self, enabled: bool) -> Self {
        self.auto_save = enabled;
        self
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn with_max_recording_count(mut self, value: usize) -> Self {
        self.set_max_recording_count(value);
        self
    }

    pub fn with_max_recording_duration(mut self, value: f32) -> Self {
        self.set_max_recording_duration(value);
        self
    }

    pub fn with_loop_playback(mut self, enabled: bool) -> Self {
        self.loop_playback = enabled;
        self
    }

    pub fn with_playback_speed(mut self, value: f32) -> Self {
        self.set_playback_speed(value);
        self
    }

    pub fn with_buffer_size(mut self, value: usize) -> Self {
        self.set_buffer_size(value);
        self
    }

    pub fn with_sample_rate(mut self, value: f32) -> Self {
        self.set_sample_rate(value);
        self
    }

    pub fn with_pool_capacity(mut self, value: usize) -> Self {
        self.set_pool_capacity(value);
        self
    }

    /// Re-apply every clamp. Used after loading from disk.
    pub fn clamped(mut self) -> Self {
        self.set_max_recording_count(self.max_recording_count);
        self.set_max_recording_duration(self.max_recording_duration);
        self.set_playback_speed(self.playback_speed);
        self.set_buffer_size(self.buffer_size);
        self.set_sample_rate(self.sample_rate);
        self.set_pool_prewarm(self.pool_prewarm);
        self
    }
}
