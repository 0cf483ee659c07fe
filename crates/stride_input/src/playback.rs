//! Playback engine: a cursor that replays a sealed recording in real time

use crate::config::PLAYBACK_SPEED_RANGE;
use crate::events::InputEvent;
use crate::frame::{Frame, FrameKind, Recording};
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened during one [`Playback::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackTick {
    Idle,
    /// Still playing; `dispatched` frames were re-emitted this tick.
    Playing { dispatched: usize },
    /// Reached the end and rewound to the first frame.
    Looped { dispatched: usize },
    /// Reached the end and stopped.
    Ended { dispatched: usize },
}

impl From<&Frame> for InputEvent {
    fn from(frame: &Frame) -> Self {
        match frame.kind {
            FrameKind::Movement => InputEvent::Movement(frame.direction),
            FrameKind::InputStart => InputEvent::Started,
            FrameKind::InputEnd => InputEvent::Ended,
        }
    }
}

pub struct Playback {
    recording: Option<Arc<Recording>>,
    cursor: usize,
    start_time: f32,
    speed: f32,
    looping: bool,
}

impl Playback {
    pub fn new(speed: f32, looping: bool) -> Self {
        Self {
            recording: None,
            cursor: 0,
            start_time: 0.0,
            speed: clamp_speed(speed),
            looping,
        }
    }

    pub fn start(&mut self, recording: Arc<Recording>, now: f32) {
        debug!(
            name = recording.name(),
            frames = recording.frame_count(),
            "playback cursor reset"
        );
        self.recording = Some(recording);
        self.cursor = 0;
        self.start_time = now;
    }

    /// Returns the recording that was playing, if any.
    pub fn stop(&mut self) -> Option<Arc<Recording>> {
        self.cursor = 0;
        self.recording.take()
    }

    pub fn is_playing(&self) -> bool {
        self.recording.is_some()
    }

    /// Index of the next frame to dispatch.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Clamp and apply a new speed. While playing, the start anchor moves so
    /// the recording position at `now` is unchanged.
    pub fn set_speed(&mut self, speed: f32, now: f32) {
        let speed = clamp_speed(speed);
        if self.is_playing() {
            let elapsed = self.elapsed(now);
            self.start_time = now - elapsed / speed;
        }
        self.speed = speed;
    }

    /// Recording-time position at `now`.
    pub fn elapsed(&self, now: f32) -> f32 {
        if self.is_playing() {
            (now - self.start_time) * self.speed
        } else {
            0.0
        }
    }

    /// Fraction of the recording played, in `[0, 1]`.
    pub fn progress(&self, now: f32) -> f32 {
        match &self.recording {
            Some(recording) if recording.duration() > 0.0 => {
                (self.elapsed(now) / recording.duration()).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    /// Jump to `normalized * duration`. The cursor lands on the first frame
    /// stamped after the target, or at the end if there is none.
    pub fn seek(&mut self, normalized: f32, now: f32) -> bool {
        let Some(recording) = &self.recording else {
            warn!("seek ignored: nothing is playing");
            return false;
        };
        let normalized = if normalized.is_nan() { 0.0 } else { normalized.clamp(0.0, 1.0) };
        let target = normalized * recording.duration();

        self.cursor = recording
            .frames()
            .partition_point(|frame| frame.timestamp <= target);
        self.start_time = now - target / self.speed;
        debug!(target, cursor = self.cursor, "playback seek");
        true
    }

    /// Dispatch every frame due at `now`, in recorded order.
    pub fn update(&mut self, now: f32, mut dispatch: impl FnMut(InputEvent)) -> PlaybackTick {
        let Some(recording) = self.recording.clone() else {
            return PlaybackTick::Idle;
        };
        let frames = recording.frames();
        let elapsed = self.elapsed(now);

        let mut dispatched = 0;
        while let Some(frame) = frames.get(self.cursor) {
            if frame.timestamp > elapsed {
                break;
            }
            dispatch(InputEvent::from(frame));
            self.cursor += 1;
            dispatched += 1;
        }

        if self.cursor < frames.len() {
            return PlaybackTick::Playing { dispatched };
        }

        if self.looping && !frames.is_empty() {
            self.cursor = 0;
            self.start_time = now;
            PlaybackTick::Looped { dispatched }
        } else {
            self.stop();
            PlaybackTick::Ended { dispatched }
        }
    }
}

fn clamp_speed(speed: f32) -> f32 {
    if speed.is_nan() {
        1.0
    } else {
        speed.clamp(PLAYBACK_SPEED_RANGE.0, PLAYBACK_SPEED_RANGE.1)
    }
}
