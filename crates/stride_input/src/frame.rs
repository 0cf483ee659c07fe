//! Recorded frames and sealed recordings

use chrono::{DateTime, Utc};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use stride_core::pool::Reusable;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameKind {
    #[default]
    Movement,
    InputStart,
    InputEnd,
}

/// One timestamped input sample or edge.
///
/// Deliberately not `Copy`: a frame moves between the pool, the active
/// capture ring and a sealed recording, one owner at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub kind: FrameKind,
    #[serde(with = "vec2_xy")]
    pub direction: Vec2,
    /// Seconds since recording start.
    pub timestamp: f32,
    pub sequence: u32,
}

impl Reusable for Frame {
    fn reset(&mut self) {
        self.kind = FrameKind::Movement;
        self.direction = Vec2::ZERO;
        self.timestamp = 0.0;
        self.sequence = 0;
    }
}

/// `{ "x": .., "y": .. }` on the wire.
mod vec2_xy {
    use glam::Vec2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Xy {
        x: f32,
        y: f32,
    }

    pub fn serialize<S: Serializer>(v: &Vec2, serializer: S) -> Result<S::Ok, S::Error> {
        Xy { x: v.x, y: v.y }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec2, D::Error> {
        let Xy { x, y } = Xy::deserialize(deserializer)?;
        Ok(Vec2::new(x, y))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RecordingError {
    #[error("frame {index} at {timestamp}s is earlier than its predecessor")]
    Unsorted { index: usize, timestamp: f32 },

    #[error("duration {duration}s is shorter than last frame at {last}s")]
    DurationTooShort { duration: f32, last: f32 },

    #[error("frame_count {declared} does not match {actual} stored frames")]
    FrameCountMismatch { declared: u32, actual: usize },

    #[error("invalid recording id {0:?}")]
    InvalidId(String),
}

/// A sealed, immutable capture.
///
/// Frames are sorted by timestamp and `duration >= last timestamp`. Neither
/// can be violated after construction: every field is private.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    duration: f32,
    frames: Vec<Frame>,
}

impl Recording {
    /// Build a recording from frames that are already known to be in order.
    pub(crate) fn seal(name: String, duration: f32, frames: Vec<Frame>) -> Self {
        let last = frames.last().map_or(0.0, |f| f.timestamp);
        Self {
            id: Uuid::new_v4(),
            name,
            created_at: Utc::now(),
            duration: duration.max(last),
            frames,
        }
    }

    /// Build and validate a recording from arbitrary frames.
    pub fn from_frames(
        name: impl Into<String>,
        duration: f32,
        frames: Vec<Frame>,
    ) -> Result<Self, RecordingError> {
        validate(duration, &frames)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            duration,
            frames,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn movement_frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter().filter(|f| f.kind == FrameKind::Movement)
    }
}

impl fmt::Display for Recording {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.2}s, {} frames)",
            self.name,
            self.duration,
            self.frames.len()
        )
    }
}

fn validate(duration: f32, frames: &[Frame]) -> Result<(), RecordingError> {
    for (index, pair) in frames.windows(2).enumerate() {
        if pair[1].timestamp < pair[0].timestamp {
            return Err(RecordingError::Unsorted {
                index: index + 1,
                timestamp: pair[1].timestamp,
            });
        }
    }
    if let Some(last) = frames.last() {
        if duration < last.timestamp {
            return Err(RecordingError::DurationTooShort {
                duration,
                last: last.timestamp,
            });
        }
    }
    Ok(())
}

/// On-disk shape of a recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingFile {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub duration: f32,
    pub frame_count: u32,
    pub frames: Vec<Frame>,
}

impl From<&Recording> for RecordingFile {
    fn from(recording: &Recording) -> Self {
        Self {
            id: recording.id.to_string(),
            name: recording.name.clone(),
            created_at: recording.created_at,
            duration: recording.duration,
            frame_count: u32::try_from(recording.frames.len()).unwrap_or(u32::MAX),
            frames: recording.frames.clone(),
        }
    }
}

impl TryFrom<RecordingFile> for Recording {
    type Error = RecordingError;

    fn try_from(file: RecordingFile) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&file.id).map_err(|_| RecordingError::InvalidId(file.id.clone()))?;
        if file.frame_count as usize != file.frames.len() {
            return Err(RecordingError::FrameCountMismatch {
                declared: file.frame_count,
                actual: file.frames.len(),
            });
        }
        validate(file.duration, &file.frames)?;
        Ok(Self {
            id,
            name: file.name,
            created_at: file.created_at,
            duration: file.duration,
            frames: file.frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(kind: FrameKind, x: f32, y: f32, timestamp: f32, sequence: u32) -> Frame {
        Frame {
            kind,
            direction: Vec2::new(x, y),
            timestamp,
            sequence,
        }
    }

    #[test]
    fn reset_zeroes_every_field() {
        let mut f = frame(FrameKind::InputEnd, 1.0, -1.0, 3.5, 9);
        f.reset();
        assert_eq!(f, Frame::default());
    }

    #[test]
    fn from_frames_rejects_unsorted_input() {
        let frames = vec![
            frame(FrameKind::Movement, 1.0, 0.0, 0.5, 0),
            frame(FrameKind::Movement, 0.0, 1.0, 0.2, 1),
        ];
        assert_eq!(
            Recording::from_frames("bad", 1.0, frames),
            Err(RecordingError::Unsorted { index: 1, timestamp: 0.2 })
        );
    }

    #[test]
    fn from_frames_rejects_short_duration() {
        let frames = vec![frame(FrameKind::Movement, 1.0, 0.0, 2.0, 0)];
        assert!(matches!(
            Recording::from_frames("short", 1.0, frames),
            Err(RecordingError::DurationTooShort { .. })
        ));
    }

    #[test]
    fn seal_extends_duration_to_cover_last_frame() {
        let recording = Recording::seal(
            "sealed".into(),
            0.1,
            vec![frame(FrameKind::Movement, 1.0, 0.0, 0.25, 0)],
        );
        assert_eq!(recording.duration(), 0.25);
    }

    #[test]
    fn file_shape_uses_named_direction_fields() {
        let recording = Recording::from_frames(
            "wire",
            0.1,
            vec![
                frame(FrameKind::InputStart, 0.0, 0.0, 0.0, 0),
                frame(FrameKind::Movement, 1.0, 0.0, 0.02, 1),
            ],
        )
        .expect("valid recording");

        let json = serde_json::to_value(RecordingFile::from(&recording)).expect("serializable");
        assert_eq!(json["frame_count"], 2);
        assert_eq!(json["frames"][1]["kind"], "Movement");
        assert_eq!(json["frames"][1]["direction"]["x"], 1.0);
        assert_eq!(json["frames"][0]["kind"], "InputStart");
        assert!(json["created_at"].as_str().is_some());

        let file: RecordingFile = serde_json::from_value(json).expect("deserializable");
        let restored = Recording::try_from(file).expect("valid file");
        assert_eq!(restored, recording);
    }

    #[test]
    fn frame_count_mismatch_is_corrupt() {
        let recording = Recording::from_frames("count", 0.0, Vec::new()).expect("empty is valid");
        let mut file = RecordingFile::from(&recording);
        file.frame_count = 3;
        assert!(matches!(
            Recording::try_from(file),
            Err(RecordingError::FrameCountMismatch { declared: 3, actual: 0 })
        ));
    }
}
