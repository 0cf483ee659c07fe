//! Stride Input Layer
//!
//! Directional key sampling, smoothing and edge detection, plus recording,
//! persistence and playback of the resulting input stream.

pub mod capture;
pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod keys;
pub mod persist;
pub mod playback;
pub mod provider;
pub mod recorder;
pub mod store;

pub use config::{InputConfig, RecorderConfig};
pub use error::StoreError;
pub use events::{Edge, EventBus, InputEvent, SubscriptionId};
pub use frame::{Frame, FrameKind, Recording, RecordingError};
pub use keys::{DirectionalKeys, Key, KeyBindings, KeySource, KeyboardState};
pub use persist::{PersistenceWorker, RecordingSink, SaveQueue, SharedStore};
pub use playback::{Playback, PlaybackTick};
pub use provider::{InputProvider, TickEvents};
pub use recorder::{InputRecorder, RecorderEvent, RecorderState, RecorderStats};
pub use store::RecordingStore;
