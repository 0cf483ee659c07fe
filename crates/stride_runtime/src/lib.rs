//! Stride Runtime
//!
//! Wires the input provider, recorder and movement executor into a single
//! fixed-tick context.

pub mod settings;
pub mod shortcuts;
pub mod system;

pub use settings::{Settings, SettingsError};
pub use shortcuts::{Shortcut, ShortcutAction, ShortcutRegistry, SystemCommand, RESET_SHORTCUT};
pub use system::{HistoryEntry, InputSource, InputSystem, SystemStatus, TickReport};
