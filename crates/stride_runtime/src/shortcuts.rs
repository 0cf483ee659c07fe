//! Named key shortcuts
//!
//! A shortcut fires on the tick its primary key goes down while the optional
//! modifier is held. Holding the primary key does not repeat it.

use std::collections::BTreeMap;
use std::fmt;
use stride_input::{Key, KeySource};
use tracing::debug;

/// Name of the built-in Ctrl+R binding.
pub const RESET_SHORTCUT: &str = "reset_system";

/// Operations on the input system a shortcut can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemCommand {
    Reset,
    TogglePause,
    ToggleRecording,
    StopPlayback,
}

pub enum ShortcutAction {
    Command(SystemCommand),
    Custom(Box<dyn FnMut()>),
}

impl fmt::Debug for ShortcutAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(command) => f.debug_tuple("Command").field(command).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<SystemCommand> for ShortcutAction {
    fn from(command: SystemCommand) -> Self {
        Self::Command(command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortcut {
    pub primary: Key,
    pub modifier: Option<Key>,
}

impl Shortcut {
    pub fn new(primary: Key) -> Self {
        Self {
            primary,
            modifier: None,
        }
    }

    pub fn with_modifier(primary: Key, modifier: Key) -> Self {
        Self {
            primary,
            modifier: Some(modifier),
        }
    }
}

#[derive(Debug)]
struct Entry {
    shortcut: Shortcut,
    action: ShortcutAction,
    primary_down: bool,
}

/// Shortcuts keyed by name, polled once per tick in name order.
#[derive(Debug, Default)]
pub struct ShortcutRegistry {
    entries: BTreeMap<String, Entry>,
}

impl ShortcutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding only Ctrl+R bound to [`SystemCommand::Reset`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            RESET_SHORTCUT,
            Shortcut::with_modifier(Key::R, Key::Ctrl),
            SystemCommand::Reset,
        );
        registry
    }

    /// Bind `name`, replacing any previous binding under the same name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        shortcut: Shortcut,
        action: impl Into<ShortcutAction>,
    ) {
        let name = name.into();
        debug!(name = %name, ?shortcut, "shortcut registered");
        self.entries.insert(
            name,
            Entry {
                shortcut,
                action: action.into(),
                primary_down: false,
            },
        );
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Shortcut> {
        self.entries.get(name).map(|entry| entry.shortcut)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every shortcut against `keys`. Custom actions run in place;
    /// system commands are appended to `commands` for the owner to apply.
    pub fn poll(&mut self, keys: &impl KeySource, commands: &mut Vec<SystemCommand>) {
        for (name, entry) in &mut self.entries {
            let down = keys.is_key_down(entry.shortcut.primary);
            let pressed = down && !entry.primary_down;
            entry.primary_down = down;

            let modifier_held = entry
                .shortcut
                .modifier
                .map_or(true, |modifier| keys.is_key_down(modifier));
            if !(pressed && modifier_held) {
                continue;
            }

            debug!(name = %name, "shortcut triggered");
            match &mut entry.action {
                ShortcutAction::Command(command) => commands.push(*command),
                ShortcutAction::Custom(action) => action(),
            }
        }
    }
}
