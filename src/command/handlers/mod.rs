//! Command handlers for different device kinds

mod lock;
mod switch;

pub use lock::handle_lock;
pub use switch::handle_switch;

use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Action part of a command token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    On,
    Off,
    Toggle,
    Lock,
    Unlock,
}

impl Action {
    /// Parse an action word, case-insensitively. `OPEN`/`CLOSE` are lock aliases.
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "ON" => Some(Action::On),
            "OFF" => Some(Action::Off),
            "TOGGLE" => Some(Action::Toggle),
            "LOCK" | "CLOSE" => Some(Action::Lock),
            "UNLOCK" | "OPEN" => Some(Action::Unlock),
            _ => None,
        }
    }
}

/// Physical state of one simulated device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Switch { on: bool },
    Lock { locked: bool },
}

impl DeviceState {
    /// Power-on state for a device first seen by name
    fn initial_for(name: &str) -> Self {
        if name.ends_with("DOOR") || name.ends_with("LOCK") {
            DeviceState::Lock { locked: true }
        } else {
            DeviceState::Switch { on: false }
        }
    }
}

/// Simulated outputs of the device, keyed by normalized name
#[derive(Debug, Default)]
pub struct DeviceBank {
    devices: HashMap<String, DeviceState>,
}

impl DeviceBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// `"Living Room Fan"` and `"LIVING_ROOM_FAN"` name the same output
    pub fn normalize(name: &str) -> String {
        name.split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_ascii_uppercase()
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<DeviceState> {
        self.devices.get(&Self::normalize(name)).copied()
    }

    /// Current state if it `fits`, creating the device in its power-on state if unseen.
    /// A device that does not fit is left untouched and never created.
    fn state_mut_if(
        &mut self,
        name: &str,
        fits: impl Fn(&DeviceState) -> bool,
    ) -> Option<&mut DeviceState> {
        let key = Self::normalize(name);
        let initial = DeviceState::initial_for(&key);
        match self.devices.entry(key) {
            Entry::Occupied(entry) => {
                let state = entry.into_mut();
                if fits(state) {
                    Some(state)
                } else {
                    None
                }
            }
            Entry::Vacant(entry) => {
                if fits(&initial) {
                    Some(entry.insert(initial))
                } else {
                    None
                }
            }
        }
    }
}

/// Context passed to command handlers
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub device: String,
    pub action: Action,
}
