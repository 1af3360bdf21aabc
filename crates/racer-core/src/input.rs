//! Keyboard bindings and the per-tick control snapshot.

use serde::{Deserialize, Serialize};

/// Anything that can answer "is one of these keys held right now".
///
/// Keys are web `KeyboardEvent.code` strings (`ArrowUp`, `KeyW`, `Space`).
pub trait InputSource {
    fn is_pressed(&self, codes: &[&str]) -> bool;
}

/// Fixed set of held keys, handy for tests and scripted replays.
#[derive(Debug, Clone, Default)]
pub struct HeldKeys(pub Vec<String>);

impl HeldKeys {
    pub fn new(codes: &[&str]) -> Self {
        Self(codes.iter().map(|c| (*c).to_string()).collect())
    }
}

impl InputSource for HeldKeys {
    fn is_pressed(&self, codes: &[&str]) -> bool {
        self.0.iter().any(|held| codes.contains(&held.as_str()))
    }
}

/// Maps driving actions to key codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyBindings {
    pub forward: Vec<String>,
    pub back: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub brake: Vec<String>,
    pub nitrous: Vec<String>,
    pub pause: Vec<String>,
}

fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| (*c).to_string()).collect()
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: codes(&["ArrowUp", "KeyW"]),
            back: codes(&["ArrowDown", "KeyS"]),
            left: codes(&["ArrowLeft", "KeyA"]),
            right: codes(&["ArrowRight", "KeyD"]),
            brake: codes(&["Space"]),
            nitrous: codes(&["ShiftLeft", "ShiftRight"]),
            pause: codes(&["Escape", "KeyP"]),
        }
    }
}

impl KeyBindings {
    /// Samples every driving action once.
    pub fn sample(&self, source: &dyn InputSource) -> ControlInput {
        let held = |keys: &[String]| {
            let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
            source.is_pressed(&refs)
        };
        ControlInput {
            forward: held(&self.forward),
            back: held(&self.back),
            left: held(&self.left),
            right: held(&self.right),
            brake: held(&self.brake),
            nitrous: held(&self.nitrous),
        }
    }

    pub fn pause_pressed(&self, source: &dyn InputSource) -> bool {
        let refs: Vec<&str> = self.pause.iter().map(String::as_str).collect();
        source.is_pressed(&refs)
    }
}

/// Driving actions held during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ControlInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub brake: bool,
    pub nitrous: bool,
}

impl ControlInput {
    pub fn forward() -> Self {
        Self {
            forward: true,
            ..Self::default()
        }
    }

    pub fn turning(&self) -> bool {
        self.left || self.right
    }
}
