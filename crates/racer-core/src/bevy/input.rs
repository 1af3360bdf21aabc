//! Keyboard adapter from Bevy's `ButtonInput<KeyCode>` to web key codes.

use bevy::input::ButtonInput;
use bevy::input::keyboard::KeyCode;

use crate::input::InputSource;

/// Resolves a web `KeyboardEvent.code` string to a Bevy key.
pub fn key_code(code: &str) -> Option<KeyCode> {
    let key = match code {
        "ArrowUp" => KeyCode::ArrowUp,
        "ArrowDown" => KeyCode::ArrowDown,
        "ArrowLeft" => KeyCode::ArrowLeft,
        "ArrowRight" => KeyCode::ArrowRight,
        "Space" => KeyCode::Space,
        "Enter" => KeyCode::Enter,
        "Escape" => KeyCode::Escape,
        "Tab" => KeyCode::Tab,
        "Backspace" => KeyCode::Backspace,
        "ShiftLeft" => KeyCode::ShiftLeft,
        "ShiftRight" => KeyCode::ShiftRight,
        "ControlLeft" => KeyCode::ControlLeft,
        "ControlRight" => KeyCode::ControlRight,
        "AltLeft" => KeyCode::AltLeft,
        "AltRight" => KeyCode::AltRight,
        "KeyA" => KeyCode::KeyA,
        "KeyB" => KeyCode::KeyB,
        "KeyC" => KeyCode::KeyC,
        "KeyD" => KeyCode::KeyD,
        "KeyE" => KeyCode::KeyE,
        "KeyF" => KeyCode::KeyF,
        "KeyG" => KeyCode::KeyG,
        "KeyH" => KeyCode::KeyH,
        "KeyI" => KeyCode::KeyI,
        "KeyJ" => KeyCode::KeyJ,
        "KeyK" => KeyCode::KeyK,
        "KeyL" => KeyCode::KeyL,
        "KeyM" => KeyCode::KeyM,
        "KeyN" => KeyCode::KeyN,
        "KeyO" => KeyCode::KeyO,
        "KeyP" => KeyCode::KeyP,
        "KeyQ" => KeyCode::KeyQ,
        "KeyR" => KeyCode::KeyR,
        "KeyS" => KeyCode::KeyS,
        "KeyT" => KeyCode::KeyT,
        "KeyU" => KeyCode::KeyU,
        "KeyV" => KeyCode::KeyV,
        "KeyW" => KeyCode::KeyW,
        "KeyX" => KeyCode::KeyX,
        "KeyY" => KeyCode::KeyY,
        "KeyZ" => KeyCode::KeyZ,
        _ => return None,
    };
    Some(key)
}

impl InputSource for ButtonInput<KeyCode> {
    fn is_pressed(&self, codes: &[&str]) -> bool {
        codes
            .iter()
            .filter_map(|code| key_code(code))
            .any(|key| self.pressed(key))
    }
}

/// Edge-triggered view: only keys pressed since the last frame count.
pub struct JustPressed<'a>(pub &'a ButtonInput<KeyCode>);

impl InputSource for JustPressed<'_> {
    fn is_pressed(&self, codes: &[&str]) -> bool {
        codes
            .iter()
            .filter_map(|code| key_code(code))
            .any(|key| self.0.just_pressed(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyBindings;

    #[test]
    fn test_default_bindings_resolve() {
        let bindings = KeyBindings::default();
        for code in bindings
            .forward
            .iter()
            .chain(&bindings.back)
            .chain(&bindings.left)
            .chain(&bindings.right)
            .chain(&bindings.brake)
            .chain(&bindings.nitrous)
            .chain(&bindings.pause)
        {
            assert!(key_code(code).is_some(), "{code} has no key");
        }
        assert_eq!(key_code("Numpad9"), None);
    }

    #[test]
    fn test_button_input_sampling() {
        let mut keys = ButtonInput::<KeyCode>::default();
        keys.press(KeyCode::KeyW);
        keys.press(KeyCode::ShiftLeft);
        let input = KeyBindings::default().sample(&keys);
        assert!(input.forward);
        assert!(input.nitrous);
        assert!(!input.left);

        keys.clear();
        assert!(!JustPressed(&keys).is_pressed(&["KeyW"]));
        assert!(InputSource::is_pressed(&keys, &["KeyW"]));
    }
}
