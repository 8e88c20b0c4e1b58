//! Input forwarding from Godot events to ImGui io.

use godot::classes::{InputEvent, InputEventKey, InputEventMouseButton, InputEventMouseMotion};
use godot::global::{Key, MouseButton};
use godot::obj::Gd;
use imgui::Io;

/// Feeds a Godot input event into ImGui. Returns true when ImGui wants the
/// event for itself, so the caller can mark it handled and keep it away from
/// the scene.
pub fn process_input(io: &mut Io, event: &Gd<InputEvent>) -> bool {
    if let Ok(motion) = event.clone().try_cast::<InputEventMouseMotion>() {
        let pos = motion.get_position();
        io.add_mouse_pos_event([pos.x, pos.y]);
        return io.want_capture_mouse;
    }

    if let Ok(button) = event.clone().try_cast::<InputEventMouseButton>() {
        let index = button.get_button_index();
        let pressed = button.is_pressed();

        if let Some(wheel) = wheel_delta(index) {
            if pressed {
                let factor = button.get_factor();
                let factor = if factor > 0.0 { factor } else { 1.0 };
                io.add_mouse_wheel_event([wheel[0] * factor, wheel[1] * factor]);
            }
        } else if let Some(mapped) = map_mouse_button(index) {
            io.add_mouse_button_event(mapped, pressed);
        }
        return io.want_capture_mouse;
    }

    if let Ok(key) = event.clone().try_cast::<InputEventKey>() {
        let pressed = key.is_pressed();

        if !key.is_echo() {
            let keycode = key.get_keycode();
            if let Some(mapped) = map_key(keycode) {
                io.add_key_event(mapped, pressed);
            }
            if let Some(modifier) = map_modifier(keycode) {
                io.add_key_event(modifier, pressed);
            }
        }

        if pressed {
            if let Some(ch) = char::from_u32(key.get_unicode() as u32) {
                if ch != '\0' && !ch.is_control() {
                    io.add_input_character(ch);
                }
            }
        }
        return io.want_capture_keyboard;
    }

    false
}

/// Scroll direction for wheel pseudo-buttons, `[x, y]` in ImGui convention.
fn wheel_delta(button: MouseButton) -> Option<[f32; 2]> {
    if button == MouseButton::WHEEL_UP {
        Some([0.0, 1.0])
    } else if button == MouseButton::WHEEL_DOWN {
        Some([0.0, -1.0])
    } else if button == MouseButton::WHEEL_LEFT {
        Some([-1.0, 0.0])
    } else if button == MouseButton::WHEEL_RIGHT {
        Some([1.0, 0.0])
    } else {
        None
    }
}

const MOUSE_MAP: &[(MouseButton, imgui::MouseButton)] = &[
    (MouseButton::LEFT, imgui::MouseButton::Left),
    (MouseButton::RIGHT, imgui::MouseButton::Right),
    (MouseButton::MIDDLE, imgui::MouseButton::Middle),
    (MouseButton::XBUTTON1, imgui::MouseButton::Extra1),
    (MouseButton::XBUTTON2, imgui::MouseButton::Extra2),
];

pub fn map_mouse_button(button: MouseButton) -> Option<imgui::MouseButton> {
    MOUSE_MAP
        .iter()
        .find(|(godot, _)| *godot == button)
        .map(|(_, mapped)| *mapped)
}

/// Godot reports plain modifier keys; ImGui additionally tracks them as
/// virtual `Mod*` keys used for shortcut routing.
pub fn map_modifier(key: Key) -> Option<imgui::Key> {
    let mapped = if key == Key::SHIFT {
        imgui::Key::ModShift
    } else if key == Key::CTRL {
        imgui::Key::ModCtrl
    } else if key == Key::ALT {
        imgui::Key::ModAlt
    } else if key == Key::META {
        imgui::Key::ModSuper
    } else {
        return None;
    };
    Some(mapped)
}

#[rustfmt::skip]
const KEY_MAP: &[(Key, imgui::Key)] = &[
    (Key::TAB, imgui::Key::Tab),
    (Key::LEFT, imgui::Key::LeftArrow),
    (Key::RIGHT, imgui::Key::RightArrow),
    (Key::UP, imgui::Key::UpArrow),
    (Key::DOWN, imgui::Key::DownArrow),
    (Key::PAGEUP, imgui::Key::PageUp),
    (Key::PAGEDOWN, imgui::Key::PageDown),
    (Key::HOME, imgui::Key::Home),
    (Key::END, imgui::Key::End),
    (Key::INSERT, imgui::Key::Insert),
    (Key::DELETE, imgui::Key::Delete),
    (Key::BACKSPACE, imgui::Key::Backspace),
    (Key::SPACE, imgui::Key::Space),
    (Key::ENTER, imgui::Key::Enter),
    (Key::ESCAPE, imgui::Key::Escape),
    (Key::SHIFT, imgui::Key::LeftShift),
    (Key::CTRL, imgui::Key::LeftCtrl),
    (Key::ALT, imgui::Key::LeftAlt),
    (Key::META, imgui::Key::LeftSuper),
    (Key::MENU, imgui::Key::Menu),
    (Key::CAPSLOCK, imgui::Key::CapsLock),
    (Key::SCROLLLOCK, imgui::Key::ScrollLock),
    (Key::NUMLOCK, imgui::Key::NumLock),
    (Key::PAUSE, imgui::Key::Pause),
    (Key::APOSTROPHE, imgui::Key::Apostrophe),
    (Key::COMMA, imgui::Key::Comma),
    (Key::MINUS, imgui::Key::Minus),
    (Key::PERIOD, imgui::Key::Period),
    (Key::SLASH, imgui::Key::Slash),
    (Key::SEMICOLON, imgui::Key::Semicolon),
    (Key::EQUAL, imgui::Key::Equal),
    (Key::BRACKETLEFT, imgui::Key::LeftBracket),
    (Key::BACKSLASH, imgui::Key::Backslash),
    (Key::BRACKETRIGHT, imgui::Key::RightBracket),
    (Key::QUOTELEFT, imgui::Key::GraveAccent),
    (Key::KEY_0, imgui::Key::Alpha0),
    (Key::KEY_1, imgui::Key::Alpha1),
    (Key::KEY_2, imgui::Key::Alpha2),
    (Key::KEY_3, imgui::Key::Alpha3),
    (Key::KEY_4, imgui::Key::Alpha4),
    (Key::KEY_5, imgui::Key::Alpha5),
    (Key::KEY_6, imgui::Key::Alpha6),
    (Key::KEY_7, imgui::Key::Alpha7),
    (Key::KEY_8, imgui::Key::Alpha8),
    (Key::KEY_9, imgui::Key::Alpha9),
    (Key::A, imgui::Key::A),
    (Key::B, imgui::Key::B),
    (Key::C, imgui::Key::C),
    (Key::D, imgui::Key::D),
    (Key::E, imgui::Key::E),
    (Key::F, imgui::Key::F),
    (Key::G, imgui::Key::G),
    (Key::H, imgui::Key::H),
    (Key::I, imgui::Key::I),
    (Key::J, imgui::Key::J),
    (Key::K, imgui::Key::K),
    (Key::L, imgui::Key::L),
    (Key::M, imgui::Key::M),
    (Key::N, imgui::Key::N),
    (Key::O, imgui::Key::O),
    (Key::P, imgui::Key::P),
    (Key::Q, imgui::Key::Q),
    (Key::R, imgui::Key::R),
    (Key::S, imgui::Key::S),
    (Key::T, imgui::Key::T),
    (Key::U, imgui::Key::U),
    (Key::V, imgui::Key::V),
    (Key::W, imgui::Key::W),
    (Key::X, imgui::Key::X),
    (Key::Y, imgui::Key::Y),
    (Key::Z, imgui::Key::Z),
    (Key::F1, imgui::Key::F1),
    (Key::F2, imgui::Key::F2),
    (Key::F3, imgui::Key::F3),
    (Key::F4, imgui::Key::F4),
    (Key::F5, imgui::Key::F5),
    (Key::F6, imgui::Key::F6),
    (Key::F7, imgui::Key::F7),
    (Key::F8, imgui::Key::F8),
    (Key::F9, imgui::Key::F9),
    (Key::F10, imgui::Key::F10),
    (Key::F11, imgui::Key::F11),
    (Key::F12, imgui::Key::F12),
    (Key::KP_0, imgui::Key::Keypad0),
    (Key::KP_1, imgui::Key::Keypad1),
    (Key::KP_2, imgui::Key::Keypad2),
    (Key::KP_3, imgui::Key::Keypad3),
    (Key::KP_4, imgui::Key::Keypad4),
    (Key::KP_5, imgui::Key::Keypad5),
    (Key::KP_6, imgui::Key::Keypad6),
    (Key::KP_7, imgui::Key::Keypad7),
    (Key::KP_8, imgui::Key::Keypad8),
    (Key::KP_9, imgui::Key::Keypad9),
    (Key::KP_PERIOD, imgui::Key::KeypadDecimal),
    (Key::KP_DIVIDE, imgui::Key::KeypadDivide),
    (Key::KP_MULTIPLY, imgui::Key::KeypadMultiply),
    (Key::KP_SUBTRACT, imgui::Key::KeypadSubtract),
    (Key::KP_ADD, imgui::Key::KeypadAdd),
    (Key::KP_ENTER, imgui::Key::KeypadEnter),
];

/// Translates a Godot keycode. Unknown keys map to `None` and are simply not
/// forwarded.
pub fn map_key(key: Key) -> Option<imgui::Key> {
    KEY_MAP
        .iter()
        .find(|(godot, _)| *godot == key)
        .map(|(_, mapped)| *mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_common_keys() {
        assert_eq!(map_key(Key::ESCAPE), Some(imgui::Key::Escape));
        assert_eq!(map_key(Key::A), Some(imgui::Key::A));
        assert_eq!(map_key(Key::KEY_0), Some(imgui::Key::Alpha0));
        assert_eq!(map_key(Key::KP_ENTER), Some(imgui::Key::KeypadEnter));
        assert_eq!(map_key(Key::NONE), None);
    }

    #[test]
    fn modifiers_map_to_virtual_mod_keys() {
        assert_eq!(map_modifier(Key::SHIFT), Some(imgui::Key::ModShift));
        assert_eq!(map_modifier(Key::CTRL), Some(imgui::Key::ModCtrl));
        assert_eq!(map_modifier(Key::ALT), Some(imgui::Key::ModAlt));
        assert_eq!(map_modifier(Key::META), Some(imgui::Key::ModSuper));
        assert_eq!(map_modifier(Key::A), None);
    }

    #[test]
    fn maps_mouse_buttons_and_wheel() {
        assert_eq!(
            map_mouse_button(MouseButton::LEFT),
            Some(imgui::MouseButton::Left)
        );
        assert_eq!(
            map_mouse_button(MouseButton::XBUTTON2),
            Some(imgui::MouseButton::Extra2)
        );
        assert_eq!(map_mouse_button(MouseButton::WHEEL_UP), None);
        assert_eq!(wheel_delta(MouseButton::WHEEL_UP), Some([0.0, 1.0]));
        assert_eq!(wheel_delta(MouseButton::WHEEL_LEFT), Some([-1.0, 0.0]));
        assert_eq!(wheel_delta(MouseButton::LEFT), None);
    }

    #[test]
    fn key_map_has_no_duplicate_sources() {
        for (i, (a, _)) in KEY_MAP.iter().enumerate() {
            for (b, _) in &KEY_MAP[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
