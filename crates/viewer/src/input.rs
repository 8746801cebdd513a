//! Last-known input table shared between event handlers and the frame tick.
//!
//! Handlers overwrite the pressed-action set and add to the look accumulator;
//! the frame tick reads whatever is current and drains the accumulator. There
//! is no event queue, so a press and release landing between two ticks is
//! simply not observed.
use std::collections::HashMap;

use glam::DVec2;
use viewconfig::{normalize_key_name, KeySection};

use crate::camera::MoveAxis;

/// Pointer look speed at a mouse sensitivity of 1 (radians per pixel).
pub const MOUSE_RADIANS_PER_PIXEL: f64 = 0.002;

/// Divisor applied to `dt * movement_speed` for keyboard flight.
pub const MOVEMENT_SCALE: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputAction {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

impl InputAction {
    pub const ALL: [InputAction; 6] = [
        InputAction::Forward,
        InputAction::Back,
        InputAction::Left,
        InputAction::Right,
        InputAction::Up,
        InputAction::Down,
    ];

    /// Camera axis and direction this action moves along.
    pub fn movement(self) -> (MoveAxis, f64) {
        match self {
            InputAction::Forward => (MoveAxis::Forward, 1.0),
            InputAction::Back => (MoveAxis::Forward, -1.0),
            InputAction::Right => (MoveAxis::Right, 1.0),
            InputAction::Left => (MoveAxis::Right, -1.0),
            InputAction::Up => (MoveAxis::WorldUp, 1.0),
            InputAction::Down => (MoveAxis::WorldUp, -1.0),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Physical key name to action lookup, built once from configuration.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<String, InputAction>,
}

impl KeyBindings {
    pub fn from_config(keys: &KeySection) -> Self {
        let actions = [
            (InputAction::Forward, &keys.forward),
            (InputAction::Back, &keys.back),
            (InputAction::Left, &keys.left),
            (InputAction::Right, &keys.right),
            (InputAction::Up, &keys.up),
            (InputAction::Down, &keys.down),
        ];
        let map = actions
            .into_iter()
            .flat_map(|(action, names)| {
                names
                    .iter()
                    .map(move |name| (normalize_key_name(name), action))
            })
            .collect();
        Self { map }
    }

    pub fn resolve(&self, key: &str) -> Option<InputAction> {
        self.map.get(&normalize_key_name(key)).copied()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::from_config(&KeySection::default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    pressed: [bool; InputAction::ALL.len()],
    look: DVec2,
    captured: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, action: InputAction) {
        self.pressed[action.index()] = true;
    }

    pub fn release(&mut self, action: InputAction) {
        self.pressed[action.index()] = false;
    }

    /// Resolves a physical key and marks its action pressed. Unbound keys are
    /// ignored and reported as `None`.
    pub fn key_down(&mut self, bindings: &KeyBindings, key: &str) -> Option<InputAction> {
        let action = bindings.resolve(key)?;
        self.press(action);
        Some(action)
    }

    pub fn key_up(&mut self, bindings: &KeyBindings, key: &str) -> Option<InputAction> {
        let action = bindings.resolve(key)?;
        self.release(action);
        Some(action)
    }

    pub fn is_pressed(&self, action: InputAction) -> bool {
        self.pressed[action.index()]
    }

    pub fn pressed(&self) -> impl Iterator<Item = InputAction> + '_ {
        InputAction::ALL
            .into_iter()
            .filter(|action| self.is_pressed(*action))
    }

    /// Adds a pointer delta (pixels). Deltas are only collected while the
    /// pointer is captured.
    pub fn pointer_moved(&mut self, dx: f64, dy: f64) {
        if self.captured && dx.is_finite() && dy.is_finite() {
            self.look += DVec2::new(dx, dy);
        }
    }

    pub fn set_captured(&mut self, captured: bool) {
        self.captured = captured;
        if !captured {
            self.look = DVec2::ZERO;
        }
    }

    pub fn captured(&self) -> bool {
        self.captured
    }

    /// Drains the accumulated look delta.
    pub fn take_look(&mut self) -> DVec2 {
        std::mem::take(&mut self.look)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_resolve_wasd_space_shift() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.resolve("W"), Some(InputAction::Forward));
        assert_eq!(bindings.resolve("s"), Some(InputAction::Back));
        assert_eq!(bindings.resolve(" "), Some(InputAction::Up));
        assert_eq!(bindings.resolve("Shift"), Some(InputAction::Down));
        assert_eq!(bindings.resolve("x"), None);
    }

    #[test]
    fn key_state_is_last_write_wins() {
        let bindings = KeyBindings::default();
        let mut input = InputState::new();
        input.key_down(&bindings, "d");
        input.key_down(&bindings, "d");
        assert!(input.is_pressed(InputAction::Right));
        input.key_up(&bindings, "d");
        assert!(!input.is_pressed(InputAction::Right));
        assert_eq!(input.key_down(&bindings, "p"), None);
        assert_eq!(input.pressed().count(), 0);
    }

    #[test]
    fn look_accumulates_only_while_captured() {
        let mut input = InputState::new();
        input.pointer_moved(10.0, 5.0);
        assert_eq!(input.take_look(), DVec2::ZERO);

        input.set_captured(true);
        input.pointer_moved(10.0, 5.0);
        input.pointer_moved(-4.0, 1.0);
        assert_eq!(input.take_look(), DVec2::new(6.0, 6.0));
        assert_eq!(input.take_look(), DVec2::ZERO);

        input.pointer_moved(3.0, 3.0);
        input.set_captured(false);
        assert_eq!(input.take_look(), DVec2::ZERO);
    }
}
