use glam::Vec2;
use sceneview_common::{Key, MouseButton};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Whether mouse movement drives the camera.
///
/// `Captured` hides and locks the cursor and routes mouse motion into
/// free-look; `Uncaptured` leaves the cursor alone and ignores motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CaptureMode {
    Captured,
    #[default]
    Uncaptured,
}

impl CaptureMode {
    pub fn is_captured(self) -> bool {
        matches!(self, Self::Captured)
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Captured => Self::Uncaptured,
            Self::Uncaptured => Self::Captured,
        }
    }
}

impl From<bool> for CaptureMode {
    fn from(captured: bool) -> Self {
        if captured {
            Self::Captured
        } else {
            Self::Uncaptured
        }
    }
}

/// Input state shared between the router and the active scene.
///
/// Everything runs on the host's frame thread, so a plain `Rc<RefCell<_>>`
/// is enough.
pub type SharedInputState = Rc<RefCell<InputState>>;

/// Currently depressed keys and buttons, last mouse position and capture mode.
///
/// A key is in the pressed set iff its most recent event was a key-down.
/// Every mutation is total: duplicate downs and stray ups are no-ops.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pressed_keys: HashSet<Key>,
    pressed_buttons: HashSet<MouseButton>,
    mouse_position: Option<Vec2>,
    capture: CaptureMode,
    capture_changes: u64,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedInputState {
        Rc::new(RefCell::new(self))
    }

    pub fn record_key_down(&mut self, key: Key) {
        self.pressed_keys.insert(key);
    }

    pub fn record_key_up(&mut self, key: Key) {
        self.pressed_keys.remove(&key);
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed_keys.contains(&key)
    }

    pub fn pressed_keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.pressed_keys.iter().copied()
    }

    pub fn pressed_count(&self) -> usize {
        self.pressed_keys.len()
    }

    pub fn record_button_down(&mut self, button: MouseButton) {
        self.pressed_buttons.insert(button);
    }

    pub fn record_button_up(&mut self, button: MouseButton) {
        self.pressed_buttons.remove(&button);
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    pub fn record_mouse_position(&mut self, position: Vec2) {
        self.mouse_position = Some(position);
    }

    /// Last reported cursor position in window coordinates, if any.
    pub fn mouse_position(&self) -> Option<Vec2> {
        self.mouse_position
    }

    /// Forget every held key and button.
    ///
    /// Called when listeners are detached: the matching key-ups will never
    /// be delivered, so keeping the keys would leave them stuck down.
    pub fn release_all(&mut self) {
        self.pressed_keys.clear();
        self.pressed_buttons.clear();
    }

    pub fn set_captured(&mut self, captured: bool) {
        self.set_capture_mode(CaptureMode::from(captured));
    }

    pub fn is_captured(&self) -> bool {
        self.capture.is_captured()
    }

    pub fn set_capture_mode(&mut self, mode: CaptureMode) {
        if self.capture != mode {
            self.capture = mode;
            self.capture_changes += 1;
        }
    }

    pub fn capture_mode(&self) -> CaptureMode {
        self.capture
    }

    /// Flip the capture mode and return the new one.
    pub fn toggle_capture(&mut self) -> CaptureMode {
        self.set_capture_mode(self.capture.toggled());
        self.capture
    }

    /// Number of capture mode transitions so far.
    ///
    /// Lets readers notice a capture round trip that happened between two
    /// of their own observations, which comparing modes alone would miss.
    pub fn capture_changes(&self) -> u64 {
        self.capture_changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_events_means_not_pressed() {
        let state = InputState::new();
        assert!(!state.is_pressed(Key::W));
        assert_eq!(state.pressed_count(), 0);
    }

    #[test]
    fn pressed_tracks_last_event() {
        let events = [
            (Key::W, true),
            (Key::A, true),
            (Key::W, false),
            (Key::S, false),
            (Key::A, true),
            (Key::D, true),
            (Key::D, false),
            (Key::W, true),
        ];
        let mut state = InputState::new();
        for (key, down) in events {
            if down {
                state.record_key_down(key);
            } else {
                state.record_key_up(key);
            }
        }
        assert!(state.is_pressed(Key::W));
        assert!(state.is_pressed(Key::A));
        assert!(!state.is_pressed(Key::S));
        assert!(!state.is_pressed(Key::D));
    }

    #[test]
    fn key_down_is_idempotent() {
        let mut once = InputState::new();
        once.record_key_down(Key::Space);

        let mut twice = InputState::new();
        twice.record_key_down(Key::Space);
        twice.record_key_down(Key::Space);

        assert_eq!(once.pressed_count(), twice.pressed_count());
        assert_eq!(once.is_pressed(Key::Space), twice.is_pressed(Key::Space));
    }

    #[test]
    fn stray_key_up_is_ignored() {
        let mut state = InputState::new();
        state.record_key_up(Key::Escape);
        assert_eq!(state.pressed_count(), 0);
    }

    #[test]
    fn release_all_clears_keys_and_buttons() {
        let mut state = InputState::new();
        state.record_key_down(Key::W);
        state.record_button_down(MouseButton::Right);
        state.release_all();
        assert!(!state.is_pressed(Key::W));
        assert!(!state.is_button_down(MouseButton::Right));
    }

    #[test]
    fn capture_toggle() {
        let mut state = InputState::new();
        assert!(!state.is_captured());
        assert_eq!(state.toggle_capture(), CaptureMode::Captured);
        assert!(state.is_captured());
        state.set_captured(false);
        assert_eq!(state.capture_mode(), CaptureMode::Uncaptured);
    }

    #[test]
    fn capture_changes_count_transitions_only() {
        let mut state = InputState::new();
        state.set_capture_mode(CaptureMode::Uncaptured);
        assert_eq!(state.capture_changes(), 0);
        state.set_capture_mode(CaptureMode::Captured);
        state.set_captured(true);
        assert_eq!(state.capture_changes(), 1);
        state.toggle_capture();
        state.toggle_capture();
        assert_eq!(state.capture_changes(), 3);
        assert!(state.is_captured());
    }

    #[test]
    fn mouse_position_is_recorded() {
        let mut state = InputState::new();
        assert!(state.mouse_position().is_none());
        state.record_mouse_position(Vec2::new(4.0, 2.0));
        assert_eq!(state.mouse_position(), Some(Vec2::new(4.0, 2.0)));
    }
}
