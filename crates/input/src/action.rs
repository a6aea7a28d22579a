use crate::state::InputState;
use sceneview_common::Key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A high-level action a key can be bound to.
///
/// Scenes consume actions, never raw key codes, so rebinding keys in the
/// configuration changes behaviour without touching scene code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    MoveForward,
    MoveBack,
    StrafeLeft,
    StrafeRight,
    MoveUp,
    MoveDown,
    /// Held modifier that multiplies movement speed.
    Sprint,
    /// Edge-triggered: flips capture mode on key-down.
    ToggleCapture,
    /// Edge-triggered: asks the host to close the viewer.
    Quit,
}

/// Per-axis movement request derived from the held keys.
///
/// Each component is -1, 0 or +1; opposing keys cancel out.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveIntent {
    pub forward: f32,
    pub right: f32,
    pub up: f32,
    pub sprint: bool,
}

impl MoveIntent {
    pub fn is_idle(&self) -> bool {
        self.forward == 0.0 && self.right == 0.0 && self.up == 0.0
    }
}

/// Key to action mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBindings {
    map: BTreeMap<Key, Action>,
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    pub fn bind(&mut self, key: Key, action: Action) -> &mut Self {
        self.map.insert(key, action);
        self
    }

    pub fn action_for(&self, key: Key) -> Option<Action> {
        self.map.get(&key).copied()
    }

    /// Keys currently bound to `action`.
    pub fn keys_for(&self, action: Action) -> impl Iterator<Item = Key> + '_ {
        self.map
            .iter()
            .filter(move |(_, a)| **a == action)
            .map(|(k, _)| *k)
    }

    pub fn is_active(&self, state: &InputState, action: Action) -> bool {
        self.keys_for(action).any(|k| state.is_pressed(k))
    }

    /// Fold the held keys into a movement request.
    pub fn intent(&self, state: &InputState) -> MoveIntent {
        let axis = |pos: Action, neg: Action| {
            let p = self.is_active(state, pos) as i8;
            let n = self.is_active(state, neg) as i8;
            (p - n) as f32
        };
        MoveIntent {
            forward: axis(Action::MoveForward, Action::MoveBack),
            right: axis(Action::StrafeRight, Action::StrafeLeft),
            up: axis(Action::MoveUp, Action::MoveDown),
            sprint: self.is_active(state, Action::Sprint),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut b = Self::empty();
        b.bind(Key::W, Action::MoveForward)
            .bind(Key::S, Action::MoveBack)
            .bind(Key::A, Action::StrafeLeft)
            .bind(Key::D, Action::StrafeRight)
            .bind(Key::Space, Action::MoveUp)
            .bind(Key::ControlLeft, Action::MoveDown)
            .bind(Key::ShiftLeft, Action::Sprint)
            .bind(Key::F1, Action::ToggleCapture)
            .bind(Key::Escape, Action::Quit);
        b
    }
}
