use glam::Vec2;
use sceneview_common::{Key, MouseButton};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Receives keyboard events routed from physical keyboards.
pub trait KeyboardListener {
    fn on_key_down(&mut self, key: Key, scancode: u32);
    fn on_key_up(&mut self, key: Key, scancode: u32);
}

/// Receives mouse events routed from physical mice.
///
/// Button events default to no-ops; most listeners only care about motion.
pub trait MouseListener {
    fn on_mouse_move(&mut self, position: Vec2);

    fn on_button_down(&mut self, _button: MouseButton) {}

    fn on_button_up(&mut self, _button: MouseButton) {}
}

/// Non-owning handle to a keyboard listener.
pub type KeyboardHandle = Weak<RefCell<dyn KeyboardListener>>;

/// Non-owning handle to a mouse listener.
pub type MouseHandle = Weak<RefCell<dyn MouseListener>>;

/// Downgrade a concrete listener into a keyboard handle.
pub fn keyboard_handle<L: KeyboardListener + 'static>(listener: &Rc<RefCell<L>>) -> KeyboardHandle {
    let erased: Rc<RefCell<dyn KeyboardListener>> = listener.clone();
    Rc::downgrade(&erased)
}

/// Downgrade a concrete listener into a mouse handle.
pub fn mouse_handle<L: MouseListener + 'static>(listener: &Rc<RefCell<L>>) -> MouseHandle {
    let erased: Rc<RefCell<dyn MouseListener>> = listener.clone();
    Rc::downgrade(&erased)
}
