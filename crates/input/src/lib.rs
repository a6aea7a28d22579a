//! Input capture: pressed-key state, capture mode, and device routing.
//!
//! # Invariants
//! - A key is pressed iff its last observed event was a key-down.
//! - At most one keyboard and one mouse listener are active per router.
//! - Detaching listeners releases every held key.
//! - All of this runs on the host's frame thread; nothing here is `Send`.

pub mod action;
pub mod device;
pub mod listener;
pub mod router;
pub mod state;

pub use action::{Action, KeyBindings, MoveIntent};
pub use device::{CursorMode, DeviceSource, SharedDeviceSource, StaticDevices};
pub use listener::{
    KeyboardHandle, KeyboardListener, MouseHandle, MouseListener, keyboard_handle, mouse_handle,
};
pub use router::{InputError, InputRouter};
pub use state::{CaptureMode, InputState, SharedInputState};

pub fn crate_info() -> &'static str {
    concat!("sceneview-input v", env!("CARGO_PKG_VERSION"))
}
