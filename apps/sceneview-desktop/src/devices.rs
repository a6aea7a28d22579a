use sceneview_common::DeviceId;
use sceneview_input::{CursorMode, DeviceSource};
use std::sync::Arc;
use winit::window::{CursorGrabMode, Window};

/// winit reports a single logical keyboard and pointer per window.
pub const KEYBOARD: DeviceId = DeviceId(0);
pub const MOUSE: DeviceId = DeviceId(1);

/// Device source for one winit window. Cursor mode changes become cursor
/// grab and visibility changes on that window.
pub struct WinitDevices {
    window: Arc<Window>,
}

impl WinitDevices {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }
}

impl DeviceSource for WinitDevices {
    fn keyboards(&self) -> Vec<DeviceId> {
        vec![KEYBOARD]
    }

    fn mice(&self) -> Vec<DeviceId> {
        vec![MOUSE]
    }

    fn set_cursor_mode(&mut self, mode: CursorMode) {
        match mode {
            CursorMode::Locked => {
                // Not every platform can lock; confining is the next best thing.
                let grab = self
                    .window
                    .set_cursor_grab(CursorGrabMode::Locked)
                    .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
                if let Err(e) = grab {
                    tracing::warn!(error = %e, "cursor grab unavailable");
                }
                self.window.set_cursor_visible(false);
            }
            CursorMode::Normal => {
                if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
                    tracing::warn!(error = %e, "cursor release failed");
                }
                self.window.set_cursor_visible(true);
            }
        }
    }
}
