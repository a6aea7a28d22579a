use sceneview_common::DeviceId;
use std::cell::RefCell;
use std::rc::Rc;

/// OS cursor behaviour requested from the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorMode {
    /// Visible, free cursor.
    Normal,
    /// Hidden cursor locked to the window; motion still reported.
    Locked,
}

/// The windowing layer's view of physical input devices.
///
/// The router only needs to enumerate devices and to change the cursor
/// mode when capture toggles. Event delivery itself is pushed by the host
/// through [`InputRouter`](crate::InputRouter) dispatch calls tagged with
/// the originating [`DeviceId`].
pub trait DeviceSource {
    fn keyboards(&self) -> Vec<DeviceId>;
    fn mice(&self) -> Vec<DeviceId>;
    fn set_cursor_mode(&mut self, mode: CursorMode);
}

/// Shared handle to a device source owned by the host.
pub type SharedDeviceSource = Rc<RefCell<dyn DeviceSource>>;

/// Fixed device list with a recorded cursor mode.
///
/// Used by headless hosts and tests in place of a real window.
#[derive(Debug, Clone)]
pub struct StaticDevices {
    keyboards: Vec<DeviceId>,
    mice: Vec<DeviceId>,
    cursor: CursorMode,
    cursor_changes: usize,
}

impl StaticDevices {
    pub fn new(keyboards: Vec<DeviceId>, mice: Vec<DeviceId>) -> Self {
        Self {
            keyboards,
            mice,
            cursor: CursorMode::Normal,
            cursor_changes: 0,
        }
    }

    /// One keyboard (`DeviceId(0)`) and one mouse (`DeviceId(1)`).
    pub fn single() -> Self {
        Self::new(vec![DeviceId(0)], vec![DeviceId(1)])
    }

    pub fn into_shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    pub fn cursor_mode(&self) -> CursorMode {
        self.cursor
    }

    pub fn cursor_changes(&self) -> usize {
        self.cursor_changes
    }
}

impl DeviceSource for StaticDevices {
    fn keyboards(&self) -> Vec<DeviceId> {
        self.keyboards.clone()
    }

    fn mice(&self) -> Vec<DeviceId> {
        self.mice.clone()
    }

    fn set_cursor_mode(&mut self, mode: CursorMode) {
        self.cursor = mode;
        self.cursor_changes += 1;
    }
}
