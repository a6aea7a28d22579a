use crate::device::{CursorMode, SharedDeviceSource};
use crate::listener::{KeyboardHandle, MouseHandle};
use crate::state::{CaptureMode, InputState, SharedInputState};
use glam::Vec2;
use sceneview_common::{DeviceId, Key, MouseButton};
use std::rc::Weak;

/// Errors from listener management.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("listeners are already subscribed; unsubscribe before subscribing again")]
    AlreadySubscribed,
}

enum Binding {
    Keyboard(KeyboardHandle),
    Mouse(MouseHandle),
}

/// One routed (device, listener) pair.
struct Registration {
    device: DeviceId,
    binding: Binding,
}

/// Bridges physical devices to the active keyboard and mouse listeners.
///
/// The host pushes raw events tagged with their [`DeviceId`]; the router
/// forwards them only through registrations created by [`subscribe`].
/// Listeners are held weakly: the router never keeps a scene alive.
///
/// At most one keyboard and one mouse listener are active at a time.
/// Subscribing again without unsubscribing is rejected so events are never
/// delivered twice.
///
/// [`subscribe`]: InputRouter::subscribe
pub struct InputRouter {
    sources: Vec<SharedDeviceSource>,
    registrations: Vec<Registration>,
    keyboard: Option<KeyboardHandle>,
    mouse: Option<MouseHandle>,
    state: SharedInputState,
    applied_cursor: Option<CursorMode>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::with_state(InputState::new())
    }

    pub fn with_state(state: InputState) -> Self {
        Self {
            sources: Vec::new(),
            registrations: Vec::new(),
            keyboard: None,
            mouse: None,
            state: state.into_shared(),
            applied_cursor: None,
        }
    }

    /// Shared handle to the input state mutated by listeners.
    pub fn input_state(&self) -> SharedInputState {
        self.state.clone()
    }

    /// Record a device source whose devices future subscriptions route through.
    pub fn attach(&mut self, source: Option<SharedDeviceSource>) {
        let Some(source) = source else {
            return;
        };
        let mode = cursor_mode_for(self.state.borrow().capture_mode());
        {
            let mut src = source.borrow_mut();
            tracing::debug!(
                keyboards = src.keyboards().len(),
                mice = src.mice().len(),
                "device source attached"
            );
            src.set_cursor_mode(mode);
        }
        self.applied_cursor = Some(mode);
        self.sources.push(source);
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Route every attached keyboard to `keyboard` and every mouse to `mouse`.
    ///
    /// Without attached sources this is a silent no-op. Either listener may
    /// be `None`, which leaves that half unrouted.
    pub fn subscribe(
        &mut self,
        keyboard: Option<KeyboardHandle>,
        mouse: Option<MouseHandle>,
    ) -> Result<(), InputError> {
        if self.sources.is_empty() {
            tracing::trace!("subscribe ignored: no device source attached");
            return Ok(());
        }
        if self.is_subscribed() {
            return Err(InputError::AlreadySubscribed);
        }

        let mut keyboards = 0usize;
        let mut mice = 0usize;
        for source in &self.sources {
            let src = source.borrow();
            if let Some(handle) = &keyboard {
                for device in src.keyboards() {
                    self.registrations.push(Registration {
                        device,
                        binding: Binding::Keyboard(handle.clone()),
                    });
                    keyboards += 1;
                }
            }
            if let Some(handle) = &mouse {
                for device in src.mice() {
                    self.registrations.push(Registration {
                        device,
                        binding: Binding::Mouse(handle.clone()),
                    });
                    mice += 1;
                }
            }
        }

        self.keyboard = keyboard;
        self.mouse = mouse;
        tracing::debug!(keyboards, mice, "subscribed listeners");
        Ok(())
    }

    /// Remove the registrations created for these listeners.
    ///
    /// The active listener slots are cleared whether or not anything matched,
    /// and every held key is released so no key stays stuck down once its
    /// key-up can no longer arrive.
    pub fn unsubscribe(&mut self, keyboard: Option<&KeyboardHandle>, mouse: Option<&MouseHandle>) {
        if self.sources.is_empty() {
            tracing::trace!("unsubscribe ignored: no device source attached");
            return;
        }

        let before = self.registrations.len();
        self.registrations.retain(|reg| match &reg.binding {
            Binding::Keyboard(h) => !keyboard.is_some_and(|k| Weak::ptr_eq(h, k)),
            Binding::Mouse(h) => !mouse.is_some_and(|m| Weak::ptr_eq(h, m)),
        });
        let removed = before - self.registrations.len();

        self.keyboard = None;
        self.mouse = None;
        self.state.borrow_mut().release_all();
        tracing::debug!(removed, remaining = self.registrations.len(), "unsubscribed listeners");
    }

    pub fn is_subscribed(&self) -> bool {
        self.keyboard.is_some() || self.mouse.is_some()
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    /// Deliver a key-down from `device`. Returns how many listeners received it.
    pub fn key_down(&mut self, device: DeviceId, key: Key, scancode: u32) -> usize {
        let delivered = self.each_keyboard(device, |l| l.on_key_down(key, scancode));
        self.sync_cursor();
        delivered
    }

    /// Deliver a key-up from `device`. Returns how many listeners received it.
    pub fn key_up(&mut self, device: DeviceId, key: Key, scancode: u32) -> usize {
        let delivered = self.each_keyboard(device, |l| l.on_key_up(key, scancode));
        self.sync_cursor();
        delivered
    }

    /// Deliver a cursor position from `device`.
    pub fn mouse_move(&mut self, device: DeviceId, position: Vec2) -> usize {
        let delivered = self.each_mouse(device, |l| l.on_mouse_move(position));
        self.sync_cursor();
        delivered
    }

    pub fn button_down(&mut self, device: DeviceId, button: MouseButton) -> usize {
        let delivered = self.each_mouse(device, |l| l.on_button_down(button));
        self.sync_cursor();
        delivered
    }

    pub fn button_up(&mut self, device: DeviceId, button: MouseButton) -> usize {
        let delivered = self.each_mouse(device, |l| l.on_button_up(button));
        self.sync_cursor();
        delivered
    }

    pub fn capture_mode(&self) -> CaptureMode {
        self.state.borrow().capture_mode()
    }

    /// Change capture mode and push the matching cursor mode to every source.
    pub fn set_capture_mode(&mut self, mode: CaptureMode) {
        self.state.borrow_mut().set_capture_mode(mode);
        self.sync_cursor();
    }

    pub fn toggle_capture(&mut self) -> CaptureMode {
        let mode = self.state.borrow_mut().toggle_capture();
        self.sync_cursor();
        mode
    }

    /// Apply the cursor mode implied by the current capture mode, if it changed.
    ///
    /// Listeners may flip capture from inside a key handler; dispatch calls
    /// this afterwards so the cursor always follows the state.
    pub fn sync_cursor(&mut self) {
        let mode = cursor_mode_for(self.state.borrow().capture_mode());
        if self.applied_cursor == Some(mode) {
            return;
        }
        for source in &self.sources {
            source.borrow_mut().set_cursor_mode(mode);
        }
        self.applied_cursor = Some(mode);
        tracing::debug!(?mode, "cursor mode applied");
    }

    fn each_keyboard(
        &self,
        device: DeviceId,
        mut f: impl FnMut(&mut dyn crate::KeyboardListener),
    ) -> usize {
        let mut delivered = 0;
        for reg in self.registrations.iter().filter(|r| r.device == device) {
            let Binding::Keyboard(handle) = &reg.binding else {
                continue;
            };
            let Some(listener) = handle.upgrade() else {
                tracing::warn!(?device, "keyboard listener dropped without unsubscribing");
                continue;
            };
            let Ok(mut listener) = listener.try_borrow_mut() else {
                tracing::warn!(?device, "keyboard listener busy; event dropped");
                continue;
            };
            f(&mut *listener);
            delivered += 1;
        }
        delivered
    }

    fn each_mouse(&self, device: DeviceId, mut f: impl FnMut(&mut dyn crate::MouseListener)) -> usize {
        let mut delivered = 0;
        for reg in self.registrations.iter().filter(|r| r.device == device) {
            let Binding::Mouse(handle) = &reg.binding else {
                continue;
            };
            let Some(listener) = handle.upgrade() else {
                tracing::warn!(?device, "mouse listener dropped without unsubscribing");
                continue;
            };
            let Ok(mut listener) = listener.try_borrow_mut() else {
                tracing::warn!(?device, "mouse listener busy; event dropped");
                continue;
            };
            f(&mut *listener);
            delivered += 1;
        }
        delivered
    }
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new()
    }
}

fn cursor_mode_for(capture: CaptureMode) -> CursorMode {
    match capture {
        CaptureMode::Captured => CursorMode::Locked,
        CaptureMode::Uncaptured => CursorMode::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::StaticDevices;
    use crate::listener::{KeyboardListener, MouseListener, keyboard_handle, mouse_handle};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Listener that writes into the shared state and counts deliveries.
    struct Recorder {
        state: SharedInputState,
        downs: usize,
        moves: Vec<Vec2>,
        toggle_on: Option<Key>,
    }

    impl Recorder {
        fn new(state: SharedInputState) -> Rc<RefCell<Self>> {
            Rc::new(RefCell::new(Self {
                state,
                downs: 0,
                moves: Vec::new(),
                toggle_on: None,
            }))
        }
    }

    impl KeyboardListener for Recorder {
        fn on_key_down(&mut self, key: Key, _scancode: u32) {
            self.downs += 1;
            let mut state = self.state.borrow_mut();
            state.record_key_down(key);
            if self.toggle_on == Some(key) {
                state.toggle_capture();
            }
        }

        fn on_key_up(&mut self, key: Key, _scancode: u32) {
            self.state.borrow_mut().record_key_up(key);
        }
    }

    impl MouseListener for Recorder {
        fn on_mouse_move(&mut self, position: Vec2) {
            self.moves.push(position);
        }
    }

    const KB: DeviceId = DeviceId(0);
    const MOUSE: DeviceId = DeviceId(1);

    fn router_with_devices() -> (InputRouter, Rc<RefCell<StaticDevices>>) {
        let mut router = InputRouter::new();
        let devices = StaticDevices::single().into_shared();
        router.attach(Some(devices.clone()));
        (router, devices)
    }

    #[test]
    fn attach_none_is_noop() {
        let mut router = InputRouter::new();
        router.attach(None);
        assert_eq!(router.source_count(), 0);
    }

    #[test]
    fn subscribe_without_sources_is_noop() {
        let mut router = InputRouter::new();
        let rec = Recorder::new(router.input_state());
        router
            .subscribe(Some(keyboard_handle(&rec)), Some(mouse_handle(&rec)))
            .unwrap();
        assert!(!router.is_subscribed());
        assert_eq!(router.registration_count(), 0);
        assert_eq!(router.key_down(KB, Key::W, 17), 0);

        router.unsubscribe(None, None);
        assert!(!router.is_subscribed());
    }

    #[test]
    fn subscribe_routes_keys_and_motion() {
        let (mut router, _devices) = router_with_devices();
        let rec = Recorder::new(router.input_state());
        router
            .subscribe(Some(keyboard_handle(&rec)), Some(mouse_handle(&rec)))
            .unwrap();
        assert_eq!(router.registration_count(), 2);

        assert_eq!(router.key_down(KB, Key::W, 17), 1);
        assert!(router.input_state().borrow().is_pressed(Key::W));
        router.key_up(KB, Key::W, 17);
        assert!(!router.input_state().borrow().is_pressed(Key::W));

        router.mouse_move(MOUSE, Vec2::new(10.0, 5.0));
        assert_eq!(rec.borrow().moves, vec![Vec2::new(10.0, 5.0)]);
    }

    #[test]
    fn events_from_wrong_device_kind_are_not_routed() {
        let (mut router, _devices) = router_with_devices();
        let rec = Recorder::new(router.input_state());
        router
            .subscribe(Some(keyboard_handle(&rec)), Some(mouse_handle(&rec)))
            .unwrap();
        assert_eq!(router.key_down(MOUSE, Key::W, 17), 0);
        assert_eq!(router.mouse_move(KB, Vec2::ZERO), 0);
    }

    #[test]
    fn omitted_listener_leaves_half_unrouted() {
        let (mut router, _devices) = router_with_devices();
        let rec = Recorder::new(router.input_state());
        router.subscribe(Some(keyboard_handle(&rec)), None).unwrap();
        assert_eq!(router.registration_count(), 1);
        assert_eq!(router.mouse_move(MOUSE, Vec2::ONE), 0);
        assert_eq!(router.key_down(KB, Key::A, 30), 1);
    }

    #[test]
    fn every_physical_device_is_registered() {
        let mut router = InputRouter::new();
        let devices = StaticDevices::new(vec![DeviceId(0), DeviceId(2)], vec![DeviceId(1)]);
        router.attach(Some(devices.into_shared()));
        let rec = Recorder::new(router.input_state());
        router
            .subscribe(Some(keyboard_handle(&rec)), Some(mouse_handle(&rec)))
            .unwrap();
        assert_eq!(router.registration_count(), 3);
        router.key_down(DeviceId(0), Key::W, 17);
        router.key_down(DeviceId(2), Key::S, 31);
        assert_eq!(rec.borrow().downs, 2);
    }

    #[test]
    fn resubscribe_requires_unsubscribe() {
        let (mut router, _devices) = router_with_devices();
        let first = Recorder::new(router.input_state());
        let second = Recorder::new(router.input_state());
        router
            .subscribe(Some(keyboard_handle(&first)), Some(mouse_handle(&first)))
            .unwrap();

        let err = router.subscribe(Some(keyboard_handle(&second)), Some(mouse_handle(&second)));
        assert!(matches!(err, Err(InputError::AlreadySubscribed)));

        router.key_down(KB, Key::W, 17);
        assert_eq!(first.borrow().downs, 1);
        assert_eq!(second.borrow().downs, 0);

        router.unsubscribe(Some(&keyboard_handle(&first)), Some(&mouse_handle(&first)));
        router
            .subscribe(Some(keyboard_handle(&second)), Some(mouse_handle(&second)))
            .unwrap();
        router.key_down(KB, Key::W, 17);
        assert_eq!(first.borrow().downs, 1);
        assert_eq!(second.borrow().downs, 1);
    }

    #[test]
    fn unsubscribe_stops_delivery_and_releases_keys() {
        let (mut router, _devices) = router_with_devices();
        let rec = Recorder::new(router.input_state());
        let kb = keyboard_handle(&rec);
        let mouse = mouse_handle(&rec);
        router.subscribe(Some(kb.clone()), Some(mouse.clone())).unwrap();

        router.key_down(KB, Key::W, 17);
        router.unsubscribe(Some(&kb), Some(&mouse));

        assert!(!router.is_subscribed());
        assert_eq!(router.registration_count(), 0);
        assert!(!router.input_state().borrow().is_pressed(Key::W));

        assert_eq!(router.key_down(KB, Key::D, 32), 0);
        assert_eq!(router.input_state().borrow().pressed_count(), 0);
    }

    #[test]
    fn unsubscribe_unknown_listener_still_clears_active() {
        let (mut router, _devices) = router_with_devices();
        let rec = Recorder::new(router.input_state());
        let other = Recorder::new(router.input_state());
        router
            .subscribe(Some(keyboard_handle(&rec)), Some(mouse_handle(&rec)))
            .unwrap();
        router.unsubscribe(Some(&keyboard_handle(&other)), None);
        assert!(!router.is_subscribed());
        assert_eq!(router.registration_count(), 2);
    }

    #[test]
    fn dropped_listener_is_skipped() {
        let (mut router, _devices) = router_with_devices();
        let rec = Recorder::new(router.input_state());
        router.subscribe(Some(keyboard_handle(&rec)), None).unwrap();
        drop(rec);
        assert_eq!(router.key_down(KB, Key::W, 17), 0);
    }

    #[test]
    fn capture_toggle_inside_listener_updates_cursor() {
        let (mut router, devices) = router_with_devices();
        assert_eq!(devices.borrow().cursor_mode(), CursorMode::Normal);

        let rec = Recorder::new(router.input_state());
        rec.borrow_mut().toggle_on = Some(Key::F1);
        router.subscribe(Some(keyboard_handle(&rec)), None).unwrap();

        router.key_down(KB, Key::F1, 59);
        assert_eq!(router.capture_mode(), CaptureMode::Captured);
        assert_eq!(devices.borrow().cursor_mode(), CursorMode::Locked);

        let changes = devices.borrow().cursor_changes();
        router.key_down(KB, Key::W, 17);
        assert_eq!(devices.borrow().cursor_changes(), changes);
    }

    #[test]
    fn set_capture_mode_applies_to_all_sources() {
        let mut router = InputRouter::new();
        let a = StaticDevices::single().into_shared();
        let b = StaticDevices::single().into_shared();
        router.attach(Some(a.clone()));
        router.attach(Some(b.clone()));
        router.set_capture_mode(CaptureMode::Captured);
        assert_eq!(a.borrow().cursor_mode(), CursorMode::Locked);
        assert_eq!(b.borrow().cursor_mode(), CursorMode::Locked);
        assert_eq!(router.toggle_capture(), CaptureMode::Uncaptured);
        assert_eq!(a.borrow().cursor_mode(), CursorMode::Normal);
    }
}
