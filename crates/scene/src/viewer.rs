use crate::config::ViewerConfig;
use crate::lifecycle::{Scene, SceneContext, ScenePhase};
use glam::{Quat, Vec2, Vec3};
use sceneview_common::{Color, Key, MouseButton, Transform, Viewport};
use sceneview_input::{Action, CaptureMode, KeyboardListener, MouseListener, SharedInputState};
use sceneview_render::{Camera, DebugOverlay, GraphicsContext, MeshKind, Model, OverlayFrame};

/// State that only exists once the scene has been loaded.
struct Live {
    camera: Camera,
    input: SharedInputState,
    config: ViewerConfig,
    /// `InputState::capture_changes` as of the last mouse move.
    seen_capture_changes: u64,
}

/// Free-fly viewer: WASD movement while captured, mouse free-look, and a
/// list of models drawn every frame.
///
/// Model slots may be empty; rendering skips them.
pub struct ViewerScene {
    name: String,
    live: Option<Live>,
    models: Vec<Option<Model>>,
    overlay: Option<Box<dyn DebugOverlay>>,
    close_requested: bool,
    models_drawn: usize,
}

impl ViewerScene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            live: None,
            models: Vec::new(),
            overlay: None,
            close_requested: false,
            models_drawn: 0,
        }
    }

    /// A viewer pre-populated with a floor and a few cubes.
    pub fn demo(name: impl Into<String>) -> Self {
        let mut scene = Self::new(name);
        for model in demo_models() {
            scene.add_model(model);
        }
        scene
    }

    pub fn with_overlay(mut self, overlay: Box<dyn DebugOverlay>) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Append a model and return its slot index.
    pub fn add_model(&mut self, model: Model) -> usize {
        self.models.push(Some(model));
        self.models.len() - 1
    }

    /// Take the model out of `slot`, leaving the slot empty.
    pub fn remove_model(&mut self, slot: usize) -> Option<Model> {
        self.models.get_mut(slot).and_then(Option::take)
    }

    pub fn models(&self) -> &[Option<Model>] {
        &self.models
    }

    /// Models drawn by the last `on_render`.
    pub fn models_drawn(&self) -> usize {
        self.models_drawn
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.live.as_ref().map(|l| &l.camera)
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.live.as_mut().map(|l| &mut l.camera)
    }
}

impl Scene for ViewerScene {
    fn name(&self) -> &str {
        &self.name
    }

    fn phase(&self) -> ScenePhase {
        if self.live.is_some() {
            ScenePhase::Loaded
        } else {
            ScenePhase::Unloaded
        }
    }

    fn on_load(&mut self, ctx: &mut SceneContext<'_>) {
        if self.live.is_some() {
            tracing::warn!(scene = %self.name, "scene already loaded; ignoring on_load");
            return;
        }
        let config = ctx.config.clone();
        let camera = Camera::from_config(&config.camera, ctx.viewport);
        if config.input.start_captured {
            ctx.router.set_capture_mode(CaptureMode::Captured);
        }
        if let Err(e) = ctx.subscribe_self() {
            tracing::warn!(scene = %self.name, error = %e, "input subscription rejected");
        }
        let input = ctx.input_state();
        let seen_capture_changes = input.borrow().capture_changes();
        self.live = Some(Live {
            camera,
            input,
            config,
            seen_capture_changes,
        });
        tracing::info!(scene = %self.name, models = self.models.len(), "scene loaded");
    }

    fn on_update(&mut self, dt: f64) {
        let Some(live) = &mut self.live else {
            return;
        };
        let input = live.input.borrow();
        let intent = live.config.input.bindings.intent(&input);
        let cam = &live.config.camera;
        let rate = if intent.sprint {
            cam.base_speed * cam.sprint_multiplier
        } else {
            cam.base_speed
        };
        live.camera = live.camera.with_speed(rate);
        if input.is_captured() {
            live.camera.apply_key_movement(intent, dt as f32);
        }
    }

    fn on_render(&mut self, dt: f64, gfx: &mut dyn GraphicsContext) {
        let Some(live) = &self.live else {
            return;
        };
        gfx.begin();
        gfx.clear_color(live.config.clear_color);
        gfx.clear();
        let mut drawn = 0;
        for (slot, model) in self.models.iter().enumerate() {
            let Some(model) = model else {
                tracing::trace!(slot, "empty model slot skipped");
                continue;
            };
            gfx.use_model(model);
            gfx.update(&live.camera, model);
            gfx.draw(model);
            drawn += 1;
        }
        gfx.end();
        self.models_drawn = drawn;

        if let Some(overlay) = &mut self.overlay {
            let input = live.input.borrow();
            overlay.render(
                dt,
                &OverlayFrame {
                    scene: &self.name,
                    camera: &live.camera,
                    input: &input,
                    models_drawn: drawn,
                },
            );
        }
    }

    fn on_resize(&mut self, viewport: Viewport) {
        if let Some(live) = &mut self.live {
            live.camera.set_viewport(viewport);
        }
    }

    fn on_activate(&mut self) {
        // The cursor kept moving while another scene was active.
        if let Some(live) = &mut self.live {
            live.camera.reset_look_reference();
        }
    }

    fn close_requested(&self) -> bool {
        self.close_requested
    }
}

impl KeyboardListener for ViewerScene {
    fn on_key_down(&mut self, key: Key, _scancode: u32) {
        let Some(live) = &mut self.live else {
            return;
        };
        let was_down = {
            let mut input = live.input.borrow_mut();
            let was_down = input.is_pressed(key);
            input.record_key_down(key);
            was_down
        };
        // Toggle and quit fire on the press edge, not on auto-repeat.
        if was_down {
            return;
        }
        match live.config.input.bindings.action_for(key) {
            Some(Action::ToggleCapture) => {
                let mode = live.input.borrow_mut().toggle_capture();
                live.camera.reset_look_reference();
                tracing::debug!(?mode, "capture toggled");
            }
            Some(Action::Quit) => {
                self.close_requested = true;
                tracing::info!(scene = %self.name, "quit requested");
            }
            _ => {}
        }
    }

    fn on_key_up(&mut self, key: Key, _scancode: u32) {
        if let Some(live) = &self.live {
            live.input.borrow_mut().record_key_up(key);
        }
    }
}

impl MouseListener for ViewerScene {
    fn on_mouse_move(&mut self, position: Vec2) {
        let Some(live) = &mut self.live else {
            return;
        };
        let (captured, capture_changes) = {
            let mut input = live.input.borrow_mut();
            input.record_mouse_position(position);
            (input.is_captured(), input.capture_changes())
        };
        if capture_changes != live.seen_capture_changes {
            live.seen_capture_changes = capture_changes;
            live.camera.reset_look_reference();
        }
        if captured {
            live.camera.apply_free_look(position);
        } else {
            live.camera.reset_look_reference();
        }
    }

    fn on_button_down(&mut self, button: MouseButton) {
        if let Some(live) = &self.live {
            live.input.borrow_mut().record_button_down(button);
        }
    }

    fn on_button_up(&mut self, button: MouseButton) {
        if let Some(live) = &self.live {
            live.input.borrow_mut().record_button_up(button);
        }
    }
}

/// Floor plane plus a short row of coloured cubes in front of the default camera.
pub fn demo_models() -> Vec<Model> {
    let floor = Model::new("floor", MeshKind::Plane)
        .with_transform(Transform::from_position(Vec3::new(0.0, -1.0, 0.0)).with_scale(Vec3::splat(20.0)))
        .with_color(Color::rgb(0.35, 0.35, 0.38));
    let colors = [
        Color::rgb(0.9, 0.3, 0.3),
        Color::rgb(0.3, 0.9, 0.4),
        Color::rgb(0.3, 0.5, 0.95),
    ];
    let cubes = colors.into_iter().enumerate().map(|(i, color)| {
        let x = (i as f32 - 1.0) * 2.0;
        let mut transform = Transform::from_position(Vec3::new(x, 0.0, -2.0));
        transform.rotation = Quat::from_rotation_y(i as f32 * 0.4);
        Model::new(format!("cube-{i}"), MeshKind::Cube)
            .with_transform(transform)
            .with_color(color)
    });
    std::iter::once(floor).chain(cubes).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sceneview_input::InputRouter;
    use sceneview_render::{GraphicsCall, RecordingGraphics};

    fn load(scene: &mut ViewerScene, router: &mut InputRouter, config: &ViewerConfig) {
        let mut ctx = SceneContext::new(router, Viewport::default(), config);
        scene.on_load(&mut ctx);
    }

    fn loaded(config: ViewerConfig) -> (ViewerScene, InputRouter) {
        let mut router = InputRouter::new();
        let mut scene = ViewerScene::new("viewer");
        load(&mut scene, &mut router, &config);
        (scene, router)
    }

    #[test]
    fn events_before_load_are_ignored() {
        let mut scene = ViewerScene::new("viewer");
        scene.on_key_down(Key::W, 0);
        scene.on_mouse_move(Vec2::ONE);
        scene.on_update(0.1);
        let mut gfx = RecordingGraphics::new();
        scene.on_render(0.1, &mut gfx);
        assert!(gfx.calls().is_empty());
        assert_eq!(scene.phase(), ScenePhase::Unloaded);
    }

    #[test]
    fn load_builds_camera_from_config() {
        let mut config = ViewerConfig::default();
        config.camera.position = Vec3::new(1.0, 2.0, 3.0);
        let (scene, _router) = loaded(config);
        assert_eq!(scene.phase(), ScenePhase::Loaded);
        assert_eq!(scene.camera().map(|c| c.position), Some(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn repeated_load_keeps_camera() {
        let config = ViewerConfig::default();
        let (mut scene, mut router) = loaded(config.clone());
        if let Some(cam) = scene.camera_mut() {
            cam.set_position(Vec3::splat(9.0));
        }
        load(&mut scene, &mut router, &config);
        assert_eq!(scene.camera().map(|c| c.position), Some(Vec3::splat(9.0)));
    }

    #[test]
    fn start_captured_sets_router_mode() {
        let mut config = ViewerConfig::default();
        config.input.start_captured = true;
        let (_scene, router) = loaded(config);
        assert_eq!(router.capture_mode(), CaptureMode::Captured);
    }

    #[test]
    fn uncaptured_update_does_not_move() {
        let (mut scene, _router) = loaded(ViewerConfig::default());
        let start = scene.camera().map(|c| c.position);
        scene.on_key_down(Key::W, 17);
        scene.on_update(0.5);
        assert_eq!(scene.camera().map(|c| c.position), start);
    }

    #[test]
    fn sprint_multiplies_speed() {
        let (mut scene, router) = loaded(ViewerConfig::default());
        router.input_state().borrow_mut().set_captured(true);
        scene.on_key_down(Key::ShiftLeft, 42);
        scene.on_update(0.016);
        assert_eq!(scene.camera().map(|c| c.speed()), Some(2.5 * 3.0));
        scene.on_key_up(Key::ShiftLeft, 42);
        scene.on_update(0.016);
        assert_eq!(scene.camera().map(|c| c.speed()), Some(2.5));
    }

    #[test]
    fn toggle_fires_once_per_press() {
        let (mut scene, router) = loaded(ViewerConfig::default());
        let state = router.input_state();
        scene.on_key_down(Key::F1, 59);
        assert!(state.borrow().is_captured());
        // Auto-repeat.
        scene.on_key_down(Key::F1, 59);
        assert!(state.borrow().is_captured());
        scene.on_key_up(Key::F1, 59);
        scene.on_key_down(Key::F1, 59);
        assert!(!state.borrow().is_captured());
    }

    #[test]
    fn toggle_resets_look_reference() {
        let (mut scene, router) = loaded(ViewerConfig::default());
        router.input_state().borrow_mut().set_captured(true);
        scene.on_mouse_move(Vec2::new(10.0, 10.0));
        assert_eq!(scene.camera().map(|c| c.has_look_reference()), Some(true));
        scene.on_key_down(Key::F1, 59);
        assert_eq!(scene.camera().map(|c| c.has_look_reference()), Some(false));
    }

    #[test]
    fn capture_round_trip_without_motion_reseeds_look() {
        let (mut scene, router) = loaded(ViewerConfig::default());
        let state = router.input_state();
        state.borrow_mut().set_captured(true);
        scene.on_mouse_move(Vec2::ZERO);
        scene.on_mouse_move(Vec2::new(10.0, 0.0));
        let yaw = scene.camera().map(|c| c.yaw());

        state.borrow_mut().set_captured(false);
        state.borrow_mut().set_captured(true);
        scene.on_mouse_move(Vec2::new(510.0, 0.0));
        assert_eq!(scene.camera().map(|c| c.yaw()), yaw);
    }

    #[test]
    fn activate_drops_look_reference() {
        let (mut scene, router) = loaded(ViewerConfig::default());
        router.input_state().borrow_mut().set_captured(true);
        scene.on_mouse_move(Vec2::ZERO);
        scene.on_activate();
        assert_eq!(scene.camera().map(|c| c.has_look_reference()), Some(false));
    }

    #[test]
    fn escape_requests_close() {
        let (mut scene, _router) = loaded(ViewerConfig::default());
        assert!(!scene.close_requested());
        scene.on_key_down(Key::Escape, 1);
        assert!(scene.close_requested());
    }

    #[test]
    fn uncaptured_mouse_move_keeps_orientation() {
        let (mut scene, router) = loaded(ViewerConfig::default());
        let before = scene.camera().map(|c| (c.yaw(), c.pitch()));
        scene.on_mouse_move(Vec2::new(0.0, 0.0));
        scene.on_mouse_move(Vec2::new(300.0, 200.0));
        assert_eq!(scene.camera().map(|c| (c.yaw(), c.pitch())), before);
        assert_eq!(router.input_state().borrow().mouse_position(), Some(Vec2::new(300.0, 200.0)));
    }

    #[test]
    fn buttons_are_recorded() {
        let (mut scene, router) = loaded(ViewerConfig::default());
        scene.on_button_down(MouseButton::Left);
        assert!(router.input_state().borrow().is_button_down(MouseButton::Left));
        scene.on_button_up(MouseButton::Left);
        assert!(!router.input_state().borrow().is_button_down(MouseButton::Left));
    }

    #[test]
    fn render_skips_empty_slots() {
        let (mut scene, _router) = loaded(ViewerConfig::default());
        let a = scene.add_model(Model::new("a", MeshKind::Cube));
        let b = scene.add_model(Model::new("b", MeshKind::Cube));
        let c = scene.add_model(Model::new("c", MeshKind::Plane));
        let removed = scene.remove_model(b).map(|m| m.id);
        assert!(removed.is_some());
        assert_eq!(scene.remove_model(b), None);
        assert_eq!(scene.models().len(), 3);

        let mut gfx = RecordingGraphics::new();
        scene.on_render(0.016, &mut gfx);
        let ids: Vec<_> = [a, c]
            .iter()
            .filter_map(|slot| scene.models()[*slot].as_ref().map(|m| m.id))
            .collect();
        assert_eq!(gfx.drawn(), ids);
        assert_eq!(scene.models_drawn(), 2);
        assert_eq!(gfx.frames(), 1);
    }

    #[test]
    fn render_order_is_bracketed() {
        let (mut scene, _router) = loaded(ViewerConfig::default());
        let model = Model::new("cube", MeshKind::Cube);
        let id = model.id;
        scene.add_model(model);
        let mut gfx = RecordingGraphics::new();
        scene.on_render(0.016, &mut gfx);
        let calls = gfx.calls();
        assert_eq!(calls[0], GraphicsCall::Begin);
        assert_eq!(calls[1], GraphicsCall::ClearColor(Color::CORNFLOWER_BLUE));
        assert_eq!(calls[2], GraphicsCall::Clear);
        assert_eq!(calls[3], GraphicsCall::Use(id));
        assert!(matches!(calls[4], GraphicsCall::Update { model, .. } if model == id));
        assert_eq!(calls[5], GraphicsCall::Draw(id));
        assert_eq!(calls[6], GraphicsCall::End);
    }

    #[test]
    fn resize_updates_aspect() {
        let (mut scene, _router) = loaded(ViewerConfig::default());
        scene.on_resize(Viewport::new(400, 400));
        assert_eq!(scene.camera().map(|c| c.aspect), Some(1.0));
    }

    #[test]
    fn demo_has_floor_and_cubes() {
        let scene = ViewerScene::demo("viewer");
        assert_eq!(scene.models().len(), 4);
        assert!(scene.models().iter().flatten().any(|m| m.mesh == MeshKind::Plane));
    }
}
