use crate::config::ViewerConfig;
use sceneview_common::Viewport;
use sceneview_input::{InputError, InputRouter, KeyboardHandle, MouseHandle, SharedInputState};
use sceneview_render::GraphicsContext;

/// Where a scene is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScenePhase {
    #[default]
    Unloaded,
    Loaded,
}

/// Everything a scene may touch while loading.
pub struct SceneContext<'a> {
    pub router: &'a mut InputRouter,
    pub viewport: Viewport,
    pub config: &'a ViewerConfig,
    keyboard: Option<KeyboardHandle>,
    mouse: Option<MouseHandle>,
}

impl<'a> SceneContext<'a> {
    pub fn new(router: &'a mut InputRouter, viewport: Viewport, config: &'a ViewerConfig) -> Self {
        Self {
            router,
            viewport,
            config,
            keyboard: None,
            mouse: None,
        }
    }

    /// Attach the handles the router should deliver this scene's events to.
    pub fn with_listeners(mut self, keyboard: Option<KeyboardHandle>, mouse: Option<MouseHandle>) -> Self {
        self.keyboard = keyboard;
        self.mouse = mouse;
        self
    }

    pub fn input_state(&self) -> SharedInputState {
        self.router.input_state()
    }

    /// Subscribe the scene being loaded as the active keyboard and mouse listener.
    pub fn subscribe_self(&mut self) -> Result<(), InputError> {
        self.router.subscribe(self.keyboard.clone(), self.mouse.clone())
    }
}

/// A scene driven by the host frame loop.
///
/// `on_load` runs once; after that `on_update` and `on_render` run once per
/// frame, update first.
pub trait Scene {
    fn name(&self) -> &str;

    fn phase(&self) -> ScenePhase;

    fn on_load(&mut self, ctx: &mut SceneContext<'_>);

    fn on_update(&mut self, dt: f64);

    fn on_render(&mut self, dt: f64, gfx: &mut dyn GraphicsContext);

    fn on_resize(&mut self, _viewport: Viewport) {}

    /// Called when a scene that is already loaded becomes active again.
    fn on_activate(&mut self) {}

    /// Name of a scene this one wants the registry to switch to.
    fn take_transition(&mut self) -> Option<String> {
        None
    }

    fn close_requested(&self) -> bool {
        false
    }
}
