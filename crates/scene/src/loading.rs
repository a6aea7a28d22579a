use crate::lifecycle::{Scene, SceneContext, ScenePhase};
use sceneview_common::Color;
use sceneview_render::GraphicsContext;

/// Seconds a loading scene shows before moving on.
pub const DEFAULT_LOADING_DELAY: f64 = 0.1;

/// Blank screen shown while the next scene is prepared.
///
/// Counts down its delay during updates, then asks the registry to switch
/// to `target`. The request is repeated every update until the switch
/// happens, so a target registered late is still reached. It takes no input.
pub struct LoadingScene {
    name: String,
    target: String,
    delay: f64,
    remaining: f64,
    phase: ScenePhase,
    transition: Option<String>,
    requests: u32,
}

impl LoadingScene {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            delay: DEFAULT_LOADING_DELAY,
            remaining: DEFAULT_LOADING_DELAY,
            phase: ScenePhase::Unloaded,
            transition: None,
            requests: 0,
        }
    }

    pub fn with_delay(mut self, seconds: f64) -> Self {
        self.delay = seconds.max(0.0);
        self.remaining = self.delay;
        self
    }
}

impl Scene for LoadingScene {
    fn name(&self) -> &str {
        &self.name
    }

    fn phase(&self) -> ScenePhase {
        self.phase
    }

    fn on_load(&mut self, _ctx: &mut SceneContext<'_>) {
        self.remaining = self.delay;
        self.requests = 0;
        self.phase = ScenePhase::Loaded;
        tracing::debug!(scene = %self.name, next = %self.target, delay = self.delay, "loading scene started");
    }

    fn on_update(&mut self, dt: f64) {
        self.remaining -= dt;
        if self.remaining > 0.0 {
            return;
        }
        if self.requests == 0 {
            tracing::info!(next = %self.target, "loading finished; switching scene");
        } else {
            tracing::debug!(next = %self.target, attempt = self.requests + 1, "repeating scene switch request");
        }
        self.requests += 1;
        self.transition = Some(self.target.clone());
    }

    fn on_activate(&mut self) {
        self.remaining = self.delay;
        self.transition = None;
        self.requests = 0;
    }

    fn on_render(&mut self, _dt: f64, gfx: &mut dyn GraphicsContext) {
        gfx.begin();
        gfx.clear_color(Color::BLACK);
        gfx.clear();
        gfx.end();
    }

    fn take_transition(&mut self) -> Option<String> {
        self.transition.take()
    }
}
