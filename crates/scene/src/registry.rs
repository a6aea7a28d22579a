use crate::config::ViewerConfig;
use crate::lifecycle::{Scene, SceneContext, ScenePhase};
use sceneview_common::Viewport;
use sceneview_input::{
    InputRouter, KeyboardHandle, KeyboardListener, MouseHandle, MouseListener, keyboard_handle,
    mouse_handle,
};
use sceneview_render::GraphicsContext;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Errors from scene registration and switching.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("scene already registered: {0}")]
    DuplicateScene(String),
    #[error("unknown scene: {0}")]
    UnknownScene(String),
    #[error("cannot remove the active scene: {0}")]
    RemoveActive(String),
    #[error("no active scene")]
    NoActiveScene,
}

struct SceneEntry {
    scene: Rc<RefCell<dyn Scene>>,
    keyboard: Option<KeyboardHandle>,
    mouse: Option<MouseHandle>,
}

/// Named scenes with exactly one active at a time.
///
/// The registry owns every scene. The input router only ever sees weak
/// listener handles, so removing a scene drops it even if it is still
/// routed somewhere.
pub struct SceneRegistry {
    scenes: BTreeMap<String, SceneEntry>,
    current: Option<String>,
    config: ViewerConfig,
    viewport: Viewport,
}

impl SceneRegistry {
    pub fn new(config: ViewerConfig) -> Self {
        let viewport = config.window.viewport();
        Self {
            scenes: BTreeMap::new(),
            current: None,
            config,
            viewport,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Register a scene that receives keyboard and mouse input while active.
    ///
    /// The first scene registered becomes current but is not loaded until
    /// [`start`](Self::start) or the first [`frame`](Self::frame).
    pub fn register<S>(&mut self, name: impl Into<String>, scene: S) -> Result<Rc<RefCell<S>>, SceneError>
    where
        S: Scene + KeyboardListener + MouseListener + 'static,
    {
        let rc = Rc::new(RefCell::new(scene));
        let keyboard = Some(keyboard_handle(&rc));
        let mouse = Some(mouse_handle(&rc));
        self.insert(name.into(), rc.clone(), keyboard, mouse)?;
        Ok(rc)
    }

    /// Register a scene that takes no input.
    pub fn register_passive<S>(&mut self, name: impl Into<String>, scene: S) -> Result<Rc<RefCell<S>>, SceneError>
    where
        S: Scene + 'static,
    {
        let rc = Rc::new(RefCell::new(scene));
        self.insert(name.into(), rc.clone(), None, None)?;
        Ok(rc)
    }

    fn insert(
        &mut self,
        name: String,
        scene: Rc<RefCell<dyn Scene>>,
        keyboard: Option<KeyboardHandle>,
        mouse: Option<MouseHandle>,
    ) -> Result<(), SceneError> {
        if self.scenes.contains_key(&name) {
            return Err(SceneError::DuplicateScene(name));
        }
        tracing::debug!(scene = %name, input = keyboard.is_some(), "scene registered");
        if self.current.is_none() {
            self.current = Some(name.clone());
        }
        self.scenes.insert(name, SceneEntry { scene, keyboard, mouse });
        Ok(())
    }

    /// Make `name` the active scene.
    ///
    /// The outgoing scene's listeners are unsubscribed first. A scene that
    /// has never been loaded gets `on_load`; one that was loaded before is
    /// resubscribed and told through `on_activate`, since loading twice is
    /// not supported.
    pub fn switch_to(&mut self, name: &str, router: &mut InputRouter) -> Result<(), SceneError> {
        let Some(entry) = self.scenes.get(name) else {
            return Err(SceneError::UnknownScene(name.to_string()));
        };
        if let Some(prev) = self.current.as_deref().and_then(|c| self.scenes.get(c)) {
            router.unsubscribe(prev.keyboard.as_ref(), prev.mouse.as_ref());
        }

        let mut scene = entry.scene.borrow_mut();
        if scene.phase() == ScenePhase::Loaded {
            if let Err(e) = router.subscribe(entry.keyboard.clone(), entry.mouse.clone()) {
                tracing::warn!(scene = name, error = %e, "resubscribe failed");
            }
            scene.on_activate();
        } else {
            let mut ctx = SceneContext::new(router, self.viewport, &self.config)
                .with_listeners(entry.keyboard.clone(), entry.mouse.clone());
            scene.on_load(&mut ctx);
            scene.on_resize(self.viewport);
        }
        drop(scene);

        tracing::info!(from = ?self.current, to = name, "switched scene");
        self.current = Some(name.to_string());
        Ok(())
    }

    /// Load the current scene if it has not been loaded yet.
    pub fn start(&mut self, router: &mut InputRouter) -> Result<(), SceneError> {
        let name = self.current.clone().ok_or(SceneError::NoActiveScene)?;
        let loaded = self.scenes[&name].scene.borrow().phase() == ScenePhase::Loaded;
        if loaded {
            return Ok(());
        }
        self.switch_to(&name, router)
    }

    pub fn remove(&mut self, name: &str) -> Result<(), SceneError> {
        if self.current.as_deref() == Some(name) {
            return Err(SceneError::RemoveActive(name.to_string()));
        }
        if self.scenes.remove(name).is_none() {
            return Err(SceneError::UnknownScene(name.to_string()));
        }
        tracing::debug!(scene = name, "scene removed");
        Ok(())
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn scene_names(&self) -> Vec<&str> {
        self.scenes.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Run one frame of the active scene: update, then render, then apply
    /// any switch the scene asked for.
    pub fn frame(&mut self, dt: f64, router: &mut InputRouter, gfx: &mut dyn GraphicsContext) -> Result<(), SceneError> {
        self.start(router)?;
        let Some(name) = self.current.clone() else {
            return Err(SceneError::NoActiveScene);
        };
        let scene = self.scenes[&name].scene.clone();
        let transition = {
            let mut scene = scene.borrow_mut();
            tracing::trace_span!("scene_update", scene = %name).in_scope(|| scene.on_update(dt));
            tracing::trace_span!("scene_render", scene = %name).in_scope(|| scene.on_render(dt, gfx));
            scene.take_transition()
        };
        if let Some(next) = transition {
            self.switch_to(&next, router)?;
        }
        Ok(())
    }

    /// Propagate a new render target size to every loaded scene.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        for entry in self.scenes.values() {
            let mut scene = entry.scene.borrow_mut();
            if scene.phase() == ScenePhase::Loaded {
                scene.on_resize(viewport);
            }
        }
    }

    /// Whether the active scene asked the host to close.
    pub fn close_requested(&self) -> bool {
        self.current
            .as_deref()
            .and_then(|c| self.scenes.get(c))
            .is_some_and(|e| e.scene.borrow().close_requested())
    }
}
