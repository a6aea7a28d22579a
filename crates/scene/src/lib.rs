//! Scene lifecycle and the viewer scene.
//!
//! A host owns one [`SceneRegistry`] and one input router. Each frame it
//! pushes device events into the router, then calls
//! [`SceneRegistry::frame`], which updates and renders the active scene.
//!
//! # Invariants
//! - Update runs strictly before render within a frame.
//! - Only the active scene is subscribed to input.
//! - Scenes request switches through [`Scene::take_transition`]; they never
//!   touch the registry directly.

mod config;
mod lifecycle;
mod loading;
mod registry;
mod viewer;

pub use config::{ConfigError, InputConfig, ViewerConfig, WindowConfig};
pub use lifecycle::{Scene, SceneContext, ScenePhase};
pub use loading::{DEFAULT_LOADING_DELAY, LoadingScene};
pub use registry::{SceneError, SceneRegistry};
pub use viewer::{ViewerScene, demo_models};

pub fn crate_info() -> &'static str {
    concat!("sceneview-scene v", env!("CARGO_PKG_VERSION"))
}
