//! Developer tooling: viewer inspector and debug overlays.
//!
//! # Invariants
//! - Tools only read scene state; they never move the camera or touch input.

mod inspector;

pub use inspector::{CameraInfo, TracingOverlay, ViewerInspector, ViewerSummary};

pub fn crate_info() -> &'static str {
    concat!("sceneview-tools v", env!("CARGO_PKG_VERSION"))
}
