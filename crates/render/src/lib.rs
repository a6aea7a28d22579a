//! Rendering adapter: backend-agnostic graphics contract and the fly camera.
//!
//! # Invariants
//! - Scenes only talk to a backend through [`GraphicsContext`].
//! - `begin`/`end` bracket every draw call of a frame.
//! - Camera speed is a rate; elapsed time is applied once, at movement time.

mod camera;
mod graphics;
mod overlay;
mod recording;

pub use camera::{Camera, CameraConfig, MAX_PITCH_DEGREES};
pub use graphics::{GraphicsContext, MeshKind, Model};
pub use overlay::{DebugOverlay, OverlayFrame};
pub use recording::{GraphicsCall, RecordingGraphics};

pub fn crate_info() -> &'static str {
    concat!("sceneview-render v", env!("CARGO_PKG_VERSION"))
}
