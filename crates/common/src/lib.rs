//! Shared value types for the sceneview runtime.
//!
//! Everything here is plain data: no behaviour beyond small conversions,
//! so every other crate can depend on it without pulling in a backend.

mod key;
mod types;

pub use key::{Key, MouseButton};
pub use types::{Color, DeviceId, ModelId, Transform, Viewport};
