//! wgpu backend for the scene graphics contract.
//!
//! Models are drawn as instanced, directionally lit cubes and planes in a
//! single render pass per frame.
//!
//! # Invariants
//! - Nothing reaches the GPU until `end()`; a frame without a target set by
//!   the host is dropped with a warning.
//! - The backend never mutates scene state.

mod gpu;
mod mesh;
mod shaders;

pub use gpu::WgpuGraphics;
