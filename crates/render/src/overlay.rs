use crate::camera::Camera;
use sceneview_input::InputState;

/// What a scene exposes to the debug overlay each frame.
#[derive(Debug, Clone, Copy)]
pub struct OverlayFrame<'a> {
    pub scene: &'a str,
    pub camera: &'a Camera,
    pub input: &'a InputState,
    pub models_drawn: usize,
}

/// Drawn after the scene's render pass has ended.
pub trait DebugOverlay {
    fn render(&mut self, dt: f64, frame: &OverlayFrame<'_>);
}
