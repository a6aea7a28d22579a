use sceneview_common::Key;
use sceneview_input::{CaptureMode, InputState};
use sceneview_render::{Camera, DebugOverlay, OverlayFrame};

/// Read-only queries over the viewer's camera and input state.
pub struct ViewerInspector;

impl ViewerInspector {
    /// Produce a summary of one frame.
    pub fn summary(frame: &OverlayFrame<'_>) -> ViewerSummary {
        let mut pressed: Vec<Key> = frame.input.pressed_keys().collect();
        pressed.sort();
        ViewerSummary {
            scene: frame.scene.to_string(),
            camera: CameraInfo::from_camera(frame.camera),
            capture: frame.input.capture_mode(),
            pressed,
            models_drawn: frame.models_drawn,
        }
    }

    pub fn camera(camera: &Camera) -> CameraInfo {
        CameraInfo::from_camera(camera)
    }

    /// Held keys in a stable order.
    pub fn pressed_keys(input: &InputState) -> Vec<Key> {
        let mut keys: Vec<Key> = input.pressed_keys().collect();
        keys.sort();
        keys
    }
}

/// Summary of viewer state for overlays and logs.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerSummary {
    pub scene: String,
    pub camera: CameraInfo,
    pub capture: CaptureMode,
    pub pressed: Vec<Key>,
    pub models_drawn: usize,
}

impl std::fmt::Display for ViewerSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: {} capture={:?} drawn={} keys={:?} | {}",
            self.scene, self.capture, self.models_drawn, self.pressed, self.camera
        )
    }
}

/// Camera placement and orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraInfo {
    pub position: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub speed: f32,
}

impl CameraInfo {
    fn from_camera(camera: &Camera) -> Self {
        let p = camera.position;
        Self {
            position: [p.x, p.y, p.z],
            yaw: camera.yaw(),
            pitch: camera.pitch(),
            speed: camera.speed(),
        }
    }
}

impl std::fmt::Display for CameraInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Camera pos=({:.2}, {:.2}, {:.2}) yaw={:.1} pitch={:.1} speed={:.2}",
            self.position[0], self.position[1], self.position[2], self.yaw, self.pitch, self.speed,
        )
    }
}

/// Debug overlay that logs a [`ViewerSummary`] every `interval` frames.
pub struct TracingOverlay {
    interval: u64,
    frames: u64,
    last: Option<ViewerSummary>,
}

impl TracingOverlay {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            frames: 0,
            last: None,
        }
    }

    pub fn last_summary(&self) -> Option<&ViewerSummary> {
        self.last.as_ref()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for TracingOverlay {
    fn default() -> Self {
        Self::new(120)
    }
}

impl DebugOverlay for TracingOverlay {
    fn render(&mut self, dt: f64, frame: &OverlayFrame<'_>) {
        let summary = ViewerInspector::summary(frame);
        if self.frames % self.interval == 0 {
            let fps = if dt > 0.0 { 1.0 / dt } else { 0.0 };
            tracing::debug!(fps = fps.round() as u32, "{summary}");
        }
        self.frames += 1;
        self.last = Some(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn frame<'a>(camera: &'a Camera, input: &'a InputState) -> OverlayFrame<'a> {
        OverlayFrame {
            scene: "viewer",
            camera,
            input,
            models_drawn: 3,
        }
    }

    #[test]
    fn summary_reports_camera_and_keys() {
        let mut camera = Camera::default();
        camera.set_position(Vec3::new(1.0, 2.0, 3.0));
        let mut input = InputState::new();
        input.record_key_down(Key::W);
        input.record_key_down(Key::A);

        let summary = ViewerInspector::summary(&frame(&camera, &input));
        assert_eq!(summary.scene, "viewer");
        assert_eq!(summary.camera.position, [1.0, 2.0, 3.0]);
        assert_eq!(summary.pressed, vec![Key::A, Key::W]);
        assert_eq!(summary.capture, CaptureMode::Uncaptured);
        assert_eq!(summary.models_drawn, 3);
    }

    #[test]
    fn summary_display() {
        let camera = Camera::default();
        let input = InputState::new();
        let s = format!("{}", ViewerInspector::summary(&frame(&camera, &input)));
        assert!(s.contains("Scene: viewer"));
        assert!(s.contains("pos=(0.00, 0.00, 3.00)"));
    }

    #[test]
    fn tracing_overlay_keeps_last_summary() {
        let camera = Camera::default();
        let input = InputState::new();
        let mut overlay = TracingOverlay::new(10);
        assert!(overlay.last_summary().is_none());
        overlay.render(0.016, &frame(&camera, &input));
        overlay.render(0.016, &frame(&camera, &input));
        assert_eq!(overlay.frames(), 2);
        assert_eq!(overlay.last_summary().map(|s| s.models_drawn), Some(3));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let overlay = TracingOverlay::new(0);
        assert_eq!(overlay.interval, 1);
    }
}
