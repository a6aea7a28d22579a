use crate::camera::Camera;
use crate::graphics::{GraphicsContext, Model};
use glam::{Mat4, Vec3};
use sceneview_common::{Color, ModelId};

/// One call made against a [`RecordingGraphics`].
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsCall {
    Begin,
    Clear,
    ClearColor(Color),
    Use(ModelId),
    Update {
        model: ModelId,
        view_projection: Mat4,
    },
    Draw(ModelId),
    End,
}

/// Headless graphics context that records every call.
///
/// Stands in for a GPU backend in the CLI host and in tests: draw order,
/// bracketing and the camera handed to `update` can all be asserted on.
#[derive(Debug, Default)]
pub struct RecordingGraphics {
    calls: Vec<GraphicsCall>,
    in_frame: bool,
    frames: u64,
    last_eye: Option<Vec3>,
    last_frame_draws: Vec<String>,
    current_draws: Vec<String>,
}

impl RecordingGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[GraphicsCall] {
        &self.calls
    }

    /// Models drawn, in order, across all recorded calls.
    pub fn drawn(&self) -> Vec<ModelId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                GraphicsCall::Draw(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Completed `begin`/`end` pairs.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Human-readable description of the last completed frame.
    pub fn describe_last_frame(&self) -> String {
        let mut out = format!("=== Frame {} ===\n", self.frames);
        if let Some(eye) = self.last_eye {
            out.push_str(&format!("Camera: eye=({:.2}, {:.2}, {:.2})\n", eye.x, eye.y, eye.z));
        }
        out.push_str(&format!("Draws: {}\n", self.last_frame_draws.len()));
        for name in &self.last_frame_draws {
            out.push_str(&format!("  {name}\n"));
        }
        out
    }

    fn record(&mut self, call: GraphicsCall) {
        if !self.in_frame && !matches!(call, GraphicsCall::Begin) {
            tracing::warn!(?call, "graphics call outside begin/end");
        }
        self.calls.push(call);
    }
}

impl GraphicsContext for RecordingGraphics {
    fn begin(&mut self) {
        if self.in_frame {
            tracing::warn!("begin called twice without end");
        }
        self.record(GraphicsCall::Begin);
        self.in_frame = true;
        self.current_draws.clear();
    }

    fn clear(&mut self) {
        self.record(GraphicsCall::Clear);
    }

    fn clear_color(&mut self, color: Color) {
        self.record(GraphicsCall::ClearColor(color));
    }

    fn use_model(&mut self, model: &Model) {
        self.record(GraphicsCall::Use(model.id));
    }

    fn update(&mut self, camera: &Camera, model: &Model) {
        self.last_eye = Some(camera.position);
        self.record(GraphicsCall::Update {
            model: model.id,
            view_projection: camera.view_projection(),
        });
    }

    fn draw(&mut self, model: &Model) {
        self.current_draws
            .push(format!("[{}] {} {:?}", model.id.short(), model.name, model.mesh));
        self.record(GraphicsCall::Draw(model.id));
    }

    fn end(&mut self) {
        self.record(GraphicsCall::End);
        if self.in_frame {
            self.frames += 1;
            self.last_frame_draws = std::mem::take(&mut self.current_draws);
        }
        self.in_frame = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::MeshKind;

    #[test]
    fn records_a_bracketed_frame() {
        let mut gfx = RecordingGraphics::new();
        let cam = Camera::default();
        let model = Model::new("cube", MeshKind::Cube);

        gfx.begin();
        gfx.clear();
        gfx.use_model(&model);
        gfx.update(&cam, &model);
        gfx.draw(&model);
        gfx.end();

        assert_eq!(gfx.frames(), 1);
        assert!(!gfx.in_frame());
        assert_eq!(gfx.drawn(), vec![model.id]);
        assert_eq!(gfx.calls().first(), Some(&GraphicsCall::Begin));
        assert_eq!(gfx.calls().last(), Some(&GraphicsCall::End));
    }

    #[test]
    fn describe_lists_draws() {
        let mut gfx = RecordingGraphics::new();
        let cam = Camera::default();
        let model = Model::new("floor", MeshKind::Plane);
        gfx.begin();
        gfx.update(&cam, &model);
        gfx.draw(&model);
        gfx.end();

        let text = gfx.describe_last_frame();
        assert!(text.contains("Frame 1"));
        assert!(text.contains("Draws: 1"));
        assert!(text.contains("floor"));
        assert!(text.contains("eye=(0.00, 0.00, 3.00)"));
    }

    #[test]
    fn end_without_begin_does_not_count() {
        let mut gfx = RecordingGraphics::new();
        gfx.end();
        assert_eq!(gfx.frames(), 0);
    }
}
