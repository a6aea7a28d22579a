use crate::camera::Camera;
use glam::Mat4;
use sceneview_common::{Color, ModelId, Transform};
use serde::{Deserialize, Serialize};

/// Primitive shape a backend uses to draw a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeshKind {
    /// Unit cube centred on the origin.
    Cube,
    /// Unit square in the XZ plane.
    Plane,
}

/// A drawable placed in a scene. Opaque to the scene beyond its transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub id: ModelId,
    pub name: String,
    pub mesh: MeshKind,
    pub transform: Transform,
    pub color: Color,
}

impl Model {
    pub fn new(name: impl Into<String>, mesh: MeshKind) -> Self {
        Self {
            id: ModelId::new(),
            name: name.into(),
            mesh,
            transform: Transform::default(),
            color: Color::WHITE,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }
}

/// Scoped render pass provided by the host's graphics backend.
///
/// `begin` and `end` bracket every other call made during a frame.
/// Backend failures are reported to the host, never to the caller.
pub trait GraphicsContext {
    fn begin(&mut self);
    fn clear(&mut self);
    fn clear_color(&mut self, color: Color);
    /// Bind whatever program/pipeline `model` needs.
    fn use_model(&mut self, model: &Model);
    /// Upload camera and model transforms for the next draw.
    fn update(&mut self, camera: &Camera, model: &Model);
    fn draw(&mut self, model: &Model);
    fn end(&mut self);
}
