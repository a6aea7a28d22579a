use glam::{Mat4, Vec2, Vec3};
use sceneview_common::Viewport;
use sceneview_input::MoveIntent;
use serde::{Deserialize, Serialize};

/// Pitch is kept strictly inside the poles so `forward()` never lines up
/// with world up.
pub const MAX_PITCH_DEGREES: f32 = 89.0;

/// Camera tuning loaded from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Movement rate in world units per second.
    pub base_speed: f32,
    /// Factor applied to `base_speed` while the sprint action is held.
    pub sprint_multiplier: f32,
    /// Degrees of rotation per pixel of mouse motion.
    pub sensitivity: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
    /// Scale combined movement back to unit length so diagonals are not faster.
    pub normalize_diagonal: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            base_speed: 2.5,
            sprint_multiplier: 3.0,
            sensitivity: 0.1,
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(0.0, 0.0, 3.0),
            yaw_degrees: -90.0,
            pitch_degrees: 0.0,
            normalize_diagonal: true,
        }
    }
}

/// First-person fly camera.
///
/// `speed` is a rate in units per second. Elapsed time is passed to each
/// movement call, never folded into `speed`, so nothing can scale by delta
/// time twice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    yaw: f32,
    pitch: f32,
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    speed: f32,
    sensitivity: f32,
    normalize_diagonal: bool,
    look_reference: Option<Vec2>,
}

impl Camera {
    pub fn new(viewport: Viewport) -> Self {
        Self::from_config(&CameraConfig::default(), viewport)
    }

    pub fn from_config(config: &CameraConfig, viewport: Viewport) -> Self {
        Self {
            position: config.position,
            yaw: config.yaw_degrees,
            pitch: config
                .pitch_degrees
                .clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES),
            fov_degrees: config.fov_degrees,
            aspect: viewport.aspect(),
            near: config.near,
            far: config.far,
            speed: config.base_speed,
            sensitivity: config.sensitivity,
            normalize_diagonal: config.normalize_diagonal,
            look_reference: None,
        }
    }

    /// Same camera moving at `rate` units per second.
    #[must_use]
    pub fn with_speed(self, rate: f32) -> Self {
        Self { speed: rate, ..self }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn set_normalize_diagonal(&mut self, enabled: bool) {
        self.normalize_diagonal = enabled;
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn set_orientation(&mut self, yaw_degrees: f32, pitch_degrees: f32) {
        self.yaw = yaw_degrees;
        self.pitch = pitch_degrees.clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES);
    }

    pub fn set_position(&mut self, position: Vec3) {
        tracing::trace!(from = ?self.position, to = ?position, "camera position set");
        self.position = position;
    }

    /// Turn to face `target`. No-op if `target` is the camera position.
    pub fn look_at(&mut self, target: Vec3) {
        let Some(dir) = (target - self.position).try_normalize() else {
            return;
        };
        let pitch = dir.y.clamp(-1.0, 1.0).asin().to_degrees();
        let yaw = dir.z.atan2(dir.x).to_degrees();
        self.set_orientation(yaw, pitch);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.aspect = viewport.aspect();
    }

    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    pub fn up(&self) -> Vec3 {
        Vec3::Y
    }

    /// Translate along the local basis for `dt` seconds.
    ///
    /// Forward follows the full facing vector (pitch included), strafing
    /// follows `right()`, vertical movement follows world up.
    pub fn apply_key_movement(&mut self, intent: MoveIntent, dt: f32) {
        let dir = self.forward() * intent.forward + self.right() * intent.right + self.up() * intent.up;
        if dir.length_squared() <= f32::EPSILON {
            return;
        }
        let dir = if self.normalize_diagonal {
            dir.normalize()
        } else {
            dir
        };
        self.position += dir * self.speed * dt;
    }

    /// Rotate from the change in cursor position since the previous call.
    ///
    /// The first call after [`reset_look_reference`](Self::reset_look_reference)
    /// only records the reference position.
    pub fn apply_free_look(&mut self, mouse_position: Vec2) {
        let Some(last) = self.look_reference.replace(mouse_position) else {
            return;
        };
        let delta = mouse_position - last;
        self.yaw += delta.x * self.sensitivity;
        // Window y grows downward.
        self.pitch = (self.pitch - delta.y * self.sensitivity)
            .clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES);
    }

    pub fn reset_look_reference(&mut self) {
        self.look_reference = None;
    }

    pub fn has_look_reference(&self) -> bool {
        self.look_reference.is_some()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}
