use foundation::math::{Mat4, Quat, Vec3};
use layers::{LineLayer, MapTexture, Rgb};
use runtime::Frame;

/// Ambient plus one directional light, both fixed relative to the camera.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Lighting {
    pub ambient: f32,
    pub directional: f32,
    /// Direction towards the light, camera space, normalized.
    pub direction: Vec3,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 0.7,
            directional: 0.9,
            direction: Vec3::new(5.0, 2.0, 4.0).normalize_or_zero(),
        }
    }
}

/// Everything a surface needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    pub frame: Frame,
    pub view: Mat4,
    pub projection: Mat4,
    pub view_proj: Mat4,
    /// Rotation by the world orientation, scaled to the globe radius.
    pub globe_model: Mat4,
    /// Rotation only; line layers are built at their final radius.
    pub lines_model: Mat4,
    pub orientation: Quat,
    pub eye: Vec3,
    pub clear_color: Rgb,
    pub lighting: Lighting,
}

/// GPU side of the engine. Implementations own every GPU-visible resource
/// and must free all of them in `release`.
pub trait RenderSurface {
    /// Drawable size in physical pixels.
    fn resize(&mut self, width: u32, height: u32);
    fn upload_map_texture(&mut self, texture: &MapTexture);
    /// Replaces the geometry of the layer with the same id.
    fn set_lines(&mut self, layer: &LineLayer);
    fn draw(&mut self, view: &FrameView);
    fn release(&mut self);
}

/// Host-side resources the engine cannot own directly. Teardown calls these
/// in declaration order.
pub trait EngineHost {
    fn abort_load(&mut self);
    fn detach_input(&mut self);
    fn stop_frames(&mut self);
}
