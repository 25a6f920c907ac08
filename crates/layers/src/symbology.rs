use crate::palette::Rgb;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerStyle {
    pub visible: bool,
    pub color: [f32; 4],
    /// Radius of the layer as a multiple of the globe radius.
    pub lift: f32,
}

impl LayerStyle {
    pub const fn new(visible: bool, color: [f32; 4], lift: f32) -> Self {
        Self {
            visible,
            color,
            lift,
        }
    }

    pub fn from_rgb(color: Rgb, opacity: f32, lift: f32) -> Self {
        Self::new(true, color.to_rgba_f32(opacity), lift)
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            visible: true,
            color: [1.0, 1.0, 1.0, 1.0],
            lift: 1.0,
        }
    }
}
