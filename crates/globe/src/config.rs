use std::path::Path;

use layers::Palette;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Yaw about the globe's local vertical axis, radians per pixel.
    pub drag_yaw_per_px: f64,
    /// Pitch about the camera's right axis, radians per pixel.
    pub drag_pitch_per_px: f64,
    pub wheel_zoom_strength: f64,
    pub pinch_zoom_strength: f64,
    pub tap_px_tolerance: f64,
    pub tap_ms_tolerance: f64,
    pub min_distance_factor: f64,
    pub max_distance_factor: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            drag_yaw_per_px: 0.004,
            drag_pitch_per_px: 0.004,
            wheel_zoom_strength: 0.0018,
            pinch_zoom_strength: 0.008,
            tap_px_tolerance: 6.0,
            tap_ms_tolerance: 300.0,
            min_distance_factor: 1.2,
            max_distance_factor: 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoRotateConfig {
    pub deg_per_sec: f64,
    pub idle_ms: f64,
}

impl Default for AutoRotateConfig {
    fn default() -> Self {
        Self {
            deg_per_sec: 0.8,
            idle_ms: 1200.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    pub duration_ms: f64,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self { duration_ms: 650.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_deg: f64,
    pub fit_margin: f64,
    /// Radius used for fitting, as a multiple of the globe radius.
    pub fit_radius_scale: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_deg: 45.0,
            fit_margin: 1.06,
            fit_radius_scale: 1.01,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            width: layers::DEFAULT_TEXTURE_WIDTH,
            height: layers::DEFAULT_TEXTURE_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub globe_radius: f64,
    pub border_radius_scale: f64,
    pub highlight_radius_scale: f64,
    pub densify_step_deg: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            globe_radius: 1.0,
            border_radius_scale: 1.0015,
            highlight_radius_scale: 1.003,
            densify_step_deg: foundation::math::DEFAULT_DENSIFY_STEP_DEG,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfieldConfig {
    pub count: u32,
    pub radius: f64,
    pub size: f32,
    pub opacity: f32,
    pub seed: u64,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            count: 2800,
            radius: 60.0,
            size: 0.45,
            opacity: 0.9,
            seed: 0x5eed_57a2,
        }
    }
}

/// Engine tuning. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    pub navigation: NavigationConfig,
    pub auto_rotate: AutoRotateConfig,
    pub focus: FocusConfig,
    pub camera: CameraConfig,
    pub texture: TextureConfig,
    pub palette: Palette,
    pub geometry: GeometryConfig,
    pub stars: StarfieldConfig,
    pub resize_debounce_ms: f64,
    pub geography_url: String,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            navigation: NavigationConfig::default(),
            auto_rotate: AutoRotateConfig::default(),
            focus: FocusConfig::default(),
            camera: CameraConfig::default(),
            texture: TextureConfig::default(),
            palette: Palette::default(),
            geometry: GeometryConfig::default(),
            stars: StarfieldConfig::default(),
            resize_debounce_ms: 150.0,
            geography_url: "geo/world.geojson".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config read failed: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse failed: {e}"),
            ConfigError::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl GlobeConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: GlobeConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &str, v: f64) -> Result<(), ConfigError> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{name} must be positive, got {v}")))
            }
        }

        let fov = self.camera.fov_y_deg;
        if !(fov > 0.0 && fov < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov_y_deg must be in (0, 180), got {fov}"
            )));
        }
        if self.texture.width == 0 || self.texture.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "texture size must be non-zero, got {}x{}",
                self.texture.width, self.texture.height
            )));
        }
        positive("focus.duration_ms", self.focus.duration_ms)?;
        positive("auto_rotate.idle_ms", self.auto_rotate.idle_ms)?;
        positive("navigation.tap_ms_tolerance", self.navigation.tap_ms_tolerance)?;
        positive("camera.fit_margin", self.camera.fit_margin)?;
        positive("camera.near", self.camera.near)?;
        positive("geometry.globe_radius", self.geometry.globe_radius)?;
        positive("geometry.densify_step_deg", self.geometry.densify_step_deg)?;
        if self.camera.far <= self.camera.near {
            return Err(ConfigError::Invalid(
                "camera.far must exceed camera.near".to_string(),
            ));
        }
        if self.navigation.min_distance_factor > self.navigation.max_distance_factor {
            return Err(ConfigError::Invalid(
                "navigation.min_distance_factor exceeds max_distance_factor".to_string(),
            ));
        }
        if self.resize_debounce_ms < 0.0 {
            return Err(ConfigError::Invalid(
                "resize_debounce_ms must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_yields_defaults() {
        let cfg = GlobeConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, GlobeConfig::default());
        assert_eq!(cfg.navigation.tap_px_tolerance, 6.0);
        assert_eq!(cfg.auto_rotate.idle_ms, 1200.0);
        assert_eq!(cfg.resize_debounce_ms, 150.0);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GlobeConfig::from_json_str(
            r##"{ "focus": { "duration_ms": 900 }, "palette": { "ocean": "#112233" } }"##,
        )
        .unwrap();
        assert_eq!(cfg.focus.duration_ms, 900.0);
        assert_eq!(cfg.palette.ocean, layers::Rgb::from_hex(0x112233));
        assert_eq!(cfg.palette.land, Palette::default().land);
        assert_eq!(cfg.camera, CameraConfig::default());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            GlobeConfig::from_json_str(r#"{ "camera": { "fov_y_deg": 180 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            GlobeConfig::from_json_str(r#"{ "texture": { "width": 0 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            GlobeConfig::from_json_str(r#"{ "focus": { "duration_ms": 0 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            GlobeConfig::from_json_str("[1, 2"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn serialized_defaults_round_trip() {
        let text = GlobeConfig::default().to_json_pretty().unwrap();
        assert_eq!(GlobeConfig::from_json_str(&text).unwrap(), GlobeConfig::default());
    }
}
