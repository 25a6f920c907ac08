//! Offline helpers behind the `globe-tools` binary: inspect a geography
//! file, pick a feature by lon/lat, render the map texture and drive a
//! headless engine through a selection.

use std::fs;
use std::path::Path;

use formats::{GeographyDocument, build_feature_index};
use foundation::math::{GeoPoint, SphericalProjector};
use foundation::time::Time;
use globe::{GlobeConfig, GlobeEngine, VIEW_AXIS, feature_direction};
use layers::MapTexture;
use scene::{Feature, FeatureIndex, SelectionState};
use serde::Serialize;

pub fn load_index(path: &Path) -> Result<FeatureIndex, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    let doc = GeographyDocument::from_geojson_str(&text).map_err(|e| format!("{path:?}: {e}"))?;
    let index = build_feature_index(&doc);
    tracing::info!(
        features = index.len(),
        codes = index.code_count(),
        "loaded {}",
        path.display()
    );
    Ok(index)
}

pub fn load_config(path: Option<&Path>) -> Result<GlobeConfig, String> {
    match path {
        Some(p) => GlobeConfig::from_path(p).map_err(|e| format!("{p:?}: {e}")),
        None => Ok(GlobeConfig::default()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSummary {
    pub index: u32,
    pub code: Option<String>,
    pub name: Option<String>,
    pub polygons: usize,
    pub vertices: usize,
}

impl FeatureSummary {
    fn of(f: &Feature) -> Self {
        Self {
            index: f.id.0,
            code: f.code.clone(),
            name: f.name.clone(),
            polygons: f.polygons.len(),
            vertices: f.vertex_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectReport {
    pub features: usize,
    pub codes: usize,
    pub duplicate_codes: usize,
    pub vertices: usize,
    pub entries: Vec<FeatureSummary>,
}

pub fn inspect(index: &FeatureIndex) -> InspectReport {
    InspectReport {
        features: index.len(),
        codes: index.code_count(),
        duplicate_codes: index.duplicate_codes(),
        vertices: index.vertex_count(),
        entries: index.features().iter().map(FeatureSummary::of).collect(),
    }
}

pub fn pick(index: &FeatureIndex, lon: f64, lat: f64) -> Option<FeatureSummary> {
    let id = index.feature_at(GeoPoint::new(lon, lat).wrapped())?;
    index.get(id).map(FeatureSummary::of)
}

/// Paints the equirectangular map texture, optionally with one feature
/// highlighted as selected.
pub fn render(
    index: &FeatureIndex,
    config: &GlobeConfig,
    selected: Option<&str>,
) -> Result<MapTexture, String> {
    let mut selection = SelectionState::new();
    if let Some(code) = selected {
        let feature = index
            .find_by_code(code)
            .ok_or_else(|| format!("no feature with code {code:?}"))?;
        selection.select(Some(feature.id));
    }
    let mut texture = MapTexture::new(config.texture.width, config.texture.height);
    texture.redraw(index, &selection, &config.palette);
    Ok(texture)
}

pub fn write_png(texture: &MapTexture, path: &Path) -> Result<(), String> {
    image::save_buffer(
        path,
        texture.pixels(),
        texture.width(),
        texture.height(),
        image::ColorType::Rgba8,
    )
    .map_err(|e| format!("write {path:?}: {e}"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub frames: u64,
    pub selected: Option<String>,
    /// Angle between the selected feature and the view axis, degrees.
    pub focus_error_deg: Option<f64>,
    pub orientation: [f64; 4],
    pub distance: f64,
}

/// Runs a headless engine for `frames` frames spaced `dt_ms` apart after
/// an external selection of `code`.
pub fn simulate(
    index: FeatureIndex,
    config: GlobeConfig,
    code: Option<&str>,
    frames: u64,
    dt_ms: f64,
) -> SimulationReport {
    let projector = SphericalProjector::new(config.geometry.densify_step_deg);
    let mut t = Time(0.0);
    let mut engine = GlobeEngine::new(config, t);
    engine.install_index(index);
    engine.request_resize(1280.0, 720.0, 1.0, t);
    engine.set_selected_code(code);

    for _ in 0..frames {
        engine.tick(t);
        t = t.add_ms(dt_ms);
    }

    let orientation = engine.orientation();
    let focus_error_deg = engine
        .selection()
        .selected()
        .and_then(|id| engine.index().get(id))
        .and_then(|f| feature_direction(f, &projector))
        .map(|dir| orientation.rotate(dir).angle_to(VIEW_AXIS).to_degrees());

    SimulationReport {
        frames,
        selected: engine.selected_code().map(str::to_string),
        focus_error_deg,
        orientation: [orientation.x, orientation.y, orientation.z, orientation.w],
        distance: engine.camera().distance(),
    }
}
