use foundation::math::GeoPoint;
use scene::{Feature, FeatureIndex, SelectionState};

use crate::layer::{Layer, LayerId};
use crate::palette::{Palette, Rgb};
use crate::raster::RgbaRaster;

pub const MAP_TEXTURE_LAYER: LayerId = LayerId(1);

pub const DEFAULT_TEXTURE_WIDTH: u32 = 2048;
pub const DEFAULT_TEXTURE_HEIGHT: u32 = 1024;

/// Equirectangular map raster painted from a [`FeatureIndex`].
///
/// Draw order per redraw: ocean, plain land, translucent hover, opaque
/// selection. The dirty flag stays set until the renderer takes it.
#[derive(Debug, Clone)]
pub struct MapTexture {
    raster: RgbaRaster,
    dirty: bool,
    revision: u64,
}

impl MapTexture {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            raster: RgbaRaster::new(width.max(1), height.max(1)),
            dirty: false,
            revision: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn pixels(&self) -> &[u8] {
        self.raster.pixels()
    }

    pub fn raster(&self) -> &RgbaRaster {
        &self.raster
    }

    /// Number of completed redraws.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns `true` once per redraw; the caller uploads when it does.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Texture coordinates (pixels) of a geographic point.
    pub fn project(&self, p: GeoPoint) -> [f64; 2] {
        let w = self.raster.width() as f64;
        let h = self.raster.height() as f64;
        [
            (p.lon_deg + 180.0) / 360.0 * w,
            (90.0 - p.lat_deg) / 180.0 * h,
        ]
    }

    pub fn redraw(&mut self, index: &FeatureIndex, selection: &SelectionState, palette: &Palette) {
        let selected = selection.selected().and_then(|id| index.get(id));
        let hovered = selection.effective_hover().and_then(|id| index.get(id));

        self.raster.fill(palette.ocean);

        for feature in index.features() {
            if Some(feature.id) == selected.map(|f| f.id) || Some(feature.id) == hovered.map(|f| f.id)
            {
                continue;
            }
            self.fill_feature(feature, palette.land, 1.0);
        }

        if let Some(f) = hovered {
            self.fill_feature(f, palette.hover_fill, palette.hover_opacity);
        }
        if let Some(f) = selected {
            self.fill_feature(f, palette.selected_fill, 1.0);
        }

        self.revision += 1;
        self.dirty = true;
        tracing::trace!(
            revision = self.revision,
            selected = ?selection.selected(),
            hovered = ?selection.effective_hover(),
            "map texture redrawn"
        );
    }

    fn fill_feature(&mut self, feature: &Feature, color: Rgb, alpha: f32) {
        for poly in &feature.polygons {
            let rings: Vec<Vec<[f64; 2]>> = poly
                .rings()
                .map(|r| r.points.iter().map(|p| self.project(*p)).collect())
                .collect();
            self.raster.fill_even_odd(&rings, color, alpha);
        }
    }
}

impl Default for MapTexture {
    fn default() -> Self {
        Self::new(DEFAULT_TEXTURE_WIDTH, DEFAULT_TEXTURE_HEIGHT)
    }
}

impl Layer for MapTexture {
    fn id(&self) -> LayerId {
        MAP_TEXTURE_LAYER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene::{FeatureId, FeatureIndexBuilder, Polygon, Ring};

    fn rect(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Polygon {
        Polygon::new(
            Ring::new(vec![
                GeoPoint::new(min_lon, min_lat),
                GeoPoint::new(max_lon, min_lat),
                GeoPoint::new(max_lon, max_lat),
                GeoPoint::new(min_lon, max_lat),
            ]),
            Vec::new(),
        )
        .unwrap()
    }

    fn index() -> FeatureIndex {
        let mut b = FeatureIndexBuilder::new();
        b.push(Some("AB".into()), None, vec![rect(10.0, 10.0, 20.0, 20.0)]);
        b.push(Some("CD".into()), None, vec![rect(-20.0, -20.0, -10.0, -10.0)]);
        b.build()
    }

    fn color_at(tex: &MapTexture, lon: f64, lat: f64) -> [u8; 3] {
        let [x, y] = tex.project(GeoPoint::new(lon, lat));
        let px = tex.raster().pixel(x as u32, y as u32).unwrap();
        [px[0], px[1], px[2]]
    }

    fn rgb(c: Rgb) -> [u8; 3] {
        [c.r, c.g, c.b]
    }

    #[test]
    fn projects_equirectangular() {
        let tex = MapTexture::new(360, 180);
        assert_eq!(tex.project(GeoPoint::new(-180.0, 90.0)), [0.0, 0.0]);
        assert_eq!(tex.project(GeoPoint::new(0.0, 0.0)), [180.0, 90.0]);
        assert_eq!(tex.project(GeoPoint::new(180.0, -90.0)), [360.0, 180.0]);
    }

    #[test]
    fn paints_ocean_land_hover_and_selection() {
        let palette = Palette::default();
        let index = index();
        let mut tex = MapTexture::new(360, 180);
        let mut sel = SelectionState::new();

        tex.redraw(&index, &sel, &palette);
        assert_eq!(color_at(&tex, 0.0, 0.0), rgb(palette.ocean));
        assert_eq!(color_at(&tex, 15.0, 15.0), rgb(palette.land));

        sel.select(Some(FeatureId(0)));
        sel.hover(Some(FeatureId(1)));
        tex.redraw(&index, &sel, &palette);
        assert_eq!(color_at(&tex, 15.0, 15.0), rgb(palette.selected_fill));
        let hover = color_at(&tex, -15.0, -15.0);
        assert_ne!(hover, rgb(palette.land));
        assert_ne!(hover, rgb(palette.hover_fill));
        // hovered feature is blended over ocean, not over land
        let expected_r = (palette.ocean.r as f32
            + (palette.hover_fill.r as f32 - palette.ocean.r as f32) * palette.hover_opacity)
            .round() as u8;
        assert_eq!(hover[0], expected_r);
    }

    #[test]
    fn selected_and_hovered_same_feature_draws_selected() {
        let palette = Palette::default();
        let index = index();
        let mut tex = MapTexture::new(360, 180);
        let mut sel = SelectionState::new();
        sel.select(Some(FeatureId(1)));
        sel.hover(Some(FeatureId(1)));
        tex.redraw(&index, &sel, &palette);
        assert_eq!(color_at(&tex, -15.0, -15.0), rgb(palette.selected_fill));
    }

    #[test]
    fn dirty_flag_is_taken_once() {
        let mut tex = MapTexture::new(8, 4);
        assert!(!tex.take_dirty());
        tex.redraw(&FeatureIndex::empty(), &SelectionState::new(), &Palette::default());
        assert!(tex.is_dirty());
        assert!(tex.take_dirty());
        assert!(!tex.take_dirty());
        assert_eq!(tex.revision(), 1);
    }
}
