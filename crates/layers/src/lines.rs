use foundation::math::{SphericalProjector, Vec3};
use scene::{Feature, FeatureIndex, Ring};

use crate::layer::{Layer, LayerId};
use crate::symbology::LayerStyle;

pub const BORDER_LAYER: LayerId = LayerId(2);
pub const SELECTION_OUTLINE_LAYER: LayerId = LayerId(3);

/// Polylines hugging the sphere, one strip per ring.
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayer {
    id: LayerId,
    pub style: LayerStyle,
    pub strips: Vec<Vec<Vec3>>,
}

impl LineLayer {
    pub fn new(id: LayerId, style: LayerStyle) -> Self {
        Self {
            id,
            style,
            strips: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.strips.is_empty()
    }

    pub fn clear(&mut self) {
        self.strips.clear();
    }

    pub fn vertex_count(&self) -> usize {
        self.strips.iter().map(Vec::len).sum()
    }

    /// Flattens strips into independent segments (`[a, b, b, c, ...]`).
    pub fn segment_list(&self) -> Vec<Vec3> {
        let mut out = Vec::with_capacity(self.vertex_count() * 2);
        for strip in &self.strips {
            for w in strip.windows(2) {
                out.push(w[0]);
                out.push(w[1]);
            }
        }
        out
    }

    /// Adds every ring of `feature` at `radius`.
    pub fn push_feature(&mut self, feature: &Feature, radius: f64, projector: &SphericalProjector) {
        for poly in &feature.polygons {
            for ring in poly.rings() {
                if let Some(strip) = ring_strip(ring, radius, projector) {
                    self.strips.push(strip);
                }
            }
        }
    }
}

impl Layer for LineLayer {
    fn id(&self) -> LayerId {
        self.id
    }
}

/// Densified closed polyline for one ring; `None` for rings under two points.
pub fn ring_strip(ring: &Ring, radius: f64, projector: &SphericalProjector) -> Option<Vec<Vec3>> {
    let first = ring.points.first()?;
    let mut pts = vec![projector.to_point(*first, radius)];
    for (a, b) in ring.edges() {
        projector.densify_into(a, b, radius, &mut pts);
    }
    (pts.len() >= 2).then_some(pts)
}

/// Border lines for every ring of every feature.
pub fn build_border_layer(
    index: &FeatureIndex,
    radius: f64,
    style: LayerStyle,
    projector: &SphericalProjector,
) -> LineLayer {
    let mut layer = LineLayer::new(BORDER_LAYER, style);
    for feature in index.features() {
        layer.push_feature(feature, radius, projector);
    }
    layer
}

/// Outline of a single feature, or an empty layer when nothing is selected.
pub fn build_outline_layer(
    feature: Option<&Feature>,
    radius: f64,
    style: LayerStyle,
    projector: &SphericalProjector,
) -> LineLayer {
    let mut layer = LineLayer::new(SELECTION_OUTLINE_LAYER, style);
    if let Some(feature) = feature {
        layer.push_feature(feature, radius, projector);
    }
    layer
}
