use foundation::bounds::Aabb2;
use foundation::math::GeoPoint;

/// Index of a feature inside its [`crate::FeatureIndex`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(pub u32);

impl FeatureId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Ordered lon/lat vertices. Closure is implicit: the last point may or may
/// not repeat the first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ring {
    pub points: Vec<GeoPoint>,
}

impl Ring {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when the first and last vertices coincide.
    pub fn is_explicitly_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) if self.points.len() > 1 => a == b,
            _ => false,
        }
    }

    /// Vertex pairs forming the ring's edges, including the closing edge
    /// when the ring is not explicitly closed.
    pub fn edges(&self) -> impl Iterator<Item = (GeoPoint, GeoPoint)> + '_ {
        let closing = if self.points.len() > 1 && !self.is_explicitly_closed() {
            self.points.last().copied().zip(self.points.first().copied())
        } else {
            None
        };
        self.points
            .windows(2)
            .map(|w| (w[0], w[1]))
            .chain(closing)
    }

    pub fn bbox(&self) -> Option<Aabb2> {
        Aabb2::from_points(self.points.iter().map(|p| [p.lon_deg, p.lat_deg]))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub outer: Ring,
    pub holes: Vec<Ring>,
    /// Bounds of the outer ring.
    pub bbox: Aabb2,
}

impl Polygon {
    /// `None` when the outer ring has no vertices.
    pub fn new(outer: Ring, holes: Vec<Ring>) -> Option<Self> {
        let bbox = outer.bbox()?;
        Some(Self { outer, holes, bbox })
    }

    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    /// Normalized alpha-2 code, if any candidate property yielded one.
    pub code: Option<String>,
    pub name: Option<String>,
    pub polygons: Vec<Polygon>,
}

impl Feature {
    pub fn vertex_count(&self) -> usize {
        self.polygons
            .iter()
            .flat_map(|p| p.rings())
            .map(|r| r.len())
            .sum()
    }

    /// Human-readable label: name, else code, else the feature index.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.code.clone())
            .unwrap_or_else(|| format!("#{}", self.id.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(pts: &[[f64; 2]]) -> Ring {
        Ring::new(pts.iter().copied().map(GeoPoint::from).collect())
    }

    #[test]
    fn open_ring_gets_closing_edge() {
        let r = ring(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
        assert!(!r.is_explicitly_closed());
        let edges: Vec<_> = r.edges().collect();
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[2], (GeoPoint::new(1.0, 1.0), GeoPoint::new(0.0, 0.0)));
    }

    #[test]
    fn closed_ring_has_no_extra_edge() {
        let r = ring(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]);
        assert!(r.is_explicitly_closed());
        assert_eq!(r.edges().count(), 3);
    }

    #[test]
    fn polygon_bbox_comes_from_outer_ring() {
        let p = Polygon::new(
            ring(&[[10.0, -5.0], [20.0, -5.0], [20.0, 5.0]]),
            vec![ring(&[[100.0, 100.0]])],
        )
        .unwrap();
        assert_eq!(p.bbox, Aabb2::new([10.0, -5.0], [20.0, 5.0]));
        assert!(Polygon::new(Ring::default(), Vec::new()).is_none());
    }
}
