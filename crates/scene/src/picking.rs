use foundation::math::{GeoPoint, Quat, SphericalProjector, Vec3};

use crate::feature::{FeatureId, Polygon, Ring};
use crate::feature_index::FeatureIndex;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir * t
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    /// `None` when the ray hit open ocean.
    pub feature: Option<FeatureId>,
    /// Hit position in the globe's un-rotated frame.
    pub geo: GeoPoint,
    /// Hit position in world space.
    pub point: Vec3,
    pub distance: f64,
}

/// Nearest non-negative intersection of `ray` with a sphere of `radius` at
/// the origin, as distance along the normalized ray.
pub fn ray_sphere_hit(ray: Ray, radius: f64) -> Option<f64> {
    let dir = ray.dir.try_normalize()?;
    let b = ray.origin.dot(dir);
    let c = ray.origin.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let t0 = -b - sq;
    let t1 = -b + sq;
    if t0 >= 0.0 {
        Some(t0)
    } else if t1 >= 0.0 {
        Some(t1)
    } else {
        None
    }
}

/// Even-odd ray casting in lon/lat space.
pub fn point_in_ring(p: GeoPoint, ring: &Ring) -> bool {
    let pts = &ring.points;
    let (x, y) = (p.lon_deg, p.lat_deg);
    let mut inside = false;
    let mut j = pts.len().wrapping_sub(1);
    for i in 0..pts.len() {
        let (xi, yi) = (pts[i].lon_deg, pts[i].lat_deg);
        let (xj, yj) = (pts[j].lon_deg, pts[j].lat_deg);
        // epsilon keeps horizontal edges from dividing by zero
        let crosses = (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi + 1e-12) + xi;
        if crosses {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Bounding box first, then the outer ring, then every hole.
pub fn point_in_polygon(p: GeoPoint, poly: &Polygon) -> bool {
    if !poly.bbox.contains([p.lon_deg, p.lat_deg]) {
        return false;
    }
    if !point_in_ring(p, &poly.outer) {
        return false;
    }
    !poly.holes.iter().any(|h| point_in_ring(p, h))
}

impl FeatureIndex {
    /// First feature in index order containing `p`.
    pub fn feature_at(&self, p: GeoPoint) -> Option<FeatureId> {
        self.features()
            .iter()
            .find(|f| f.polygons.iter().any(|poly| point_in_polygon(p, poly)))
            .map(|f| f.id)
    }
}

/// Ray pick against a globe of `radius` rotated by `orientation`.
///
/// The hit point is taken back into the globe's local frame before the
/// lon/lat conversion, so results do not depend on the current rotation.
pub fn pick_ray(
    index: &FeatureIndex,
    ray: Ray,
    orientation: Quat,
    radius: f64,
    projector: &SphericalProjector,
) -> Option<PickHit> {
    let t = ray_sphere_hit(ray, radius)?;
    let dir = ray.dir.try_normalize()?;
    let point = ray.origin + dir * t;
    let local = orientation.conjugate().rotate(point);
    let geo = projector.to_geo(local)?;

    Some(PickHit {
        feature: index.feature_at(geo),
        geo,
        point,
        distance: t,
    })
}

/// Screen picking wrapper.
///
/// The caller supplies the screen->ray mapping via `make_ray`.
pub fn pick_screen<F>(
    index: &FeatureIndex,
    x_px: f64,
    y_px: f64,
    mut make_ray: F,
    orientation: Quat,
    radius: f64,
    projector: &SphericalProjector,
) -> Option<PickHit>
where
    F: FnMut(f64, f64) -> Option<Ray>,
{
    let ray = make_ray(x_px, y_px)?;
    pick_ray(index, ray, orientation, radius, projector)
}
