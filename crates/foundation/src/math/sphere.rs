//! Geographic coordinates on a sphere centred at the origin.
//!
//! Longitude rotates around +Y, latitude is elevation from the XZ plane, and
//! `(lon 0, lat 0)` lies on +Z.

use super::{GeoPoint, Quat, Vec3};

pub const DEFAULT_DENSIFY_STEP_DEG: f64 = 2.0;

/// Minimum number of segments produced for any arc.
const MIN_SEGMENTS: usize = 2;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SphericalProjector {
    pub step_deg: f64,
}

impl Default for SphericalProjector {
    fn default() -> Self {
        Self {
            step_deg: DEFAULT_DENSIFY_STEP_DEG,
        }
    }
}

impl SphericalProjector {
    pub fn new(step_deg: f64) -> Self {
        Self { step_deg }
    }

    pub fn to_point(&self, p: GeoPoint, radius: f64) -> Vec3 {
        let lon = p.lon_deg.to_radians();
        let lat = p.lat_deg.to_radians();
        Vec3::new(
            radius * lat.cos() * lon.sin(),
            radius * lat.sin(),
            radius * lat.cos() * lon.cos(),
        )
    }

    /// Inverse of [`Self::to_point`] for any non-zero point; the radius is discarded.
    pub fn to_geo(&self, v: Vec3) -> Option<GeoPoint> {
        let n = v.try_normalize()?;
        let lat = n.y.clamp(-1.0, 1.0).asin().to_degrees();
        let lon = n.x.atan2(n.z).to_degrees();
        Some(GeoPoint::new(lon, lat))
    }

    /// Number of segments used for an arc of `angle_rad`.
    pub fn segments_for(&self, angle_rad: f64) -> usize {
        let step = self.step_deg.max(1e-3).to_radians();
        // exact multiples of the step must not gain a segment from acos noise
        ((angle_rad / step - 1e-9).ceil().max(0.0) as usize).max(MIN_SEGMENTS)
    }

    /// Points along the shorter great-circle arc from `a` to `b`, both
    /// endpoints included.
    pub fn densify(&self, a: GeoPoint, b: GeoPoint, radius: f64) -> Vec<Vec3> {
        let mut out = vec![self.to_point(a, radius)];
        self.densify_into(a, b, radius, &mut out);
        out
    }

    /// Appends the arc from `a` to `b` to `out`, excluding `a` itself.
    pub fn densify_into(&self, a: GeoPoint, b: GeoPoint, radius: f64, out: &mut Vec<Vec3>) {
        let v0 = self.to_point(a, 1.0);
        let v1 = self.to_point(b, 1.0);
        let angle = v0.angle_to(v1);
        let steps = self.segments_for(angle);

        let turn = Quat::from_unit_vectors(v0, v1);
        let axis = Vec3::new(turn.x, turn.y, turn.z);

        out.reserve(steps);
        for s in 1..=steps {
            let t = s as f64 / steps as f64;
            let p = if s == steps {
                v1
            } else {
                Quat::from_axis_angle(axis, angle * t).rotate(v0)
            };
            out.push(p * radius);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "{a} != {b} (eps {eps})");
    }

    #[test]
    fn to_point_axes() {
        let p = SphericalProjector::default();
        let z = p.to_point(GeoPoint::new(0.0, 0.0), 2.0);
        assert_close(z.z, 2.0, 1e-12);
        let x = p.to_point(GeoPoint::new(90.0, 0.0), 1.0);
        assert_close(x.x, 1.0, 1e-12);
        let n = p.to_point(GeoPoint::new(33.0, 90.0), 1.0);
        assert_close(n.y, 1.0, 1e-12);
    }

    #[test]
    fn round_trip_recovers_lon_lat() {
        let p = SphericalProjector::default();
        let mut lat = -89.0;
        while lat <= 89.0 {
            let mut lon = -180.0;
            while lon < 180.0 {
                let g = p.to_geo(p.to_point(GeoPoint::new(lon, lat), 1.3)).unwrap();
                // -180 and 180 are the same meridian
                let dlon = (g.lon_deg - lon + 540.0).rem_euclid(360.0) - 180.0;
                assert_close(dlon, 0.0, 1e-9);
                assert_close(g.lat_deg, lat, 1e-9);
                lon += 7.5;
            }
            lat += 11.0;
        }
    }

    #[test]
    fn poles_round_trip_latitude() {
        let p = SphericalProjector::default();
        let g = p.to_geo(p.to_point(GeoPoint::new(0.0, 90.0), 1.0)).unwrap();
        assert_close(g.lat_deg, 90.0, 1e-9);
        let g = p.to_geo(p.to_point(GeoPoint::new(0.0, -90.0), 1.0)).unwrap();
        assert_close(g.lat_deg, -90.0, 1e-9);
        assert!(p.to_geo(Vec3::ZERO).is_none());
    }

    #[test]
    fn densify_steps_and_endpoints() {
        let p = SphericalProjector::default();
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(10.0, 0.0);
        let pts = p.densify(a, b, 1.0);
        // 10 degrees at 2 degree steps: 5 segments, 6 points
        assert_eq!(pts.len(), 6);
        let first = p.to_geo(pts[0]).unwrap();
        let last = p.to_geo(pts[5]).unwrap();
        assert_close(first.lon_deg, 0.0, 1e-9);
        assert_close(last.lon_deg, 10.0, 1e-9);
        for v in &pts {
            assert_close(v.length(), 1.0, 1e-9);
        }
    }

    #[test]
    fn densify_short_arc_has_two_segments() {
        let p = SphericalProjector::default();
        let pts = p.densify(GeoPoint::new(5.0, 5.0), GeoPoint::new(5.1, 5.0), 2.0);
        assert_eq!(pts.len(), 3);
        let same = p.densify(GeoPoint::new(5.0, 5.0), GeoPoint::new(5.0, 5.0), 2.0);
        assert_eq!(same.len(), 3);
        assert_close((same[1] - same[0]).length(), 0.0, 1e-12);
    }

    #[test]
    fn densify_follows_the_sphere() {
        let p = SphericalProjector::default();
        let pts = p.densify(GeoPoint::new(-60.0, 40.0), GeoPoint::new(60.0, 40.0), 1.0);
        for v in &pts {
            assert_close(v.length(), 1.0, 1e-9);
        }
        for w in pts.windows(2) {
            assert!(w[0].angle_to(w[1]) <= 2.0f64.to_radians() + 1e-9);
        }
    }
}
