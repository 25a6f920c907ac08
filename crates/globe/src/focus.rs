use foundation::math::{GeoPoint, Quat, SphericalProjector, Vec3};
use foundation::time::{Time, TimeSpan};
use scene::{Feature, Polygon};

use crate::camera::VIEW_AXIS;

/// Quadratic ease-in-ease-out on `[0, 1]`.
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Polygon that best represents a feature: roughly the largest by area,
/// with a small bonus for vertex count to break ties.
pub fn primary_polygon(feature: &Feature) -> Option<&Polygon> {
    let mut best: Option<(&Polygon, f64)> = None;
    for poly in &feature.polygons {
        let b = poly.bbox;
        let mid_lat = ((b.min[1] + b.max[1]) * 0.5).to_radians();
        let score =
            b.width().abs() * b.height().abs() * mid_lat.cos().max(0.2) + poly.outer.len() as f64 * 1e-3;
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((poly, score));
        }
    }
    best.map(|(p, _)| p)
}

/// Unit direction (globe-local) towards a feature's primary polygon.
///
/// Averages the outer-ring vertex directions; rings whose directions nearly
/// cancel fall back to the bounding-box centre.
pub fn feature_direction(feature: &Feature, projector: &SphericalProjector) -> Option<Vec3> {
    let poly = primary_polygon(feature)?;
    let mut sum = Vec3::ZERO;
    for p in &poly.outer.points {
        sum += projector.to_point(*p, 1.0);
    }
    if sum.length_squared() < 1e-6 {
        let [lon, lat] = poly.bbox.center();
        return projector.to_point(GeoPoint::new(lon, lat), 1.0).try_normalize();
    }
    sum.try_normalize()
}

/// Orientation that carries `dir_local` onto the camera axis by the
/// shortest rotation from where it currently is.
pub fn focus_target(orientation: Quat, dir_local: Vec3) -> Quat {
    let dir_world = orientation.rotate(dir_local).normalize_or_zero();
    (Quat::from_unit_vectors(dir_world, VIEW_AXIS) * orientation).normalize()
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FocusAnimation {
    pub span: TimeSpan,
    pub from: Quat,
    pub to: Quat,
}

/// At most one in-flight orientation animation; a new start replaces it.
#[derive(Debug, Clone)]
pub struct FocusAnimator {
    duration_ms: f64,
    active: Option<FocusAnimation>,
}

impl FocusAnimator {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            duration_ms,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn animation(&self) -> Option<&FocusAnimation> {
        self.active.as_ref()
    }

    pub fn start(&mut self, orientation: Quat, dir_local: Vec3, now: Time) -> Quat {
        let to = focus_target(orientation, dir_local);
        self.active = Some(FocusAnimation {
            span: TimeSpan::starting_at(now, self.duration_ms),
            from: orientation,
            to,
        });
        to
    }

    /// Returns `true` if an animation was dropped.
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }

    /// Orientation for `now`, or `None` when idle. The animation is cleared
    /// once it reaches its end.
    pub fn update(&mut self, now: Time) -> Option<Quat> {
        let anim = self.active?;
        let t = anim.span.progress(now);
        let q = anim.from.slerp(anim.to, ease_in_out(t));
        if t >= 1.0 {
            self.active = None;
            return Some(anim.to);
        }
        Some(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene::{FeatureId, Ring};

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

    fn feature(polygons: Vec<Polygon>) -> Feature {
        Feature {
            id: FeatureId(0),
            code: None,
            name: None,
            polygons,
        }
    }

    #[test]
    fn easing_is_symmetric_and_bounded() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(0.5), 0.5);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert!((ease_in_out(0.25) + ease_in_out(0.75) - 1.0).abs() < 1e-12);
        assert_eq!(ease_in_out(2.0), 1.0);
    }

    #[test]
    fn primary_polygon_prefers_large_low_latitude_area() {
        let small = rect(0.0, 0.0, 2.0, 2.0);
        let big = rect(10.0, 0.0, 30.0, 20.0);
        let polar = rect(-40.0, 80.0, 0.0, 89.0);
        let f = feature(vec![small, big.clone(), polar]);
        assert_eq!(primary_polygon(&f), Some(&big));
        assert_eq!(primary_polygon(&feature(Vec::new())), None);
    }

    #[test]
    fn direction_points_at_polygon_centre() {
        let p = SphericalProjector::default();
        let f = feature(vec![rect(-10.0, -10.0, 10.0, 10.0)]);
        let d = feature_direction(&f, &p).unwrap();
        assert!(d.angle_to(Vec3::Z) < 1e-6);
    }

    #[test]
    fn direction_falls_back_to_bbox_centre_when_sum_cancels() {
        let p = SphericalProjector::default();
        // four equatorial points 90 degrees apart cancel out
        let ring = Ring::new(vec![
            GeoPoint::new(-180.0, 0.0),
            GeoPoint::new(-90.0, 0.0),
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(90.0, 0.0),
        ]);
        let f = feature(vec![Polygon::new(ring, Vec::new()).unwrap()]);
        let d = feature_direction(&f, &p).unwrap();
        let expected = p.to_point(GeoPoint::new(-45.0, 0.0), 1.0);
        assert!(d.angle_to(expected) < 1e-6);
    }

    #[test]
    fn animation_lands_on_view_axis() {
        let mut anim = FocusAnimator::new(650.0);
        let start = Quat::from_axis_angle(Vec3::new(0.2, 1.0, 0.1), 2.0);
        let dir = SphericalProjector::default().to_point(GeoPoint::new(40.0, -25.0), 1.0);
        anim.start(start, dir, Time(1000.0));

        let mid = anim.update(Time(1325.0)).unwrap();
        assert!(anim.is_active());
        assert!(mid.rotate(dir).angle_to(VIEW_AXIS) > 1e-3);

        let end = anim.update(Time(1650.0)).unwrap();
        assert!(!anim.is_active());
        assert!(end.rotate(dir).angle_to(VIEW_AXIS) < 1e-6);
        assert_eq!(anim.update(Time(1700.0)), None);
    }

    #[test]
    fn restart_mid_flight_converges_to_same_target() {
        let dir = SphericalProjector::default().to_point(GeoPoint::new(-120.0, 30.0), 1.0);
        let start = Quat::IDENTITY;

        let mut a = FocusAnimator::new(650.0);
        let target = a.start(start, dir, Time(0.0));

        let mut b = FocusAnimator::new(650.0);
        b.start(start, dir, Time(0.0));
        let mid = b.update(Time(200.0)).unwrap();
        let restarted = b.start(mid, dir, Time(200.0));

        assert!(target.angle_to(restarted) < 1e-6);
        assert!(b.cancel());
        assert!(!b.cancel());
    }
}
