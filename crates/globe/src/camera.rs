use foundation::math::{
    Mat4, Quat, Vec3, mat4_look_at_rh, mat4_mul, mat4_perspective_rh_z0, mat4_scale,
};
use scene::Ray;

use crate::config::{CameraConfig, NavigationConfig};

/// Unit vector from the origin towards the camera. The camera never leaves
/// this axis; only its distance changes.
pub const VIEW_AXIS: Vec3 = Vec3::Z;

/// Distance at which a sphere of `radius` fits both viewport extents.
pub fn fit(fov_y_rad: f64, aspect: f64, radius: f64, margin: f64) -> f64 {
    let half = (fov_y_rad * 0.5).tan();
    let fit_h = radius / half;
    let fit_w = radius / (half * aspect.max(1e-6));
    fit_h.max(fit_w) * margin
}

#[derive(Debug, Clone)]
pub struct CameraRig {
    fov_y_rad: f64,
    near: f64,
    far: f64,
    fit_margin: f64,
    fit_radius: f64,
    min_factor: f64,
    max_factor: f64,

    viewport: [f64; 2],
    aspect: f64,
    base: f64,
    min: f64,
    max: f64,
    /// Target distance, staged by input.
    requested: Option<f64>,
    /// Distance committed by the last frame.
    applied: f64,
}

impl CameraRig {
    pub fn new(camera: &CameraConfig, nav: &NavigationConfig, globe_radius: f64) -> Self {
        let fit_radius = globe_radius * camera.fit_radius_scale;
        let fov_y_rad = camera.fov_y_deg.to_radians();
        let base = fit(fov_y_rad, 1.0, fit_radius, camera.fit_margin);
        Self {
            fov_y_rad,
            near: camera.near,
            far: camera.far,
            fit_margin: camera.fit_margin,
            fit_radius,
            min_factor: nav.min_distance_factor,
            max_factor: nav.max_distance_factor,
            viewport: [1.0, 1.0],
            aspect: 1.0,
            base,
            min: base * nav.min_distance_factor,
            max: base * nav.max_distance_factor,
            requested: None,
            applied: base,
        }
    }

    pub fn viewport(&self) -> [f64; 2] {
        self.viewport
    }

    pub fn aspect(&self) -> f64 {
        self.aspect
    }

    pub fn fov_y_rad(&self) -> f64 {
        self.fov_y_rad
    }

    pub fn base_distance(&self) -> f64 {
        self.base
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn requested_distance(&self) -> f64 {
        self.requested.unwrap_or(self.base)
    }

    pub fn distance(&self) -> f64 {
        self.applied
    }

    pub fn eye(&self) -> Vec3 {
        VIEW_AXIS * self.applied
    }

    /// Refits to a new viewport (CSS pixels). The current distance keeps its
    /// ratio to the base distance and is then clamped into the new range.
    pub fn resize(&mut self, width: f64, height: f64) {
        let width = width.max(1.0);
        let height = height.max(1.0);
        let old_base = self.base;

        self.viewport = [width, height];
        self.aspect = width / height;
        self.base = fit(self.fov_y_rad, self.aspect, self.fit_radius, self.fit_margin);
        self.min = self.base * self.min_factor;
        self.max = self.base * self.max_factor;

        let next = match self.requested {
            None => self.base,
            Some(d) => d * (self.base / old_base),
        };
        let next = self.clamp(next);
        self.requested = Some(next);
        self.applied = next;

        tracing::debug!(
            width,
            height,
            base = self.base,
            distance = next,
            "camera refit"
        );
    }

    pub fn clamp(&self, d: f64) -> f64 {
        d.clamp(self.min, self.max)
    }

    /// Scales the staged distance; the result is clamped immediately.
    pub fn zoom_by(&mut self, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let d = self.requested_distance() * factor;
        self.requested = Some(self.clamp(d));
    }

    /// Commits the staged distance; called once per frame.
    pub fn commit(&mut self) -> f64 {
        self.applied = self.clamp(self.requested_distance());
        self.applied
    }

    pub fn view(&self) -> Mat4 {
        mat4_look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        mat4_perspective_rh_z0(self.fov_y_rad, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        mat4_mul(self.projection(), self.view())
    }

    /// Model matrix for a globe layer rotated by `orientation` at `scale`.
    pub fn model(orientation: Quat, scale: f64) -> Mat4 {
        mat4_mul(orientation.to_mat4(), mat4_scale(scale))
    }

    /// Ray from the eye through a viewport position in CSS pixels.
    pub fn ray_through(&self, x_px: f64, y_px: f64) -> Option<Ray> {
        let [w, h] = self.viewport;
        if w <= 0.0 || h <= 0.0 {
            return None;
        }
        let ndc_x = 2.0 * x_px / w - 1.0;
        let ndc_y = 1.0 - 2.0 * y_px / h;
        let half = (self.fov_y_rad * 0.5).tan();
        let dir = Vec3::new(ndc_x * half * self.aspect, ndc_y * half, -1.0);
        Some(Ray::new(self.eye(), dir.try_normalize()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::math::mat4_transform_point;

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "{a} != {b} (eps {eps})");
    }

    fn rig() -> CameraRig {
        CameraRig::new(&CameraConfig::default(), &NavigationConfig::default(), 1.0)
    }

    fn ndc(rig: &CameraRig, p: Vec3) -> [f64; 2] {
        let c = mat4_transform_point(&rig.view_proj(), p);
        [c[0] / c[3], c[1] / c[3]]
    }

    #[test]
    fn fit_takes_the_tighter_extent() {
        let fov = 45f64.to_radians();
        let tall = fit(fov, 0.5, 1.0, 1.0);
        let wide = fit(fov, 2.0, 1.0, 1.0);
        assert_close(wide, 1.0 / (fov * 0.5).tan(), 1e-12);
        assert_close(tall, 2.0 / (fov * 0.5).tan(), 1e-12);
        assert_close(fit(fov, 2.0, 1.0, 1.06), wide * 1.06, 1e-12);
    }

    #[test]
    fn fitted_radius_reaches_the_viewport_edge() {
        let cfg = CameraConfig {
            fit_margin: 1.0,
            fit_radius_scale: 1.0,
            ..CameraConfig::default()
        };
        let mut rig = CameraRig::new(&cfg, &NavigationConfig::default(), 1.0);

        rig.resize(1600.0, 900.0);
        assert_close(rig.distance(), rig.base_distance(), 1e-12);
        let top = ndc(&rig, Vec3::new(0.0, 1.0, 0.0));
        assert_close(top[1], 1.0, 1e-5);
        assert!(ndc(&rig, Vec3::new(1.0, 0.0, 0.0))[0] < 1.0);

        rig.resize(600.0, 1000.0);
        let right = ndc(&rig, Vec3::new(1.0, 0.0, 0.0));
        assert_close(right[0], 1.0, 1e-5);
        assert!(ndc(&rig, Vec3::new(0.0, 1.0, 0.0))[1] < 1.0);
    }

    #[test]
    fn zoom_is_clamped_to_range() {
        let mut rig = rig();
        rig.resize(800.0, 800.0);
        let (min, max) = rig.range();
        assert_close(min, rig.base_distance() * 1.2, 1e-12);
        assert_close(max, rig.base_distance() * 6.0, 1e-12);

        rig.zoom_by(100.0);
        assert_close(rig.commit(), max, 1e-12);
        rig.zoom_by(1e-4);
        assert_close(rig.commit(), min, 1e-12);
    }

    #[test]
    fn first_resize_starts_at_base_then_clamps() {
        let mut rig = rig();
        rig.resize(800.0, 600.0);
        // base sits below the minimum zoom distance, so it is clamped up
        assert_close(rig.distance(), rig.range().0, 1e-12);
    }

    #[test]
    fn resize_preserves_distance_proportionally() {
        let mut rig = rig();
        rig.resize(800.0, 800.0);
        rig.zoom_by(2.0);
        let before = rig.commit() / rig.base_distance();
        rig.resize(400.0, 800.0);
        let after = rig.distance() / rig.base_distance();
        assert_close(before, after, 1e-12);
    }

    #[test]
    fn centre_ray_points_at_origin() {
        let mut rig = rig();
        rig.resize(640.0, 480.0);
        let ray = rig.ray_through(320.0, 240.0).unwrap();
        assert_close(ray.dir.z, -1.0, 1e-12);
        assert_close(ray.origin.z, rig.distance(), 1e-12);

        // a corner ray leans right and up for the top-right corner
        let corner = rig.ray_through(640.0, 0.0).unwrap();
        assert!(corner.dir.x > 0.0 && corner.dir.y > 0.0);
    }

    #[test]
    fn ray_matches_projection() {
        let mut rig = rig();
        rig.resize(1000.0, 500.0);
        let p = Vec3::new(0.3, -0.2, 0.5);
        let [nx, ny] = ndc(&rig, p);
        let x = (nx + 1.0) * 0.5 * 1000.0;
        let y = (1.0 - ny) * 0.5 * 500.0;
        let ray = rig.ray_through(x, y).unwrap();
        let to_p = (p - ray.origin).try_normalize().unwrap();
        assert!(to_p.angle_to(ray.dir) < 1e-5);
    }
}
