use foundation::math::Vec2;
use foundation::time::Time;

use crate::config::NavigationConfig;

pub type PointerId = i32;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    /// One contact down.
    Dragging,
    /// Two or more contacts down; the first two drive the pinch.
    Pinching,
}

/// What the engine should do in response to one input event.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GestureEffect {
    None,
    /// Yaw about the globe's local vertical axis, pitch about the camera's right axis.
    Rotate { yaw_rad: f64, pitch_rad: f64 },
    /// Multiply the camera distance by `factor`.
    Zoom { factor: f64 },
    Tap { x: f64, y: f64 },
}

/// Pointer state machine for drag, pinch and tap.
///
/// Contacts are kept in press order. Taps require the primary contact to be
/// the last one released, with no recorded movement and within the time
/// tolerance. Any second contact marks the gesture as moved.
#[derive(Debug, Clone)]
pub struct GestureController {
    nav: NavigationConfig,
    contacts: Vec<(PointerId, Vec2)>,
    primary: Option<PointerId>,
    tap_origin: Vec2,
    tap_started: Time,
    last_drag: Vec2,
    pinch_baseline: f64,
    pinch_current: f64,
    moved: bool,
}

impl GestureController {
    pub fn new(nav: NavigationConfig) -> Self {
        Self {
            nav,
            contacts: Vec::new(),
            primary: None,
            tap_origin: Vec2::default(),
            tap_started: Time::default(),
            last_drag: Vec2::default(),
            pinch_baseline: 0.0,
            pinch_current: 0.0,
            moved: false,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        match self.contacts.len() {
            0 => GesturePhase::Idle,
            1 => GesturePhase::Dragging,
            _ => GesturePhase::Pinching,
        }
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_pointer_down(&self) -> bool {
        !self.contacts.is_empty()
    }

    pub fn tracks(&self, id: PointerId) -> bool {
        self.contacts.iter().any(|(c, _)| *c == id)
    }

    pub fn has_moved(&self) -> bool {
        self.moved
    }

    /// Distance between the two pinch contacts when the pinch began.
    pub fn pinch_baseline(&self) -> f64 {
        self.pinch_baseline
    }

    pub fn pointer_down(&mut self, id: PointerId, x: f64, y: f64, now: Time) -> GestureEffect {
        let pos = Vec2::new(x, y);
        if let Some(c) = self.contacts.iter_mut().find(|(c, _)| *c == id) {
            c.1 = pos;
            return GestureEffect::None;
        }
        self.contacts.push((id, pos));

        match self.contacts.len() {
            1 => {
                self.primary = Some(id);
                self.tap_origin = pos;
                self.tap_started = now;
                self.last_drag = pos;
                self.moved = false;
            }
            2 => {
                self.moved = true;
                self.rebaseline_pinch();
            }
            _ => {
                self.moved = true;
            }
        }
        GestureEffect::None
    }

    pub fn pointer_move(&mut self, id: PointerId, x: f64, y: f64) -> GestureEffect {
        let pos = Vec2::new(x, y);
        let Some(slot) = self.contacts.iter().position(|(c, _)| *c == id) else {
            return GestureEffect::None;
        };
        self.contacts[slot].1 = pos;

        match self.phase() {
            GesturePhase::Idle => GestureEffect::None,
            GesturePhase::Dragging => {
                let delta = pos - self.last_drag;
                self.last_drag = pos;
                if !self.moved && pos.distance(self.tap_origin) > self.nav.tap_px_tolerance {
                    self.moved = true;
                }
                if delta.x == 0.0 && delta.y == 0.0 {
                    return GestureEffect::None;
                }
                GestureEffect::Rotate {
                    yaw_rad: delta.x * self.nav.drag_yaw_per_px,
                    pitch_rad: delta.y * self.nav.drag_pitch_per_px,
                }
            }
            GesturePhase::Pinching => {
                // extra contacts are bookkeeping only
                if slot > 1 {
                    return GestureEffect::None;
                }
                let dist = self.pinch_distance();
                let delta = dist - self.pinch_current;
                self.pinch_current = dist;
                if self.pinch_baseline <= 0.0 || delta == 0.0 {
                    return GestureEffect::None;
                }
                GestureEffect::Zoom {
                    factor: (-delta * self.nav.pinch_zoom_strength / 100.0).exp(),
                }
            }
        }
    }

    pub fn pointer_up(&mut self, id: PointerId, x: f64, y: f64, now: Time) -> GestureEffect {
        if !self.remove(id) {
            return GestureEffect::None;
        }
        if !self.contacts.is_empty() {
            return GestureEffect::None;
        }

        let is_tap = self.primary == Some(id)
            && !self.moved
            && now.since(self.tap_started) <= self.nav.tap_ms_tolerance;
        self.primary = None;
        self.moved = false;

        if is_tap {
            GestureEffect::Tap { x, y }
        } else {
            GestureEffect::None
        }
    }

    /// Drops the contact; the current gesture can no longer produce a tap.
    pub fn pointer_cancel(&mut self, id: PointerId) -> GestureEffect {
        self.remove(id);
        self.moved = false;
        self.primary = None;
        GestureEffect::None
    }

    pub fn wheel(&self, delta_y: f64) -> GestureEffect {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return GestureEffect::None;
        }
        GestureEffect::Zoom {
            factor: (delta_y * self.nav.wheel_zoom_strength).exp(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.nav);
    }

    fn remove(&mut self, id: PointerId) -> bool {
        let Some(slot) = self.contacts.iter().position(|(c, _)| *c == id) else {
            return false;
        };
        self.contacts.remove(slot);
        match self.contacts.len() {
            // resume dragging from where the remaining finger is
            1 => self.last_drag = self.contacts[0].1,
            n if n >= 2 && slot <= 1 => self.rebaseline_pinch(),
            _ => {}
        }
        if self.contacts.len() < 2 && slot <= 1 {
            self.pinch_baseline = 0.0;
            self.pinch_current = 0.0;
        }
        true
    }

    fn rebaseline_pinch(&mut self) {
        let d = self.pinch_distance();
        self.pinch_baseline = d;
        self.pinch_current = d;
    }

    fn pinch_distance(&self) -> f64 {
        match (self.contacts.first(), self.contacts.get(1)) {
            (Some((_, a)), Some((_, b))) => a.distance(*b),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctl() -> GestureController {
        GestureController::new(NavigationConfig::default())
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn quick_still_press_is_a_tap() {
        let mut g = ctl();
        g.pointer_down(1, 100.0, 100.0, Time(0.0));
        assert_eq!(g.phase(), GesturePhase::Dragging);
        g.pointer_move(1, 103.0, 102.0);
        let fx = g.pointer_up(1, 103.0, 102.0, Time(200.0));
        assert_eq!(fx, GestureEffect::Tap { x: 103.0, y: 102.0 });
        assert_eq!(g.phase(), GesturePhase::Idle);
    }

    #[test]
    fn exceeding_distance_suppresses_tap_even_if_returning() {
        let mut g = ctl();
        g.pointer_down(1, 100.0, 100.0, Time(0.0));
        g.pointer_move(1, 110.0, 100.0);
        g.pointer_move(1, 100.0, 100.0);
        assert!(g.has_moved());
        assert_eq!(g.pointer_up(1, 100.0, 100.0, Time(100.0)), GestureEffect::None);
    }

    #[test]
    fn exceeding_time_suppresses_tap() {
        let mut g = ctl();
        g.pointer_down(1, 0.0, 0.0, Time(0.0));
        assert_eq!(g.pointer_up(1, 0.0, 0.0, Time(301.0)), GestureEffect::None);
        g.pointer_down(1, 0.0, 0.0, Time(1000.0));
        assert!(matches!(
            g.pointer_up(1, 0.0, 0.0, Time(1300.0)),
            GestureEffect::Tap { .. }
        ));
    }

    #[test]
    fn drag_maps_pixels_to_rotation() {
        let mut g = ctl();
        g.pointer_down(1, 0.0, 0.0, Time(0.0));
        match g.pointer_move(1, 10.0, -5.0) {
            GestureEffect::Rotate { yaw_rad, pitch_rad } => {
                assert_close(yaw_rad, 0.04);
                assert_close(pitch_rad, -0.02);
            }
            other => panic!("unexpected {other:?}"),
        }
        // deltas are per move, not cumulative
        match g.pointer_move(1, 12.0, -5.0) {
            GestureEffect::Rotate { yaw_rad, pitch_rad } => {
                assert_close(yaw_rad, 0.008);
                assert_close(pitch_rad, 0.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn pinch_zooms_exponentially_and_never_taps() {
        let mut g = ctl();
        g.pointer_down(1, 0.0, 0.0, Time(0.0));
        g.pointer_down(2, 100.0, 0.0, Time(10.0));
        assert_eq!(g.phase(), GesturePhase::Pinching);
        assert_close(g.pinch_baseline(), 100.0);

        match g.pointer_move(2, 150.0, 0.0) {
            GestureEffect::Zoom { factor } => {
                assert_close(factor, (-50.0f64 * 0.008 / 100.0).exp());
                assert!(factor < 1.0);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(g.pointer_up(2, 150.0, 0.0, Time(50.0)), GestureEffect::None);
        assert_eq!(g.phase(), GesturePhase::Dragging);
        assert_eq!(g.pointer_up(1, 0.0, 0.0, Time(60.0)), GestureEffect::None);
    }

    #[test]
    fn drag_resumes_without_jump_after_pinch() {
        let mut g = ctl();
        g.pointer_down(1, 0.0, 0.0, Time(0.0));
        g.pointer_down(2, 100.0, 0.0, Time(0.0));
        g.pointer_move(1, 40.0, 40.0);
        g.pointer_up(2, 100.0, 0.0, Time(0.0));
        match g.pointer_move(1, 41.0, 40.0) {
            GestureEffect::Rotate { yaw_rad, pitch_rad } => {
                assert_close(yaw_rad, 0.004);
                assert_close(pitch_rad, 0.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn third_contact_is_bookkeeping_and_pinch_rebaselines() {
        let mut g = ctl();
        g.pointer_down(1, 0.0, 0.0, Time(0.0));
        g.pointer_down(2, 100.0, 0.0, Time(0.0));
        g.pointer_down(3, 500.0, 500.0, Time(0.0));
        assert_eq!(g.contact_count(), 3);
        assert_eq!(g.pointer_move(3, 600.0, 600.0), GestureEffect::None);

        g.pointer_up(1, 0.0, 0.0, Time(0.0));
        // remaining pinch pair is (2, 3)
        let expected = Vec2::new(100.0, 0.0).distance(Vec2::new(600.0, 600.0));
        assert_close(g.pinch_baseline(), expected);
    }

    #[test]
    fn cancel_clears_and_never_taps() {
        let mut g = ctl();
        g.pointer_down(1, 0.0, 0.0, Time(0.0));
        g.pointer_down(2, 10.0, 0.0, Time(0.0));
        g.pointer_cancel(2);
        assert!(!g.has_moved());
        assert_eq!(g.pointer_up(1, 0.0, 0.0, Time(10.0)), GestureEffect::None);
        assert!(!g.is_pointer_down());
    }

    #[test]
    fn unknown_pointers_are_ignored() {
        let mut g = ctl();
        assert_eq!(g.pointer_move(9, 1.0, 1.0), GestureEffect::None);
        assert_eq!(g.pointer_up(9, 1.0, 1.0, Time(0.0)), GestureEffect::None);
    }

    #[test]
    fn wheel_factor_follows_delta_sign() {
        let g = ctl();
        match g.wheel(100.0) {
            GestureEffect::Zoom { factor } => assert_close(factor, (0.18f64).exp()),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(g.wheel(0.0), GestureEffect::None);
    }
}
