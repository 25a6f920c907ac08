use foundation::math::{Quat, Vec3};
use foundation::time::Time;

use crate::config::AutoRotateConfig;

/// Reason the autorotator stays still on a given frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IdleGuard {
    PointerDown,
    Animating,
    Selected,
    Hovered,
    CoolingDown,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum IdleDecision {
    Suppressed(IdleGuard),
    Rotate { angle_rad: f64 },
}

/// Per-frame snapshot of everything that can hold autorotation back.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct IdleInputs {
    pub pointer_down: bool,
    pub animating: bool,
    pub selected: bool,
    pub hovered: bool,
}

#[derive(Debug, Clone)]
pub struct IdleAutorotator {
    rad_per_sec: f64,
    idle_ms: f64,
    last_input: Time,
}

impl IdleAutorotator {
    pub fn new(cfg: &AutoRotateConfig, now: Time) -> Self {
        Self {
            rad_per_sec: cfg.deg_per_sec.to_radians(),
            idle_ms: cfg.idle_ms,
            last_input: now,
        }
    }

    pub fn last_input(&self) -> Time {
        self.last_input
    }

    pub fn mark_input(&mut self, now: Time) {
        self.last_input = now;
    }

    /// Guards are checked in a fixed order; the first that holds wins.
    pub fn evaluate(&self, inputs: IdleInputs, now: Time, dt_s: f64) -> IdleDecision {
        let guard = if inputs.pointer_down {
            Some(IdleGuard::PointerDown)
        } else if inputs.animating {
            Some(IdleGuard::Animating)
        } else if inputs.selected {
            Some(IdleGuard::Selected)
        } else if inputs.hovered {
            Some(IdleGuard::Hovered)
        } else if now.since(self.last_input) < self.idle_ms {
            Some(IdleGuard::CoolingDown)
        } else {
            None
        };

        match guard {
            Some(g) => IdleDecision::Suppressed(g),
            None => IdleDecision::Rotate {
                angle_rad: self.rad_per_sec * dt_s.max(0.0),
            },
        }
    }

    /// Applies the decision to `orientation` as a yaw about the globe's own
    /// vertical axis.
    pub fn apply(decision: IdleDecision, orientation: Quat) -> Quat {
        match decision {
            IdleDecision::Suppressed(_) => orientation,
            IdleDecision::Rotate { angle_rad } => {
                (orientation * Quat::from_axis_angle(Vec3::Y, angle_rad)).normalize()
            }
        }
    }
}
