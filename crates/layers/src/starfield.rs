use foundation::math::Vec3;

use crate::layer::{Layer, LayerId};

pub const STARFIELD_LAYER: LayerId = LayerId(4);

/// Background stars on a thin shell around the origin. Stars live in world
/// space and do not follow the globe's rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Starfield {
    pub points: Vec<Vec3>,
    pub size: f32,
    pub opacity: f32,
}

impl Starfield {
    /// Deterministic for a given `seed`. Radii vary by ±5% around `radius`.
    pub fn generate(count: u32, radius: f64, seed: u64, size: f32, opacity: f32) -> Self {
        let mut state = seed;
        let mut next = move || {
            state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
            unit_f64(mix64(state))
        };

        let points = (0..count)
            .map(|_| {
                // uniform direction: z uniform in [-1, 1], azimuth uniform
                let z = next() * 2.0 - 1.0;
                let azimuth = next() * std::f64::consts::TAU;
                let r_xy = (1.0 - z * z).max(0.0).sqrt();
                let r = radius * (0.95 + next() * 0.1);
                Vec3::new(r_xy * azimuth.cos(), r_xy * azimuth.sin(), z) * r
            })
            .collect();

        Self {
            points,
            size,
            opacity,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Layer for Starfield {
    fn id(&self) -> LayerId {
        STARFIELD_LAYER
    }
}

fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// Top 53 bits as a float in `[0, 1)`.
fn unit_f64(x: u64) -> f64 {
    (x >> 11) as f64 / (1u64 << 53) as f64
}
