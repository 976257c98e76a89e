use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::math::{Quat, Vec3};
use crate::motion::AgentPose;

/// Axis-aligned spawn volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnBounds {
    pub center: Vec3,
    /// Half-size along each axis.
    pub extents: Vec3,
}

impl SpawnBounds {
    pub fn contains(&self, p: Vec3) -> bool {
        let d = (p - self.center).abs();
        d.x <= self.extents.x && d.y <= self.extents.y && d.z <= self.extents.z
    }
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, extent: f32) -> f32 {
    if extent > 0.0 {
        rng.gen_range(-extent..=extent)
    } else {
        0.0
    }
}

/// Scatter `count` resting poses inside `bounds`, each with a random yaw and
/// no pitch or roll.
pub fn populate<R: Rng + ?Sized>(bounds: &SpawnBounds, count: usize, rng: &mut R) -> Vec<AgentPose> {
    (0..count)
        .map(|_| {
            let offset = Vec3::new(
                jitter(rng, bounds.extents.x),
                jitter(rng, bounds.extents.y),
                jitter(rng, bounds.extents.z),
            );
            let yaw = rng.gen_range(0.0..std::f32::consts::TAU);
            AgentPose {
                position: bounds.center + offset,
                orientation: Quat::from_rotation_y(yaw),
                velocity: Vec3::ZERO,
            }
        })
        .collect()
}
