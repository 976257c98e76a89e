use serde::{Deserialize, Serialize};

use crate::math::Vec3;
use crate::motion::AgentPose;

/// Kinematic stand-in for a rigid body: gravity on demand plus linear drag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodySpec {
    /// Fraction of velocity shed per second (rigid-body style linear drag).
    pub drag: f32,
    /// Gravitational acceleration in m/s², applied only when requested.
    pub gravity: f32,
}

impl Default for BodySpec {
    fn default() -> Self {
        Self {
            drag: 0.5,
            gravity: 9.81,
        }
    }
}

/// Advance position from velocity with semi-implicit Euler.
pub fn step_body(pose: &mut AgentPose, spec: &BodySpec, use_gravity: bool, dt: f32) {
    if dt <= 0.0 {
        return;
    }
    if use_gravity {
        pose.velocity += Vec3::new(0.0, -spec.gravity, 0.0) * dt;
    }
    pose.velocity *= (1.0 - spec.drag.max(0.0) * dt).max(0.0);
    pose.position += pose.velocity * dt;
}
