use serde::{Deserialize, Serialize};

use crate::math::{clamp01, forward, look_rotation, rotate_towards, Quat, Vec3};

/// Water surface height; at or above it a fish is out of the water.
pub const SURFACE_LEVEL: f32 = 0.0;

/// Position, orientation and velocity of one agent's body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentPose {
    pub position: Vec3,
    /// Body→world rotation. Body axes: +Z forward, +Y up, +X right.
    pub orientation: Quat,
    pub velocity: Vec3,
}

impl Default for AgentPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
        }
    }
}

impl AgentPose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn forward(&self) -> Vec3 {
        forward(self.orientation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionMode {
    /// Under water: steering drives the body.
    Submerged,
    /// Out of the water: forced straight down.
    Surfaced,
}

impl MotionMode {
    pub fn at(position: Vec3) -> Self {
        if position.y >= SURFACE_LEVEL {
            MotionMode::Surfaced
        } else {
            MotionMode::Submerged
        }
    }
}

/// What the integrator decided this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionOutput {
    pub mode: MotionMode,
    /// Heading actually used after the surface override.
    pub heading: Vec3,
    pub orientation: Quat,
    pub velocity: Vec3,
    /// Whether the body should feel gravity this tick.
    pub use_gravity: bool,
    /// False when there was no steering input and the pose was left alone.
    pub steered: bool,
}

/// Turn `pose` toward `desired_heading` and derive its velocity.
///
/// Surfaced agents are snapped to face and swim straight down at full speed.
/// Submerged agents rotate by at most `max_turn_rate_deg * dt` degrees and
/// move along their new forward axis at `speed * clamp01(|desired_heading|)`.
/// A zero heading, or a non-positive `dt`, leaves orientation and velocity
/// untouched so drag can act on the body.
pub fn integrate_motion(
    pose: &mut AgentPose,
    desired_heading: Vec3,
    speed: f32,
    max_turn_rate_deg: f32,
    dt: f32,
) -> MotionOutput {
    let mode = MotionMode::at(pose.position);

    if mode == MotionMode::Surfaced {
        pose.orientation = look_rotation(Vec3::NEG_Y);
        pose.velocity = Vec3::NEG_Y * speed;
        return MotionOutput {
            mode,
            heading: Vec3::NEG_Y,
            orientation: pose.orientation,
            velocity: pose.velocity,
            use_gravity: true,
            steered: true,
        };
    }

    let hold = MotionOutput {
        mode,
        heading: desired_heading,
        orientation: pose.orientation,
        velocity: pose.velocity,
        use_gravity: false,
        steered: false,
    };
    // Headings too small to normalize carry no direction.
    if desired_heading.normalize_or_zero() == Vec3::ZERO || dt <= 0.0 {
        return hold;
    }

    let target = look_rotation(desired_heading);
    let max_step = max_turn_rate_deg.to_radians() * dt;
    pose.orientation = rotate_towards(pose.orientation, target, max_step);
    pose.velocity = forward(pose.orientation) * speed * clamp01(desired_heading.length());

    MotionOutput {
        orientation: pose.orientation,
        velocity: pose.velocity,
        steered: true,
        ..hold
    }
}
