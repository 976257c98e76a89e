pub use bevy_math::{IVec3, Mat3, Quat, Vec3};

// Basis: standard RHS with +Z forward, +Y up, +X right
pub const BODY_FWD: Vec3 = Vec3::Z;
pub const WORLD_UP: Vec3 = Vec3::Y;

/// World-space forward vector of a body orientation.
#[inline]
pub fn forward(orientation: Quat) -> Vec3 {
    orientation * BODY_FWD
}

/// Orientation whose forward axis points along `dir`, keeping +Y as up where possible.
///
/// A zero direction yields the identity. When `dir` is parallel to world up the
/// basis is undefined, so the shortest arc from +Z is used instead.
pub fn look_rotation(dir: Vec3) -> Quat {
    let fwd = dir.normalize_or_zero();
    if fwd == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let right = WORLD_UP.cross(fwd);
    if right.length_squared() < 1e-8 {
        return Quat::from_rotation_arc(BODY_FWD, fwd);
    }
    let right = right.normalize();
    let up = fwd.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, fwd)).normalize()
}

/// Rotate `from` toward `to` by at most `max_angle` radians.
pub fn rotate_towards(from: Quat, to: Quat, max_angle: f32) -> Quat {
    if max_angle <= 0.0 {
        return from;
    }
    let angle = from.angle_between(to);
    if angle <= max_angle {
        return to;
    }
    from.slerp(to, max_angle / angle).normalize()
}

#[inline]
pub fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_rotation_points_forward_along_direction() {
        for dir in [Vec3::X, -Vec3::X, Vec3::new(1.0, 0.5, -2.0), Vec3::Z, -Vec3::Z] {
            let q = look_rotation(dir);
            let fwd = forward(q);
            assert!(
                (fwd - dir.normalize()).length() < 1e-5,
                "dir={dir:?} fwd={fwd:?}"
            );
        }
    }

    #[test]
    fn look_rotation_handles_vertical_directions() {
        let down = forward(look_rotation(Vec3::NEG_Y));
        assert!((down - Vec3::NEG_Y).length() < 1e-5, "down={down:?}");
        let up = forward(look_rotation(Vec3::Y));
        assert!((up - Vec3::Y).length() < 1e-5, "up={up:?}");
    }

    #[test]
    fn rotate_towards_snaps_when_within_budget() {
        let target = Quat::from_rotation_y(0.1);
        let q = rotate_towards(Quat::IDENTITY, target, 0.5);
        assert!(q.angle_between(target) < 1e-6);
    }

    #[test]
    fn rotate_towards_never_overshoots_budget() {
        let target = Quat::from_rotation_y(2.0);
        let q = rotate_towards(Quat::IDENTITY, target, 0.25);
        assert!((q.angle_between(Quat::IDENTITY) - 0.25).abs() < 1e-4);
        assert!((q.angle_between(target) - 1.75).abs() < 1e-4);
    }
}
