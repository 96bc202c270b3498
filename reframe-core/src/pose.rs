//! Pose and orientation math for frame extrapolation

use serde::{Deserialize, Serialize};

/// Orientation quaternion, `x*i + y*j + z*k + w`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    /// i component
    pub x: f32,
    /// j component
    pub y: f32,
    /// k component
    pub z: f32,
    /// scalar component
    pub w: f32,
}

impl Quaternion {
    /// The identity rotation
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Create a quaternion from components
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Four-component dot product
    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Unit-length copy; the identity if the input is degenerate
    pub fn normalized(&self) -> Self {
        let len_sq = self.dot(self);
        if len_sq <= f32::EPSILON {
            return Self::IDENTITY;
        }
        let inv = len_sq.sqrt().recip();
        Self {
            x: self.x * inv,
            y: self.y * inv,
            z: self.z * inv,
            w: self.w * inv,
        }
    }

    /// Spherical interpolation from `self` (t = 0) towards `other` (t = 1)
    ///
    /// `t` may lie outside `[0, 1]`: the rotation is extrapolated along the
    /// same great arc, which is how the reprojection engine projects a pose
    /// past the last real frame. Takes the shortest arc (sign flip) and
    /// falls back to a normalized linear blend when the endpoints are nearly
    /// parallel.
    pub fn slerp(&self, other: &Self, t: f32) -> Self {
        let mut cos_theta = self.dot(other);
        let mut end = *other;
        if cos_theta < 0.0 {
            cos_theta = -cos_theta;
            end = Self::new(-end.x, -end.y, -end.z, -end.w);
        }

        if cos_theta > 0.9995 {
            return Self {
                x: self.x + (end.x - self.x) * t,
                y: self.y + (end.y - self.y) * t,
                z: self.z + (end.z - self.z) * t,
                w: self.w + (end.w - self.w) * t,
            }
            .normalized();
        }

        let theta = cos_theta.clamp(-1.0, 1.0).acos();
        let sin_theta = theta.sin();
        let a = ((1.0 - t) * theta).sin() / sin_theta;
        let b = (t * theta).sin() / sin_theta;
        Self {
            x: a * self.x + b * end.x,
            y: a * self.y + b * end.y,
            z: a * self.z + b * end.z,
            w: a * self.w + b * end.w,
        }
        .normalized()
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Head pose: orientation plus position in meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Orientation quaternion
    pub orientation: Quaternion,
    /// Position `[x, y, z]`
    pub position: [f32; 3],
}

impl Pose {
    /// Extrapolate along the motion from `reference` (t = 0) to `target`
    /// (t = 1)
    ///
    /// Orientation follows the slerp arc, position is extrapolated linearly.
    /// The reprojection engine calls this with `t = 1 + magnitude` to push
    /// the pose past the target frame.
    pub fn extrapolate(reference: &Pose, target: &Pose, t: f32) -> Pose {
        let mut position = [0.0f32; 3];
        for (i, out) in position.iter_mut().enumerate() {
            *out = reference.position[i] + (target.position[i] - reference.position[i]) * t;
        }
        Pose {
            orientation: reference.orientation.slerp(&target.orientation, t),
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn quat_approx_eq(a: &Quaternion, b: &Quaternion) -> bool {
        // q and -q are the same rotation
        a.dot(b).abs() > 1.0 - EPS
    }

    fn rot_z(angle_rad: f32) -> Quaternion {
        Quaternion::new(0.0, 0.0, (angle_rad / 2.0).sin(), (angle_rad / 2.0).cos())
    }

    #[test]
    fn slerp_midpoint_of_quarter_turn() {
        let a = Quaternion::IDENTITY;
        let b = rot_z(std::f32::consts::FRAC_PI_2);
        let mid = a.slerp(&b, 0.5);
        assert!(quat_approx_eq(&mid, &rot_z(std::f32::consts::FRAC_PI_4)));
    }

    #[test]
    fn slerp_extrapolates_past_target() {
        let a = Quaternion::IDENTITY;
        let b = rot_z(std::f32::consts::FRAC_PI_4);
        // t = 2 doubles the arc: 45 degrees becomes 90.
        let extrapolated = a.slerp(&b, 2.0);
        assert!(quat_approx_eq(&extrapolated, &rot_z(std::f32::consts::FRAC_PI_2)));
    }

    #[test]
    fn slerp_takes_shortest_arc() {
        let a = rot_z(0.1);
        let b = rot_z(0.3);
        let negated_b = Quaternion::new(-b.x, -b.y, -b.z, -b.w);
        let mid = a.slerp(&negated_b, 0.5);
        assert!(quat_approx_eq(&mid, &rot_z(0.2)));
    }

    #[test]
    fn slerp_near_parallel_is_stable() {
        let a = rot_z(0.001);
        let b = rot_z(0.0011);
        let out = a.slerp(&b, 0.5);
        assert!((out.dot(&out) - 1.0).abs() < EPS);
    }

    #[test]
    fn degenerate_quaternion_normalizes_to_identity() {
        let zero = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(zero.normalized(), Quaternion::IDENTITY);
    }

    #[test]
    fn pose_extrapolation_continues_linear_motion() {
        let reference = Pose {
            orientation: Quaternion::IDENTITY,
            position: [0.0, 1.0, 0.0],
        };
        let target = Pose {
            orientation: Quaternion::IDENTITY,
            position: [1.0, 1.0, 0.0],
        };
        let out = Pose::extrapolate(&reference, &target, 1.5);
        assert!((out.position[0] - 1.5).abs() < EPS);
        assert!((out.position[1] - 1.0).abs() < EPS);
    }
}
