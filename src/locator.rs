//! Rig localization boundary.
//!
//! An external tracking service maps a capture timestamp to the rig's pose
//! in the stationary world frame. The lookup may be expensive or
//! rate-limited, which is why the acquisition loop reuses a single result
//! when both cameras report the same capture instant.

use nalgebra::{Matrix4, UnitQuaternion, Vector3};

/// Rig-to-world pose at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigPose {
    pub rotation: UnitQuaternion<f64>,
    pub translation: Vector3<f64>,
}

impl RigPose {
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn from_parts(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Homogeneous rig-to-world matrix, column-vector convention.
    pub fn to_matrix(&self) -> Matrix4<f64> {
        let mut m = self.rotation.to_homogeneous();
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        m
    }
}

/// Maps a timestamp (locator time domain, nanoseconds) to the rig pose.
///
/// `None` means the tracking system could not locate the rig at that
/// instant; the loop treats this as transient loss and skips marker
/// publication for the cycle.
pub trait PoseLocator: Send {
    fn locate(&mut self, host_ns: i64) -> Option<RigPose>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn identity_pose_is_identity_matrix() {
        assert_relative_eq!(
            RigPose::identity().to_matrix(),
            Matrix4::identity(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn pose_matrix_applies_rotation_then_translation() {
        let pose = RigPose::from_parts(
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
            Vector3::new(1.0, 2.0, 3.0),
        );
        let m = pose.to_matrix();

        // unit X in rig frame rotates onto +Y, then gets the rig offset
        let p = m * nalgebra::Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 3.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, 3.0, epsilon = 1e-12);
    }
}
