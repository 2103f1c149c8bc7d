//! Transform composition for the tracking pipeline.
//!
//! # Conventions
//!
//! All tracking math in this crate is right-handed, f64, and column-vector
//! (`p' = M * p`), the nalgebra default. Three transforms meet every cycle:
//!
//! 1. **extrinsics** — the camera's fixed mounting transform as reported by
//!    the device. Its cached inverse carries camera-local points toward the
//!    rig frame.
//! 2. **rig-to-world** — the live pose from the locator at the frame's
//!    capture timestamp.
//! 3. **camera-to-world** — the per-cycle composition of the two, used to
//!    place every detection of that cycle in world space.
//!
//! The consumer-facing renderer uses row-vector, left-handed math, so the
//! camera-to-world embedded in published markers is converted by
//! [`to_render_convention`]: transpose, then flip the forward axis. That
//! pairing of conventions is fixed; retargeting a different renderer means
//! re-deriving the conversion against a physical calibration rig, not
//! reusing the sign pattern here.

use nalgebra::{Matrix4, Rotation3, Vector3};

/// Compose one camera's camera-to-world transform for the current cycle.
///
/// The source formulation is row-vector: `extrinsicsInverse * rigToWorld`.
/// In column-vector convention the same composition reads right-to-left.
/// With the rig at the world origin (identity pose) this reduces exactly to
/// the cached extrinsics inverse, which is the property a test rig should
/// verify: a point at the camera origin must land on the camera's recorded
/// mount offset.
pub fn camera_to_world(
    extrinsics_inv: &Matrix4<f64>,
    rig_to_world: &Matrix4<f64>,
) -> Matrix4<f64> {
    rig_to_world * extrinsics_inv
}

/// Convert a camera-to-world transform into the renderer's convention.
///
/// Transposing flips the column-vector layout into the renderer's
/// row-vector expectation; negating the entire third row of the transposed
/// matrix flips the forward axis from right-handed to left-handed.
pub fn to_render_convention(camera_to_world: &Matrix4<f64>) -> [[f32; 4]; 4] {
    let t = camera_to_world.transpose();
    let mut out = [[0.0f32; 4]; 4];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, v) in row.iter_mut().enumerate() {
            let sign = if r == 2 { -1.0 } else { 1.0 };
            *v = (sign * t[(r, c)]) as f32;
        }
    }
    out
}

/// Rotation matrix from a Rodrigues rotation vector.
pub fn rotation_from_rodrigues(rvec: &Vector3<f64>) -> Rotation3<f64> {
    Rotation3::new(*rvec)
}

/// Place one camera-local detection in world space.
///
/// Builds the marker-to-camera transform from the solver's rvec/tvec,
/// composes it with the camera-to-world transform, and returns the world
/// position and world rotation (scaled axis-angle).
pub fn marker_world_pose(
    camera_to_world: &Matrix4<f64>,
    rvec: &Vector3<f64>,
    tvec: &Vector3<f64>,
) -> (Vector3<f64>, Vector3<f64>) {
    let mut marker_to_camera = rotation_from_rodrigues(rvec).to_homogeneous();
    marker_to_camera.fixed_view_mut::<3, 1>(0, 3).copy_from(tvec);

    let marker_to_world = camera_to_world * marker_to_camera;

    let position = marker_to_world.fixed_view::<3, 1>(0, 3).into_owned();
    let rotation =
        Rotation3::from_matrix(&marker_to_world.fixed_view::<3, 3>(0, 0).into_owned());
    (position, rotation.scaled_axis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn identity_rig_reduces_to_extrinsics_inverse() {
        let extrinsics = Matrix4::new_translation(&Vector3::new(0.032, 0.0, -0.004));
        let inv = extrinsics.try_inverse().unwrap();

        let c2w = camera_to_world(&inv, &Matrix4::identity());
        assert_relative_eq!(c2w, inv, epsilon = 1e-14);
    }

    #[test]
    fn composition_order_applies_extrinsics_before_rig_pose() {
        let extrinsics_inv = Matrix4::new_translation(&Vector3::new(0.0, 0.1, 0.0));
        let rig_to_world = Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0));

        let c2w = camera_to_world(&extrinsics_inv, &rig_to_world);
        let p = c2w * nalgebra::Vector4::new(0.0, 0.0, 0.0, 1.0);

        // camera origin -> mount offset in rig space -> rig offset in world
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 0.1, epsilon = 1e-12);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn render_convention_transposes_and_flips_forward_row() {
        #[rustfmt::skip]
        let m = Matrix4::new(
            1.0,  2.0,  3.0,  4.0,
            5.0,  6.0,  7.0,  8.0,
            9.0, 10.0, 11.0, 12.0,
            0.0,  0.0,  0.0,  1.0,
        );

        let out = to_render_convention(&m);

        // row r of the output is column r of the input, row 2 negated
        assert_eq!(out[0], [1.0, 5.0, 9.0, 0.0]);
        assert_eq!(out[1], [2.0, 6.0, 10.0, 0.0]);
        assert_eq!(out[2], [-3.0, -7.0, -11.0, -0.0]);
        assert_eq!(out[3], [4.0, 8.0, 12.0, 1.0]);
    }

    #[test]
    fn render_convention_of_identity_flips_z() {
        let out = to_render_convention(&Matrix4::identity());
        assert_eq!(out[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(out[1], [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(out[2], [-0.0, -0.0, -1.0, -0.0]);
        assert_eq!(out[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn rodrigues_round_trip() {
        let rvec = Vector3::new(0.1, -0.2, 0.3);
        let rot = rotation_from_rodrigues(&rvec);
        assert_relative_eq!(rot.scaled_axis(), rvec, epsilon = 1e-12);
    }

    #[test]
    fn marker_at_camera_origin_maps_through_identity() {
        let tvec = Vector3::new(0.0, 0.0, 0.5);
        let (pos, rot) = marker_world_pose(&Matrix4::identity(), &Vector3::zeros(), &tvec);

        assert_relative_eq!(pos, tvec, epsilon = 1e-12);
        assert_relative_eq!(rot, Vector3::zeros(), epsilon = 1e-9);
    }

    #[test]
    fn marker_pose_composes_camera_rotation() {
        // camera rotated a quarter turn about world Y, marker half a meter
        // down the optical axis
        let c2w = Rotation3::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2).to_homogeneous();
        let (pos, _) =
            marker_world_pose(&c2w, &Vector3::zeros(), &Vector3::new(0.0, 0.0, 0.5));

        assert_relative_eq!(pos.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(pos.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(pos.z, 0.0, epsilon = 1e-12);
    }
}
