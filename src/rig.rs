//! Static geometric description of the camera rig.
//!
//! The rig carries two front-facing grayscale cameras on a rigid mount.
//! Each camera's mounting transform (extrinsics) is read from the device
//! exactly once during initialization and never changes afterwards; the
//! inverse is computed at that point and cached, since it is needed on
//! every cycle to place the camera in world space.

use std::ops::{Index, IndexMut};

use nalgebra::Matrix4;

use crate::error::{Error, Result};

/// Which of the two front cameras a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraSide {
    Left,
    Right,
}

impl CameraSide {
    /// Both sides, in the order the loop visits them each cycle.
    pub const BOTH: [CameraSide; 2] = [CameraSide::Left, CameraSide::Right];
}

/// A pair of values, one per camera, indexable by [`CameraSide`].
///
/// Keeps the per-cycle loop a uniform operation over enumerated cameras
/// instead of duplicated left/right code paths.
#[derive(Debug, Clone, Default)]
pub struct PerCamera<T> {
    pub left: T,
    pub right: T,
}

impl<T> PerCamera<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    /// Build a pair by evaluating `f` once per side.
    pub fn from_fn(mut f: impl FnMut(CameraSide) -> T) -> Self {
        Self {
            left: f(CameraSide::Left),
            right: f(CameraSide::Right),
        }
    }

    /// Fallible variant of [`PerCamera::from_fn`].
    pub fn try_from_fn(mut f: impl FnMut(CameraSide) -> Result<T>) -> Result<Self> {
        Ok(Self {
            left: f(CameraSide::Left)?,
            right: f(CameraSide::Right)?,
        })
    }
}

impl<T> Index<CameraSide> for PerCamera<T> {
    type Output = T;

    fn index(&self, side: CameraSide) -> &T {
        match side {
            CameraSide::Left => &self.left,
            CameraSide::Right => &self.right,
        }
    }
}

impl<T> IndexMut<CameraSide> for PerCamera<T> {
    fn index_mut(&mut self, side: CameraSide) -> &mut T {
        match side {
            CameraSide::Left => &mut self.left,
            CameraSide::Right => &mut self.right,
        }
    }
}

/// Pinhole camera intrinsics with Brown-Conrady distortion terms.
///
/// Configured once before the loop starts; the estimator receives these
/// unchanged on every detection call.
#[derive(Debug, Clone, Copy)]
pub struct CameraIntrinsics {
    /// Focal length in pixels.
    pub fx: f64,
    pub fy: f64,
    /// Principal point in pixels.
    pub cx: f64,
    pub cy: f64,
    /// Radial distortion coefficients.
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
    /// Tangential distortion coefficients.
    pub p1: f64,
    pub p2: f64,
}

impl CameraIntrinsics {
    /// Distortion-free pinhole model.
    pub fn pinhole(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            k1: 0.0,
            k2: 0.0,
            k3: 0.0,
            p1: 0.0,
            p2: 0.0,
        }
    }

    /// Unit-focal, centered pinhole. Used by synthetic cameras in tests.
    pub fn identity() -> Self {
        Self::pinhole(1.0, 1.0, 0.0, 0.0)
    }
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self::identity()
    }
}

/// Fixed mounting transform of one camera, with its cached inverse.
#[derive(Debug, Clone)]
pub struct CameraExtrinsics {
    camera_to_rig: Matrix4<f64>,
    inverse: Matrix4<f64>,
}

impl CameraExtrinsics {
    /// Cache the transform and its inverse. The mount is rigid, so neither
    /// is ever recomputed after this point.
    pub fn new(camera_to_rig: Matrix4<f64>, side: CameraSide) -> Result<Self> {
        let inverse = camera_to_rig
            .try_inverse()
            .ok_or(Error::SingularExtrinsics(side))?;
        Ok(Self {
            camera_to_rig,
            inverse,
        })
    }

    /// The camera-node-to-rig transform as reported by the device.
    pub fn camera_to_rig(&self) -> &Matrix4<f64> {
        &self.camera_to_rig
    }

    /// Cached inverse of the reported transform, combined with the live
    /// rig pose every cycle.
    pub fn inverse(&self) -> &Matrix4<f64> {
        &self.inverse
    }
}

/// Both cameras' extrinsics, acquired once during initialization.
#[derive(Debug, Clone)]
pub struct CameraRigModel {
    extrinsics: PerCamera<CameraExtrinsics>,
}

impl CameraRigModel {
    pub fn new(extrinsics: PerCamera<CameraExtrinsics>) -> Self {
        Self { extrinsics }
    }

    pub fn extrinsics(&self, side: CameraSide) -> &CameraExtrinsics {
        &self.extrinsics[side]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix4, Vector3};

    #[test]
    fn extrinsics_inverse_is_cached_inverse() {
        let t = Matrix4::new_translation(&Vector3::new(0.04, -0.01, 0.02));
        let extr = CameraExtrinsics::new(t, CameraSide::Left).unwrap();

        assert_relative_eq!(
            extr.camera_to_rig() * extr.inverse(),
            Matrix4::identity(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn singular_extrinsics_is_an_error() {
        let singular = Matrix4::zeros();
        assert!(matches!(
            CameraExtrinsics::new(singular, CameraSide::Right),
            Err(Error::SingularExtrinsics(CameraSide::Right))
        ));
    }

    #[test]
    fn per_camera_indexing() {
        let mut pair = PerCamera::new(1, 2);
        assert_eq!(pair[CameraSide::Left], 1);
        assert_eq!(pair[CameraSide::Right], 2);

        pair[CameraSide::Right] = 5;
        assert_eq!(pair.right, 5);
    }
}
