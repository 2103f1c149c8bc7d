//! Marker detection boundary.
//!
//! Corner detection and perspective pose solving are black-box numerical
//! routines outside this crate. [`MarkerEstimator`] is their seam: given a
//! grayscale frame and the camera's intrinsics, it returns zero or more
//! per-marker poses in that camera's coordinate frame.

use nalgebra::Vector3;

use crate::rig::CameraIntrinsics;
use crate::sensor::SensorFrame;

/// Predefined fiducial dictionaries, with the detector library's stable
/// integer identifiers as discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum MarkerDictionary {
    Dict4x4_50 = 0,
    Dict4x4_100,
    Dict4x4_250,
    Dict4x4_1000,
    Dict5x5_50,
    Dict5x5_100,
    Dict5x5_250,
    Dict5x5_1000,
    Dict6x6_50,
    Dict6x6_100,
    Dict6x6_250,
    Dict6x6_1000,
    Dict7x7_50,
    Dict7x7_100,
    Dict7x7_250,
    Dict7x7_1000,
    ArucoOriginal,
    AprilTag16h5,
    AprilTag25h9,
    AprilTag36h10,
    AprilTag36h11,
}

impl MarkerDictionary {
    /// Identifier passed through to the detector library.
    pub fn id(self) -> i32 {
        self as i32
    }
}

/// One marker pose in the issuing camera's coordinate frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalDetection {
    pub id: i32,
    /// Rodrigues rotation vector.
    pub rvec: Vector3<f64>,
    /// Translation from the camera origin, meters.
    pub tvec: Vector3<f64>,
}

/// Detect markers in one frame and solve each marker's pose.
///
/// Must be deterministic for identical pixel input and configuration, and
/// must return an empty list (not an error) when no markers are visible.
/// The acquisition loop measures the wall-clock duration of each call and
/// publishes it as the last processing time.
pub trait MarkerEstimator: Send {
    fn detect_and_estimate(
        &mut self,
        frame: &SensorFrame,
        intrinsics: &CameraIntrinsics,
        marker_length_m: f64,
        dictionary: MarkerDictionary,
    ) -> Vec<LocalDetection>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dictionary_ids_are_stable() {
        assert_eq!(MarkerDictionary::Dict4x4_50.id(), 0);
        assert_eq!(MarkerDictionary::Dict6x6_250.id(), 10);
        assert_eq!(MarkerDictionary::ArucoOriginal.id(), 16);
        assert_eq!(MarkerDictionary::AprilTag36h11.id(), 20);
    }
}
