//! Tracker configuration.
//!
//! Set once before the loop starts; the running loop reads it without
//! synchronization. Changing configuration concurrently with a running
//! loop is not supported.

use crate::estimator::MarkerDictionary;
use crate::rig::{CameraIntrinsics, CameraSide, PerCamera};

/// Configuration of one tracking pipeline instance.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Which camera's frames feed the marker estimator.
    pub active_camera: CameraSide,
    /// Copy raw frames into the shared publication every cycle.
    pub publish_frames: bool,
    /// Run marker detection every cycle.
    pub detect_markers: bool,
    /// Side length of the printed marker, meters.
    pub marker_length_m: f64,
    /// Dictionary the markers were generated from.
    pub dictionary: MarkerDictionary,
    /// Per-camera intrinsics handed to the estimator.
    pub intrinsics: PerCamera<CameraIntrinsics>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            active_camera: CameraSide::Left,
            publish_frames: true,
            detect_markers: true,
            marker_length_m: 0.05,
            dictionary: MarkerDictionary::Dict6x6_250,
            intrinsics: PerCamera::default(),
        }
    }
}
