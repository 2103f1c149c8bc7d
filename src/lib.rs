//! Dual-camera fiducial marker tracking with world-space pose output.
//!
//! A dedicated acquisition thread continuously pulls synchronized frames
//! from the two front cameras of a head-mounted rig, locates the rig in
//! world space at each frame's capture instant, converts per-camera marker
//! detections into world coordinates through the fixed mounting extrinsics,
//! and publishes markers and raw imagery through non-blocking shared state
//! that consumers poll at their own cadence.
//!
//! ```text
//! ┌─────────────┐   frames    ┌──────────────────┐   snapshot   ┌───────────────────┐
//! │ FrameSource │ ──────────► │ acquisition loop │ ───────────► │ SharedPublication │
//! └─────────────┘             │  (own thread)    │              │  (polled, lock-   │
//! ┌─────────────┐  rig pose   │                  │   buffers    │   bounded reads)  │
//! │ PoseLocator │ ──────────► │                  │ ───────────► │                   │
//! └─────────────┘             └──────────────────┘              └───────────────────┘
//!                                      ▲
//!                              MarkerEstimator
//! ```
//!
//! Detection, pose solving, the device driver, and rig localization are
//! external collaborators behind traits; scripted implementations for all
//! of them live in [`synthetic`].

pub mod error;
pub mod estimator;
pub mod geometry;
pub mod locator;
pub mod pipeline;
pub mod rig;
pub mod sensor;
pub mod synthetic;

// Re-exports for convenience
pub use error::{Error, Result};
pub use estimator::{LocalDetection, MarkerDictionary, MarkerEstimator};
pub use locator::{PoseLocator, RigPose};
pub use pipeline::{
    CapturedFrame, MarkerTracker, PipelineState, SharedPublication, TrackerConfig, WorldMarker,
};
pub use rig::{CameraExtrinsics, CameraIntrinsics, CameraRigModel, CameraSide, PerCamera};
pub use sensor::{
    ChannelConsent, ConsentOutcome, ConsentProvider, FrameSource, FrameTimestamp, SensorFrame,
};
