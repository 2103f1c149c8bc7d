//! Error types for the tracking pipeline.
//!
//! Only failures that prevent the pipeline from reaching or continuing the
//! running state surface as [`Error`]. Per-cycle conditions (a failed frame
//! fetch, transient tracking loss) are handled inside the acquisition loop
//! and never reach the consumer.

use crate::rig::CameraSide;
use crate::sensor::ConsentOutcome;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Camera access consent was resolved with anything but `Allowed`.
    #[error("camera access consent not granted: {0:?}")]
    ConsentDenied(ConsentOutcome),

    /// Sensor device failure (stream open, extrinsics query).
    #[error("sensor device error: {0}")]
    Device(String),

    /// Frame stream failure while fetching a frame.
    #[error("frame stream error: {0}")]
    Stream(String),

    /// The extrinsics matrix reported by the device is not invertible.
    #[error("extrinsics matrix for the {0:?} camera is not invertible")]
    SingularExtrinsics(CameraSide),

    /// A lifecycle call arrived before `initialize()` succeeded, or after
    /// the single-shot acquisition loop was already consumed.
    #[error("pipeline not initialized")]
    NotInitialized,

    /// A device tick count does not fit the locator's signed time domain.
    #[error("device tick count {0} does not fit the locator time domain")]
    TimestampRange(u64),
}
