//! Sensor device boundary: frame delivery, timestamps, and access consent.
//!
//! The actual device driver lives outside this crate. [`FrameSource`]
//! abstracts it so the acquisition loop can run against live hardware, a
//! replayed recording, or a scripted in-memory source in tests.

use crossbeam_channel::{bounded, Receiver, Sender};
use nalgebra::Matrix4;

use crate::error::{Error, Result};
use crate::rig::CameraSide;

/// Device ticks are 100 ns host ticks.
pub const TICK_NS: i64 = 100;

/// Capture instant of one frame in both time representations: the raw
/// device tick count and the signed nanosecond domain the pose locator
/// understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTimestamp {
    pub device_ticks: u64,
    pub host_ns: i64,
}

impl FrameTimestamp {
    /// Convert a raw tick count into the locator time domain.
    ///
    /// Tick counts that do not fit the signed domain are a fatal error,
    /// not a skipped cycle: they indicate a device reporting garbage.
    pub fn from_device_ticks(ticks: u64) -> Result<Self> {
        let signed = i64::try_from(ticks).map_err(|_| Error::TimestampRange(ticks))?;
        let host_ns = signed
            .checked_mul(TICK_NS)
            .ok_or(Error::TimestampRange(ticks))?;
        Ok(Self {
            device_ticks: ticks,
            host_ns,
        })
    }
}

/// One grayscale frame as delivered by the device.
///
/// Owned by the acquisition loop for the duration of a single cycle and
/// dropped at its end; the published copy lives in `SharedPublication`.
#[derive(Debug, Clone)]
pub struct SensorFrame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub device_ticks: u64,
}

/// Two synchronized camera streams plus the rig geometry query.
///
/// `next_frame` blocks until a frame is available; that blocking is the
/// loop's only backpressure, so the loop advances at the rate of the
/// slower stream. An `Err` from `next_frame` skips the current cycle.
pub trait FrameSource: Send {
    /// Fixed camera-node-to-rig transform for one camera. Read once
    /// during initialization, before any frame is fetched.
    fn camera_extrinsics(&self, side: CameraSide) -> Result<Matrix4<f64>>;

    /// Begin frame delivery on both streams.
    fn open_streams(&mut self) -> Result<()>;

    /// Block until the next frame of `side` is available.
    fn next_frame(&mut self, side: CameraSide) -> Result<SensorFrame>;

    /// Stop delivery and release device resources. Idempotent.
    fn close_streams(&mut self);
}

/// Resolution of the device layer's camera-access consent request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentOutcome {
    Allowed,
    DeniedByUser,
    DeniedBySystem,
    NotDeclaredByApp,
    PromptRequired,
}

impl ConsentOutcome {
    pub fn is_allowed(self) -> bool {
        matches!(self, ConsentOutcome::Allowed)
    }
}

/// Blocks the caller until the device layer's asynchronous consent request
/// completes. Injected per pipeline instance so independent pipelines (and
/// tests) never share global consent state.
pub trait ConsentProvider: Send {
    fn wait_for_consent(&self) -> ConsentOutcome;
}

/// Consent provider fed by a channel, for hosts whose device layer reports
/// consent through a completion callback.
///
/// The host hands the [`Sender`] to its callback and the pipeline blocks
/// on the receiving side during initialization. A dropped sender counts as
/// a system denial, so an abandoned request still fails fast.
pub struct ChannelConsent {
    rx: Receiver<ConsentOutcome>,
}

impl ChannelConsent {
    pub fn new() -> (Sender<ConsentOutcome>, Self) {
        let (tx, rx) = bounded(1);
        (tx, Self { rx })
    }
}

impl ConsentProvider for ChannelConsent {
    fn wait_for_consent(&self) -> ConsentOutcome {
        self.rx.recv().unwrap_or(ConsentOutcome::DeniedBySystem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_conversion() {
        let ts = FrameTimestamp::from_device_ticks(333_333).unwrap();
        assert_eq!(ts.device_ticks, 333_333);
        assert_eq!(ts.host_ns, 33_333_300);
    }

    #[test]
    fn timestamp_out_of_range() {
        assert!(matches!(
            FrameTimestamp::from_device_ticks(u64::MAX),
            Err(Error::TimestampRange(_))
        ));
        // fits i64 but overflows after scaling to nanoseconds
        assert!(matches!(
            FrameTimestamp::from_device_ticks(i64::MAX as u64),
            Err(Error::TimestampRange(_))
        ));
    }

    #[test]
    fn channel_consent_delivers_outcome() {
        let (tx, consent) = ChannelConsent::new();
        tx.send(ConsentOutcome::Allowed).unwrap();
        assert_eq!(consent.wait_for_consent(), ConsentOutcome::Allowed);
    }

    #[test]
    fn dropped_sender_is_a_denial() {
        let (tx, consent) = ChannelConsent::new();
        drop(tx);
        assert_eq!(consent.wait_for_consent(), ConsentOutcome::DeniedBySystem);
    }
}
