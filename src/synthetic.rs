//! Scripted in-memory collaborators.
//!
//! These implement the pipeline's external trait boundaries without any
//! hardware: a frame source replaying a prepared script, a locator driven
//! by a closure, and an estimator returning fixed detections. They back
//! the integration tests and the demo binary.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use nalgebra::Matrix4;

use crate::error::{Error, Result};
use crate::estimator::{LocalDetection, MarkerDictionary, MarkerEstimator};
use crate::locator::{PoseLocator, RigPose};
use crate::rig::{CameraIntrinsics, CameraSide, PerCamera};
use crate::sensor::{ConsentOutcome, ConsentProvider, FrameSource, SensorFrame};

/// Build a uniformly filled grayscale frame.
pub fn gray_frame(width: u32, height: u32, fill: u8, ticks: u64) -> SensorFrame {
    SensorFrame {
        pixels: vec![fill; (width * height) as usize],
        width,
        height,
        device_ticks: ticks,
    }
}

/// One scripted cycle: a synchronized frame pair, or a fetch failure.
pub type ScriptedCycle = Option<(SensorFrame, SensorFrame)>;

/// Frame source replaying a prepared script of cycles.
///
/// Once the script is exhausted, `next_frame` yields a stream error after
/// a short sleep, so a loop running against it skips cycles (without
/// spinning hot) until it is stopped.
pub struct ScriptedSource {
    extrinsics: PerCamera<Matrix4<f64>>,
    script: VecDeque<ScriptedCycle>,
    staged_right: Option<SensorFrame>,
    open: bool,
}

impl ScriptedSource {
    pub fn new(
        extrinsics: PerCamera<Matrix4<f64>>,
        script: impl IntoIterator<Item = ScriptedCycle>,
    ) -> Self {
        Self {
            extrinsics,
            script: script.into_iter().collect(),
            staged_right: None,
            open: false,
        }
    }

    /// Source with identity-mounted cameras, for tests that exercise the
    /// pipeline rather than the geometry.
    pub fn with_identity_rig(script: impl IntoIterator<Item = ScriptedCycle>) -> Self {
        Self::new(
            PerCamera::new(Matrix4::identity(), Matrix4::identity()),
            script,
        )
    }
}

impl FrameSource for ScriptedSource {
    fn camera_extrinsics(&self, side: CameraSide) -> Result<Matrix4<f64>> {
        Ok(self.extrinsics[side])
    }

    fn open_streams(&mut self) -> Result<()> {
        self.open = true;
        Ok(())
    }

    fn next_frame(&mut self, side: CameraSide) -> Result<SensorFrame> {
        if !self.open {
            return Err(Error::Stream("streams not open".into()));
        }
        match side {
            CameraSide::Left => match self.script.pop_front() {
                Some(Some((left, right))) => {
                    self.staged_right = Some(right);
                    Ok(left)
                }
                Some(None) => Err(Error::Stream("scripted fetch failure".into())),
                None => {
                    // keep the exhausted source from busy-spinning the loop
                    thread::sleep(Duration::from_millis(1));
                    Err(Error::Stream("script exhausted".into()))
                }
            },
            CameraSide::Right => self
                .staged_right
                .take()
                .ok_or_else(|| Error::Stream("right frame not staged".into())),
        }
    }

    fn close_streams(&mut self) {
        self.open = false;
    }
}

/// Locator driven by a closure, with an observable lookup counter.
pub struct ScriptedLocator {
    locate_fn: Box<dyn FnMut(i64) -> Option<RigPose> + Send>,
    lookups: Arc<AtomicU64>,
}

impl ScriptedLocator {
    pub fn new(locate_fn: impl FnMut(i64) -> Option<RigPose> + Send + 'static) -> Self {
        Self {
            locate_fn: Box::new(locate_fn),
            lookups: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Always reports the rig at the world origin.
    pub fn identity() -> Self {
        Self::new(|_| Some(RigPose::identity()))
    }

    /// Counts every `locate` call; lets tests verify the equal-timestamp
    /// single-lookup optimization.
    pub fn lookup_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.lookups)
    }
}

impl PoseLocator for ScriptedLocator {
    fn locate(&mut self, host_ns: i64) -> Option<RigPose> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        (self.locate_fn)(host_ns)
    }
}

/// Estimator returning the same detections on every call.
pub struct ScriptedEstimator {
    detections: Vec<LocalDetection>,
    calls: Arc<AtomicU64>,
}

impl ScriptedEstimator {
    pub fn fixed(detections: Vec<LocalDetection>) -> Self {
        Self {
            detections,
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn empty() -> Self {
        Self::fixed(Vec::new())
    }

    pub fn call_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.calls)
    }
}

impl MarkerEstimator for ScriptedEstimator {
    fn detect_and_estimate(
        &mut self,
        _frame: &SensorFrame,
        _intrinsics: &CameraIntrinsics,
        _marker_length_m: f64,
        _dictionary: MarkerDictionary,
    ) -> Vec<LocalDetection> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.detections.clone()
    }
}

/// Consent provider resolving immediately with a fixed outcome.
pub struct ScriptedConsent(pub ConsentOutcome);

impl ScriptedConsent {
    pub fn granted() -> Self {
        Self(ConsentOutcome::Allowed)
    }
}

impl ConsentProvider for ScriptedConsent {
    fn wait_for_consent(&self) -> ConsentOutcome {
        self.0
    }
}
