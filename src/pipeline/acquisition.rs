//! Acquisition loop: lifecycle owner and the per-cycle producer.
//!
//! [`MarkerTracker`] is the top-level object a host interacts with. It owns
//! the external collaborators (frame source, pose locator, marker
//! estimator, consent provider) until the dedicated acquisition thread
//! takes them, and exposes the shared publication consumers poll.
//!
//! Lifecycle: `Idle -> Initializing -> Running -> Stopping -> Stopped`.
//! Initialization blocks on consent and acquires the rig geometry; start is
//! idempotent while running; stopping is cooperative, observed once per
//! full cycle, so an in-flight blocking frame fetch completes first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::estimator::MarkerEstimator;
use crate::geometry::{camera_to_world, marker_world_pose, to_render_convention};
use crate::locator::PoseLocator;
use crate::pipeline::config::TrackerConfig;
use crate::pipeline::publication::{SharedPublication, WorldMarker};
use crate::pipeline::state::PipelineState;
use crate::rig::{CameraExtrinsics, CameraRigModel, PerCamera};
use crate::sensor::{ConsentProvider, FrameSource, FrameTimestamp, SensorFrame};

/// Dual-camera marker tracking pipeline.
pub struct MarkerTracker {
    shared: Arc<SharedPublication>,
    state: Arc<Mutex<PipelineState>>,
    stop: Arc<AtomicBool>,
    config: TrackerConfig,
    consent: Box<dyn ConsentProvider>,
    // collaborators parked here until the worker thread takes them
    device: Option<Box<dyn FrameSource>>,
    locator: Option<Box<dyn PoseLocator>>,
    estimator: Option<Box<dyn MarkerEstimator>>,
    rig: Option<CameraRigModel>,
    handle: Option<JoinHandle<()>>,
}

impl MarkerTracker {
    pub fn new(
        device: Box<dyn FrameSource>,
        locator: Box<dyn PoseLocator>,
        estimator: Box<dyn MarkerEstimator>,
        consent: Box<dyn ConsentProvider>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            shared: SharedPublication::new(),
            state: Arc::new(Mutex::new(PipelineState::Idle)),
            stop: Arc::new(AtomicBool::new(false)),
            config,
            consent,
            device: Some(device),
            locator: Some(locator),
            estimator: Some(estimator),
            rig: None,
            handle: None,
        }
    }

    /// The publication consumers poll. Cheap to clone and hand across
    /// threads.
    pub fn publication(&self) -> Arc<SharedPublication> {
        Arc::clone(&self.shared)
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock()
    }

    /// Block on consent, then read and cache the rig geometry.
    ///
    /// Fails fast on any consent outcome but `Allowed`: streams are never
    /// opened and the pipeline lands in `Stopped`.
    pub fn initialize(&mut self) -> Result<()> {
        // the device is gone once the worker thread owns it (or after
        // teardown); reject before touching the lifecycle state so a
        // running loop keeps reporting Running
        if self.device.is_none() {
            return Err(Error::NotInitialized);
        }
        *self.state.lock() = PipelineState::Initializing;

        let outcome = self.consent.wait_for_consent();
        if !outcome.is_allowed() {
            error!(?outcome, "camera access consent not granted");
            *self.state.lock() = PipelineState::Stopped;
            return Err(Error::ConsentDenied(outcome));
        }
        info!("camera access granted");

        let device = self.device.as_ref().ok_or(Error::NotInitialized)?;
        let extrinsics = PerCamera::try_from_fn(|side| {
            CameraExtrinsics::new(device.camera_extrinsics(side)?, side)
        });
        let extrinsics = match extrinsics {
            Ok(e) => e,
            Err(e) => {
                error!(error = %e, "failed to acquire rig geometry");
                *self.state.lock() = PipelineState::Stopped;
                return Err(e);
            }
        };

        self.rig = Some(CameraRigModel::new(extrinsics));
        *self.state.lock() = PipelineState::Idle;
        info!("rig geometry acquired");
        Ok(())
    }

    /// Open both streams and spawn the acquisition thread.
    ///
    /// A second start while already running is a no-op, so hosts may issue
    /// idempotent start calls. Starting without a successful
    /// [`MarkerTracker::initialize`], or after the loop was consumed,
    /// returns [`Error::NotInitialized`].
    pub fn start(&mut self) -> Result<()> {
        if *self.state.lock() == PipelineState::Running {
            debug!("start requested while already running, ignoring");
            return Ok(());
        }

        let rig = self.rig.clone().ok_or(Error::NotInitialized)?;
        let mut device = self.device.take().ok_or(Error::NotInitialized)?;
        let locator = self.locator.take().ok_or(Error::NotInitialized)?;
        let estimator = self.estimator.take().ok_or(Error::NotInitialized)?;

        if let Err(e) = device.open_streams() {
            *self.state.lock() = PipelineState::Stopped;
            return Err(e);
        }

        self.stop.store(false, Ordering::SeqCst);
        *self.state.lock() = PipelineState::Running;

        let worker = Worker {
            device,
            locator,
            estimator,
            rig,
            config: self.config.clone(),
            shared: Arc::clone(&self.shared),
            stop: Arc::clone(&self.stop),
            state: Arc::clone(&self.state),
        };
        self.handle = Some(thread::spawn(move || worker.run()));
        Ok(())
    }

    /// Request a cooperative stop, wait for the loop to exit, and release
    /// the persistent buffer storage.
    ///
    /// Safe to call at any point: before initialization, while running, or
    /// after the loop already self-stopped on a fatal error. The pipeline
    /// always ends in `Stopped`.
    pub fn stop(&mut self) {
        {
            let mut state = self.state.lock();
            if *state == PipelineState::Running {
                *state = PipelineState::Stopping;
            }
        }
        self.stop.store(true, Ordering::SeqCst);

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("acquisition thread panicked");
            }
        }

        // teardown is terminal: drop any still-parked collaborators so a
        // later start cannot revive a pipeline whose storage is released
        self.device = None;
        self.locator = None;
        self.estimator = None;
        self.rig = None;

        self.shared.release_storage();
        *self.state.lock() = PipelineState::Stopped;
        info!("pipeline stopped");
    }
}

impl Drop for MarkerTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything the acquisition thread owns while running.
struct Worker {
    device: Box<dyn FrameSource>,
    locator: Box<dyn PoseLocator>,
    estimator: Box<dyn MarkerEstimator>,
    rig: CameraRigModel,
    config: TrackerConfig,
    shared: Arc<SharedPublication>,
    stop: Arc<AtomicBool>,
    state: Arc<Mutex<PipelineState>>,
}

impl Worker {
    fn run(mut self) {
        info!("acquisition loop started");
        while !self.stop.load(Ordering::SeqCst) {
            if let Err(e) = self.cycle() {
                error!(error = %e, "fatal error in acquisition loop");
                break;
            }
        }

        // resource release happens on every exit path, fatal or requested
        *self.state.lock() = PipelineState::Stopping;
        self.device.close_streams();
        *self.state.lock() = PipelineState::Stopped;
        info!("acquisition loop stopped");
    }

    /// One full producer cycle. `Err` is fatal and terminates the loop;
    /// recoverable conditions (fetch failure, tracking loss) are handled
    /// inside by skipping the affected publication.
    fn cycle(&mut self) -> Result<()> {
        // 1. fetch one frame per camera; either failing skips the cycle
        //    with nothing published
        let frames = match self.fetch_pair() {
            Ok(frames) => frames,
            Err(e) => {
                debug!(error = %e, "frame fetch failed, skipping cycle");
                return Ok(());
            }
        };

        // 2. both capture instants in the locator time domain
        let stamps = PerCamera::try_from_fn(|side| {
            FrameTimestamp::from_device_ticks(frames[side].device_ticks)
        })?;

        // 3. rig pose per camera timestamp; a single lookup is reused when
        //    the instants coincide, the lookup may be rate-limited
        let pose_left = self.locator.locate(stamps.left.host_ns);
        let pose_right = if stamps.right.host_ns == stamps.left.host_ns {
            pose_left
        } else {
            self.locator.locate(stamps.right.host_ns)
        };

        match (pose_left, pose_right) {
            (Some(left), Some(right)) => {
                // 4. camera-to-world per camera
                let poses = PerCamera::new(left, right);
                let cam_to_world = PerCamera::from_fn(|side| {
                    camera_to_world(
                        self.rig.extrinsics(side).inverse(),
                        &poses[side].to_matrix(),
                    )
                });

                // 5. detection on the selected camera, snapshot replace
                if self.config.detect_markers {
                    self.detect_and_publish(&frames, &cam_to_world);
                }
            }
            _ => {
                // transient tracking loss: the previous snapshot stays
                // visible, image publication below is unaffected
                debug!("rig pose unavailable, skipping marker update");
            }
        }

        // 6. guarded copy of both raw buffers
        if self.config.publish_frames {
            self.shared.publish_frames(&frames, &stamps);
        }

        // 7. per-cycle frames drop here on every path
        Ok(())
    }

    fn fetch_pair(&mut self) -> Result<PerCamera<SensorFrame>> {
        PerCamera::try_from_fn(|side| self.device.next_frame(side))
    }

    fn detect_and_publish(
        &mut self,
        frames: &PerCamera<SensorFrame>,
        cam_to_world: &PerCamera<nalgebra::Matrix4<f64>>,
    ) {
        let side = self.config.active_camera;
        let transform = &cam_to_world[side];

        let started = Instant::now();
        let detections = self.estimator.detect_and_estimate(
            &frames[side],
            &self.config.intrinsics[side],
            self.config.marker_length_m,
            self.config.dictionary,
        );
        self.shared
            .set_processing_time(started.elapsed().as_millis() as i64);

        let converted = to_render_convention(transform);
        let markers: Vec<WorldMarker> = detections
            .iter()
            .map(|det| {
                let (position, rotation) = marker_world_pose(transform, &det.rvec, &det.tvec);
                WorldMarker {
                    id: det.id,
                    position: [
                        position.x as f32,
                        position.y as f32,
                        position.z as f32,
                    ],
                    rotation: [
                        rotation.x as f32,
                        rotation.y as f32,
                        rotation.z as f32,
                    ],
                    camera_to_world: converted,
                }
            })
            .collect();

        debug!(count = markers.len(), "publishing marker snapshot");
        self.shared.publish_markers(markers);
    }
}
