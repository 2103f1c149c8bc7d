//! Shared publication state between the acquisition loop and consumers.
//!
//! Exactly one producer (the acquisition thread) writes; any number of
//! consumer threads poll through the accessors. The producer never waits on
//! a consumer. Two logically independent resources live here:
//!
//! - the **pixel buffers** and their timestamps, guarded by one mutex held
//!   only for bounded copies, never across detection or frame fetch;
//! - the **marker snapshot**, replaced wholesale behind a short write lock
//!   on an `Arc`, so a reader either sees the previous complete list or the
//!   new complete list, never a partially built one.
//!
//! Because the two are synchronized independently, a consumer reading both
//! in sequence may observe the marker snapshot from cycle N next to the
//! image from cycle N+1. That relaxation is deliberate: it keeps the
//! producer free-running. Callers needing cross-field consistency must
//! correlate through the published timestamps.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::rig::{CameraSide, PerCamera};
use crate::sensor::{FrameTimestamp, SensorFrame};

/// One detected marker in world space, as handed to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldMarker {
    pub id: i32,
    /// World-space position, meters.
    pub position: [f32; 3],
    /// World-space rotation, scaled axis-angle.
    pub rotation: [f32; 3],
    /// Camera-to-world active at observation, already converted to the
    /// renderer's row-vector, left-handed convention.
    pub camera_to_world: [[f32; 4]; 4],
}

/// Copy-out of one camera's latest published frame.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: FrameTimestamp,
}

#[derive(Default)]
struct FrameSlot {
    /// Lazily allocated on the first published frame, reused afterwards.
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    timestamp: Option<FrameTimestamp>,
}

#[derive(Default)]
struct FrameStore {
    slots: PerCamera<FrameSlot>,
    released: bool,
}

/// Double-buffered state published by the acquisition loop.
pub struct SharedPublication {
    frames: Mutex<FrameStore>,
    image_updated: PerCamera<AtomicBool>,
    markers: RwLock<Arc<Vec<WorldMarker>>>,
    markers_updated: AtomicBool,
    processing_ms: AtomicI64,
}

impl SharedPublication {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            frames: Mutex::new(FrameStore::default()),
            image_updated: PerCamera::new(AtomicBool::new(false), AtomicBool::new(false)),
            markers: RwLock::new(Arc::new(Vec::new())),
            markers_updated: AtomicBool::new(false),
            processing_ms: AtomicI64::new(0),
        })
    }

    /// Whether `side`'s buffer was refreshed since the last buffer read.
    pub fn image_updated(&self, side: CameraSide) -> bool {
        self.image_updated[side].load(Ordering::SeqCst)
    }

    /// Whether the marker snapshot was refreshed since the last marker read.
    pub fn markers_updated(&self) -> bool {
        self.markers_updated.load(Ordering::SeqCst)
    }

    /// Number of markers in the current snapshot.
    ///
    /// Take semantics: reading the count consumes the update signal, like
    /// [`SharedPublication::markers`]. A consumer wanting both count and
    /// content should call `markers()` once and use its length.
    pub fn marker_count(&self) -> usize {
        self.markers_updated.store(false, Ordering::SeqCst);
        self.markers.read().len()
    }

    /// The current marker snapshot. Clears the marker-updated flag.
    ///
    /// The returned `Arc` is the snapshot itself; a fresh cycle replaces
    /// the shared pointer without mutating lists already handed out.
    pub fn markers(&self) -> Arc<Vec<WorldMarker>> {
        self.markers_updated.store(false, Ordering::SeqCst);
        Arc::clone(&self.markers.read())
    }

    /// Copy of `side`'s latest frame plus its capture timestamp. Clears
    /// that camera's updated flag. Returns `None` if no frame has ever
    /// been published (an explicitly empty result, not an error).
    pub fn camera_buffer(&self, side: CameraSide) -> Option<CapturedFrame> {
        let store = self.frames.lock();
        let slot = &store.slots[side];
        let timestamp = slot.timestamp?;
        let copy = CapturedFrame {
            pixels: slot.pixels.clone(),
            width: slot.width,
            height: slot.height,
            timestamp,
        };
        self.image_updated[side].store(false, Ordering::SeqCst);
        Some(copy)
    }

    /// Duration of the last marker estimation call, milliseconds.
    pub fn last_processing_time_ms(&self) -> i64 {
        self.processing_ms.load(Ordering::SeqCst)
    }

    /// Atomically replace the marker snapshot, even with an empty list,
    /// and raise the update flag. Producer side.
    pub(crate) fn publish_markers(&self, markers: Vec<WorldMarker>) {
        *self.markers.write() = Arc::new(markers);
        self.markers_updated.store(true, Ordering::SeqCst);
    }

    /// Copy both frames into the persistent slots under the shared mutex
    /// and raise both per-camera flags. Producer side.
    pub(crate) fn publish_frames(
        &self,
        frames: &PerCamera<SensorFrame>,
        stamps: &PerCamera<FrameTimestamp>,
    ) {
        let mut store = self.frames.lock();
        if store.released {
            return;
        }
        for side in CameraSide::BOTH {
            let frame = &frames[side];
            let slot = &mut store.slots[side];
            // clear + extend reuses existing capacity, grows when needed
            slot.pixels.clear();
            slot.pixels.extend_from_slice(&frame.pixels);
            slot.width = frame.width;
            slot.height = frame.height;
            slot.timestamp = Some(stamps[side]);
        }
        // flags go up under the same lock as the copy, so a flag observed
        // true always signals a frame the reader has not yet consumed
        for side in CameraSide::BOTH {
            self.image_updated[side].store(true, Ordering::SeqCst);
        }
    }

    pub(crate) fn set_processing_time(&self, ms: i64) {
        self.processing_ms.store(ms, Ordering::SeqCst);
    }

    /// Free the persistent buffer storage at teardown. Idempotent; later
    /// publish calls become no-ops.
    pub(crate) fn release_storage(&self) {
        let mut store = self.frames.lock();
        if store.released {
            return;
        }
        store.released = true;
        for side in CameraSide::BOTH {
            store.slots[side] = FrameSlot::default();
            self.image_updated[side].store(false, Ordering::SeqCst);
        }
    }
}
