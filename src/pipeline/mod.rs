//! The acquisition pipeline: configuration, lifecycle, and published state.

pub mod acquisition;
pub mod config;
pub mod publication;
pub mod state;

pub use acquisition::MarkerTracker;
pub use config::TrackerConfig;
pub use publication::{CapturedFrame, SharedPublication, WorldMarker};
pub use state::PipelineState;
