//! Pipeline lifecycle state machine.

/// State of the acquisition pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Constructed, rig geometry not yet acquired.
    Idle,
    /// Waiting for consent and reading extrinsics.
    Initializing,
    /// Acquisition loop running on its dedicated thread.
    Running,
    /// Stop requested, loop finishing its current cycle.
    Stopping,
    /// Loop exited and resources released; terminal.
    Stopped,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::Idle
    }
}
