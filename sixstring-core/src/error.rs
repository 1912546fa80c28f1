//! Error taxonomy for the capture/analysis pipeline.
//!
//! Only [`TunerError::PermissionDenied`] is fatal to the scheduler; every
//! other variant is contained within the cycle that produced it. The next
//! tick starts a fresh, self-contained cycle, so there is no retry logic
//! anywhere in this crate.

use thiserror::Error;

/// Everything that can go wrong between a tick firing and a readout being
/// published.
#[derive(Debug, Error)]
pub enum TunerError {
    /// Microphone access was refused while configuring the scheduler.
    /// Stops the scheduler and surfaces a user-facing notice.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// The clip is too small to hold the fixed 44-byte container header.
    /// The cycle is skipped; the previous readout stays published.
    #[error("clip of {0} bytes is smaller than the container header")]
    InvalidContainer(usize),

    /// The sample window handed to the transform had the wrong length.
    #[error("transform input was {got} samples, expected {expected}")]
    Transform { expected: usize, got: usize },

    /// The capture device failed to start or finalize a recording.
    /// Logged; the next tick retries with a fresh recording.
    #[error("capture device error: {0}")]
    Device(String),

    /// Reading the recorded clip from its location failed.
    #[error("clip storage error")]
    Storage(#[from] std::io::Error),
}
