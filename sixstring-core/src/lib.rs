// sixstring-core/src/lib.rs

//! The core logic for the guitar-string tuner.
//! This crate owns the capture → decode → transform → match pipeline and
//! its scheduling. It is completely headless and contains no GUI code;
//! a presentation layer subscribes to the scheduler's published readout.

pub mod device;
pub mod error;
pub mod fft;
pub mod microphone;
pub mod pcm;
pub mod pitch;
pub mod scheduler;
pub mod tuning;
pub mod wav;

use serde::{Deserialize, Serialize};

pub use error::TunerError;
pub use pitch::MatchResult;
pub use scheduler::{CaptureScheduler, SchedulerState};
pub use tuning::TargetPitch;

/// What the scheduler publishes after each completed analysis cycle.
///
/// Transient by design: overwritten every cycle, never queued, and computed
/// entirely from that cycle's clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TunerReadout {
    /// Dominant detected frequency rounded to whole Hz, when any bin had
    /// energy below the ceiling.
    pub dominant_hz: Option<i32>,
    /// Deviation from the selected string, or no match.
    pub result: MatchResult,
}

impl TunerReadout {
    /// The raw dominant-frequency string the display shows alongside the
    /// deviation.
    pub fn dominant_display(&self) -> String {
        match self.dominant_hz {
            Some(hz) => format!("{hz} Hz"),
            None => "--- Hz".to_string(),
        }
    }
}

/// Runs one clip through the full pipeline: container parse, PCM decode,
/// spectral transform, pitch match.
///
/// `Ok(None)` means the clip carried no PCM payload; the caller skips the
/// cycle and keeps its previous readout.
///
/// # Errors
/// * [`TunerError::InvalidContainer`] for clips below the header size.
/// * [`TunerError::Transform`] if the transform rejects the window.
pub fn analyze_clip(
    clip: &[u8],
    target: Option<TargetPitch>,
) -> Result<Option<TunerReadout>, TunerError> {
    let Some(payload) = wav::extract_pcm(clip)? else {
        return Ok(None);
    };
    let window = pcm::decode_window(payload, fft::TRANSFORM_SIZE);
    let bins = fft::analyze(&window, scheduler::SAMPLE_RATE_HZ)?;
    let dominant_hz = pitch::dominant_frequency(&bins);
    let result = pitch::match_dominant(dominant_hz, target);
    Ok(Some(TunerReadout {
        dominant_hz,
        result,
    }))
}
