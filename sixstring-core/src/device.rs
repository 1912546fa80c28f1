//! # Capture Interfaces Module
//!
//! The seams between the scheduler and the outside world: a capture device
//! that records fixed-duration clips to a readable location, and a clip
//! store that reads and deletes those locations.
//!
//! The scheduler only ever talks to these traits; the cpal-backed microphone
//! lives in [`crate::microphone`], and tests substitute in-memory fakes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::TunerError;

/// A source of recordings.
///
/// `authorize` runs once while the scheduler is configuring; a
/// [`TunerError::PermissionDenied`] there stops the scheduler for good.
/// `begin` starts one recording; every other device failure maps to
/// [`TunerError::Device`] and only costs the current cycle.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Requests access to the capture hardware and fixes the capture mode
    /// (44.1 kHz, mono, 16-bit linear PCM).
    async fn authorize(&self) -> Result<(), TunerError>;

    /// Starts a new recording.
    async fn begin(&self) -> Result<Box<dyn RecordingHandle>, TunerError>;
}

/// An in-progress recording. Exactly one of `stop` or `discard` is called.
#[async_trait]
pub trait RecordingHandle: Send {
    /// Finalizes the recording and yields the location of the clip.
    async fn stop(self: Box<Self>) -> Result<PathBuf, TunerError>;

    /// Halts the recording and drops whatever was captured. Used on
    /// teardown; must not fail.
    async fn discard(self: Box<Self>);
}

/// Read and delete operations over clip locations.
#[async_trait]
pub trait ClipStore: Send + Sync {
    async fn read(&self, location: &Path) -> std::io::Result<Vec<u8>>;

    /// Removes the clip. Callers log failures and move on; a leaked temp
    /// file is not worth aborting the schedule over.
    async fn delete(&self, location: &Path) -> std::io::Result<()>;
}

/// Clip store over the local filesystem, where the microphone device writes
/// its temporary clips.
#[derive(Debug, Default)]
pub struct FsClipStore;

#[async_trait]
impl ClipStore for FsClipStore {
    async fn read(&self, location: &Path) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(location).await
    }

    async fn delete(&self, location: &Path) -> std::io::Result<()> {
        tokio::fs::remove_file(location).await
    }
}
