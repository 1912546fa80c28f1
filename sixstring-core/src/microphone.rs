//! # Microphone Device Module
//!
//! Real [`CaptureDevice`] backed by CPAL (Cross-Platform Audio Library).
//! Records from the default input device at 44.1 kHz mono and finalizes each
//! recording as a 16-bit PCM WAV clip in a temporary directory.
//!
//! `cpal::Stream` is not `Send`, so each recording runs on its own dedicated
//! thread that owns the stream; the async side talks to it over
//! crossbeam channels and joins it through `spawn_blocking`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, bounded};

use crate::device::{CaptureDevice, RecordingHandle};
use crate::error::TunerError;
use crate::scheduler::SAMPLE_RATE_HZ;

/// Sequence number folded into clip filenames so concurrent processes never
/// collide in the shared temp directory.
static CLIP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Commands sent to a recording's capture thread.
enum Command {
    /// Drop the stream, write the clip, reply with its location.
    Finalize(Sender<Result<PathBuf>>),
    /// Drop the stream and everything captured so far.
    Discard,
}

/// Capture device over the default system microphone.
pub struct MicrophoneDevice {
    clip_dir: PathBuf,
}

impl MicrophoneDevice {
    /// Device writing clips to the system temp directory.
    pub fn new() -> Self {
        Self::with_clip_dir(std::env::temp_dir())
    }

    /// Device writing clips under `clip_dir`.
    pub fn with_clip_dir(clip_dir: PathBuf) -> Self {
        Self { clip_dir }
    }

    fn next_clip_path(&self) -> PathBuf {
        let seq = CLIP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.clip_dir
            .join(format!("sixstring-{}-{}.wav", std::process::id(), seq))
    }
}

impl Default for MicrophoneDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureDevice for MicrophoneDevice {
    async fn authorize(&self) -> Result<(), TunerError> {
        // Desktop hosts have no permission prompt; being able to open the
        // default input device with a usable config is the equivalent check.
        tokio::task::spawn_blocking(|| {
            let host = cpal::default_host();
            let device = host
                .default_input_device()
                .ok_or(TunerError::PermissionDenied)?;
            let configs = device
                .supported_input_configs()
                .map_err(|_| TunerError::PermissionDenied)?
                .collect::<Vec<_>>();
            if pick_config(&configs).is_none() {
                return Err(TunerError::PermissionDenied);
            }
            Ok(())
        })
        .await
        .map_err(|e| TunerError::Device(e.to_string()))?
    }

    async fn begin(&self) -> Result<Box<dyn RecordingHandle>, TunerError> {
        let path = self.next_clip_path();
        let (cmd_tx, cmd_rx) = bounded::<Command>(1);
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);

        let join = thread::spawn(move || capture_thread(path, cmd_rx, ready_tx));

        // Wait for the stream to actually be running before reporting the
        // recording as started.
        let ready = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .map_err(|e| TunerError::Device(e.to_string()))?;
        match ready {
            Ok(Ok(())) => Ok(Box::new(MicrophoneRecording {
                cmd_tx,
                join: Some(join),
            })),
            Ok(Err(e)) => {
                let _ = join.join();
                Err(TunerError::Device(e.to_string()))
            }
            Err(_) => {
                let _ = join.join();
                Err(TunerError::Device("capture thread exited early".into()))
            }
        }
    }
}

/// One in-flight microphone recording.
struct MicrophoneRecording {
    cmd_tx: Sender<Command>,
    join: Option<thread::JoinHandle<()>>,
}

#[async_trait]
impl RecordingHandle for MicrophoneRecording {
    async fn stop(mut self: Box<Self>) -> Result<PathBuf, TunerError> {
        let (reply_tx, reply_rx) = bounded::<Result<PathBuf>>(1);
        self.cmd_tx
            .send(Command::Finalize(reply_tx))
            .map_err(|_| TunerError::Device("capture thread is gone".into()))?;
        let join = self.join.take();
        tokio::task::spawn_blocking(move || {
            let reply = reply_rx.recv();
            if let Some(join) = join {
                let _ = join.join();
            }
            reply
        })
        .await
        .map_err(|e| TunerError::Device(e.to_string()))?
        .map_err(|_| TunerError::Device("capture thread dropped its reply".into()))?
        .map_err(|e| TunerError::Device(e.to_string()))
    }

    async fn discard(mut self: Box<Self>) {
        let _ = self.cmd_tx.send(Command::Discard);
        if let Some(join) = self.join.take() {
            let _ = tokio::task::spawn_blocking(move || {
                let _ = join.join();
            })
            .await;
        }
    }
}

/// Body of the dedicated capture thread: owns the cpal stream from build to
/// drop, accumulates samples, and finalizes or discards on command.
fn capture_thread(path: PathBuf, cmd_rx: Receiver<Command>, ready_tx: Sender<Result<()>>) {
    let samples: Arc<Mutex<Vec<i16>>> = Arc::new(Mutex::new(Vec::new()));

    let stream = match build_stream(Arc::clone(&samples)) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(e.into()));
        return;
    }
    let _ = ready_tx.send(Ok(()));

    match cmd_rx.recv() {
        Ok(Command::Finalize(reply_tx)) => {
            drop(stream);
            let captured = samples.lock().map(|s| s.clone()).unwrap_or_default();
            let _ = reply_tx.send(write_clip(&path, &captured).map(|_| path));
        }
        // A dropped command channel means the handle went away; treat it
        // like an explicit discard.
        Ok(Command::Discard) | Err(_) => drop(stream),
    }
}

/// Builds a mono 44.1 kHz input stream feeding `samples`.
///
/// Prefers a native i16 config; falls back to f32 and quantizes in the
/// callback.
fn build_stream(samples: Arc<Mutex<Vec<i16>>>) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    log::debug!("recording from input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported = pick_config(&configs).ok_or_else(|| anyhow!("No mono 44100 Hz input format"))?;
    let format = supported.sample_format();
    let config: cpal::StreamConfig = supported
        .with_sample_rate(cpal::SampleRate(SAMPLE_RATE_HZ))
        .into();

    let err_fn = |err| log::warn!("input stream error: {err}");

    let stream = match format {
        cpal::SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                if let Ok(mut samples) = samples.lock() {
                    samples.extend_from_slice(data);
                }
            },
            err_fn,
            None,
        )?,
        _ => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut samples) = samples.lock() {
                    samples.extend(data.iter().map(|&s| quantize(s)));
                }
            },
            err_fn,
            None,
        )?,
    };
    Ok(stream)
}

/// Picks the best supported config: mono, i16 preferred over f32, and the
/// capture rate inside the supported range.
fn pick_config(configs: &[SupportedStreamConfigRange]) -> Option<SupportedStreamConfigRange> {
    let supports_rate = |c: &&SupportedStreamConfigRange| {
        c.channels() == 1
            && c.min_sample_rate().0 <= SAMPLE_RATE_HZ
            && c.max_sample_rate().0 >= SAMPLE_RATE_HZ
    };
    configs
        .iter()
        .filter(supports_rate)
        .find(|c| c.sample_format() == cpal::SampleFormat::I16)
        .or_else(|| {
            configs
                .iter()
                .filter(supports_rate)
                .find(|c| c.sample_format() == cpal::SampleFormat::F32)
        })
        .cloned()
}

/// Converts a normalized float sample to 16-bit PCM.
fn quantize(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// Writes the captured samples as a 16-bit mono PCM WAV clip.
fn write_clip(path: &std::path::Path, samples: &[i16]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE_HZ,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_clamps_and_scales() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), 32767);
        assert_eq!(quantize(-1.0), -32767);
        assert_eq!(quantize(2.5), 32767);
        assert_eq!(quantize(0.5), 16383);
    }

    #[test]
    fn written_clip_parses_back_through_the_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let samples: Vec<i16> = vec![0, 16384, -16384, 32767];
        write_clip(&path, &samples).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let pcm = crate::wav::extract_pcm(&bytes).unwrap().unwrap();
        let window = crate::pcm::decode_window(pcm, samples.len());
        assert_eq!(window[1], 0.5);
        assert_eq!(window[2], -0.5);
    }

    #[test]
    fn clip_paths_are_unique() {
        let device = MicrophoneDevice::new();
        assert_ne!(device.next_clip_path(), device.next_clip_path());
    }
}
