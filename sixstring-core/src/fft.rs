//! # Spectral Analyzer Module
//!
//! Runs the fixed-size discrete Fourier transform over a decoded sample
//! window and labels each bin with the frequency and magnitude the matcher
//! ranks on.
//!
//! The bin labeling is part of the tuner's contract, not an implementation
//! detail: `frequency = (i / N) * (sample_rate / 2)` and
//! `magnitude = sqrt(re² + im²)` define what "dominant frequency" means for
//! every string's reference value downstream. The input is transformed as-is
//! (no window function, no DC removal, no normalization) so identical clips
//! always rank identically.

use rustfft::{FftPlanner, num_complex::Complex};

use crate::error::TunerError;

/// Number of samples per transform. Also the length of every decoded
/// sample window.
pub const TRANSFORM_SIZE: usize = 2048;

/// Bins above this frequency are discarded before matching; everything a
/// guitar string produces that the tuner cares about sits well below it.
pub const FREQUENCY_CEILING_HZ: f32 = 5000.0;

/// One output bin of the transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralBin {
    /// Labeled bin frequency in Hz.
    pub frequency_hz: f32,
    /// Magnitude `sqrt(re² + im²)`; zero magnitudes are emitted here and
    /// filtered by the matcher.
    pub magnitude: f32,
}

/// Transforms a sample window into its spectral bins.
///
/// Emits bins `0..N/2` in ascending bin index (hence ascending frequency),
/// restricted to frequencies at or below [`FREQUENCY_CEILING_HZ`].
///
/// # Errors
/// * `TunerError::Transform` if `window` is not exactly [`TRANSFORM_SIZE`]
///   samples; the caller abandons the cycle.
pub fn analyze(window: &[f32], sample_rate_hz: u32) -> Result<Vec<SpectralBin>, TunerError> {
    if window.len() != TRANSFORM_SIZE {
        return Err(TunerError::Transform {
            expected: TRANSFORM_SIZE,
            got: window.len(),
        });
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(TRANSFORM_SIZE);

    let mut buffer: Vec<Complex<f32>> = window
        .iter()
        .map(|&sample| Complex { re: sample, im: 0.0 })
        .collect();
    fft.process(&mut buffer);

    let bins = buffer
        .iter()
        .take(TRANSFORM_SIZE / 2)
        .enumerate()
        .map(|(i, c)| SpectralBin {
            frequency_hz: (i as f32 / TRANSFORM_SIZE as f32) * (sample_rate_hz as f32 / 2.0),
            magnitude: c.norm(), // .norm() is sqrt(re^2 + im^2)
        })
        .filter(|bin| bin.frequency_hz <= FREQUENCY_CEILING_HZ)
        .collect();

    Ok(bins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::SAMPLE_RATE_HZ;

    /// Labeled width of one bin at the capture sample rate.
    fn bin_width() -> f32 {
        (SAMPLE_RATE_HZ as f32 / 2.0) / TRANSFORM_SIZE as f32
    }

    /// A sine completing `cycles` full periods across the window, which
    /// concentrates its energy in bin `cycles`.
    fn sine_window(cycles: usize) -> Vec<f32> {
        (0..TRANSFORM_SIZE)
            .map(|n| {
                (2.0 * std::f32::consts::PI * cycles as f32 * n as f32 / TRANSFORM_SIZE as f32)
                    .sin()
            })
            .collect()
    }

    #[test]
    fn wrong_window_size_is_a_transform_error() {
        let err = analyze(&[0.0; 1024], SAMPLE_RATE_HZ).unwrap_err();
        assert!(matches!(
            err,
            TunerError::Transform {
                expected: TRANSFORM_SIZE,
                got: 1024
            }
        ));
    }

    #[test]
    fn frequencies_ascend_and_respect_the_ceiling() {
        let bins = analyze(&vec![0.0; TRANSFORM_SIZE], SAMPLE_RATE_HZ).unwrap();
        assert!(!bins.is_empty());
        assert_eq!(bins[0].frequency_hz, 0.0);
        for pair in bins.windows(2) {
            assert!(pair[1].frequency_hz > pair[0].frequency_hz);
        }
        assert!(bins.last().unwrap().frequency_hz <= FREQUENCY_CEILING_HZ);
    }

    #[test]
    fn bin_labels_follow_the_contract_formula() {
        let bins = analyze(&vec![0.0; TRANSFORM_SIZE], SAMPLE_RATE_HZ).unwrap();
        let expected = (8.0 / TRANSFORM_SIZE as f32) * (SAMPLE_RATE_HZ as f32 / 2.0);
        assert!((bins[8].frequency_hz - expected).abs() < 1e-3);
    }

    #[test]
    fn silence_produces_zero_magnitudes() {
        let bins = analyze(&vec![0.0; TRANSFORM_SIZE], SAMPLE_RATE_HZ).unwrap();
        assert!(bins.iter().all(|b| b.magnitude == 0.0));
    }

    #[test]
    fn pure_sine_peaks_within_one_bin_of_its_frequency() {
        for cycles in [8usize, 31, 100] {
            let bins = analyze(&sine_window(cycles), SAMPLE_RATE_HZ).unwrap();
            let expected_hz =
                (cycles as f32 / TRANSFORM_SIZE as f32) * (SAMPLE_RATE_HZ as f32 / 2.0);
            let peak = bins
                .iter()
                .max_by(|a, b| a.magnitude.partial_cmp(&b.magnitude).unwrap())
                .unwrap();
            assert!(
                (peak.frequency_hz - expected_hz).abs() <= bin_width(),
                "peak {} Hz not within one bin of {} Hz",
                peak.frequency_hz,
                expected_hz
            );
        }
    }
}
