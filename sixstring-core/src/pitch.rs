//! # Pitch Matching Module
//!
//! Picks the dominant frequency out of a spectrum and compares it against
//! the selected string's reference frequency. The comparison is memoryless:
//! every cycle is matched purely from its own clip, with no smoothing or
//! hysteresis across windows.

use serde::{Deserialize, Serialize};

use crate::fft::SpectralBin;
use crate::tuning::TargetPitch;

/// A dominant pitch farther than this from the target reads as a different
/// string (or noise) and is reported as no match.
pub const MATCH_WINDOW_HZ: i32 = 50;

/// Outcome of matching one clip against the selected string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    /// No usable dominant frequency, no target selected, or the deviation
    /// fell outside [`MATCH_WINDOW_HZ`].
    #[default]
    NoMatch,
    /// Signed deviation in Hz: positive means the dominant pitch is below
    /// the target (tune up), negative above it (tune down).
    Deviation(i32),
}

impl std::fmt::Display for MatchResult {
    /// Formats the way the tuner displays it: a leading `+` for positive
    /// deviations only, `--- Hz` as the placeholder.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchResult::NoMatch => write!(f, "--- Hz"),
            MatchResult::Deviation(hz) if *hz > 0 => write!(f, "+{hz} Hz"),
            MatchResult::Deviation(hz) => write!(f, "{hz} Hz"),
        }
    }
}

/// Finds the dominant frequency: the bin of maximum magnitude among bins
/// with magnitude above zero, rounded to the nearest whole Hz.
///
/// Ties are broken by the first occurrence in ascending-frequency order
/// (a single left-to-right scan with a strict comparison), so the lower
/// frequency wins. That scan order is observable behavior; keep it.
pub fn dominant_frequency(bins: &[SpectralBin]) -> Option<i32> {
    let mut dominant: Option<&SpectralBin> = None;
    for bin in bins.iter().filter(|b| b.magnitude > 0.0) {
        match dominant {
            Some(best) if bin.magnitude <= best.magnitude => {}
            _ => dominant = Some(bin),
        }
    }
    dominant.map(|bin| bin.frequency_hz.round() as i32)
}

/// Matches a spectrum against the selected target pitch.
///
/// Returns [`MatchResult::NoMatch`] when every bin is silent, when no target
/// is selected, or when the deviation is [`MATCH_WINDOW_HZ`] or more.
pub fn match_pitch(bins: &[SpectralBin], target: Option<TargetPitch>) -> MatchResult {
    match_dominant(dominant_frequency(bins), target)
}

/// Matches an already-extracted dominant frequency against the target.
pub fn match_dominant(dominant_hz: Option<i32>, target: Option<TargetPitch>) -> MatchResult {
    let (Some(dominant), Some(target)) = (dominant_hz, target) else {
        return MatchResult::NoMatch;
    };
    let diff = target.frequency_hz() - dominant;
    if diff.abs() < MATCH_WINDOW_HZ {
        MatchResult::Deviation(diff)
    } else {
        MatchResult::NoMatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(frequency_hz: f32, magnitude: f32) -> SpectralBin {
        SpectralBin {
            frequency_hz,
            magnitude,
        }
    }

    #[test]
    fn deviation_is_signed_target_minus_dominant() {
        let bins = [bin(82.0, 0.2), bin(90.0, 1.0)];
        assert_eq!(
            match_pitch(&bins, Some(TargetPitch::LowE)),
            MatchResult::Deviation(-8)
        );
    }

    #[test]
    fn dominant_below_target_reads_positive() {
        let bins = [bin(75.0, 1.0)];
        assert_eq!(
            match_pitch(&bins, Some(TargetPitch::LowE)),
            MatchResult::Deviation(7)
        );
    }

    #[test]
    fn deviation_outside_window_is_no_match() {
        // 82 - 140 = -58, outside the 50 Hz window.
        let bins = [bin(140.0, 1.0)];
        assert_eq!(match_pitch(&bins, Some(TargetPitch::LowE)), MatchResult::NoMatch);
        // 330 - 40 = 290.
        assert_eq!(
            match_dominant(Some(40), Some(TargetPitch::HighE)),
            MatchResult::NoMatch
        );
    }

    #[test]
    fn window_boundary_is_exclusive() {
        assert_eq!(
            match_dominant(Some(82 + 49), Some(TargetPitch::LowE)),
            MatchResult::Deviation(-49)
        );
        assert_eq!(
            match_dominant(Some(82 + 50), Some(TargetPitch::LowE)),
            MatchResult::NoMatch
        );
    }

    #[test]
    fn zero_magnitude_bins_never_match() {
        let bins = [bin(82.0, 0.0), bin(110.0, 0.0)];
        assert_eq!(dominant_frequency(&bins), None);
        for target in TargetPitch::ALL {
            assert_eq!(match_pitch(&bins, Some(target)), MatchResult::NoMatch);
        }
        assert_eq!(match_pitch(&[], Some(TargetPitch::A)), MatchResult::NoMatch);
    }

    #[test]
    fn no_target_is_no_match() {
        let bins = [bin(110.0, 1.0)];
        assert_eq!(match_pitch(&bins, None), MatchResult::NoMatch);
    }

    #[test]
    fn equal_magnitudes_keep_the_lower_frequency() {
        let bins = [bin(100.0, 0.5), bin(200.0, 0.5), bin(50.0, 0.5)];
        assert_eq!(dominant_frequency(&bins), Some(100));
    }

    #[test]
    fn dominant_rounds_to_nearest_hz() {
        assert_eq!(dominant_frequency(&[bin(86.13, 1.0)]), Some(86));
        assert_eq!(dominant_frequency(&[bin(86.51, 1.0)]), Some(87));
    }

    #[test]
    fn display_prefixes_positive_only() {
        assert_eq!(MatchResult::Deviation(8).to_string(), "+8 Hz");
        assert_eq!(MatchResult::Deviation(-8).to_string(), "-8 Hz");
        assert_eq!(MatchResult::Deviation(0).to_string(), "0 Hz");
        assert_eq!(MatchResult::NoMatch.to_string(), "--- Hz");
    }
}
