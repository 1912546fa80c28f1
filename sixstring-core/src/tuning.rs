//! # Guitar Tuning Module
//!
//! This module defines the six target pitches of a standard-tuned guitar and
//! their reference frequencies. The pipeline never mutates the target pitch;
//! it is selected by the caller (the UI layer) and read once per analysis
//! cycle.
//!
//! ## Reference frequencies
//! Standard tuning, rounded to whole Hz as displayed by the tuner:
//! E2 = 82, A2 = 110, D3 = 147, G3 = 196, B3 = 247, E4 = 330.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One of the six strings of a standard-tuned guitar.
///
/// Each variant maps to a fixed reference frequency in Hz. The pipeline
/// treats the selection as read-only; only the caller changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetPitch {
    /// Low E string (E2).
    LowE,
    /// A string (A2).
    A,
    /// D string (D3).
    D,
    /// G string (G3).
    G,
    /// B string (B3).
    B,
    /// High E string (E4).
    HighE,
}

/// Static map from the UI's single-letter string labels to pitches.
///
/// The labels follow the tuner's button layout: uppercase for the five
/// lower strings, lowercase "e" for the high E string.
static PITCH_MAP: Lazy<BTreeMap<&'static str, TargetPitch>> = Lazy::new(|| {
    let mut map = BTreeMap::new();
    map.insert("E", TargetPitch::LowE);
    map.insert("A", TargetPitch::A);
    map.insert("D", TargetPitch::D);
    map.insert("G", TargetPitch::G);
    map.insert("B", TargetPitch::B);
    map.insert("e", TargetPitch::HighE);
    map
});

impl TargetPitch {
    /// All six strings, from lowest to highest pitch.
    pub const ALL: [TargetPitch; 6] = [
        TargetPitch::LowE,
        TargetPitch::A,
        TargetPitch::D,
        TargetPitch::G,
        TargetPitch::B,
        TargetPitch::HighE,
    ];

    /// Reference frequency of this string in whole Hz.
    pub fn frequency_hz(self) -> i32 {
        match self {
            TargetPitch::LowE => 82,
            TargetPitch::A => 110,
            TargetPitch::D => 147,
            TargetPitch::G => 196,
            TargetPitch::B => 247,
            TargetPitch::HighE => 330,
        }
    }

    /// Looks up a pitch from its single-letter UI label.
    ///
    /// Returns `None` for unrecognised labels; the matcher treats an absent
    /// target as "no match possible" rather than an error.
    pub fn from_label(label: &str) -> Option<TargetPitch> {
        PITCH_MAP.get(label).copied()
    }

    /// The single-letter label used on the tuner's string buttons.
    pub fn label(self) -> &'static str {
        match self {
            TargetPitch::LowE => "E",
            TargetPitch::A => "A",
            TargetPitch::D => "D",
            TargetPitch::G => "G",
            TargetPitch::B => "B",
            TargetPitch::HighE => "e",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_frequencies_match_standard_tuning() {
        assert_eq!(TargetPitch::LowE.frequency_hz(), 82);
        assert_eq!(TargetPitch::A.frequency_hz(), 110);
        assert_eq!(TargetPitch::D.frequency_hz(), 147);
        assert_eq!(TargetPitch::G.frequency_hz(), 196);
        assert_eq!(TargetPitch::B.frequency_hz(), 247);
        assert_eq!(TargetPitch::HighE.frequency_hz(), 330);
    }

    #[test]
    fn labels_round_trip() {
        for pitch in TargetPitch::ALL {
            assert_eq!(TargetPitch::from_label(pitch.label()), Some(pitch));
        }
    }

    #[test]
    fn low_and_high_e_have_distinct_labels() {
        assert_eq!(TargetPitch::from_label("E"), Some(TargetPitch::LowE));
        assert_eq!(TargetPitch::from_label("e"), Some(TargetPitch::HighE));
    }

    #[test]
    fn unknown_label_is_none() {
        assert_eq!(TargetPitch::from_label("C"), None);
        assert_eq!(TargetPitch::from_label(""), None);
    }
}
