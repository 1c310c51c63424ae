//! Named musical intervals expressed as sample counts.
//!
//! A whole note lasts one second at the engine sample rate; shorter values
//! divide it by powers of two. Envelope durations, chain durations and beat
//! generator lengths are all given in these units.

use crate::config::SAMPLE_RATE;

/// Whole note (one second) in samples at [`SAMPLE_RATE`].
pub const BEAT_WHOLE: f64 = SAMPLE_RATE;
/// Half note in samples.
pub const BEAT_HALF: f64 = SAMPLE_RATE / 2.0;
/// Quarter note in samples.
pub const BEAT_4TH: f64 = SAMPLE_RATE / 4.0;
/// Eighth note in samples.
pub const BEAT_8TH: f64 = SAMPLE_RATE / 8.0;
/// Sixteenth note in samples.
pub const BEAT_16TH: f64 = SAMPLE_RATE / 16.0;
/// Thirty-second note in samples.
pub const BEAT_32ND: f64 = SAMPLE_RATE / 32.0;

/// Musical note values used to express durations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NoteValue {
    /// Whole note (one second)
    Whole,
    /// Half note
    Half,
    /// Quarter note
    #[default]
    Quarter,
    /// Eighth note
    Eighth,
    /// Sixteenth note
    Sixteenth,
    /// Thirty-second note
    ThirtySecond,
}

impl NoteValue {
    /// All note values, longest first.
    pub const ALL: [NoteValue; 6] = [
        NoteValue::Whole,
        NoteValue::Half,
        NoteValue::Quarter,
        NoteValue::Eighth,
        NoteValue::Sixteenth,
        NoteValue::ThirtySecond,
    ];

    /// Fraction of a whole note.
    pub fn fraction(self) -> f64 {
        match self {
            NoteValue::Whole => 1.0,
            NoteValue::Half => 0.5,
            NoteValue::Quarter => 0.25,
            NoteValue::Eighth => 0.125,
            NoteValue::Sixteenth => 0.0625,
            NoteValue::ThirtySecond => 0.03125,
        }
    }

    /// Length in samples at the given sample rate.
    ///
    /// # Example
    ///
    /// ```rust
    /// use gatesynth_core::{NoteValue, BEAT_4TH, SAMPLE_RATE};
    ///
    /// assert_eq!(NoteValue::Quarter.samples(SAMPLE_RATE), BEAT_4TH);
    /// ```
    pub fn samples(self, sample_rate: f64) -> f64 {
        sample_rate * self.fraction()
    }

    /// Canonical lowercase name, as used in patch files.
    pub fn name(self) -> &'static str {
        match self {
            NoteValue::Whole => "whole",
            NoteValue::Half => "half",
            NoteValue::Quarter => "quarter",
            NoteValue::Eighth => "eighth",
            NoteValue::Sixteenth => "sixteenth",
            NoteValue::ThirtySecond => "thirty_second",
        }
    }

    /// Parses a note name. Accepts the canonical names plus the short forms
    /// `1/1`, `1/2`, `1/4`, `1/8`, `1/16` and `1/32`.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        match lower.as_str() {
            "whole" | "1/1" => Some(NoteValue::Whole),
            "half" | "1/2" => Some(NoteValue::Half),
            "quarter" | "4th" | "1/4" => Some(NoteValue::Quarter),
            "eighth" | "8th" | "1/8" => Some(NoteValue::Eighth),
            "sixteenth" | "16th" | "1/16" => Some(NoteValue::Sixteenth),
            "thirty_second" | "32nd" | "1/32" => Some(NoteValue::ThirtySecond),
            _ => None,
        }
    }
}
