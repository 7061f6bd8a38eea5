use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Beats per minute, restricted to the range a loop tempo can plausibly take.
///
/// Values outside `[Bpm::MIN, Bpm::MAX]` are never clamped: they are treated as
/// absent, which is why the main constructor returns an `Option`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, PartialOrd)]
#[serde(try_from = "f64", into = "f64")]
pub struct Bpm(f64);

impl Bpm {
    pub const MIN: f64 = 30.0;
    pub const MAX: f64 = 300.0;

    pub fn new(value: f64) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn try_new(value: f64) -> Result<Self, DomainError> {
        Self::new(value).ok_or_else(|| {
            DomainError::validation(format!(
                "tempo {value} bpm is outside {}..={}",
                Self::MIN,
                Self::MAX
            ))
        })
    }

    pub fn get(self) -> f64 {
        self.0
    }

    pub fn seconds_per_beat(self) -> f64 {
        60.0 / self.0
    }
}

impl TryFrom<f64> for Bpm {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Bpm> for f64 {
    fn from(bpm: Bpm) -> Self {
        bpm.0
    }
}

impl PartialEq<f64> for Bpm {
    fn eq(&self, other: &f64) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Bpm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.0)
    }
}

/// Loop metadata as found in ACID chunks of WAV files.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct AcidizerTags {
    /// Tempo claimed by the tag; may be zero or otherwise out of range.
    pub bpm: f64,
    pub is_one_shot: bool,
}

impl AcidizerTags {
    pub fn new(bpm: f64, is_one_shot: bool) -> Self {
        Self { bpm, is_one_shot }
    }

    pub fn one_shot() -> Self {
        Self {
            bpm: 0.0,
            is_one_shot: true,
        }
    }

    /// Tags from loose fields; `None` when no tempo is given and the one-shot flag is unset.
    pub fn from_parts(bpm: Option<f64>, is_one_shot: bool) -> Option<Self> {
        match (bpm, is_one_shot) {
            (None, false) => None,
            (bpm, is_one_shot) => Some(Self::new(bpm.unwrap_or(0.0), is_one_shot)),
        }
    }

    /// The tag tempo, if it lies in the valid range.
    pub fn valid_bpm(&self) -> Option<Bpm> {
        Bpm::new(self.bpm)
    }
}

/// Where a resolved tempo came from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TempoProvenance {
    AcidTag,
    Filename,
    AudioAnalysis,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProjectSyncInfo {
    pub raw_audio_tempo: Bpm,
    /// Power of two the raw tempo should be multiplied by before fine-stretching
    /// to the project tempo.
    pub stretch_minimizing_pow_of_two: f64,
    /// Fraction of a quarter note the clip runs past its last whole quarter note.
    pub excess_duration_in_quarter_notes: f64,
    pub provenance: TempoProvenance,
}

impl ProjectSyncInfo {
    pub fn used_filename_bpm(&self) -> bool {
        self.provenance == TempoProvenance::Filename
    }
}
