//! Numeric description of one recording.
//!
//! A [`FeatureVector`] is produced outside this crate (by a decoder or a
//! streaming-provider import) and is read-only input to the analyzer.
//! Optional measurements are explicit `Option`s; the scorer substitutes its
//! documented neutral value when one is absent.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Musical mode reported alongside the detected key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
}

/// Relative energy in seven named frequency bands, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBalance {
    pub sub_bass: f64,
    pub bass: f64,
    pub low_mids: f64,
    pub mids: f64,
    pub high_mids: f64,
    pub presence: f64,
    pub brilliance: f64,
}

impl FrequencyBalance {
    /// Band names in low-to-high order, matching [`FrequencyBalance::bands`].
    pub const BAND_NAMES: [&'static str; 7] = [
        "sub_bass",
        "bass",
        "low_mids",
        "mids",
        "high_mids",
        "presence",
        "brilliance",
    ];

    #[must_use]
    pub const fn bands(&self) -> [f64; 7] {
        [
            self.sub_bass,
            self.bass,
            self.low_mids,
            self.mids,
            self.high_mids,
            self.presence,
            self.brilliance,
        ]
    }
}

/// The numeric fingerprint of one audio recording.
///
/// Unit-interval fields are in `[0, 1]`; `tempo` is in BPM, `loudness` and
/// `dynamic_range` in dB, durations in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub tempo: f64,
    pub danceability: f64,
    pub energy: f64,
    pub valence: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub speechiness: f64,
    pub loudness: f64,
    #[serde(default)]
    pub dynamic_range: Option<f64>,
    #[serde(default)]
    pub stereo_width: Option<f64>,
    #[serde(default)]
    pub frequency_balance: Option<FrequencyBalance>,
    pub duration: f64,
    #[serde(default)]
    pub intro_length: Option<f64>,
    #[serde(default)]
    pub outro_length: Option<f64>,
    /// Pitch class, 0 = C through 11 = B.
    #[serde(default)]
    pub key: Option<u8>,
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub key_confidence: Option<f64>,
}

/// Lowest integrated loudness accepted as a real measurement.
const LOUDNESS_FLOOR_DB: f64 = -70.0;

fn invalid(field: &'static str, value: f64, reason: &'static str) -> AnalysisError {
    AnalysisError::InvalidFeatureVector {
        field,
        value,
        reason,
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, value, "must be a finite number"))
    }
}

fn check_unit(field: &'static str, value: f64) -> Result<()> {
    check_finite(field, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, value, "must lie in [0, 1]"))
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<()> {
    check_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be greater than zero"))
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<()> {
    check_finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must not be negative"))
    }
}

impl FeatureVector {
    /// Rejects vectors that would push NaN or out-of-domain values into the
    /// scoring formulas.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidFeatureVector`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<()> {
        check_positive("tempo", self.tempo)?;
        check_unit("danceability", self.danceability)?;
        check_unit("energy", self.energy)?;
        check_unit("valence", self.valence)?;
        check_unit("acousticness", self.acousticness)?;
        check_unit("instrumentalness", self.instrumentalness)?;
        check_unit("speechiness", self.speechiness)?;

        check_finite("loudness", self.loudness)?;
        if !(LOUDNESS_FLOOR_DB..=0.0).contains(&self.loudness) {
            return Err(invalid("loudness", self.loudness, "must lie in [-70, 0] dB"));
        }

        if let Some(dr) = self.dynamic_range {
            check_non_negative("dynamic_range", dr)?;
        }
        if let Some(width) = self.stereo_width {
            check_unit("stereo_width", width)?;
        }
        if let Some(balance) = &self.frequency_balance {
            for (name, value) in FrequencyBalance::BAND_NAMES.into_iter().zip(balance.bands()) {
                check_unit(name, value)?;
            }
        }

        check_positive("duration", self.duration)?;
        if let Some(intro) = self.intro_length {
            check_non_negative("intro_length", intro)?;
        }
        if let Some(outro) = self.outro_length {
            check_non_negative("outro_length", outro)?;
        }
        if let Some(key) = self.key {
            if key > 11 {
                return Err(invalid("key", f64::from(key), "must be a pitch class 0-11"));
            }
        }
        if let Some(confidence) = self.key_confidence {
            check_unit("key_confidence", confidence)?;
        }

        Ok(())
    }
}

/// Bit-exact identity of a feature vector, used as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureFingerprint(Vec<u64>);

// Absent optionals map to a NaN bit pattern that validated vectors never carry.
const ABSENT: u64 = u64::MAX;

fn opt_bits(value: Option<f64>) -> u64 {
    value.map_or(ABSENT, f64::to_bits)
}

impl From<&FeatureVector> for FeatureFingerprint {
    fn from(features: &FeatureVector) -> Self {
        let mut bits = vec![
            features.tempo.to_bits(),
            features.danceability.to_bits(),
            features.energy.to_bits(),
            features.valence.to_bits(),
            features.acousticness.to_bits(),
            features.instrumentalness.to_bits(),
            features.speechiness.to_bits(),
            features.loudness.to_bits(),
            opt_bits(features.dynamic_range),
            opt_bits(features.stereo_width),
            features.duration.to_bits(),
            opt_bits(features.intro_length),
            opt_bits(features.outro_length),
            features.key.map_or(ABSENT, u64::from),
            match features.mode {
                Some(Mode::Major) => 1,
                Some(Mode::Minor) => 0,
                None => ABSENT,
            },
            opt_bits(features.key_confidence),
        ];
        match &features.frequency_balance {
            Some(balance) => bits.extend(balance.bands().iter().map(|band| band.to_bits())),
            None => bits.push(ABSENT),
        }
        Self(bits)
    }
}
