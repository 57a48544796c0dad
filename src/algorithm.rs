//! Benchmark-comparison scoring.
//!
//! Turns a [`FeatureVector`] and a genre [`Benchmark`] into six sub-scores in
//! `[0, 1]` and a weighted overall score in `[0, 100]`. Every function here is
//! pure: identical inputs give bit-identical output.

use crate::benchmark::{Benchmark, TargetRange};
use crate::features::{FeatureVector, FrequencyBalance};
use log::trace;
use serde::{Deserialize, Serialize};

/// Immutable scoring parameters.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext {
    /// Sub-score used when the measurement it needs is absent.
    pub neutral_fallback: f64,
    pub weights: WeightConfig,
}

/// Contribution of each sub-score to the overall score.
///
/// The default weights are what makes scores comparable across tracks and
/// catalogs; they sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightConfig {
    pub loudness: f64,
    pub dynamics: f64,
    pub frequency_balance: f64,
    pub stereo_imaging: f64,
    pub genre_alignment: f64,
    pub commercial_readiness: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            loudness: 0.20,
            dynamics: 0.15,
            frequency_balance: 0.25,
            stereo_imaging: 0.15,
            genre_alignment: 0.15,
            commercial_readiness: 0.10,
        }
    }
}

impl Default for ScoringContext {
    fn default() -> Self {
        Self {
            neutral_fallback: 0.7,
            weights: WeightConfig::default(),
        }
    }
}

/// The six named sub-scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub loudness: f64,
    pub dynamics: f64,
    pub frequency_balance: f64,
    pub stereo_imaging: f64,
    pub genre_alignment: f64,
    pub commercial_readiness: f64,
}

impl ScoreBreakdown {
    #[must_use]
    pub fn weighted_sum(&self, weights: &WeightConfig) -> f64 {
        self.loudness * weights.loudness
            + self.dynamics * weights.dynamics
            + self.frequency_balance * weights.frequency_balance
            + self.stereo_imaging * weights.stereo_imaging
            + self.genre_alignment * weights.genre_alignment
            + self.commercial_readiness * weights.commercial_readiness
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Weighted overall score, 0-100.
    pub overall: u8,
    pub breakdown: ScoreBreakdown,
}

/// Scores `features` against `benchmark` with the default context.
#[must_use]
pub fn calculate_score(features: &FeatureVector, benchmark: &Benchmark) -> Score {
    calculate_score_with(features, benchmark, &ScoringContext::default())
}

/// Scores `features` against `benchmark`.
///
/// ```text
/// overall = round(100 * Σ weight_i * subscore_i)
/// ```
///
/// # Examples
///
/// ```
/// use mixgrade::algorithm::{calculate_score_with, ScoringContext};
/// use mixgrade::benchmark::BenchmarkCatalog;
/// use mixgrade::features::FeatureVector;
///
/// let features = FeatureVector {
///     tempo: 115.0,
///     danceability: 0.7,
///     energy: 0.65,
///     valence: 0.5,
///     acousticness: 0.1,
///     instrumentalness: 0.0,
///     speechiness: 0.05,
///     loudness: -5.0,
///     dynamic_range: Some(7.0),
///     stereo_width: Some(0.8),
///     frequency_balance: None,
///     duration: 210.0,
///     intro_length: None,
///     outro_length: None,
///     key: None,
///     mode: None,
///     key_confidence: None,
/// };
/// let pop = BenchmarkCatalog::builtin().resolve("pop");
/// let score = calculate_score_with(&features, pop, &ScoringContext::default());
/// assert!(score.overall <= 100);
/// assert_eq!(score.breakdown.loudness, 1.0);
/// ```
#[must_use]
pub fn calculate_score_with(
    features: &FeatureVector,
    benchmark: &Benchmark,
    context: &ScoringContext,
) -> Score {
    let fallback = context.neutral_fallback;
    let breakdown = ScoreBreakdown {
        loudness: loudness_score(features.loudness, &benchmark.loudness),
        dynamics: features
            .dynamic_range
            .map_or(fallback, |dr| dynamics_score(dr, &benchmark.dynamic_range)),
        frequency_balance: features
            .frequency_balance
            .as_ref()
            .map_or(fallback, frequency_balance_score),
        stereo_imaging: features
            .stereo_width
            .map_or(fallback, |width| stereo_imaging_score(width, &benchmark.stereo_width)),
        genre_alignment: genre_alignment_score(features, benchmark),
        commercial_readiness: commercial_readiness_score(features),
    };

    let weighted = breakdown.weighted_sum(&context.weights).clamp(0.0, 1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let overall = (weighted * 100.0).round() as u8;

    trace!(
        "Scored against {}: {breakdown:?} -> {overall}",
        benchmark.genre
    );
    Score { overall, breakdown }
}

// Keeps the decay slope finite for degenerate (zero-width) loudness ranges.
const MIN_LOUDNESS_TOLERANCE_DB: f64 = 0.5;

/// Band centred on the benchmark midpoint: full marks inside the range,
/// then linear decay to zero over twice the range's half-width.
#[must_use]
pub fn loudness_score(loudness: f64, target: &TargetRange) -> f64 {
    let tolerance = target.half_width().max(MIN_LOUDNESS_TOLERANCE_DB);
    (1.0 - target.distance_outside(loudness) / (2.0 * tolerance)).max(0.0)
}

/// Asymmetric dynamics curve: below the range the score is the fraction of
/// the minimum reached, above it the overshoot is measured against the max.
#[must_use]
pub fn dynamics_score(dynamic_range: f64, target: &TargetRange) -> f64 {
    let score = if target.contains(dynamic_range) {
        1.0
    } else if dynamic_range < target.min {
        if target.min > 0.0 {
            dynamic_range / target.min
        } else {
            1.0
        }
    } else if target.max > 0.0 {
        1.0 - (dynamic_range - target.max) / target.max
    } else {
        0.0
    };
    score.clamp(0.0, 1.0)
}

/// Flatness of the seven bands combined with bass and presence adequacy.
#[must_use]
pub fn frequency_balance_score(balance: &FrequencyBalance) -> f64 {
    let bands = balance.bands();
    #[allow(clippy::cast_precision_loss)]
    let count = bands.len() as f64;
    let mean = bands.iter().sum::<f64>() / count;
    let variance = bands.iter().map(|band| (band - mean).powi(2)).sum::<f64>() / count;

    let flatness = (1.0 - variance * 2.0).max(0.0);
    let bass_adequacy = (balance.bass * 2.0).min(1.0);
    let presence_adequacy = (balance.presence * 2.0).min(1.0);

    0.5 * flatness + 0.25 * bass_adequacy + 0.25 * presence_adequacy
}

/// Full marks inside the range; narrow images lose proportionally, wide ones
/// lose over the headroom left between the max and full width.
#[must_use]
pub fn stereo_imaging_score(width: f64, target: &TargetRange) -> f64 {
    let score = if target.contains(width) {
        1.0
    } else if width < target.min {
        width / target.min
    } else if target.max < 1.0 {
        1.0 - (width - target.max) / (1.0 - target.max)
    } else {
        1.0
    };
    score.clamp(0.0, 1.0)
}

/// BPM over which an out-of-range tempo decays to zero credit.
pub const TEMPO_TOLERANCE_BPM: f64 = 30.0;

/// Mean of three partial-credit checks: tempo, energy and danceability.
#[must_use]
pub fn genre_alignment_score(features: &FeatureVector, benchmark: &Benchmark) -> f64 {
    let tempo = (1.0 - benchmark.tempo.distance_outside(features.tempo) / TEMPO_TOLERANCE_BPM)
        .max(0.0);
    let energy = if benchmark.energy.contains(features.energy) {
        1.0
    } else {
        0.5
    };
    let danceability = if benchmark.danceability.contains(features.danceability) {
        1.0
    } else {
        0.5
    };
    (tempo + energy + danceability) / 3.0
}

const IDEAL_DURATION: TargetRange = TargetRange::new(180.0, 240.0);
const ACCEPTABLE_DURATION: TargetRange = TargetRange::new(150.0, 300.0);
const RADIO_ENERGY: TargetRange = TargetRange::new(0.4, 0.8);
const RADIO_LOUDNESS: TargetRange = TargetRange::new(-10.0, -3.0);

fn duration_credit(duration: f64) -> f64 {
    if IDEAL_DURATION.contains(duration) {
        0.3
    } else if ACCEPTABLE_DURATION.contains(duration) {
        // 0.15 at the acceptable edge rising to 0.3 at the ideal edge.
        let gap = if duration < IDEAL_DURATION.min {
            (IDEAL_DURATION.min - duration) / (IDEAL_DURATION.min - ACCEPTABLE_DURATION.min)
        } else {
            (duration - IDEAL_DURATION.max) / (ACCEPTABLE_DURATION.max - IDEAL_DURATION.max)
        };
        0.3 - 0.15 * gap
    } else {
        0.0
    }
}

/// Additive budget for playlist/radio readiness, capped at 1.0.
#[must_use]
pub fn commercial_readiness_score(features: &FeatureVector) -> f64 {
    let duration = duration_credit(features.duration);
    let energy = if RADIO_ENERGY.contains(features.energy) {
        0.3
    } else {
        0.0
    };
    let danceability = if features.danceability >= 0.5 { 0.3 } else { 0.0 };
    let loudness = if RADIO_LOUDNESS.contains(features.loudness) {
        0.2
    } else {
        0.0
    };
    (duration + energy + danceability + loudness).min(1.0)
}
