//! Catalog-level trend and identity analysis.
//!
//! Consumes an ordered slice of [`TrackAnalysis`] (release order, never
//! re-sorted) and derives quality progression, genre consistency, the
//! artist's sonic identity, metric trends, insights and recommendations.
//! The report is plain derived data: recompute it whenever the track list
//! changes.

use crate::analyzer::TrackAnalysis;
use crate::error::{AnalysisError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressionTrend {
    Improving,
    Declining,
    Inconsistent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityProgression {
    pub trend: ProgressionTrend,
    pub average_score: f64,
    /// `[min, max]` overall score across the catalog.
    pub score_range: [u8; 2],
    pub best_track: String,
    pub weakest_track: String,
    /// Second-half average minus first-half average, in score points.
    pub improvement_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreConsistency {
    pub dominant_genre: String,
    /// Share of tracks scored as the dominant genre, 0-100.
    pub consistency: f64,
    /// Genre -> share of tracks, 0-100.
    pub distribution: BTreeMap<String, f64>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SonicIdentity {
    /// Mean ± one standard deviation, in BPM.
    pub tempo_range: [f64; 2],
    /// Mean ± one standard deviation, unclamped like `tempo_range`.
    pub energy_range: [f64; 2],
    pub traits: Vec<String>,
    /// 0-100.
    pub consistency_score: f64,
    pub outlier_tracks: Vec<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub metric: String,
    pub direction: TrendDirection,
    /// Percent change from the first-half to the second-half average.
    pub change_percent: f64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Strength,
    Weakness,
    Opportunity,
    Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogReport {
    pub track_count: usize,
    pub progression: QualityProgression,
    pub genre_consistency: GenreConsistency,
    pub sonic_identity: SonicIdentity,
    /// Empty for catalogs of fewer than three tracks.
    pub trends: Vec<Trend>,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<String>,
    pub next_release_guidance: Vec<String>,
}

/// Descriptive statistics over catalog metrics.
pub mod statistics {
    /// Arithmetic mean; zero for an empty slice.
    #[must_use]
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = values.len() as f64;
        values.iter().sum::<f64>() / count
    }

    /// Population standard deviation; zero for an empty slice.
    #[must_use]
    pub fn std_deviation(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mean = mean(values);
        #[allow(clippy::cast_precision_loss)]
        let count = values.len() as f64;
        let variance = values
            .iter()
            .map(|&value| (value - mean).powi(2))
            .sum::<f64>()
            / count;
        variance.sqrt()
    }

    /// Splits an ordered sequence at `len / 2` (floor): for odd lengths the
    /// middle element belongs to the second half.
    #[must_use]
    pub fn split_halves<T>(values: &[T]) -> (&[T], &[T]) {
        values.split_at(values.len() / 2)
    }

    /// Percent change from the first-half mean to the second-half mean,
    /// relative to the magnitude of the first. `None` when the first-half
    /// mean is zero or either half is empty.
    #[must_use]
    pub fn half_over_half_change(values: &[f64]) -> Option<f64> {
        let (first, second) = split_halves(values);
        if first.is_empty() || second.is_empty() {
            return None;
        }
        let before = mean(first);
        if before == 0.0 {
            return None;
        }
        Some((mean(second) - before) / before.abs() * 100.0)
    }
}

use statistics::{mean, split_halves, std_deviation};

/// Score difference (points) separating improving/declining from inconsistent.
const PROGRESSION_THRESHOLD: f64 = 5.0;
/// Minimum track count before metric trends are reported.
const MIN_TRACKS_FOR_TRENDS: usize = 3;
/// Loudness moves are gated in dB; the score metrics in percent.
const LOUDNESS_TREND_THRESHOLD: f64 = 1.0;
const SCORE_TREND_THRESHOLD: f64 = 3.0;
const DIRECTION_THRESHOLD: f64 = 3.0;
const OUTLIER_SIGMAS: f64 = 2.0;
const HIGH_SONIC_CONSISTENCY: f64 = 75.0;
const LOW_SONIC_CONSISTENCY: f64 = 50.0;
const LOW_GENRE_CONSISTENCY: f64 = 60.0;
const HIGH_GENRE_CONSISTENCY: f64 = 80.0;
const LOW_AVERAGE_SCORE: f64 = 70.0;

/// Builds the catalog report for `tracks`, given in release order.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyCatalog`] for an empty slice; no statistic
/// is defined over zero tracks.
pub fn aggregate(tracks: &[TrackAnalysis]) -> Result<CatalogReport> {
    let progression = quality_progression(tracks)?;
    let genre_consistency = genre_consistency(tracks)?;
    let sonic_identity = sonic_identity(tracks)?;
    let trends = if tracks.len() >= MIN_TRACKS_FOR_TRENDS {
        detect_trends(tracks)
    } else {
        Vec::new()
    };
    let insights = insights(
        tracks,
        &progression,
        &genre_consistency,
        &sonic_identity,
        &trends,
    );
    let recommendations = recommendations(&progression, &genre_consistency, &sonic_identity, &trends);
    let next_release_guidance = next_release_guidance(tracks, &progression, &sonic_identity);

    debug!(
        "Aggregated {} track(s): {:?}, average {:.1}, {} trend(s), {} outlier(s)",
        tracks.len(),
        progression.trend,
        progression.average_score,
        trends.len(),
        sonic_identity.outlier_tracks.len()
    );

    Ok(CatalogReport {
        track_count: tracks.len(),
        progression,
        genre_consistency,
        sonic_identity,
        trends,
        insights,
        recommendations,
        next_release_guidance,
    })
}

/// Index of the first maximum (or minimum, with `Ordering::Less`) score.
fn extreme_index(tracks: &[TrackAnalysis], wanted: std::cmp::Ordering) -> usize {
    tracks
        .iter()
        .enumerate()
        .fold(0, |best, (i, track)| {
            if track.score.overall.cmp(&tracks[best].score.overall) == wanted {
                i
            } else {
                best
            }
        })
}

fn require_tracks(tracks: &[TrackAnalysis]) -> Result<()> {
    if tracks.is_empty() {
        return Err(AnalysisError::EmptyCatalog);
    }
    Ok(())
}

/// Score progression from the first half of the catalog to the second.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyCatalog`] for an empty slice.
pub fn quality_progression(tracks: &[TrackAnalysis]) -> Result<QualityProgression> {
    require_tracks(tracks)?;
    let scores: Vec<f64> = tracks
        .iter()
        .map(|track| f64::from(track.score.overall))
        .collect();

    let improvement_rate = if tracks.len() >= 2 {
        let (first, second) = split_halves(&scores);
        Some(mean(second) - mean(first))
    } else {
        None
    };
    let trend = match improvement_rate {
        Some(rate) if rate > PROGRESSION_THRESHOLD => ProgressionTrend::Improving,
        Some(rate) if rate < -PROGRESSION_THRESHOLD => ProgressionTrend::Declining,
        _ => ProgressionTrend::Inconsistent,
    };

    let best = &tracks[extreme_index(tracks, std::cmp::Ordering::Greater)];
    let weakest = &tracks[extreme_index(tracks, std::cmp::Ordering::Less)];

    Ok(QualityProgression {
        trend,
        average_score: mean(&scores),
        score_range: [weakest.score.overall, best.score.overall],
        best_track: best.track_name.clone(),
        weakest_track: weakest.track_name.clone(),
        improvement_rate,
    })
}

/// Genres in first-seen order with their track counts.
fn genre_counts(tracks: &[TrackAnalysis]) -> Vec<(&str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for track in tracks {
        match counts.iter_mut().find(|(genre, _)| *genre == track.genre()) {
            Some((_, count)) => *count += 1,
            None => counts.push((track.genre(), 1)),
        }
    }
    counts
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, total: usize) -> f64 {
    part as f64 / total as f64 * 100.0
}

/// # Errors
///
/// Returns [`AnalysisError::EmptyCatalog`] for an empty slice.
pub fn genre_consistency(tracks: &[TrackAnalysis]) -> Result<GenreConsistency> {
    require_tracks(tracks)?;
    let counts = genre_counts(tracks);
    let total = tracks.len();
    let (dominant, dominant_count) = counts
        .iter()
        .fold(("", 0), |best, &(genre, count)| {
            if count > best.1 {
                (genre, count)
            } else {
                best
            }
        });
    let consistency = percent(dominant_count, total);
    let distribution = counts
        .iter()
        .map(|&(genre, count)| (genre.to_string(), percent(count, total)))
        .collect();

    let recommendation = if consistency >= HIGH_GENRE_CONSISTENCY {
        format!(
            "Strong genre focus: {consistency:.0}% of your catalog is {dominant}. \
             Listeners and playlist curators know what to expect from you."
        )
    } else if consistency >= LOW_GENRE_CONSISTENCY {
        format!(
            "Mostly {dominant} ({consistency:.0}%) with some exploration. \
             Keep side projects clearly framed so your core audience stays with you."
        )
    } else {
        format!(
            "Your catalog spans {} genres and none dominates ({dominant} leads with {consistency:.0}%). \
             Consider focusing on one lane to build a recognisable audience.",
            counts.len()
        )
    };

    Ok(GenreConsistency {
        dominant_genre: dominant.to_string(),
        consistency,
        distribution,
        recommendation,
    })
}

fn signature_traits(tracks: &[TrackAnalysis], tempo_mean: f64, energy_mean: f64) -> Vec<String> {
    let average = |field: fn(&TrackAnalysis) -> f64| {
        mean(&tracks.iter().map(field).collect::<Vec<_>>())
    };

    let mut traits = Vec::new();
    traits.push(match tempo_mean {
        t if t < 90.0 => format!("Laid-back tempo (~{t:.0} BPM)"),
        t if t < 115.0 => format!("Mid-tempo groove (~{t:.0} BPM)"),
        t if t < 135.0 => format!("Upbeat tempo (~{t:.0} BPM)"),
        t => format!("Fast, driving tempo (~{t:.0} BPM)"),
    });
    traits.push(
        match energy_mean {
            e if e > 0.7 => "High-energy production",
            e if e >= 0.4 => "Balanced energy",
            _ => "Low-key, intimate energy",
        }
        .to_string(),
    );
    if average(|t| t.features.danceability) > 0.7 {
        traits.push("Dance-floor ready grooves".to_string());
    }
    if average(|t| t.features.acousticness) > 0.5 {
        traits.push("Organic, acoustic textures".to_string());
    }
    let valence = average(|t| t.features.valence);
    if valence > 0.6 {
        traits.push("Uplifting, positive mood".to_string());
    } else if valence < 0.35 {
        traits.push("Moody, melancholic tone".to_string());
    }
    if average(|t| t.features.instrumentalness) > 0.5 {
        traits.push("Instrumental focus".to_string());
    }
    traits
}

/// # Errors
///
/// Returns [`AnalysisError::EmptyCatalog`] for an empty slice.
pub fn sonic_identity(tracks: &[TrackAnalysis]) -> Result<SonicIdentity> {
    require_tracks(tracks)?;
    let tempos: Vec<f64> = tracks.iter().map(|t| t.features.tempo).collect();
    let energies: Vec<f64> = tracks.iter().map(|t| t.features.energy).collect();
    let (tempo_mean, tempo_sd) = (mean(&tempos), std_deviation(&tempos));
    let (energy_mean, energy_sd) = (mean(&energies), std_deviation(&energies));

    let outlier_tracks = tracks
        .iter()
        .filter(|track| {
            (track.features.tempo - tempo_mean).abs() > OUTLIER_SIGMAS * tempo_sd
                || (track.features.energy - energy_mean).abs() > OUTLIER_SIGMAS * energy_sd
        })
        .map(|track| track.track_name.clone())
        .collect();

    // Tempo is validated positive, so the mean is never zero.
    let tempo_consistency = (100.0 - tempo_sd / tempo_mean * 100.0).max(0.0);
    let energy_consistency = (100.0 - energy_sd * 100.0).max(0.0);
    let consistency_score = (tempo_consistency + energy_consistency) / 2.0;

    let traits = signature_traits(tracks, tempo_mean, energy_mean);
    let recommendation = if consistency_score >= HIGH_SONIC_CONSISTENCY {
        format!(
            "You have a clear sonic signature ({}). Keep it as the anchor and experiment within it.",
            traits.join(", ")
        )
    } else if consistency_score >= LOW_SONIC_CONSISTENCY {
        format!(
            "Your sound is recognisable but loose. Anchoring releases around {tempo_mean:.0} BPM \
             and energy {energy_mean:.2} would sharpen it."
        )
    } else {
        "There is no consistent signature yet: tempo and energy vary widely between releases. \
         Decide which of your tracks best represents you and build from it."
            .to_string()
    };

    Ok(SonicIdentity {
        tempo_range: [tempo_mean - tempo_sd, tempo_mean + tempo_sd],
        energy_range: [energy_mean - energy_sd, energy_mean + energy_sd],
        traits,
        consistency_score,
        outlier_tracks,
        recommendation,
    })
}

/// How a metric's half-over-half movement is compared with its threshold.
#[derive(Clone, Copy)]
enum TrendGate {
    /// Difference of the half means, in the metric's own unit.
    Absolute,
    /// Percent change relative to the first-half mean.
    Relative,
}

struct TrendMetric {
    name: &'static str,
    gate: TrendGate,
    threshold: f64,
    value: fn(&TrackAnalysis) -> f64,
}

const TREND_METRICS: [TrendMetric; 3] = [
    TrendMetric {
        name: "Loudness",
        gate: TrendGate::Absolute,
        threshold: LOUDNESS_TREND_THRESHOLD,
        value: |track| track.features.loudness,
    },
    TrendMetric {
        name: "Dynamics",
        gate: TrendGate::Relative,
        threshold: SCORE_TREND_THRESHOLD,
        value: |track| track.score.breakdown.dynamics * 100.0,
    },
    TrendMetric {
        name: "Frequency Balance",
        gate: TrendGate::Relative,
        threshold: SCORE_TREND_THRESHOLD,
        value: |track| track.score.breakdown.frequency_balance * 100.0,
    },
];

/// Half-over-half trends for loudness, dynamics and frequency balance.
/// Callers should only use this for catalogs of three or more tracks.
#[must_use]
pub fn detect_trends(tracks: &[TrackAnalysis]) -> Vec<Trend> {
    TREND_METRICS
        .iter()
        .filter_map(|metric| {
            let values: Vec<f64> = tracks.iter().map(metric.value).collect();
            let change = statistics::half_over_half_change(&values)?;
            let (first, second) = split_halves(&values);
            let movement = match metric.gate {
                TrendGate::Absolute => mean(second) - mean(first),
                TrendGate::Relative => change,
            };
            if movement.abs() <= metric.threshold {
                return None;
            }
            let direction = if change > DIRECTION_THRESHOLD {
                TrendDirection::Improving
            } else if change < -DIRECTION_THRESHOLD {
                TrendDirection::Declining
            } else {
                TrendDirection::Stable
            };
            let verb = if change > 0.0 { "rose" } else { "fell" };
            let unit = if metric.name == "Loudness" { " dB" } else { "" };
            let description = format!(
                "{} {verb} from {:.1}{unit} to {:.1}{unit} ({change:+.1}%) between earlier and recent releases",
                metric.name,
                mean(first),
                mean(second)
            );
            Some(Trend {
                metric: metric.name.to_string(),
                direction,
                change_percent: change,
                description,
            })
        })
        .collect()
}

fn insights(
    tracks: &[TrackAnalysis],
    progression: &QualityProgression,
    genres: &GenreConsistency,
    identity: &SonicIdentity,
    trends: &[Trend],
) -> Vec<Insight> {
    let mut insights = Vec::new();

    match progression.trend {
        ProgressionTrend::Improving => insights.push(Insight {
            kind: InsightKind::Strength,
            title: "Consistent Growth".to_string(),
            description: format!(
                "Average score rose by {:.1} points from your earlier to your recent releases.",
                progression.improvement_rate.unwrap_or_default()
            ),
        }),
        ProgressionTrend::Declining => {
            let recent: Vec<&str> = tracks
                .iter()
                .rev()
                .take(2)
                .map(|track| track.track_name.as_str())
                .collect();
            insights.push(Insight {
                kind: InsightKind::Weakness,
                title: "Quality Dip in Recent Releases".to_string(),
                description: format!(
                    "Recent tracks ({}) score {:.1} points lower on average than earlier ones.",
                    recent.join(", "),
                    -progression.improvement_rate.unwrap_or_default()
                ),
            });
        }
        ProgressionTrend::Inconsistent => {}
    }

    if genres.consistency < LOW_GENRE_CONSISTENCY {
        let seen: Vec<&str> = genre_counts(tracks).into_iter().map(|(genre, _)| genre).collect();
        insights.push(Insight {
            kind: InsightKind::Opportunity,
            title: "Genre Exploration".to_string(),
            description: format!(
                "Your releases cover {}. Focusing on one could sharpen your audience.",
                seen.join(", ")
            ),
        });
    }

    if identity.consistency_score >= HIGH_SONIC_CONSISTENCY {
        insights.push(Insight {
            kind: InsightKind::Strength,
            title: "Recognisable Sonic Identity".to_string(),
            description: format!(
                "Your catalog shares a consistent signature: {}.",
                identity.traits.join(", ")
            ),
        });
    }

    if !identity.outlier_tracks.is_empty() {
        insights.push(Insight {
            kind: InsightKind::Trend,
            title: "Sonic Outliers".to_string(),
            description: format!(
                "{} depart from your usual tempo or energy; intentional experiments or off-brand releases?",
                identity.outlier_tracks.join(", ")
            ),
        });
    }

    for trend in trends.iter().filter(|t| t.direction == TrendDirection::Declining) {
        insights.push(Insight {
            kind: InsightKind::Weakness,
            title: format!("{} Slipping", trend.metric),
            description: trend.description.clone(),
        });
    }

    insights
}

fn recommendations(
    progression: &QualityProgression,
    genres: &GenreConsistency,
    identity: &SonicIdentity,
    trends: &[Trend],
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if identity.consistency_score < LOW_SONIC_CONSISTENCY {
        recommendations.push(format!(
            "Tighten your sonic signature: aim releases at {:.0}-{:.0} BPM with energy {:.2}-{:.2}.",
            identity.tempo_range[0],
            identity.tempo_range[1],
            identity.energy_range[0],
            identity.energy_range[1]
        ));
    }
    if genres.consistency < LOW_GENRE_CONSISTENCY {
        recommendations.push(format!(
            "Focus your next releases on {} to build a recognisable audience.",
            genres.dominant_genre
        ));
    }
    for trend in trends.iter().filter(|t| t.direction == TrendDirection::Declining) {
        recommendations.push(format!(
            "Revisit {}: it has declined {:.1}% across recent releases.",
            trend.metric.to_lowercase(),
            trend.change_percent.abs()
        ));
    }
    if progression.average_score < LOW_AVERAGE_SCORE {
        recommendations.push(format!(
            "Raise the baseline: the average score of {:.0} is below release standard. \
             Work through the critical issues in each track report first.",
            progression.average_score
        ));
    }
    if recommendations.is_empty() {
        recommendations
            .push("Keep your current process: quality and consistency are on track.".to_string());
    }
    recommendations
}

fn next_release_guidance(
    tracks: &[TrackAnalysis],
    progression: &QualityProgression,
    identity: &SonicIdentity,
) -> Vec<String> {
    let best = &tracks[extreme_index(tracks, std::cmp::Ordering::Greater)];
    let mut guidance = vec![
        format!(
            "Use `{}` (score {}) as the template for your next release.",
            progression.best_track, best.score.overall
        ),
        format!(
            "Target around {:.0} BPM with energy near {:.2}, as on `{}`.",
            best.features.tempo, best.features.energy, best.track_name
        ),
    ];
    if identity.consistency_score >= HIGH_SONIC_CONSISTENCY {
        guidance.push(format!(
            "Preserve your signature traits: {}.",
            identity.traits.join(", ")
        ));
    }
    guidance
}

#[cfg(test)]
mod tests {
    use super::statistics::*;
    use super::*;
    use crate::analyzer::analyze_track;
    use crate::diagnostics::ProductionStage;
    use crate::features::tests::pop_features;
    use crate::features::FeatureVector;

    fn track(name: &str, features: FeatureVector, genre: &str) -> TrackAnalysis {
        analyze_track(name, &features, genre, ProductionStage::Mastered).unwrap()
    }

    fn with_scores(scores: &[u8]) -> Vec<TrackAnalysis> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &overall)| {
                let mut analysis = track(&format!("Track {}", i + 1), pop_features(), "Pop");
                analysis.score.overall = overall;
                analysis
            })
            .collect()
    }

    #[test]
    fn test_split_halves_uses_floor() {
        let (first, second) = split_halves(&[1, 2, 3, 4, 5]);
        assert_eq!(first, &[1, 2]);
        assert_eq!(second, &[3, 4, 5]);

        let (first, second) = split_halves(&[1]);
        assert!(first.is_empty());
        assert_eq!(second, &[1]);

        let (first, second) = split_halves::<u8>(&[]);
        assert!(first.is_empty() && second.is_empty());
    }

    #[test]
    fn test_mean_and_population_std_deviation() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, 4.0]), 3.0);
        assert_eq!(std_deviation(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
        assert_eq!(std_deviation(&[5.0]), 0.0);
    }

    #[test]
    fn test_half_over_half_change() {
        let change = half_over_half_change(&[-10.0, -10.0, -8.0, -8.0]).unwrap();
        assert!((change - 20.0).abs() < 1e-9);
        assert!(half_over_half_change(&[1.0]).is_none());
        assert!(half_over_half_change(&[0.0, 5.0]).is_none());
    }

    #[test]
    fn test_empty_catalog_is_rejected() {
        assert_eq!(aggregate(&[]), Err(AnalysisError::EmptyCatalog));
        assert_eq!(quality_progression(&[]), Err(AnalysisError::EmptyCatalog));
        assert_eq!(genre_consistency(&[]), Err(AnalysisError::EmptyCatalog));
        assert_eq!(sonic_identity(&[]), Err(AnalysisError::EmptyCatalog));
        assert!(detect_trends(&[]).is_empty());
    }

    #[test]
    fn test_improving_catalog() {
        let tracks = with_scores(&[60, 62, 58, 80, 85]);
        let report = aggregate(&tracks).unwrap();
        let progression = &report.progression;
        assert_eq!(progression.trend, ProgressionTrend::Improving);
        assert_eq!(progression.best_track, "Track 5");
        assert_eq!(progression.weakest_track, "Track 3");
        assert_eq!(progression.score_range, [58, 85]);
        assert!((progression.average_score - 69.0).abs() < 1e-9);
        let rate = progression.improvement_rate.unwrap();
        assert!((rate - (223.0 / 3.0 - 61.0)).abs() < 1e-9);
        assert!(report
            .insights
            .iter()
            .any(|i| i.kind == InsightKind::Strength && i.title == "Consistent Growth"));
        assert!(report.next_release_guidance[0].contains("Track 5"));
    }

    #[test]
    fn test_declining_catalog_names_recent_tracks() {
        let tracks = with_scores(&[90, 88, 70, 65]);
        let report = aggregate(&tracks).unwrap();
        assert_eq!(report.progression.trend, ProgressionTrend::Declining);
        let dip = report
            .insights
            .iter()
            .find(|i| i.kind == InsightKind::Weakness)
            .expect("weakness insight");
        assert!(dip.description.contains("Track 4"));
        assert!(dip.description.contains("Track 3"));
        assert!(!dip.description.contains("Track 2"));
    }

    #[test]
    fn test_flat_catalog_is_inconsistent() {
        let report = aggregate(&with_scores(&[70, 75, 72, 71])).unwrap();
        assert_eq!(report.progression.trend, ProgressionTrend::Inconsistent);
    }

    #[test]
    fn test_single_track_catalog() {
        let report = aggregate(&with_scores(&[80])).unwrap();
        assert_eq!(report.track_count, 1);
        assert_eq!(report.progression.trend, ProgressionTrend::Inconsistent);
        assert!(report.progression.improvement_rate.is_none());
        assert!(report.trends.is_empty());
        assert!(report.sonic_identity.outlier_tracks.is_empty());
        assert_eq!(report.sonic_identity.consistency_score, 100.0);
    }

    #[test]
    fn test_two_tracks_produce_no_trends() {
        let tracks = vec![
            track("Old", FeatureVector { loudness: -12.0, ..pop_features() }, "Pop"),
            track("New", FeatureVector { loudness: -5.0, ..pop_features() }, "Pop"),
        ];
        assert!(aggregate(&tracks).unwrap().trends.is_empty());
    }

    #[test]
    fn test_loudness_trend_detected() {
        let tracks: Vec<TrackAnalysis> = [-10.0, -10.0, -8.0, -8.0]
            .iter()
            .enumerate()
            .map(|(i, &loudness)| {
                track(&format!("T{i}"), FeatureVector { loudness, ..pop_features() }, "Pop")
            })
            .collect();
        let trends = detect_trends(&tracks);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].metric, "Loudness");
        assert_eq!(trends[0].direction, TrendDirection::Improving);
        assert!((trends[0].change_percent - 20.0).abs() < 1e-9);
    }

    fn loudness_catalog(levels: &[f64]) -> Vec<TrackAnalysis> {
        levels
            .iter()
            .enumerate()
            .map(|(i, &loudness)| {
                track(&format!("T{i}"), FeatureVector { loudness, ..pop_features() }, "Pop")
            })
            .collect()
    }

    #[test]
    fn test_small_loudness_change_is_stable_trend() {
        // 1.2 dB louder clears the gate, but relative to -50 dB it is only 2.4%.
        let trends = detect_trends(&loudness_catalog(&[-50.0, -50.0, -48.8, -48.8]));
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].metric, "Loudness");
        assert_eq!(trends[0].direction, TrendDirection::Stable);
        assert!((trends[0].change_percent - 2.4).abs() < 1e-9);
    }

    #[test]
    fn test_loudness_gate_is_in_decibels() {
        // 1.5% and 20% relative, but under 1 dB either way.
        assert!(detect_trends(&loudness_catalog(&[-10.0, -10.0, -9.85, -9.85])).is_empty());
        assert!(detect_trends(&loudness_catalog(&[-4.0, -4.0, -3.2, -3.2])).is_empty());
        assert!(detect_trends(&loudness_catalog(&[-4.0, -4.0, -5.0, -5.0])).is_empty());

        let trends = detect_trends(&loudness_catalog(&[-4.0, -4.0, -5.5, -5.5]));
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].direction, TrendDirection::Declining);
    }

    #[test]
    fn test_declining_dynamics_trend_feeds_recommendations() {
        let tracks: Vec<TrackAnalysis> = [8.0, 8.0, 3.0, 3.0]
            .iter()
            .enumerate()
            .map(|(i, &dr)| {
                track(
                    &format!("T{i}"),
                    FeatureVector { dynamic_range: Some(dr), ..pop_features() },
                    "Pop",
                )
            })
            .collect();
        let report = aggregate(&tracks).unwrap();
        let dynamics = report
            .trends
            .iter()
            .find(|t| t.metric == "Dynamics")
            .expect("dynamics trend");
        assert_eq!(dynamics.direction, TrendDirection::Declining);
        assert!(report
            .insights
            .iter()
            .any(|i| i.title == "Dynamics Slipping"));
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.starts_with("Revisit dynamics")));
    }

    #[test]
    fn test_genre_consistency_distribution() {
        let tracks = vec![
            track("A", pop_features(), "Pop"),
            track("B", pop_features(), "pop"),
            track("C", pop_features(), "Nu-Skiffle"),
            track("D", pop_features(), "Rock"),
        ];
        let consistency = genre_consistency(&tracks).unwrap();
        assert_eq!(consistency.dominant_genre, "Pop");
        assert_eq!(consistency.consistency, 75.0);
        assert_eq!(consistency.distribution.get("Pop"), Some(&75.0));
        assert_eq!(consistency.distribution.get("Rock"), Some(&25.0));
        assert!(consistency.recommendation.starts_with("Mostly Pop"));
    }

    #[test]
    fn test_scattered_genres_raise_opportunity() {
        let tracks = vec![
            track("A", pop_features(), "Pop"),
            track("B", pop_features(), "Rock"),
            track("C", pop_features(), "Jazz"),
        ];
        let report = aggregate(&tracks).unwrap();
        let opportunity = report
            .insights
            .iter()
            .find(|i| i.kind == InsightKind::Opportunity)
            .expect("opportunity insight");
        assert!(opportunity.description.contains("Pop, Rock, Jazz"));
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.starts_with("Focus your next releases on Pop")));
    }

    #[test]
    fn test_tempo_outlier_detected() {
        // Ten tracks alternating 118/122 BPM (mean 120, sd 2) plus one at
        // mean + 3 sd.
        let mut tracks: Vec<TrackAnalysis> = (0..10)
            .map(|i| {
                let tempo = if i % 2 == 0 { 118.0 } else { 122.0 };
                track(&format!("Core {i}"), FeatureVector { tempo, ..pop_features() }, "Pop")
            })
            .collect();
        tracks.push(track(
            "Wildcard",
            FeatureVector { tempo: 126.0, ..pop_features() },
            "Pop",
        ));

        let identity = sonic_identity(&tracks).unwrap();
        assert_eq!(identity.outlier_tracks, ["Wildcard"]);

        let report = aggregate(&tracks).unwrap();
        assert!(report
            .insights
            .iter()
            .any(|i| i.kind == InsightKind::Trend && i.description.contains("Wildcard")));
    }

    #[test]
    fn test_energy_outlier_detected() {
        let mut tracks: Vec<TrackAnalysis> = (0..10)
            .map(|i| {
                let energy = if i % 2 == 0 { 0.6 } else { 0.7 };
                track(&format!("Core {i}"), FeatureVector { energy, ..pop_features() }, "Pop")
            })
            .collect();
        tracks.push(track(
            "Ballad",
            FeatureVector { energy: 0.2, ..pop_features() },
            "Pop",
        ));
        assert_eq!(sonic_identity(&tracks).unwrap().outlier_tracks, ["Ballad"]);
    }

    #[test]
    fn test_uniform_catalog_has_strong_identity() {
        let tracks: Vec<TrackAnalysis> = (0..4)
            .map(|i| track(&format!("T{i}"), pop_features(), "Pop"))
            .collect();
        let report = aggregate(&tracks).unwrap();
        let identity = &report.sonic_identity;
        assert!((identity.consistency_score - 100.0).abs() < 1e-6);
        assert_eq!(identity.tempo_range, [115.0, 115.0]);
        assert!(identity.traits.iter().any(|t| t.starts_with("Upbeat tempo")));
        assert!(report
            .insights
            .iter()
            .any(|i| i.title == "Recognisable Sonic Identity"));
        assert!(report
            .next_release_guidance
            .iter()
            .any(|g| g.starts_with("Preserve your signature traits")));
    }

    #[test]
    fn test_energy_range_is_mean_plus_minus_sd() {
        // Mean .35, population sd sqrt(.18): the low edge falls below zero.
        let tracks = vec![
            track("A", FeatureVector { energy: 0.05, ..pop_features() }, "Pop"),
            track("B", FeatureVector { energy: 0.05, ..pop_features() }, "Pop"),
            track("C", FeatureVector { energy: 0.95, ..pop_features() }, "Pop"),
        ];
        let identity = sonic_identity(&tracks).unwrap();
        let sd = 0.18_f64.sqrt();
        assert!((identity.energy_range[0] - (0.35 - sd)).abs() < 1e-9);
        assert!((identity.energy_range[1] - (0.35 + sd)).abs() < 1e-9);
        assert!(identity.energy_range[0] < 0.0);
    }

    #[test]
    fn test_scattered_identity_gets_tightening_advice() {
        let tracks = vec![
            track("Slow", FeatureVector { tempo: 50.0, energy: 0.0, ..pop_features() }, "Pop"),
            track("Fast", FeatureVector { tempo: 200.0, energy: 1.0, ..pop_features() }, "Pop"),
        ];
        let report = aggregate(&tracks).unwrap();
        assert!(report.sonic_identity.consistency_score < 50.0);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.starts_with("Tighten your sonic signature")));
    }

    #[test]
    fn test_low_average_triggers_baseline_advice() {
        let report = aggregate(&with_scores(&[50, 55, 52])).unwrap();
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.starts_with("Raise the baseline")));
    }

    #[test]
    fn test_aggregation_is_order_sensitive_but_stats_are_not() {
        let forward = with_scores(&[60, 62, 58, 80, 85]);
        let mut backward = forward.clone();
        backward.reverse();
        let a = aggregate(&forward).unwrap();
        let b = aggregate(&backward).unwrap();
        assert_eq!(a.progression.average_score, b.progression.average_score);
        assert_eq!(a.progression.score_range, b.progression.score_range);
        assert_ne!(a.progression.trend, b.progression.trend);
    }
}
