//! Threshold diagnostics and production-stage context.
//!
//! [`diagnose`] compares a feature vector with its benchmark and emits
//! [`Issue`]s in a fixed order: loudness, dynamics, frequency bands, stereo
//! width, tempo, duration, intro. [`apply_stage_filter`] then adjusts
//! severities for the declared [`ProductionStage`]; it never drops an issue
//! and never touches a critical one's severity.

use crate::benchmark::Benchmark;
use crate::features::FeatureVector;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Loudness,
    Dynamics,
    FrequencyBalance,
    StereoImaging,
    Tempo,
    Energy,
    Structure,
    GenreAlignment,
    Mastering,
}

impl IssueCategory {
    /// Categories whose fixes normally belong to the mastering stage.
    #[must_use]
    pub const fn is_mastering_relevant(self) -> bool {
        matches!(self, Self::Loudness | Self::Dynamics | Self::Mastering)
    }
}

/// Ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Suggestion,
}

/// A single diagnostic finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub category: IssueCategory,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub current_value: f64,
    pub target_value: Option<f64>,
    pub recommendations: Vec<String>,
    pub technical_note: Option<String>,
    /// Context added by the production-stage filter.
    pub stage_note: Option<String>,
}

impl Issue {
    fn new(
        category: IssueCategory,
        severity: Severity,
        title: &str,
        description: String,
        current_value: f64,
        target_value: Option<f64>,
        recommendations: &[&str],
    ) -> Self {
        Self {
            category,
            severity,
            title: title.to_string(),
            description,
            current_value,
            target_value,
            recommendations: recommendations.iter().map(ToString::to_string).collect(),
            technical_note: None,
            stage_note: None,
        }
    }

    fn with_note(mut self, note: &str) -> Self {
        self.technical_note = Some(note.to_string());
        self
    }
}

/// Declared point in the mixing/mastering workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductionStage {
    RoughMix,
    Mixing,
    MixReview,
    PreMaster,
    Mastered,
    #[default]
    Unknown,
}

impl ProductionStage {
    pub const ALL: [Self; 6] = [
        Self::RoughMix,
        Self::Mixing,
        Self::MixReview,
        Self::PreMaster,
        Self::Mastered,
        Self::Unknown,
    ];

    /// Parses a stage tag leniently; anything unrecognised is `Unknown`.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        let key: String = label
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "roughmix" | "rough" | "demo" => Self::RoughMix,
            "mixing" | "mix" => Self::Mixing,
            "mixreview" | "review" => Self::MixReview,
            "premaster" | "premastering" => Self::PreMaster,
            "mastered" | "master" | "final" => Self::Mastered,
            "unknown" | "" => Self::Unknown,
            _ => {
                warn!("Unrecognised production stage `{label}', treating as unknown");
                Self::Unknown
            }
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RoughMix => "rough-mix",
            Self::Mixing => "mixing",
            Self::MixReview => "mix-review",
            Self::PreMaster => "pre-master",
            Self::Mastered => "mastered",
            Self::Unknown => "unknown",
        }
    }

    /// Stages where loudness is not yet the engineer's concern.
    #[must_use]
    pub const fn is_early(self) -> bool {
        matches!(self, Self::RoughMix | Self::Mixing)
    }
}

impl fmt::Display for ProductionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ProductionStage {
    fn from(label: &str) -> Self {
        Self::parse(label)
    }
}

// Trigger margins. Tempo and duration are stylistic, so they only ever yield
// suggestions.
const QUIET_MARGIN_DB: f64 = 3.0;
const LOUD_MARGIN_DB: f64 = 2.0;
const DYNAMICS_MARGIN_DB: f64 = 2.0;
const CRUSHED_DYNAMICS_DB: f64 = 4.0;
const WEAK_BASS: f64 = 0.5;
const EXCESSIVE_BASS: f64 = 0.9;
const DULL_BRILLIANCE: f64 = 0.5;
const NARROW_WIDTH: f64 = 0.4;
const OVER_WIDE: f64 = 0.95;
const TEMPO_MARGIN_BPM: f64 = 10.0;
const DURATION_MARGIN_SECS: f64 = 30.0;
const INTRO_MARGIN_SECS: f64 = 10.0;

/// Compares `features` against `benchmark` and lists every finding.
#[must_use]
pub fn diagnose(features: &FeatureVector, benchmark: &Benchmark) -> Vec<Issue> {
    let mut issues = Vec::new();
    check_loudness(features, benchmark, &mut issues);
    check_dynamics(features, benchmark, &mut issues);
    check_frequency_balance(features, &mut issues);
    check_stereo_width(features, &mut issues);
    check_tempo(features, benchmark, &mut issues);
    check_duration(features, benchmark, &mut issues);
    check_intro(features, benchmark, &mut issues);
    debug!(
        "Diagnosed {} issue(s) against {} benchmark",
        issues.len(),
        benchmark.genre
    );
    issues
}

fn check_loudness(features: &FeatureVector, benchmark: &Benchmark, issues: &mut Vec<Issue>) {
    let range = benchmark.loudness;
    let loudness = features.loudness;

    if loudness < range.min - QUIET_MARGIN_DB {
        issues.push(
            Issue::new(
                IssueCategory::Loudness,
                Severity::Critical,
                "Mix Too Quiet",
                format!(
                    "Integrated loudness of {loudness:.1} dB is {:.1} dB below the {} target of {:.0} to {:.0} dB. \
                     Streaming listeners will hear it as noticeably weaker than comparable releases.",
                    range.min - loudness,
                    benchmark.genre,
                    range.min,
                    range.max
                ),
                loudness,
                Some(range.midpoint()),
                &[
                    "Raise the overall level with a transparent limiter on the master bus",
                    "Check for peaks that prevent gain increase and tame them with clip gain or a fast compressor",
                    "Compare against a reference track at matched playback level",
                ],
            )
            .with_note("Loudness is measured as integrated LUFS over the full track."),
        );
    } else if loudness > range.max + LOUD_MARGIN_DB {
        issues.push(
            Issue::new(
                IssueCategory::Loudness,
                Severity::Warning,
                "Over-Compressed Master",
                format!(
                    "Integrated loudness of {loudness:.1} dB is {:.1} dB above the {} target range. \
                     Streaming normalisation will turn it down and the lost transients will not come back.",
                    loudness - range.max,
                    benchmark.genre
                ),
                loudness,
                Some(range.midpoint()),
                &[
                    "Back off the limiter threshold until gain reduction stays under 3 dB",
                    "Let drums and transients breathe by easing bus compression",
                    "Master to the genre target rather than maximum loudness",
                ],
            )
            .with_note("Most streaming services normalise playback to around -14 LUFS."),
        );
    }
}

fn check_dynamics(features: &FeatureVector, benchmark: &Benchmark, issues: &mut Vec<Issue>) {
    let Some(dr) = features.dynamic_range else {
        return;
    };
    let range = benchmark.dynamic_range;
    if dr >= range.min - DYNAMICS_MARGIN_DB {
        return;
    }

    let (severity, title) = if dr < CRUSHED_DYNAMICS_DB {
        (Severity::Critical, "Severely Limited Dynamics")
    } else {
        (Severity::Warning, "Limited Dynamic Range")
    };
    issues.push(Issue::new(
        IssueCategory::Dynamics,
        severity,
        title,
        format!(
            "Dynamic range of {dr:.1} dB is below the {} range of {:.0} to {:.0} dB; the mix may sound flat and fatiguing.",
            benchmark.genre, range.min, range.max
        ),
        dr,
        Some(range.min),
        &[
            "Reduce compression ratios on the mix bus and busiest groups",
            "Use parallel compression instead of heavy serial compression",
            "Automate section levels so choruses lift without extra limiting",
        ],
    ));
}

fn check_frequency_balance(features: &FeatureVector, issues: &mut Vec<Issue>) {
    let Some(balance) = &features.frequency_balance else {
        return;
    };

    if balance.bass < WEAK_BASS {
        issues.push(Issue::new(
            IssueCategory::FrequencyBalance,
            Severity::Warning,
            "Weak Low End",
            format!(
                "Bass energy of {:.2} leaves the low end thin compared with commercial releases.",
                balance.bass
            ),
            balance.bass,
            Some(0.7),
            &[
                "Boost the kick and bass fundamentals around 60-100 Hz",
                "Check the low end on headphones or a subwoofer, not just small monitors",
                "Layer a sub or saturate the bass to add audible harmonics",
            ],
        ));
    } else if balance.bass > EXCESSIVE_BASS {
        issues.push(Issue::new(
            IssueCategory::FrequencyBalance,
            Severity::Warning,
            "Excessive Low End",
            format!(
                "Bass energy of {:.2} risks a boomy mix that masks the mid-range.",
                balance.bass
            ),
            balance.bass,
            Some(0.7),
            &[
                "High-pass non-bass instruments to clear low-frequency build-up",
                "Sidechain the bass to the kick so they stop competing",
                "Cut around 200-300 Hz where mud accumulates",
            ],
        ));
    }

    if balance.brilliance < DULL_BRILLIANCE {
        issues.push(Issue::new(
            IssueCategory::FrequencyBalance,
            Severity::Suggestion,
            "Lacking Sparkle",
            format!(
                "Brilliance of {:.2} suggests the top end could use more air.",
                balance.brilliance
            ),
            balance.brilliance,
            Some(0.6),
            &[
                "Add a gentle high shelf above 10 kHz on the mix bus",
                "Brighten cymbals and vocals with an exciter rather than heavy EQ",
            ],
        ));
    }
}

fn check_stereo_width(features: &FeatureVector, issues: &mut Vec<Issue>) {
    let Some(width) = features.stereo_width else {
        return;
    };

    if width < NARROW_WIDTH {
        issues.push(Issue::new(
            IssueCategory::StereoImaging,
            Severity::Warning,
            "Narrow Stereo Image",
            format!("Stereo width of {width:.2} makes the mix sound close to mono."),
            width,
            Some(0.7),
            &[
                "Pan supporting instruments away from the centre",
                "Double-track guitars or backing vocals and pan them wide",
                "Use stereo reverbs and delays on selected elements",
            ],
        ));
    } else if width > OVER_WIDE {
        issues.push(
            Issue::new(
                IssueCategory::StereoImaging,
                Severity::Suggestion,
                "Possibly Over-Widened",
                format!("Stereo width of {width:.2} may collapse badly when summed to mono."),
                width,
                Some(0.85),
                &[
                    "Check the mix in mono and listen for elements that disappear",
                    "Keep bass and kick centred below 150 Hz",
                ],
            )
            .with_note("Phone speakers and club systems often play back in mono."),
        );
    }
}

fn check_tempo(features: &FeatureVector, benchmark: &Benchmark, issues: &mut Vec<Issue>) {
    let range = benchmark.tempo;
    if range.distance_outside(features.tempo) <= TEMPO_MARGIN_BPM {
        return;
    }
    issues.push(Issue::new(
        IssueCategory::Tempo,
        Severity::Suggestion,
        "Tempo Outside Genre Norms",
        format!(
            "{:.0} BPM sits outside the typical {} range of {:.0}-{:.0} BPM. \
             That can be a deliberate stylistic choice.",
            features.tempo, benchmark.genre, range.min, range.max
        ),
        features.tempo,
        Some(range.midpoint()),
        &[
            "Confirm the tempo serves the song and its intended playlists",
            "Compare with reference tracks in the genre before committing",
        ],
    ));
}

fn check_duration(features: &FeatureVector, benchmark: &Benchmark, issues: &mut Vec<Issue>) {
    let range = benchmark.duration;
    let duration = features.duration;

    if duration > range.max + DURATION_MARGIN_SECS {
        issues.push(Issue::new(
            IssueCategory::Structure,
            Severity::Suggestion,
            "Track Runs Long",
            format!(
                "At {duration:.0} s the track is longer than the typical {} length of {:.0}-{:.0} s.",
                benchmark.genre, range.min, range.max
            ),
            duration,
            Some(range.max),
            &[
                "Tighten intros, outros and repeated sections",
                "Consider a radio edit alongside the full version",
            ],
        ));
    } else if duration < range.min - DURATION_MARGIN_SECS {
        issues.push(Issue::new(
            IssueCategory::Structure,
            Severity::Suggestion,
            "Track Runs Short",
            format!(
                "At {duration:.0} s the track is shorter than the typical {} length of {:.0}-{:.0} s.",
                benchmark.genre, range.min, range.max
            ),
            duration,
            Some(range.min),
            &[
                "Develop the arrangement with a bridge or extra chorus",
                "Make sure the song resolves rather than ending abruptly",
            ],
        ));
    }
}

fn check_intro(features: &FeatureVector, benchmark: &Benchmark, issues: &mut Vec<Issue>) {
    let Some(intro) = features.intro_length else {
        return;
    };
    let range = benchmark.intro_length;
    if intro <= range.max + INTRO_MARGIN_SECS {
        return;
    }
    issues.push(Issue::new(
        IssueCategory::Structure,
        Severity::Suggestion,
        "Long Intro",
        format!(
            "The {intro:.0} s intro is longer than the usual {:.0} s for {}; listeners may skip before the hook.",
            range.max, benchmark.genre
        ),
        intro,
        Some(range.max),
        &[
            "Bring the vocal or main hook in earlier",
            "Trim the intro for streaming and keep the long version for DJs",
        ],
    ));
}

const DEFERRED_NOTE: &str =
    "Deferred to mastering: final loudness is normally set at the mastering stage.";
const UNKNOWN_STAGE_NOTE: &str =
    "Production stage unknown: this may not apply yet if the track has not been mastered.";

/// Re-weights issues for the declared stage.
///
/// Early stages (rough mix, mixing) downgrade non-critical loudness issues to
/// suggestions; an unknown stage annotates every mastering-relevant issue.
#[must_use]
pub fn apply_stage_filter(issues: Vec<Issue>, stage: ProductionStage) -> Vec<Issue> {
    issues
        .into_iter()
        .map(|mut issue| {
            if issue.severity == Severity::Critical {
                if stage == ProductionStage::Unknown && issue.category.is_mastering_relevant() {
                    issue.stage_note = Some(UNKNOWN_STAGE_NOTE.to_string());
                }
                return issue;
            }
            if stage.is_early() && issue.category == IssueCategory::Loudness {
                issue.severity = Severity::Suggestion;
                issue.stage_note = Some(DEFERRED_NOTE.to_string());
            } else if stage == ProductionStage::Unknown && issue.category.is_mastering_relevant() {
                issue.stage_note = Some(UNKNOWN_STAGE_NOTE.to_string());
            }
            issue
        })
        .collect()
}

/// [`diagnose`] followed by [`apply_stage_filter`].
#[must_use]
pub fn diagnose_for_stage(
    features: &FeatureVector,
    benchmark: &Benchmark,
    stage: ProductionStage,
) -> Vec<Issue> {
    apply_stage_filter(diagnose(features, benchmark), stage)
}
