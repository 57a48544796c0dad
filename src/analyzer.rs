//! Single-track analysis.
//!
//! Resolves the genre benchmark, scores the track, runs the stage-aware
//! diagnostics and assembles the narrative into one immutable
//! [`TrackAnalysis`]. Analyses are independent of each other, so batches are
//! fanned out with rayon and results can be memoised in an [`AnalysisCache`].

use crate::algorithm::{calculate_score_with, Score, ScoringContext};
use crate::benchmark::{Benchmark, BenchmarkCatalog};
use crate::diagnostics::{diagnose_for_stage, Issue, ProductionStage, Severity};
use crate::error::Result;
use crate::features::{FeatureFingerprint, FeatureVector};
use log::{debug, trace};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Everything known about one analysed track. Never mutated after creation;
/// re-analysis produces a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackAnalysis {
    pub track_name: String,
    pub features: FeatureVector,
    pub benchmark: Benchmark,
    pub score: Score,
    pub issues: Vec<Issue>,
    pub strengths: Vec<String>,
    pub overall_assessment: String,
    pub next_steps: Vec<String>,
    pub stage: ProductionStage,
}

impl TrackAnalysis {
    /// Genre of the benchmark the track was actually scored against.
    #[must_use]
    pub fn genre(&self) -> &str {
        &self.benchmark.genre
    }

    #[must_use]
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|issue| issue.severity == severity).count()
    }
}

/// One track as delivered by an import adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInput {
    pub name: String,
    #[serde(default)]
    pub genre: Option<String>,
    /// Free-text stage tag; unrecognised values mean "unknown".
    #[serde(default)]
    pub stage: Option<String>,
    pub features: FeatureVector,
}

/// Scores tracks against a borrowed benchmark catalog.
#[derive(Debug, Clone, Copy)]
pub struct TrackAnalyzer<'a> {
    catalog: &'a BenchmarkCatalog,
    context: ScoringContext,
}

impl Default for TrackAnalyzer<'static> {
    fn default() -> Self {
        Self::new(BenchmarkCatalog::builtin())
    }
}

impl<'a> TrackAnalyzer<'a> {
    #[must_use]
    pub fn new(catalog: &'a BenchmarkCatalog) -> Self {
        Self {
            catalog,
            context: ScoringContext::default(),
        }
    }

    #[must_use]
    pub const fn with_context(catalog: &'a BenchmarkCatalog, context: ScoringContext) -> Self {
        Self { catalog, context }
    }

    #[must_use]
    pub const fn catalog(&self) -> &'a BenchmarkCatalog {
        self.catalog
    }

    /// Analyses one track. Unknown genres fall back to the catalog default.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AnalysisError::InvalidFeatureVector`] when
    /// `features` contains NaN or out-of-domain values.
    pub fn analyze(
        &self,
        track_name: &str,
        features: &FeatureVector,
        genre: &str,
        stage: ProductionStage,
    ) -> Result<TrackAnalysis> {
        features.validate()?;
        let benchmark = self.catalog.resolve(genre);
        Ok(self.analyze_against(track_name, features.clone(), benchmark, stage))
    }

    fn analyze_against(
        &self,
        track_name: &str,
        features: FeatureVector,
        benchmark: &Benchmark,
        stage: ProductionStage,
    ) -> TrackAnalysis {
        let score = calculate_score_with(&features, benchmark, &self.context);
        let issues = diagnose_for_stage(&features, benchmark, stage);
        let strengths = strengths(&score, benchmark);
        let overall_assessment = overall_assessment(score.overall, benchmark);
        let next_steps = next_steps(&issues, benchmark, stage);

        debug!(
            "Analysed `{track_name}' as {} ({stage}): score {}, {} issue(s)",
            benchmark.genre,
            score.overall,
            issues.len()
        );

        TrackAnalysis {
            track_name: track_name.to_string(),
            features,
            benchmark: benchmark.clone(),
            score,
            issues,
            strengths,
            overall_assessment,
            next_steps,
            stage,
        }
    }

    /// Re-scores an existing analysis under another genre, keeping its
    /// features and stage. The original is left untouched.
    #[must_use]
    pub fn reanalyze_with_genre(&self, analysis: &TrackAnalysis, genre: &str) -> TrackAnalysis {
        let benchmark = self.catalog.resolve(genre);
        self.analyze_against(
            &analysis.track_name,
            analysis.features.clone(),
            benchmark,
            analysis.stage,
        )
    }

    /// Analyses `inputs` in parallel, returning results in input order.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid feature vector.
    pub fn analyze_batch(&self, inputs: &[TrackInput]) -> Result<Vec<TrackAnalysis>> {
        inputs
            .par_iter()
            .map(|input| {
                let genre = input.genre.as_deref().unwrap_or_default();
                let stage = input
                    .stage
                    .as_deref()
                    .map_or(ProductionStage::Unknown, ProductionStage::parse);
                self.analyze(&input.name, &input.features, genre, stage)
            })
            .collect()
    }
}

/// Analyses one track against the built-in benchmarks.
///
/// # Errors
///
/// See [`TrackAnalyzer::analyze`].
pub fn analyze_track(
    track_name: &str,
    features: &FeatureVector,
    genre: &str,
    stage: ProductionStage,
) -> Result<TrackAnalysis> {
    TrackAnalyzer::default().analyze(track_name, features, genre, stage)
}

const STRENGTH_THRESHOLD: f64 = 0.8;

fn strengths(score: &Score, benchmark: &Benchmark) -> Vec<String> {
    let b = &score.breakdown;
    let genre = &benchmark.genre;
    [
        (
            b.loudness,
            format!("Loudness sits right in the {genre} target range"),
        ),
        (
            b.dynamics,
            "Healthy dynamic range keeps the mix punchy without sounding squashed".to_string(),
        ),
        (
            b.frequency_balance,
            "Well-balanced frequency spectrum with solid lows and clear presence".to_string(),
        ),
        (
            b.stereo_imaging,
            "Wide, well-controlled stereo image".to_string(),
        ),
        (
            b.genre_alignment,
            format!("Tempo, energy and groove fit {genre} conventions"),
        ),
        (
            b.commercial_readiness,
            "Length, energy and level are ready for radio and playlists".to_string(),
        ),
    ]
    .into_iter()
    .filter(|(value, _)| *value >= STRENGTH_THRESHOLD)
    .map(|(_, text)| text)
    .collect()
}

fn overall_assessment(overall: u8, benchmark: &Benchmark) -> String {
    let genre = &benchmark.genre;
    match overall {
        90..=u8::MAX => format!(
            "Excellent. This mix meets professional {genre} release standards; \
             remaining notes are matters of taste rather than technical problems."
        ),
        80..=89 => format!(
            "Very good. The mix is competitive for {genre} with a few refinements \
             left before it is release-ready."
        ),
        70..=79 => format!(
            "Good foundation. The core of the mix works, but several areas fall short \
             of {genre} benchmarks and are worth another pass."
        ),
        60..=69 => format!(
            "Developing. The mix shows promise, but noticeable technical issues hold it \
             back from {genre} release quality."
        ),
        _ => format!(
            "Needs significant work. Several fundamentals are well outside {genre} \
             targets; address the critical issues before refining details."
        ),
    }
}

fn next_steps(issues: &[Issue], benchmark: &Benchmark, stage: ProductionStage) -> Vec<String> {
    let critical: Vec<&str> = issues
        .iter()
        .filter(|issue| issue.severity == Severity::Critical)
        .map(|issue| issue.title.as_str())
        .collect();
    let warnings = issues
        .iter()
        .filter(|issue| issue.severity == Severity::Warning)
        .count();

    let mut steps = Vec::new();
    if !critical.is_empty() {
        steps.push(format!(
            "Fix the {} critical issue(s) first: {}",
            critical.len(),
            critical.join(", ")
        ));
    }
    if warnings > 0 {
        steps.push(format!(
            "Work through the {warnings} warning(s) once nothing critical remains"
        ));
    }
    if critical.is_empty() && warnings == 0 {
        steps.push("No blocking issues found; spend the next session on fine detail".to_string());
    }
    if stage.is_early() {
        steps.push(
            "Leave final loudness to mastering and keep around 6 dB of headroom on the mix bus"
                .to_string(),
        );
    }
    if !benchmark.reference_tracks.is_empty() {
        steps.push(format!(
            "A/B the mix against {} at matched loudness",
            benchmark.reference_tracks.join(", ")
        ));
    }
    steps.push("Check translation on headphones, car speakers and a phone".to_string());
    steps.push("Take regular ear breaks and re-check the balance at low volume".to_string());
    steps
}

/// Default number of cached analyses before the cache is flushed.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AnalysisKey {
    track_name: String,
    features: FeatureFingerprint,
    genre: String,
    stage: ProductionStage,
}

/// Memoises analyses by (track, features, resolved genre, stage).
///
/// Safe to share between threads; values are handed out as `Arc`s so readers
/// never copy or lock a result.
#[derive(Debug)]
pub struct AnalysisCache {
    entries: Mutex<HashMap<AnalysisKey, Arc<TrackAnalysis>>>,
    capacity: usize,
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl AnalysisCache {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Returns the cached analysis or computes and stores it.
    ///
    /// # Errors
    ///
    /// See [`TrackAnalyzer::analyze`]; failures are not cached.
    pub fn get_or_analyze(
        &self,
        analyzer: &TrackAnalyzer<'_>,
        track_name: &str,
        features: &FeatureVector,
        genre: &str,
        stage: ProductionStage,
    ) -> Result<Arc<TrackAnalysis>> {
        let benchmark = analyzer.catalog().resolve(genre);
        let key = AnalysisKey {
            track_name: track_name.to_string(),
            features: FeatureFingerprint::from(features),
            genre: benchmark.genre.clone(),
            stage,
        };

        if let Ok(entries) = self.entries.lock() {
            if let Some(hit) = entries.get(&key) {
                trace!("Analysis cache hit for `{track_name}'");
                return Ok(Arc::clone(hit));
            }
        }

        features.validate()?;
        let analysis = Arc::new(analyzer.analyze_against(
            track_name,
            features.clone(),
            benchmark,
            stage,
        ));

        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() >= self.capacity {
                entries.clear();
            }
            return Ok(Arc::clone(entries.entry(key).or_insert(analysis)));
        }
        Ok(analysis)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}
