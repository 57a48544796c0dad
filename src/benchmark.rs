//! Genre benchmarks: the target ranges every track is scored against.
//!
//! The built-in table is constructed once, lazily, and never changes. Callers
//! that need a customised table (config overrides, a different default genre)
//! build their own [`BenchmarkCatalog`] from it and pass that around by
//! reference.

use crate::error::{AnalysisError, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Genre used when a label cannot be resolved.
pub const DEFAULT_GENRE: &str = "Pop";

/// Inclusive `[min, max]` target range for one feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRange {
    pub min: f64,
    pub max: f64,
}

impl TargetRange {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    #[must_use]
    pub fn half_width(&self) -> f64 {
        (self.max - self.min) / 2.0
    }

    /// How far `value` lies outside the range; zero when inside.
    #[must_use]
    pub fn distance_outside(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }
}

/// Target ranges for every scored dimension of one genre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub genre: String,
    pub tempo: TargetRange,
    pub energy: TargetRange,
    pub danceability: TargetRange,
    pub loudness: TargetRange,
    pub dynamic_range: TargetRange,
    pub stereo_width: TargetRange,
    pub duration: TargetRange,
    pub intro_length: TargetRange,
    #[serde(default)]
    pub reference_tracks: Vec<String>,
}

impl Benchmark {
    fn ranges(&self) -> [(&'static str, TargetRange); 8] {
        [
            ("tempo", self.tempo),
            ("energy", self.energy),
            ("danceability", self.danceability),
            ("loudness", self.loudness),
            ("dynamic_range", self.dynamic_range),
            ("stereo_width", self.stereo_width),
            ("duration", self.duration),
            ("intro_length", self.intro_length),
        ]
    }

    /// Checks that every range is finite and not inverted.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidBenchmark`] for the first bad range.
    pub fn validate(&self) -> Result<()> {
        if self.genre.trim().is_empty() {
            return Err(AnalysisError::InvalidBenchmark {
                genre: self.genre.clone(),
                reason: "genre name must not be empty".to_string(),
            });
        }
        for (name, range) in self.ranges() {
            if !range.min.is_finite() || !range.max.is_finite() {
                return Err(AnalysisError::InvalidBenchmark {
                    genre: self.genre.clone(),
                    reason: format!("{name} range has non-finite bounds"),
                });
            }
            if range.min > range.max {
                return Err(AnalysisError::InvalidBenchmark {
                    genre: self.genre.clone(),
                    reason: format!("{name} range is inverted ({} > {})", range.min, range.max),
                });
            }
        }
        Ok(())
    }
}

/// Lookup key: lowercase alphanumerics only, so "Hip-Hop", "hip hop" and
/// "HIPHOP" all collide.
fn normalize(label: &str) -> String {
    label
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

const ALIASES: &[(&str, &str)] = &[
    ("edm", "Electronic"),
    ("dance", "Electronic"),
    ("house", "Electronic"),
    ("techno", "Electronic"),
    ("rap", "Hip-Hop"),
    ("trap", "Hip-Hop"),
    ("rnb", "R&B"),
    ("soul", "R&B"),
    ("alternative", "Indie"),
    ("heavymetal", "Metal"),
    ("orchestral", "Classical"),
];

/// Immutable genre -> benchmark table with a default fallback.
#[derive(Debug, Clone)]
pub struct BenchmarkCatalog {
    benchmarks: Vec<Benchmark>,
    index: HashMap<String, usize>,
    default_index: usize,
}

lazy_static::lazy_static! {
    static ref BUILTIN: BenchmarkCatalog = BenchmarkCatalog::from_parts(builtin_benchmarks(), 0);
}

impl BenchmarkCatalog {
    /// The built-in table, defaulting to [`DEFAULT_GENRE`].
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    fn from_parts(benchmarks: Vec<Benchmark>, default_index: usize) -> Self {
        let mut index: HashMap<String, usize> = benchmarks
            .iter()
            .enumerate()
            .map(|(i, benchmark)| (normalize(&benchmark.genre), i))
            .collect();
        for (alias, genre) in ALIASES {
            if let Some(&i) = index.get(&normalize(genre)) {
                index.entry((*alias).to_string()).or_insert(i);
            }
        }
        Self {
            benchmarks,
            index,
            default_index,
        }
    }

    /// Builds a catalog from explicit benchmarks.
    ///
    /// # Errors
    ///
    /// Fails if any benchmark is invalid or `default_genre` names none of them.
    pub fn new(benchmarks: Vec<Benchmark>, default_genre: &str) -> Result<Self> {
        for benchmark in &benchmarks {
            benchmark.validate()?;
        }
        let key = normalize(default_genre);
        let default_index = benchmarks
            .iter()
            .position(|b| normalize(&b.genre) == key)
            .ok_or_else(|| AnalysisError::InvalidBenchmark {
                genre: default_genre.to_string(),
                reason: "default genre is not in the catalog".to_string(),
            })?;
        Ok(Self::from_parts(benchmarks, default_index))
    }

    /// Returns a copy of this catalog with `overrides` replacing benchmarks of
    /// the same genre and appending new genres.
    ///
    /// # Errors
    ///
    /// Fails if an override is invalid.
    pub fn with_overrides(&self, overrides: Vec<Benchmark>) -> Result<Self> {
        let mut benchmarks = self.benchmarks.clone();
        for benchmark in overrides {
            benchmark.validate()?;
            let key = normalize(&benchmark.genre);
            match benchmarks.iter_mut().find(|b| normalize(&b.genre) == key) {
                Some(existing) => *existing = benchmark,
                None => benchmarks.push(benchmark),
            }
        }
        let default_genre = self.default_benchmark().genre.clone();
        Self::new(benchmarks, &default_genre)
    }

    /// Returns a copy of this catalog that falls back to `genre` instead.
    ///
    /// # Errors
    ///
    /// Fails if `genre` does not resolve to a benchmark in this catalog.
    pub fn with_default_genre(&self, genre: &str) -> Result<Self> {
        let default_index = self
            .index
            .get(&normalize(genre))
            .copied()
            .ok_or_else(|| AnalysisError::InvalidBenchmark {
                genre: genre.to_string(),
                reason: "default genre is not in the catalog".to_string(),
            })?;
        Ok(Self::from_parts(self.benchmarks.clone(), default_index))
    }

    #[must_use]
    pub fn default_benchmark(&self) -> &Benchmark {
        &self.benchmarks[self.default_index]
    }

    /// Exact lookup (after normalisation and aliases), without fallback.
    #[must_use]
    pub fn lookup(&self, label: &str) -> Option<&Benchmark> {
        self.index.get(&normalize(label)).map(|&i| &self.benchmarks[i])
    }

    /// Resolves a free-text genre label, falling back to the default
    /// benchmark. Never fails: artists use idiosyncratic genre names.
    #[must_use]
    pub fn resolve(&self, label: &str) -> &Benchmark {
        self.resolve_genre(label).0
    }

    /// Like [`resolve`](Self::resolve), also reporting whether the default
    /// benchmark was substituted.
    #[must_use]
    pub fn resolve_genre(&self, label: &str) -> (&Benchmark, bool) {
        if let Some(benchmark) = self.lookup(label) {
            return (benchmark, false);
        }
        let fallback = self.default_benchmark();
        if label.trim().is_empty() {
            debug!("No genre given, using {} benchmark", fallback.genre);
        } else {
            warn!("Unknown genre `{label}', using {} benchmark", fallback.genre);
        }
        (fallback, true)
    }

    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.benchmarks.iter().map(|b| b.genre.as_str())
    }

    pub fn benchmarks(&self) -> impl Iterator<Item = &Benchmark> {
        self.benchmarks.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }
}

#[allow(clippy::too_many_arguments)]
fn genre(
    name: &str,
    tempo: (f64, f64),
    energy: (f64, f64),
    danceability: (f64, f64),
    loudness: (f64, f64),
    dynamic_range: (f64, f64),
    stereo_width: (f64, f64),
    duration: (f64, f64),
    intro_length: (f64, f64),
    reference_tracks: &[&str],
) -> Benchmark {
    let r = |(min, max): (f64, f64)| TargetRange::new(min, max);
    Benchmark {
        genre: name.to_string(),
        tempo: r(tempo),
        energy: r(energy),
        danceability: r(danceability),
        loudness: r(loudness),
        dynamic_range: r(dynamic_range),
        stereo_width: r(stereo_width),
        duration: r(duration),
        intro_length: r(intro_length),
        reference_tracks: reference_tracks.iter().map(ToString::to_string).collect(),
    }
}

// Pop must stay first: it is the built-in default.
#[allow(clippy::too_many_lines)]
fn builtin_benchmarks() -> Vec<Benchmark> {
    vec![
        genre(
            DEFAULT_GENRE,
            (100.0, 130.0),
            (0.6, 0.85),
            (0.6, 0.85),
            (-6.0, -4.0),
            (5.0, 9.0),
            (0.7, 0.95),
            (180.0, 240.0),
            (5.0, 15.0),
            &["The Weeknd - Blinding Lights", "Dua Lipa - Levitating", "Harry Styles - As It Was"],
        ),
        genre(
            "Rock",
            (110.0, 150.0),
            (0.7, 0.95),
            (0.4, 0.7),
            (-7.0, -4.0),
            (6.0, 10.0),
            (0.65, 0.9),
            (200.0, 300.0),
            (8.0, 20.0),
            &["Foo Fighters - Everlong", "Arctic Monkeys - Do I Wanna Know?"],
        ),
        genre(
            "Hip-Hop",
            (80.0, 110.0),
            (0.55, 0.85),
            (0.65, 0.9),
            (-7.0, -4.0),
            (5.0, 8.0),
            (0.6, 0.85),
            (150.0, 240.0),
            (4.0, 12.0),
            &["Kendrick Lamar - HUMBLE.", "Drake - God's Plan"],
        ),
        genre(
            "Electronic",
            (120.0, 135.0),
            (0.7, 0.95),
            (0.7, 0.95),
            (-6.0, -3.0),
            (4.0, 7.0),
            (0.75, 0.98),
            (180.0, 360.0),
            (15.0, 45.0),
            &["Daft Punk - One More Time", "Fred again.. - Delilah"],
        ),
        genre(
            "R&B",
            (60.0, 110.0),
            (0.4, 0.7),
            (0.55, 0.8),
            (-8.0, -5.0),
            (6.0, 10.0),
            (0.65, 0.9),
            (180.0, 270.0),
            (5.0, 15.0),
            &["SZA - Snooze", "Frank Ocean - Thinkin Bout You"],
        ),
        genre(
            "Country",
            (80.0, 130.0),
            (0.5, 0.8),
            (0.5, 0.75),
            (-8.0, -5.0),
            (6.0, 10.0),
            (0.6, 0.85),
            (180.0, 240.0),
            (5.0, 15.0),
            &["Chris Stapleton - Tennessee Whiskey", "Luke Combs - Fast Car"],
        ),
        genre(
            "Jazz",
            (80.0, 180.0),
            (0.2, 0.6),
            (0.35, 0.65),
            (-16.0, -10.0),
            (10.0, 18.0),
            (0.6, 0.9),
            (240.0, 420.0),
            (5.0, 30.0),
            &["Miles Davis - So What", "Kamasi Washington - Truth"],
        ),
        genre(
            "Classical",
            (60.0, 140.0),
            (0.05, 0.45),
            (0.1, 0.4),
            (-23.0, -14.0),
            (14.0, 24.0),
            (0.7, 0.95),
            (240.0, 600.0),
            (0.0, 30.0),
            &["Max Richter - On the Nature of Daylight"],
        ),
        genre(
            "Metal",
            (100.0, 180.0),
            (0.85, 1.0),
            (0.3, 0.6),
            (-6.0, -3.0),
            (4.0, 8.0),
            (0.7, 0.95),
            (210.0, 360.0),
            (10.0, 30.0),
            &["Metallica - Master of Puppets", "Gojira - Stranded"],
        ),
        genre(
            "Indie",
            (90.0, 140.0),
            (0.45, 0.8),
            (0.45, 0.75),
            (-9.0, -6.0),
            (7.0, 11.0),
            (0.6, 0.9),
            (180.0, 270.0),
            (5.0, 20.0),
            &["Phoebe Bridgers - Motion Sickness", "Tame Impala - The Less I Know the Better"],
        ),
    ]
}
