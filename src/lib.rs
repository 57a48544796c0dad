//! Mix scoring, diagnostics and catalog trends for independent releases.
//!
//! Core modules:
//! - [`features`] - Audio feature vectors and their validation
//! - [`benchmark`] - Genre benchmarks and the benchmark catalog
//! - [`algorithm`] - Weighted six-part scoring
//! - [`diagnostics`] - Issue detection and production-stage filtering
//! - [`analyzer`] - Single-track analysis, caching and batch analysis
//! - [`catalog`] - Catalog-level progression, identity and trends
//!
//! ### Supporting Modules
//!
//! - [`error`] - Library error type
//! - [`config`] - Runtime configuration and benchmark overrides
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation for enhanced UX
//!
//! ## Quick Start Example
//!
//! ```
//! use mixgrade::analyzer::analyze_track;
//! use mixgrade::catalog;
//! use mixgrade::diagnostics::ProductionStage;
//! use mixgrade::features::FeatureVector;
//!
//! let features = FeatureVector {
//!     tempo: 118.0,
//!     danceability: 0.72,
//!     energy: 0.7,
//!     valence: 0.6,
//!     acousticness: 0.1,
//!     instrumentalness: 0.0,
//!     speechiness: 0.05,
//!     loudness: -5.0,
//!     dynamic_range: Some(7.0),
//!     stereo_width: Some(0.82),
//!     frequency_balance: None,
//!     duration: 205.0,
//!     intro_length: Some(8.0),
//!     outro_length: None,
//!     key: None,
//!     mode: None,
//!     key_confidence: None,
//! };
//!
//! let single = analyze_track("Lead Single", &features, "pop", ProductionStage::Mastered)?;
//! println!("{}: {}/100", single.track_name, single.score.overall);
//!
//! let report = catalog::aggregate(&[single])?;
//! println!("{}", report.next_release_guidance.join("\n"));
//! # Ok::<(), mixgrade::error::AnalysisError>(())
//! ```
//!
//! ## Scoring
//!
//! The overall score is a fixed weighted sum of six sub-scores, each in
//! `[0, 1]`: loudness 20%, dynamics 15%, frequency balance 25%, stereo
//! imaging 15%, genre alignment 15% and commercial readiness 10%. The
//! weights are not configurable so scores stay comparable between tracks,
//! artists and releases. Optional measurements that are missing score a
//! neutral 0.7.
//!
//! ## Catalog Analysis
//!
//! Tracks are aggregated in release order. Progression and trends compare
//! the first half of the catalog with the second; trends need at least
//! three tracks. Sonic identity and outliers come from tempo and energy
//! statistics across the whole catalog.
//!
//! ## Error Handling
//!
//! Library functions return [`error::Result`]. Invalid feature vectors are
//! rejected before scoring and an empty catalog is an error rather than a
//! report full of zeros. Unknown genre and stage labels never fail: they
//! fall back to the default benchmark and the unknown stage.

pub mod algorithm;
pub mod analyzer;
pub mod benchmark;
pub mod catalog;
pub mod cli;
pub mod completion;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod features;
