//! Error type shared by the analysis library.
//!
//! The scoring core is pure computation, so the taxonomy is small: bad
//! input is rejected at the boundary and an empty catalog is refused up
//! front. Everything else degrades gracefully (neutral fallbacks, default
//! benchmark, unknown stage).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("invalid feature vector: `{field}` = {value} ({reason})")]
    InvalidFeatureVector {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("catalog analysis requires at least one track")]
    EmptyCatalog,

    #[error("invalid benchmark for genre `{genre}`: {reason}")]
    InvalidBenchmark { genre: String, reason: String },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
