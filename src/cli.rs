//! # Command-Line Interface Module
//!
//! This module defines the command-line interface for mixgrade using Clap derive macros.
//! Feature vectors are read from JSON files produced by an external extractor and
//! every result is written to stdout as JSON.
//!
//! ## Commands
//!
//! - `analyze`: Score and diagnose a single track
//! - `catalog`: Analyse an ordered list of releases and report catalog trends
//! - `genres`: List the genres benchmarks exist for
//! - `benchmark`: Show the benchmark a genre label resolves to
//!
//! ## Examples
//!
//! ```bash
//! mixgrade analyze features.json --genre "hip hop" --stage rough-mix
//! mixgrade catalog releases.json --include-tracks
//! mixgrade benchmark edm
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
///
/// Global flags apply to every subcommand.
#[derive(Parser)]
#[command(name = "mixgrade")]
#[command(about = "mixgrade: Mix scoring, diagnostics and catalog trends for independent releases")]
#[command(version)]
pub struct Args {
    /// Configuration file to use instead of the platform default
    ///
    /// Unlike the default location, an explicitly given file must exist.
    #[arg(long, global = true, value_name = "PATH", env = "MIXGRADE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print single-line JSON instead of pretty-printed output
    #[arg(long, global = true)]
    pub compact: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Score and diagnose a single track
    ///
    /// Reads one feature vector from a JSON file and prints the full track
    /// analysis: overall score, sub-score breakdown, diagnosed issues,
    /// strengths and next steps.
    Analyze {
        /// JSON file holding the track's feature vector
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Track name used in the report (defaults to the file stem)
        #[arg(long)]
        name: Option<String>,

        /// Genre to benchmark against
        ///
        /// Matched case-insensitively, ignoring punctuation. Unknown genres
        /// fall back to the configured default.
        #[arg(long, short)]
        genre: Option<String>,

        /// Production stage of the mix
        ///
        /// One of: rough-mix, mixing, mix-review, pre-master, mastered.
        /// Rough mixes and mixing downgrade non-critical loudness issues to
        /// suggestions. Critical issues are always reported.
        #[arg(long, short)]
        stage: Option<String>,
    },

    /// Analyse a catalog of releases and report trends
    ///
    /// Reads an array of `{name, genre, stage, features}` objects in release
    /// order (oldest first), analyses every track in parallel and prints the
    /// catalog report: quality progression, genre consistency, sonic
    /// identity, trends, insights and recommendations.
    Catalog {
        /// JSON file holding the ordered list of tracks
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Include every per-track analysis alongside the report
        #[arg(long)]
        include_tracks: bool,
    },

    /// List the genres benchmarks exist for
    Genres,

    /// Show the benchmark a genre label resolves to
    Benchmark {
        /// Genre label, e.g. "hip hop" or "edm"
        #[arg(value_hint = clap::ValueHint::Other)]
        genre: String,
    },

    /// Generate shell completions
    ///
    /// Usage: mixgrade completion bash > ~/.local/share/bash-completion/completions/mixgrade
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// Generate enhanced completion with genre name completion
    ///
    /// Usage: mixgrade completion-enhanced bash > ~/.local/share/bash-completion/completions/mixgrade
    /// Usage: mixgrade completion-enhanced fish > ~/.config/fish/completions/mixgrade.fish
    CompletionEnhanced {
        /// Shell to generate enhanced completions for (currently bash and fish supported)
        shell: Shell,
    },

    /// List genre names for completion (hidden command)
    #[command(hide = true)]
    CompleteGenres,
}
