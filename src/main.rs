//! # mixgrade - Mix Scoring & Catalog Trends
//!
//! Command-line front end for the mixgrade library. Feature vectors come
//! from JSON files written by an audio feature extractor; every result is
//! printed to stdout as JSON so it can be piped into other tools.
//!
//! ## Usage
//!
//! ```bash
//! # Score a single track against its genre
//! mixgrade analyze features.json --genre rock --stage mixing
//!
//! # Analyse a whole catalog, oldest release first
//! mixgrade catalog releases.json
//!
//! # Inspect what "edm" is benchmarked against
//! mixgrade benchmark edm
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use mixgrade::analyzer::{TrackAnalysis, TrackAnalyzer, TrackInput};
use mixgrade::catalog::{self, CatalogReport};
use mixgrade::cli;
use mixgrade::completion;
use mixgrade::config::RuntimeConfig;
use mixgrade::diagnostics::ProductionStage;
use mixgrade::features::FeatureVector;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Catalog report together with the analyses it was built from.
#[derive(Serialize)]
struct CatalogOutput {
    report: CatalogReport,
    tracks: Vec<TrackAnalysis>,
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid {what} in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{rendered}");
    Ok(())
}

/// Main entry point for mixgrade.
///
/// # Logging
///
/// Initializes environment logger which can be controlled via `RUST_LOG`:
/// - `RUST_LOG=debug mixgrade catalog releases.json` - Enable debug logging
/// - `RUST_LOG=mixgrade::algorithm=trace mixgrade analyze t.json` - Module-specific logging
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();
    let config_path = args.config.as_deref();

    match args.command {
        cli::Command::Analyze {
            file,
            name,
            genre,
            stage,
        } => {
            let config = RuntimeConfig::load(config_path)?;
            let catalog = config.build_catalog()?;
            let features: FeatureVector = read_json(&file, "feature vector")?;
            let name = name.unwrap_or_else(|| {
                file.file_stem()
                    .map_or_else(|| "Untitled".to_string(), |s| s.to_string_lossy().into_owned())
            });
            let stage = stage
                .as_deref()
                .map_or(ProductionStage::Unknown, ProductionStage::parse);

            let analysis = TrackAnalyzer::new(&catalog)
                .analyze(&name, &features, genre.as_deref().unwrap_or_default(), stage)
                .with_context(|| format!("Cannot analyse {}", file.display()))?;
            print_json(&analysis, args.compact)?;
        }
        cli::Command::Catalog {
            file,
            include_tracks,
        } => {
            let config = RuntimeConfig::load(config_path)?;
            let catalog = config.build_catalog()?;
            let inputs: Vec<TrackInput> = read_json(&file, "track list")?;
            info!("Analysing {} track(s) from {}", inputs.len(), file.display());

            let analyzer = TrackAnalyzer::new(&catalog);
            let tracks = match config.threads {
                Some(threads) => {
                    debug!("Using a pool of {threads} thread(s)");
                    rayon::ThreadPoolBuilder::new()
                        .num_threads(threads)
                        .build()
                        .context("Failed to build thread pool")?
                        .install(|| analyzer.analyze_batch(&inputs))
                }
                None => analyzer.analyze_batch(&inputs),
            }
            .with_context(|| format!("Cannot analyse tracks in {}", file.display()))?;

            let report = catalog::aggregate(&tracks)
                .with_context(|| format!("Cannot build a report for {}", file.display()))?;
            if include_tracks {
                print_json(&CatalogOutput { report, tracks }, args.compact)?;
            } else {
                print_json(&report, args.compact)?;
            }
        }
        cli::Command::Genres => {
            let catalog = RuntimeConfig::load(config_path)?.build_catalog()?;
            let genres: Vec<&str> = catalog.genres().collect();
            print_json(&genres, args.compact)?;
        }
        cli::Command::Benchmark { genre } => {
            let catalog = RuntimeConfig::load(config_path)?.build_catalog()?;
            let (benchmark, fell_back) = catalog.resolve_genre(&genre);
            if fell_back {
                eprintln!(
                    "Unknown genre `{genre}', showing the default {} benchmark",
                    benchmark.genre
                );
            }
            print_json(benchmark, args.compact)?;
        }
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(&shell), &mut cmd);
        }
        cli::Command::CompletionEnhanced { shell } => match shell {
            cli::Shell::Bash => completion::generate_enhanced_bash_completion(),
            cli::Shell::Fish => completion::generate_enhanced_fish_completion(),
            _ => {
                return Err(anyhow::anyhow!(
                    "Enhanced completions only supported for bash and fish"
                ))
            }
        },
        cli::Command::CompleteGenres => {
            completion::print_genre_completions(config_path)?;
        }
    }

    Ok(())
}
