//! # Integration Tests for mixgrade
//!
//! End-to-end tests of the public library API and of the `mixgrade`
//! binary, using temporary JSON fixtures the way an extractor would
//! produce them.

use anyhow::Result;
use mixgrade::features::FeatureVector;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Reference mix sitting inside the Pop benchmark.
fn pop_mix() -> FeatureVector {
    FeatureVector {
        tempo: 115.0,
        danceability: 0.7,
        energy: 0.65,
        valence: 0.6,
        acousticness: 0.1,
        instrumentalness: 0.0,
        speechiness: 0.05,
        loudness: -6.0,
        dynamic_range: Some(8.0),
        stereo_width: Some(0.8),
        frequency_balance: None,
        duration: 200.0,
        intro_length: Some(8.0),
        outro_length: Some(10.0),
        key: Some(0),
        mode: None,
        key_confidence: None,
    }
}

/// Test helper writing `contents` into a fresh temporary directory
fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.path().join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

/// Runs the binary with an empty configuration so the user's own
/// configuration never leaks into a test.
fn run_mixgrade(dir: &TempDir, args: &[&str]) -> Result<Output> {
    let config = write_fixture(dir, "config.json", "{}")?;
    let output = Command::new(env!("CARGO_BIN_EXE_mixgrade"))
        .arg("--config")
        .arg(&config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()?;
    Ok(output)
}

#[cfg(test)]
mod scoring_scenarios {
    use super::*;
    use mixgrade::algorithm::calculate_score;
    use mixgrade::analyzer::analyze_track;
    use mixgrade::benchmark::BenchmarkCatalog;
    use mixgrade::diagnostics::{IssueCategory, ProductionStage, Severity};

    #[test]
    fn test_reference_pop_mix_scores_high() -> Result<()> {
        let analysis = analyze_track("Reference", &pop_mix(), "Pop", ProductionStage::Mastered)?;
        let b = &analysis.score.breakdown;
        assert!((b.loudness - 1.0).abs() < 1e-9);
        assert!((b.dynamics - 1.0).abs() < 1e-9);
        assert!((b.stereo_imaging - 1.0).abs() < 1e-9);
        assert!(analysis.score.overall >= 85, "got {}", analysis.score.overall);
        assert_eq!(analysis.count_severity(Severity::Critical), 0);
        Ok(())
    }

    #[test]
    fn test_quiet_mix_raises_single_critical() -> Result<()> {
        let quiet = FeatureVector {
            loudness: -16.0,
            ..pop_mix()
        };
        let analysis = analyze_track("Quiet", &quiet, "Pop", ProductionStage::Mastered)?;
        let critical: Vec<_> = analysis
            .issues
            .iter()
            .filter(|issue| issue.severity == Severity::Critical)
            .collect();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].category, IssueCategory::Loudness);
        assert!(critical[0].title.contains("Too Quiet"));
        Ok(())
    }

    #[test]
    fn test_unknown_genre_uses_default_benchmark() -> Result<()> {
        let analysis = analyze_track("Odd", &pop_mix(), "Nu-Skiffle", ProductionStage::Unknown)?;
        assert_eq!(analysis.genre(), "Pop");
        Ok(())
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let pop = BenchmarkCatalog::builtin().resolve("Pop");
        assert_eq!(calculate_score(&pop_mix(), pop), calculate_score(&pop_mix(), pop));
    }

    #[test]
    fn test_invalid_features_are_rejected() {
        let broken = FeatureVector {
            energy: f64::NAN,
            ..pop_mix()
        };
        assert!(analyze_track("Broken", &broken, "Pop", ProductionStage::Unknown).is_err());
    }
}

#[cfg(test)]
mod score_bounds_tests {
    use super::*;
    use mixgrade::algorithm::calculate_score;
    use mixgrade::benchmark::BenchmarkCatalog;
    use mixgrade::features::FrequencyBalance;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_features(rng: &mut StdRng) -> FeatureVector {
        let mut unit = || rng.gen_range(0.0..=1.0);
        let balance = FrequencyBalance {
            sub_bass: unit(),
            bass: unit(),
            low_mids: unit(),
            mids: unit(),
            high_mids: unit(),
            presence: unit(),
            brilliance: unit(),
        };
        FeatureVector {
            tempo: rng.gen_range(40.0..220.0),
            danceability: rng.gen_range(0.0..=1.0),
            energy: rng.gen_range(0.0..=1.0),
            valence: rng.gen_range(0.0..=1.0),
            acousticness: rng.gen_range(0.0..=1.0),
            instrumentalness: rng.gen_range(0.0..=1.0),
            speechiness: rng.gen_range(0.0..=1.0),
            loudness: rng.gen_range(-40.0..=0.0),
            dynamic_range: rng.gen_bool(0.8).then(|| rng.gen_range(0.0..30.0)),
            stereo_width: rng.gen_bool(0.8).then(|| rng.gen_range(0.0..=1.0)),
            frequency_balance: rng.gen_bool(0.8).then_some(balance),
            duration: rng.gen_range(30.0..600.0),
            intro_length: None,
            outro_length: None,
            key: None,
            mode: None,
            key_confidence: None,
        }
    }

    #[test]
    fn test_scores_stay_in_bounds_for_every_genre() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..200 {
            let features = random_features(&mut rng);
            features.validate().expect("generator must produce valid vectors");
            for benchmark in BenchmarkCatalog::builtin().benchmarks() {
                let score = calculate_score(&features, benchmark);
                assert!(score.overall <= 100);
                let b = score.breakdown;
                for value in [
                    b.loudness,
                    b.dynamics,
                    b.frequency_balance,
                    b.stereo_imaging,
                    b.genre_alignment,
                    b.commercial_readiness,
                ] {
                    assert!((0.0..=1.0).contains(&value), "{value} out of range");
                }
            }
        }
    }
}

#[cfg(test)]
mod catalog_integration_tests {
    use super::*;
    use mixgrade::analyzer::{TrackAnalyzer, TrackInput};
    use mixgrade::catalog::{aggregate, ProgressionTrend};
    use mixgrade::error::AnalysisError;

    fn inputs(tempos: &[f64]) -> Vec<TrackInput> {
        tempos
            .iter()
            .enumerate()
            .map(|(i, &tempo)| TrackInput {
                name: format!("Release {}", i + 1),
                genre: Some("pop".to_string()),
                stage: Some("mastered".to_string()),
                features: FeatureVector {
                    tempo,
                    ..pop_mix()
                },
            })
            .collect()
    }

    #[test]
    fn test_batch_then_aggregate() -> Result<()> {
        let analyzer = TrackAnalyzer::default();
        let tracks = analyzer.analyze_batch(&inputs(&[118.0, 120.0, 122.0, 120.0]))?;
        let names: Vec<&str> = tracks.iter().map(|t| t.track_name.as_str()).collect();
        assert_eq!(names, ["Release 1", "Release 2", "Release 3", "Release 4"]);

        let report = aggregate(&tracks)?;
        assert_eq!(report.track_count, 4);
        assert_eq!(report.genre_consistency.dominant_genre, "Pop");
        assert_eq!(report.genre_consistency.consistency, 100.0);
        assert!(report.sonic_identity.outlier_tracks.is_empty());
        assert!(!report.next_release_guidance.is_empty());
        Ok(())
    }

    #[test]
    fn test_improving_scores_scenario() -> Result<()> {
        let mut tracks = TrackAnalyzer::default().analyze_batch(&inputs(&[120.0; 5]))?;
        for (track, overall) in tracks.iter_mut().zip([60, 62, 58, 80, 85]) {
            track.score.overall = overall;
        }
        let report = aggregate(&tracks)?;
        assert_eq!(report.progression.trend, ProgressionTrend::Improving);
        assert_eq!(report.progression.best_track, "Release 5");
        Ok(())
    }

    #[test]
    fn test_two_track_catalog_has_no_trends() -> Result<()> {
        let tracks = TrackAnalyzer::default().analyze_batch(&inputs(&[100.0, 140.0]))?;
        assert!(aggregate(&tracks)?.trends.is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_catalog_fails_fast() {
        assert_eq!(aggregate(&[]).unwrap_err(), AnalysisError::EmptyCatalog);
    }
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_cli_help_displays_correctly() -> Result<()> {
        let dir = TempDir::new()?;
        let output = run_mixgrade(&dir, &["--help"])?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("mixgrade"));
        assert!(stdout.contains("analyze"));
        assert!(stdout.contains("catalog"));
        assert!(!stdout.contains("complete-genres"));
        Ok(())
    }

    #[test]
    fn test_analyze_command_outputs_json() -> Result<()> {
        let dir = TempDir::new()?;
        let file = write_fixture(&dir, "single.json", &serde_json::to_string(&pop_mix())?)?;
        let output = run_mixgrade(
            &dir,
            &["analyze", file.to_str().unwrap(), "--genre", "POP", "--stage", "Rough Mix", "--compact"],
        )?;
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

        let stdout = String::from_utf8(output.stdout)?;
        assert_eq!(stdout.trim().lines().count(), 1);
        let analysis: Value = serde_json::from_str(&stdout)?;
        assert_eq!(analysis["track_name"], "single");
        assert_eq!(analysis["benchmark"]["genre"], "Pop");
        assert_eq!(analysis["stage"], "rough-mix");
        assert!(analysis["score"]["overall"].as_u64().unwrap() >= 85);
        Ok(())
    }

    #[test]
    fn test_analyze_rejects_invalid_features() -> Result<()> {
        let dir = TempDir::new()?;
        let broken = FeatureVector {
            energy: 1.5,
            ..pop_mix()
        };
        let file = write_fixture(&dir, "broken.json", &serde_json::to_string(&broken)?)?;
        let output = run_mixgrade(&dir, &["analyze", file.to_str().unwrap()])?;
        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("energy"));
        Ok(())
    }

    #[test]
    fn test_catalog_command() -> Result<()> {
        let dir = TempDir::new()?;
        let tracks = serde_json::json!([
            { "name": "First", "genre": "Pop", "features": pop_mix() },
            { "name": "Second", "genre": "rock", "stage": "mixing", "features": pop_mix() },
            { "name": "Third", "features": pop_mix() },
        ]);
        let file = write_fixture(&dir, "catalog.json", &tracks.to_string())?;
        let output = run_mixgrade(&dir, &["catalog", file.to_str().unwrap(), "--include-tracks"])?;
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

        let result: Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(result["report"]["track_count"], 3);
        assert_eq!(result["tracks"].as_array().unwrap().len(), 3);
        assert_eq!(result["tracks"][1]["benchmark"]["genre"], "Rock");
        assert_eq!(result["tracks"][2]["benchmark"]["genre"], "Pop");
        assert_eq!(result["report"]["genre_consistency"]["dominant_genre"], "Pop");
        Ok(())
    }

    #[test]
    fn test_empty_catalog_command_fails() -> Result<()> {
        let dir = TempDir::new()?;
        let file = write_fixture(&dir, "empty.json", "[]")?;
        let output = run_mixgrade(&dir, &["catalog", file.to_str().unwrap()])?;
        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("at least one track"));
        Ok(())
    }

    #[test]
    fn test_benchmark_command_resolves_aliases() -> Result<()> {
        let dir = TempDir::new()?;
        let output = run_mixgrade(&dir, &["benchmark", "edm"])?;
        assert!(output.status.success());
        let benchmark: Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(benchmark["genre"], "Electronic");
        Ok(())
    }

    #[test]
    fn test_genres_command_lists_builtin_genres() -> Result<()> {
        let dir = TempDir::new()?;
        let output = run_mixgrade(&dir, &["genres", "--compact"])?;
        let genres: Vec<String> = serde_json::from_slice(&output.stdout)?;
        assert_eq!(genres.len(), 10);
        assert_eq!(genres[0], "Pop");
        Ok(())
    }

    #[test]
    fn test_config_overrides_extend_genres() -> Result<()> {
        let dir = TempDir::new()?;
        let mut skiffle: Value = {
            let output = run_mixgrade(&dir, &["benchmark", "jazz"])?;
            serde_json::from_slice(&output.stdout)?
        };
        skiffle["genre"] = Value::from("Nu-Skiffle");
        write_fixture(&dir, "extra.json", &Value::Array(vec![skiffle]).to_string())?;
        let config = write_fixture(
            &dir,
            "custom.json",
            r#"{ "benchmark_overrides": "extra.json", "default_genre": "Rock" }"#,
        )?;

        let output = Command::new(env!("CARGO_BIN_EXE_mixgrade"))
            .args(["--config", config.to_str().unwrap(), "benchmark", "nu skiffle"])
            .output()?;
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        let benchmark: Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(benchmark["genre"], "Nu-Skiffle");

        let output = Command::new(env!("CARGO_BIN_EXE_mixgrade"))
            .args(["--config", config.to_str().unwrap(), "benchmark", "polka"])
            .output()?;
        let benchmark: Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(benchmark["genre"], "Rock");
        Ok(())
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() -> Result<()> {
        let output = Command::new(env!("CARGO_BIN_EXE_mixgrade"))
            .args(["--config", "/nonexistent/mixgrade.json", "genres"])
            .output()?;
        assert!(!output.status.success());
        Ok(())
    }

    #[test]
    fn test_completion_generation() -> Result<()> {
        let dir = TempDir::new()?;
        let output = run_mixgrade(&dir, &["completion", "bash"])?;
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("_mixgrade"));
        assert!(stdout.contains("complete"));

        let output = run_mixgrade(&dir, &["complete-genres"])?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.lines().any(|line| line == "Hip-Hop"));
        Ok(())
    }
}
