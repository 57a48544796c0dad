//! # Shell Completion Module
//!
//! This module provides shell completion functionality for mixgrade, including:
//! - Generation of completion scripts for various shells
//! - Custom completion for genre names from the benchmark catalog
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! mixgrade completion bash > ~/.local/share/bash-completion/completions/mixgrade
//!
//! # Generate zsh completions
//! mixgrade completion zsh > ~/.config/zsh/completions/_mixgrade
//! ```

use crate::benchmark::BenchmarkCatalog;
use crate::config::RuntimeConfig;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use log::debug;
use std::io::{self, Write};
use std::path::Path;

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

const ENHANCED_FISH: &str = r#"# Enhanced mixgrade completion script for Fish shell with genre name completion
# Install with: mixgrade completion-enhanced fish > ~/.config/fish/completions/mixgrade.fish

function __mixgrade_complete_genres
    if command -sq mixgrade
        mixgrade complete-genres 2>/dev/null
    end
end

# Clear existing completions to avoid conflicts
complete -c mixgrade -e

# Global options
complete -c mixgrade -s h -l help -d 'Print help information'
complete -c mixgrade -s V -l version -d 'Print version information'
complete -c mixgrade -l config -r -F -d 'Configuration file'
complete -c mixgrade -l compact -d 'Print single-line JSON'

# Main commands
complete -c mixgrade -f -n '__fish_is_first_token' -a 'analyze' -d 'Score and diagnose a single track'
complete -c mixgrade -f -n '__fish_is_first_token' -a 'catalog' -d 'Analyse a catalog of releases and report trends'
complete -c mixgrade -f -n '__fish_is_first_token' -a 'genres' -d 'List the genres benchmarks exist for'
complete -c mixgrade -f -n '__fish_is_first_token' -a 'benchmark' -d 'Show the benchmark a genre label resolves to'
complete -c mixgrade -f -n '__fish_is_first_token' -a 'completion' -d 'Generate shell completions'
complete -c mixgrade -f -n '__fish_is_first_token' -a 'completion-enhanced' -d 'Generate enhanced shell completions'
complete -c mixgrade -f -n '__fish_is_first_token' -a 'help' -d 'Print help for commands'

# analyze command - feature file, genre and stage
complete -c mixgrade -n '__fish_seen_subcommand_from analyze' -F -d 'Feature vector JSON'
complete -c mixgrade -f -n '__fish_seen_subcommand_from analyze' -l name -r -d 'Track name'
complete -c mixgrade -f -n '__fish_seen_subcommand_from analyze' -s g -l genre -r -a '(__mixgrade_complete_genres)' -d 'Genre to benchmark against'
complete -c mixgrade -f -n '__fish_seen_subcommand_from analyze' -s s -l stage -r -a 'rough-mix mixing mix-review pre-master mastered' -d 'Production stage'

# catalog command
complete -c mixgrade -n '__fish_seen_subcommand_from catalog' -F -d 'Track list JSON'
complete -c mixgrade -f -n '__fish_seen_subcommand_from catalog' -l include-tracks -d 'Include per-track analyses'

# benchmark command - complete with genre names
complete -c mixgrade -f -n '__fish_seen_subcommand_from benchmark' -a '(__mixgrade_complete_genres)' -d 'Genre'

# completion commands - complete with shell types
complete -c mixgrade -f -n '__fish_seen_subcommand_from completion' -a 'bash zsh fish power-shell elvish'
complete -c mixgrade -f -n '__fish_seen_subcommand_from completion-enhanced' -a 'bash fish'
"#;

const ENHANCED_BASH: &str = r#"#!/bin/bash
# Enhanced mixgrade completion script with genre name completion
# Install with: mixgrade completion-enhanced bash > ~/.local/share/bash-completion/completions/mixgrade

_mixgrade_complete_genres() {
    if command -v mixgrade >/dev/null 2>&1; then
        mixgrade complete-genres 2>/dev/null
    fi
}

_mixgrade() {
    local cur prev words cword
    _init_completion || return

    case "${prev}" in
        benchmark|--genre|-g)
            local IFS=$'\n'
            COMPREPLY=($(compgen -W "$(_mixgrade_complete_genres)" -- "${cur}"))
            return 0
            ;;
        --stage|-s)
            COMPREPLY=($(compgen -W "rough-mix mixing mix-review pre-master mastered" -- "${cur}"))
            return 0
            ;;
        completion)
            COMPREPLY=($(compgen -W "bash zsh fish power-shell elvish" -- "${cur}"))
            return 0
            ;;
        completion-enhanced)
            COMPREPLY=($(compgen -W "bash fish" -- "${cur}"))
            return 0
            ;;
        --config|analyze|catalog)
            _filedir
            return 0
            ;;
    esac

    local subcommands="analyze catalog genres benchmark completion completion-enhanced help"

    if [[ $cword -eq 1 ]]; then
        COMPREPLY=($(compgen -W "$subcommands --config --compact --help --version" -- "${cur}"))
    else
        case "${words[1]}" in
            analyze)
                COMPREPLY=($(compgen -W "--name --genre --stage --compact --config --help" -- "${cur}"))
                ;;
            catalog)
                COMPREPLY=($(compgen -W "--include-tracks --compact --config --help" -- "${cur}"))
                ;;
            *)
                COMPREPLY=($(compgen -W "$subcommands" -- "${cur}"))
                ;;
        esac
    fi
} &&
complete -F _mixgrade mixgrade

# ex: filetype=sh
"#;

/// Generate enhanced fish completion script with genre name completion
pub fn generate_enhanced_fish_completion() {
    print!("{ENHANCED_FISH}");
}

/// Generate enhanced bash completion script with genre name completion
pub fn generate_enhanced_bash_completion() {
    print!("{ENHANCED_BASH}");
}

/// Convert our Shell enum to clap_complete's Shell enum
pub fn shell_to_completion_shell(shell: &crate::cli::Shell) -> CompletionShell {
    match shell {
        crate::cli::Shell::Bash => CompletionShell::Bash,
        crate::cli::Shell::Zsh => CompletionShell::Zsh,
        crate::cli::Shell::Fish => CompletionShell::Fish,
        crate::cli::Shell::PowerShell => CompletionShell::PowerShell,
        crate::cli::Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Genre names available for completion, sorted.
///
/// Uses the configured catalog (including overrides); any configuration
/// problem falls back to the built-in genres so completion never fails.
#[must_use]
pub fn get_genre_completions(config_path: Option<&Path>) -> Vec<String> {
    let catalog = RuntimeConfig::load(config_path)
        .and_then(|config| config.build_catalog())
        .unwrap_or_else(|err| {
            debug!("Completing built-in genres only: {err:#}");
            BenchmarkCatalog::builtin().clone()
        });
    let mut genres: Vec<String> = catalog.genres().map(str::to_string).collect();
    genres.sort();
    genres
}

/// Print genre names one per line, quoting names that contain whitespace.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn print_genre_completions(config_path: Option<&Path>) -> io::Result<()> {
    let mut out = io::stdout().lock();
    for genre in get_genre_completions(config_path) {
        if genre.contains(char::is_whitespace) {
            writeln!(out, "\"{}\"", genre.replace('"', "\\\""))?;
        } else {
            writeln!(out, "{genre}")?;
        }
    }
    Ok(())
}
