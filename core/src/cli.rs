//! Command-line interface for rune-infer.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Classify hand-drawn runes with a pre-trained model.
#[derive(Parser, Debug)]
#[command(name = "rune-infer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a single input.
    Classify {
        /// Path to the dense model description. Overrides `model.path` in the config.
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Input file: `.json` feature vector or an image.
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the YAML config (labels, threshold, input size).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (json, pretty).
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Classify several inputs and print per-rune statistics.
    Stats {
        /// Path to the dense model description. Overrides `model.path` in the config.
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Path to the YAML config (labels, threshold, input size).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (text, json).
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Input files.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Show the declared tensors of a model.
    Info {
        /// Path to the dense model description.
        #[arg(short, long)]
        model: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stats_inputs() {
        let cli = Cli::try_parse_from([
            "rune-infer",
            "stats",
            "--model",
            "model.yaml",
            "a.png",
            "b.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Stats { model, inputs, format, .. } => {
                assert_eq!(model, Some(PathBuf::from("model.yaml")));
                assert_eq!(inputs.len(), 2);
                assert_eq!(format, "text");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn classify_requires_input() {
        assert!(Cli::try_parse_from(["rune-infer", "classify"]).is_err());
    }
}
