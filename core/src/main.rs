//! CLI entry point for rune-infer.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rune_infer::cli::{Cli, Commands};
use rune_infer::stats::render_text;
use rune_infer::{features, Config, DenseModel, ModelInstance, RuneClassifier, UsageAggregator};

/// Load the config file (or defaults) and the model it points at.
fn load_classifier(
    model: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<(Config, RuneClassifier<DenseModel>)> {
    let (config, config_dir) = match config {
        Some(path) => {
            let loaded = Config::from_yaml_file(&path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?;
            (loaded, path.parent().map(Path::to_path_buf))
        }
        None => (Config::default(), None),
    };

    // model.path in a config file is relative to that file
    let model_path = model
        .or_else(|| {
            let path = PathBuf::from(config.model.path.as_ref()?);
            Some(match &config_dir {
                Some(dir) if path.is_relative() => dir.join(path),
                _ => path,
            })
        })
        .context("No model given: pass --model or set model.path in the config")?;

    info!("Loading model: {}", model_path.display());
    let dense = DenseModel::load(&model_path)
        .with_context(|| format!("Failed to load model: {}", model_path.display()))?;

    let classifier = RuneClassifier::with_model(dense, &config);
    Ok((config, classifier))
}

fn load_features(path: &Path, input_len: usize) -> Result<Vec<f32>> {
    features::load(path, input_len)
        .with_context(|| format!("Failed to read input: {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    match cli.command {
        Commands::Classify {
            model,
            input,
            config,
            format,
        } => {
            let (config, mut classifier) = load_classifier(model, config)?;
            let features = load_features(&input, config.model.input_len)?;

            let result = classifier.classify(&features);
            if format == "pretty" {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", serde_json::to_string(&result)?);
            }
        }

        Commands::Stats {
            model,
            config,
            format,
            inputs,
        } => {
            let (config, mut classifier) = load_classifier(model, config)?;
            let stats = UsageAggregator::new();

            for input in &inputs {
                let features = load_features(input, config.model.input_len)?;
                let result = classifier.classify_recorded(&features, &stats);
                if !result.success {
                    info!("Skipped {}: no prediction", input.display());
                }
            }

            let snapshot = stats.snapshot();
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print!("{}", render_text(&snapshot));
            }
        }

        Commands::Info { model } => {
            info!("Loading model...");
            let dense = DenseModel::load(&model)
                .with_context(|| format!("Failed to load model: {}", model.display()))?;

            println!("rune-infer v{}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Model: {}", model.display());
            for desc in dense.input_tensor_descs() {
                println!("Input  {}: {}", desc.name, desc.shape);
            }
            for desc in dense.output_tensor_descs() {
                println!("Output {}: {}", desc.name, desc.shape);
            }
            println!("Classes: {}", dense.num_classes());
        }
    }

    Ok(())
}
