//! Mushroom Vision CLI
//!
//! Entry point for training the mushroom classifiers and running single-image
//! predictions from the command line.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing::info;

use mushroom_vision::backend::{backend_name, default_device, TrainingBackend};
use mushroom_vision::dataset::AugmentationConfig;
use mushroom_vision::inference::{Predictor, DEFAULT_MODEL_PATH};
use mushroom_vision::model::Architecture;
use mushroom_vision::training::{self, StepDecay, TrainingConfig};
use mushroom_vision::utils::logging::{init_logging, LogConfig};

/// Mushroom Edibility Classification
///
/// Train convolutional classifiers on a mushroom image dataset and classify
/// single images as edible or poisonous.
#[derive(Parser, Debug)]
#[command(name = "mushroom-vision")]
#[command(version)]
#[command(about = "Mushroom edibility classification with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Learning-rate schedule presets
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SchedulerPreset {
    /// Multiply the learning rate by 0.1 every 7 epochs
    Classic,
    /// Multiply the learning rate by 0.5 every 5 epochs
    Gentle,
}

impl SchedulerPreset {
    fn to_decay(self) -> StepDecay {
        match self {
            Self::Classic => StepDecay::classic(),
            Self::Gentle => StepDecay::gentle(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train a classifier on a mushroom image dataset
    Train {
        /// Path to the dataset directory (one subdirectory per class)
        #[arg(short, long, env = "DATA_DIR", default_value = "data/mushrooms")]
        data_dir: PathBuf,

        /// Model architecture to train
        #[arg(short, long, value_enum, default_value = "cnn")]
        architecture: Architecture,

        /// Number of training epochs
        #[arg(short, long, env = "TRAIN_EPOCHS", default_value = "25")]
        epochs: usize,

        /// Batch size for training
        #[arg(short, long, env = "TRAIN_BATCH_SIZE", default_value = "32")]
        batch_size: usize,

        /// Learning rate
        #[arg(short, long, env = "TRAIN_LEARNING_RATE", default_value = "0.001")]
        learning_rate: f64,

        /// Square image resolution (must be divisible by 16)
        #[arg(long, env = "IMAGE_SIZE", default_value = "256")]
        image_size: usize,

        /// Learning-rate schedule preset
        #[arg(long, value_enum, default_value = "classic")]
        scheduler: SchedulerPreset,

        /// Random seed for splits, shuffling, and augmentation
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Disable training-time data augmentation
        #[arg(long, default_value = "false")]
        no_augmentation: bool,

        /// Disable early stopping at target validation accuracy
        #[arg(long, default_value = "false")]
        no_early_stop: bool,

        /// Target validation accuracy for early stopping (0.0-1.0)
        #[arg(long, default_value = "0.95")]
        target_accuracy: f64,

        /// Output directory for model snapshots
        #[arg(short, long, default_value = "models")]
        output_dir: PathBuf,
    },

    /// Classify a single image with a trained model
    Predict {
        /// Path to the input image
        #[arg(short, long)]
        image: PathBuf,

        /// Path to the trained model snapshot
        #[arg(short, long, env = "MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let _ = init_logging(&log_config);

    print_banner();

    match cli.command {
        Commands::Train {
            data_dir,
            architecture,
            epochs,
            batch_size,
            learning_rate,
            image_size,
            scheduler,
            seed,
            no_augmentation,
            no_early_stop,
            target_accuracy,
            output_dir,
        } => {
            let config = TrainingConfig {
                architecture,
                epochs,
                batch_size,
                learning_rate,
                seed,
                image_size,
                scheduler: scheduler.to_decay(),
                early_stop_accuracy: if no_early_stop {
                    None
                } else {
                    Some(target_accuracy)
                },
                augmentation: if no_augmentation {
                    None
                } else {
                    Some(AugmentationConfig::default())
                },
                artifact_dir: output_dir,
            };

            let device = default_device();
            let history = training::train::<TrainingBackend>(&data_dir, &config, &device)?;

            println!();
            println!(
                "{} best validation accuracy {:.2}%, test accuracy {:.2}%",
                "Training finished:".green().bold(),
                history.best_val_accuracy * 100.0,
                history.test_accuracy.unwrap_or_default() * 100.0
            );
        }

        Commands::Predict { image, model } => {
            cmd_predict(&image, &model)?;
        }
    }

    Ok(())
}

fn cmd_predict(image: &PathBuf, model: &PathBuf) -> Result<()> {
    use mushroom_vision::backend::DefaultBackend;

    info!("Running prediction");
    info!("  Image: {}", image.display());
    info!("  Model: {}", model.display());

    println!("{}", "Prediction Configuration:".cyan().bold());
    println!("  Image:   {}", image.display());
    println!("  Model:   {}", model.display());
    println!("  Backend: {}", backend_name());
    println!();

    let device = default_device();
    let predictor = Predictor::<DefaultBackend>::load(model, &device)?;
    info!(
        "Loaded {} snapshot trained at {}px",
        predictor.architecture(),
        predictor.image_size()
    );

    let bytes = std::fs::read(image)?;
    let result = predictor.predict_bytes(&bytes)?;

    let label = if result.prediction == "edible" {
        result.prediction.green().bold()
    } else {
        result.prediction.red().bold()
    };
    println!(
        "{} {} ({:.1}% confidence)",
        "Prediction:".cyan().bold(),
        label,
        result.confidence * 100.0
    );
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        r#"
 ==============================================
   Mushroom Vision
   Edible / Poisonous Classification with Burn
 ==============================================
  "#
        .green()
    );
}
