//! Supervised Training Loop
//!
//! Per epoch: train over shuffled mini-batches (forward, cross-entropy,
//! backward, Adam step), evaluate on the validation partition, step the
//! learning-rate schedule, and check the early-stop threshold. The parameter
//! snapshot and the epoch history are written at the end of the run, early
//! stop included.

use std::path::Path;

use burn::data::dataloader::batcher::Batcher;
use burn::module::AutodiffModule;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use colored::Colorize;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::loader::{load_rgb, scan_dataset, to_chw, ImageSample};
use crate::dataset::split::{DatasetSplits, SplitConfig};
use crate::dataset::{Augmenter, MushroomBatcher, MushroomItem};
use crate::model::cnn::MushroomCnnConfig;
use crate::model::resnet::TransferResNetConfig;
use crate::model::snapshot::{save_snapshot, Architecture, SnapshotMeta};
use crate::model::ImageClassifier;
use crate::training::TrainingConfig;
use crate::utils::error::{MushroomError, Result};
use crate::utils::logging::TrainingLogger;
use crate::NUM_CLASSES;

/// Metrics recorded for one epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub train_loss: f64,
    pub train_accuracy: f64,
    pub val_loss: f64,
    pub val_accuracy: f64,
    pub learning_rate: f64,
}

/// Full record of a training run, persisted as `history.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochMetrics>,
    pub best_val_accuracy: f64,
    pub early_stopped: bool,
    pub test_loss: Option<f64>,
    pub test_accuracy: Option<f64>,
}

impl TrainingHistory {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Train the configured architecture on the dataset under `data_dir`
///
/// Scans the class directories, builds stratified splits, runs the epoch
/// loop, then writes the snapshot (with its metadata sidecar) and the history
/// into the artifact directory. Failures abort the run.
pub fn train<B: AutodiffBackend>(
    data_dir: &Path,
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<TrainingHistory> {
    config.validate()?;

    let samples = scan_dataset(data_dir)?;
    if samples.is_empty() {
        return Err(MushroomError::Dataset(format!(
            "no labeled samples under {}",
            data_dir.display()
        )));
    }

    let splits = DatasetSplits::stratified(
        &samples,
        &SplitConfig {
            seed: config.seed,
            ..Default::default()
        },
    )?;

    println!("{}", "Training Configuration:".cyan().bold());
    println!("  Architecture:  {}", config.architecture);
    println!("  Image size:    {}", config.image_size);
    println!("  Epochs:        {}", config.epochs);
    println!("  Batch size:    {}", config.batch_size);
    println!("  Learning rate: {}", config.learning_rate);
    println!(
        "  Samples:       {} train / {} val / {} test",
        splits.train.len(),
        splits.validation.len(),
        splits.test.len()
    );
    println!();

    match config.architecture {
        Architecture::Cnn => {
            let model = MushroomCnnConfig::new()
                .with_num_classes(NUM_CLASSES)
                .with_image_size(config.image_size)
                .init::<B>(device);
            fit(model, &splits, config, device)
        }
        Architecture::Resnet18 => {
            let model = TransferResNetConfig::new()
                .with_num_classes(NUM_CLASSES)
                .init::<B>(device);
            fit(model, &splits, config, device)
        }
    }
}

fn fit<B, M>(
    mut model: M,
    splits: &DatasetSplits,
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<TrainingHistory>
where
    B: AutodiffBackend,
    M: ImageClassifier<B> + AutodiffModule<B>,
    M::InnerModule: ImageClassifier<B::InnerBackend>,
{
    B::seed(config.seed);

    let batcher = MushroomBatcher::<B>::new(device, config.image_size);
    let valid_batcher = MushroomBatcher::<B::InnerBackend>::new(device, config.image_size);

    let mut optim = AdamConfig::new().init::<B, M>();
    let loss_fn = CrossEntropyLossConfig::new().init(device);

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut augmenter = config
        .augmentation
        .map(|aug| Augmenter::new(aug, config.seed));

    let mut history = TrainingHistory::default();
    let mut logger = TrainingLogger::new(config.epochs);
    let mut order: Vec<ImageSample> = splits.train.clone();

    for epoch in 0..config.epochs {
        logger.start_epoch(epoch);
        let lr = config.scheduler.lr_at(config.learning_rate, epoch);

        order.shuffle(&mut rng);

        let mut running_loss = 0.0;
        let mut correct = 0usize;

        for chunk in order.chunks(config.batch_size) {
            let items = load_items(chunk, config.image_size, augmenter.as_mut())?;
            let batch = batcher.batch(items, device);

            let logits = model.forward(batch.images);
            let loss = loss_fn.forward(logits.clone(), batch.targets.clone());

            running_loss += loss.clone().into_scalar().elem::<f64>() * chunk.len() as f64;
            correct += count_correct(&logits, &batch.targets);

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(lr, model, grads);
        }

        let n_train = order.len() as f64;
        let train_loss = running_loss / n_train;
        let train_accuracy = correct as f64 / n_train;

        let valid_model = model.valid();
        let (val_loss, val_accuracy) = evaluate(
            &valid_model,
            &splits.validation,
            &valid_batcher,
            config.batch_size,
            config.image_size,
            device,
        )?;

        history.epochs.push(EpochMetrics {
            epoch,
            train_loss,
            train_accuracy,
            val_loss,
            val_accuracy,
            learning_rate: lr,
        });
        history.best_val_accuracy = history.best_val_accuracy.max(val_accuracy);

        logger.end_epoch(train_loss, val_accuracy, lr);
        println!(
            "  Epoch {:>3}: loss {:.4} | train acc {:>6.2}% | val acc {:>6.2}%",
            epoch + 1,
            train_loss,
            train_accuracy * 100.0,
            val_accuracy * 100.0
        );

        if let Some(target) = config.early_stop_accuracy {
            if val_accuracy > target {
                logger.log_early_stop(val_accuracy, target);
                println!(
                    "{}",
                    format!(
                        "  Early stop: validation accuracy {:.2}% > {:.2}%",
                        val_accuracy * 100.0,
                        target * 100.0
                    )
                    .green()
                );
                history.early_stopped = true;
                break;
            }
        }
    }

    // Final held-out evaluation before the model is consumed by the save
    let valid_model = model.valid();
    if !splits.test.is_empty() {
        let (test_loss, test_accuracy) = evaluate(
            &valid_model,
            &splits.test,
            &valid_batcher,
            config.batch_size,
            config.image_size,
            device,
        )?;
        info!(
            "Test set: loss {:.4}, accuracy {:.2}%",
            test_loss,
            test_accuracy * 100.0
        );
        history.test_loss = Some(test_loss);
        history.test_accuracy = Some(test_accuracy);
    }

    let stem = config.snapshot_stem();
    let meta = SnapshotMeta::new(config.architecture, config.image_size, NUM_CLASSES);
    save_snapshot(model, &meta, &stem)?;
    history.save(config.artifact_dir.join("history.json"))?;

    logger.log_complete(history.epochs.len(), history.best_val_accuracy);
    println!(
        "{} {}",
        "Saved snapshot to".green(),
        stem.display().to_string().bold()
    );

    Ok(history)
}

/// Load a batch of samples from disk, augmenting when an augmenter is given
fn load_items(
    samples: &[ImageSample],
    image_size: usize,
    mut augmenter: Option<&mut Augmenter>,
) -> Result<Vec<MushroomItem>> {
    let mut items = Vec::with_capacity(samples.len());
    for sample in samples {
        let mut rgb = load_rgb(&sample.path, image_size)?;
        if let Some(aug) = augmenter.as_deref_mut() {
            rgb = aug.apply(&rgb);
        }
        items.push(MushroomItem {
            image: to_chw(&rgb),
            label: sample.label,
        });
    }
    Ok(items)
}

/// Count predictions matching the targets in one batch
fn count_correct<B: Backend>(logits: &Tensor<B, 2>, targets: &Tensor<B, 1, Int>) -> usize {
    let predicted = logits.clone().argmax(1).flatten::<1>(0, 1);
    predicted
        .equal(targets.clone())
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}

/// Forward-only evaluation over a partition, returning (mean loss, accuracy)
fn evaluate<B: Backend, M: ImageClassifier<B>>(
    model: &M,
    samples: &[ImageSample],
    batcher: &MushroomBatcher<B>,
    batch_size: usize,
    image_size: usize,
    device: &B::Device,
) -> Result<(f64, f64)> {
    if samples.is_empty() {
        return Ok((0.0, 0.0));
    }

    let loss_fn = CrossEntropyLossConfig::new().init(device);
    let mut total_loss = 0.0;
    let mut correct = 0usize;

    for chunk in samples.chunks(batch_size) {
        let items = load_items(chunk, image_size, None)?;
        let batch = batcher.batch(items, device);

        let logits = model.forward(batch.images);
        let loss = loss_fn.forward(logits.clone(), batch.targets.clone());

        total_loss += loss.into_scalar().elem::<f64>() * chunk.len() as f64;
        correct += count_correct(&logits, &batch.targets);
    }

    let n = samples.len() as f64;
    Ok((total_loss / n, correct as f64 / n))
}
