//! Logging Module
//!
//! Structured logging via the `tracing` crate, plus a small helper for
//! reporting training progress.

use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to include target (module path)
    pub include_target: bool,
    /// Whether to use ANSI colors
    pub ansi_colors: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            include_target: false,
            ansi_colors: true,
        }
    }
}

impl LogConfig {
    /// Create a verbose logging config for debugging
    pub fn verbose() -> Self {
        Self {
            level: Level::DEBUG,
            include_target: true,
            ansi_colors: true,
        }
    }

    /// Create a quiet logging config (errors only)
    ///
    /// Used by the one-shot process so stdout stays pure JSON.
    pub fn quiet() -> Self {
        Self {
            level: Level::ERROR,
            include_target: false,
            ansi_colors: false,
        }
    }
}

/// Filter directive used when `RUST_LOG` is not set
fn default_directive(config: &LogConfig) -> String {
    config.level.to_string()
}

/// Initialize logging with the given configuration
///
/// `RUST_LOG` overrides the configured level when set.
/// Returns an error string if a global subscriber was already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("Failed to initialize logging: {}", e))
}

/// Training progress logger
pub struct TrainingLogger {
    /// Current epoch (zero based)
    epoch: usize,
    /// Total epochs
    total_epochs: usize,
    /// Epoch start time
    epoch_start: std::time::Instant,
    /// Training start time
    training_start: std::time::Instant,
}

impl TrainingLogger {
    pub fn new(total_epochs: usize) -> Self {
        Self {
            epoch: 0,
            total_epochs,
            epoch_start: std::time::Instant::now(),
            training_start: std::time::Instant::now(),
        }
    }

    /// Log start of an epoch
    pub fn start_epoch(&mut self, epoch: usize) {
        self.epoch = epoch;
        self.epoch_start = std::time::Instant::now();

        tracing::info!("Epoch {}/{} started", epoch + 1, self.total_epochs);
    }

    /// Log end of an epoch with metrics
    pub fn end_epoch(&self, train_loss: f64, val_accuracy: f64, learning_rate: f64) {
        let epoch_time = self.epoch_start.elapsed();

        tracing::info!(
            "Epoch {}/{} completed in {:.1}s | Loss: {:.4} | Val Acc: {:.2}% | LR: {:.6}",
            self.epoch + 1,
            self.total_epochs,
            epoch_time.as_secs_f64(),
            train_loss,
            val_accuracy * 100.0,
            learning_rate
        );
    }

    /// Log early stopping at the target validation accuracy
    pub fn log_early_stop(&self, val_accuracy: f64, target: f64) {
        tracing::info!(
            "Early stop at epoch {}: validation accuracy {:.2}% exceeded target {:.2}%",
            self.epoch + 1,
            val_accuracy * 100.0,
            target * 100.0
        );
    }

    /// Log training completion
    pub fn log_complete(&self, epochs_run: usize, best_accuracy: f64) {
        let total_time = self.training_start.elapsed();

        tracing::info!(
            "Training complete: {} epochs in {:.1}s | Best val accuracy: {:.2}%",
            epochs_run,
            total_time.as_secs_f64(),
            best_accuracy * 100.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(config.ansi_colors);
    }

    #[test]
    fn test_quiet_config_is_errors_only() {
        let config = LogConfig::quiet();
        assert_eq!(config.level, Level::ERROR);
        assert!(!config.ansi_colors);
    }

    #[test]
    fn test_default_directive_follows_config_level() {
        assert_eq!(default_directive(&LogConfig::default()), "INFO");
        assert_eq!(default_directive(&LogConfig::quiet()), "ERROR");
        assert_eq!(default_directive(&LogConfig::verbose()), "DEBUG");
    }
}
