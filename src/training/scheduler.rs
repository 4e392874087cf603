//! Learning-rate Scheduling
//!
//! Step decay: the learning rate is multiplied by `gamma` every `step_size`
//! epochs. Two presets are carried for the two schedules used historically.

use serde::{Deserialize, Serialize};

/// Step-decay learning-rate schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepDecay {
    /// Decay interval in epochs
    pub step_size: usize,
    /// Multiplicative decay factor
    pub gamma: f64,
}

impl StepDecay {
    /// Decay by 10x every 7 epochs
    pub fn classic() -> Self {
        Self {
            step_size: 7,
            gamma: 0.1,
        }
    }

    /// Decay by 2x every 5 epochs
    pub fn gentle() -> Self {
        Self {
            step_size: 5,
            gamma: 0.5,
        }
    }

    /// Learning rate for a zero-based epoch index
    pub fn lr_at(&self, base_lr: f64, epoch: usize) -> f64 {
        base_lr * self.gamma.powi((epoch / self.step_size) as i32)
    }
}

impl Default for StepDecay {
    fn default() -> Self {
        Self::classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_schedule() {
        let schedule = StepDecay::classic();
        assert_eq!(schedule.lr_at(0.001, 0), 0.001);
        assert_eq!(schedule.lr_at(0.001, 6), 0.001);
        assert!((schedule.lr_at(0.001, 7) - 0.0001).abs() < 1e-12);
        assert!((schedule.lr_at(0.001, 14) - 0.00001).abs() < 1e-12);
    }

    #[test]
    fn test_gentle_schedule() {
        let schedule = StepDecay::gentle();
        assert_eq!(schedule.lr_at(0.01, 4), 0.01);
        assert!((schedule.lr_at(0.01, 5) - 0.005).abs() < 1e-12);
        assert!((schedule.lr_at(0.01, 10) - 0.0025).abs() < 1e-12);
    }
}
