//! Belief scoring and end-of-experiment payment.
//!
//! Reported beliefs are scored with the Brier rule against the realised
//! outcome of their trial; `1 - brier` is the accuracy that feeds payment.

use serde::{Deserialize, Serialize};

use crate::types::Outcome;

/// Fixed show-up fee added to every payment.
pub const DEFAULT_BASE_PAY: f64 = 3.00;

/// Squared error between a reported win probability and the outcome.
pub fn brier_score(belief: f64, outcome: Outcome) -> f64 {
    (belief - outcome.indicator()).powi(2)
}

/// Accuracy derived from a Brier score.
pub fn accuracy(brier: f64) -> f64 {
    1.0 - brier
}

/// Brier score and accuracy of one scored belief.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeliefScore {
    pub brier: f64,
    pub accuracy: f64,
}

impl BeliefScore {
    pub fn score(belief: f64, outcome: Outcome) -> Self {
        let brier = brier_score(belief, outcome);
        Self {
            brier,
            accuracy: accuracy(brier),
        }
    }
}

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Payment figures computed once when the experiment ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalStats {
    pub final_wealth: i64,
    pub mean_accuracy: f64,
    pub performance_reward: f64,
    pub base_pay: f64,
    pub total_payment: f64,
    pub bankrupt: bool,
}

impl FinalStats {
    /// Payment for a session that ran to completion.
    ///
    /// `performance_reward = max(0, wealth) * mean_accuracy / 100`.
    pub fn compute(accuracy_scores: &[f64], wealth: i64, base_pay: f64) -> Self {
        let final_wealth = wealth.max(0);
        let mean_accuracy = mean(accuracy_scores);
        let performance_reward = final_wealth as f64 * mean_accuracy / 100.0;
        Self {
            final_wealth,
            mean_accuracy,
            performance_reward,
            base_pay,
            total_payment: performance_reward + base_pay,
            bankrupt: false,
        }
    }

    /// Degenerate payment for a session that ran out of money: wealth counts
    /// as zero, so only the base pay remains.
    pub fn bankrupt(accuracy_scores: &[f64], base_pay: f64) -> Self {
        Self {
            bankrupt: true,
            ..Self::compute(accuracy_scores, 0, base_pay)
        }
    }
}
