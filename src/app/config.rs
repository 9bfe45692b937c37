//! Experiment configuration.

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, identifiers::ParticipantId, scoring::DEFAULT_BASE_PAY};

/// Immutable parameters of one experiment session.
///
/// # Examples
///
/// ```
/// use wagerlab::app::ExperimentConfig;
///
/// let config = ExperimentConfig::default()
///     .with_trials(20)
///     .with_ante(20)
///     .with_bet_step(10)
///     .without_questionnaire()
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Participant tag; generated at session creation when absent
    pub participant_id: Option<ParticipantId>,
    pub start_wealth: i64,
    /// Stake deducted at the start of every trial
    pub ante: i64,
    /// Amount moved by a single retract/add action
    pub bet_step: i64,
    pub n_trials: u32,
    /// Dice rolled per party per trial
    pub n_stages: u32,
    pub dice_sides: u32,
    /// House head start added to its running sum
    pub starting_bias: i64,
    /// Trials between block breaks
    pub block_size: u32,
    /// Show-up fee added to the performance reward
    pub base_pay: f64,
    pub has_questionnaire: bool,
    pub has_block_breaks: bool,
    /// Advisory pause before the first stage of a trial, in milliseconds
    pub board_reveal_delay_ms: u64,
    /// Seed for dice and participant tag generation
    pub seed: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            participant_id: None,
            start_wealth: 500,
            ante: 15,
            bet_step: 5,
            n_trials: 10,
            n_stages: 3,
            dice_sides: 6,
            starting_bias: 0,
            block_size: 100,
            base_pay: DEFAULT_BASE_PAY,
            has_questionnaire: true,
            has_block_breaks: true,
            board_reveal_delay_ms: 100,
            seed: None,
        }
    }
}

impl ExperimentConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| Error::Io {
            operation: format!("open config {path:?}"),
            source,
        })?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_participant_id(mut self, id: impl Into<ParticipantId>) -> Self {
        self.participant_id = Some(id.into());
        self
    }

    pub fn with_start_wealth(mut self, wealth: i64) -> Self {
        self.start_wealth = wealth;
        self
    }

    pub fn with_ante(mut self, ante: i64) -> Self {
        self.ante = ante;
        self
    }

    pub fn with_bet_step(mut self, step: i64) -> Self {
        self.bet_step = step;
        self
    }

    pub fn with_trials(mut self, n_trials: u32) -> Self {
        self.n_trials = n_trials;
        self
    }

    pub fn with_stages(mut self, n_stages: u32) -> Self {
        self.n_stages = n_stages;
        self
    }

    pub fn with_dice_sides(mut self, sides: u32) -> Self {
        self.dice_sides = sides;
        self
    }

    pub fn with_starting_bias(mut self, bias: i64) -> Self {
        self.starting_bias = bias;
        self
    }

    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_base_pay(mut self, base_pay: f64) -> Self {
        self.base_pay = base_pay;
        self
    }

    /// Skip the questionnaire phase: Welcome leads straight to Instructions.
    pub fn without_questionnaire(mut self) -> Self {
        self.has_questionnaire = false;
        self
    }

    pub fn without_block_breaks(mut self) -> Self {
        self.has_block_breaks = false;
        self
    }

    pub fn with_board_reveal_delay(mut self, delay: Duration) -> Self {
        self.board_reveal_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the random seed for deterministic dice.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn board_reveal_delay(&self) -> Duration {
        Duration::from_millis(self.board_reveal_delay_ms)
    }

    /// Check the structural constraints the state machine relies on.
    pub fn validate(&self) -> Result<()> {
        if self.dice_sides < 2 {
            return Err(Error::invalid_config(format!(
                "dice_sides must be at least 2, got {}",
                self.dice_sides
            )));
        }
        if self.n_stages == 0 {
            return Err(Error::invalid_config("n_stages must be at least 1"));
        }
        if self.ante <= 0 {
            return Err(Error::invalid_config(format!(
                "ante must be positive, got {}",
                self.ante
            )));
        }
        if self.bet_step <= 0 {
            return Err(Error::invalid_config(format!(
                "bet_step must be positive, got {}",
                self.bet_step
            )));
        }
        if self.block_size == 0 {
            return Err(Error::invalid_config("block_size must be at least 1"));
        }
        if self.start_wealth < 0 {
            return Err(Error::invalid_config(format!(
                "start_wealth must be non-negative, got {}",
                self.start_wealth
            )));
        }
        if !self.base_pay.is_finite() || self.base_pay < 0.0 {
            return Err(Error::invalid_config(format!(
                "base_pay must be a non-negative number, got {}",
                self.base_pay
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ExperimentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.start_wealth, 500);
        assert_eq!(config.n_stages, 3);
        assert_eq!(config.block_size, 100);
    }

    #[test]
    fn rejects_one_sided_dice() {
        let err = ExperimentConfig::default().with_dice_sides(1).validate();
        assert!(matches!(err, Err(Error::InvalidConfiguration { .. })));
    }

    #[test]
    fn rejects_non_positive_steps() {
        assert!(ExperimentConfig::default().with_bet_step(0).validate().is_err());
        assert!(ExperimentConfig::default().with_ante(-5).validate().is_err());
        assert!(ExperimentConfig::default().with_stages(0).validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ExperimentConfig =
            serde_json::from_str(r#"{"n_trials": 4, "ante": 20, "has_block_breaks": false}"#)
                .unwrap();
        assert_eq!(config.n_trials, 4);
        assert_eq!(config.ante, 20);
        assert!(!config.has_block_breaks);
        assert_eq!(config.bet_step, 5);
    }
}
