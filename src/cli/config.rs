//! Experiment configuration shared across commands
//!
//! A JSON file (`--config`) provides the base; individual flags override it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::{app::ExperimentConfig, identifiers::ParticipantId};

/// Flags describing the experiment variant
#[derive(Args, Debug, Clone, Default)]
pub struct ExperimentArgs {
    /// JSON file with an experiment configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Participant tag (random if absent)
    #[arg(long)]
    pub participant_id: Option<String>,

    /// Wealth at the start of the session
    #[arg(long)]
    pub start_wealth: Option<i64>,

    /// Ante taken at the start of every trial
    #[arg(long)]
    pub ante: Option<i64>,

    /// Amount moved by one retract or add
    #[arg(long)]
    pub bet_step: Option<i64>,

    /// Number of trials
    #[arg(long, short = 't')]
    pub trials: Option<u32>,

    /// Stages (dice pairs) per trial
    #[arg(long)]
    pub stages: Option<u32>,

    /// Faces per die
    #[arg(long)]
    pub sides: Option<u32>,

    /// Head start given to the house
    #[arg(long, allow_hyphen_values = true)]
    pub starting_bias: Option<i64>,

    /// Trials between block breaks
    #[arg(long)]
    pub block_size: Option<u32>,

    /// Flat show-up payment in dollars
    #[arg(long)]
    pub base_pay: Option<f64>,

    /// Skip the gambling questionnaire
    #[arg(long)]
    pub no_questionnaire: bool,

    /// Run all trials without block breaks
    #[arg(long)]
    pub no_block_breaks: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,
}

impl ExperimentArgs {
    /// Build the validated configuration.
    pub fn resolve(&self) -> Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ExperimentConfig::default(),
        };

        if let Some(id) = &self.participant_id {
            config.participant_id = Some(ParticipantId::new(id.as_str()));
        }
        if let Some(v) = self.start_wealth {
            config.start_wealth = v;
        }
        if let Some(v) = self.ante {
            config.ante = v;
        }
        if let Some(v) = self.bet_step {
            config.bet_step = v;
        }
        if let Some(v) = self.trials {
            config.n_trials = v;
        }
        if let Some(v) = self.stages {
            config.n_stages = v;
        }
        if let Some(v) = self.sides {
            config.dice_sides = v;
        }
        if let Some(v) = self.starting_bias {
            config.starting_bias = v;
        }
        if let Some(v) = self.block_size {
            config.block_size = v;
        }
        if let Some(v) = self.base_pay {
            config.base_pay = v;
        }
        if self.no_questionnaire {
            config.has_questionnaire = false;
        }
        if self.no_block_breaks {
            config.has_block_breaks = false;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        config.validate()?;
        Ok(config)
    }
}
