//! Closed vocabularies shared by the session, scoring and export layers.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Text written wherever an action or belief does not apply.
pub const NOT_APPLICABLE: &str = "N/A";

/// Bet adjustment chosen by the participant before a stage is rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Take `bet_step` back out of the pot.
    Retract,
    /// Leave the bet unchanged.
    Hold,
    /// Put another `bet_step` into the pot.
    Add,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Retract, Action::Hold, Action::Add];

    /// Parse a token, degrading anything unrecognised to [`Action::Hold`].
    ///
    /// Input handlers use this so that a stray key press never leaves the
    /// experiment stuck.
    pub fn from_token_lenient(token: &str) -> Self {
        token.parse().unwrap_or(Action::Hold)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Retract => "retract",
            Action::Hold => "hold",
            Action::Add => "add",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retract" | "r" => Ok(Action::Retract),
            "hold" | "h" => Ok(Action::Hold),
            "add" | "a" => Ok(Action::Add),
            _ => Err(crate::Error::UnknownAction {
                token: s.to_string(),
            }),
        }
    }
}

/// Result of a trial from the participant's side.
///
/// There is no draw: a tie counts as a loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    /// Resolve a finished race. Only a strict lead wins.
    pub fn from_sums(player_sum: i64, house_sum: i64) -> Self {
        if player_sum > house_sum {
            Outcome::Win
        } else {
            Outcome::Loss
        }
    }

    /// 1.0 for a win, 0.0 for a loss.
    pub fn indicator(&self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Loss => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "WIN",
            Outcome::Loss => "LOSS",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the participant did at a stage.
///
/// `NotApplicable` is the sentinel carried by the terminal snapshot, which
/// records the board after the last roll when no decision is left to make.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    Taken {
        action: Action,
        /// Reported win probability in `[0, 1]`.
        belief: f64,
    },
    NotApplicable,
}

impl Decision {
    pub fn action(&self) -> Option<Action> {
        match self {
            Decision::Taken { action, .. } => Some(*action),
            Decision::NotApplicable => None,
        }
    }

    pub fn belief(&self) -> Option<f64> {
        match self {
            Decision::Taken { belief, .. } => Some(*belief),
            Decision::NotApplicable => None,
        }
    }
}
