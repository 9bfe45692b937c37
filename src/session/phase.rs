//! Phases of a session and the result of calling an entry point.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Why a session reached its terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// All configured trials were played.
    Completed,
    /// Wealth could not cover the ante, or went negative mid-trial.
    Bankrupt,
}

/// Where the session currently is.
///
/// ```text
/// Welcome -> Questionnaire -> Instructions -> TrialStart -> StageAction
///   -> StageBelief -> StageInfo -> (StageAction ... | StageResult)
///   -> (TrialStart | BlockBreak | End)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Welcome,
    Questionnaire,
    Instructions,
    /// Ante paid, empty board shown; waiting for the first stage to open.
    TrialStart,
    StageAction,
    StageBelief,
    /// Dice rolled; waiting for the reveal to finish or be skipped.
    StageInfo,
    StageResult,
    BlockBreak,
    End(EndReason),
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::End(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Welcome => "WELCOME",
            Phase::Questionnaire => "QUESTIONNAIRE",
            Phase::Instructions => "INSTRUCTIONS",
            Phase::TrialStart => "TRIAL_START",
            Phase::StageAction => "STAGE_ACTION",
            Phase::StageBelief => "STAGE_BELIEF",
            Phase::StageInfo => "STAGE_INFO",
            Phase::StageResult => "STAGE_RESULT",
            Phase::BlockBreak => "BLOCK_BREAK",
            Phase::End(_) => "END",
        }
    }

    /// Continuation the presentation layer owns while in this phase.
    pub fn continuation(&self, board_reveal_delay: Duration) -> Option<Continuation> {
        match self {
            Phase::TrialStart => Some(Continuation::OpenFirstStage {
                after: board_reveal_delay,
            }),
            Phase::StageInfo => Some(Continuation::FinishReveal),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pending step that the presentation layer schedules.
///
/// The core never sleeps or reads a clock. It only says which call is
/// expected next and, for cosmetic pauses, how long the pause is meant to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Continuation {
    /// Call `open_first_stage` once the empty board has been shown.
    OpenFirstStage { after: Duration },
    /// Call `acknowledge_info` exactly once, after the roll reveal completes
    /// or as soon as the participant skips it.
    FinishReveal,
}

/// Result of calling a session entry point.
///
/// There is no error channel: a call that does not fit the current phase or
/// carries unusable input is rejected and leaves the session untouched.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The call was accepted; the session is now in this phase.
    Advanced(Phase),
    /// The call was ignored.
    Rejected { phase: Phase, reason: &'static str },
}

impl Transition {
    pub fn is_advanced(&self) -> bool {
        matches!(self, Transition::Advanced(_))
    }

    /// Phase the session is in after the call.
    pub fn phase(&self) -> Phase {
        match self {
            Transition::Advanced(phase) => *phase,
            Transition::Rejected { phase, .. } => *phase,
        }
    }
}
