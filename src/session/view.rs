//! Read-only view polled by the presentation layer after every call.

use serde::{Deserialize, Serialize};

use super::phase::{Continuation, Phase};
use crate::{identifiers::ParticipantId, scoring::FinalStats, types::Outcome};

/// Result of the most recently resolved trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial_id: u32,
    pub outcome: Outcome,
    pub payout: i64,
}

/// Everything a display needs, copied out of the session.
///
/// Ground-truth probabilities are deliberately absent: they are recorded,
/// never shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub participant_id: ParticipantId,
    pub phase: Phase,
    pub continuation: Option<Continuation>,
    pub wealth: i64,
    pub current_bet: i64,
    /// 0-based count of trials started so far
    pub trial_index: u32,
    pub n_trials: u32,
    /// 1-based id of the trial on screen
    pub trial_id: Option<u32>,
    /// Current stage (0 before the first stage opens)
    pub stage: u32,
    pub n_stages: u32,
    pub dice_sides: u32,
    pub player_sum: i64,
    pub house_sum: i64,
    pub player_rolls: Vec<u32>,
    pub house_rolls: Vec<u32>,
    pub question_index: usize,
    pub question: Option<String>,
    pub questionnaire_total: u32,
    pub last_result: Option<TrialResult>,
    pub final_stats: Option<FinalStats>,
}

impl SessionView {
    /// Stages left including the one about to be rolled.
    pub fn remaining_stages(&self) -> u32 {
        (self.n_stages + 1).saturating_sub(self.stage)
    }
}
