//! Trial history: one snapshot per decision point, frozen into a record when
//! the trial resolves.

use serde::{Deserialize, Serialize};

use super::questionnaire::QuestionnaireAnswers;
use crate::{
    identifiers::ParticipantId,
    probability::GroundTruth,
    scoring::{BeliefScore, FinalStats},
    types::{Decision, Outcome},
};

/// Dice revealed at a stage and the sums they produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRoll {
    pub player_die: u32,
    pub house_die: u32,
    pub player_sum_after: i64,
    pub house_sum_after: i64,
}

/// State of the race at one decision point.
///
/// `ground_truth` is evaluated before the roll it predicts and never
/// recomputed; `roll` and `score` are filled in later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSnapshot {
    /// 1-based stage number. The terminal snapshot repeats the last stage
    /// (`n_stages`); tell it apart by `remaining_stages() == 0` or
    /// [`StageSnapshot::is_terminal`].
    pub stage: u32,
    /// Player sum before this stage's roll
    pub player_sum: i64,
    /// House sum before this stage's roll
    pub house_sum: i64,
    /// Wealth when the decision was presented
    pub wealth_available: i64,
    /// Bet when the decision was presented
    pub current_bet: i64,
    pub ground_truth: GroundTruth,
    pub decision: Decision,
    pub bet_after_action: i64,
    pub roll: Option<StageRoll>,
    pub score: Option<BeliefScore>,
}

impl StageSnapshot {
    pub fn remaining_stages(&self) -> u32 {
        self.ground_truth.remaining_stages
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.decision, Decision::NotApplicable)
    }
}

/// A trial in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    id: u32,
    wealth_start: i64,
    history: Vec<StageSnapshot>,
}

impl Trial {
    /// Start trial `id` (1-based) with the wealth held before the ante.
    pub fn new(id: u32, wealth_start: i64) -> Self {
        Self {
            id,
            wealth_start,
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn wealth_start(&self) -> i64 {
        self.wealth_start
    }

    pub fn history(&self) -> &[StageSnapshot] {
        &self.history
    }

    pub(crate) fn push(&mut self, snapshot: StageSnapshot) {
        self.history.push(snapshot);
    }

    /// Attach roll results to the most recent snapshot.
    ///
    /// Returns `false` if there is no snapshot or it already has a roll.
    pub(crate) fn record_roll(&mut self, roll: StageRoll) -> bool {
        match self.history.last_mut() {
            Some(snapshot) if snapshot.roll.is_none() => {
                snapshot.roll = Some(roll);
                true
            }
            _ => false,
        }
    }

    /// Score every snapshot carrying a real belief against `outcome`.
    ///
    /// Returns the accuracies in stage order.
    pub(crate) fn score_beliefs(&mut self, outcome: Outcome) -> Vec<f64> {
        self.history
            .iter_mut()
            .filter_map(|snapshot| {
                let belief = snapshot.decision.belief()?;
                let score = BeliefScore::score(belief, outcome);
                snapshot.score = Some(score);
                Some(score.accuracy)
            })
            .collect()
    }

    /// Consume the trial into its immutable record.
    pub(crate) fn freeze(self, resolution: TrialResolution) -> TrialRecord {
        TrialRecord {
            participant_id: resolution.participant_id,
            trial_id: self.id,
            outcome: resolution.outcome,
            payout: resolution.payout,
            wealth_start: self.wealth_start,
            wealth_end: resolution.wealth_end,
            history: self.history,
            questionnaire: resolution.questionnaire,
            final_stats: None,
        }
    }
}

/// Session-level facts needed to freeze a trial.
pub(crate) struct TrialResolution {
    pub participant_id: ParticipantId,
    pub outcome: Outcome,
    pub payout: i64,
    pub wealth_end: i64,
    pub questionnaire: Option<QuestionnaireAnswers>,
}

/// A resolved trial as handed to the recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub participant_id: ParticipantId,
    pub trial_id: u32,
    pub outcome: Outcome,
    pub payout: i64,
    pub wealth_start: i64,
    pub wealth_end: i64,
    pub history: Vec<StageSnapshot>,
    pub questionnaire: Option<QuestionnaireAnswers>,
    /// Back-filled once the experiment ends
    pub final_stats: Option<FinalStats>,
}
