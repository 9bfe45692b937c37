//! `TrialSession`: the only entry points an input handler may call.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{
    phase::{EndReason, Phase, Transition},
    questionnaire::QuestionnaireAnswers,
    trial::{StageRoll, StageSnapshot, Trial, TrialRecord, TrialResolution},
    view::{SessionView, TrialResult},
};
use crate::{
    Result,
    app::ExperimentConfig,
    export::ExportRow,
    identifiers::ParticipantId,
    ports::{DiceRoller, Recorder, SessionObserver},
    probability::GroundTruth,
    scoring::FinalStats,
    types::{Action, Decision, Outcome},
};

/// Bet adjustment applied at `StageAction`, waiting for its belief.
#[derive(Debug, Clone, Copy)]
struct PendingAction {
    action: Action,
    wealth_before: i64,
    bet_before: i64,
}

/// State machine for one participant's run through the experiment.
///
/// Every public mutator is a guarded transition: it either advances the
/// session or is rejected without side effects. Rejections are how repeated
/// or out-of-order input (a double "skip" on the reveal, a belief before an
/// action) is absorbed.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use wagerlab::{
///     adapters::{InMemoryRecorder, ScriptedDice},
///     app::ExperimentConfig,
///     session::{Phase, TrialSession},
///     types::Action,
/// };
///
/// let config = ExperimentConfig::default()
///     .with_trials(1)
///     .with_stages(1)
///     .without_questionnaire();
/// let dice = ScriptedDice::new(vec![5, 2])?;
/// let mut session =
///     TrialSession::new(config, Arc::new(InMemoryRecorder::new()), Box::new(dice))?;
///
/// let _ = session.start_questionnaire();
/// let _ = session.begin_experiment();
/// let _ = session.open_first_stage();
/// let _ = session.handle_action(Action::Hold);
/// let _ = session.handle_belief(70.0);
/// let _ = session.acknowledge_info();
/// assert_eq!(session.phase(), Phase::StageResult);
/// assert_eq!(session.wealth(), 500 - 15 + 30);
/// # Ok::<(), wagerlab::Error>(())
/// ```
pub struct TrialSession {
    config: ExperimentConfig,
    participant_id: ParticipantId,
    phase: Phase,

    wealth: i64,
    trial_index: u32,
    stage: u32,
    current_bet: i64,
    player_sum: i64,
    house_sum: i64,
    player_rolls: Vec<u32>,
    house_rolls: Vec<u32>,

    questionnaire: QuestionnaireAnswers,
    accuracy_scores: Vec<f64>,
    current_trial: Option<Trial>,
    pending_action: Option<PendingAction>,
    last_result: Option<TrialResult>,
    final_stats: Option<FinalStats>,

    recorder: Arc<dyn Recorder>,
    dice: Box<dyn DiceRoller>,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl TrialSession {
    /// Create a session in the `Welcome` phase.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfiguration`] if the configuration
    /// fails validation.
    pub fn new(
        config: ExperimentConfig,
        recorder: Arc<dyn Recorder>,
        dice: Box<dyn DiceRoller>,
    ) -> Result<Self> {
        config.validate()?;
        let participant_id = config
            .participant_id
            .clone()
            .unwrap_or_else(|| ParticipantId::generate(&mut rand::rng()));

        debug!(participant = %participant_id, "session created");

        Ok(Self {
            wealth: config.start_wealth,
            house_sum: config.starting_bias,
            config,
            participant_id,
            phase: Phase::Welcome,
            trial_index: 0,
            stage: 0,
            current_bet: 0,
            player_sum: 0,
            player_rolls: Vec::new(),
            house_rolls: Vec::new(),
            questionnaire: QuestionnaireAnswers::new(),
            accuracy_scores: Vec::new(),
            current_trial: None,
            pending_action: None,
            last_result: None,
            final_stats: None,
            recorder,
            dice,
            observers: Vec::new(),
        })
    }

    /// Attach an observer.
    pub fn with_observer(mut self, observer: Box<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    // ------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------

    /// `Welcome -> Questionnaire`, or straight to `Instructions` when the
    /// variant has no questionnaire.
    pub fn start_questionnaire(&mut self) -> Transition {
        if self.phase != Phase::Welcome {
            return self.reject("start_questionnaire", "only valid on the welcome screen");
        }
        if !self.config.has_questionnaire {
            return self.enter(Phase::Instructions);
        }
        self.questionnaire.clear();
        self.enter(Phase::Questionnaire)
    }

    /// Record the next questionnaire answer (clamped to `0..=3`).
    pub fn answer_questionnaire_item(&mut self, value: u8) -> Transition {
        if self.phase != Phase::Questionnaire {
            return self.reject("answer_questionnaire_item", "no questionnaire in progress");
        }
        let item = self.questionnaire.next_item();
        let stored = self.questionnaire.record(value);
        debug!(item, value, stored, "questionnaire answer");

        if self.questionnaire.is_complete() {
            self.enter(Phase::Instructions)
        } else {
            self.enter(Phase::Questionnaire)
        }
    }

    /// Leave the instructions and start the first trial.
    pub fn begin_experiment(&mut self) -> Transition {
        if self.phase != Phase::Instructions {
            return self.reject("begin_experiment", "instructions not showing");
        }
        self.start_trial(true)
    }

    /// Open stage 1 once the empty board has been displayed.
    pub fn open_first_stage(&mut self) -> Transition {
        if self.phase != Phase::TrialStart {
            return self.reject("open_first_stage", "no trial waiting to open");
        }
        self.stage = 1;
        self.enter(Phase::StageAction)
    }

    /// Continue after a block break.
    pub fn resume(&mut self) -> Transition {
        if self.phase != Phase::BlockBreak {
            return self.reject("resume", "not on a block break");
        }
        self.start_trial(false)
    }

    /// Apply a bet adjustment.
    ///
    /// `Retract` needs `current_bet >= bet_step`, `Add` needs
    /// `wealth >= bet_step`. An action whose precondition fails is recorded as
    /// `Hold`. Always moves on to `StageBelief`.
    pub fn handle_action(&mut self, action: Action) -> Transition {
        if self.phase != Phase::StageAction {
            return self.reject("handle_action", "not waiting for an action");
        }

        let step = self.config.bet_step;
        let wealth_before = self.wealth;
        let bet_before = self.current_bet;

        let applied = match action {
            Action::Retract if self.current_bet >= step => {
                self.current_bet -= step;
                self.wealth += step;
                Action::Retract
            }
            Action::Add if self.wealth >= step => {
                self.current_bet += step;
                self.wealth -= step;
                Action::Add
            }
            _ => Action::Hold,
        };

        if applied != action {
            debug!(requested = %action, "action precondition unmet, recorded as hold");
        }

        self.pending_action = Some(PendingAction {
            action: applied,
            wealth_before,
            bet_before,
        });
        self.enter(Phase::StageBelief)
    }

    /// Parse a raw action token; unknown tokens count as `Hold`.
    pub fn handle_action_token(&mut self, token: &str) -> Transition {
        self.handle_action(Action::from_token_lenient(token))
    }

    /// Record a win-probability belief in percent, then roll the stage.
    ///
    /// Values outside `0..=100` are clamped; a non-finite value is rejected.
    /// Ground truth is frozen here, before the dice it predicts are rolled.
    pub fn handle_belief(&mut self, percent: f64) -> Transition {
        if self.phase != Phase::StageBelief {
            return self.reject("handle_belief", "not waiting for a belief");
        }
        if !percent.is_finite() {
            return self.reject("handle_belief", "belief is not a number");
        }
        if self.current_trial.is_none() {
            return self.reject("handle_belief", "no trial in progress");
        }

        let belief = percent.clamp(0.0, 100.0) / 100.0;
        // Includes the stage about to be rolled.
        let remaining_stages = self.config.n_stages - self.stage + 1;
        let ground_truth = GroundTruth::evaluate(
            self.player_sum,
            self.house_sum,
            remaining_stages,
            self.config.dice_sides,
        );

        let pending = self.pending_action.take().unwrap_or(PendingAction {
            action: Action::Hold,
            wealth_before: self.wealth,
            bet_before: self.current_bet,
        });

        let snapshot = StageSnapshot {
            stage: self.stage,
            player_sum: self.player_sum,
            house_sum: self.house_sum,
            wealth_available: pending.wealth_before,
            current_bet: pending.bet_before,
            ground_truth,
            decision: Decision::Taken {
                action: pending.action,
                belief,
            },
            bet_after_action: self.current_bet,
            roll: None,
            score: None,
        };

        if let Some(trial) = self.current_trial.as_mut() {
            trial.push(snapshot);
        }

        if self.wealth < 0 {
            warn!(wealth = self.wealth, "negative wealth after belief, ending session");
            self.current_trial = None;
            return self.end_experiment(EndReason::Bankrupt);
        }

        self.roll_stage()
    }

    /// Advance past the roll reveal.
    ///
    /// Valid once per stage: a second call before the next action is
    /// rejected, so an animation callback racing a skip press cannot
    /// double-advance the stage.
    pub fn acknowledge_info(&mut self) -> Transition {
        if self.phase != Phase::StageInfo {
            return self.reject("acknowledge_info", "no roll being revealed");
        }
        if self.stage < self.config.n_stages {
            self.stage += 1;
            self.enter(Phase::StageAction)
        } else {
            self.resolve_trial()
        }
    }

    /// Leave the result screen and move on to the next trial.
    pub fn end_trial(&mut self) -> Transition {
        if self.phase != Phase::StageResult {
            return self.reject("end_trial", "no resolved trial on screen");
        }
        self.trial_index += 1;
        self.current_trial = None;
        self.start_trial(true)
    }

    // ------------------------------------------------------------------
    // Internal transitions
    // ------------------------------------------------------------------

    fn start_trial(&mut self, allow_break: bool) -> Transition {
        if self.trial_index >= self.config.n_trials {
            return self.end_experiment(EndReason::Completed);
        }

        if allow_break
            && self.config.has_block_breaks
            && self.trial_index > 0
            && self.trial_index.is_multiple_of(self.config.block_size)
        {
            return self.enter(Phase::BlockBreak);
        }

        if self.wealth < self.config.ante {
            warn!(
                wealth = self.wealth,
                ante = self.config.ante,
                "cannot cover the ante, ending session"
            );
            return self.end_experiment(EndReason::Bankrupt);
        }

        let wealth_start = self.wealth;
        self.wealth -= self.config.ante;
        self.current_bet = self.config.ante;
        self.stage = 0;
        self.player_sum = 0;
        self.house_sum = self.config.starting_bias;
        self.player_rolls.clear();
        self.house_rolls.clear();
        self.pending_action = None;
        self.current_trial = Some(Trial::new(self.trial_index + 1, wealth_start));

        debug!(
            trial = self.trial_index + 1,
            wealth = self.wealth,
            "trial started"
        );
        self.enter(Phase::TrialStart)
    }

    fn roll_stage(&mut self) -> Transition {
        let sides = self.config.dice_sides;
        let player_die = self.dice.roll(sides);
        let house_die = self.dice.roll(sides);

        self.player_rolls.push(player_die);
        self.house_rolls.push(house_die);
        self.player_sum += i64::from(player_die);
        self.house_sum += i64::from(house_die);

        let roll = StageRoll {
            player_die,
            house_die,
            player_sum_after: self.player_sum,
            house_sum_after: self.house_sum,
        };

        if let Some(trial) = self.current_trial.as_mut() {
            trial.record_roll(roll);
            let trial_id = trial.id();
            if let Some(snapshot) = trial.history().last() {
                for observer in &mut self.observers {
                    if let Err(err) = observer.on_stage_recorded(trial_id, snapshot) {
                        warn!(error = %err, "observer failed on stage");
                    }
                }
            }
        }

        self.enter(Phase::StageInfo)
    }

    fn resolve_trial(&mut self) -> Transition {
        let Some(mut trial) = self.current_trial.take() else {
            return self.reject("acknowledge_info", "no trial to resolve");
        };

        let outcome = Outcome::from_sums(self.player_sum, self.house_sum);
        let payout = match outcome {
            Outcome::Win => 2 * self.current_bet,
            Outcome::Loss => 0,
        };
        self.wealth += payout;

        // The board after the last roll, with no decision left to make.
        trial.push(StageSnapshot {
            stage: self.stage,
            player_sum: self.player_sum,
            house_sum: self.house_sum,
            wealth_available: self.wealth,
            current_bet: self.current_bet,
            ground_truth: GroundTruth::evaluate(
                self.player_sum,
                self.house_sum,
                0,
                self.config.dice_sides,
            ),
            decision: Decision::NotApplicable,
            bet_after_action: self.current_bet,
            roll: None,
            score: None,
        });

        let accuracies = trial.score_beliefs(outcome);
        self.accuracy_scores.extend(accuracies);

        let trial_id = trial.id();
        let record = trial.freeze(TrialResolution {
            participant_id: self.participant_id.clone(),
            outcome,
            payout,
            wealth_end: self.wealth,
            questionnaire: self
                .config
                .has_questionnaire
                .then(|| self.questionnaire.clone()),
        });

        info!(
            trial = trial_id,
            %outcome,
            payout,
            wealth = self.wealth,
            player_sum = self.player_sum,
            house_sum = self.house_sum,
            "trial resolved"
        );

        for observer in &mut self.observers {
            if let Err(err) = observer.on_trial_resolved(&record) {
                warn!(error = %err, "observer failed on trial resolution");
            }
        }
        self.recorder.append(record);

        self.last_result = Some(TrialResult {
            trial_id,
            outcome,
            payout,
        });
        self.enter(Phase::StageResult)
    }

    fn end_experiment(&mut self, reason: EndReason) -> Transition {
        let stats = match reason {
            EndReason::Completed => {
                FinalStats::compute(&self.accuracy_scores, self.wealth, self.config.base_pay)
            }
            EndReason::Bankrupt => FinalStats::bankrupt(&self.accuracy_scores, self.config.base_pay),
        };

        self.recorder.finalize(&self.participant_id, &stats);
        self.final_stats = Some(stats);

        info!(
            participant = %self.participant_id,
            ?reason,
            final_wealth = stats.final_wealth,
            mean_accuracy = stats.mean_accuracy,
            total_payment = stats.total_payment,
            "experiment finished"
        );

        let transition = self.enter(Phase::End(reason));
        for observer in &mut self.observers {
            if let Err(err) = observer.on_session_end(&stats) {
                warn!(error = %err, "observer failed on session end");
            }
        }
        transition
    }

    fn enter(&mut self, next: Phase) -> Transition {
        let from = self.phase;
        self.phase = next;
        debug!(%from, to = %next, stage = self.stage, "transition");
        for observer in &mut self.observers {
            if let Err(err) = observer.on_phase_changed(from, next) {
                warn!(error = %err, "observer failed on phase change");
            }
        }
        Transition::Advanced(next)
    }

    fn reject(&self, call: &'static str, reason: &'static str) -> Transition {
        debug!(call, phase = %self.phase, reason, "call rejected");
        Transition::Rejected {
            phase: self.phase,
            reason,
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    /// Snapshot of everything the presentation layer may display.
    pub fn view(&self) -> SessionView {
        SessionView {
            participant_id: self.participant_id.clone(),
            phase: self.phase,
            continuation: self.phase.continuation(self.config.board_reveal_delay()),
            wealth: self.wealth,
            current_bet: self.current_bet,
            trial_index: self.trial_index,
            n_trials: self.config.n_trials,
            trial_id: self.current_trial.as_ref().map(Trial::id),
            stage: self.stage,
            n_stages: self.config.n_stages,
            dice_sides: self.config.dice_sides,
            player_sum: self.player_sum,
            house_sum: self.house_sum,
            player_rolls: self.player_rolls.clone(),
            house_rolls: self.house_rolls.clone(),
            question_index: self.questionnaire.next_item(),
            question: self.questionnaire.next_question().map(str::to_string),
            questionnaire_total: self.questionnaire.total(),
            last_result: self.last_result,
            final_stats: self.final_stats,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    pub fn wealth(&self) -> i64 {
        self.wealth
    }

    pub fn current_bet(&self) -> i64 {
        self.current_bet
    }

    pub fn trial_index(&self) -> u32 {
        self.trial_index
    }

    pub fn stage(&self) -> u32 {
        self.stage
    }

    pub fn questionnaire(&self) -> &QuestionnaireAnswers {
        &self.questionnaire
    }

    /// Accuracy of every scored belief so far, across all trials.
    pub fn accuracy_scores(&self) -> &[f64] {
        &self.accuracy_scores
    }

    /// The trial in progress, if any.
    pub fn current_trial(&self) -> Option<&Trial> {
        self.current_trial.as_ref()
    }

    pub fn final_stats(&self) -> Option<&FinalStats> {
        self.final_stats.as_ref()
    }

    pub fn recorder(&self) -> Arc<dyn Recorder> {
        Arc::clone(&self.recorder)
    }

    /// Recorded trials of this participant.
    pub fn recorded_trials(&self) -> Vec<TrialRecord> {
        self.recorder
            .trials()
            .into_iter()
            .filter(|record| record.participant_id == self.participant_id)
            .collect()
    }

    /// Export rows for this participant, one per stage snapshot.
    pub fn export_rows(&self) -> Vec<ExportRow> {
        self.recorded_trials()
            .iter()
            .flat_map(ExportRow::flatten)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryRecorder, ScriptedDice};

    fn session(config: ExperimentConfig, faces: Vec<u32>) -> TrialSession {
        let dice = ScriptedDice::new(faces).unwrap();
        TrialSession::new(config, Arc::new(InMemoryRecorder::new()), Box::new(dice)).unwrap()
    }

    fn into_first_stage(session: &mut TrialSession) {
        let _ = session.start_questionnaire();
        let _ = session.begin_experiment();
        let _ = session.open_first_stage();
        assert_eq!(session.phase(), Phase::StageAction);
    }

    #[test]
    fn retract_below_step_degrades_to_hold() {
        let config = ExperimentConfig::default()
            .without_questionnaire()
            .with_ante(5)
            .with_bet_step(10);
        let mut session = session(config, vec![1]);
        into_first_stage(&mut session);

        let _ = session.handle_action(Action::Retract);
        assert_eq!(session.current_bet(), 5);
        assert_eq!(session.wealth(), 495);
        assert_eq!(
            session.pending_action.map(|p| p.action),
            Some(Action::Hold)
        );
    }

    #[test]
    fn add_without_wealth_degrades_to_hold() {
        let config = ExperimentConfig::default()
            .without_questionnaire()
            .with_start_wealth(18)
            .with_ante(15)
            .with_bet_step(5);
        let mut session = session(config, vec![1]);
        into_first_stage(&mut session);
        assert_eq!(session.wealth(), 3);

        let _ = session.handle_action(Action::Add);
        assert_eq!(session.current_bet(), 15);
        assert_eq!(session.wealth(), 3);
    }

    #[test]
    fn belief_is_clamped_and_nan_rejected() {
        let config = ExperimentConfig::default().without_questionnaire();
        let mut session = session(config, vec![3, 3]);
        into_first_stage(&mut session);
        let _ = session.handle_action(Action::Hold);

        let rejected = session.handle_belief(f64::NAN);
        assert!(!rejected.is_advanced());
        assert_eq!(session.phase(), Phase::StageBelief);

        let _ = session.handle_belief(150.0);
        let trial = session.current_trial().unwrap();
        assert_eq!(trial.history()[0].decision.belief(), Some(1.0));
    }

    #[test]
    fn out_of_phase_calls_leave_state_untouched() {
        let config = ExperimentConfig::default();
        let mut session = session(config, vec![1]);
        let wealth = session.wealth();

        assert!(!session.handle_action(Action::Add).is_advanced());
        assert!(!session.handle_belief(50.0).is_advanced());
        assert!(!session.acknowledge_info().is_advanced());
        assert!(!session.end_trial().is_advanced());
        assert!(!session.resume().is_advanced());
        assert_eq!(session.phase(), Phase::Welcome);
        assert_eq!(session.wealth(), wealth);
    }
}
