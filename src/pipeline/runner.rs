//! Drives sessions to completion with an automated participant

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Error, Result,
    app::{App, ExperimentConfig},
    identifiers::ParticipantId,
    ports::Participant,
    scoring::FinalStats,
    session::{EndReason, Phase, Transition, TrialSession},
};

/// Default cap on calls per session.
pub const DEFAULT_MAX_STEPS: usize = 1_000_000;

/// Result of one simulated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub participant_id: ParticipantId,
    pub participant: String,
    pub end_reason: EndReason,
    pub trials_completed: u32,
    pub final_wealth: i64,
    pub final_stats: FinalStats,
    /// Entry-point calls made
    pub steps: usize,
}

/// Session runner for automated participants
///
/// Answers whatever prompt the session is showing by calling the matching
/// entry point, as a presentation layer would. Presentation delays
/// (`Continuation`) are skipped.
#[derive(Debug, Clone)]
pub struct SessionRunner {
    max_steps: usize,
}

impl SessionRunner {
    pub fn new() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Run `session` from its current phase to `End`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stalled`] if the session rejects a call (for example a
    /// non-finite belief) or the step cap is reached first.
    pub fn run(
        &self,
        session: &mut TrialSession,
        participant: &mut dyn Participant,
    ) -> Result<RunSummary> {
        let mut steps = 0;

        while !session.phase().is_terminal() {
            if steps >= self.max_steps {
                return Err(stalled(session.phase(), steps));
            }
            steps += 1;

            let transition = step(session, participant);
            if let Transition::Rejected { phase, reason } = transition {
                debug!(%phase, reason, participant = participant.name(), "runner call rejected");
                return Err(stalled(phase, steps));
            }
        }

        let Phase::End(end_reason) = session.phase() else {
            return Err(stalled(session.phase(), steps));
        };
        let final_stats = session
            .final_stats()
            .copied()
            .ok_or_else(|| stalled(session.phase(), steps))?;

        Ok(RunSummary {
            participant_id: session.participant_id().clone(),
            participant: participant.name().to_string(),
            end_reason,
            trials_completed: session.recorded_trials().len() as u32,
            final_wealth: final_stats.final_wealth,
            final_stats,
            steps,
        })
    }

    /// Run `count` sessions created by `app`, all sharing its recorder.
    ///
    /// With a seed in `config`, session `i` uses `seed + i` for its dice and
    /// for the participant, so a batch is reproducible. `attach` is called on
    /// every new session before it runs, to add observers.
    pub fn run_batch<F>(
        &self,
        app: &App,
        config: &ExperimentConfig,
        participant: &mut dyn Participant,
        count: usize,
        mut attach: F,
    ) -> Result<Vec<RunSummary>>
    where
        F: FnMut(&mut TrialSession) -> Result<()>,
    {
        let mut summaries = Vec::with_capacity(count);
        for i in 0..count {
            let mut session_config = config.clone();
            if let Some(seed) = config.seed {
                let seed = seed.wrapping_add(i as u64);
                session_config.seed = Some(seed);
                participant.set_rng_seed(seed);
            }
            if count > 1 {
                // Each session needs its own id.
                session_config.participant_id = None;
            }

            let mut session = app.create_session(session_config)?;
            attach(&mut session)?;
            summaries.push(self.run(&mut session, participant)?);
        }
        Ok(summaries)
    }
}

impl Default for SessionRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn step(session: &mut TrialSession, participant: &mut dyn Participant) -> Transition {
    match session.phase() {
        Phase::Welcome => session.start_questionnaire(),
        Phase::Questionnaire => {
            let view = session.view();
            let question = view.question.as_deref().unwrap_or_default();
            let answer = participant.answer_item(view.question_index, question);
            session.answer_questionnaire_item(answer)
        }
        Phase::Instructions => session.begin_experiment(),
        Phase::TrialStart => session.open_first_stage(),
        Phase::StageAction => {
            let action = participant.choose_action(&session.view());
            session.handle_action(action)
        }
        Phase::StageBelief => {
            let belief = participant.report_belief(&session.view());
            session.handle_belief(belief)
        }
        Phase::StageInfo => session.acknowledge_info(),
        Phase::StageResult => session.end_trial(),
        Phase::BlockBreak => session.resume(),
        Phase::End(_) => Transition::Advanced(session.phase()),
    }
}

fn stalled(phase: Phase, steps: usize) -> Error {
    Error::Stalled {
        phase: phase.name().to_string(),
        steps,
    }
}
