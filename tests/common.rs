//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use wagerlab::{
    Action, Phase, TrialSession,
    adapters::{InMemoryRecorder, ScriptedDice},
    app::ExperimentConfig,
};

/// Session over an in-memory recorder with the given player/house dice.
pub fn scripted_session(
    config: ExperimentConfig,
    player: &[u32],
    house: &[u32],
) -> (TrialSession, InMemoryRecorder) {
    let recorder = InMemoryRecorder::new();
    let dice = ScriptedDice::from_rolls(player, house).unwrap();
    let session = TrialSession::new(config, Arc::new(recorder.clone()), Box::new(dice)).unwrap();
    (session, recorder)
}

/// Move a fresh session (without questionnaire) into stage 1 of trial 1.
pub fn into_first_stage(session: &mut TrialSession) {
    assert!(session.start_questionnaire().is_advanced());
    assert!(session.begin_experiment().is_advanced());
    assert!(session.open_first_stage().is_advanced());
    assert_eq!(session.phase(), Phase::StageAction);
}

/// Play one stage: action, belief, acknowledge the reveal.
pub fn play_stage(session: &mut TrialSession, action: Action, belief_percent: f64) {
    assert!(session.handle_action(action).is_advanced());
    assert!(session.handle_belief(belief_percent).is_advanced());
    assert_eq!(session.phase(), Phase::StageInfo);
    assert!(session.acknowledge_info().is_advanced());
}

/// Play the rest of the current trial with a constant action and belief.
pub fn play_trial(session: &mut TrialSession, action: Action, belief_percent: f64) {
    while session.phase() == Phase::StageAction {
        play_stage(session, action, belief_percent);
    }
    assert_eq!(session.phase(), Phase::StageResult);
}
