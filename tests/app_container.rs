//! Integration tests for the dependency injection container.
//!
//! These tests cover:
//! - Sessions sharing the app's recorder
//! - Deterministic behavior with fixed seeds
//! - Caller-supplied dice

use wagerlab::{
    Action, Phase,
    adapters::{InMemoryRecorder, ScriptedDice},
    app::{App, ExperimentConfig},
    pipeline::{OracleParticipant, SessionRunner},
    ports::Recorder,
};

#[test]
fn test_sessions_share_the_app_recorder() {
    let recorder = InMemoryRecorder::new();
    let app = App::for_testing()
        .with_recorder(recorder.clone())
        .with_default_seed(1)
        .build();

    let config = ExperimentConfig::default().with_trials(2);
    let mut first = app
        .create_session(config.clone().with_participant_id("P-FIRST"))
        .unwrap();
    let mut second = app
        .create_session(config.with_participant_id("P-SECOND"))
        .unwrap();

    let runner = SessionRunner::new();
    runner.run(&mut first, &mut OracleParticipant::new()).unwrap();
    runner.run(&mut second, &mut OracleParticipant::new()).unwrap();

    assert_eq!(recorder.len(), 4);
    assert_eq!(app.recorder().len(), 4);
    assert_eq!(recorder.count_for(first.participant_id()), 2);
    assert_eq!(first.recorded_trials().len(), 2);
    assert_eq!(second.export_rows().len(), 8);

    // Each participant's trials carry their own final stats.
    for record in recorder.trials() {
        let owner = if record.participant_id == *first.participant_id() {
            &first
        } else {
            &second
        };
        assert_eq!(record.final_stats.as_ref(), owner.final_stats());
    }
}

#[test]
fn test_same_seed_same_dice() {
    let config = ExperimentConfig::default().with_seed(99).with_trials(3);

    let app1 = App::for_testing().build();
    let app2 = App::for_testing().build();
    let mut s1 = app1.create_session(config.clone()).unwrap();
    let mut s2 = app2.create_session(config).unwrap();
    assert_eq!(s1.participant_id(), s2.participant_id());

    let runner = SessionRunner::new();
    let a = runner.run(&mut s1, &mut OracleParticipant::new()).unwrap();
    let b = runner.run(&mut s2, &mut OracleParticipant::new()).unwrap();
    assert_eq!(a, b);
    assert_eq!(s1.export_rows(), s2.export_rows());
}

#[test]
fn test_config_seed_overrides_app_default() {
    let app = App::for_testing().with_default_seed(1).build();
    let session = app
        .create_session(ExperimentConfig::default().with_seed(2))
        .unwrap();
    assert_eq!(session.config().seed, Some(2));
}

#[test]
fn test_create_session_with_scripted_dice() {
    let app = App::new();
    let config = ExperimentConfig::default()
        .with_trials(1)
        .with_stages(1)
        .without_questionnaire();
    let dice = ScriptedDice::from_rolls(&[6], &[1]).unwrap();
    let mut session = app.create_session_with_dice(config, Box::new(dice)).unwrap();

    let _ = session.start_questionnaire();
    let _ = session.begin_experiment();
    let _ = session.open_first_stage();
    let _ = session.handle_action(Action::Hold);
    let _ = session.handle_belief(90.0);
    let _ = session.acknowledge_info();
    assert_eq!(session.phase(), Phase::StageResult);
    assert_eq!(session.wealth(), 515);
}

#[test]
fn test_invalid_config_is_an_error() {
    let app = App::new();
    let err = app
        .create_session(ExperimentConfig::default().with_stages(0))
        .err()
        .unwrap();
    assert!(matches!(err, wagerlab::Error::InvalidConfiguration { .. }));
}
