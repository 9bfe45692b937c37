//! Tests for the simulation pipeline

use std::io::BufRead;

use wagerlab::{
    Action, Phase,
    adapters::{InMemoryRecorder, ScriptedDice},
    app::{App, ExperimentConfig},
    pipeline::{
        ConstantParticipant, JsonlObserver, MetricsObserver, NoisyParticipant, OracleParticipant,
        ProgressObserver, SessionEvent, SessionRunner,
    },
    ports::{Participant, Recorder},
    session::{EndReason, SessionView},
};

fn app_with_recorder(seed: u64) -> (App, InMemoryRecorder) {
    let recorder = InMemoryRecorder::new();
    let app = App::for_testing()
        .with_recorder(recorder.clone())
        .with_default_seed(seed)
        .build();
    (app, recorder)
}

/// Test a full default session with the oracle
#[test]
fn test_oracle_completes_session() {
    let (app, recorder) = app_with_recorder(42);
    let mut session = app.create_session(ExperimentConfig::default()).unwrap();
    let mut oracle = OracleParticipant::new();

    let summary = SessionRunner::new().run(&mut session, &mut oracle).unwrap();

    assert_eq!(summary.end_reason, EndReason::Completed);
    assert_eq!(summary.trials_completed, 10);
    assert_eq!(summary.participant, "oracle");
    assert_eq!(recorder.len(), 10);
    assert!(summary.final_stats.mean_accuracy > 0.5);
    assert!(
        recorder
            .trials()
            .iter()
            .all(|t| t.final_stats == Some(summary.final_stats))
    );
}

/// Test that seeded runs are reproducible
#[test]
fn test_seeded_runs_are_deterministic() {
    let run = || {
        let (app, recorder) = app_with_recorder(7);
        let mut session = app.create_session(ExperimentConfig::default()).unwrap();
        let mut participant = NoisyParticipant::new(10.0, 0.3, Some(7));
        let summary = SessionRunner::new().run(&mut session, &mut participant).unwrap();
        (summary, recorder.rows())
    };

    let (a, rows_a) = run();
    let (b, rows_b) = run();
    assert_eq!(a, b);
    assert_eq!(rows_a, rows_b);
}

/// Test that an always-adding participant can go bankrupt cleanly
#[test]
fn test_losing_streak_ends_in_bankruptcy() {
    let app = App::new();
    let config = ExperimentConfig::default()
        .with_start_wealth(60)
        .with_trials(10)
        .without_questionnaire();
    let dice = ScriptedDice::from_rolls(&[1], &[6]).unwrap();
    let mut session = app.create_session_with_dice(config, Box::new(dice)).unwrap();
    let mut participant = ConstantParticipant::new(Action::Add, 80.0);

    let summary = SessionRunner::new().run(&mut session, &mut participant).unwrap();

    assert_eq!(summary.end_reason, EndReason::Bankrupt);
    assert_eq!(summary.final_wealth, 0);
    assert!(summary.final_stats.bankrupt);
    assert_eq!(summary.final_stats.total_payment, summary.final_stats.base_pay);
}

struct NanBeliever;

impl Participant for NanBeliever {
    fn name(&self) -> &str {
        "nan"
    }

    fn choose_action(&mut self, _view: &SessionView) -> Action {
        Action::Hold
    }

    fn report_belief(&mut self, _view: &SessionView) -> f64 {
        f64::NAN
    }
}

/// Test that a participant whose input is always rejected stalls the runner
#[test]
fn test_rejected_input_stalls() {
    let app = App::new();
    let mut session = app.create_session(ExperimentConfig::default()).unwrap();

    let err = SessionRunner::new()
        .run(&mut session, &mut NanBeliever)
        .unwrap_err();

    assert!(matches!(err, wagerlab::Error::Stalled { .. }));
    assert_eq!(session.phase(), Phase::StageBelief);
}

/// Test the step cap
#[test]
fn test_step_cap() {
    let app = App::new();
    let mut session = app.create_session(ExperimentConfig::default()).unwrap();
    let result = SessionRunner::new()
        .with_max_steps(5)
        .run(&mut session, &mut OracleParticipant::new());
    assert!(matches!(result, Err(wagerlab::Error::Stalled { steps: 5, .. })));
}

/// Test metrics collection across a batch
#[test]
fn test_metrics_observer_batch() {
    let (app, recorder) = app_with_recorder(11);
    let config = ExperimentConfig::default()
        .with_trials(4)
        .with_seed(11)
        .without_questionnaire();
    let metrics = MetricsObserver::new();
    let mut participant = ConstantParticipant::new(Action::Hold, 50.0);

    let summaries = SessionRunner::new()
        .run_batch(&app, &config, &mut participant, 3, |session| {
            session.add_observer(Box::new(metrics.clone()));
            Ok(())
        })
        .unwrap();

    assert_eq!(summaries.len(), 3);
    let m = metrics.summary();
    assert_eq!(m.sessions, 3);
    assert_eq!(m.trials, 12);
    assert_eq!(m.wins + m.losses, 12);
    assert_eq!(m.holds, 36);
    assert_eq!(m.beliefs, 36);
    assert!((m.mean_brier() - 0.25).abs() < 1e-12);
    assert_eq!(recorder.len(), 12);

    // Every session got its own participant id.
    let mut ids: Vec<_> = summaries.iter().map(|s| s.participant_id.clone()).collect();
    ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

/// Test the oracle is perfectly calibrated against ground truth
#[test]
fn test_oracle_has_no_calibration_error() {
    let (app, _) = app_with_recorder(3);
    let metrics = MetricsObserver::new();
    let mut session = app
        .create_session(ExperimentConfig::default().without_questionnaire())
        .unwrap()
        .with_observer(Box::new(metrics.clone()));

    SessionRunner::new()
        .run(&mut session, &mut OracleParticipant::new())
        .unwrap();

    assert!(metrics.summary().mean_calibration_error() < 1e-9);
}

/// Test JSONL event stream
#[test]
fn test_jsonl_observer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let (app, _) = app_with_recorder(5);
    let config = ExperimentConfig::default()
        .with_trials(2)
        .with_stages(3)
        .without_questionnaire();
    let mut session = app.create_session(config).unwrap();
    let observer = JsonlObserver::new(&path, session.participant_id().clone()).unwrap();
    session.add_observer(Box::new(observer.with_phase_events()));

    SessionRunner::new()
        .run(&mut session, &mut OracleParticipant::new())
        .unwrap();
    drop(session);

    let file = std::fs::File::open(&path).unwrap();
    let events: Vec<SessionEvent> = std::io::BufReader::new(file)
        .lines()
        .map(|line| serde_json::from_str(&line.unwrap()).unwrap())
        .collect();

    let stages = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::Stage { .. }))
        .count();
    let trials = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::Trial { .. }))
        .count();
    assert_eq!(stages, 6);
    assert_eq!(trials, 2);
    assert!(events.iter().any(|e| matches!(e, SessionEvent::Phase { .. })));
    assert!(matches!(events.last(), Some(SessionEvent::End { .. })));
}

/// Test progress observer with a hidden bar
#[test]
fn test_progress_observer() {
    let (app, _) = app_with_recorder(9);
    let bar = indicatif::ProgressBar::hidden();
    let mut session = app
        .create_session(ExperimentConfig::default().with_trials(3))
        .unwrap()
        .with_observer(Box::new(ProgressObserver::with_bar(bar.clone())));

    SessionRunner::new()
        .run(&mut session, &mut OracleParticipant::new())
        .unwrap();

    assert_eq!(bar.position(), 3);
    assert!(bar.is_finished());
}
