//! Simulate command - Pilot the task with automated participants

use std::{path::PathBuf, sync::Arc};

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use tracing::info;

use crate::{
    adapters::{CsvFileRecorder, InMemoryRecorder},
    app::App,
    cli::{
        config::ExperimentArgs,
        output::{create_progress, format_money, format_percent, print_section, print_stats_table},
    },
    pipeline::{
        ConstantParticipant, JsonlObserver, MetricsObserver, NoisyParticipant, OracleParticipant,
        RunSummary, SessionRunner, TracingObserver,
    },
    ports::{Participant, Recorder},
    types::Action,
};

/// Built-in automated participants
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantKind {
    /// Reports exact probabilities and bets with the odds
    Oracle,
    /// Same action and belief every stage
    Constant,
    /// Oracle with belief noise and random actions
    Noisy,
}

#[derive(Parser, Debug)]
#[command(about = "Run whole sessions with an automated participant")]
pub struct SimulateArgs {
    #[command(flatten)]
    pub experiment: ExperimentArgs,

    /// Participant strategy
    #[arg(long, short = 'p', value_enum, default_value = "oracle")]
    pub participant: ParticipantKind,

    /// Number of sessions
    #[arg(long, short = 's', default_value_t = 1)]
    pub sessions: usize,

    /// Action for the constant participant (retract, hold, add)
    #[arg(long, default_value = "hold")]
    pub action: String,

    /// Belief in percent for the constant participant
    #[arg(long, default_value_t = 50.0)]
    pub belief: f64,

    /// Belief noise half-width in percentage points (noisy participant)
    #[arg(long, default_value_t = 15.0)]
    pub noise: f64,

    /// Probability of a random action (noisy participant)
    #[arg(long, default_value_t = 0.2)]
    pub exploration: f64,

    /// Write every stage snapshot to this CSV file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Stream session events to this JSONL file (single session only)
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Write the run summaries as JSON
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub quiet: bool,
}

pub fn execute(args: SimulateArgs) -> Result<()> {
    let config = args.experiment.resolve()?;
    if args.sessions == 0 {
        bail!("--sessions must be at least 1");
    }
    if args.events.is_some() && args.sessions > 1 {
        bail!("--events streams a single session; drop it or use --sessions 1");
    }

    let mut participant: Box<dyn Participant> = match args.participant {
        ParticipantKind::Oracle => Box::new(OracleParticipant::new()),
        ParticipantKind::Constant => {
            let action: Action = args.action.parse()?;
            Box::new(ConstantParticipant::new(action, args.belief))
        }
        ParticipantKind::Noisy => Box::new(NoisyParticipant::new(
            args.noise,
            args.exploration,
            config.seed,
        )),
    };

    let recorder: Arc<dyn Recorder> = match &args.output {
        Some(path) => Arc::new(CsvFileRecorder::new(path.clone())),
        None => Arc::new(InMemoryRecorder::new()),
    };
    let mut builder = App::for_testing().with_shared_recorder(Arc::clone(&recorder));
    if let Some(seed) = config.seed {
        builder = builder.with_default_seed(seed);
    }
    let app = builder.build();

    print_section("Simulation");
    print_stats_table(&[
        ("Participant", participant.name().to_string()),
        ("Sessions", args.sessions.to_string()),
        ("Trials per session", config.n_trials.to_string()),
        ("Stages per trial", config.n_stages.to_string()),
        ("Dice sides", config.dice_sides.to_string()),
        ("Ante / bet step", format!("{} / {}", config.ante, config.bet_step)),
    ]);

    let metrics = MetricsObserver::new();
    let progress = if args.quiet {
        None
    } else {
        Some(create_progress(args.sessions as u64, "sessions")?)
    };

    let runner = SessionRunner::new();
    let summaries = runner.run_batch(&app, &config, participant.as_mut(), args.sessions, |session| {
        session.add_observer(Box::new(TracingObserver::new()));
        session.add_observer(Box::new(metrics.clone()));
        if let Some(path) = &args.events {
            let observer = JsonlObserver::new(path, session.participant_id().clone())?;
            session.add_observer(Box::new(observer));
        }
        if let Some(pb) = &progress {
            pb.inc(1);
        }
        Ok(())
    })?;
    if let Some(pb) = &progress {
        pb.finish_with_message("done");
    }

    recorder.flush()?;
    if let Some(path) = &args.output {
        info!(path = %path.display(), rows = recorder.rows().len(), "wrote stage export");
    }
    if let Some(path) = &args.summary {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, &summaries)?;
    }

    print_results(&summaries, &metrics);
    Ok(())
}

fn print_results(summaries: &[RunSummary], metrics: &MetricsObserver) {
    let m = metrics.summary();

    print_section("Results");
    print_stats_table(&[
        ("Sessions", m.sessions.to_string()),
        ("Bankruptcies", m.bankruptcies.to_string()),
        ("Trials", m.trials.to_string()),
        ("Win rate", format_percent(m.win_rate())),
        ("Actions (R/H/A)", format!("{}/{}/{}", m.retracts, m.holds, m.adds)),
        ("Mean Brier score", format!("{:.4}", m.mean_brier())),
        ("Mean |belief - truth|", format!("{:.4}", m.mean_calibration_error())),
        ("Mean payment", format_money(m.mean_payment())),
    ]);

    if summaries.len() == 1 {
        let s = &summaries[0];
        print_stats_table(&[
            ("Participant id", s.participant_id.to_string()),
            ("Final wealth", s.final_wealth.to_string()),
            ("Mean accuracy", format!("{:.4}", s.final_stats.mean_accuracy)),
            ("Performance reward", format_money(s.final_stats.performance_reward)),
            ("Total payment", format_money(s.final_stats.total_payment)),
        ]);
    }
}
