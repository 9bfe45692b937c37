//! Observers for running sessions
//!
//! Observers allow composable data collection during a session without
//! coupling the state machine to specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::Arc,
};

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    Result,
    identifiers::ParticipantId,
    ports::SessionObserver,
    scoring::FinalStats,
    session::{Phase, StageSnapshot, TrialRecord},
    types::{Action, Outcome},
};

/// Tracing observer - Logs every stage as structured fields
#[derive(Debug, Default)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl SessionObserver for TracingObserver {
    fn on_stage_recorded(&mut self, trial_id: u32, snapshot: &StageSnapshot) -> Result<()> {
        debug!(
            trial = trial_id,
            stage = snapshot.stage,
            player_sum = snapshot.player_sum,
            house_sum = snapshot.house_sum,
            remaining = snapshot.remaining_stages(),
            win_prob = snapshot.ground_truth.probabilities.win,
            entropy = snapshot.ground_truth.entropy,
            action = snapshot.decision.action().map(|a| a.as_str()),
            belief = snapshot.decision.belief(),
            player_die = snapshot.roll.map(|r| r.player_die),
            house_die = snapshot.roll.map(|r| r.house_die),
            "stage recorded"
        );
        Ok(())
    }

    fn on_trial_resolved(&mut self, record: &TrialRecord) -> Result<()> {
        debug!(
            trial = record.trial_id,
            outcome = %record.outcome,
            payout = record.payout,
            wealth_end = record.wealth_end,
            "trial recorded"
        );
        Ok(())
    }

    fn on_session_end(&mut self, stats: &FinalStats) -> Result<()> {
        info!(
            bankrupt = stats.bankrupt,
            total_payment = stats.total_payment,
            "session over"
        );
        Ok(())
    }
}

/// Aggregate metrics over one or more sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub sessions: usize,
    pub bankruptcies: usize,
    pub trials: usize,
    pub wins: usize,
    pub losses: usize,
    /// Scored beliefs (terminal snapshots excluded)
    pub beliefs: usize,
    pub brier_sum: f64,
    /// Sum of |belief - exact win probability| at decision time
    pub calibration_error_sum: f64,
    pub retracts: usize,
    pub holds: usize,
    pub adds: usize,
    pub total_payout: i64,
    pub total_payment: f64,
}

impl SessionMetrics {
    pub fn win_rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.wins as f64 / self.trials as f64
        }
    }

    pub fn mean_brier(&self) -> f64 {
        if self.beliefs == 0 {
            0.0
        } else {
            self.brier_sum / self.beliefs as f64
        }
    }

    /// Mean distance between reported and exact win probabilities.
    pub fn mean_calibration_error(&self) -> f64 {
        if self.beliefs == 0 {
            0.0
        } else {
            self.calibration_error_sum / self.beliefs as f64
        }
    }

    pub fn mean_payment(&self) -> f64 {
        if self.sessions == 0 {
            0.0
        } else {
            self.total_payment / self.sessions as f64
        }
    }

    fn record_trial(&mut self, record: &TrialRecord) {
        self.trials += 1;
        match record.outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
        }
        self.total_payout += record.payout;

        for snapshot in &record.history {
            if let Some(action) = snapshot.decision.action() {
                match action {
                    Action::Retract => self.retracts += 1,
                    Action::Hold => self.holds += 1,
                    Action::Add => self.adds += 1,
                }
            }
            if let (Some(belief), Some(score)) = (snapshot.decision.belief(), snapshot.score) {
                self.beliefs += 1;
                self.brier_sum += score.brier;
                self.calibration_error_sum +=
                    (belief - snapshot.ground_truth.probabilities.win).abs();
            }
        }
    }
}

/// Metrics observer - Tracks outcome and calibration metrics
///
/// The session takes ownership of its observers, so the metrics live behind a
/// shared handle. Clone the observer (or call [`MetricsObserver::handle`])
/// before attaching it to keep read access; one observer may be attached to
/// several sessions in turn to aggregate across them.
#[derive(Debug, Clone, Default)]
pub struct MetricsObserver {
    metrics: Arc<Mutex<SessionMetrics>>,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> Arc<Mutex<SessionMetrics>> {
        Arc::clone(&self.metrics)
    }

    /// Copy of the metrics collected so far
    pub fn summary(&self) -> SessionMetrics {
        self.metrics.lock().clone()
    }
}

impl SessionObserver for MetricsObserver {
    fn on_trial_resolved(&mut self, record: &TrialRecord) -> Result<()> {
        self.metrics.lock().record_trial(record);
        Ok(())
    }

    fn on_session_end(&mut self, stats: &FinalStats) -> Result<()> {
        let mut metrics = self.metrics.lock();
        metrics.sessions += 1;
        if stats.bankrupt {
            metrics.bankruptcies += 1;
        }
        metrics.total_payment += stats.total_payment;
        Ok(())
    }
}

/// One line of a JSONL event stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Phase {
        participant_id: ParticipantId,
        from: Phase,
        to: Phase,
    },
    Stage {
        participant_id: ParticipantId,
        trial_id: u32,
        snapshot: StageSnapshot,
    },
    Trial {
        record: TrialRecord,
    },
    End {
        participant_id: ParticipantId,
        stats: FinalStats,
    },
}

/// JSONL observer - Streams session events in JSON Lines format
pub struct JsonlObserver {
    writer: BufWriter<File>,
    participant_id: ParticipantId,
    include_phases: bool,
}

impl JsonlObserver {
    /// Create a JSONL observer writing to `path` (truncated).
    pub fn new<P: AsRef<Path>>(path: P, participant_id: ParticipantId) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| crate::Error::Io {
            operation: format!("create event log {}", path.display()),
            source,
        })?;
        Ok(Self {
            writer: BufWriter::new(file),
            participant_id,
            include_phases: false,
        })
    }

    /// Also emit an event for every phase change.
    pub fn with_phase_events(mut self) -> Self {
        self.include_phases = true;
        self
    }

    fn write_event(&mut self, event: &SessionEvent) -> Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        writeln!(&mut self.writer)?;
        Ok(())
    }
}

impl SessionObserver for JsonlObserver {
    fn on_phase_changed(&mut self, from: Phase, to: Phase) -> Result<()> {
        if !self.include_phases {
            return Ok(());
        }
        let event = SessionEvent::Phase {
            participant_id: self.participant_id.clone(),
            from,
            to,
        };
        self.write_event(&event)
    }

    fn on_stage_recorded(&mut self, trial_id: u32, snapshot: &StageSnapshot) -> Result<()> {
        let event = SessionEvent::Stage {
            participant_id: self.participant_id.clone(),
            trial_id,
            snapshot: snapshot.clone(),
        };
        self.write_event(&event)
    }

    fn on_trial_resolved(&mut self, record: &TrialRecord) -> Result<()> {
        self.write_event(&SessionEvent::Trial {
            record: record.clone(),
        })?;
        self.writer.flush()?;
        Ok(())
    }

    fn on_session_end(&mut self, stats: &FinalStats) -> Result<()> {
        let event = SessionEvent::End {
            participant_id: self.participant_id.clone(),
            stats: *stats,
        };
        self.write_event(&event)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Progress bar observer - Shows trial progress within a session
pub struct ProgressObserver {
    progress_bar: ProgressBar,
    wins: usize,
    losses: usize,
}

impl ProgressObserver {
    /// Create a progress bar sized for `total_trials`.
    pub fn new(total_trials: u64) -> Result<Self> {
        let pb = ProgressBar::new(total_trials);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} trials ({msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        Ok(Self::with_bar(pb))
    }

    /// Wrap an existing bar, e.g. `ProgressBar::hidden()` in tests.
    pub fn with_bar(progress_bar: ProgressBar) -> Self {
        Self {
            progress_bar,
            wins: 0,
            losses: 0,
        }
    }

    fn message(&self) -> String {
        format!("W:{} L:{}", self.wins, self.losses)
    }
}

impl SessionObserver for ProgressObserver {
    fn on_trial_resolved(&mut self, record: &TrialRecord) -> Result<()> {
        match record.outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
        }
        self.progress_bar.inc(1);
        self.progress_bar.set_message(self.message());
        Ok(())
    }

    fn on_session_end(&mut self, stats: &FinalStats) -> Result<()> {
        let mut message = self.message();
        if stats.bankrupt {
            message.push_str(" bankrupt");
        }
        self.progress_bar.finish_with_message(message);
        Ok(())
    }
}
