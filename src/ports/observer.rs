//! Observer port - hooks into session events
//!
//! Observers let logging, metrics and event streams ride along with a
//! session without the state machine knowing about any output format.

use crate::{
    Result,
    scoring::FinalStats,
    session::{Phase, StageSnapshot, TrialRecord},
};

/// Observer of a running session.
///
/// # Event Sequence
///
/// 1. `on_phase_changed` for every accepted transition
/// 2. `on_stage_recorded` after each stage's dice are rolled
/// 3. `on_trial_resolved` when a trial is handed to the recorder
/// 4. `on_session_end` once, with the final payment figures
///
/// Errors returned from observers are logged by the session and otherwise
/// ignored; an observer can never stop an experiment.
///
/// # Examples
///
/// ```no_run
/// use wagerlab::{ports::SessionObserver, session::TrialRecord};
///
/// struct WinCounter {
///     wins: usize,
/// }
///
/// impl SessionObserver for WinCounter {
///     fn on_trial_resolved(&mut self, record: &TrialRecord) -> wagerlab::Result<()> {
///         if record.payout > 0 {
///             self.wins += 1;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait SessionObserver: Send {
    /// Called after the session moves from `from` to `to`.
    ///
    /// Self-transitions (e.g. answering a questionnaire item that is not the
    /// last) are reported too.
    fn on_phase_changed(&mut self, _from: Phase, _to: Phase) -> Result<()> {
        Ok(())
    }

    /// Called once per stage, after the roll has been attached to the
    /// snapshot.
    fn on_stage_recorded(&mut self, _trial_id: u32, _snapshot: &StageSnapshot) -> Result<()> {
        Ok(())
    }

    /// Called with the frozen record of every resolved trial.
    fn on_trial_resolved(&mut self, _record: &TrialRecord) -> Result<()> {
        Ok(())
    }

    /// Called when the session reaches its terminal phase.
    fn on_session_end(&mut self, _stats: &FinalStats) -> Result<()> {
        Ok(())
    }
}
