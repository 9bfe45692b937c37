//! In-memory trial recorder.
//!
//! Keeps frozen trials in a shared vector. Clones share the same storage, so
//! a test (or the CLI) can keep a handle while the session owns another.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{identifiers::ParticipantId, ports::Recorder, scoring::FinalStats, session::TrialRecord};

/// In-memory recorder.
///
/// # Examples
///
/// ```
/// use wagerlab::adapters::InMemoryRecorder;
/// use wagerlab::ports::Recorder;
///
/// let recorder = InMemoryRecorder::new();
/// let handle = recorder.clone();
/// assert_eq!(handle.len(), recorder.len());
/// ```
#[derive(Clone, Default)]
pub struct InMemoryRecorder {
    trials: Arc<Mutex<Vec<TrialRecord>>>,
}

impl InMemoryRecorder {
    /// Create a new empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of trials recorded for one participant.
    pub fn count_for(&self, participant: &ParticipantId) -> usize {
        self.trials
            .lock()
            .iter()
            .filter(|trial| &trial.participant_id == participant)
            .count()
    }
}

impl Recorder for InMemoryRecorder {
    fn append(&self, trial: TrialRecord) {
        self.trials.lock().push(trial);
    }

    fn finalize(&self, participant: &ParticipantId, stats: &FinalStats) {
        for trial in self
            .trials
            .lock()
            .iter_mut()
            .filter(|trial| &trial.participant_id == participant)
        {
            trial.final_stats = Some(*stats);
        }
    }

    fn trials(&self) -> Vec<TrialRecord> {
        self.trials.lock().clone()
    }

    fn reset(&self) {
        self.trials.lock().clear();
    }

    fn len(&self) -> usize {
        self.trials.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;

    fn record(participant: &str, trial_id: u32) -> TrialRecord {
        TrialRecord {
            participant_id: ParticipantId::new(participant),
            trial_id,
            outcome: Outcome::Loss,
            payout: 0,
            wealth_start: 500,
            wealth_end: 485,
            history: Vec::new(),
            questionnaire: None,
            final_stats: None,
        }
    }

    #[test]
    fn clone_shares_storage() {
        let recorder = InMemoryRecorder::new();
        let handle = recorder.clone();
        recorder.append(record("P-A", 1));
        assert_eq!(handle.len(), 1);
        handle.reset();
        assert!(recorder.is_empty());
    }

    #[test]
    fn finalize_only_touches_one_participant() {
        let recorder = InMemoryRecorder::new();
        recorder.append(record("P-A", 1));
        recorder.append(record("P-B", 1));
        recorder.append(record("P-A", 2));

        let stats = FinalStats::compute(&[0.5], 400, 3.0);
        recorder.finalize(&ParticipantId::new("P-A"), &stats);

        let trials = recorder.trials();
        assert_eq!(trials[0].final_stats, Some(stats));
        assert_eq!(trials[1].final_stats, None);
        assert_eq!(trials[2].final_stats, Some(stats));
        assert_eq!(recorder.count_for(&ParticipantId::new("P-A")), 2);
    }
}
