//! Recorder port: where resolved trials go.

use crate::{
    Result, export::ExportRow, identifiers::ParticipantId, scoring::FinalStats,
    session::TrialRecord,
};

/// Sink for frozen trial records.
///
/// The session holds a shared handle and appends one record per resolved
/// trial. Appending is assumed to succeed; only `flush` (which may touch the
/// file system) can fail.
///
/// Lifecycle: create, `append` during the run, `finalize` once the
/// experiment ends, then `rows`/`flush` for export and `reset` to reuse.
///
/// # Examples
///
/// ```
/// use wagerlab::adapters::InMemoryRecorder;
/// use wagerlab::ports::Recorder;
///
/// let recorder = InMemoryRecorder::new();
/// assert!(recorder.is_empty());
/// recorder.reset();
/// ```
pub trait Recorder: Send + Sync {
    /// Store a resolved trial.
    fn append(&self, trial: TrialRecord);

    /// Back-fill final payment figures onto every trial of `participant`.
    fn finalize(&self, participant: &ParticipantId, stats: &FinalStats);

    /// Copy of every stored trial, in append order.
    fn trials(&self) -> Vec<TrialRecord>;

    /// Discard everything recorded so far.
    fn reset(&self);

    fn len(&self) -> usize {
        self.trials().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten stored trials into export rows, one per stage snapshot.
    fn rows(&self) -> Vec<ExportRow> {
        self.trials().iter().flat_map(ExportRow::flatten).collect()
    }

    /// Persist whatever the recorder buffers. In-memory recorders do nothing.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
