//! Recorder that buffers trials in memory and writes a CSV file on flush.

use std::path::{Path, PathBuf};

use super::InMemoryRecorder;
use crate::{
    Result, export::CsvExporter, identifiers::ParticipantId, ports::Recorder,
    scoring::FinalStats, session::TrialRecord,
};

/// CSV file recorder.
///
/// Rows are written only on [`Recorder::flush`], after final statistics have
/// been back-filled, so every row carries the final payment figures.
///
/// # Examples
///
/// ```no_run
/// use wagerlab::adapters::CsvFileRecorder;
/// use wagerlab::ports::Recorder;
///
/// let recorder = CsvFileRecorder::new("experiment_data.csv");
/// // ... run a session with a clone of the recorder ...
/// recorder.flush()?;
/// # Ok::<(), wagerlab::Error>(())
/// ```
#[derive(Clone)]
pub struct CsvFileRecorder {
    path: PathBuf,
    buffer: InMemoryRecorder,
}

impl CsvFileRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            buffer: InMemoryRecorder::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Recorder for CsvFileRecorder {
    fn append(&self, trial: TrialRecord) {
        self.buffer.append(trial);
    }

    fn finalize(&self, participant: &ParticipantId, stats: &FinalStats) {
        self.buffer.finalize(participant, stats);
    }

    fn trials(&self) -> Vec<TrialRecord> {
        self.buffer.trials()
    }

    fn reset(&self) {
        self.buffer.reset();
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn flush(&self) -> Result<()> {
        CsvExporter::write_to_path(&self.rows(), &self.path)
    }
}
