//! Export of recorded trials for analysis
//!
//! Trials are flattened to one row per stage snapshot. Every row repeats the
//! trial-level and session-level figures, so the file can be analysed without
//! joins.

mod session_csv;

pub use session_csv::{CsvExporter, ExportRow};
