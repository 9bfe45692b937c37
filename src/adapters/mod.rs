//! Adapters implementing the session ports.
//!
//! Recorders decide where resolved trials end up; dice decide where faces
//! come from. The session only sees the traits in [`crate::ports`].

pub mod csv_recorder;
pub mod dice;
pub mod in_memory_recorder;

pub use csv_recorder::CsvFileRecorder;
pub use dice::{ScriptedDice, SeededDice};
pub use in_memory_recorder::InMemoryRecorder;
