//! Subcommand implementations

pub mod play;
pub mod probability;
pub mod simulate;
