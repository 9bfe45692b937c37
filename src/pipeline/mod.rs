//! Simulation pipeline
//!
//! This module provides the pieces needed to pilot the experiment without a
//! human at the keyboard:
//! - `SessionRunner` drives a session through every phase
//! - automated participants answer the prompts
//! - observers record what happened

pub mod observers;
pub mod participants;
pub mod runner;

pub use observers::{
    JsonlObserver, MetricsObserver, ProgressObserver, SessionEvent, SessionMetrics,
    TracingObserver,
};
pub use participants::{ConstantParticipant, NoisyParticipant, OracleParticipant};
pub use runner::{DEFAULT_MAX_STEPS, RunSummary, SessionRunner};

pub use crate::ports::{Participant, SessionObserver};
