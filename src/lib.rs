//! Multi-stage dice wagering experiment with belief elicitation
//!
//! This crate provides:
//! - An exact probability engine for dice-sum races (win/loss, ties, entropy)
//! - The trial state machine a presentation layer drives, one call per input
//! - Brier-score accuracy and the final payment calculation
//! - Recorders that export every stage snapshot as CSV
//! - A simulation pipeline for piloting the task with automated participants

pub mod adapters;
pub mod app;
pub mod cli;
pub mod error;
pub mod export;
pub mod identifiers;
pub mod pipeline;
pub mod ports;
pub mod probability;
pub mod scoring;
pub mod session;
pub mod types;

pub use error::{Error, Result};
pub use identifiers::ParticipantId;
pub use session::{Phase, Transition, TrialSession};
pub use types::{Action, Decision, Outcome};
