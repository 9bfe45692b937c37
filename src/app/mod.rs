//! Application layer with dependency injection container.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │           Application Layer (app)           │
//! │  ┌──────────────────────────────────────┐   │
//! │  │       App (DI Container)             │   │
//! │  └──────────────┬───────────────────────┘   │
//! │                 │ owns                      │
//! │                 ▼                           │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  Infrastructure (adapters)           │   │
//! │  │  - InMemoryRecorder / CsvFileRecorder│   │
//! │  │  - SeededDice / ScriptedDice         │   │
//! │  └──────────────┬───────────────────────┘   │
//! │                 │ implements                │
//! │                 ▼                           │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  Ports                               │   │
//! │  │  - Recorder, DiceRoller              │   │
//! │  └──────────────┬───────────────────────┘   │
//! │                 │ used by                   │
//! │                 ▼                           │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  Domain                              │   │
//! │  │  - TrialSession                      │   │
//! │  │  - probability / scoring             │   │
//! │  └──────────────────────────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod container;

pub use config::ExperimentConfig;
pub use container::{App, AppBuilder};
