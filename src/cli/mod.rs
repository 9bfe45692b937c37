//! CLI infrastructure for the wagerlab experiment toolkit
//!
//! This module provides the command-line interface for simulating sessions,
//! querying the probability engine, and running the task interactively in a
//! terminal.

pub mod commands;
pub mod config;
pub mod output;
