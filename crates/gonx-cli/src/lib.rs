//! gonx command-line interface.
//!
//! Stands in for an interactive front end: resolves the workspace, runs
//! benchmark batches while printing their progress, and browses history.

pub mod cli;
pub mod commands;
pub mod output;
