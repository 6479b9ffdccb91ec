//! Shared configuration for gonx.
//!
//! Locates the project-local state folder, the workspace cache and the
//! benchmark history files, and reads the tunables that can be overridden
//! from the environment.

pub mod config;
