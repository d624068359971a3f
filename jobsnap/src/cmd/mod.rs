//! Subcommand implementations.

pub mod get_jobs;
