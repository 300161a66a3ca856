//! CostLens CLI Library
//!
//! Command-line interface definitions, command implementations and exit codes
//! for the `costlens` binary.

/// Analyze command
pub mod analyze;
/// Command-line interface definitions and argument parsing
pub mod cli;
/// Shell completion generation
pub mod completions;
/// Config inspection commands
pub mod config;
/// Error type carrying an exit code
pub mod error;
/// Exit codes used by the CLI application
pub mod exit_codes;
/// Forecast command
pub mod forecast;
