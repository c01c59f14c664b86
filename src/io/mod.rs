//! Input/Output handling for the CLI.
//!
//! Provides consistent error handling and exit codes for operator commands.

pub mod exit_code;

pub use exit_code::ExitCode;
