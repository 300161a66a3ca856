//! Exit code constants for CLI commands
//!
//! - 0: Success
//! - 1: General error (unreadable input, analysis failure)
//! - 2: Invalid configuration or arguments

/// Successful execution
pub const EXIT_SUCCESS: i32 = 0;

/// Unreadable input or a failed analysis
pub const EXIT_GENERAL: i32 = 1;

/// Invalid configuration or arguments
pub const EXIT_INVALID_CONFIG: i32 = 2;
