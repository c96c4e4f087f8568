//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 2       | Universal        | CLI usage error (bad args, bad dates)    |
//! | 60-69   | recon            | Config, runtime and irregularity codes   |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use bursar_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, inverted date range.
/// clap uses the same code for its own parse failures.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (60-69)
// =============================================================================

/// Config file failed to parse or validate.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 60;

/// Runtime failure: unreadable file, malformed snapshot, unwritable output.
pub const EXIT_RECON_RUNTIME: u8 = 61;

/// At least one irregularity at or above the `--fail-on` severity.
pub const EXIT_RECON_IRREGULAR: u8 = 62;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_RECON_INVALID_CONFIG,
        ReconError::SnapshotParse(_) => EXIT_RECON_RUNTIME,
    }
}
