//! Tuning constants of the synchronisation loops.
//!
//! These are the defaults; every value can be overridden in the `sync`
//! section of the configuration (see [`crate::SyncSettings`]).

use pmoschedule::Seconds;

// ============================================================================
// Poll cadence
// ============================================================================

/// Regular polling interval (milliseconds)
///
/// Used most of the time, and right after every reload.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

/// Fast polling interval (milliseconds)
///
/// Used while the current item is about to end, so the switch to the next
/// item is caught promptly.
pub const FAST_POLL_INTERVAL_MS: u64 = 1_000;

/// Remaining time under which the fast interval kicks in (seconds, inclusive)
pub const NEAR_END_SECS: Seconds = 5.0;

// ============================================================================
// Corrections
// ============================================================================

/// Drift above which the player is seeked back to the target (seconds, exclusive)
///
/// Ordinary jitter stays well under this; anything above is a visible desync.
pub const DRIFT_TOLERANCE_SECS: Seconds = 10.0;

/// Consecutive buffering observations that force a reload
pub const STALL_RELOAD_THRESHOLD: u32 = 2;

/// Upper bound for a single player call (milliseconds)
pub const COMMAND_TIMEOUT_MS: u64 = 3_000;
