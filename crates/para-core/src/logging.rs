//! Structured logging schema and field name constants for PARA analytics.
//!
//! All crates use these constants for consistent structured logging fields.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Unused by the analytics core (every operation is total) |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, report completion |
//! | DEBUG | Decision points, summary values, config choices |
//! | TRACE | Per-note iteration, dropped metadata entries |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "core", "analytics", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "flow", "pipeline", "review", "calendar", "tasks", "metadata"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "estimate_flow", "reconstruct", "score", "build_calendar"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Vault-relative path of the note being processed.
pub const NOTE_PATH: &str = "note_path";

/// PARA location of the note or bucket being processed.
pub const LOCATION: &str = "location";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Number of notes in the input snapshot.
pub const NOTE_COUNT: &str = "note_count";

/// Number of tasks processed.
pub const TASK_COUNT: &str = "task_count";

/// Number of history entries kept after normalization.
pub const HISTORY_COUNT: &str = "history_count";

/// Number of raw entries dropped during normalization.
pub const DROPPED_COUNT: &str = "dropped_count";

/// Census window length in days.
pub const WINDOW_DAYS: &str = "window_days";

/// Number of overdue notes or tasks found.
pub const OVERDUE_COUNT: &str = "overdue_count";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation degrades.
pub const ERROR_MSG: &str = "error";
