//! Centralized default constants for PARA vault analytics.
//!
//! **This module is the single source of truth** for shared default values.
//! `AnalyticsConfig::default()` is built from these constants; components
//! never read them directly, so tests can swap in alternate tables.

// =============================================================================
// REVIEW CADENCE
// =============================================================================

/// Default review interval for inbox notes, in days.
pub const REVIEW_INBOX_DAYS: f64 = 2.0;

/// Default review interval for project notes, in days.
pub const REVIEW_PROJECTS_DAYS: f64 = 7.0;

/// Default review interval for area notes, in days.
pub const REVIEW_AREAS_DAYS: f64 = 30.0;

/// Default review interval for resource notes, in days.
pub const REVIEW_RESOURCES_DAYS: f64 = 90.0;

/// Default review interval for archived notes, in days.
pub const REVIEW_ARCHIVE_DAYS: f64 = 180.0;

/// Day counts for the named cadence words accepted by the interval resolver.
pub const CADENCE_DAILY: f64 = 1.0;
pub const CADENCE_WEEKLY: f64 = 7.0;
pub const CADENCE_MONTHLY: f64 = 30.0;
pub const CADENCE_QUARTERLY: f64 = 90.0;

// =============================================================================
// FLOW HEURISTICS
// =============================================================================

/// A project older than this (days) may be inferred as heading to archive.
pub const PROJECT_ARCHIVE_MIN_AGE_DAYS: f64 = 90.0;

/// ...provided it has not been touched for this many days.
pub const PROJECT_ARCHIVE_MIN_STALE_DAYS: f64 = 30.0;

pub const AREA_ARCHIVE_MIN_AGE_DAYS: f64 = 180.0;
pub const AREA_ARCHIVE_MIN_STALE_DAYS: f64 = 90.0;

pub const RESOURCE_ARCHIVE_MIN_AGE_DAYS: f64 = 365.0;
pub const RESOURCE_ARCHIVE_MIN_STALE_DAYS: f64 = 180.0;

/// Archived notes younger than this are assumed to have been projects.
pub const ARCHIVE_ORIGIN_PROJECT_MAX_AGE_DAYS: f64 = 90.0;

/// Archived notes younger than this (and older than the project band) are
/// assumed to have been areas; anything older, resources.
pub const ARCHIVE_ORIGIN_AREA_MAX_AGE_DAYS: f64 = 180.0;

// =============================================================================
// TIMELINE / CALENDAR
// =============================================================================

/// Default pipeline census window, in days (ending today).
pub const PIPELINE_WINDOW_DAYS: u32 = 30;

/// Upper bound for any configured window, in days (about a century).
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Number of cells in the task calendar grid (four weeks).
pub const CALENDAR_DAYS: u32 = 28;

/// Forward horizon for the "due this week" open-task count, in days.
pub const CALENDAR_WEEK_AHEAD_DAYS: i64 = 7;

/// Default offset of the vault owner's local time from UTC, in minutes.
pub const UTC_OFFSET_MINUTES: i32 = 0;

// =============================================================================
// METADATA FIELDS
// =============================================================================

/// Frontmatter key holding the note's PARA location.
pub const FIELD_LOCATION: &str = "para";

/// Frontmatter key holding the movement history array.
pub const FIELD_HISTORY: &str = "para_history";

/// Frontmatter key holding the note-level review cadence override.
pub const FIELD_REVIEW_INTERVAL: &str = "review_interval";

/// Frontmatter key holding the note's tags.
pub const FIELD_TAGS: &str = "tags";

/// Tag prefix that encodes a location when the location field is absent
/// (e.g. `para/projects`).
pub const LOCATION_TAG_PREFIX: &str = "para/";

// =============================================================================
// TIME
// =============================================================================

/// Milliseconds in one day.
pub const MS_PER_DAY: f64 = 86_400_000.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_defaults_ascend_with_location() {
        assert!(REVIEW_INBOX_DAYS < REVIEW_PROJECTS_DAYS);
        assert!(REVIEW_PROJECTS_DAYS < REVIEW_AREAS_DAYS);
        assert!(REVIEW_AREAS_DAYS < REVIEW_RESOURCES_DAYS);
        assert!(REVIEW_RESOURCES_DAYS < REVIEW_ARCHIVE_DAYS);
    }

    #[test]
    fn test_archive_origin_bands_ordered() {
        assert!(ARCHIVE_ORIGIN_PROJECT_MAX_AGE_DAYS < ARCHIVE_ORIGIN_AREA_MAX_AGE_DAYS);
    }

    #[test]
    fn test_calendar_is_whole_weeks() {
        assert_eq!(CALENDAR_DAYS % 7, 0);
    }
}
