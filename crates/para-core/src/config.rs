//! Explicit configuration passed into every analytics component.
//!
//! Nothing in the analytics reads global state: callers build an
//! [`AnalyticsConfig`] (usually `Default` or [`AnalyticsConfig::from_env`])
//! and hand it down, so tests can substitute alternate tables freely.

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};
use crate::models::Location;

// =============================================================================
// REVIEW DEFAULTS
// =============================================================================

/// Per-location default review intervals, in days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewDefaults {
    pub inbox: f64,
    pub projects: f64,
    pub areas: f64,
    pub resources: f64,
    pub archive: f64,
}

impl Default for ReviewDefaults {
    fn default() -> Self {
        Self {
            inbox: defaults::REVIEW_INBOX_DAYS,
            projects: defaults::REVIEW_PROJECTS_DAYS,
            areas: defaults::REVIEW_AREAS_DAYS,
            resources: defaults::REVIEW_RESOURCES_DAYS,
            archive: defaults::REVIEW_ARCHIVE_DAYS,
        }
    }
}

impl ReviewDefaults {
    /// Default interval for a location; `unknown` has none.
    pub fn for_location(&self, location: Location) -> Option<f64> {
        match location {
            Location::Inbox => Some(self.inbox),
            Location::Projects => Some(self.projects),
            Location::Areas => Some(self.areas),
            Location::Resources => Some(self.resources),
            Location::Archive => Some(self.archive),
            Location::Unknown => None,
        }
    }

    fn set(&mut self, location: Location, days: f64) {
        match location {
            Location::Inbox => self.inbox = days,
            Location::Projects => self.projects = days,
            Location::Areas => self.areas = days,
            Location::Resources => self.resources = days,
            Location::Archive => self.archive = days,
            Location::Unknown => {}
        }
    }
}

// =============================================================================
// FLOW HEURISTICS
// =============================================================================

/// Age/staleness pair gating a heuristic `* -> archive` credit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArchiveThreshold {
    /// Note must be older than this many days.
    pub min_age_days: f64,
    /// ...and untouched for more than this many days.
    pub min_stale_days: f64,
}

impl ArchiveThreshold {
    pub fn is_met(&self, age_days: f64, stale_days: f64) -> bool {
        age_days > self.min_age_days && stale_days > self.min_stale_days
    }
}

/// Thresholds used when a note has no history and its flows are inferred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowHeuristics {
    pub projects: ArchiveThreshold,
    pub areas: ArchiveThreshold,
    pub resources: ArchiveThreshold,
    /// Archived notes younger than this are attributed to projects.
    pub archive_project_max_age_days: f64,
    /// Archived notes younger than this (but past the project band) are
    /// attributed to areas; older ones to resources.
    pub archive_area_max_age_days: f64,
}

impl Default for FlowHeuristics {
    fn default() -> Self {
        Self {
            projects: ArchiveThreshold {
                min_age_days: defaults::PROJECT_ARCHIVE_MIN_AGE_DAYS,
                min_stale_days: defaults::PROJECT_ARCHIVE_MIN_STALE_DAYS,
            },
            areas: ArchiveThreshold {
                min_age_days: defaults::AREA_ARCHIVE_MIN_AGE_DAYS,
                min_stale_days: defaults::AREA_ARCHIVE_MIN_STALE_DAYS,
            },
            resources: ArchiveThreshold {
                min_age_days: defaults::RESOURCE_ARCHIVE_MIN_AGE_DAYS,
                min_stale_days: defaults::RESOURCE_ARCHIVE_MIN_STALE_DAYS,
            },
            archive_project_max_age_days: defaults::ARCHIVE_ORIGIN_PROJECT_MAX_AGE_DAYS,
            archive_area_max_age_days: defaults::ARCHIVE_ORIGIN_AREA_MAX_AGE_DAYS,
        }
    }
}

// =============================================================================
// METADATA FIELDS
// =============================================================================

/// Frontmatter key names read during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataFields {
    pub location: String,
    pub history: String,
    pub review_interval: String,
    pub tags: String,
    /// Tag prefix encoding a location, used when `location` is absent.
    pub location_tag_prefix: String,
}

impl Default for MetadataFields {
    fn default() -> Self {
        Self {
            location: defaults::FIELD_LOCATION.to_string(),
            history: defaults::FIELD_HISTORY.to_string(),
            review_interval: defaults::FIELD_REVIEW_INTERVAL.to_string(),
            tags: defaults::FIELD_TAGS.to_string(),
            location_tag_prefix: defaults::LOCATION_TAG_PREFIX.to_string(),
        }
    }
}

// =============================================================================
// ANALYTICS CONFIG
// =============================================================================

/// Top-level configuration for a report run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub review: ReviewDefaults,
    pub flow: FlowHeuristics,
    pub metadata: MetadataFields,
    /// Pipeline census window, in days ending today.
    pub pipeline_window_days: u32,
    /// Restrict the flow estimate to notes created within this many days.
    /// `None` covers the whole vault.
    pub flow_window_days: Option<u32>,
    /// Local time offset from UTC used to cut calendar days.
    pub utc_offset_minutes: i32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            review: ReviewDefaults::default(),
            flow: FlowHeuristics::default(),
            metadata: MetadataFields::default(),
            pipeline_window_days: defaults::PIPELINE_WINDOW_DAYS,
            flow_window_days: None,
            utc_offset_minutes: defaults::UTC_OFFSET_MINUTES,
        }
    }
}

impl AnalyticsConfig {
    /// Load configuration from environment variables with fallback to defaults.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `PARA_REVIEW_<LOCATION>_DAYS` | per-location review default |
    /// | `PARA_PIPELINE_WINDOW_DAYS` | census window |
    /// | `PARA_FLOW_WINDOW_DAYS` | flow creation window (`0` = whole vault) |
    /// | `PARA_UTC_OFFSET_MINUTES` | local day offset |
    /// | `PARA_FIELD_LOCATION` / `_HISTORY` / `_REVIEW` / `_TAGS` | frontmatter keys |
    pub fn from_env() -> Self {
        let mut config = Self::default();

        for location in Location::ALL {
            let Some(current) = config.review.for_location(location) else {
                continue;
            };
            let var = format!("PARA_REVIEW_{}_DAYS", location.as_str().to_uppercase());
            if let Ok(val) = std::env::var(&var) {
                match val.parse::<f64>() {
                    Ok(days) if days.is_finite() && days > 0.0 => {
                        config.review.set(location, days)
                    }
                    _ => tracing::warn!(
                        variable = %var,
                        value = %val,
                        default = current,
                        "Invalid review interval, using default"
                    ),
                }
            }
        }

        if let Ok(val) = std::env::var("PARA_PIPELINE_WINDOW_DAYS") {
            match val.parse::<u32>() {
                Ok(days) if days > 0 => config.pipeline_window_days = days,
                _ => tracing::warn!(value = %val, "Invalid PARA_PIPELINE_WINDOW_DAYS, using default"),
            }
        }

        if let Ok(val) = std::env::var("PARA_FLOW_WINDOW_DAYS") {
            match val.parse::<u32>() {
                Ok(0) => config.flow_window_days = None,
                Ok(days) => config.flow_window_days = Some(days),
                Err(_) => tracing::warn!(value = %val, "Invalid PARA_FLOW_WINDOW_DAYS, using default"),
            }
        }

        if let Ok(val) = std::env::var("PARA_UTC_OFFSET_MINUTES") {
            match val.parse::<i32>() {
                Ok(minutes) => config.utc_offset_minutes = minutes,
                Err(_) => tracing::warn!(value = %val, "Invalid PARA_UTC_OFFSET_MINUTES, using default"),
            }
        }

        let fields = &mut config.metadata;
        for (var, slot) in [
            ("PARA_FIELD_LOCATION", &mut fields.location),
            ("PARA_FIELD_HISTORY", &mut fields.history),
            ("PARA_FIELD_REVIEW", &mut fields.review_interval),
            ("PARA_FIELD_TAGS", &mut fields.tags),
        ] {
            if let Ok(val) = std::env::var(var) {
                let val = val.trim();
                if !val.is_empty() {
                    *slot = val.to_string();
                }
            }
        }

        tracing::debug!(
            pipeline_window_days = config.pipeline_window_days,
            flow_window_days = ?config.flow_window_days,
            utc_offset_minutes = config.utc_offset_minutes,
            "Analytics config loaded"
        );

        config
    }

    /// Reject tables that would make scores or windows meaningless.
    pub fn validate(&self) -> Result<()> {
        for location in Location::ALL {
            if let Some(days) = self.review.for_location(location) {
                if !(days.is_finite() && days > 0.0) {
                    return Err(Error::Config(format!(
                        "review interval for {} must be positive, got {}",
                        location, days
                    )));
                }
            }
        }
        if self.pipeline_window_days == 0 {
            return Err(Error::Config(
                "pipeline window must cover at least one day".to_string(),
            ));
        }
        if self.pipeline_window_days > defaults::MAX_WINDOW_DAYS {
            return Err(Error::Config(format!(
                "pipeline window of {} days exceeds the maximum of {}",
                self.pipeline_window_days,
                defaults::MAX_WINDOW_DAYS
            )));
        }
        if let Some(days) = self.flow_window_days {
            if days > defaults::MAX_WINDOW_DAYS {
                return Err(Error::Config(format!(
                    "flow window of {} days exceeds the maximum of {}",
                    days,
                    defaults::MAX_WINDOW_DAYS
                )));
            }
        }
        if self.flow.archive_project_max_age_days > self.flow.archive_area_max_age_days {
            return Err(Error::Config(
                "archive project band must not exceed the area band".to_string(),
            ));
        }
        Ok(())
    }
}
