//! Canonical data model shared by every analytics component.
//!
//! Raw host metadata is converted into these shapes once, in
//! [`crate::metadata`]; nothing downstream looks at untyped fields.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// LOCATION
// =============================================================================

/// One of the five PARA buckets, plus a fallback for unclassified notes.
///
/// Variant order is the canonical order used for iteration and for breaking
/// ties deterministically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Inbox,
    Projects,
    Areas,
    Resources,
    Archive,
    #[default]
    Unknown,
}

impl Location {
    /// Every location in canonical order.
    pub const ALL: [Location; 6] = [
        Location::Inbox,
        Location::Projects,
        Location::Areas,
        Location::Resources,
        Location::Archive,
        Location::Unknown,
    ];

    /// Locations that carry a review cadence and are scored for staleness.
    pub const REVIEWED: [Location; 4] = [
        Location::Inbox,
        Location::Projects,
        Location::Areas,
        Location::Resources,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Projects => "projects",
            Self::Areas => "areas",
            Self::Resources => "resources",
            Self::Archive => "archive",
            Self::Unknown => "unknown",
        }
    }

    /// Lenient parse: trims, lower-cases, and maps anything unrecognized to
    /// [`Location::Unknown`].
    pub fn parse_loose(s: &str) -> Self {
        s.parse().unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inbox" => Ok(Self::Inbox),
            "projects" => Ok(Self::Projects),
            "areas" => Ok(Self::Areas),
            "resources" => Ok(Self::Resources),
            "archive" => Ok(Self::Archive),
            "unknown" => Ok(Self::Unknown),
            _ => Err(format!("Invalid PARA location: {}", s)),
        }
    }
}

/// Per-location counters with every location present (zero when unseen).
pub type LocationCounts = BTreeMap<Location, usize>;

/// Fresh counter map with all six locations at zero.
pub fn empty_location_counts() -> LocationCounts {
    Location::ALL.iter().map(|loc| (*loc, 0)).collect()
}

/// Location with the highest count; ties go to the first in canonical order.
/// `None` when every count is zero.
pub fn dominant_location(counts: &LocationCounts) -> Option<Location> {
    let mut best: Option<(Location, usize)> = None;
    for (loc, count) in counts {
        if *count == 0 {
            continue;
        }
        match best {
            Some((_, top)) if *count <= top => {}
            _ => best = Some((*loc, *count)),
        }
    }
    best.map(|(loc, _)| loc)
}

// =============================================================================
// TRANSITIONS
// =============================================================================

/// The six canonical PARA flows tallied by the flow estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FlowKey {
    #[serde(rename = "inbox->projects")]
    InboxToProjects,
    #[serde(rename = "inbox->areas")]
    InboxToAreas,
    #[serde(rename = "inbox->resources")]
    InboxToResources,
    #[serde(rename = "projects->archive")]
    ProjectsToArchive,
    #[serde(rename = "areas->archive")]
    AreasToArchive,
    #[serde(rename = "resources->archive")]
    ResourcesToArchive,
}

impl FlowKey {
    pub const ALL: [FlowKey; 6] = [
        FlowKey::InboxToProjects,
        FlowKey::InboxToAreas,
        FlowKey::InboxToResources,
        FlowKey::ProjectsToArchive,
        FlowKey::AreasToArchive,
        FlowKey::ResourcesToArchive,
    ];

    /// Map a `(from, to)` pair onto a canonical flow, if it is one.
    pub fn from_pair(from: Location, to: Location) -> Option<Self> {
        use Location::*;
        match (from, to) {
            (Inbox, Projects) => Some(Self::InboxToProjects),
            (Inbox, Areas) => Some(Self::InboxToAreas),
            (Inbox, Resources) => Some(Self::InboxToResources),
            (Projects, Archive) => Some(Self::ProjectsToArchive),
            (Areas, Archive) => Some(Self::AreasToArchive),
            (Resources, Archive) => Some(Self::ResourcesToArchive),
            _ => None,
        }
    }

    pub fn endpoints(&self) -> (Location, Location) {
        use Location::*;
        match self {
            Self::InboxToProjects => (Inbox, Projects),
            Self::InboxToAreas => (Inbox, Areas),
            Self::InboxToResources => (Inbox, Resources),
            Self::ProjectsToArchive => (Projects, Archive),
            Self::AreasToArchive => (Areas, Archive),
            Self::ResourcesToArchive => (Resources, Archive),
        }
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (from, to) = self.endpoints();
        write!(f, "{}->{}", from, to)
    }
}

/// An arbitrary move between two locations, keyed `from->to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Transition {
    pub from: Location,
    pub to: Location,
}

impl Transition {
    pub fn new(from: Location, to: Location) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

// Serialized as the `from->to` string so it can key JSON objects.
impl Serialize for Transition {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// NOTES
// =============================================================================

/// A single recorded move of a note between locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub from: Location,
    pub to: Location,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Normalized, immutable view of one note in the vault snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub path: String,
    pub basename: String,
    pub location: Location,
    /// Sorted ascending by timestamp.
    pub history: Vec<HistoryEntry>,
    pub tags: BTreeSet<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub modified_at: DateTime<Utc>,
    /// Note-level cadence override; `None` means "use the location default".
    pub review_interval_days: Option<f64>,
}

impl NoteRecord {
    /// Minimal record with no history, tags, or cadence override.
    pub fn new(
        path: impl Into<String>,
        location: Location,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
    ) -> Self {
        let path = path.into();
        let basename = crate::metadata::basename_of(&path);
        Self {
            path,
            basename,
            location,
            history: Vec::new(),
            tags: BTreeSet::new(),
            created_at,
            modified_at,
            review_interval_days: None,
        }
    }

    /// Attach history, sorting it chronologically.
    pub fn with_history(mut self, mut history: Vec<HistoryEntry>) -> Self {
        history.sort_by_key(|entry| entry.timestamp);
        self.history = history;
        self
    }

    pub fn with_review_interval(mut self, days: Option<f64>) -> Self {
        self.review_interval_days = days;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

// =============================================================================
// TASKS
// =============================================================================

/// One checklist item extracted from a note's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub file_path: String,
    pub location: Location,
    /// 1-based line number within the note.
    pub line_number: usize,
    /// Task text with marker glyphs (and their dates) removed.
    pub text: String,
    pub completed: bool,
    pub completion_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub created_date: Option<NaiveDate>,
    /// Days from creation to completion; only for completed tasks carrying
    /// both dates in order.
    pub age_in_days: Option<i64>,
}

impl TaskRecord {
    /// Open (incomplete) task whose due date has passed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < today)
    }
}

/// Completion age for a task, or `None` unless the task is completed and has
/// a created date no later than its completion date.
pub fn task_age_in_days(
    completed: bool,
    created: Option<NaiveDate>,
    completion: Option<NaiveDate>,
) -> Option<i64> {
    if !completed {
        return None;
    }
    let (created, completion) = (created?, completion?);
    let age = (completion - created).num_days();
    (age >= 0).then_some(age)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_parse_case_insensitive() {
        assert_eq!("Projects".parse::<Location>().unwrap(), Location::Projects);
        assert_eq!(" ARCHIVE ".parse::<Location>().unwrap(), Location::Archive);
        assert!("someday".parse::<Location>().is_err());
    }

    #[test]
    fn test_location_parse_loose_falls_back_to_unknown() {
        assert_eq!(Location::parse_loose("someday"), Location::Unknown);
        assert_eq!(Location::parse_loose("inbox"), Location::Inbox);
    }

    #[test]
    fn test_location_display_roundtrip() {
        for loc in Location::ALL {
            assert_eq!(loc.to_string().parse::<Location>().unwrap(), loc);
        }
    }

    #[test]
    fn test_location_serde_lowercase() {
        let json = serde_json::to_string(&Location::Resources).unwrap();
        assert_eq!(json, "\"resources\"");
    }

    #[test]
    fn test_empty_location_counts_has_all_locations() {
        let counts = empty_location_counts();
        assert_eq!(counts.len(), 6);
        assert!(counts.values().all(|c| *c == 0));
    }

    #[test]
    fn test_dominant_location_ties_go_to_canonical_order() {
        let mut counts = empty_location_counts();
        counts.insert(Location::Areas, 3);
        counts.insert(Location::Projects, 3);
        assert_eq!(dominant_location(&counts), Some(Location::Projects));
    }

    #[test]
    fn test_dominant_location_none_when_empty() {
        assert_eq!(dominant_location(&empty_location_counts()), None);
    }

    #[test]
    fn test_flow_key_from_pair() {
        assert_eq!(
            FlowKey::from_pair(Location::Inbox, Location::Projects),
            Some(FlowKey::InboxToProjects)
        );
        assert_eq!(FlowKey::from_pair(Location::Projects, Location::Areas), None);
        assert_eq!(FlowKey::from_pair(Location::Archive, Location::Inbox), None);
    }

    #[test]
    fn test_flow_key_serializes_as_arrow_string() {
        let json = serde_json::to_string(&FlowKey::AreasToArchive).unwrap();
        assert_eq!(json, "\"areas->archive\"");
        for key in FlowKey::ALL {
            assert_eq!(
                serde_json::to_string(&key).unwrap(),
                format!("\"{}\"", key)
            );
        }
    }

    #[test]
    fn test_transition_serializes_as_map_key() {
        let mut map = BTreeMap::new();
        map.insert(Transition::new(Location::Projects, Location::Areas), 2);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"projects->areas":2}"#);
    }

    #[test]
    fn test_task_age_requires_completion_and_both_dates() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1);
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 11);
        assert_eq!(task_age_in_days(true, d1, d2), Some(10));
        assert_eq!(task_age_in_days(false, d1, d2), None);
        assert_eq!(task_age_in_days(true, None, d2), None);
        assert_eq!(task_age_in_days(true, d1, None), None);
        assert_eq!(task_age_in_days(true, d2, d1), None);
    }

    #[test]
    fn test_note_record_with_history_sorts() {
        let t0 = DateTime::from_timestamp_millis(0).unwrap();
        let t1 = DateTime::from_timestamp_millis(1_000).unwrap();
        let t2 = DateTime::from_timestamp_millis(2_000).unwrap();
        let note = NoteRecord::new("Projects/Launch.md", Location::Archive, t0, t2).with_history(
            vec![
                HistoryEntry {
                    from: Location::Projects,
                    to: Location::Archive,
                    timestamp: t2,
                },
                HistoryEntry {
                    from: Location::Inbox,
                    to: Location::Projects,
                    timestamp: t1,
                },
            ],
        );
        assert_eq!(note.basename, "Launch");
        assert_eq!(note.history[0].timestamp, t1);
        assert_eq!(note.history[1].timestamp, t2);
    }
}
