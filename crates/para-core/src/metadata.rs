//! Boundary normalization from raw host metadata to [`NoteRecord`].
//!
//! Hosts hand over hand-edited frontmatter, so every field here is optional
//! and may be malformed. History entries accept several spellings
//! (`timestamp`/`time`/`ts` or a calendar `date`; `from`/`from_location`/
//! `fromLocation`; likewise for `to`). Entries whose instant cannot be
//! derived are dropped. Nothing in this module returns an error for bad
//! metadata; only snapshot-level JSON/YAML syntax is fallible.

use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, instrument, trace};

use crate::clock::local_offset;
use crate::config::{AnalyticsConfig, MetadataFields};
use crate::error::Result;
use crate::interval::resolve_interval;
use crate::tasks::ContentSource;
use crate::models::{HistoryEntry, Location, NoteRecord};

const TIMESTAMP_KEYS: [&str; 3] = ["timestamp", "time", "ts"];
const DATE_KEY: &str = "date";
const FROM_KEYS: [&str; 3] = ["from", "from_location", "fromLocation"];
const TO_KEYS: [&str; 3] = ["to", "to_location", "toLocation"];

// =============================================================================
// RAW INPUT
// =============================================================================

/// One note as the host describes it, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNote {
    pub path: String,
    #[serde(default)]
    pub basename: Option<String>,
    /// Parsed frontmatter object; anything other than an object is ignored.
    #[serde(default)]
    pub frontmatter: JsonValue,
    #[serde(alias = "ctime", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "mtime", with = "chrono::serde::ts_milliseconds")]
    pub modified_at: DateTime<Utc>,
    /// Inline note body, when the host ships content with the snapshot.
    #[serde(default)]
    pub content: Option<String>,
}

impl RawNote {
    /// Build a raw note from a markdown file, reading its YAML frontmatter.
    ///
    /// Malformed frontmatter is treated as absent.
    pub fn from_markdown(
        path: impl Into<String>,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
    ) -> Self {
        let path = path.into();
        let content = content.into();
        let frontmatter = parse_frontmatter(&content).unwrap_or_else(|e| {
            trace!(note_path = %path, error = %e, "Unparseable frontmatter ignored");
            JsonValue::Null
        });
        Self {
            path,
            basename: None,
            frontmatter,
            created_at,
            modified_at,
            content: Some(content),
        }
    }

    /// Normalize into the canonical record consumed by the analytics.
    pub fn to_record(&self, config: &AnalyticsConfig) -> NoteRecord {
        let fields = &config.metadata;
        let offset = local_offset(config.utc_offset_minutes);

        let tags = parse_tags(self.field(&fields.tags));
        let location = resolve_location(self.field(&fields.location), &tags, fields);
        let (history, dropped) = normalize_history(self.field(&fields.history), offset);
        if dropped > 0 {
            trace!(
                note_path = %self.path,
                dropped_count = dropped,
                history_count = history.len(),
                "Dropped history entries without a usable timestamp"
            );
        }

        NoteRecord {
            path: self.path.clone(),
            basename: self
                .basename
                .clone()
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| basename_of(&self.path)),
            location,
            history,
            tags,
            created_at: self.created_at,
            modified_at: self.modified_at,
            review_interval_days: resolve_interval(self.field(&fields.review_interval)),
        }
    }

    fn field(&self, key: &str) -> Option<&JsonValue> {
        self.frontmatter.as_object()?.get(key)
    }
}

/// Whole-vault snapshot as exported by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    #[serde(default)]
    pub notes: Vec<RawNote>,
}

impl VaultSnapshot {
    /// Parse a snapshot from its JSON export.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a snapshot export from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Normalize every note.
    #[instrument(skip(self, config), fields(subsystem = "core", component = "metadata", op = "normalize", note_count = self.notes.len()))]
    pub fn to_records(&self, config: &AnalyticsConfig) -> Vec<NoteRecord> {
        let records: Vec<NoteRecord> = self.notes.iter().map(|n| n.to_record(config)).collect();
        debug!(
            with_history = records.iter().filter(|r| !r.history.is_empty()).count(),
            unknown = records
                .iter()
                .filter(|r| r.location == Location::Unknown)
                .count(),
            "Snapshot normalized"
        );
        records
    }
}

impl VaultSnapshot {
    /// Index the inline note bodies by path. The first note wins when a path
    /// repeats.
    pub fn inline_content(&self) -> InlineContent<'_> {
        let mut by_path = HashMap::with_capacity(self.notes.len());
        for note in &self.notes {
            if let Some(content) = note.content.as_deref() {
                by_path.entry(note.path.as_str()).or_insert(content);
            }
        }
        InlineContent { by_path }
    }
}

/// Inline note bodies shipped with a snapshot, keyed by vault path.
#[derive(Debug, Clone, Default)]
pub struct InlineContent<'a> {
    by_path: HashMap<&'a str, &'a str>,
}

impl InlineContent<'_> {
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

impl ContentSource for InlineContent<'_> {
    fn read_content(&self, path: &str) -> io::Result<String> {
        self.by_path
            .get(path)
            .map(|content| content.to_string())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }
}

// =============================================================================
// FIELD NORMALIZERS
// =============================================================================

/// File stem of a vault path (`Projects/Launch.md` → `Launch`).
pub fn basename_of(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Split a markdown document's leading `---` YAML block into a JSON value.
///
/// Returns `Null` when the document has no frontmatter.
pub fn parse_frontmatter(content: &str) -> Result<JsonValue> {
    let body = content.strip_prefix('\u{feff}').unwrap_or(content);
    let Some(rest) = body
        .strip_prefix("---\n")
        .or_else(|| body.strip_prefix("---\r\n"))
    else {
        return Ok(JsonValue::Null);
    };

    let mut yaml_len = None;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            yaml_len = Some(offset);
            break;
        }
        offset += line.len();
    }
    let Some(yaml_len) = yaml_len else {
        return Ok(JsonValue::Null);
    };

    let yaml = &rest[..yaml_len];
    if yaml.trim().is_empty() {
        return Ok(JsonValue::Null);
    }
    Ok(serde_yaml::from_str::<JsonValue>(yaml)?)
}

/// Tags from a list or a comma/space separated string, `#` prefixes removed.
pub fn parse_tags(raw: Option<&JsonValue>) -> BTreeSet<String> {
    let clean = |s: &str| {
        let t = s.trim().trim_start_matches('#').trim();
        (!t.is_empty()).then(|| t.to_string())
    };
    match raw {
        Some(JsonValue::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                JsonValue::String(s) => clean(s),
                JsonValue::Number(n) => clean(&n.to_string()),
                _ => None,
            })
            .collect(),
        Some(JsonValue::String(s)) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter_map(clean)
            .collect(),
        _ => BTreeSet::new(),
    }
}

/// Location from the explicit field, else from a `para/<location>` tag.
pub fn resolve_location(
    raw: Option<&JsonValue>,
    tags: &BTreeSet<String>,
    fields: &MetadataFields,
) -> Location {
    let explicit = raw
        .and_then(JsonValue::as_str)
        .map(Location::parse_loose)
        .unwrap_or_default();
    if explicit != Location::Unknown {
        return explicit;
    }

    let prefix = fields.location_tag_prefix.to_lowercase();
    tags.iter()
        .filter_map(|tag| tag.to_lowercase().strip_prefix(&prefix).map(Location::parse_loose))
        .find(|loc| *loc != Location::Unknown)
        .unwrap_or(Location::Unknown)
}

/// Normalize a raw history array into sorted canonical entries.
///
/// Returns the kept entries and the number dropped.
pub fn normalize_history(
    raw: Option<&JsonValue>,
    offset: FixedOffset,
) -> (Vec<HistoryEntry>, usize) {
    let Some(JsonValue::Array(items)) = raw else {
        return (Vec::new(), 0);
    };

    let mut entries: Vec<HistoryEntry> = items
        .iter()
        .filter_map(|item| normalize_entry(item, offset))
        .collect();
    entries.sort_by_key(|e| e.timestamp);
    let dropped = items.len() - entries.len();
    (entries, dropped)
}

fn normalize_entry(item: &JsonValue, offset: FixedOffset) -> Option<HistoryEntry> {
    let obj = item.as_object()?;

    let timestamp = TIMESTAMP_KEYS
        .iter()
        .filter_map(|key| obj.get(*key))
        .find_map(|v| parse_instant(v, offset))
        .or_else(|| obj.get(DATE_KEY).and_then(|v| parse_instant(v, offset)))?;

    let location_of = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| obj.get(*key).and_then(JsonValue::as_str))
            .map(Location::parse_loose)
            .unwrap_or_default()
    };

    Some(HistoryEntry {
        from: location_of(&FROM_KEYS),
        to: location_of(&TO_KEYS),
        timestamp,
    })
}

/// Parse an instant from epoch milliseconds, RFC 3339, a naive local
/// datetime, or a `YYYY-MM-DD` date (local midnight).
pub fn parse_instant(value: &JsonValue, offset: FixedOffset) -> Option<DateTime<Utc>> {
    match value {
        JsonValue::Number(n) => {
            let ms = n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))?;
            DateTime::from_timestamp_millis(ms)
        }
        JsonValue::String(s) => parse_instant_str(s.trim(), offset),
        _ => None,
    }
}

fn parse_instant_str(s: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(ms) = s.parse::<i64>() {
        return DateTime::from_timestamp_millis(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let local = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(Default::default())))
        .ok()?;
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
