//! Ingesting raw markdown files: frontmatter normalization plus task
//! extraction, as a host without its own metadata cache would do it.

use chrono::{DateTime, NaiveDate, Utc};
use para_core::{
    extract_vault_tasks, AnalyticsConfig, Location, MetadataFields, RawNote, VaultSnapshot,
};

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

const LAUNCH: &str = "---
para: Projects
tags: \"#launch, q3\"
review_interval: 2w
para_history:
  - from: inbox
    to: projects
    timestamp: 2024-02-01T10:00:00Z
  - to: archive
---
# Launch plan

1. [ ] Draft outline 📅 2024-03-01 ⏫
2) [X] Send invoice ✅ 2024-02-28 ➕ 2024-02-21
- not a task
";

#[test]
fn test_markdown_note_normalizes_and_yields_tasks() {
    let raw = RawNote::from_markdown(
        "Work/Launch.md",
        LAUNCH,
        at("2024-01-15T00:00:00Z"),
        at("2024-03-01T00:00:00Z"),
    );
    let snapshot = VaultSnapshot { notes: vec![raw] };
    let config = AnalyticsConfig::default();
    let notes = snapshot.to_records(&config);

    let note = &notes[0];
    assert_eq!(note.basename, "Launch");
    assert_eq!(note.location, Location::Projects);
    assert_eq!(note.review_interval_days, Some(14.0));
    assert!(note.tags.contains("launch"));
    assert!(note.tags.contains("q3"));
    // The entry without any timestamp is dropped.
    assert_eq!(note.history.len(), 1);
    assert_eq!(note.history[0].timestamp, at("2024-02-01T10:00:00Z"));

    let tasks = extract_vault_tasks(&snapshot.inline_content(), &notes);
    assert_eq!(tasks.len(), 2);

    assert_eq!(tasks[0].text, "Draft outline");
    assert_eq!(tasks[0].line_number, 13);
    assert!(!tasks[0].completed);
    assert_eq!(tasks[0].due_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    assert_eq!(tasks[0].location, Location::Projects);

    assert_eq!(tasks[1].text, "Send invoice");
    assert!(tasks[1].completed);
    assert_eq!(tasks[1].age_in_days, Some(7));
}

#[test]
fn test_custom_field_names() {
    let content = "---\nbucket: areas\n---\n";
    let config = AnalyticsConfig {
        metadata: MetadataFields {
            location: "bucket".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    let raw = RawNote::from_markdown(
        "Health.md",
        content,
        at("2024-01-01T00:00:00Z"),
        at("2024-01-01T00:00:00Z"),
    );
    assert_eq!(raw.to_record(&config).location, Location::Areas);
    assert_eq!(
        raw.to_record(&AnalyticsConfig::default()).location,
        Location::Unknown
    );
}

#[test]
fn test_note_without_frontmatter() {
    let raw = RawNote::from_markdown(
        "loose.md",
        "- [ ] orphan task",
        at("2024-01-01T00:00:00Z"),
        at("2024-01-01T00:00:00Z"),
    );
    let snapshot = VaultSnapshot { notes: vec![raw] };
    let notes = snapshot.to_records(&AnalyticsConfig::default());
    assert_eq!(notes[0].location, Location::Unknown);
    assert!(notes[0].history.is_empty());

    let tasks = extract_vault_tasks(&snapshot.inline_content(), &notes);
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].location, Location::Unknown);
}
