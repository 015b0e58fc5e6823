//! Checklist task extraction from note content.
//!
//! Recognizes markdown checklist items written in the Obsidian Tasks style:
//!
//! ```text
//! - [ ] Draft outline 📅 2024-03-01 ➕ 2024-02-20 ⏫
//! - [x] Send invoice ✅ 2024-02-28 ➕ 2024-02-21
//! ```
//!
//! Only `✅` (completion), `📅` (due) and `➕` (created) dates are captured,
//! first occurrence wins. Every marker glyph is removed from the display text;
//! dated markers are removed together with their date.

use std::collections::{BTreeMap, HashMap};
use std::io;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, trace};

use crate::models::{task_age_in_days, Location, NoteRecord, TaskRecord};

static CHECKLIST_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+\[([ xX])\]\s+(\S.*?)\s*$").expect("static regex")
});

static COMPLETION_DATE: Lazy<Regex> = Lazy::new(|| date_marker("✅"));
static DUE_DATE: Lazy<Regex> = Lazy::new(|| date_marker("📅"));
static CREATED_DATE: Lazy<Regex> = Lazy::new(|| date_marker("➕"));

/// Any dated marker (captured or not) together with its date.
static DATED_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:✅|📅|➕|⏳|🛫)\x{FE0F}?\s*\d{4}-\d{2}-\d{2}").expect("static regex")
});

/// Bare marker glyphs: dates, recurrence, and priority.
static MARKER_GLYPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:✅|📅|➕|⏳|🛫|🔁|🔺|⏫|🔼|🔽|⏬)\x{FE0F}?").expect("static regex"));

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

fn date_marker(glyph: &str) -> Regex {
    Regex::new(&format!(r"{}\x{{FE0F}}?\s*(\d{{4}}-\d{{2}}-\d{{2}})", glyph)).expect("static regex")
}

/// Extract every checklist task from one note's content.
///
/// Non-task lines are ignored; this never fails.
pub fn extract_tasks(content: &str, file_path: &str, location: Location) -> Vec<TaskRecord> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| parse_task_line(line, file_path, location, idx + 1))
        .collect()
}

/// Parse a single line, returning `None` unless it is a checklist item.
pub fn parse_task_line(
    line: &str,
    file_path: &str,
    location: Location,
    line_number: usize,
) -> Option<TaskRecord> {
    let caps = CHECKLIST_LINE.captures(line)?;
    let completed = caps[1].eq_ignore_ascii_case("x");
    let body = &caps[2];

    let completion_date = first_date(&COMPLETION_DATE, body);
    let due_date = first_date(&DUE_DATE, body);
    let created_date = first_date(&CREATED_DATE, body);

    Some(TaskRecord {
        file_path: file_path.to_string(),
        location,
        line_number,
        text: display_text(body),
        completed,
        completion_date,
        due_date,
        created_date,
        age_in_days: task_age_in_days(completed, created_date, completion_date),
    })
}

/// Date following the first occurrence of a marker; an invalid calendar date
/// on that first occurrence yields `None`.
fn first_date(marker: &Regex, body: &str) -> Option<NaiveDate> {
    let caps = marker.captures(body)?;
    NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()
}

fn display_text(body: &str) -> String {
    let without_dates = DATED_MARKER.replace_all(body, " ");
    let without_glyphs = MARKER_GLYPH.replace_all(&without_dates, " ");
    WHITESPACE_RUN
        .replace_all(&without_glyphs, " ")
        .trim()
        .to_string()
}

// =============================================================================
// CONTENT ACCESS
// =============================================================================

/// Read access to note bodies, supplied by the host.
pub trait ContentSource {
    /// Read the full text of the note at `path`.
    fn read_content(&self, path: &str) -> io::Result<String>;
}

impl ContentSource for HashMap<String, String> {
    fn read_content(&self, path: &str) -> io::Result<String> {
        self.get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }
}

impl ContentSource for BTreeMap<String, String> {
    fn read_content(&self, path: &str) -> io::Result<String> {
        self.get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }
}

/// Extract tasks for one note, treating an unreadable note as having none.
pub fn extract_note_tasks<S: ContentSource + ?Sized>(
    source: &S,
    note: &NoteRecord,
) -> Vec<TaskRecord> {
    match source.read_content(&note.path) {
        Ok(content) => extract_tasks(&content, &note.path, note.location),
        Err(e) => {
            trace!(note_path = %note.path, error = %e, "Content unavailable, no tasks");
            Vec::new()
        }
    }
}

/// Extract tasks across a set of notes.
#[instrument(skip(source, notes), fields(subsystem = "core", component = "tasks", op = "extract", note_count = notes.len()))]
pub fn extract_vault_tasks<S: ContentSource + ?Sized>(
    source: &S,
    notes: &[NoteRecord],
) -> Vec<TaskRecord> {
    let tasks: Vec<TaskRecord> = notes
        .iter()
        .flat_map(|note| extract_note_tasks(source, note))
        .collect();
    debug!(
        task_count = tasks.len(),
        open = tasks.iter().filter(|t| !t.completed).count(),
        "Tasks extracted"
    );
    tasks
}
