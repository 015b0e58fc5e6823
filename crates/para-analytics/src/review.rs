//! Review cadence health scoring.
//!
//! For each reviewed location (inbox, projects, areas, resources), compares
//! how long ago its notes were last touched with how often they are meant to
//! be touched. Archive and unknown notes are not scored.
//!
//! ```text
//! health = 1                                   if avg_days_since_touch <= 0
//!        = min(1, avg_target / avg_days_since_touch)  otherwise
//! ```
//!
//! A location touched exactly on cadence scores 1.0, twice as slowly 0.5.
//! Touching more often than required never scores above 1.0.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use para_core::{effective_interval, AnalysisClock, Location, NoteRecord, ReviewDefaults};
use serde::Serialize;
use tracing::{debug, instrument};

/// Staleness statistics for one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewLocationStat {
    pub location: Location,
    pub avg_days_since_touch: f64,
    pub avg_target_days: f64,
    /// In `[0, 1]`.
    pub health_score: f64,
    pub overdue_count: usize,
    pub note_count: usize,
    pub last_touched_at: DateTime<Utc>,
}

/// A note untouched for longer than its target interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverdueNote {
    pub path: String,
    pub basename: String,
    pub location: Location,
    pub days_since_touch: f64,
    pub target_days: f64,
    /// `days_since_touch - target_days`, always positive.
    pub overdue_by_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewReport {
    /// One entry per reviewed location that has notes, in canonical order.
    pub locations: Vec<ReviewLocationStat>,
    /// Most overdue first.
    pub overdue: Vec<OverdueNote>,
    /// Mean of the location scores; `None` when no location has notes.
    pub overall_health: Option<f64>,
    /// `overall_health` as a rounded percentage for display.
    pub overall_health_percent: Option<u32>,
    /// Location with the highest mean days since touch.
    pub stalest_location: Option<Location>,
    /// Location with the lowest mean days since touch.
    pub freshest_location: Option<Location>,
}

/// Health for a location given its mean target and mean days since touch.
pub fn health_score(avg_target_days: f64, avg_days_since_touch: f64) -> f64 {
    if avg_days_since_touch <= 0.0 {
        return 1.0;
    }
    (avg_target_days / avg_days_since_touch).clamp(0.0, 1.0)
}

#[derive(Debug)]
struct LocationTally {
    days_since_touch: Vec<f64>,
    targets: Vec<f64>,
    overdue_count: usize,
    last_touched_at: DateTime<Utc>,
}

impl LocationTally {
    fn finish(self, location: Location) -> ReviewLocationStat {
        let mean = |xs: &[f64]| xs.iter().sum::<f64>() / xs.len() as f64;
        let avg_days_since_touch = mean(&self.days_since_touch);
        let avg_target_days = mean(&self.targets);
        ReviewLocationStat {
            location,
            avg_days_since_touch,
            avg_target_days,
            health_score: health_score(avg_target_days, avg_days_since_touch),
            overdue_count: self.overdue_count,
            note_count: self.days_since_touch.len(),
            last_touched_at: self.last_touched_at,
        }
    }
}

/// Score review cadence health for every reviewed location.
#[instrument(skip(notes, clock, defaults), fields(subsystem = "analytics", component = "review", op = "score", note_count = notes.len()))]
pub fn score_review_cadence(
    notes: &[NoteRecord],
    clock: &AnalysisClock,
    defaults: &ReviewDefaults,
) -> ReviewReport {
    let mut tallies: BTreeMap<Location, LocationTally> = BTreeMap::new();
    let mut overdue = Vec::new();

    for note in notes {
        if !Location::REVIEWED.contains(&note.location) {
            continue;
        }
        let Some(target) = effective_interval(note, defaults) else {
            continue;
        };
        let since = clock.days_since(note.modified_at);
        let is_overdue = since > target;

        let tally = tallies.entry(note.location).or_insert_with(|| LocationTally {
            days_since_touch: Vec::new(),
            targets: Vec::new(),
            overdue_count: 0,
            last_touched_at: note.modified_at,
        });
        tally.days_since_touch.push(since);
        tally.targets.push(target);
        tally.last_touched_at = tally.last_touched_at.max(note.modified_at);
        if is_overdue {
            tally.overdue_count += 1;
            overdue.push(OverdueNote {
                path: note.path.clone(),
                basename: note.basename.clone(),
                location: note.location,
                days_since_touch: since,
                target_days: target,
                overdue_by_days: since - target,
            });
        }
    }

    overdue.sort_by(|a, b| {
        b.overdue_by_days
            .total_cmp(&a.overdue_by_days)
            .then_with(|| a.path.cmp(&b.path))
    });

    let locations: Vec<ReviewLocationStat> = tallies
        .into_iter()
        .map(|(location, tally)| tally.finish(location))
        .collect();

    let overall_health = (!locations.is_empty()).then(|| {
        locations.iter().map(|s| s.health_score).sum::<f64>() / locations.len() as f64
    });

    let stalest_location = locations
        .iter()
        .fold(None::<&ReviewLocationStat>, |best, s| match best {
            Some(b) if b.avg_days_since_touch >= s.avg_days_since_touch => Some(b),
            _ => Some(s),
        })
        .map(|s| s.location);
    let freshest_location = locations
        .iter()
        .fold(None::<&ReviewLocationStat>, |best, s| match best {
            Some(b) if b.avg_days_since_touch <= s.avg_days_since_touch => Some(b),
            _ => Some(s),
        })
        .map(|s| s.location);

    debug!(
        locations = locations.len(),
        overdue_count = overdue.len(),
        overall_health = ?overall_health,
        "Review cadence scored"
    );

    ReviewReport {
        overall_health_percent: overall_health.map(|h| (h * 100.0).round() as u32),
        locations,
        overdue,
        overall_health,
        stalest_location,
        freshest_location,
    }
}
