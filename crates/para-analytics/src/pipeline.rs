//! Pipeline timeline reconstruction.
//!
//! Rebuilds, for every day in a trailing window, how many notes sat in each
//! PARA location, by replaying each note's movement history. Also derives
//! how long notes stay in each stage and which moves are most common.
//!
//! Each note's timeline is a list of `(instant, location)` states: the first
//! state is the note's creation in its inferred initial location (the `from`
//! of its earliest move, else its current location), followed by one state
//! per recorded move. A day's census samples every timeline at local noon.
//!
//! Zero-length stays (a move recorded at or before the moment the timeline
//! starts, or two moves at the same instant) still count as transitions but
//! contribute no stage-duration sample.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use para_core::defaults::MAX_WINDOW_DAYS;
use para_core::{
    days_between, dominant_location, empty_location_counts, AnalysisClock, Location,
    LocationCounts, NoteRecord, Transition,
};
use serde::Serialize;
use tracing::{debug, instrument};

/// Census for one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineDay {
    pub date: NaiveDate,
    pub counts_by_location: LocationCounts,
    /// Always equal to the sum of `counts_by_location`.
    pub total: usize,
    /// Location with the highest count; `None` on an empty day.
    pub dominant_location: Option<Location>,
}

impl PipelineDay {
    fn from_counts(date: NaiveDate, counts_by_location: LocationCounts) -> Self {
        Self {
            date,
            total: counts_by_location.values().sum(),
            dominant_location: dominant_location(&counts_by_location),
            counts_by_location,
        }
    }

    pub fn count(&self, location: Location) -> usize {
        self.counts_by_location.get(&location).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageDuration {
    pub location: Location,
    pub avg_days: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusiestDay {
    pub date: NaiveDate,
    pub total: usize,
    pub dominant_location: Option<Location>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionCount {
    pub transition: Transition,
    pub count: usize,
}

/// Reconstructed pipeline for a trailing window plus stage statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineTimeline {
    pub window_days: u32,
    /// One entry per day, oldest first, ending today.
    pub days: Vec<PipelineDay>,
    /// Mean days spent in a location before moving on. Locations without a
    /// completed stay are absent.
    pub avg_stage_days: BTreeMap<Location, f64>,
    pub longest_stage: Option<StageDuration>,
    pub busiest_day: Option<BusiestDay>,
    pub top_transition: Option<TransitionCount>,
    pub transition_counts: BTreeMap<Transition, usize>,
}

/// An `(instant, location)` point on a note's timeline.
pub type NoteState = (DateTime<Utc>, Location);

/// Ordered `(instant, location)` states for one note.
pub fn note_states(note: &NoteRecord) -> Vec<NoteState> {
    let (start, initial) = match note.history.first() {
        Some(first) => (note.created_at.min(first.timestamp), first.from),
        None => (note.created_at, note.location),
    };

    let mut states: Vec<NoteState> = std::iter::once((start, initial))
        .chain(note.history.iter().map(|e| (e.timestamp, e.to)))
        .collect();
    states.sort_by_key(|s| s.0);
    states
}

/// Location of a note at `instant`: the latest state at or before it.
fn location_at(states: &[NoteState], instant: DateTime<Utc>) -> Option<Location> {
    let idx = states.partition_point(|s| s.0 <= instant);
    idx.checked_sub(1).map(|i| states[i].1)
}

#[derive(Debug, Default)]
struct StageTally {
    samples: BTreeMap<Location, Vec<f64>>,
    transitions: BTreeMap<Transition, usize>,
}

impl StageTally {
    fn absorb(mut self, states: &[NoteState]) -> Self {
        for pair in states.windows(2) {
            let (prev_at, prev_loc) = pair[0];
            let (next_at, next_loc) = pair[1];
            let stay = days_between(prev_at, next_at);
            if stay > 0.0 {
                self.samples.entry(prev_loc).or_default().push(stay);
            }
            *self
                .transitions
                .entry(Transition::new(prev_loc, next_loc))
                .or_insert(0) += 1;
        }
        self
    }

    fn averages(&self) -> BTreeMap<Location, f64> {
        self.samples
            .iter()
            .filter(|(_, s)| !s.is_empty())
            .map(|(loc, s)| (*loc, s.iter().sum::<f64>() / s.len() as f64))
            .collect()
    }
}

/// Reconstruct the per-day census for the `window_days` days ending today.
#[instrument(skip(notes, clock), fields(subsystem = "analytics", component = "pipeline", op = "reconstruct", note_count = notes.len()))]
pub fn reconstruct_pipeline(
    notes: &[NoteRecord],
    clock: &AnalysisClock,
    window_days: u32,
) -> PipelineTimeline {
    let dates = clock.trailing_days(window_days);
    let samples: Vec<DateTime<Utc>> = dates.iter().map(|d| clock.local_midday(*d)).collect();
    let timelines: Vec<Vec<NoteState>> = notes.iter().map(note_states).collect();

    let days: Vec<PipelineDay> = dates
        .iter()
        .zip(&samples)
        .map(|(date, sample)| {
            let counts = timelines
                .iter()
                .filter_map(|states| location_at(states, *sample))
                .fold(empty_location_counts(), |mut counts, loc| {
                    *counts.entry(loc).or_insert(0) += 1;
                    counts
                });
            PipelineDay::from_counts(*date, counts)
        })
        .collect();

    let stages = timelines
        .iter()
        .fold(StageTally::default(), |tally, states| tally.absorb(states));
    let avg_stage_days = stages.averages();

    let longest_stage = avg_stage_days
        .iter()
        .fold(None::<StageDuration>, |best, (loc, avg)| match best {
            Some(b) if b.avg_days >= *avg => Some(b),
            _ => Some(StageDuration {
                location: *loc,
                avg_days: *avg,
            }),
        });

    let busiest_day = days
        .iter()
        .filter(|d| d.total > 0)
        .fold(None::<&PipelineDay>, |best, day| match best {
            Some(b) if b.total >= day.total => Some(b),
            _ => Some(day),
        })
        .map(|d| BusiestDay {
            date: d.date,
            total: d.total,
            dominant_location: d.dominant_location,
        });

    let top_transition = stages
        .transitions
        .iter()
        .fold(None::<TransitionCount>, |best, (t, count)| match best {
            Some(b) if b.count >= *count => Some(b),
            _ => Some(TransitionCount {
                transition: *t,
                count: *count,
            }),
        });

    debug!(
        days = days.len(),
        transitions = stages.transitions.values().sum::<usize>(),
        longest_stage = ?longest_stage.map(|s| s.location),
        top_transition = ?top_transition.map(|t| t.transition.to_string()),
        "Pipeline reconstructed"
    );

    PipelineTimeline {
        window_days: window_days.min(MAX_WINDOW_DAYS),
        days,
        avg_stage_days,
        longest_stage,
        busiest_day,
        top_transition,
        transition_counts: stages.transitions,
    }
}
