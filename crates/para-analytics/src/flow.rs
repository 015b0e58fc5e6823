//! PARA flow estimation.
//!
//! Counts how notes move through the canonical PARA flows. Notes with
//! recorded history contribute observed transitions; notes without history
//! fall back to an inference from their current location, age, and
//! staleness.
//!
//! # Heuristic path
//!
//! | Current location | Credited flows |
//! |------------------|----------------|
//! | inbox | none (not moved yet) |
//! | projects | `inbox->projects`, plus `projects->archive` when old and stale |
//! | areas | `inbox->areas`, plus `areas->archive` when old and stale |
//! | resources | `inbox->resources`, plus `resources->archive` when old and stale |
//! | archive | one of `{projects,areas,resources}->archive` by age band |
//! | unknown | none |
//!
//! The archive row is a guess about where the note came from, not a fact.

use std::collections::BTreeMap;

use chrono::TimeDelta;
use para_core::{
    days_between, AnalysisClock, FlowHeuristics, FlowKey, Location, NoteRecord,
};
use serde::Serialize;
use tracing::{debug, instrument, trace};

/// Aggregate flow counts for a set of notes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowResult {
    /// Count per canonical flow; all six keys are always present.
    pub flows: BTreeMap<FlowKey, usize>,
    /// Notes currently in `projects`.
    pub active_projects: usize,
    /// Notes currently in `archive`.
    pub archived_notes: usize,
    /// Mean project lifetime in days (0 when there are no samples).
    pub avg_project_duration_days: f64,
    /// Notes whose flows came from recorded history.
    pub history_backed_count: usize,
    /// Notes whose flows were inferred.
    pub heuristic_count: usize,
    /// Heuristic-path notes attributed to `projects` by the inference
    /// branch. Kept apart from `active_projects`, which is a plain snapshot
    /// of current locations.
    pub heuristic_active_projects: usize,
    /// Heuristic-path notes attributed to `archive` by the inference branch.
    pub heuristic_archived_notes: usize,
}

impl FlowResult {
    pub fn flow(&self, key: FlowKey) -> usize {
        self.flows.get(&key).copied().unwrap_or(0)
    }

    /// Sum over all six canonical flows.
    pub fn total_flow(&self) -> usize {
        self.flows.values().sum()
    }
}

#[derive(Debug, Clone)]
struct FlowTally {
    flows: BTreeMap<FlowKey, usize>,
    active_projects: usize,
    archived_notes: usize,
    duration_samples: Vec<f64>,
    history_backed_count: usize,
    heuristic_count: usize,
    heuristic_active_projects: usize,
    heuristic_archived_notes: usize,
}

impl Default for FlowTally {
    fn default() -> Self {
        Self {
            flows: FlowKey::ALL.iter().map(|k| (*k, 0)).collect(),
            active_projects: 0,
            archived_notes: 0,
            duration_samples: Vec::new(),
            history_backed_count: 0,
            heuristic_count: 0,
            heuristic_active_projects: 0,
            heuristic_archived_notes: 0,
        }
    }
}

impl FlowTally {
    fn credit(&mut self, key: FlowKey) {
        *self.flows.entry(key).or_insert(0) += 1;
    }

    fn sample_duration(&mut self, days: f64) {
        if days > 0.0 {
            self.duration_samples.push(days);
        }
    }

    fn absorb(mut self, note: &NoteRecord, clock: &AnalysisClock, rules: &FlowHeuristics) -> Self {
        if note.history.is_empty() {
            self.absorb_heuristic(note, clock, rules);
        } else {
            self.absorb_history(note);
        }

        match note.location {
            Location::Projects => self.active_projects += 1,
            Location::Archive => self.archived_notes += 1,
            Location::Inbox | Location::Areas | Location::Resources | Location::Unknown => {}
        }
        self
    }

    fn absorb_history(&mut self, note: &NoteRecord) {
        self.history_backed_count += 1;
        for entry in &note.history {
            if let Some(key) = FlowKey::from_pair(entry.from, entry.to) {
                self.credit(key);
                if key == FlowKey::ProjectsToArchive {
                    self.sample_duration(days_between(note.created_at, entry.timestamp));
                }
            }
        }
    }

    fn absorb_heuristic(&mut self, note: &NoteRecord, clock: &AnalysisClock, rules: &FlowHeuristics) {
        self.heuristic_count += 1;
        let age = clock.days_since(note.created_at);
        let stale = clock.days_since(note.modified_at);

        match note.location {
            Location::Inbox | Location::Unknown => {}
            Location::Projects => {
                self.heuristic_active_projects += 1;
                self.credit(FlowKey::InboxToProjects);
                self.sample_duration(age);
                if rules.projects.is_met(age, stale) {
                    self.credit(FlowKey::ProjectsToArchive);
                }
            }
            Location::Areas => {
                self.credit(FlowKey::InboxToAreas);
                if rules.areas.is_met(age, stale) {
                    self.credit(FlowKey::AreasToArchive);
                }
            }
            Location::Resources => {
                self.credit(FlowKey::InboxToResources);
                if rules.resources.is_met(age, stale) {
                    self.credit(FlowKey::ResourcesToArchive);
                }
            }
            Location::Archive => {
                self.heuristic_archived_notes += 1;
                let origin = if age < rules.archive_project_max_age_days {
                    FlowKey::ProjectsToArchive
                } else if age < rules.archive_area_max_age_days {
                    FlowKey::AreasToArchive
                } else {
                    FlowKey::ResourcesToArchive
                };
                self.credit(origin);
            }
        }

        trace!(
            note_path = %note.path,
            location = %note.location,
            age_days = age,
            stale_days = stale,
            "Heuristic flow applied"
        );
    }

    fn finish(self) -> FlowResult {
        let avg_project_duration_days = if self.duration_samples.is_empty() {
            0.0
        } else {
            self.duration_samples.iter().sum::<f64>() / self.duration_samples.len() as f64
        };
        FlowResult {
            flows: self.flows,
            active_projects: self.active_projects,
            archived_notes: self.archived_notes,
            avg_project_duration_days,
            history_backed_count: self.history_backed_count,
            heuristic_count: self.heuristic_count,
            heuristic_active_projects: self.heuristic_active_projects,
            heuristic_archived_notes: self.heuristic_archived_notes,
        }
    }
}

/// Estimate PARA flows across `notes`.
///
/// When `created_within_days` is set, only notes created within that many
/// days before `clock.now()` are considered.
#[instrument(skip(notes, clock, rules), fields(subsystem = "analytics", component = "flow", op = "estimate_flow", note_count = notes.len()))]
pub fn estimate_flow(
    notes: &[NoteRecord],
    clock: &AnalysisClock,
    rules: &FlowHeuristics,
    created_within_days: Option<u32>,
) -> FlowResult {
    // A window reaching past the representable calendar covers everything.
    let cutoff = created_within_days.and_then(|days| {
        TimeDelta::try_days(i64::from(days)).and_then(|span| clock.now().checked_sub_signed(span))
    });

    let result = notes
        .iter()
        .filter(|note| cutoff.map_or(true, |c| note.created_at >= c))
        .fold(FlowTally::default(), |tally, note| {
            tally.absorb(note, clock, rules)
        })
        .finish();

    debug!(
        history_backed = result.history_backed_count,
        heuristic = result.heuristic_count,
        total_flow = result.total_flow(),
        avg_project_duration_days = result.avg_project_duration_days,
        "Flow estimated"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use para_core::HistoryEntry;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        now() - Duration::days(days)
    }

    fn note(loc: Location, created_days_ago: i64, modified_days_ago: i64) -> NoteRecord {
        NoteRecord::new(
            format!("{}/n.md", loc),
            loc,
            days_ago(created_days_ago),
            days_ago(modified_days_ago),
        )
    }

    fn run(notes: &[NoteRecord]) -> FlowResult {
        estimate_flow(
            notes,
            &AnalysisClock::utc(now()),
            &FlowHeuristics::default(),
            None,
        )
    }

    #[test]
    fn test_empty_vault_all_zero() {
        let result = run(&[]);
        assert_eq!(result.flows.len(), 6);
        assert_eq!(result.total_flow(), 0);
        assert_eq!(result.active_projects, 0);
        assert_eq!(result.archived_notes, 0);
        assert_eq!(result.avg_project_duration_days, 0.0);
        assert_eq!(result.history_backed_count, 0);
        assert_eq!(result.heuristic_count, 0);
    }

    #[test]
    fn test_stale_project_credits_both_flows() {
        let result = run(&[note(Location::Projects, 100, 40)]);
        assert_eq!(result.flow(FlowKey::InboxToProjects), 1);
        assert_eq!(result.flow(FlowKey::ProjectsToArchive), 1);
        assert_eq!(result.avg_project_duration_days, 100.0);
        assert_eq!(result.heuristic_count, 1);
        assert_eq!(result.active_projects, 1);
        assert_eq!(result.heuristic_active_projects, 1);
    }

    #[test]
    fn test_fresh_project_only_inbox_flow() {
        let result = run(&[note(Location::Projects, 100, 10)]);
        assert_eq!(result.flow(FlowKey::InboxToProjects), 1);
        assert_eq!(result.flow(FlowKey::ProjectsToArchive), 0);
    }

    #[test]
    fn test_inbox_and_unknown_credit_nothing() {
        let result = run(&[note(Location::Inbox, 500, 400), note(Location::Unknown, 500, 400)]);
        assert_eq!(result.total_flow(), 0);
        assert_eq!(result.heuristic_count, 2);
    }

    #[test]
    fn test_area_and_resource_thresholds() {
        let result = run(&[
            note(Location::Areas, 200, 100),
            note(Location::Areas, 200, 50),
            note(Location::Resources, 400, 200),
            note(Location::Resources, 300, 200),
        ]);
        assert_eq!(result.flow(FlowKey::InboxToAreas), 2);
        assert_eq!(result.flow(FlowKey::AreasToArchive), 1);
        assert_eq!(result.flow(FlowKey::InboxToResources), 2);
        assert_eq!(result.flow(FlowKey::ResourcesToArchive), 1);
    }

    #[test]
    fn test_archive_origin_by_age_band() {
        let result = run(&[
            note(Location::Archive, 30, 30),
            note(Location::Archive, 120, 120),
            note(Location::Archive, 400, 400),
        ]);
        assert_eq!(result.flow(FlowKey::ProjectsToArchive), 1);
        assert_eq!(result.flow(FlowKey::AreasToArchive), 1);
        assert_eq!(result.flow(FlowKey::ResourcesToArchive), 1);
        assert_eq!(result.archived_notes, 3);
        assert_eq!(result.heuristic_archived_notes, 3);
        assert_eq!(result.total_flow(), 3);
    }

    #[test]
    fn test_history_backed_counts_observed_flows() {
        let n = note(Location::Archive, 50, 5).with_history(vec![
            HistoryEntry {
                from: Location::Inbox,
                to: Location::Projects,
                timestamp: days_ago(40),
            },
            HistoryEntry {
                from: Location::Projects,
                to: Location::Areas,
                timestamp: days_ago(30),
            },
            HistoryEntry {
                from: Location::Projects,
                to: Location::Archive,
                timestamp: days_ago(10),
            },
        ]);
        let result = run(&[n]);
        assert_eq!(result.history_backed_count, 1);
        assert_eq!(result.heuristic_count, 0);
        assert_eq!(result.flow(FlowKey::InboxToProjects), 1);
        assert_eq!(result.flow(FlowKey::ProjectsToArchive), 1);
        assert_eq!(result.total_flow(), 2);
        assert_eq!(result.avg_project_duration_days, 40.0);
        assert_eq!(result.archived_notes, 1);
        assert_eq!(result.heuristic_archived_notes, 0);
    }

    #[test]
    fn test_history_with_only_non_canonical_moves_still_history_backed() {
        let n = note(Location::Areas, 50, 5).with_history(vec![HistoryEntry {
            from: Location::Projects,
            to: Location::Areas,
            timestamp: days_ago(20),
        }]);
        let result = run(&[n]);
        assert_eq!(result.history_backed_count, 1);
        assert_eq!(result.total_flow(), 0);
    }

    #[test]
    fn test_non_positive_project_duration_discarded() {
        let n = note(Location::Archive, 10, 5).with_history(vec![HistoryEntry {
            from: Location::Projects,
            to: Location::Archive,
            timestamp: days_ago(20),
        }]);
        let result = run(&[n]);
        assert_eq!(result.flow(FlowKey::ProjectsToArchive), 1);
        assert_eq!(result.avg_project_duration_days, 0.0);
    }

    #[test]
    fn test_creation_window_filters_notes() {
        let notes = [note(Location::Projects, 10, 1), note(Location::Projects, 100, 1)];
        let result = estimate_flow(
            &notes,
            &AnalysisClock::utc(now()),
            &FlowHeuristics::default(),
            Some(30),
        );
        assert_eq!(result.heuristic_count, 1);
        assert_eq!(result.active_projects, 1);
        assert_eq!(result.avg_project_duration_days, 10.0);
    }

    #[test]
    fn test_unrepresentable_window_covers_whole_vault() {
        let notes = [note(Location::Projects, 10, 1), note(Location::Projects, 100, 1)];
        for days in [200_000_000, u32::MAX] {
            let result = estimate_flow(
                &notes,
                &AnalysisClock::utc(now()),
                &FlowHeuristics::default(),
                Some(days),
            );
            assert_eq!(result.heuristic_count, 2, "window {}", days);
        }
    }

    #[test]
    fn test_custom_heuristics() {
        let mut rules = FlowHeuristics::default();
        rules.projects.min_age_days = 5.0;
        rules.projects.min_stale_days = 1.0;
        let result = estimate_flow(
            &[note(Location::Projects, 10, 2)],
            &AnalysisClock::utc(now()),
            &rules,
            None,
        );
        assert_eq!(result.flow(FlowKey::ProjectsToArchive), 1);
    }

    #[test]
    fn test_result_serializes_flow_keys() {
        let json = serde_json::to_value(run(&[note(Location::Areas, 1, 1)])).unwrap();
        assert_eq!(json["flows"]["inbox->areas"], 1);
        assert_eq!(json["flows"]["resources->archive"], 0);
    }
}
