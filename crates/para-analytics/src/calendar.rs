//! Four-week task calendar.
//!
//! Lays due-dated tasks onto a fixed 28-day grid starting on the Monday of
//! the current week, and collects overdue work regardless of whether it
//! falls inside the grid.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use para_core::defaults::{CALENDAR_DAYS, CALENDAR_WEEK_AHEAD_DAYS};
use para_core::{empty_location_counts, AnalysisClock, LocationCounts, TaskRecord};
use serde::Serialize;
use tracing::{debug, instrument};

/// One day in the calendar grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// Open tasks first, then completed; alphabetical by text within each.
    pub tasks: Vec<TaskRecord>,
    pub counts_by_location: LocationCounts,
    pub is_today: bool,
    pub is_past: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusiestCell {
    pub date: NaiveDate,
    pub task_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskCalendar {
    pub today: NaiveDate,
    /// 28 consecutive days starting on this week's Monday.
    pub cells: Vec<CalendarCell>,
    /// Open tasks due before today, earliest due first.
    pub overdue: Vec<TaskRecord>,
    /// Open tasks due from today through the next six days.
    pub due_this_week: usize,
    /// Cell with the most tasks; `None` when the grid is empty.
    pub busiest_cell: Option<BusiestCell>,
    /// Tasks per location across the whole grid.
    pub location_totals: LocationCounts,
}

impl TaskCalendar {
    pub fn cell(&self, date: NaiveDate) -> Option<&CalendarCell> {
        self.cells.iter().find(|c| c.date == date)
    }
}

/// Build the calendar from extracted tasks. Tasks without a due date are
/// ignored.
#[instrument(skip(tasks, clock), fields(subsystem = "analytics", component = "calendar", op = "build_calendar", task_count = tasks.len()))]
pub fn build_calendar(tasks: &[TaskRecord], clock: &AnalysisClock) -> TaskCalendar {
    let today = clock.today();
    let start = clock.week_start();
    let week_end = today + Duration::days(CALENDAR_WEEK_AHEAD_DAYS);

    let mut by_date: BTreeMap<NaiveDate, Vec<TaskRecord>> = BTreeMap::new();
    let mut overdue = Vec::new();
    let mut due_this_week = 0;

    for task in tasks {
        let Some(due) = task.due_date else {
            continue;
        };
        if task.is_overdue(today) {
            overdue.push(task.clone());
        }
        if !task.completed && due >= today && due < week_end {
            due_this_week += 1;
        }
        by_date.entry(due).or_default().push(task.clone());
    }

    overdue.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.text.cmp(&b.text)));

    let mut location_totals = empty_location_counts();
    let cells: Vec<CalendarCell> = (0..i64::from(CALENDAR_DAYS))
        .map(|offset| {
            let date = start + Duration::days(offset);
            let mut tasks = by_date.remove(&date).unwrap_or_default();
            tasks.sort_by(|a, b| a.completed.cmp(&b.completed).then_with(|| a.text.cmp(&b.text)));

            let mut counts_by_location = empty_location_counts();
            for task in &tasks {
                *counts_by_location.entry(task.location).or_insert(0) += 1;
                *location_totals.entry(task.location).or_insert(0) += 1;
            }

            CalendarCell {
                date,
                tasks,
                counts_by_location,
                is_today: date == today,
                is_past: date < today,
            }
        })
        .collect();

    let busiest_cell = cells
        .iter()
        .filter(|c| !c.tasks.is_empty())
        .fold(None::<&CalendarCell>, |best, cell| match best {
            Some(b) if b.tasks.len() >= cell.tasks.len() => Some(b),
            _ => Some(cell),
        })
        .map(|c| BusiestCell {
            date: c.date,
            task_count: c.tasks.len(),
        });

    debug!(
        overdue_count = overdue.len(),
        due_this_week,
        in_grid = location_totals.values().sum::<usize>(),
        "Task calendar built"
    );

    TaskCalendar {
        today,
        cells,
        overdue,
        due_this_week,
        busiest_cell,
        location_totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use para_core::Location;

    // 2024-03-14 is a Thursday; the grid starts Monday 2024-03-11.
    fn clock() -> AnalysisClock {
        AnalysisClock::utc(
            DateTime::parse_from_rfc3339("2024-03-14T09:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        )
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn task(text: &str, due: Option<&str>, completed: bool, loc: Location) -> TaskRecord {
        TaskRecord {
            file_path: format!("{}.md", text),
            location: loc,
            line_number: 1,
            text: text.to_string(),
            completed,
            completion_date: None,
            due_date: due.map(date),
            created_date: None,
            age_in_days: None,
        }
    }

    #[test]
    fn test_grid_shape() {
        let cal = build_calendar(&[], &clock());
        assert_eq!(cal.cells.len(), 28);
        assert_eq!(cal.cells[0].date, date("2024-03-11"));
        assert_eq!(cal.cells[27].date, date("2024-04-07"));
        assert!(cal.cells[0].is_past);
        assert!(cal.cells[3].is_today);
        assert!(!cal.cells[3].is_past);
        assert!(!cal.cells[4].is_past);
        assert!(cal.busiest_cell.is_none());
        assert_eq!(cal.due_this_week, 0);
        assert_eq!(cal.location_totals.values().sum::<usize>(), 0);
    }

    #[test]
    fn test_tasks_placed_and_sorted() {
        let tasks = vec![
            task("zeta", Some("2024-03-15"), false, Location::Projects),
            task("alpha", Some("2024-03-15"), true, Location::Projects),
            task("beta", Some("2024-03-15"), false, Location::Areas),
            task("undated", None, false, Location::Areas),
        ];
        let cal = build_calendar(&tasks, &clock());
        let cell = cal.cell(date("2024-03-15")).unwrap();
        let order: Vec<&str> = cell.tasks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(order, vec!["beta", "zeta", "alpha"]);
        assert_eq!(cell.counts_by_location[&Location::Projects], 2);
        assert_eq!(cell.counts_by_location[&Location::Areas], 1);
        assert_eq!(cal.busiest_cell, Some(BusiestCell { date: date("2024-03-15"), task_count: 3 }));
        assert_eq!(cal.location_totals[&Location::Projects], 2);
    }

    #[test]
    fn test_overdue_includes_outside_grid() {
        let tasks = vec![
            task("ancient", Some("2023-12-01"), false, Location::Inbox),
            task("monday", Some("2024-03-11"), false, Location::Inbox),
            task("done", Some("2024-03-12"), true, Location::Inbox),
            task("today", Some("2024-03-14"), false, Location::Inbox),
        ];
        let cal = build_calendar(&tasks, &clock());
        let overdue: Vec<&str> = cal.overdue.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(overdue, vec!["ancient", "monday"]);
        // Out-of-grid tasks are not placed in cells.
        assert_eq!(cal.location_totals[&Location::Inbox], 3);
    }

    #[test]
    fn test_due_this_week_window() {
        let tasks = vec![
            task("today", Some("2024-03-14"), false, Location::Projects),
            task("sixth", Some("2024-03-20"), false, Location::Projects),
            task("seventh", Some("2024-03-21"), false, Location::Projects),
            task("done", Some("2024-03-15"), true, Location::Projects),
            task("yesterday", Some("2024-03-13"), false, Location::Projects),
        ];
        let cal = build_calendar(&tasks, &clock());
        assert_eq!(cal.due_this_week, 2);
    }

    #[test]
    fn test_busiest_cell_earliest_on_tie() {
        let tasks = vec![
            task("a", Some("2024-03-20"), false, Location::Areas),
            task("b", Some("2024-03-18"), false, Location::Areas),
        ];
        let cal = build_calendar(&tasks, &clock());
        assert_eq!(cal.busiest_cell.unwrap().date, date("2024-03-18"));
    }

    #[test]
    fn test_after_grid_not_placed() {
        let tasks = vec![task("later", Some("2024-05-01"), false, Location::Resources)];
        let cal = build_calendar(&tasks, &clock());
        assert!(cal.cells.iter().all(|c| c.tasks.is_empty()));
        assert!(cal.overdue.is_empty());
        assert!(cal.busiest_cell.is_none());
    }
}
