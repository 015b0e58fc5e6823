//! Whole-vault report combining every analysis.

use chrono::{DateTime, Utc};
use para_core::{AnalysisClock, AnalyticsConfig, NoteRecord, TaskRecord};
use serde::Serialize;
use tracing::{info, instrument};

use crate::calendar::{build_calendar, TaskCalendar};
use crate::flow::{estimate_flow, FlowResult};
use crate::pipeline::{reconstruct_pipeline, PipelineTimeline};
use crate::review::{score_review_cadence, ReviewReport};

/// Task counts across the vault.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    pub total: usize,
    pub open: usize,
    pub completed: usize,
    pub overdue: usize,
    /// Mean `age_in_days` over completed tasks that have one.
    pub avg_completed_age_days: Option<f64>,
}

impl TaskSummary {
    pub fn from_tasks(tasks: &[TaskRecord], clock: &AnalysisClock) -> Self {
        let today = clock.today();
        let ages: Vec<i64> = tasks.iter().filter_map(|t| t.age_in_days).collect();
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            total: tasks.len(),
            open: tasks.len() - completed,
            completed,
            overdue: tasks.iter().filter(|t| t.is_overdue(today)).count(),
            avg_completed_age_days: (!ages.is_empty())
                .then(|| ages.iter().sum::<i64>() as f64 / ages.len() as f64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaultReport {
    pub generated_at: DateTime<Utc>,
    pub note_count: usize,
    pub flow: FlowResult,
    pub pipeline: PipelineTimeline,
    pub review: ReviewReport,
    pub calendar: TaskCalendar,
    pub tasks: TaskSummary,
}

/// Run every analysis over one snapshot of the vault as of `now`.
#[instrument(skip(notes, tasks, config), fields(subsystem = "analytics", component = "report", op = "build_report", note_count = notes.len(), task_count = tasks.len()))]
pub fn build_report(
    notes: &[NoteRecord],
    tasks: &[TaskRecord],
    config: &AnalyticsConfig,
    now: DateTime<Utc>,
) -> VaultReport {
    let clock = AnalysisClock::with_offset_minutes(now, config.utc_offset_minutes);

    let flow = estimate_flow(notes, &clock, &config.flow, config.flow_window_days);
    let pipeline = reconstruct_pipeline(notes, &clock, config.pipeline_window_days);
    let review = score_review_cadence(notes, &clock, &config.review);
    let calendar = build_calendar(tasks, &clock);
    let summary = TaskSummary::from_tasks(tasks, &clock);

    info!(
        total_flow = flow.total_flow(),
        overdue_notes = review.overdue.len(),
        overdue_count = summary.overdue,
        health_percent = ?review.overall_health_percent,
        "Vault report built"
    );

    VaultReport {
        generated_at: now,
        note_count: notes.len(),
        flow,
        pipeline,
        review,
        calendar,
        tasks: summary,
    }
}
