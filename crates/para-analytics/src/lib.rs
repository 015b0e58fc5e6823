//! # para-analytics
//!
//! Analytics over a normalized PARA vault.
//!
//! This crate provides:
//! - Flow estimation between PARA locations (history-backed or inferred)
//! - Day-by-day pipeline census and stage durations
//! - Review cadence health per location
//! - A four-week task calendar with overdue tracking
//!
//! Every analysis is a pure function of its inputs and an [`AnalysisClock`].
//!
//! ## Example
//!
//! ```ignore
//! use para_analytics::{build_report, extract_vault_tasks, AnalyticsConfig, VaultSnapshot};
//!
//! let snapshot = VaultSnapshot::from_json(&json)?;
//! let config = AnalyticsConfig::from_env();
//! let notes = snapshot.to_records(&config);
//! let tasks = extract_vault_tasks(&snapshot.inline_content(), &notes);
//! let report = build_report(&notes, &tasks, &config, chrono::Utc::now());
//! ```

pub mod calendar;
pub mod flow;
pub mod pipeline;
pub mod report;
pub mod review;

// Re-export core types
pub use para_core::*;

// Re-export analytics types
pub use calendar::{build_calendar, BusiestCell, CalendarCell, TaskCalendar};
pub use flow::{estimate_flow, FlowResult};
pub use pipeline::{
    note_states, reconstruct_pipeline, BusiestDay, NoteState, PipelineDay, PipelineTimeline,
    StageDuration, TransitionCount,
};
pub use report::{build_report, TaskSummary, VaultReport};
pub use review::{health_score, score_review_cadence, OverdueNote, ReviewLocationStat, ReviewReport};
