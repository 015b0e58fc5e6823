//! # para-core
//!
//! Core types, metadata normalization, and task extraction for PARA vault
//! analytics.
//!
//! This crate provides the canonical data model ([`NoteRecord`],
//! [`TaskRecord`], [`Location`]) that the analytics crate folds over, plus
//! the boundary code that turns hand-edited host metadata into it.

pub mod clock;
pub mod config;
pub mod defaults;
pub mod error;
pub mod interval;
pub mod logging;
pub mod metadata;
pub mod models;
pub mod tasks;

// Re-export commonly used types at crate root
pub use clock::{days_between, AnalysisClock};
pub use config::{AnalyticsConfig, ArchiveThreshold, FlowHeuristics, MetadataFields, ReviewDefaults};
pub use error::{Error, Result};
pub use interval::{effective_interval, resolve_interval, resolve_interval_str};
pub use metadata::{InlineContent, RawNote, VaultSnapshot};
pub use models::*;
pub use tasks::{extract_note_tasks, extract_tasks, extract_vault_tasks, ContentSource};
