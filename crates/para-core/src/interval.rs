//! Review cadence normalization.
//!
//! Notes may carry a hand-written cadence (`14`, `"weekly"`, `"2w"`,
//! `"3 months"`). This module turns whatever is there into a day count, or
//! `None` when nothing usable was written, in which case the per-location
//! default from [`crate::config::ReviewDefaults`] applies at scoring time.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::config::ReviewDefaults;
use crate::defaults::{CADENCE_DAILY, CADENCE_MONTHLY, CADENCE_QUARTERLY, CADENCE_WEEKLY};
use crate::models::NoteRecord;

static COUNT_WITH_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*([a-z]+)$").expect("static regex"));

/// Resolve a raw metadata value into a review interval in days.
///
/// | Input | Result |
/// |-------|--------|
/// | finite positive number | as-is |
/// | `daily` / `weekly` / `monthly` / `quarterly` | 1 / 7 / 30 / 90 |
/// | `<n> d…` / `<n> w…` / `<n> m…` | n / 7n / 30n |
/// | bare integer string | that integer |
/// | anything else, zero, or negative | `None` |
///
/// # Examples
///
/// ```
/// use para_core::interval::resolve_interval;
/// use serde_json::json;
///
/// assert_eq!(resolve_interval(Some(&json!("2w"))), Some(14.0));
/// assert_eq!(resolve_interval(Some(&json!("monthly"))), Some(30.0));
/// assert_eq!(resolve_interval(Some(&json!(""))), None);
/// assert_eq!(resolve_interval(Some(&json!(-5))), None);
/// ```
pub fn resolve_interval(raw: Option<&JsonValue>) -> Option<f64> {
    match raw? {
        JsonValue::Number(n) => n.as_f64().and_then(positive_finite),
        JsonValue::String(s) => resolve_interval_str(s),
        _ => None,
    }
}

/// String form of [`resolve_interval`].
pub fn resolve_interval_str(raw: &str) -> Option<f64> {
    let s = raw.trim().to_lowercase();
    if s.is_empty() {
        return None;
    }

    match s.as_str() {
        "daily" => return Some(CADENCE_DAILY),
        "weekly" => return Some(CADENCE_WEEKLY),
        "monthly" => return Some(CADENCE_MONTHLY),
        "quarterly" => return Some(CADENCE_QUARTERLY),
        _ => {}
    }

    if let Some(caps) = COUNT_WITH_UNIT.captures(&s) {
        let count: f64 = caps[1].parse::<u32>().ok()?.into();
        let multiplier = match caps[2].chars().next() {
            Some('d') => 1.0,
            Some('w') => 7.0,
            Some('m') => 30.0,
            _ => return None,
        };
        return positive_finite(count * multiplier);
    }

    s.parse::<i64>()
        .ok()
        .and_then(|n| positive_finite(n as f64))
}

/// Target interval for a note: its own override, else the location default.
///
/// Returns `None` only for locations without a default (`unknown`).
pub fn effective_interval(note: &NoteRecord, defaults: &ReviewDefaults) -> Option<f64> {
    note.review_interval_days
        .and_then(positive_finite)
        .or_else(|| defaults.for_location(note.location))
}

fn positive_finite(days: f64) -> Option<f64> {
    (days.is_finite() && days > 0.0).then_some(days)
}
