//! Opening-hours and event-time evaluation.
//!
//! Everything here is pure: provider strings are normalized once at ingestion
//! and the evaluator answers questions against a pinned instant.

pub mod clock;
pub mod cost;
pub mod schedule;
pub mod window;

pub use clock::format_minutes;
pub use cost::{is_event_under_ceiling, parse_cost, DEFAULT_COST_CEILING};
pub use schedule::{DayHours, Schedule};
pub use window::{parse_instant, TimeWindowEvaluator};
