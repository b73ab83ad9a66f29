use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

pub const DEFAULT_COST_CEILING: f64 = 20.0;

static LEADING_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\$?\s*(\d+(?:\.\d+)?)").expect("valid regex"));

/// Read a loosely-typed cost field. `None` means free or unknown.
pub fn parse_cost(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => LEADING_AMOUNT
            .captures(text)
            .and_then(|caps| caps[1].parse::<f64>().ok()),
        _ => None,
    }
}

/// Missing or unreadable prices pass; a plausible free event should not be
/// hidden because of a data-entry gap.
pub fn is_event_under_ceiling(cost: Option<f64>, ceiling: f64) -> bool {
    match cost {
        Some(amount) => amount <= ceiling,
        None => true,
    }
}
