use super::clock::parse_clock_range;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DAY_NAMES: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DayHours {
    /// Minutes since midnight, both ends inclusive.
    Open { open: u32, close: u32 },
    Closed,
}

impl DayHours {
    /// A range whose close precedes its open never matches.
    pub fn contains(&self, minute: u32) -> bool {
        match *self {
            DayHours::Open { open, close } => minute >= open && minute <= close,
            DayHours::Closed => false,
        }
    }
}

/// Opening hours per weekday, indexed Sunday = 0.
///
/// `None` means the provider said nothing usable about that day, which every
/// caller treats the same as closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    days: [Option<DayHours>; 7],
}

impl Schedule {
    pub fn uniform(hours: DayHours) -> Self {
        Self {
            days: [Some(hours); 7],
        }
    }

    #[cfg(test)]
    pub fn with_day(mut self, day: Weekday, hours: DayHours) -> Self {
        self.days[day_index(day)] = Some(hours);
        self
    }

    pub fn hours_for(&self, day: Weekday) -> Option<DayHours> {
        self.days[day_index(day)]
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.days.iter().all(Option::is_none)
    }

    /// Normalize any of the loosely-structured hours shapes providers send:
    /// a JSON-encoded string, an array of "Day: open – close" entries, a map
    /// keyed by day name or day number, or one range applied to every day.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::default(),
            Value::String(text) => Self::from_text(text),
            Value::Array(entries) => Self::from_entries(entries),
            Value::Object(map) => Self::from_day_map(map),
            other => {
                tracing::trace!("Ignoring hours value of unexpected shape: {}", other);
                Self::default()
            }
        }
    }

    fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::default();
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Array(entries)) => Self::from_entries(&entries),
            Ok(Value::Object(map)) => Self::from_day_map(&map),
            Ok(Value::String(inner)) => Self::from_single_range(&inner),
            _ => Self::from_single_range(trimmed),
        }
    }

    fn from_entries(entries: &[Value]) -> Self {
        let mut schedule = Self::default();
        let lines: Vec<String> = entries.iter().map(value_text).collect();

        for (index, day_name) in DAY_NAMES.iter().enumerate() {
            let entry = lines
                .iter()
                .find(|line| line.trim_start().to_lowercase().starts_with(day_name));

            schedule.days[index] = entry.and_then(|line| parse_day_entry(line));
        }

        schedule
    }

    fn from_day_map(map: &serde_json::Map<String, Value>) -> Self {
        let mut schedule = Self::default();

        for (index, day_name) in DAY_NAMES.iter().enumerate() {
            let index_key = index.to_string();
            let value = map
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(day_name) || key.as_str() == index_key)
                .map(|(_, value)| value);

            schedule.days[index] = value.and_then(|value| {
                let text = value_text(value);
                if text.trim().eq_ignore_ascii_case("closed") {
                    Some(DayHours::Closed)
                } else {
                    parse_range_text(&text)
                }
            });
        }

        schedule
    }

    fn from_single_range(text: &str) -> Self {
        if text.to_lowercase().contains("closed") {
            return Self::uniform(DayHours::Closed);
        }
        match parse_range_text(text) {
            Some(hours) => Self::uniform(hours),
            None => Self::default(),
        }
    }
}

/// "Monday: 11:00 AM – 8:00 PM" or "Tuesday: Closed".
fn parse_day_entry(line: &str) -> Option<DayHours> {
    if line.to_lowercase().contains("closed") {
        return Some(DayHours::Closed);
    }
    let (_, time_part) = line.split_once(':')?;
    let hours = parse_range_text(time_part);
    if hours.is_none() {
        tracing::trace!("Could not parse time range from {:?}", line);
    }
    hours
}

fn parse_range_text(text: &str) -> Option<DayHours> {
    let parts: Vec<&str> = text.split(['–', '-']).map(str::trim).collect();
    if parts.len() != 2 {
        return None;
    }
    let (open, close) = parse_clock_range(parts[0], parts[1])?;
    Some(DayHours::Open { open, close })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn day_index(day: Weekday) -> usize {
    day.num_days_from_sunday() as usize
}
