use crate::availability::{format_minutes, DayHours, TimeWindowEvaluator};
use crate::model::{Candidate, Event, Place};
use chrono::{DateTime, Timelike, Utc, Weekday};
use serde::Serialize;

/// Pre-formatted strings for rendering an adventure card.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayHints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_address: Option<String>,
    pub happening_now: bool,
}

/// `day` is the weekday whose hours are shown for places: today for a
/// regular pick, the target day for a fallback pick.
pub fn hints_for(
    candidate: &Candidate,
    evaluator: &TimeWindowEvaluator,
    day: Weekday,
) -> DisplayHints {
    match candidate {
        Candidate::Place(place) => place_hints(place, day),
        Candidate::Event(event) => event_hints(event, evaluator),
    }
}

fn place_hints(place: &Place, day: Weekday) -> DisplayHints {
    DisplayHints {
        hours: format_day_hours(place.hours.hours_for(day)),
        short_address: place.address.as_deref().map(short_address),
        ..Default::default()
    }
}

fn event_hints(event: &Event, evaluator: &TimeWindowEvaluator) -> DisplayHints {
    DisplayHints {
        time_range: Some(format!(
            "{} - {}",
            format_local_time(event.start_time, evaluator),
            format_local_time(event.end_time, evaluator)
        )),
        short_address: event.address.as_deref().map(short_address),
        happening_now: evaluator
            .is_event_happening_now(Some(event.start_time), Some(event.end_time)),
        ..Default::default()
    }
}

pub fn format_day_hours(hours: Option<DayHours>) -> Option<String> {
    match hours? {
        DayHours::Open { open, close } => Some(format!(
            "{} - {}",
            format_minutes(open),
            format_minutes(close)
        )),
        DayHours::Closed => Some("Closed".to_string()),
    }
}

fn format_local_time(instant: DateTime<Utc>, evaluator: &TimeWindowEvaluator) -> String {
    let local = evaluator.local_time(instant);
    format_minutes(local.hour() * 60 + local.minute())
}

/// Street and city only: "600 Guerrero St, San Francisco".
pub fn short_address(address: &str) -> String {
    address
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .take(2)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::Schedule;
    use chrono::TimeZone;
    use chrono_tz::America::Los_Angeles;

    fn evaluator_at(hour: u32, minute: u32) -> TimeWindowEvaluator {
        let now = Los_Angeles.with_ymd_and_hms(2025, 3, 12, hour, minute, 0).unwrap();
        TimeWindowEvaluator::new(Los_Angeles, now.with_timezone(&Utc))
    }

    fn place() -> Place {
        Place {
            id: Some("1".to_string()),
            name: "Tartine".to_string(),
            address: Some("600 Guerrero St, San Francisco, CA 94110".to_string()),
            lat: 37.7614,
            lng: -122.4241,
            description: None,
            our_description: Some("Morning buns.".to_string()),
            tags: vec!["bakery".to_string()],
            hours: Schedule::uniform(DayHours::Open { open: 480, close: 1140 })
                .with_day(Weekday::Thu, DayHours::Closed),
            emoji: None,
        }
    }

    #[test]
    fn test_place_hints() {
        let evaluator = evaluator_at(12, 0);
        let candidate = Candidate::Place(place());

        let today = hints_for(&candidate, &evaluator, Weekday::Wed);
        assert_eq!(today.hours.as_deref(), Some("8am - 7pm"));
        assert_eq!(today.short_address.as_deref(), Some("600 Guerrero St, San Francisco"));
        assert!(today.time_range.is_none());

        let thursday = hints_for(&candidate, &evaluator, Weekday::Thu);
        assert_eq!(thursday.hours.as_deref(), Some("Closed"));
    }

    #[test]
    fn test_event_hints() {
        let start = Los_Angeles
            .with_ymd_and_hms(2025, 3, 12, 17, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let end = start + chrono::Duration::minutes(150);
        let event = Candidate::Event(Event {
            id: None,
            title: "Sunset cinema".to_string(),
            description: None,
            address: Some("Dolores Park".to_string()),
            lat: 37.7596,
            lng: -122.4269,
            start_time: start,
            end_time: end,
            cost: None,
            cost_label: None,
            urls: Vec::new(),
            emoji: None,
        });

        let before = hints_for(&event, &evaluator_at(12, 0), Weekday::Wed);
        assert_eq!(before.time_range.as_deref(), Some("5pm - 7:30pm"));
        assert!(!before.happening_now);
        assert!(before.hours.is_none());

        let during = hints_for(&event, &evaluator_at(18, 0), Weekday::Wed);
        assert!(during.happening_now);
    }

    #[test]
    fn test_short_address() {
        assert_eq!(
            short_address("1 Ferry Building, San Francisco, CA 94111"),
            "1 Ferry Building, San Francisco"
        );
        assert_eq!(short_address("Golden Gate Park"), "Golden Gate Park");
        assert_eq!(format_day_hours(None), None);
    }
}
