use super::types::{EventRow, PlaceRow};
use super::{DataProvider, ProviderError};
use crate::availability::parse_instant;
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory provider for local runs and tests.
pub struct MockProvider {
    places: Vec<PlaceRow>,
    events: Vec<EventRow>,
    tz: Tz,
    place_fetches: AtomicUsize,
    event_fetches: AtomicUsize,
    failing: AtomicBool,
}

impl MockProvider {
    pub fn new(tz: Tz) -> Self {
        Self {
            places: Vec::new(),
            events: Vec::new(),
            tz,
            place_fetches: AtomicUsize::new(0),
            event_fetches: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn with_places(mut self, places: Vec<PlaceRow>) -> Self {
        self.places = places;
        self
    }

    pub fn with_events(mut self, events: Vec<EventRow>) -> Self {
        self.events = events;
        self
    }

    /// Make every subsequent fetch fail until switched back.
    #[cfg(test)]
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub fn place_fetch_count(&self) -> usize {
        self.place_fetches.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub fn event_fetch_count(&self) -> usize {
        self.event_fetches.load(Ordering::SeqCst)
    }

    /// A handful of San Francisco spots with hours covering most of the day,
    /// plus events later today and tomorrow morning relative to `now`.
    pub fn sample(tz: Tz, now: DateTime<Utc>) -> Self {
        let all_day = "6:00 AM - 11:59 PM";
        let places = vec![
            sample_place(
                1,
                "Blue Bottle Coffee",
                "66 Mint St, San Francisco, CA 94103",
                37.7825,
                -122.4073,
                "cafe",
                all_day,
            ),
            sample_place(
                2,
                "Tartine Bakery",
                "600 Guerrero St, San Francisco, CA 94110",
                37.7614,
                -122.4241,
                "bakery",
                all_day,
            ),
            sample_place(
                3,
                "Zuni Cafe",
                "1658 Market St, San Francisco, CA 94102",
                37.7736,
                -122.4216,
                "restaurant",
                all_day,
            ),
            sample_place(
                4,
                "Lands End Trail",
                "680 Point Lobos Ave, San Francisco, CA 94121",
                37.7808,
                -122.5115,
                "nature",
                all_day,
            ),
            sample_place(
                5,
                "Green Apple Books",
                "506 Clement St, San Francisco, CA 94118",
                37.7830,
                -122.4645,
                "book_store",
                "10:00 AM - 10:30 PM",
            ),
            sample_place(
                6,
                "Trick Dog",
                "3010 20th St, San Francisco, CA 94110",
                37.7590,
                -122.4114,
                "bar",
                "3:00 PM - 11:59 PM",
            ),
        ];

        let local_now = now.with_timezone(&tz);
        let later_today = (now + Duration::hours(2))
            .with_minute(0)
            .and_then(|dt| dt.with_second(0))
            .unwrap_or(now);
        let tomorrow_morning = local_now
            .date_naive()
            .succ_opt()
            .and_then(|date| date.and_hms_opt(11, 0, 0))
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
            .map(|dt| dt.with_timezone(&Utc));

        let mut events = vec![sample_event(
            101,
            "Dolores Park Drum Circle",
            "Dolores St & 19th St, San Francisco, CA",
            37.7596,
            -122.4269,
            later_today,
            Value::Null,
        )];
        if let Some(start) = tomorrow_morning {
            events.push(sample_event(
                102,
                "Ferry Plaza Farmers Market",
                "1 Ferry Building, San Francisco, CA 94111",
                37.7955,
                -122.3937,
                start,
                Value::String("$15".to_string()),
            ));
        }

        Self::new(tz).with_places(places).with_events(events)
    }

    fn check_failure(&self) -> Result<(), ProviderError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable(
                "mock provider set to fail".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DataProvider for MockProvider {
    async fn fetch_all_places(&self) -> Result<Vec<PlaceRow>, ProviderError> {
        self.place_fetches.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.places.clone())
    }

    async fn fetch_events(
        &self,
        start_after: DateTime<Utc>,
        start_before: DateTime<Utc>,
    ) -> Result<Vec<EventRow>, ProviderError> {
        self.event_fetches.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        Ok(self
            .events
            .iter()
            .filter(|row| {
                row.start_time
                    .as_deref()
                    .and_then(|text| parse_instant(text, self.tz))
                    .map(|start| start >= start_after && start <= start_before)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}

fn sample_place(
    id: u64,
    name: &str,
    address: &str,
    lat: f64,
    lng: f64,
    tag: &str,
    hours: &str,
) -> PlaceRow {
    PlaceRow {
        id: Some(Value::from(id)),
        name: Some(name.to_string()),
        address: Some(address.to_string()),
        latitude: Some(lat),
        longitude: Some(lng),
        our_description: Some(format!("A local favorite: {}.", name)),
        tag: Some(Value::String(tag.to_string())),
        hours: Some(Value::String(hours.to_string())),
        ..Default::default()
    }
}

fn sample_event(
    id: u64,
    title: &str,
    location: &str,
    lat: f64,
    lng: f64,
    start: DateTime<Utc>,
    cost: Value,
) -> EventRow {
    EventRow {
        id: Some(Value::from(id)),
        title: Some(title.to_string()),
        location: Some(location.to_string()),
        latitude: Some(lat),
        longitude: Some(lng),
        start_time: Some(start.to_rfc3339_opts(SecondsFormat::Secs, true)),
        end_time: Some(
            (start + Duration::hours(2)).to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        cost: Some(cost),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Los_Angeles;

    fn local(day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        Los_Angeles
            .with_ymd_and_hms(2025, 3, day, hour, minute, second)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn event_at(start: &str) -> EventRow {
        EventRow {
            start_time: Some(start.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_counts_and_failure() {
        let provider =
            MockProvider::new(Los_Angeles).with_places(vec![PlaceRow::default()]);

        assert_eq!(provider.fetch_all_places().await.unwrap().len(), 1);
        provider.set_failing(true);
        assert!(provider.fetch_all_places().await.is_err());
        assert_eq!(provider.place_fetch_count(), 2);
        assert_eq!(provider.event_fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_event_range_is_inclusive() {
        let provider = MockProvider::new(Los_Angeles).with_events(vec![
            event_at("2025-03-12T10:00:00-07:00"),
            event_at("2025-03-12T12:00:00-07:00"),
            event_at("2025-03-12T14:00:00-07:00"),
            event_at("not a time"),
        ]);
        let after = local(12, 10, 0, 0);
        let before = local(12, 12, 0, 0);

        let rows = provider.fetch_events(after, before).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_sample_data() {
        let provider = MockProvider::sample(Los_Angeles, local(12, 14, 10, 0));

        assert_eq!(provider.fetch_all_places().await.unwrap().len(), 6);
        let tomorrow = provider
            .fetch_events(local(13, 0, 0, 0), local(13, 23, 59, 59))
            .await
            .unwrap();
        assert_eq!(tomorrow.len(), 1);
        assert_eq!(tomorrow[0].title.as_deref(), Some("Ferry Plaza Farmers Market"));
    }
}
