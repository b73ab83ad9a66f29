use crate::availability::{is_event_under_ceiling, TimeWindowEvaluator};
use crate::geo::{Location, Region};
use crate::model::{AdventureId, Candidate, Event, Located, Place, Vibe};
use chrono::Weekday;
use std::collections::HashSet;

/// A candidate paired with its distance from the requested location.
#[derive(Debug, Clone)]
pub struct Ranked {
    pub candidate: Candidate,
    pub distance: f64,
}

pub fn matches_vibe(place: &Place, vibe: Vibe) -> bool {
    place.has_any_tag(vibe.place_tags())
}

/// Tag, curated description and open right now.
pub fn place_qualifies_now(place: &Place, vibe: Vibe, evaluator: &TimeWindowEvaluator) -> bool {
    matches_vibe(place, vibe)
        && place.has_curated_description()
        && evaluator.is_open_now(&place.hours)
}

/// Same as [`place_qualifies_now`] but open at 10am on `target_day`.
pub fn place_qualifies_at_target(
    place: &Place,
    vibe: Vibe,
    evaluator: &TimeWindowEvaluator,
    target_day: Weekday,
) -> bool {
    matches_vibe(place, vibe)
        && place.has_curated_description()
        && evaluator.is_open_at_target(&place.hours, target_day)
}

pub fn event_qualifies_today(event: &Event, evaluator: &TimeWindowEvaluator, ceiling: f64) -> bool {
    evaluator.is_event_starting_soon(event.start_time)
        && is_event_under_ceiling(event.cost, ceiling)
}

pub fn event_qualifies_next_day(
    event: &Event,
    evaluator: &TimeWindowEvaluator,
    ceiling: f64,
) -> bool {
    evaluator.is_event_on_next_calendar_day(event.start_time)
        && is_event_under_ceiling(event.cost, ceiling)
}

/// Keep candidates inside `region`, attach distances and drop anything
/// already shown.
pub fn rank_candidates(
    candidates: Vec<Candidate>,
    region: &Region,
    location: Location,
    excluded: &HashSet<AdventureId>,
) -> Vec<Ranked> {
    candidates
        .into_iter()
        .filter(|candidate| region.contains(candidate.lat(), candidate.lng()))
        .filter(|candidate| !excluded.contains(&candidate.adventure_id()))
        .map(|candidate| Ranked {
            distance: candidate.distance_from(&location),
            candidate,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::{DayHours, Schedule};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use chrono_tz::America::Los_Angeles;

    fn evaluator_at(hour: u32, minute: u32) -> TimeWindowEvaluator {
        let now = Los_Angeles.with_ymd_and_hms(2025, 3, 12, hour, minute, 0).unwrap();
        TimeWindowEvaluator::new(Los_Angeles, now.with_timezone(&Utc))
    }

    fn place(id: &str, tag: &str, lat: f64, lng: f64) -> Place {
        Place {
            id: Some(id.to_string()),
            name: id.to_string(),
            address: None,
            lat,
            lng,
            description: None,
            our_description: Some("Worth it.".to_string()),
            tags: vec![tag.to_string()],
            hours: Schedule::uniform(DayHours::Open { open: 540, close: 1020 }),
            emoji: None,
        }
    }

    fn event(start: DateTime<Utc>, cost: Option<f64>) -> Event {
        Event {
            id: Some("e".to_string()),
            title: "Show".to_string(),
            description: None,
            address: None,
            lat: 37.77,
            lng: -122.42,
            start_time: start,
            end_time: start + Duration::hours(2),
            cost,
            cost_label: None,
            urls: Vec::new(),
            emoji: None,
        }
    }

    #[test]
    fn test_vibe_tags() {
        let cafe = place("a", "cafe", 37.77, -122.42);
        assert!(matches_vibe(&cafe, Vibe::Caffeine));
        assert!(matches_vibe(&cafe, Vibe::Anything));
        assert!(!matches_vibe(&cafe, Vibe::BigFood));
        assert!(!matches_vibe(&place("b", "gym", 37.77, -122.42), Vibe::Anything));
    }

    #[test]
    fn test_place_needs_description_and_hours() {
        let evaluator = evaluator_at(12, 0);
        let mut cafe = place("a", "cafe", 37.77, -122.42);
        assert!(place_qualifies_now(&cafe, Vibe::Caffeine, &evaluator));
        assert!(!place_qualifies_now(&cafe, Vibe::Caffeine, &evaluator_at(18, 0)));

        cafe.our_description = None;
        assert!(!place_qualifies_now(&cafe, Vibe::Caffeine, &evaluator));
    }

    #[test]
    fn test_place_at_target() {
        let evaluator = evaluator_at(22, 0);
        let cafe = place("a", "cafe", 37.77, -122.42);
        assert!(place_qualifies_at_target(&cafe, Vibe::Caffeine, &evaluator, Weekday::Thu));

        let closed_thursday = Place {
            hours: cafe.hours.clone().with_day(Weekday::Thu, DayHours::Closed),
            ..cafe
        };
        assert!(!place_qualifies_at_target(
            &closed_thursday,
            Vibe::Caffeine,
            &evaluator,
            Weekday::Thu
        ));
    }

    #[test]
    fn test_event_predicates() {
        let evaluator = evaluator_at(12, 0);
        let later = evaluator.now_utc() + Duration::hours(6);
        let tomorrow = evaluator.now_utc() + Duration::hours(23);

        assert!(event_qualifies_today(&event(later, Some(15.0)), &evaluator, 20.0));
        assert!(!event_qualifies_today(&event(later, Some(35.0)), &evaluator, 20.0));
        assert!(!event_qualifies_today(&event(tomorrow, None), &evaluator, 20.0));
        assert!(event_qualifies_next_day(&event(tomorrow, None), &evaluator, 20.0));
        assert!(!event_qualifies_next_day(&event(later, None), &evaluator, 20.0));
    }

    #[test]
    fn test_rank_candidates() {
        let here = Location::new(37.7749, -122.4194);
        let candidates = vec![
            Candidate::Place(place("near", "cafe", 37.7760, -122.4194)),
            Candidate::Place(place("shown", "cafe", 37.7770, -122.4194)),
            Candidate::Place(place("oakland", "cafe", 37.8044, -122.2712)),
        ];
        let excluded: HashSet<AdventureId> =
            [AdventureId("place_shown".to_string())].into_iter().collect();

        let ranked = rank_candidates(candidates, &Region::SAN_FRANCISCO, here, &excluded);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].candidate.name(), "near");
        assert!(ranked[0].distance < 0.1);
    }
}
