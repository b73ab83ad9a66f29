use super::ladder::{pick_from_ladder, pick_within};
use super::predicates::{event_qualifies_next_day, place_qualifies_at_target, rank_candidates};
use super::{EngineError, SelectionEngine};
use crate::availability::TimeWindowEvaluator;
use crate::geo::Location;
use crate::model::{Adventure, AdventureId, Candidate, Event, Vibe};
use crate::session::CandidateCache;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

pub const GONE_TO_SLEEP_MESSAGE: &str =
    "the city has gone to sleep... but here's what you can do tomorrow:";
pub const NOT_AWAKE_YET_MESSAGE: &str =
    "the city hasn't woken up yet... but here's what you can do a bit later:";

pub fn fallback_message(vibe: Vibe, is_late_night: bool) -> &'static str {
    if vibe == Vibe::Activity || is_late_night {
        GONE_TO_SLEEP_MESSAGE
    } else {
        NOT_AWAKE_YET_MESSAGE
    }
}

impl SelectionEngine {
    /// Pick something for the next window instead of right now: places open
    /// at 10am on the target day, or events tomorrow for activities. Every
    /// pick carries a future message.
    pub async fn select_adventure_at_target_window(
        &self,
        cache: &mut CandidateCache,
        location: Location,
        vibe: Vibe,
        is_late_night: bool,
        excluded: &HashSet<AdventureId>,
        now: DateTime<Utc>,
    ) -> Result<Option<Adventure>, EngineError> {
        self.ensure_in_region(location)?;
        let evaluator = TimeWindowEvaluator::new(self.tz, now);
        let message = fallback_message(vibe, is_late_night);

        if vibe == Vibe::Activity {
            let events = self.next_day_events(&evaluator).await?;
            let candidates = events.into_iter().map(Candidate::Event).collect();
            let pool = rank_candidates(candidates, &self.region, location, excluded);

            let picked = {
                let mut rng = rand::thread_rng();
                pick_within(pool, self.settings.activity_radius_miles, &mut rng)
            };
            return Ok(picked
                .map(|ranked| self.finish(ranked, Some(message), evaluator.today(), &evaluator)));
        }

        let target_day = evaluator.target_day();
        let places = cache.get_places(self.provider.as_ref(), now).await?;
        let candidates = places
            .iter()
            .filter(|place| place_qualifies_at_target(place, vibe, &evaluator, target_day))
            .cloned()
            .map(Candidate::Place)
            .collect();
        let pool = rank_candidates(candidates, &self.region, location, excluded);
        tracing::debug!("{} places open at 10am on {:?}", pool.len(), target_day);

        let picked = {
            let mut rng = rand::thread_rng();
            pick_from_ladder(pool, &self.settings.radius_ladder_miles, &mut rng)
        };
        Ok(picked.map(|ranked| self.finish(ranked, Some(message), target_day, &evaluator)))
    }

    async fn next_day_events(
        &self,
        evaluator: &TimeWindowEvaluator,
    ) -> Result<Vec<Event>, EngineError> {
        let Some((start_after, start_before)) = evaluator.next_day_window() else {
            return Ok(Vec::new());
        };

        let rows = self.provider.fetch_events(start_after, start_before).await?;
        Ok(self
            .ingest_events(rows)
            .into_iter()
            .filter(|event| event_qualifies_next_day(event, evaluator, self.settings.cost_ceiling))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{at, engine, event, place, HERE};
    use crate::engine::DEFAULT_PLACES_CACHE_TTL;
    use crate::provider::mock::MockProvider;
    use chrono_tz::America::Los_Angeles;
    use serde_json::{json, Value};
    use std::sync::Arc;

    #[test]
    fn test_messages() {
        assert_eq!(fallback_message(Vibe::Activity, false), GONE_TO_SLEEP_MESSAGE);
        assert_eq!(fallback_message(Vibe::Caffeine, true), GONE_TO_SLEEP_MESSAGE);
        assert_eq!(fallback_message(Vibe::Caffeine, false), NOT_AWAKE_YET_MESSAGE);
    }

    #[tokio::test]
    async fn test_late_night_activity_gets_tomorrow_event() {
        let provider = Arc::new(MockProvider::new(Los_Angeles).with_events(vec![
            event(1, 1.0, at(13, 11, 0), json!("$15")),
            event(2, 0.5, at(13, 12, 0), json!("$40")),
            event(3, 0.5, at(14, 11, 0), Value::Null),
        ]));
        let engine = engine(provider.clone());
        let mut cache = CandidateCache::new(DEFAULT_PLACES_CACHE_TTL);

        let adventure = engine
            .select_adventure(
                &mut cache,
                HERE,
                Vibe::Activity,
                &HashSet::new(),
                false,
                at(12, 23, 30),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(adventure.id(), AdventureId("event_1".to_string()));
        assert_eq!(adventure.future_message.as_deref(), Some(GONE_TO_SLEEP_MESSAGE));
        // the today window is empty this late, so only the tomorrow query ran
        assert_eq!(provider.event_fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_late_night_places_fall_back_to_tomorrow() {
        let provider = Arc::new(MockProvider::new(Los_Angeles).with_places(vec![
            place(
                1,
                "cafe",
                0.3,
                json!(["Thursday: 8:00 AM - 2:00 PM", "Wednesday: 8:00 AM - 2:00 PM"]),
            ),
            place(
                2,
                "cafe",
                0.2,
                json!(["Thursday: Closed", "Wednesday: 8:00 AM - 11:00 PM"]),
            ),
        ]));
        let engine = engine(provider.clone());
        let mut cache = CandidateCache::new(DEFAULT_PLACES_CACHE_TTL);

        // 22:00 Wednesday: place 2 is open now, so exclude it to force the fallback
        let excluded: HashSet<AdventureId> =
            [AdventureId("place_2".to_string())].into_iter().collect();
        let adventure = engine
            .select_adventure(&mut cache, HERE, Vibe::Caffeine, &excluded, false, at(12, 22, 0))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(adventure.id(), AdventureId("place_1".to_string()));
        assert_eq!(adventure.future_message.as_deref(), Some(GONE_TO_SLEEP_MESSAGE));
        assert_eq!(adventure.display.hours.as_deref(), Some("8am - 2pm"));
        assert_eq!(provider.place_fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_early_morning_uses_later_today() {
        let provider = Arc::new(MockProvider::new(Los_Angeles).with_places(vec![
            place(1, "bakery", 0.3, json!(["Wednesday: 9:30 AM - 4:00 PM"])),
            place(2, "bakery", 0.3, json!(["Thursday: 7:00 AM - 4:00 PM"])),
        ]));
        let engine = engine(provider);
        let mut cache = CandidateCache::new(DEFAULT_PLACES_CACHE_TTL);

        let adventure = engine
            .select_adventure(&mut cache, HERE, Vibe::Food, &HashSet::new(), false, at(12, 6, 0))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(adventure.id(), AdventureId("place_1".to_string()));
        assert_eq!(adventure.future_message.as_deref(), Some(NOT_AWAKE_YET_MESSAGE));
    }

    #[tokio::test]
    async fn test_activity_fallback_mode_skips_today() {
        let provider = Arc::new(MockProvider::new(Los_Angeles).with_events(vec![
            event(1, 0.5, at(12, 18, 0), Value::Null),
            event(2, 2.0, at(13, 10, 0), Value::Null),
        ]));
        let engine = engine(provider.clone());
        let mut cache = CandidateCache::new(DEFAULT_PLACES_CACHE_TTL);

        let adventure = engine
            .select_adventure(
                &mut cache,
                HERE,
                Vibe::Activity,
                &HashSet::new(),
                true,
                at(12, 12, 0),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(adventure.id(), AdventureId("event_2".to_string()));
        assert!(adventure.is_future());
        assert_eq!(provider.event_fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_midday_activity_with_nothing_today_looks_at_tomorrow() {
        let provider = Arc::new(MockProvider::new(Los_Angeles).with_events(vec![event(
            1,
            3.0,
            at(13, 19, 0),
            json!(5),
        )]));
        let engine = engine(provider.clone());
        let mut context = engine.new_context();

        let first = context
            .request(&engine, HERE, Vibe::Activity, at(12, 12, 0))
            .await
            .unwrap()
            .unwrap();
        assert!(first.is_future());
        assert_eq!(provider.event_fetch_count(), 2);

        // already in tomorrow mode: only the next-day query runs, and the one
        // event has been shown, so the session starts over
        let second = context.request(&engine, HERE, Vibe::Activity, at(12, 12, 1)).await.unwrap();
        assert!(second.is_none());
        assert_eq!(provider.event_fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_fallback_with_nothing_returns_none() {
        let provider = Arc::new(MockProvider::new(Los_Angeles));
        let engine = engine(provider);
        let mut cache = CandidateCache::new(DEFAULT_PLACES_CACHE_TTL);

        let picked = engine
            .select_adventure(
                &mut cache,
                HERE,
                Vibe::Anything,
                &HashSet::new(),
                false,
                at(12, 22, 0),
            )
            .await
            .unwrap();
        assert!(picked.is_none());
    }
}
