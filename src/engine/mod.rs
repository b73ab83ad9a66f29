//! Picks one adventure for a location, vibe and moment in time.

pub mod fallback;
pub mod ladder;
pub mod predicates;

use crate::availability::{TimeWindowEvaluator, DEFAULT_COST_CEILING};
use crate::display;
use crate::geo::{Location, Region};
use crate::model::{Adventure, AdventureId, Candidate, Event, Vibe};
use crate::provider::types::EventRow;
use crate::provider::{DataProvider, ProviderError};
use crate::session::{CandidateCache, EngineContext};
use chrono::{DateTime, Utc, Weekday};
use chrono_tz::Tz;
use ladder::{pick_from_ladder, pick_soonest_within};
use predicates::{event_qualifies_today, place_qualifies_now, rank_candidates, Ranked};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_RADIUS_LADDER_MILES: [f64; 6] = [0.5, 1.0, 1.5, 2.0, 3.0, 5.0];
pub const DEFAULT_ACTIVITY_RADIUS_MILES: f64 = 7.0;
pub const DEFAULT_PLACES_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Location ({lat}, {lng}) is outside the service region")]
    OutsideRegion { lat: f64, lng: f64 },
    #[error("Candidate retrieval failed: {0}")]
    CandidateRetrieval(#[from] ProviderError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// Ascending radii, in miles, tried in order for places.
    pub radius_ladder_miles: Vec<f64>,
    pub activity_radius_miles: f64,
    pub cost_ceiling: f64,
    pub places_cache_ttl: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            radius_ladder_miles: DEFAULT_RADIUS_LADDER_MILES.to_vec(),
            activity_radius_miles: DEFAULT_ACTIVITY_RADIUS_MILES,
            cost_ceiling: DEFAULT_COST_CEILING,
            places_cache_ttl: DEFAULT_PLACES_CACHE_TTL,
        }
    }
}

pub struct SelectionEngine {
    provider: Arc<dyn DataProvider>,
    region: Region,
    settings: SearchSettings,
    tz: Tz,
}

impl SelectionEngine {
    pub fn new(
        provider: Arc<dyn DataProvider>,
        region: Region,
        settings: SearchSettings,
        tz: Tz,
    ) -> Self {
        Self {
            provider,
            region,
            settings,
            tz,
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn new_context(&self) -> EngineContext {
        EngineContext::new(self.settings.places_cache_ttl)
    }

    pub fn ensure_in_region(&self, location: Location) -> Result<(), EngineError> {
        if self.region.contains(location.lat, location.lng) {
            Ok(())
        } else {
            Err(EngineError::OutsideRegion {
                lat: location.lat,
                lng: location.lng,
            })
        }
    }

    /// Choose something to do right now, falling back to a later window late
    /// at night and early in the morning. `Ok(None)` means nothing qualified.
    pub async fn select_adventure(
        &self,
        cache: &mut CandidateCache,
        location: Location,
        vibe: Vibe,
        excluded: &HashSet<AdventureId>,
        in_fallback_mode: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<Adventure>, EngineError> {
        self.ensure_in_region(location)?;
        let evaluator = TimeWindowEvaluator::new(self.tz, now);

        if vibe == Vibe::Activity {
            return self
                .select_activity(cache, location, excluded, in_fallback_mode, &evaluator)
                .await;
        }

        let places = cache.get_places(self.provider.as_ref(), now).await?;
        let mut candidates: Vec<Candidate> = places
            .iter()
            .filter(|place| place_qualifies_now(place, vibe, &evaluator))
            .cloned()
            .map(Candidate::Place)
            .collect();

        if vibe == Vibe::Anything {
            let events = self.todays_events(&evaluator).await?;
            candidates.extend(events.into_iter().map(Candidate::Event));
        }

        let pool = rank_candidates(candidates, &self.region, location, excluded);
        tracing::debug!("{} {:?} candidates in region", pool.len(), vibe);

        let picked = {
            let mut rng = rand::thread_rng();
            pick_from_ladder(pool, &self.settings.radius_ladder_miles, &mut rng)
        };
        if let Some(ranked) = picked {
            return Ok(Some(self.finish(ranked, None, evaluator.today(), &evaluator)));
        }

        if evaluator.is_late_night() || evaluator.is_early_morning() {
            tracing::debug!("Nothing open nearby, looking at the next window");
            return self
                .select_adventure_at_target_window(
                    cache,
                    location,
                    vibe,
                    evaluator.is_late_night(),
                    excluded,
                    now,
                )
                .await;
        }

        Ok(None)
    }

    async fn select_activity(
        &self,
        cache: &mut CandidateCache,
        location: Location,
        excluded: &HashSet<AdventureId>,
        in_fallback_mode: bool,
        evaluator: &TimeWindowEvaluator,
    ) -> Result<Option<Adventure>, EngineError> {
        if !in_fallback_mode {
            let events = self.todays_events(evaluator).await?;
            let candidates = events.into_iter().map(Candidate::Event).collect();
            let pool = rank_candidates(candidates, &self.region, location, excluded);

            if let Some(ranked) = pick_soonest_within(pool, self.settings.activity_radius_miles) {
                return Ok(Some(self.finish(ranked, None, evaluator.today(), evaluator)));
            }
        }

        self.select_adventure_at_target_window(
            cache,
            location,
            Vibe::Activity,
            false,
            excluded,
            evaluator.now_utc(),
        )
        .await
    }

    async fn todays_events(
        &self,
        evaluator: &TimeWindowEvaluator,
    ) -> Result<Vec<Event>, EngineError> {
        let Some((start_after, start_before)) = evaluator.today_window() else {
            tracing::debug!("Too late in the day for events, skipping fetch");
            return Ok(Vec::new());
        };

        let rows = self.provider.fetch_events(start_after, start_before).await?;
        Ok(self
            .ingest_events(rows)
            .into_iter()
            .filter(|event| event_qualifies_today(event, evaluator, self.settings.cost_ceiling))
            .collect())
    }

    fn ingest_events(&self, rows: Vec<EventRow>) -> Vec<Event> {
        let total = rows.len();
        let events: Vec<Event> = rows
            .into_iter()
            .filter_map(|row| Event::from_row(row, self.tz))
            .collect();
        if events.len() < total {
            tracing::debug!(
                "Dropped {} event rows missing coordinates or times",
                total - events.len()
            );
        }
        events
    }

    fn finish(
        &self,
        ranked: Ranked,
        future_message: Option<&str>,
        hours_day: Weekday,
        evaluator: &TimeWindowEvaluator,
    ) -> Adventure {
        Adventure {
            display: display::hints_for(&ranked.candidate, evaluator, hours_day),
            candidate: ranked.candidate,
            distance: ranked.distance,
            future_message: future_message.map(str::to_string),
        }
    }
}
