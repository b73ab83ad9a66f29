use crate::engine::{EngineError, SelectionEngine};
use crate::geo::Location;
use crate::model::{Adventure, AdventureId, Place, Vibe};
use crate::provider::{DataProvider, ProviderError};
use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Per-session engine state shared across HTTP requests.
pub type SessionStore = Cache<Uuid, Arc<Mutex<EngineContext>>>;

pub fn init_session_store() -> SessionStore {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_idle(Duration::from_secs(2 * 60 * 60))
        .build()
}

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub places: Arc<Vec<Place>>,
    pub fetched_at: DateTime<Utc>,
}

/// Memoized place list. Expiry is checked when the list is asked for, so a
/// stale entry costs nothing until the next request.
#[derive(Debug)]
pub struct CandidateCache {
    ttl: Duration,
    entry: Option<CacheEntry>,
}

impl CandidateCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.entry
            .as_ref()
            .map(|entry| {
                let age = (now - entry.fetched_at).to_std().unwrap_or(Duration::ZERO);
                age < self.ttl
            })
            .unwrap_or(false)
    }

    pub async fn get_places(
        &mut self,
        provider: &dyn DataProvider,
        now: DateTime<Utc>,
    ) -> Result<Arc<Vec<Place>>, ProviderError> {
        if self.is_fresh(now) {
            if let Some(entry) = &self.entry {
                return Ok(entry.places.clone());
            }
        }

        let rows = provider.fetch_all_places().await?;
        let total = rows.len();
        let places: Vec<Place> = rows.into_iter().filter_map(Place::from_row).collect();
        if places.len() < total {
            tracing::debug!("Dropped {} place rows without coordinates", total - places.len());
        }

        let places = Arc::new(places);
        self.entry = Some(CacheEntry {
            places: places.clone(),
            fetched_at: now,
        });
        Ok(places)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

/// What has been shown in this session, and for which search.
#[derive(Debug, Default)]
pub struct SessionState {
    shown_ids: HashSet<AdventureId>,
    last_location: Option<Location>,
    last_vibe: Option<Vibe>,
}

impl SessionState {
    pub fn shown_ids(&self) -> &HashSet<AdventureId> {
        &self.shown_ids
    }

    pub fn record_shown(&mut self, adventure: &Adventure) {
        self.shown_ids.insert(adventure.id());
    }

    /// True when the search moved or the vibe differs from the last request.
    pub fn has_changed(&self, location: Location, vibe: Vibe) -> bool {
        let moved = self.last_location.map(|last| last != location).unwrap_or(false);
        moved || self.last_vibe != Some(vibe)
    }

    pub fn remember(&mut self, location: Location, vibe: Vibe) {
        self.last_location = Some(location);
        self.last_vibe = Some(vibe);
    }

    pub fn reset(&mut self) {
        self.shown_ids.clear();
    }
}

/// Everything one user's sequence of requests carries between calls.
#[derive(Debug)]
pub struct EngineContext {
    pub cache: CandidateCache,
    pub session: SessionState,
    last_was_future: bool,
}

impl EngineContext {
    pub fn new(cache_ttl: Duration) -> Self {
        Self {
            cache: CandidateCache::new(cache_ttl),
            session: SessionState::default(),
            last_was_future: false,
        }
    }

    /// Clears shown ids and the place cache when the location or vibe changed.
    pub fn maybe_reset(&mut self, location: Location, vibe: Vibe) -> bool {
        let changed = self.session.has_changed(location, vibe);
        if changed {
            tracing::debug!(
                "Search changed to {:?} at ({}, {}), resetting session",
                vibe,
                location.lat,
                location.lng
            );
            self.reset();
        }
        self.session.remember(location, vibe);
        changed
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.cache.invalidate();
        self.last_was_future = false;
    }

    /// One "show me something" press.
    pub async fn request(
        &mut self,
        engine: &SelectionEngine,
        location: Location,
        vibe: Vibe,
        now: DateTime<Utc>,
    ) -> Result<Option<Adventure>, EngineError> {
        engine.ensure_in_region(location)?;
        self.maybe_reset(location, vibe);

        // Once an activity search has fallen through to tomorrow, keep going there.
        let in_fallback_mode = self.last_was_future && vibe == Vibe::Activity;

        let picked = engine
            .select_adventure(
                &mut self.cache,
                location,
                vibe,
                self.session.shown_ids(),
                in_fallback_mode,
                now,
            )
            .await?;

        match picked {
            Some(adventure) => {
                self.session.record_shown(&adventure);
                self.last_was_future = adventure.is_future();
                Ok(Some(adventure))
            }
            None => {
                tracing::debug!("Nothing left to show, starting over");
                self.reset();
                Ok(None)
            }
        }
    }
}
