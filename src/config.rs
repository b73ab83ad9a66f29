use crate::engine::SearchSettings;
use crate::geo::Region;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub places_table: String,
    pub events_table: String,
    pub app_timezone: String,
    pub bind_addr: String,
    pub use_mock_provider: bool,
    pub region: Region,
    pub radius_ladder_miles: Vec<f64>,
    pub activity_radius_miles: f64,
    pub cost_ceiling: f64,
    pub places_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = SearchSettings::default();
        let use_mock_provider = lookup("USE_MOCK_PROVIDER")
            .map(|value| matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let required = |key: &str| -> anyhow::Result<String> {
            match lookup(key) {
                Some(value) => Ok(value),
                None if use_mock_provider => Ok(String::new()),
                None => Err(anyhow::anyhow!("{} not set", key)),
            }
        };

        let number = |key: &str, default: f64| -> anyhow::Result<f64> {
            match lookup(key) {
                Some(value) => value
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| anyhow::anyhow!("{} must be a number, got {:?}", key, value)),
                None => Ok(default),
            }
        };

        let fallback_region = Region::SAN_FRANCISCO;
        let region = Region {
            north: number("REGION_NORTH", fallback_region.north)?,
            south: number("REGION_SOUTH", fallback_region.south)?,
            east: number("REGION_EAST", fallback_region.east)?,
            west: number("REGION_WEST", fallback_region.west)?,
        };
        if region.south >= region.north || region.west >= region.east {
            anyhow::bail!("Region bounds are inverted: {:?}", region);
        }

        let radius_ladder_miles = match lookup("RADIUS_LADDER_MILES") {
            Some(value) => parse_ladder(&value)?,
            None => defaults.radius_ladder_miles.clone(),
        };

        let places_cache_ttl_secs = match lookup("PLACES_CACHE_TTL_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| {
                    anyhow::anyhow!("PLACES_CACHE_TTL_SECS must be whole seconds, got {:?}", value)
                })?,
            None => defaults.places_cache_ttl.as_secs(),
        };

        Ok(Config {
            supabase_url: required("SUPABASE_URL")?,
            supabase_anon_key: required("SUPABASE_ANON_KEY")?,
            places_table: lookup("PLACES_TABLE").unwrap_or_else(|| "places_sf".to_string()),
            events_table: lookup("EVENTS_TABLE").unwrap_or_else(|| "events".to_string()),
            app_timezone: lookup("APP_TIMEZONE")
                .unwrap_or_else(|| "America/Los_Angeles".to_string()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            use_mock_provider,
            region,
            radius_ladder_miles,
            activity_radius_miles: number("ACTIVITY_RADIUS_MILES", defaults.activity_radius_miles)?,
            cost_ceiling: number("EVENT_COST_CEILING", defaults.cost_ceiling)?,
            places_cache_ttl_secs,
        })
    }

    pub fn timezone(&self) -> anyhow::Result<chrono_tz::Tz> {
        self.app_timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|_| anyhow::anyhow!("Invalid timezone: {}", self.app_timezone))
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            radius_ladder_miles: self.radius_ladder_miles.clone(),
            activity_radius_miles: self.activity_radius_miles,
            cost_ceiling: self.cost_ceiling,
            places_cache_ttl: Duration::from_secs(self.places_cache_ttl_secs),
        }
    }
}

/// "0.5, 1, 2" into a strictly ascending list of positive radii.
fn parse_ladder(text: &str) -> anyhow::Result<Vec<f64>> {
    let radii = text
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<f64>()
                .map_err(|_| anyhow::anyhow!("Invalid radius in RADIUS_LADDER_MILES: {:?}", part))
        })
        .collect::<anyhow::Result<Vec<f64>>>()?;

    if radii.is_empty() {
        anyhow::bail!("RADIUS_LADDER_MILES is empty");
    }
    if radii.iter().any(|radius| !radius.is_finite() || *radius <= 0.0) {
        anyhow::bail!("RADIUS_LADDER_MILES must only contain positive radii");
    }
    if radii.windows(2).any(|pair| pair[0] >= pair[1]) {
        anyhow::bail!("RADIUS_LADDER_MILES must be ascending");
    }
    Ok(radii)
}
