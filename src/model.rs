use crate::availability::{parse_cost, parse_instant, Schedule};
use crate::display::DisplayHints;
use crate::geo::Location;
use crate::provider::types::{EventRow, PlaceRow};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Tags accepted when the user has not picked a vibe.
pub const ALLOWED_PLACE_TAGS: [&str; 6] =
    ["cafe", "bakery", "restaurant", "nature", "bar", "book_store"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vibe {
    #[default]
    #[serde(rename = "none", alias = "")]
    Anything,
    Caffeine,
    Food,
    BigFood,
    Activity,
}

impl Vibe {
    /// Place tags that satisfy this vibe. Empty for `Activity`, which only
    /// ever selects events.
    pub fn place_tags(&self) -> &'static [&'static str] {
        match self {
            Vibe::Anything => &ALLOWED_PLACE_TAGS,
            Vibe::Caffeine => &["cafe"],
            Vibe::Food => &["bakery"],
            Vibe::BigFood => &["restaurant"],
            Vibe::Activity => &[],
        }
    }
}

/// Anything with a position on the map.
pub trait Located {
    fn lat(&self) -> f64;
    fn lng(&self) -> f64;

    fn distance_from(&self, location: &Location) -> f64 {
        location.distance_to(self.lat(), self.lng())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: Option<String>,
    pub name: String,
    pub address: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub description: Option<String>,
    pub our_description: Option<String>,
    pub tags: Vec<String>,
    pub hours: Schedule,
    pub emoji: Option<String>,
}

impl Place {
    /// Rows without usable coordinates are dropped.
    pub fn from_row(row: PlaceRow) -> Option<Self> {
        let (lat, lng) = coordinates(row.latitude, row.longitude)?;
        let tags = match row.tag.as_ref().filter(|tag| is_present(tag)) {
            Some(tag) => tag_list(tag),
            None => row.tags.as_ref().map(tag_list).unwrap_or_default(),
        };

        Some(Self {
            id: row.id.as_ref().and_then(id_text),
            name: row.name.unwrap_or_default(),
            address: non_empty(row.address),
            lat,
            lng,
            description: non_empty(row.description),
            our_description: non_empty(row.our_description),
            tags,
            hours: row.hours.as_ref().map(Schedule::from_value).unwrap_or_default(),
            emoji: non_empty(row.emoji),
        })
    }

    pub fn has_any_tag(&self, wanted: &[&str]) -> bool {
        self.tags.iter().any(|tag| wanted.contains(&tag.as_str()))
    }

    pub fn has_curated_description(&self) -> bool {
        self.our_description
            .as_deref()
            .map(|text| !text.trim().is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// `None` when the listing is free or the price is unreadable.
    pub cost: Option<f64>,
    pub cost_label: Option<String>,
    pub urls: Vec<String>,
    pub emoji: Option<String>,
}

impl Event {
    /// Events are only usable with coordinates and both ends of their time range.
    pub fn from_row(row: EventRow, tz: Tz) -> Option<Self> {
        let (lat, lng) = coordinates(row.latitude, row.longitude)?;
        let start_time = parse_instant(row.start_time.as_deref()?, tz)?;
        let end_time = parse_instant(row.end_time.as_deref()?, tz)?;

        let cost = parse_cost(row.cost.as_ref());
        let cost_label = row.cost.as_ref().and_then(|value| cost_label(value, cost));

        Some(Self {
            id: row.id.as_ref().and_then(id_text),
            title: row.title.or(row.name).unwrap_or_default(),
            description: non_empty(row.description),
            address: non_empty(row.address).or_else(|| non_empty(row.location)),
            lat,
            lng,
            start_time,
            end_time,
            cost,
            cost_label,
            urls: row.urls.as_ref().map(string_list).unwrap_or_default(),
            emoji: non_empty(row.emoji),
        })
    }
}

/// A recommendable record, tagged by where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Candidate {
    Place(Place),
    Event(Event),
}

impl Candidate {
    pub fn kind(&self) -> &'static str {
        match self {
            Candidate::Place(_) => "place",
            Candidate::Event(_) => "event",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Candidate::Place(place) => &place.name,
            Candidate::Event(event) => &event.title,
        }
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Candidate::Place(_) => None,
            Candidate::Event(event) => Some(event.start_time),
        }
    }

    pub fn adventure_id(&self) -> AdventureId {
        let id = match self {
            Candidate::Place(place) => place.id.as_deref(),
            Candidate::Event(event) => event.id.as_deref(),
        };
        match id {
            Some(id) => AdventureId(format!("{}_{}", self.kind(), id)),
            None => AdventureId(format!(
                "{}_{}_{}_{}",
                self.kind(),
                self.name(),
                self.lat(),
                self.lng()
            )),
        }
    }
}

impl Located for Candidate {
    fn lat(&self) -> f64 {
        match self {
            Candidate::Place(place) => place.lat,
            Candidate::Event(event) => event.lat,
        }
    }

    fn lng(&self) -> f64 {
        match self {
            Candidate::Place(place) => place.lng,
            Candidate::Event(event) => event.lng,
        }
    }
}

/// Key used to avoid repeating a recommendation within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdventureId(pub String);

impl fmt::Display for AdventureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the engine hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct Adventure {
    #[serde(flatten)]
    pub candidate: Candidate,
    /// Miles from the requested location.
    pub distance: f64,
    /// Set when the pick is for a later window rather than right now.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub future_message: Option<String>,
    pub display: DisplayHints,
}

impl Adventure {
    pub fn id(&self) -> AdventureId {
        self.candidate.adventure_id()
    }

    pub fn is_future(&self) -> bool {
        self.future_message.is_some()
    }
}

impl Located for Adventure {
    fn lat(&self) -> f64 {
        self.candidate.lat()
    }

    fn lng(&self) -> f64 {
        self.candidate.lng()
    }
}

fn coordinates(lat: Option<f64>, lng: Option<f64>) -> Option<(f64, f64)> {
    match (lat, lng) {
        (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some((lat, lng)),
        _ => None,
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn tag_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(tag) => vec![tag.trim().to_lowercase()],
        Value::Array(tags) => tags
            .iter()
            .filter_map(Value::as_str)
            .map(|tag| tag.trim().to_lowercase())
            .collect(),
        _ => Vec::new(),
    }
}

/// Prices of zero or less are not shown. Amounts always carry a "$".
fn cost_label(value: &Value, amount: Option<f64>) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    match amount {
        Some(amount) if amount <= 0.0 => None,
        Some(_) if !text.starts_with('$') => Some(format!("${}", text)),
        _ => non_empty(Some(text)),
    }
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(text) if text.trim_start().starts_with('[') => {
            serde_json::from_str::<Vec<String>>(text)
                .map(|items| string_list(&Value::from(items)))
                .unwrap_or_default()
        }
        Value::String(text) if !text.trim().is_empty() => vec![text.trim().to_string()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|text| !text.trim().is_empty())
}
