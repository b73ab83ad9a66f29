use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A place row as stored upstream. Only the fields the engine reads are
/// declared; anything else in the row is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceRow {
    pub id: Option<Value>,
    pub name: Option<String>,
    pub address: Option<String>,
    #[serde(alias = "lat", deserialize_with = "loose_f64")]
    pub latitude: Option<f64>,
    #[serde(alias = "lng", deserialize_with = "loose_f64")]
    pub longitude: Option<f64>,
    pub description: Option<String>,
    pub our_description: Option<String>,
    /// Either a single tag string or a list.
    pub tag: Option<Value>,
    pub tags: Option<Value>,
    /// Array, map, JSON-encoded string or a single range.
    pub hours: Option<Value>,
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRow {
    pub id: Option<Value>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    /// Free-text venue, used as the address when `address` is empty.
    pub location: Option<String>,
    #[serde(alias = "lat", deserialize_with = "loose_f64")]
    pub latitude: Option<f64>,
    #[serde(alias = "lng", deserialize_with = "loose_f64")]
    pub longitude: Option<f64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Number, "$15" style string, or absent.
    pub cost: Option<Value>,
    /// A list of links, a JSON-encoded list, or a single link.
    #[serde(alias = "event_urls")]
    pub urls: Option<Value>,
    pub emoji: Option<String>,
}

/// Coordinates sometimes arrive as numeric strings.
fn loose_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}
