use super::types::{EventRow, PlaceRow};
use super::{DataProvider, ProviderError};
use crate::config::Config;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

/// Reads places and events from a Supabase (PostgREST) project.
pub struct SupabaseProvider {
    client: Client,
    base_url: String,
    anon_key: String,
    places_table: String,
    events_table: String,
}

impl SupabaseProvider {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent("AdventureServer/1.0")
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            places_table: config.places_table.clone(),
            events_table: config.events_table.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, urlencoding::encode(table))
    }

    async fn make_request_with_retry(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<Value, ProviderError> {
        let mut retry_count = 0;
        let max_retries = 3;
        let mut delay = Duration::from_millis(500);

        loop {
            let response = self
                .client
                .get(url)
                .header("apikey", &self.anon_key)
                .bearer_auth(&self.anon_key)
                .query(params)
                .send()
                .await?;

            match response.status() {
                reqwest::StatusCode::OK => {
                    let json: Value = response.json().await?;
                    return Ok(json);
                }
                reqwest::StatusCode::TOO_MANY_REQUESTS => {
                    if retry_count >= max_retries {
                        return Err(ProviderError::RateLimited(delay.as_secs()));
                    }

                    tracing::warn!("Rate limited by Supabase, retrying in {}ms", delay.as_millis());

                    sleep(delay).await;
                    delay = delay.mul_f32(2.0 + fastrand::f32() * 0.5);
                    retry_count += 1;
                }
                status if status.is_server_error() => {
                    let error_text = response.text().await.unwrap_or_default();
                    return Err(ProviderError::Unavailable(format!(
                        "HTTP {}: {}",
                        status, error_text
                    )));
                }
                status => {
                    let error_text = response.text().await.unwrap_or_default();
                    return Err(ProviderError::ApiError(format!("HTTP {}: {}", status, error_text)));
                }
            }
        }
    }
}

#[async_trait]
impl DataProvider for SupabaseProvider {
    async fn fetch_all_places(&self) -> Result<Vec<PlaceRow>, ProviderError> {
        let url = self.table_url(&self.places_table);
        let response = self
            .make_request_with_retry(&url, &[("select", "*".to_string())])
            .await?;

        let rows: Vec<PlaceRow> = serde_json::from_value(response)?;
        tracing::debug!("Fetched {} rows from {}", rows.len(), self.places_table);
        Ok(rows)
    }

    async fn fetch_events(
        &self,
        start_after: DateTime<Utc>,
        start_before: DateTime<Utc>,
    ) -> Result<Vec<EventRow>, ProviderError> {
        let url = self.table_url(&self.events_table);
        let response = self
            .make_request_with_retry(&url, &event_range_params(start_after, start_before))
            .await?;

        let rows: Vec<EventRow> = serde_json::from_value(response)?;
        tracing::debug!(
            "Fetched {} events starting between {} and {}",
            rows.len(),
            start_after,
            start_before
        );
        Ok(rows)
    }
}

fn event_range_params(
    start_after: DateTime<Utc>,
    start_before: DateTime<Utc>,
) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        (
            "start_time",
            format!("gte.{}", start_after.to_rfc3339_opts(SecondsFormat::Millis, true)),
        ),
        (
            "start_time",
            format!("lte.{}", start_before.to_rfc3339_opts(SecondsFormat::Millis, true)),
        ),
        ("order", "start_time.asc".to_string()),
    ]
}
