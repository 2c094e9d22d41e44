use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::error::FetchError;
use crate::model::UnitSystem;

/// HTTP client for the OpenWeather current-weather endpoint.
///
/// Stateless across cities, so one instance serves a whole run. Transient
/// failures (timeout, DNS, connection errors, non-2xx statuses) are
/// retried up to the attempt limit with a fixed pause between attempts;
/// scheduled batch runs want predictable timing, not exponential growth.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    base_url: String,
    api_key: String,
    units: UnitSystem,
    max_attempts: u32,
    backoff: Duration,
}

/// Failure of a single attempt; always retryable.
#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

impl OpenWeatherClient {
    pub fn new(
        base_url: String,
        api_key: String,
        units: UnitSystem,
        timeout: Duration,
        max_attempts: u32,
        backoff: Duration,
    ) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            http,
            base_url,
            api_key,
            units,
            max_attempts: max_attempts.max(1),
            backoff,
        })
    }

    /// Fetch current weather for a city and ISO country code.
    ///
    /// Returns the parsed response body unmodified on the first successful
    /// attempt. Every failed attempt is logged at warning level with its
    /// index; the fixed backoff runs after each failure except the last.
    /// When all attempts are spent the city fails terminally; the caller
    /// records it and moves on to the next one.
    pub async fn fetch_weather(&self, city: &str, country: &str) -> Result<Value, FetchError> {
        // OpenWeather expects "City,CountryCode".
        let query = format!("{city},{country}");
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match self.try_fetch(&query).await {
                Ok(body) => return Ok(body),
                Err(err) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        %query,
                        error = %err,
                        "weather fetch attempt failed"
                    );
                    last_error = err.to_string();

                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
            }
        }

        Err(FetchError::Exhausted {
            query,
            attempts: self.max_attempts,
            last_error,
        })
    }

    async fn try_fetch(&self, query: &str) -> Result<Value, AttemptError> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AttemptError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        Ok(res.json::<Value>().await?)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}
