use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    error::FetchError,
    model::{
        CitySuggestion, Condition, Forecast, ForecastDay, LocationQuery, Place, WeatherSnapshot,
    },
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String, base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    FetchError::unexpected(e)
                } else {
                    FetchError::network(e)
                }
            })?;

        let status = res.status();
        let body = res.text().await.map_err(FetchError::network)?;

        if !status.is_success() {
            let message = serde_json::from_str::<WaErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message);
            tracing::debug!(
                endpoint,
                %status,
                body = %truncate_body(&body),
                "WeatherAPI request failed"
            );
            return Err(FetchError::from_provider_message(message.as_deref()));
        }

        serde_json::from_str(&body).map_err(|e| {
            FetchError::unexpected(format!(
                "Failed to parse WeatherAPI {endpoint} JSON: {e}; body: {}",
                truncate_body(&body)
            ))
        })
    }
}

#[derive(Debug, Deserialize)]
struct WaErrorDetail {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaErrorBody {
    error: Option<WaErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_c: f64,
    mintemp_c: f64,
    avgtemp_c: f64,
    condition: Condition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: Place,
    forecast: WaForecast,
}

impl From<WaForecastResponse> for Forecast {
    fn from(res: WaForecastResponse) -> Self {
        let days = res
            .forecast
            .forecastday
            .into_iter()
            .map(|d| ForecastDay {
                date: d.date,
                maxtemp_c: d.day.maxtemp_c,
                mintemp_c: d.day.mintemp_c,
                avgtemp_c: d.day.avgtemp_c,
                condition: d.day.condition,
            })
            .collect();

        Forecast { location: res.location, days }
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn current(&self, query: &LocationQuery) -> Result<WeatherSnapshot, FetchError> {
        self.get_json("current.json", &[("q", query.as_str()), ("aqi", "no")]).await
    }

    async fn forecast(&self, query: &LocationQuery, days: u8) -> Result<Forecast, FetchError> {
        let days = days.to_string();
        let res: WaForecastResponse = self
            .get_json(
                "forecast.json",
                &[("q", query.as_str()), ("days", days.as_str()), ("aqi", "no")],
            )
            .await?;

        Ok(res.into())
    }

    async fn search(&self, query: &str) -> Result<Vec<CitySuggestion>, FetchError> {
        self.get_json("search.json", &[("q", query)]).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = WeatherApiProvider::new("KEY".into(), "http://localhost:1234/v1/").unwrap();
        assert_eq!(provider.base_url, "http://localhost:1234/v1");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "ë".repeat(300);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn forecast_response_flattens_days() {
        let json = serde_json::json!({
            "location": { "name": "Peja", "region": "Peja", "country": "Kosovo",
                          "lat": 42.66, "lon": 20.29, "localtime": "2024-05-01 10:00" },
            "forecast": { "forecastday": [
                { "date": "2024-05-01",
                  "day": { "maxtemp_c": 21.0, "mintemp_c": 9.5, "avgtemp_c": 15.2,
                           "condition": { "text": "Sunny", "icon": "//x.png", "code": 1000 } } }
            ] }
        });
        let res: WaForecastResponse = serde_json::from_value(json).unwrap();
        let forecast = Forecast::from(res);

        assert_eq!(forecast.location.name, "Peja");
        assert_eq!(forecast.days.len(), 1);
        assert_eq!(forecast.days[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(forecast.days[0].condition.code, 1000);
    }
}
