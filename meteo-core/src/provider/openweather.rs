use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    error::FetchError,
    model::{
        ForecastFeed, ForecastSample, Language, LocationQuery, PlaceSuggestion, WeatherSnapshot,
    },
};

use super::{GeocodingProvider, WeatherProvider};

const CURRENT_PATH: &str = "/data/2.5/weather";
const FORECAST_PATH: &str = "/data/2.5/forecast";
const GEOCODE_PATH: &str = "/geo/1.0/direct";

/// OpenWeather client for current weather, the 5-day forecast and direct
/// geocoding.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        what: &str,
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, ?params, "OpenWeather {what} request");

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("OpenWeather {what} request failed: {e}")))?;

        let status = res.status();
        let retry_after = res
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let body = res.text().await.map_err(|e| {
            FetchError::Network(format!("Failed to read OpenWeather {what} response body: {e}"))
        })?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            let seconds_left = serde_json::from_str::<RateLimitBody>(&body)
                .ok()
                .and_then(|b| b.seconds_left)
                .or(retry_after);
            tracing::debug!(?seconds_left, "OpenWeather {what} request was rate limited");
            return Err(FetchError::RateLimited { seconds_left });
        }

        if !status.is_success() {
            return Err(FetchError::Provider {
                status: status.as_u16(),
                message: truncate_body(&body),
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| FetchError::Decode(format!("OpenWeather {what} JSON: {e}")))
    }

    fn location_params(location: &LocationQuery, language: Language) -> Vec<(&'static str, String)> {
        let mut params = match location {
            LocationQuery::Place(name) => vec![("q", name.trim().to_string())],
            LocationQuery::Coordinates { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
        };
        params.push(("units", "metric".to_string()));
        params.push(("lang", language.as_str().to_string()));
        params
    }
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    #[serde(rename = "secondsLeft")]
    seconds_left: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    #[serde(default)]
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    rain: Option<OwRain>,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    /// Shift in seconds from UTC.
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: Option<OwCity>,
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwGeoPlace {
    name: String,
    country: String,
    lat: f64,
    lon: f64,
    state: Option<String>,
}

impl OwCurrentResponse {
    fn into_snapshot(self) -> WeatherSnapshot {
        let observation_time = unix_to_utc(self.dt).unwrap_or_else(Utc::now);
        let weather = self.weather.into_iter().next();

        WeatherSnapshot {
            location_name: self.name,
            country_code: self.sys.country.unwrap_or_default(),
            temperature_c: self.main.temp,
            humidity_pct: self.main.humidity,
            wind_speed_ms: self.wind.speed,
            condition: weather.as_ref().map(|w| w.main.clone()).unwrap_or_default(),
            description: weather
                .as_ref()
                .map(|w| w.description.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            icon_id: weather.map(|w| w.icon).unwrap_or_default(),
            rain_last_hour_mm: self.rain.and_then(|r| r.one_hour),
            observation_time,
        }
    }
}

impl From<OwForecastEntry> for ForecastSample {
    fn from(entry: OwForecastEntry) -> Self {
        let weather = entry.weather.into_iter().next();

        ForecastSample {
            timestamp_utc: entry.dt,
            temp_min: entry.main.temp_min,
            temp_max: entry.main.temp_max,
            humidity_pct: entry.main.humidity,
            wind_speed_ms: entry.wind.speed,
            condition_code: weather.as_ref().map(|w| w.main.clone()).unwrap_or_default(),
            condition_description: weather
                .as_ref()
                .map(|w| w.description.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            icon_id: weather.map(|w| w.icon).unwrap_or_default(),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(
        &self,
        location: &LocationQuery,
        language: Language,
    ) -> Result<WeatherSnapshot, FetchError> {
        let params = Self::location_params(location, language);
        let parsed: OwCurrentResponse = self.get_json(CURRENT_PATH, "current", &params).await?;
        Ok(parsed.into_snapshot())
    }

    async fn forecast(
        &self,
        location: &LocationQuery,
        language: Language,
    ) -> Result<ForecastFeed, FetchError> {
        let params = Self::location_params(location, language);
        let parsed: OwForecastResponse = self.get_json(FORECAST_PATH, "forecast", &params).await?;

        let utc_offset = parsed
            .city
            .and_then(|c| c.timezone)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());

        let mut samples: Vec<ForecastSample> = parsed.list.into_iter().map(Into::into).collect();
        samples.sort_by_key(|s| s.timestamp_utc);

        Ok(ForecastFeed { samples, utc_offset })
    }
}

#[async_trait]
impl GeocodingProvider for OpenWeatherProvider {
    async fn geocode(
        &self,
        query: &str,
        limit: usize,
        language: Language,
    ) -> Result<Vec<PlaceSuggestion>, FetchError> {
        let params = [("q", query.to_string()), ("limit", limit.to_string())];
        let places: Vec<OwGeoPlace> = self.get_json(GEOCODE_PATH, "geocoding", &params).await?;

        Ok(places
            .into_iter()
            .take(limit)
            .map(|p| PlaceSuggestion::new(p.name, p.country, p.state, p.lat, p.lon, language))
            .collect())
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
