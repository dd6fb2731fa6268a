use crate::{
    Config,
    error::FetchError,
    model::{ForecastFeed, Language, LocationQuery, PlaceSuggestion, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of current conditions and the 3-hourly forecast.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(
        &self,
        location: &LocationQuery,
        language: Language,
    ) -> Result<WeatherSnapshot, FetchError>;

    async fn forecast(
        &self,
        location: &LocationQuery,
        language: Language,
    ) -> Result<ForecastFeed, FetchError>;
}

/// Free-text place lookup used for suggestions.
#[async_trait]
pub trait GeocodingProvider: Send + Sync + Debug {
    async fn geocode(
        &self,
        query: &str,
        limit: usize,
        language: Language,
    ) -> Result<Vec<PlaceSuggestion>, FetchError>;
}

/// Construct the OpenWeather client from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherProvider> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
                 Hint: run `meteo configure` or set the API_KEY environment variable."
        )
    })?;

    OpenWeatherProvider::new(api_key.to_owned(), &config.base_url, config.timeout())
}
