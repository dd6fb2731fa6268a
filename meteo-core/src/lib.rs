//! Core library for the `meteo` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind provider traits
//! - Daily forecast aggregation
//! - Place suggestions with debounced, last-query-wins resolution
//! - Advisory call-volume counting
//!
//! It is used by `meteo-cli`, but can also be reused by other binaries or services.

pub mod clock;
pub mod config;
pub mod counter;
pub mod error;
pub mod forecast;
pub mod model;
pub mod orchestrator;
pub mod places;
pub mod provider;
pub mod suggest;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, CounterConfig, SuggestConfig};
pub use counter::{CallCounterState, CallVolumeCounter, CounterStore, MemoryStore, UpstashStore};
pub use error::FetchError;
pub use model::{
    DailySummary, ForecastFeed, ForecastSample, Language, LocationQuery, PlaceSuggestion,
    WeatherReport, WeatherSnapshot,
};
pub use orchestrator::{RateLimitNotice, WeatherQueryOrchestrator, WeatherView};
pub use places::StaticPlaceIndex;
pub use provider::{GeocodingProvider, WeatherProvider, openweather::OpenWeatherProvider};
pub use suggest::{BlurTarget, Key, ResolverEvent, SuggestionListState, SuggestionResolver};
