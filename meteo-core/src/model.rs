use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

use crate::{error::FetchError, places::country_name};

/// Display language for provider text and country names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
        }
    }

    pub const fn all() -> &'static [Language] {
        &[Language::En, Language::Es]
    }

    pub fn toggled(self) -> Self {
        match self {
            Language::En => Language::Es,
            Language::Es => Language::En,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Language {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            _ => Err(anyhow::anyhow!("Unknown language '{value}'. Supported languages: en, es.")),
        }
    }
}

/// What the user asked weather for: a typed place or a coordinate pair.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    Place(String),
    Coordinates { lat: f64, lon: f64 },
}

impl LocationQuery {
    /// Build a query from loose request parameters. A city wins when present,
    /// otherwise both coordinates are required.
    pub fn from_params(
        city: Option<&str>,
        lat: Option<f64>,
        lon: Option<f64>,
    ) -> Result<Self, FetchError> {
        let query = match (city.map(str::trim).filter(|c| !c.is_empty()), lat, lon) {
            (Some(city), _, _) => LocationQuery::Place(city.to_string()),
            (None, Some(lat), Some(lon)) => LocationQuery::Coordinates { lat, lon },
            _ => {
                return Err(FetchError::Validation(
                    "a place name or both latitude and longitude are required".to_string(),
                ));
            }
        };
        query.validate()?;
        Ok(query)
    }

    pub fn validate(&self) -> Result<(), FetchError> {
        match self {
            LocationQuery::Place(name) if name.trim().is_empty() => {
                Err(FetchError::Validation("place name is empty".to_string()))
            }
            LocationQuery::Place(_) => Ok(()),
            LocationQuery::Coordinates { lat, lon } => {
                if !lat.is_finite() || !(-90.0..=90.0).contains(lat) {
                    return Err(FetchError::Validation(format!("latitude {lat} is out of range")));
                }
                if !lon.is_finite() || !(-180.0..=180.0).contains(lon) {
                    return Err(FetchError::Validation(format!("longitude {lon} is out of range")));
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationQuery::Place(name) => f.write_str(name.trim()),
            LocationQuery::Coordinates { lat, lon } => write!(f, "{lat},{lon}"),
        }
    }
}

/// One 3-hour slot of the provider forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub timestamp_utc: i64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity_pct: u8,
    pub wind_speed_ms: f64,
    pub condition_code: String,
    pub condition_description: String,
    pub icon_id: String,
}

/// Forecast samples plus the UTC offset of the forecast location.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastFeed {
    pub samples: Vec<ForecastSample>,
    pub utc_offset: FixedOffset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub representative: ForecastSample,
    pub temp_min_of_day: f64,
    pub temp_max_of_day: f64,
}

impl DailySummary {
    /// ISO `YYYY-MM-DD` key of the day.
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// A place offered in the suggestion list, whatever its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSuggestion {
    pub name: String,
    pub country_code: String,
    pub country_name: String,
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl PlaceSuggestion {
    /// Single construction path for static and remote places. The country name
    /// is localized here.
    pub fn new(
        name: impl Into<String>,
        country_code: impl Into<String>,
        state: Option<String>,
        lat: f64,
        lon: f64,
        language: Language,
    ) -> Self {
        let country_code = country_code.into();
        let country_name = country_name(&country_code, language).to_string();
        Self {
            name: name.into(),
            country_code,
            country_name,
            state: state.filter(|s| !s.trim().is_empty()),
            lat,
            lon,
        }
    }

    /// Listbox key; suggestions are identified by their coordinates.
    pub fn item_key(&self) -> String {
        format!("{}-{}", self.lat, self.lon)
    }

    /// "Name, State, Country" as shown in the list.
    pub fn label(&self) -> String {
        match &self.state {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country_name),
            None => format!("{}, {}", self.name, self.country_name),
        }
    }

    /// Text written back into the search field after a selection.
    pub fn field_text(&self) -> String {
        format!("{}, {}", self.name, self.country_code)
    }

    pub fn coordinates(&self) -> LocationQuery {
        LocationQuery::Coordinates { lat: self.lat, lon: self.lon }
    }
}

/// Current conditions at the queried location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub country_code: String,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_ms: f64,
    pub condition: String,
    pub description: String,
    pub icon_id: String,
    pub rain_last_hour_mm: Option<f64>,
    pub observation_time: DateTime<Utc>,
}

/// Everything one successful lookup produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current: WeatherSnapshot,
    pub daily: Vec<DailySummary>,
    pub language: Language,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_as_str_roundtrip() {
        for lang in Language::all() {
            let parsed = Language::try_from(lang.as_str()).expect("roundtrip should succeed");
            assert_eq!(*lang, parsed);
        }
    }

    #[test]
    fn unknown_language_error() {
        let err = Language::try_from("fr").unwrap_err();
        assert!(err.to_string().contains("Unknown language"));
    }

    #[test]
    fn city_wins_over_coordinates() {
        let q = LocationQuery::from_params(Some(" Madrid "), Some(1.0), Some(2.0)).unwrap();
        assert_eq!(q, LocationQuery::Place("Madrid".into()));
    }

    #[test]
    fn coordinates_need_both_halves() {
        let err = LocationQuery::from_params(None, Some(40.0), None).unwrap_err();
        assert!(matches!(err, FetchError::Validation(_)));

        let err = LocationQuery::from_params(Some("   "), None, None).unwrap_err();
        assert!(matches!(err, FetchError::Validation(_)));
    }

    #[test]
    fn coordinates_out_of_range_are_rejected() {
        let q = LocationQuery::Coordinates { lat: 91.0, lon: 0.0 };
        assert!(q.validate().is_err());
        let q = LocationQuery::Coordinates { lat: 0.0, lon: f64::NAN };
        assert!(q.validate().is_err());
        let q = LocationQuery::Coordinates { lat: 40.4168, lon: -3.7038 };
        assert!(q.validate().is_ok());
    }

    #[test]
    fn suggestion_localizes_country_and_drops_blank_state() {
        let s = PlaceSuggestion::new("Madrid", "ES", Some(" ".into()), 40.4, -3.7, Language::Es);
        assert_eq!(s.country_name, "España");
        assert_eq!(s.state, None);
        assert_eq!(s.label(), "Madrid, España");
        assert_eq!(s.field_text(), "Madrid, ES");
    }

    #[test]
    fn suggestion_falls_back_to_raw_country_code() {
        let s = PlaceSuggestion::new("Oslo", "NO", None, 59.9, 10.7, Language::En);
        assert_eq!(s.country_name, "NO");
    }
}
