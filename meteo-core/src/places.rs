//! Built-in places and country names.
//!
//! The static index answers suggestion queries instantly while the geocoding
//! provider is still being asked, and stands in for it when that call fails.

use crate::model::{Language, PlaceSuggestion};

/// Localized display name for an ISO-3166 alpha-2 code, or the code itself
/// when the table has no entry.
pub fn country_name(code: &str, language: Language) -> &str {
    let name = match (language, code.to_ascii_uppercase().as_str()) {
        (Language::En, "ES") => "Spain",
        (Language::En, "GB") => "United Kingdom",
        (Language::En, "FR") => "France",
        (Language::En, "IT") => "Italy",
        (Language::En, "DE") => "Germany",
        (Language::En, "NL") => "Netherlands",
        (Language::En, "US") => "United States",
        (Language::En, "JP") => "Japan",
        (Language::En, "MX") => "Mexico",
        (Language::En, "BR") => "Brazil",
        (Language::En, "PE") => "Peru",
        (Language::En, "CA") => "Canada",
        (Language::Es, "ES") => "España",
        (Language::Es, "GB") => "Reino Unido",
        (Language::Es, "FR") => "Francia",
        (Language::Es, "IT") => "Italia",
        (Language::Es, "DE") => "Alemania",
        (Language::Es, "NL") => "Países Bajos",
        (Language::Es, "US") => "Estados Unidos",
        (Language::Es, "JP") => "Japón",
        (Language::Es, "MX") => "México",
        (Language::Es, "BR") => "Brasil",
        (Language::Es, "PE") => "Perú",
        (Language::Es, "CA") => "Canadá",
        (_, "CN") => "China",
        (_, "AU") => "Australia",
        (_, "AR") => "Argentina",
        (_, "CO") => "Colombia",
        (_, "CL") => "Chile",
        (_, "VE") => "Venezuela",
        (_, "EC") => "Ecuador",
        _ => return code,
    };
    name
}

// (name, country code, lat, lon)
const BUILTIN_PLACES: &[(&str, &str, f64, f64)] = &[
    ("Madrid", "ES", 40.4168, -3.7038),
    ("Barcelona", "ES", 41.3851, 2.1734),
    ("Valencia", "ES", 39.4699, -0.3763),
    ("Sevilla", "ES", 37.3891, -5.9845),
    ("Bilbao", "ES", 43.2627, -2.9253),
    ("London", "GB", 51.5074, -0.1278),
    ("Paris", "FR", 48.8566, 2.3522),
    ("Rome", "IT", 41.9028, 12.4964),
    ("Berlin", "DE", 52.5200, 13.4050),
    ("Amsterdam", "NL", 52.3676, 4.9041),
    ("New York", "US", 40.7128, -74.0060),
    ("Los Angeles", "US", 34.0522, -118.2437),
    ("Chicago", "US", 41.8781, -87.6298),
    ("Miami", "US", 25.7617, -80.1918),
    ("Tokyo", "JP", 35.6762, 139.6503),
    ("Beijing", "CN", 39.9042, 116.4074),
    ("Sydney", "AU", -33.8688, 151.2093),
    ("Toronto", "CA", 43.6532, -79.3832),
    ("Mexico City", "MX", 19.4326, -99.1332),
    ("Buenos Aires", "AR", -34.6118, -58.3960),
    ("São Paulo", "BR", -23.5505, -46.6333),
    ("Rio de Janeiro", "BR", -22.9068, -43.1729),
    ("Lima", "PE", -12.0464, -77.0428),
    ("Bogotá", "CO", 4.7110, -74.0721),
    ("Santiago", "CL", -33.4489, -70.6693),
    ("Caracas", "VE", 10.4806, -66.9036),
    ("Quito", "EC", -0.2299, -78.5249),
    ("Guayaquil", "EC", -2.1894, -79.8891),
];

/// Immutable list of well-known places, localized once at construction.
#[derive(Debug, Clone)]
pub struct StaticPlaceIndex {
    places: Vec<PlaceSuggestion>,
}

impl StaticPlaceIndex {
    pub fn new(places: Vec<PlaceSuggestion>) -> Self {
        Self { places }
    }

    /// The built-in city list with country names in `language`.
    pub fn builtin(language: Language) -> Self {
        let places = BUILTIN_PLACES
            .iter()
            .map(|&(name, code, lat, lon)| PlaceSuggestion::new(name, code, None, lat, lon, language))
            .collect();
        Self::new(places)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Up to `limit` places whose name or country name contains `query`,
    /// ignoring case, in index order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<PlaceSuggestion> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.places
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.country_name.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_names_per_language() {
        assert_eq!(country_name("ES", Language::En), "Spain");
        assert_eq!(country_name("ES", Language::Es), "España");
        assert_eq!(country_name("gb", Language::Es), "Reino Unido");
        assert_eq!(country_name("CL", Language::Es), "Chile");
        assert_eq!(country_name("ZZ", Language::En), "ZZ");
    }

    #[test]
    fn builtin_index_has_every_place() {
        let index = StaticPlaceIndex::builtin(Language::En);
        assert_eq!(index.len(), BUILTIN_PLACES.len());
    }

    #[test]
    fn search_matches_substring_ignoring_case() {
        let index = StaticPlaceIndex::builtin(Language::En);
        let hits = index.search("mad", 3);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].label(), "Madrid, Spain");

        let hits = index.search("ANGEL", 3);
        assert_eq!(hits[0].name, "Los Angeles");
    }

    #[test]
    fn search_matches_country_name_and_caps_results() {
        let index = StaticPlaceIndex::builtin(Language::En);
        let hits = index.search("spain", 3);
        let names: Vec<_> = hits.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Madrid", "Barcelona", "Valencia"]);
    }

    #[test]
    fn search_uses_localized_country_names() {
        let index = StaticPlaceIndex::builtin(Language::Es);
        let hits = index.search("españa", 5);
        assert_eq!(hits.len(), 5);
        assert!(index.search("spain", 5).is_empty());
    }

    #[test]
    fn blank_query_matches_nothing() {
        let index = StaticPlaceIndex::builtin(Language::En);
        assert!(index.search("  ", 3).is_empty());
    }
}
