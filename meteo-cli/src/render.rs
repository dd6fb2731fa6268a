//! Human-readable output for weather reports.

use chrono::{Datelike, NaiveDate, Weekday};
use meteo_core::{
    CallCounterState, DailySummary, Language, PlaceSuggestion, WeatherReport, WeatherSnapshot,
};

struct Labels {
    humidity: &'static str,
    wind: &'static str,
    rain: &'static str,
    last_update: &'static str,
    forecast: &'static str,
}

fn labels(language: Language) -> Labels {
    match language {
        Language::En => Labels {
            humidity: "Humidity",
            wind: "Wind",
            rain: "Rain (last hour)",
            last_update: "Last update",
            forecast: "Forecast",
        },
        Language::Es => Labels {
            humidity: "Humedad",
            wind: "Viento",
            rain: "Lluvia (última hora)",
            last_update: "Última actualización",
            forecast: "Pronóstico",
        },
    }
}

pub fn weekday_name(date: NaiveDate, language: Language) -> &'static str {
    match (language, date.weekday()) {
        (Language::En, Weekday::Mon) => "Monday",
        (Language::En, Weekday::Tue) => "Tuesday",
        (Language::En, Weekday::Wed) => "Wednesday",
        (Language::En, Weekday::Thu) => "Thursday",
        (Language::En, Weekday::Fri) => "Friday",
        (Language::En, Weekday::Sat) => "Saturday",
        (Language::En, Weekday::Sun) => "Sunday",
        (Language::Es, Weekday::Mon) => "lunes",
        (Language::Es, Weekday::Tue) => "martes",
        (Language::Es, Weekday::Wed) => "miércoles",
        (Language::Es, Weekday::Thu) => "jueves",
        (Language::Es, Weekday::Fri) => "viernes",
        (Language::Es, Weekday::Sat) => "sábado",
        (Language::Es, Weekday::Sun) => "domingo",
    }
}

/// m/s to km/h with two decimals.
pub fn wind_kmh(speed_ms: f64) -> String {
    format!("{:.2}", speed_ms * 3.6)
}

pub fn round_temp(celsius: f64) -> i64 {
    celsius.round() as i64
}

/// Lowercase everything, then uppercase each letter that starts a word.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_alphabetic() && at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = !ch.is_alphanumeric();
    }

    out
}

pub fn current(snapshot: &WeatherSnapshot, language: Language) -> String {
    let l = labels(language);
    let mut lines = vec![
        format!("{}, {}", snapshot.location_name, snapshot.country_code),
        format!(
            "{} {}",
            l.last_update,
            snapshot.observation_time.format("%Y-%m-%d %H:%M UTC")
        ),
        format!("{}°C  {}", round_temp(snapshot.temperature_c), title_case(&snapshot.description)),
        format!("{}: {} %", l.humidity, snapshot.humidity_pct),
        format!("{}: {} km/h", l.wind, wind_kmh(snapshot.wind_speed_ms)),
    ];

    if let Some(mm) = snapshot.rain_last_hour_mm {
        lines.push(format!("{}: {mm} mm", l.rain));
    }

    lines.join("\n")
}

pub fn day(summary: &DailySummary, language: Language) -> String {
    let sample = &summary.representative;
    format!(
        "{:<11} {:>4}° / {:>4}°  {}  ({}: {} %, {}: {} km/h)",
        title_case(weekday_name(summary.date, language)),
        round_temp(summary.temp_min_of_day),
        round_temp(summary.temp_max_of_day),
        title_case(&sample.condition_description),
        labels(language).humidity,
        sample.humidity_pct,
        labels(language).wind,
        wind_kmh(sample.wind_speed_ms),
    )
}

pub fn report(report: &WeatherReport) -> String {
    let mut out = current(&report.current, report.language);

    if !report.daily.is_empty() {
        out.push_str(&format!("\n\n{}:\n", labels(report.language).forecast));
        let days: Vec<String> = report.daily.iter().map(|d| day(d, report.language)).collect();
        out.push_str(&days.join("\n"));
    }

    out
}

pub fn suggestions(items: &[PlaceSuggestion]) -> String {
    items
        .iter()
        .map(|p| format!("{}  ({:.4}, {:.4})", p.label(), p.lat, p.lon))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn usage(state: &CallCounterState) -> String {
    let stamp = |unix: Option<i64>| {
        unix.and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string())
    };

    format!(
        "Calls in current window: {}\nWindow started: {}\nLast call: {}",
        state.count,
        stamp(state.window_start_unix),
        stamp(state.last_call_unix),
    )
}
