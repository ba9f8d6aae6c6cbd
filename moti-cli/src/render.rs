//! Plain-text rendering of application state.

use chrono::Utc;
use moti_core::{AppState, CitySuggestion, Forecast, HistoryEntry, Phase, WeatherSnapshot};

pub fn weather(state: &AppState) {
    if let Some(weather) = &state.weather {
        current(weather, state.is_favorite());
    }
    if let Some(forecast) = &state.forecast {
        println!();
        self::forecast(forecast);
    }
}

pub fn current(weather: &WeatherSnapshot, favorite: bool) {
    let loc = &weather.location;
    let now = &weather.current;
    let heart = if favorite { " ♥" } else { "" };

    println!("{} {}, {}{}", weather.effect().glyph(), loc.name, loc.country, heart);
    println!("  Local time:  {}  ({:.2}, {:.2})", loc.localtime, loc.lat, loc.lon);
    println!(
        "  {:.0}°C, feels like {:.0}°C  {}",
        now.temp_c, now.feelslike_c, now.condition.text
    );
    println!("  Humidity:    {}%", now.humidity);
    println!("  Wind:        {:.0} km/h {}", now.wind_kph, now.wind_dir);
    println!("  Pressure:    {:.0} mb", now.pressure_mb);
    println!("  Visibility:  {:.0} km", now.vis_km);
    println!("  UV index:    {:.0}", now.uv);
}

pub fn forecast(forecast: &Forecast) {
    println!("{}-day forecast", forecast.days.len());
    for day in &forecast.days {
        println!(
            "  {:<10}  {:>4.0}° / {:>4.0}°  avg {:>3.0}°  {}",
            day.date.format("%a %d %b").to_string(),
            day.maxtemp_c,
            day.mintemp_c,
            day.avgtemp_c,
            day.condition.text
        );
    }
}

pub fn favorites(favorites: &[String]) {
    if favorites.is_empty() {
        println!("No favorite cities yet.");
        return;
    }
    println!("Favorites ({})", favorites.len());
    for city in favorites {
        println!("  ♥ {city}");
    }
}

pub fn history(history: &[HistoryEntry]) {
    if history.is_empty() {
        println!("No recent searches.");
        return;
    }
    let now = Utc::now().timestamp_millis();
    println!("History ({})", history.len());
    for entry in history {
        println!("  {:<24} {}", entry.city, entry.relative_age(now));
    }
}

pub fn suggestion_label(s: &CitySuggestion) -> String {
    match (s.region.is_empty(), s.country.is_empty()) {
        (false, false) => format!("{} ({}, {})", s.name, s.region, s.country),
        (true, false) => format!("{} ({})", s.name, s.country),
        _ => s.name.clone(),
    }
}

pub fn suggestions(items: &[CitySuggestion]) {
    if items.is_empty() {
        println!("No suggestions.");
        return;
    }
    for item in items {
        println!("  {}", suggestion_label(item));
    }
}

/// One-line summary shown above the interactive menu.
pub fn status_line(state: &AppState) -> String {
    match state.phase() {
        Phase::Idle => "Search for a city to see the weather.".to_string(),
        Phase::Loading => "Loading...".to_string(),
        Phase::Failed => match &state.error {
            Some(err) => format!("⚠ {err}"),
            None => "⚠ Something went wrong".to_string(),
        },
        Phase::Loaded => match &state.weather {
            Some(w) => format!(
                "{} {}, {}: {:.0}°C, {}",
                w.effect().glyph(),
                w.location.name,
                w.location.country,
                w.current.temp_c,
                w.current.condition.text
            ),
            None => String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_includes_region_when_present() {
        let s = CitySuggestion::new("Vushtrri", "Mitrovica", "Kosovo");
        assert_eq!(suggestion_label(&s), "Vushtrri (Mitrovica, Kosovo)");

        let s = CitySuggestion::new("Monaco", "", "Monaco");
        assert_eq!(suggestion_label(&s), "Monaco (Monaco)");
    }

    #[test]
    fn idle_status_line() {
        let state = AppState::default();
        assert_eq!(status_line(&state), "Search for a city to see the weather.");
    }

    #[test]
    fn failed_status_line_shows_message() {
        let state =
            AppState { error: Some(moti_core::FetchError::NotFound), ..AppState::default() };
        assert!(status_line(&state).contains("City not found"));
    }
}
