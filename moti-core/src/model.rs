use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on forecast length accepted by the provider.
pub const MAX_FORECAST_DAYS: u8 = 10;
/// Forecast length requested when the caller doesn't say otherwise.
pub const DEFAULT_FORECAST_DAYS: u8 = 7;

/// A place name or a literal `"<lat>,<lon>"` pair. The provider resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationQuery(String);

impl LocationQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self(query.into())
    }

    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        Self(format!("{latitude},{longitude}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationQuery {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for LocationQuery {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Autocomplete candidate, either from the local gazetteer or the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
}

impl CitySuggestion {
    pub fn new(name: &str, region: &str, country: &str) -> Self {
        Self {
            name: name.to_string(),
            region: region.to_string(),
            country: country.to_string(),
        }
    }

    /// Dedup identity: case-insensitive name only. Same-named places in
    /// different regions collide.
    pub fn same_city(&self, other: &CitySuggestion) -> bool {
        self.name.to_lowercase() == other.name.to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    #[serde(default)]
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub localtime: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    #[serde(default)]
    pub icon: String,
    pub code: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp_c: f64,
    pub feelslike_c: f64,
    pub condition: Condition,
    pub humidity: u8,
    pub wind_kph: f64,
    pub wind_dir: String,
    pub pressure_mb: f64,
    pub vis_km: f64,
    pub uv: f64,
    pub is_day: u8,
}

impl CurrentConditions {
    pub fn is_daytime(&self) -> bool {
        self.is_day == 1
    }
}

/// Current conditions at a resolved location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: Place,
    pub current: CurrentConditions,
}

impl WeatherSnapshot {
    pub fn effect(&self) -> WeatherEffect {
        WeatherEffect::from_condition(self.current.condition.code, self.current.is_daytime())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub maxtemp_c: f64,
    pub mintemp_c: f64,
    pub avgtemp_c: f64,
    pub condition: Condition,
}

/// Ordered per-day forecast for a resolved location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub location: Place,
    pub days: Vec<ForecastDay>,
}

/// Result of a successful fetch: both halves or nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherBundle {
    pub weather: WeatherSnapshot,
    pub forecast: Forecast,
}

/// One search history record; `timestamp` is epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub city: String,
    pub timestamp: i64,
}

impl HistoryEntry {
    /// Human-readable age relative to `now_ms`.
    pub fn relative_age(&self, now_ms: i64) -> String {
        let diff = (now_ms - self.timestamp).max(0);
        let minutes = diff / 60_000;
        let hours = diff / 3_600_000;
        let days = diff / 86_400_000;

        if minutes < 1 {
            "just now".to_string()
        } else if minutes < 60 {
            format!("{minutes} min ago")
        } else if hours < 24 {
            format!("{hours} h ago")
        } else if days == 1 {
            "1 day ago".to_string()
        } else {
            format!("{days} days ago")
        }
    }
}

/// Visual mood for a condition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherEffect {
    Sunny,
    ClearNight,
    Cloudy,
    Rainy,
    Snowy,
    Stormy,
}

impl WeatherEffect {
    /// Map a WeatherAPI.com condition code.
    /// See: https://www.weatherapi.com/docs/weather_conditions.json
    pub fn from_condition(code: u32, is_day: bool) -> Self {
        match code {
            1000 if is_day => Self::Sunny,
            1000 => Self::ClearNight,
            1003 | 1006 | 1009 | 1030 | 1135 | 1147 => Self::Cloudy,
            1063 | 1150 | 1153 | 1180 | 1183 | 1186 | 1189 | 1192 | 1195 | 1240 | 1243 | 1246 => {
                Self::Rainy
            }
            1066 | 1114 | 1117 | 1210 | 1213 | 1216 | 1219 | 1222 | 1225 | 1255 | 1258 => {
                Self::Snowy
            }
            1087 | 1273 | 1276 | 1279 | 1282 => Self::Stormy,
            _ => Self::Cloudy,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Sunny => "☀",
            Self::ClearNight => "☾",
            Self::Cloudy => "☁",
            Self::Rainy => "☂",
            Self::Snowy => "❄",
            Self::Stormy => "⚡",
        }
    }
}
