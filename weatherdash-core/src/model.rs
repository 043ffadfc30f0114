use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account snapshot returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// Credentials issued by login and registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthGrant {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub code: u32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

impl Condition {
    pub fn unknown() -> Self {
        Self {
            code: 0,
            main: "Unknown".to_string(),
            description: "Unknown".to_string(),
            icon: String::new(),
        }
    }

    /// Image URL for the condition icon, if the backend supplied one.
    pub fn icon_url(&self) -> Option<String> {
        if self.icon.is_empty() {
            None
        } else {
            Some(format!("https://openweathermap.org/img/wn/{}@2x.png", self.icon))
        }
    }
}

/// Current conditions for one location. Replaced wholesale on every search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub country: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub wind_speed_mps: f64,
    pub condition: Condition,
}

impl WeatherSnapshot {
    /// "London, GB", or just the name when the country is unknown.
    pub fn display_location(&self) -> String {
        if self.country.is_empty() {
            self.location_name.clone()
        } else {
            format!("{}, {}", self.location_name, self.country)
        }
    }
}

/// One autocomplete candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub name: String,
    pub country: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub state: Option<String>,
    #[serde(default, rename = "display_name")]
    pub label: String,
}

impl CitySuggestion {
    /// Fill in the label when the backend left it out.
    pub(crate) fn normalized(mut self) -> Self {
        if self.label.is_empty() {
            self.label = match &self.state {
                Some(state) => format!("{}, {}, {}", self.name, state, self.country),
                None => format!("{}, {}", self.name, self.country),
            };
        }
        self
    }
}

/// Past search, owned by the server. Never mutated client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub city: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub country: Option<String>,
    pub searched_at: DateTime<Utc>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub weather_description: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Deserialize::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
