//! Plain-text rendering of the dashboard views.

use chrono::Local;
use std::fmt::Write;
use weatherdash_core::{AuthState, HistoryEntry, SearchState, SuggestionState, WeatherSnapshot};

pub const HISTORY_FAILED: &str = "Failed to load search history.";

pub fn navbar(state: &AuthState) -> String {
    match state {
        AuthState::Authenticated(user) => {
            format!("Weather Dashboard | Home | Search History | Welcome, {} | Logout", user.username)
        }
        AuthState::Authenticating => "Weather Dashboard | Home | Signing in...".to_string(),
        AuthState::Unauthenticated => "Weather Dashboard | Home | Login | Register".to_string(),
    }
}

/// Home view: error banner and/or the current weather card.
pub fn home(state: &SearchState) -> String {
    let mut out = String::new();
    if state.loading {
        out.push_str("Searching...\n");
    }
    if let Some(error) = &state.error {
        let _ = writeln!(out, "! {error}");
    }
    if let Some(weather) = &state.weather {
        out.push_str(&weather_card(weather));
    }
    out
}

pub fn weather_card(w: &WeatherSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", w.display_location());
    let _ = writeln!(out, "  {} ({})", w.condition.main, w.condition.description);
    let _ = writeln!(
        out,
        "  {}°C, feels like {}°C",
        round(w.temperature_c),
        round(w.feels_like_c)
    );
    let _ = writeln!(out, "  Humidity: {}%", w.humidity_pct);
    let _ = writeln!(out, "  Wind: {} m/s", w.wind_speed_mps);
    let _ = writeln!(out, "  Pressure: {} hPa", w.pressure_hpa);
    if let Some(icon) = w.condition.icon_url() {
        let _ = writeln!(out, "  {icon}");
    }
    out
}

pub fn suggestions(state: &SuggestionState) -> String {
    state
        .visible_items()
        .iter()
        .map(|s| format!("  {}\n", s.label))
        .collect()
}

pub fn history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "You haven't searched for any cities yet.\n".to_string();
    }

    let rows: Vec<[String; 4]> = entries
        .iter()
        .map(|e| {
            [
                e.city.clone(),
                e.temperature.map(|t| format!("{t}°C")).unwrap_or_else(|| "-".to_string()),
                e.weather_description.clone().unwrap_or_else(|| "-".to_string()),
                e.searched_at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();

    let header = ["City", "Temperature", "Weather", "Date/Time"];
    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &header, &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref(), width = *width))
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}

// Halves round away from zero.
fn round(value: f64) -> i64 {
    value.round() as i64
}
