//! In-process backend double for flow tests.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::{
    api::Backend,
    error::ApiError,
    model::{AuthGrant, CitySuggestion, Condition, HistoryEntry, User, WeatherSnapshot},
    token::TokenStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Weather(String),
    Suggest(String),
    Login(String),
    Register(String),
    Logout(String),
    CurrentUser(Option<String>),
    History(Option<String>),
}

#[derive(Debug)]
pub(crate) struct FakeBackend {
    tokens: Arc<dyn TokenStore>,
    calls: Mutex<Vec<Call>>,
    accounts: Mutex<HashMap<String, (String, User)>>,
    sessions: Mutex<HashMap<String, User>>,
    weather: Mutex<HashMap<String, WeatherSnapshot>>,
    weather_latency: Mutex<Duration>,
    suggestions: Mutex<HashMap<String, (Vec<CitySuggestion>, Duration)>>,
    history: Mutex<Vec<HistoryEntry>>,
    logout_status: Mutex<StatusCode>,
}

impl FakeBackend {
    /// `tokens` is the store the real client would read the bearer token from.
    pub(crate) fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            tokens,
            calls: Mutex::default(),
            accounts: Mutex::default(),
            sessions: Mutex::default(),
            weather: Mutex::default(),
            weather_latency: Mutex::default(),
            suggestions: Mutex::default(),
            history: Mutex::default(),
            logout_status: Mutex::new(StatusCode::OK),
        }
    }

    pub(crate) fn with_account(self, username: &str, password: &str) -> Self {
        let id = self.accounts.lock().unwrap().len() as i64 + 1;
        let user = User {
            id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
        };
        self.accounts
            .lock()
            .unwrap()
            .insert(username.to_string(), (password.to_string(), user));
        self
    }

    /// Token the backend accepts for `username`, as if issued earlier.
    pub(crate) fn with_session(self, token: &str, username: &str) -> Self {
        let user = self.accounts.lock().unwrap()[username].1.clone();
        self.sessions.lock().unwrap().insert(token.to_string(), user);
        self
    }

    pub(crate) fn with_weather(self, snapshot: WeatherSnapshot) -> Self {
        self.weather
            .lock()
            .unwrap()
            .insert(snapshot.location_name.to_lowercase(), snapshot);
        self
    }

    pub(crate) fn with_weather_latency(self, latency: Duration) -> Self {
        *self.weather_latency.lock().unwrap() = latency;
        self
    }

    pub(crate) fn with_suggestions(
        self,
        query: &str,
        names: &[&str],
        latency: Duration,
    ) -> Self {
        let items = names.iter().map(|name| suggestion(name)).collect();
        self.suggestions
            .lock()
            .unwrap()
            .insert(query.to_string(), (items, latency));
        self
    }

    pub(crate) fn with_history(self, entries: Vec<HistoryEntry>) -> Self {
        *self.history.lock().unwrap() = entries;
        self
    }

    pub(crate) fn with_logout_status(self, status: StatusCode) -> Self {
        *self.logout_status.lock().unwrap() = status;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn suggest_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Suggest(q) => Some(q),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn bearer(&self) -> Option<String> {
        self.tokens.load().unwrap()
    }

    fn authorized_user(&self) -> Result<User, ApiError> {
        self.bearer()
            .and_then(|token| self.sessions.lock().unwrap().get(&token).cloned())
            .ok_or_else(|| ApiError::status(StatusCode::UNAUTHORIZED, r#"{"detail":"Invalid token."}"#))
    }

    fn grant(&self, user: User) -> AuthGrant {
        let token = format!("token-{}", user.username);
        self.sessions.lock().unwrap().insert(token.clone(), user.clone());
        AuthGrant { token, user }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn weather(&self, city: &str) -> Result<WeatherSnapshot, ApiError> {
        self.record(Call::Weather(city.to_string()));
        let latency = *self.weather_latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.weather
            .lock()
            .unwrap()
            .get(&city.to_lowercase())
            .cloned()
            .ok_or_else(|| ApiError::status(StatusCode::NOT_FOUND, r#"{"cod":"404"}"#))
    }

    async fn city_suggestions(&self, query: &str) -> Result<Vec<CitySuggestion>, ApiError> {
        self.record(Call::Suggest(query.to_string()));
        let scripted = self.suggestions.lock().unwrap().get(query).cloned();
        match scripted {
            Some((items, latency)) => {
                if !latency.is_zero() {
                    tokio::time::sleep(latency).await;
                }
                Ok(items)
            }
            None => Err(ApiError::status(StatusCode::BAD_GATEWAY, "upstream unavailable")),
        }
    }

    async fn login(&self, username: &str, password: &str) -> Result<AuthGrant, ApiError> {
        self.record(Call::Login(username.to_string()));
        let account = self.accounts.lock().unwrap().get(username).cloned();
        match account {
            Some((expected, user)) if expected == password => Ok(self.grant(user)),
            _ => Err(ApiError::status(
                StatusCode::UNAUTHORIZED,
                r#"{"error":"Invalid credentials"}"#,
            )),
        }
    }

    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthGrant, ApiError> {
        self.record(Call::Register(username.to_string()));
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(username) {
            return Err(ApiError::status(
                StatusCode::BAD_REQUEST,
                r#"{"error":"Username already exists"}"#,
            ));
        }
        let user = User {
            id: accounts.len() as i64 + 1,
            username: username.to_string(),
            email: email.to_string(),
        };
        accounts.insert(username.to_string(), (password.to_string(), user.clone()));
        drop(accounts);
        Ok(self.grant(user))
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        self.record(Call::Logout(token.to_string()));
        let status = *self.logout_status.lock().unwrap();
        if status.is_success() {
            self.sessions.lock().unwrap().remove(token);
            Ok(())
        } else {
            Err(ApiError::status(status, ""))
        }
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.record(Call::CurrentUser(self.bearer()));
        self.authorized_user()
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        self.record(Call::History(self.bearer()));
        self.authorized_user()?;
        Ok(self.history.lock().unwrap().clone())
    }
}

pub(crate) fn suggestion(name: &str) -> CitySuggestion {
    CitySuggestion {
        name: name.to_string(),
        country: "GB".to_string(),
        state: None,
        label: format!("{name}, GB"),
    }
}

pub(crate) fn snapshot(city: &str) -> WeatherSnapshot {
    WeatherSnapshot {
        location_name: city.to_string(),
        country: "GB".to_string(),
        temperature_c: 12.4,
        feels_like_c: 11.0,
        humidity_pct: 80,
        pressure_hpa: 1011,
        wind_speed_mps: 3.6,
        condition: Condition {
            code: 803,
            main: "Clouds".to_string(),
            description: "broken clouds".to_string(),
            icon: "04d".to_string(),
        },
    }
}
