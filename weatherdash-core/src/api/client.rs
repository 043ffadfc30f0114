use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, header::AUTHORIZATION};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    config::ApiConfig,
    error::ApiError,
    model::{AuthGrant, CitySuggestion, Condition, HistoryEntry, User, WeatherSnapshot},
    suggest::MIN_QUERY_LEN,
    token::TokenStore,
};

use super::Backend;

/// HTTP implementation of [`Backend`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    auth_scheme: String,
    tokens: Arc<dyn TokenStore>,
    http: Client,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_scheme: config.auth_scheme.clone(),
            tokens,
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_token(&self, req: RequestBuilder, token: &str) -> RequestBuilder {
        req.header(AUTHORIZATION, format!("{} {}", self.auth_scheme, token))
    }

    /// Attach the persisted token, if there is one.
    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match self.tokens.load() {
            Ok(Some(token)) => self.with_token(req, &token),
            Ok(None) => req,
            Err(err) => {
                warn!(error = %err, "Failed to read session token, sending request anonymously");
                req
            }
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<String, ApiError> {
        let res = req.send().await?;
        let status = res.status();
        let body = res.text().await?;

        debug!(base_url = %self.base_url, %status, "Backend responded");

        if !status.is_success() {
            return Err(ApiError::status(status, &body));
        }

        Ok(body)
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(req).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn weather(&self, city: &str) -> Result<WeatherSnapshot, ApiError> {
        debug!(city, "Fetching weather");
        let req = self.http.get(self.url("/weather/")).query(&[("city", city)]);
        let payload: WeatherPayload = self.fetch(self.authorize(req)).await?;
        Ok(payload.into())
    }

    async fn city_suggestions(&self, query: &str) -> Result<Vec<CitySuggestion>, ApiError> {
        if query.chars().count() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }

        debug!(query, "Fetching city suggestions");
        let req = self.http.get(self.url("/city-suggestions/")).query(&[("q", query)]);
        let suggestions: Vec<CitySuggestion> = self.fetch(self.authorize(req)).await?;
        Ok(suggestions.into_iter().map(CitySuggestion::normalized).collect())
    }

    async fn login(&self, username: &str, password: &str) -> Result<AuthGrant, ApiError> {
        let req = self
            .http
            .post(self.url("/auth/login/"))
            .json(&json!({ "username": username, "password": password }));
        self.fetch(self.authorize(req)).await
    }

    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthGrant, ApiError> {
        let req = self
            .http
            .post(self.url("/auth/register/"))
            .json(&json!({ "username": username, "email": email, "password": password }));
        self.fetch(self.authorize(req)).await
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let req = self.http.post(self.url("/auth/logout/"));
        self.send(self.with_token(req, token)).await.map(drop)
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        let req = self.http.get(self.url("/auth/user/"));
        self.fetch(self.authorize(req)).await
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        let req = self.http.get(self.url("/history/"));
        self.fetch(self.authorize(req)).await
    }
}

#[derive(Debug, Deserialize)]
struct WpMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct WpCondition {
    id: u32,
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WpWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct WpSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct WeatherPayload {
    name: String,
    #[serde(default)]
    sys: WpSys,
    main: WpMain,
    #[serde(default)]
    weather: Vec<WpCondition>,
    wind: WpWind,
}

impl From<WeatherPayload> for WeatherSnapshot {
    fn from(payload: WeatherPayload) -> Self {
        let condition = payload
            .weather
            .into_iter()
            .next()
            .map(|w| Condition {
                code: w.id,
                main: w.main,
                description: w.description,
                icon: w.icon,
            })
            .unwrap_or_else(Condition::unknown);

        WeatherSnapshot {
            location_name: payload.name,
            country: payload.sys.country,
            temperature_c: payload.main.temp,
            feels_like_c: payload.main.feels_like,
            humidity_pct: payload.main.humidity,
            pressure_hpa: payload.main.pressure,
            wind_speed_mps: payload.wind.speed,
            condition,
        }
    }
}
