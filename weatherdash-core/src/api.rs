use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::ApiError,
    model::{AuthGrant, CitySuggestion, HistoryEntry, User, WeatherSnapshot},
};

pub mod client;

pub use client::ApiClient;

/// Typed view of the dashboard backend.
///
/// Every flow in this crate talks to the backend through this trait only.
/// Implementations attach the persisted token to each request themselves;
/// `logout` is the exception and receives the token explicitly because the
/// session has already been torn down locally when it runs.
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    async fn weather(&self, city: &str) -> Result<WeatherSnapshot, ApiError>;

    async fn city_suggestions(&self, query: &str) -> Result<Vec<CitySuggestion>, ApiError>;

    async fn login(&self, username: &str, password: &str) -> Result<AuthGrant, ApiError>;

    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthGrant, ApiError>;

    async fn logout(&self, token: &str) -> Result<(), ApiError>;

    async fn current_user(&self) -> Result<User, ApiError>;

    async fn history(&self) -> Result<Vec<HistoryEntry>, ApiError>;
}
