use anyhow::Context;
use std::{sync::Arc, time::Duration};
use tracing::debug;

use crate::{
    api::{ApiClient, Backend},
    config::Config,
    error::{Error, Result},
    guard::{Guarded, protect},
    model::{CitySuggestion, HistoryEntry, WeatherSnapshot},
    search::SearchFlow,
    session::SessionStore,
    suggest::SuggestionPipeline,
    token::{FileTokenStore, TokenStore},
};

/// Everything the views need, wired to one backend and one session.
#[derive(Debug, Clone)]
pub struct Dashboard {
    backend: Arc<dyn Backend>,
    session: SessionStore,
    search: SearchFlow,
    suggestions: SuggestionPipeline,
}

impl Dashboard {
    /// Build against the configured backend with the token on disk.
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let token_path = config.token_file_path()?;
        debug!(path = %token_path.display(), base_url = %config.api.base_url, "Wiring dashboard");

        let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(token_path));
        let client = ApiClient::new(&config.api, Arc::clone(&tokens))
            .context("Failed to build HTTP client")?;

        Ok(Self::new(Arc::new(client), tokens, config.suggestions.debounce()))
    }

    pub fn new(
        backend: Arc<dyn Backend>,
        tokens: Arc<dyn TokenStore>,
        quiet_period: Duration,
    ) -> Self {
        Self {
            session: SessionStore::new(Arc::clone(&backend), tokens),
            search: SearchFlow::new(Arc::clone(&backend)),
            suggestions: SuggestionPipeline::new(Arc::clone(&backend), quiet_period),
            backend,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn search(&self) -> &SearchFlow {
        &self.search
    }

    pub fn suggestions(&self) -> &SuggestionPipeline {
        &self.suggestions
    }

    /// Search for a picked suggestion.
    pub async fn select_suggestion(&self, suggestion: &CitySuggestion) -> Result<WeatherSnapshot> {
        let city = self.suggestions.select(suggestion);
        self.search.search(&city).await
    }

    /// The History view. Anonymous visitors are redirected without any
    /// request being made.
    pub async fn history(&self) -> Result<Guarded<Vec<HistoryEntry>>> {
        if let Guarded::Redirect(route) = protect(&self.session.state(), ()) {
            return Ok(Guarded::Redirect(route));
        }

        match self.backend.history().await {
            Ok(entries) => Ok(Guarded::Render(entries)),
            Err(err) if err.is_unauthorized() => Err(Error::Unauthenticated),
            Err(err) => Err(Error::Network(err)),
        }
    }
}
