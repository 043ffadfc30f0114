use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::{
    api::Backend,
    error::{Error, Result},
    model::WeatherSnapshot,
};

const BLANK_CITY: &str = "Please enter a city name";

/// What the Home view renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub weather: Option<WeatherSnapshot>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Turns a submitted city name into a weather lookup.
#[derive(Debug, Clone)]
pub struct SearchFlow {
    backend: Arc<dyn Backend>,
    state: Arc<watch::Sender<SearchState>>,
}

impl SearchFlow {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self { backend, state: Arc::new(state) }
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Look up current weather for `city`.
    ///
    /// Blank input is rejected without touching the network. Any backend
    /// failure is reported as "not found" and clears the previous result.
    /// Rapid repeat submissions are not merged.
    pub async fn search(&self, city: &str) -> Result<WeatherSnapshot> {
        let city = city.trim();
        if city.is_empty() {
            self.state.send_modify(|s| s.error = Some(BLANK_CITY.to_string()));
            return Err(Error::Validation(BLANK_CITY));
        }

        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
        let _loading = Loading(&self.state);

        match self.backend.weather(city).await {
            Ok(weather) => {
                info!(city, location = %weather.display_location(), "Weather loaded");
                self.state.send_modify(|s| {
                    s.weather = Some(weather.clone());
                    s.error = None;
                });
                Ok(weather)
            }
            Err(source) => {
                debug!(city, error = %source, "Weather lookup failed");
                let err = Error::NotFound { city: city.to_string(), source };
                self.state.send_modify(|s| {
                    s.weather = None;
                    s.error = Some(err.to_string());
                });
                Err(err)
            }
        }
    }
}

/// Clears the loading flag however the search ends.
struct Loading<'a>(&'a watch::Sender<SearchState>);

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|s| s.loading = false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        testing::{Call, FakeBackend, snapshot},
        token::MemoryTokenStore,
    };
    use std::time::Duration;

    fn flow(backend: FakeBackend) -> (SearchFlow, Arc<FakeBackend>) {
        let fake = Arc::new(backend);
        (SearchFlow::new(fake.clone()), fake)
    }

    fn fake() -> FakeBackend {
        FakeBackend::new(Arc::new(MemoryTokenStore::default()))
    }

    #[tokio::test]
    async fn blank_input_is_rejected_locally() {
        let (flow, fake) = flow(fake());

        for input in ["", "   ", "\t\n"] {
            let err = flow.search(input).await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }

        assert!(fake.calls().is_empty());
        let state = flow.state();
        assert_eq!(state.error.as_deref(), Some("Please enter a city name"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn successful_search_replaces_weather() {
        let (flow, fake) =
            flow(fake().with_weather(snapshot("London")).with_weather(snapshot("Paris")));

        flow.search("London").await.unwrap();
        let weather = flow.search("  Paris ").await.unwrap();

        assert_eq!(weather.location_name, "Paris");
        let state = flow.state();
        assert_eq!(state.weather, Some(snapshot("Paris")));
        assert_eq!(state.error, None);
        assert!(!state.loading);
        assert_eq!(
            fake.calls(),
            vec![Call::Weather("London".into()), Call::Weather("Paris".into())]
        );
    }

    #[tokio::test]
    async fn unknown_city_clears_weather_and_sets_error() {
        let (flow, _) = flow(fake().with_weather(snapshot("London")));
        flow.search("London").await.unwrap();

        let err = flow.search("Nowhereville").await.unwrap_err();

        assert!(matches!(err, Error::NotFound { ref source, .. } if source.is_not_found()));
        let state = flow.state();
        assert_eq!(state.weather, None);
        assert_eq!(state.error.as_deref(), Some("City not found. Please try again."));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn new_search_clears_previous_error() {
        let (flow, _) = flow(fake().with_weather(snapshot("Oslo")));
        flow.search("Atlantis").await.unwrap_err();

        flow.search("Oslo").await.unwrap();

        assert_eq!(flow.state().error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn loading_flag_tracks_the_request() {
        let (flow, _) = flow(
            fake()
                .with_weather(snapshot("Rome"))
                .with_weather_latency(Duration::from_secs(1)),
        );

        let search = flow.search("Rome");
        tokio::pin!(search);

        let early = tokio::time::timeout(Duration::from_millis(10), search.as_mut()).await;
        assert!(early.is_err());
        assert!(flow.state().loading);

        search.await.unwrap();
        assert!(!flow.state().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_search_clears_loading() {
        let (flow, _) = flow(fake().with_weather_latency(Duration::from_secs(1)));

        {
            let search = flow.search("Rome");
            tokio::pin!(search);
            let early = tokio::time::timeout(Duration::from_millis(10), search.as_mut()).await;
            assert!(early.is_err());
            assert!(flow.state().loading);
        }

        assert!(!flow.state().loading);
    }
}
