//! Debounced city autocomplete.
//!
//! Every keystroke goes through [`SuggestionPipeline::on_query_change`]. At
//! most one fetch is waiting for the quiet period at any time; a newer
//! keystroke replaces it. Fetches that already went out are never cancelled,
//! but each carries a sequence number and a result older than the last
//! applied (or cleared) one is dropped on arrival.
//!
//! Fetch failures are swallowed: the list is emptied and hidden.

use std::{
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::sync::watch;
use tracing::debug;

use crate::{api::Backend, debounce::Debouncer, model::CitySuggestion};

/// Queries shorter than this never reach the backend.
pub const MIN_QUERY_LEN: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionState {
    items: Vec<CitySuggestion>,
    visible: bool,
    applied: u64,
}

impl SuggestionState {
    pub fn items(&self) -> &[CitySuggestion] {
        &self.items
    }

    /// Whether the dropdown should be shown.
    pub fn is_visible(&self) -> bool {
        self.visible && !self.items.is_empty()
    }

    pub fn visible_items(&self) -> &[CitySuggestion] {
        if self.is_visible() { &self.items } else { &[] }
    }
}

#[derive(Debug, Clone)]
pub struct SuggestionPipeline {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    backend: Arc<dyn Backend>,
    debouncer: Debouncer,
    issued: AtomicU64,
    state: watch::Sender<SuggestionState>,
}

impl SuggestionPipeline {
    /// Must be called from within a tokio runtime.
    pub fn new(backend: Arc<dyn Backend>, quiet_period: Duration) -> Self {
        let (state, _) = watch::channel(SuggestionState::default());
        Self {
            inner: Arc::new(Inner {
                backend,
                debouncer: Debouncer::new(quiet_period),
                issued: AtomicU64::new(0),
                state,
            }),
        }
    }

    pub fn state(&self) -> SuggestionState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SuggestionState> {
        self.inner.state.subscribe()
    }

    /// Feed the current contents of the input field.
    pub fn on_query_change(&self, text: &str) {
        if text.chars().count() < MIN_QUERY_LEN {
            self.inner.debouncer.cancel();
            self.clear();
            return;
        }

        let seq = self.inner.next_seq();
        let query = text.to_string();
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);

        self.inner.debouncer.schedule(async move {
            if let Some(inner) = inner.upgrade() {
                inner.fetch(seq, query).await;
            }
        });
    }

    /// Pick a suggestion: stops pending work, empties the list and returns
    /// the city name to search for.
    pub fn select(&self, suggestion: &CitySuggestion) -> String {
        self.inner.debouncer.cancel();
        self.clear();
        suggestion.name.clone()
    }

    /// Find a current suggestion by its label.
    pub fn find(&self, label: &str) -> Option<CitySuggestion> {
        self.inner
            .state
            .borrow()
            .items
            .iter()
            .find(|s| s.label == label)
            .cloned()
    }

    /// Hide the dropdown without forgetting its contents.
    pub fn dismiss(&self) {
        self.inner.state.send_if_modified(|state| {
            let changed = state.visible;
            state.visible = false;
            changed
        });
    }

    /// Show the dropdown again if there is anything to show.
    pub fn reveal(&self) {
        self.inner.state.send_if_modified(|state| {
            let visible = !state.items.is_empty();
            let changed = state.visible != visible;
            state.visible = visible;
            changed
        });
    }

    fn clear(&self) {
        let seq = self.inner.next_seq();
        self.inner.state.send_modify(|state| {
            state.items.clear();
            state.visible = false;
            state.applied = seq;
        });
    }
}

impl Inner {
    fn next_seq(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn fetch(&self, seq: u64, query: String) {
        let result = self.backend.city_suggestions(&query).await;

        self.state.send_if_modified(|state| {
            if seq <= state.applied {
                debug!(query, "Dropping superseded suggestions");
                return false;
            }
            state.applied = seq;

            match result {
                Ok(items) => {
                    state.visible = !items.is_empty();
                    state.items = items;
                }
                Err(err) => {
                    debug!(query, error = %err, "Suggestion fetch failed");
                    state.items.clear();
                    state.visible = false;
                }
            }
            true
        });
    }
}
