//! Core library for the `weatherdash` terminal dashboard.
//!
//! This crate defines:
//! - A typed client for the dashboard backend (weather, suggestions, auth, history)
//! - The process-wide session and its persisted token
//! - Debounced city autocomplete and the weather search flow
//! - Route guarding for views that need a signed-in user
//!
//! It is used by `weatherdash-cli`, but has no terminal dependencies of its own.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod debounce;
pub mod error;
pub mod guard;
pub mod model;
pub mod search;
pub mod session;
pub mod suggest;
pub mod token;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, Backend};
pub use config::Config;
pub use dashboard::Dashboard;
pub use error::{ApiError, Error};
pub use guard::{Guarded, Route};
pub use model::{CitySuggestion, Condition, HistoryEntry, User, WeatherSnapshot};
pub use search::{SearchFlow, SearchState};
pub use session::{AuthState, SessionStore};
pub use suggest::{SuggestionPipeline, SuggestionState};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};
