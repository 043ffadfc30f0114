//! Process-wide authentication state.
//!
//! [`SessionStore`] owns the only session of the process. It is cheap to
//! clone; every clone observes and mutates the same state, and consumers can
//! [`subscribe`](SessionStore::subscribe) to be told about transitions.
//!
//! Invariant: the state is [`AuthState::Authenticated`] exactly when a token
//! is persisted in the [`TokenStore`]. Both are changed together, by
//! [`login`](SessionStore::login), [`register`](SessionStore::register),
//! [`logout`](SessionStore::logout) and [`bootstrap`](SessionStore::bootstrap)
//! only.

use std::{future::Future, sync::Arc};
use tokio::{runtime::Handle, sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    api::Backend,
    error::{ApiError, Error, Result},
    model::{AuthGrant, User},
    token::TokenStore,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    /// Credentials or a stored token are being checked by the backend.
    Authenticating,
    Authenticated(User),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    backend: Arc<dyn Backend>,
    tokens: Arc<dyn TokenStore>,
    state: watch::Sender<AuthState>,
    runtime: Handle,
}

impl SessionStore {
    /// Starts unauthenticated; call [`bootstrap`](Self::bootstrap) to pick
    /// up a persisted token. Must be called from within a tokio runtime.
    pub fn new(backend: Arc<dyn Backend>, tokens: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(AuthState::Unauthenticated);
        Self {
            inner: Arc::new(Inner { backend, tokens, state, runtime: Handle::current() }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Validate a persisted token, if any, against the backend.
    ///
    /// Fails closed: when the token cannot be read or the backend rejects it
    /// for any reason, the token is discarded and the session stays
    /// unauthenticated. Nothing is retried.
    pub async fn bootstrap(&self) -> AuthState {
        match self.inner.tokens.load() {
            Ok(Some(_)) => {}
            Ok(None) => {
                self.inner.state.send_replace(AuthState::Unauthenticated);
                return AuthState::Unauthenticated;
            }
            Err(err) => {
                warn!(error = %err, "Failed to read stored session token");
                self.discard_token();
                self.inner.state.send_replace(AuthState::Unauthenticated);
                return AuthState::Unauthenticated;
            }
        }

        let transition = Transition::begin(&self.inner);
        match self.inner.backend.current_user().await {
            Ok(user) if self.has_token() => {
                info!(username = %user.username, "Restored session");
                transition.commit(AuthState::Authenticated(user.clone()));
                AuthState::Authenticated(user)
            }
            Ok(_) => {
                debug!("Session ended while it was being restored");
                drop(transition);
                self.state()
            }
            Err(err) => {
                info!(error = %err, "Stored session token rejected, discarding it");
                self.discard_token();
                transition.commit(AuthState::Unauthenticated);
                AuthState::Unauthenticated
            }
        }
    }

    /// Exchange credentials for a session.
    ///
    /// On failure the previous state is kept and the failure is returned as
    /// [`Error::Auth`].
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        self.authenticate(self.inner.backend.login(username, password)).await
    }

    /// Create an account and start a session for it. Uniqueness of the
    /// username and email is checked by the backend.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        self.authenticate(self.inner.backend.register(username, email, password))
            .await
    }

    /// End the session locally, then tell the backend.
    ///
    /// The token is removed and the state reset before this returns. The
    /// backend is notified from a detached task whose outcome is only
    /// logged; a 401 there is expected. The handle is returned so callers
    /// may wait for the notification, but nothing requires it.
    pub fn logout(&self) -> Option<JoinHandle<()>> {
        let token = self.inner.tokens.load().unwrap_or_else(|err| {
            warn!(error = %err, "Failed to read session token during logout");
            None
        });

        self.discard_token();
        self.inner.state.send_replace(AuthState::Unauthenticated);
        info!("Signed out");

        let token = token?;
        let backend = Arc::clone(&self.inner.backend);
        Some(self.inner.runtime.spawn(async move {
            match backend.logout(&token).await {
                Ok(()) => debug!("Backend invalidated session token"),
                Err(err) if err.is_unauthorized() => {
                    debug!("Backend no longer accepted the session token")
                }
                Err(err) => warn!(error = %err, "Logout notification failed"),
            }
        }))
    }

    async fn authenticate<F>(&self, attempt: F) -> Result<User>
    where
        F: Future<Output = Result<AuthGrant, ApiError>>,
    {
        let transition = Transition::begin(&self.inner);

        let grant = attempt.await.map_err(|err| {
            warn!(error = %err, "Authentication failed");
            Error::Auth(err)
        })?;

        self.inner.tokens.store(&grant.token)?;

        info!(username = %grant.user.username, "Signed in");
        transition.commit(AuthState::Authenticated(grant.user.clone()));
        Ok(grant.user)
    }

    fn has_token(&self) -> bool {
        matches!(self.inner.tokens.load(), Ok(Some(_)))
    }

    fn discard_token(&self) {
        if let Err(err) = self.inner.tokens.clear() {
            warn!(error = %err, "Failed to remove stored session token");
        }
    }
}

/// Puts the state into `Authenticating` until committed.
///
/// An attempt that fails or is dropped only touches the state if it is still
/// `Authenticating`, so a logout that ran meanwhile stands. The state it
/// falls back to follows the token store: the previous user is kept only
/// while a token is still persisted.
struct Transition<'a> {
    inner: &'a Inner,
    previous: Option<AuthState>,
}

impl<'a> Transition<'a> {
    fn begin(inner: &'a Inner) -> Self {
        let previous = inner.state.send_replace(AuthState::Authenticating);
        Self { inner, previous: Some(previous) }
    }

    fn commit(mut self, next: AuthState) {
        self.previous = None;
        self.inner.state.send_replace(next);
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        let Some(previous) = self.previous.take() else {
            return;
        };
        let has_token = matches!(self.inner.tokens.load(), Ok(Some(_)));

        self.inner.state.send_if_modified(|state| {
            if *state != AuthState::Authenticating {
                return false;
            }
            *state = match previous {
                AuthState::Authenticated(user) if has_token => AuthState::Authenticated(user),
                _ => AuthState::Unauthenticated,
            };
            true
        });
    }
}
