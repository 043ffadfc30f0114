use std::fmt;

use crate::session::AuthState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    History,
    Login,
    Register,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::History => "/history",
            Route::Login => "/login",
            Route::Register => "/register",
        }
    }

    pub const fn all() -> &'static [Route] {
        &[Route::Home, Route::History, Route::Login, Route::Register]
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::History)
    }

    /// Where a visit to this route actually lands for the given session.
    pub fn resolve(self, state: &AuthState) -> Route {
        if self.requires_auth() && !state.is_authenticated() {
            Route::Login
        } else {
            self
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Route {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let path = value.trim().trim_end_matches('/').to_lowercase();

        match path.as_str() {
            "" | "/home" | "home" => Ok(Route::Home),
            "/history" | "history" => Ok(Route::History),
            "/login" | "login" => Ok(Route::Login),
            "/register" | "register" => Ok(Route::Register),
            _ => Err(anyhow::anyhow!(
                "Unknown route '{value}'. Known routes: /, /history, /login, /register."
            )),
        }
    }
}

/// Outcome of guarding a protected view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<V> {
    Render(V),
    Redirect(Route),
}

impl<V> Guarded<V> {
    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Guarded<U> {
        match self {
            Guarded::Render(view) => Guarded::Render(f(view)),
            Guarded::Redirect(route) => Guarded::Redirect(route),
        }
    }

    pub fn into_view(self) -> Option<V> {
        match self {
            Guarded::Render(view) => Some(view),
            Guarded::Redirect(_) => None,
        }
    }
}

/// Render `view` only for an authenticated session, otherwise send the
/// visitor to the login view. Depends on `state` alone.
pub fn protect<V>(state: &AuthState, view: V) -> Guarded<V> {
    if state.is_authenticated() {
        Guarded::Render(view)
    } else {
        Guarded::Redirect(Route::Login)
    }
}
