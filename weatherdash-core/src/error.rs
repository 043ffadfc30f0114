use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single backend round-trip.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("backend responded with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to reach backend")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse backend response")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub(crate) fn status(status: StatusCode, body: &str) -> Self {
        Self::Status { status, body: truncate_body(body) }
    }

    /// HTTP status of the failed response, if the backend answered at all.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            ApiError::Decode(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(StatusCode::NOT_FOUND)
    }
}

/// Errors surfaced by the dashboard flows.
///
/// Suggestion failures and the expected 401 on logout never show up here:
/// both are logged and dropped where they happen.
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected locally, the network was never contacted.
    #[error("{0}")]
    Validation(&'static str),

    #[error("City not found. Please try again.")]
    NotFound {
        city: String,
        #[source]
        source: ApiError,
    },

    /// Login or registration failed. Bad credentials and transport failures
    /// are deliberately not distinguished.
    #[error("authentication failed")]
    Auth(#[source] ApiError),

    #[error("authentication required")]
    Unauthenticated,

    #[error(transparent)]
    Network(#[from] ApiError),

    #[error("token storage failed")]
    Storage(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_body_is_truncated() {
        let body = "x".repeat(500);
        let err = ApiError::status(StatusCode::BAD_GATEWAY, &body);

        let ApiError::Status { body, .. } = &err else {
            panic!("expected status error, got {err:?}");
        };
        assert_eq!(body.len(), 203);
        assert!(body.ends_with("..."));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let body = "é".repeat(300);
        let err = ApiError::status(StatusCode::BAD_REQUEST, &body);
        assert!(err.to_string().contains("..."));
    }

    #[test]
    fn status_helpers() {
        let err = ApiError::status(StatusCode::UNAUTHORIZED, "");
        assert!(err.is_unauthorized());
        assert!(!err.is_not_found());
        assert_eq!(err.status_code(), Some(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn not_found_message_is_user_facing() {
        let err = Error::NotFound {
            city: "Nowhereville".into(),
            source: ApiError::status(StatusCode::NOT_FOUND, "{}"),
        };
        assert_eq!(err.to_string(), "City not found. Please try again.");
    }
}
