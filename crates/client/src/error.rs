use platformops_core::error::CoreError;

use crate::storage::StorageError;

/// Errors surfaced by API calls.
///
/// Transport failures and non-2xx statuses are the only failures a view
/// shows as an error; envelope mismatches are absorbed by the decoders.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("API error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A strictly typed endpoint returned a body of the wrong shape.
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request was rejected before it was sent.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Session storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// HTTP status of a [`ApiError::Status`] failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display_includes_body() {
        let err = ApiError::Status {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "API error (500): boom");
        assert_eq!(err.status(), Some(500));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn transport_error_display() {
        let req_err = reqwest::Client::new().get("://bad").build().unwrap_err();
        let err = ApiError::Transport(req_err);
        assert!(err.to_string().contains("HTTP request failed"));
        assert_eq!(err.status(), None);
    }
}
