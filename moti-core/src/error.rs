//! Error types shared across the core.
//!
//! Two channels exist:
//! - [`FetchError`] is user-facing. Its `Display` output is the message shown to the user.
//! - [`StoreError`] is recoverable. The store logs it and carries on; it never reaches the view.

/// Message used when the provider reports an error without a message.
pub const FALLBACK_NOT_FOUND: &str = "City not found";

/// Classified failure of a weather fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The provider could not resolve the query to a location.
    #[error("City not found! Please use the suggestions shown while typing.")]
    NotFound,

    /// Any other structured provider error, surfaced verbatim.
    #[error("{0}")]
    Provider(String),

    /// The request was sent but no response came back.
    #[error("Network error. Please check your connection.")]
    Network { detail: String },

    /// Malformed response or a client-side failure.
    #[error("An unexpected error occurred")]
    Unexpected { detail: String },
}

impl FetchError {
    /// Classify a provider error message.
    pub fn from_provider_message(message: Option<&str>) -> Self {
        match message.map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) if m.contains("No matching location") => FetchError::NotFound,
            Some(m) => FetchError::Provider(m.to_string()),
            None => FetchError::Provider(FALLBACK_NOT_FOUND.to_string()),
        }
    }

    pub fn network(detail: impl ToString) -> Self {
        FetchError::Network { detail: detail.to_string() }
    }

    pub fn unexpected(detail: impl ToString) -> Self {
        FetchError::Unexpected { detail: detail.to_string() }
    }

    /// Short category name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::NotFound => "not_found",
            FetchError::Provider(_) => "provider",
            FetchError::Network { .. } => "network",
            FetchError::Unexpected { .. } => "unexpected",
        }
    }
}

/// Failure of the key-value persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_matching_location_is_not_found() {
        let err = FetchError::from_provider_message(Some("No matching location found."));
        assert_eq!(err, FetchError::NotFound);
        assert!(err.to_string().contains("City not found"));
    }

    #[test]
    fn other_provider_messages_are_verbatim() {
        let err = FetchError::from_provider_message(Some("API key has been disabled."));
        assert_eq!(err.to_string(), "API key has been disabled.");
    }

    #[test]
    fn missing_provider_message_falls_back() {
        assert_eq!(
            FetchError::from_provider_message(None).to_string(),
            FALLBACK_NOT_FOUND
        );
        assert_eq!(
            FetchError::from_provider_message(Some("  ")).to_string(),
            FALLBACK_NOT_FOUND
        );
    }

    #[test]
    fn network_message_hides_detail() {
        let err = FetchError::network("connection refused");
        assert_eq!(err.to_string(), "Network error. Please check your connection.");
        assert_eq!(err.kind(), "network");
    }
}
