use thiserror::Error;

/// Result type alias for connector operations.
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Errors surfaced to the caller of a query.
///
/// Nothing here is retried or suppressed: a query either yields its row or
/// fails with exactly one of these.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// No API key could be resolved from configuration or environment.
    #[error(
        "missing API key: set `api_key` in the connection config or the PDL_API_KEY environment variable"
    )]
    MissingCredential,

    /// None of the identity key columns was supplied.
    #[error("at least one key column (email, phone, profile, name) must be provided")]
    MissingPredicate,

    /// The upstream could not be reached, timed out, or the body could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The enclosing query was cancelled while the request was outstanding.
    #[error("request cancelled")]
    Cancelled,

    /// The upstream answered with a status code >= 400.
    #[error("received error response {status}: {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Raw response body text, not parsed.
        body: String,
    },

    /// The response body is not a JSON object.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request payload could not be serialized.
    #[error("failed to encode request: {0}")]
    Encoding(#[source] serde_json::Error),

    /// The host-supplied connection configuration is malformed.
    #[error("invalid connection config: {0}")]
    InvalidConfig(String),

    /// The query named a table this plugin does not register.
    #[error("unknown table: {0}")]
    UnknownTable(String),
}

impl ConnectorError {
    /// Returns the upstream status code, if this is an upstream failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ConnectorError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error came from the query being cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConnectorError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_names_both_sources() {
        let msg = ConnectorError::MissingCredential.to_string();
        assert!(msg.contains("api_key"));
        assert!(msg.contains("PDL_API_KEY"));
    }

    #[test]
    fn test_upstream_message_carries_status_and_body() {
        let err = ConnectorError::Upstream {
            status: 404,
            body: r#"{"error":"not_found"}"#.to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(
            err.to_string(),
            r#"received error response 404: {"error":"not_found"}"#
        );
    }

    #[test]
    fn test_cancelled_flag() {
        assert!(ConnectorError::Cancelled.is_cancelled());
        assert!(!ConnectorError::MissingPredicate.is_cancelled());
        assert_eq!(ConnectorError::MissingPredicate.status(), None);
    }
}
