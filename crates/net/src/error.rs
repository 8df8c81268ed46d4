//! Error types for the networking layer.
//!
//! Every failure is reported to the immediate caller through `Result`
//! values (and, at the operation layer, the failure callback). Nothing is
//! retried or recovered internally; user-visible handling is up to the
//! consuming application.

use thiserror::Error;

use crate::operation::OperationState;

/// Standard result type for the networking layer.
pub type NetResult<T> = Result<T, NetError>;

/// Errors surfaced by the transport, client, token store, and operation
/// lifecycle.
#[derive(Debug, Error)]
pub enum NetError {
    /// Underlying network failure (DNS, timeout, connection reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// Request parameters could not be encoded as JSON.
    #[error("could not serialize request parameters: {0}")]
    Serialization(String),

    /// The server answered with a status code outside the success range.
    ///
    /// Covers both the classified failure range (400-498) and codes the
    /// protocol leaves unclassified (299, 3xx, 499, 5xx); see
    /// [`crate::transport::StatusClass`] for the classification policy.
    #[error("request failed with status {code}")]
    Status {
        /// HTTP status code of the response.
        code: u16,
        /// Response body, when one was present and readable.
        body: Option<String>,
    },

    /// A response body was present but was not valid JSON.
    #[error("cannot parse response: {0}")]
    Parse(String),

    /// The call was cancelled before a response was delivered.
    #[error("operation cancelled")]
    Cancelled,

    /// A lifecycle event was applied in a state that does not accept it.
    #[error("invalid transition: {event} from {from}")]
    InvalidTransition {
        /// State the operation was in when the event arrived.
        from: OperationState,
        /// The rejected event, e.g. `start`.
        event: &'static str,
    },

    /// Invalid configuration, e.g. an unparseable base URL.
    #[error("configuration error: {0}")]
    Config(String),

    /// The backing token store failed to read or write.
    #[error("token store error: {0}")]
    TokenStore(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_status_code() {
        let err = NetError::Status { code: 404, body: Some("not found".into()) };
        assert_eq!(err.to_string(), "request failed with status 404");
    }

    #[test]
    fn display_for_invalid_transition_names_state_and_event() {
        let err = NetError::InvalidTransition { from: OperationState::Finished, event: "start" };
        assert_eq!(err.to_string(), "invalid transition: start from Finished");
    }

    #[test]
    fn parse_error_is_distinct_from_transport_error() {
        let parse = NetError::Parse("expected value".into());
        assert!(matches!(parse, NetError::Parse(_)));
        assert!(parse.to_string().starts_with("cannot parse response"));
    }
}
