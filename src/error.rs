//! Error taxonomy for the CustomerMedia SDK.
//!
//! Every failure surfaced by this crate is an [`Error`] carrying a closed
//! [`ErrorKind`] tag. Retry eligibility is a direct field read on the kind,
//! never an inspection of message text or a downcast of a wrapped error.

use std::fmt;
use std::time::Duration;

use thiserror::Error as ThisError;

/// Result type alias for operations that can fail with an SDK error.
pub type Result<T> = std::result::Result<T, Error>;

/// Closed classification tag for a failure.
///
/// The kind determines retry eligibility and lets callers branch on the
/// failure category (e.g. surface `RateLimit` distinctly from `Validation`)
/// without depending on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed request or rejected payload (HTTP 400).
    Validation,
    /// Credentials were missing or wrong (HTTP 401).
    Authentication,
    /// Credentials were valid but access was denied (HTTP 403).
    Authorization,
    /// The addressed resource does not exist (HTTP 404).
    NotFound,
    /// Connect/timeout/transport failure; no response was obtained.
    Network,
    /// The service throttled the caller (HTTP 429).
    RateLimit,
    /// The service is temporarily unavailable (HTTP 503).
    ServiceUnavailable,
    /// Any other server-side or unexpected failure.
    Internal,
    /// Failure in an attached database collaborator.
    Database,
    /// The caller's cancellation token fired during a backoff wait.
    Cancelled,
}

impl ErrorKind {
    /// Map an HTTP status code to an error kind.
    ///
    /// Unknown codes (and anything else >= 400) default to `Internal`;
    /// this never fails.
    pub fn classify(status: u16) -> Self {
        match status {
            400 => ErrorKind::Validation,
            401 => ErrorKind::Authentication,
            403 => ErrorKind::Authorization,
            404 => ErrorKind::NotFound,
            429 => ErrorKind::RateLimit,
            503 => ErrorKind::ServiceUnavailable,
            _ => ErrorKind::Internal,
        }
    }

    /// Whether re-attempting the failed operation is expected to plausibly
    /// succeed. Only transient conditions qualify; everything else is
    /// terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::RateLimit | ErrorKind::ServiceUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Authorization => "authorization",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Network => "network",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::Internal => "internal",
            ErrorKind::Database => "database",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Classified SDK error.
///
/// Created at the point of failure (request construction, the exchange
/// itself, or response mapping). The kind is fixed at construction; the
/// status code may be attached afterwards with [`Error::with_status`].
#[derive(Debug, ThisError)]
#[error("[{kind}] {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: Option<u16>,
    retry_after: Option<Duration>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            retry_after: None,
            source: None,
        }
    }

    /// Attach the HTTP status code that produced this error.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach a server-supplied retry-after hint.
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// Attach the underlying cause.
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// A validation failure (bad input, rejected payload).
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// A network-level failure wrapping its underlying cause.
    pub fn network(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::new(ErrorKind::Network, message).with_source(source)
    }

    /// An internal failure (unexpected server behavior, undecodable body).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// The distinct outcome returned when a cancellation token fires during
    /// a backoff wait. Supersedes the pending operation error entirely.
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "operation cancelled during backoff wait")
    }

    /// Build a classified error from a non-success HTTP response.
    ///
    /// Attempts to parse the structured error payload
    /// `{"error":{"code","message","details"}}`; falls back to the raw body
    /// text as the message. For 429/503 the `Retry-After` header (seconds)
    /// is captured as the retry hint when present.
    pub fn from_response(status: u16, body: &str, headers: &http::HeaderMap) -> Self {
        let message = match serde_json::from_str::<ApiErrorPayload>(body) {
            Ok(payload) if !payload.error.message.is_empty() => payload.error.message,
            _ => body.to_string(),
        };

        let kind = ErrorKind::classify(status);
        let mut err = Error::new(kind, message).with_status(status);

        if matches!(kind, ErrorKind::RateLimit | ErrorKind::ServiceUnavailable) {
            if let Some(retry_after) = parse_retry_after(headers) {
                err = err.with_retry_after(retry_after);
            }
        }

        err
    }

    /// The classification tag.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status code, when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Server-supplied retry-after hint, when present.
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    /// Whether this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

// Structured error payload returned by the service.

#[derive(Debug, serde::Deserialize)]
struct ApiErrorPayload {
    error: ApiErrorDetails,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ApiErrorDetails {
    #[allow(dead_code)]
    code: String,
    message: String,
    #[allow(dead_code)]
    details: String,
}

fn parse_retry_after(headers: &http::HeaderMap) -> Option<Duration> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_maps_known_statuses() {
        assert_eq!(ErrorKind::classify(400), ErrorKind::Validation);
        assert_eq!(ErrorKind::classify(401), ErrorKind::Authentication);
        assert_eq!(ErrorKind::classify(403), ErrorKind::Authorization);
        assert_eq!(ErrorKind::classify(404), ErrorKind::NotFound);
        assert_eq!(ErrorKind::classify(429), ErrorKind::RateLimit);
        assert_eq!(ErrorKind::classify(503), ErrorKind::ServiceUnavailable);
    }

    #[test]
    fn classify_defaults_to_internal() {
        assert_eq!(ErrorKind::classify(500), ErrorKind::Internal);
        assert_eq!(ErrorKind::classify(418), ErrorKind::Internal);
        assert_eq!(ErrorKind::classify(599), ErrorKind::Internal);
    }

    #[test]
    fn retryability_per_kind() {
        assert!(ErrorKind::Network.is_retryable());
        assert!(ErrorKind::RateLimit.is_retryable());
        assert!(ErrorKind::ServiceUnavailable.is_retryable());

        assert!(!ErrorKind::Validation.is_retryable());
        assert!(!ErrorKind::Authentication.is_retryable());
        assert!(!ErrorKind::Authorization.is_retryable());
        assert!(!ErrorKind::NotFound.is_retryable());
        assert!(!ErrorKind::Internal.is_retryable());
        assert!(!ErrorKind::Database.is_retryable());
        assert!(!ErrorKind::Cancelled.is_retryable());
    }

    #[test]
    fn from_response_parses_structured_payload() {
        let body =
            r#"{"error":{"code":"CM-102","message":"contract not found","details":"id=42"}}"#;
        let err = Error::from_response(404, body, &http::HeaderMap::new());

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "contract not found");
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_retryable());
    }

    #[test]
    fn from_response_falls_back_to_raw_body() {
        let err = Error::from_response(500, "Internal Server Error", &http::HeaderMap::new());

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.message(), "Internal Server Error");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn from_response_captures_retry_after_header() {
        let mut headers = http::HeaderMap::new();
        headers.insert("retry-after", "7".parse().unwrap());

        let err = Error::from_response(429, "{}", &headers);
        assert_eq!(err.kind(), ErrorKind::RateLimit);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
        assert!(err.is_retryable());

        let err = Error::from_response(503, "down for maintenance", &headers);
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn retry_after_ignored_for_terminal_kinds() {
        let mut headers = http::HeaderMap::new();
        headers.insert("retry-after", "7".parse().unwrap());

        let err = Error::from_response(400, "bad field", &headers);
        assert_eq!(err.retry_after(), None);
    }

    #[test]
    fn source_is_chained() {
        let io = std::io::Error::other("connection reset");
        let err = Error::network("HTTP request failed", io);

        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("[network]"));
    }

    #[test]
    fn display_includes_kind_tag() {
        let err = Error::validation("missing contract id").with_status(400);
        assert_eq!(err.to_string(), "[validation] missing contract id");
    }
}
