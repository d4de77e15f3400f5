//! Configuration for the CustomerMedia client.
//!
//! Configuration is validated once, before the client is constructed, and
//! treated as immutable afterwards.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};

/// Basic-auth credentials for the CustomerMedia service.
///
/// Credentials are distinct from the host/endpoint; the password is held as
/// a [`SecretString`] so it never appears in debug output.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Username for Basic authentication.
    pub username: String,
    /// Password for Basic authentication.
    pub password: SecretString,
}

impl Credentials {
    /// Create credentials from a username/password pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into().into_boxed_str()),
        }
    }

    pub(crate) fn basic_auth_value(&self) -> String {
        use base64::Engine as _;
        let raw = format!("{}:{}", self.username, self.password.expose_secret());
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw)
        )
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Service endpoint, e.g. `https://20.0.0.55:8443`.
    pub endpoint: String,
    /// Path prefix for service operations, e.g. `/CustomerMediaWebService`.
    pub base_path: String,
    /// Basic-auth credentials.
    pub credentials: Credentials,
    /// Per-call timeout enforced at the transport layer.
    pub timeout: Duration,
    /// Accept self-signed certificates (appliance deployments).
    pub accept_invalid_certs: bool,
    /// Retry behavior.
    pub retry: RetryPolicy,
}

impl Config {
    /// Create a configuration with defaults for everything but endpoint and
    /// credentials.
    pub fn new(endpoint: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            endpoint: endpoint.into(),
            base_path: String::new(),
            credentials,
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
            retry: RetryPolicy::default(),
        }
    }

    /// Start building a configuration with a fluent API.
    pub fn builder(endpoint: impl Into<String>, credentials: Credentials) -> ConfigBuilder {
        ConfigBuilder {
            config: Config::new(endpoint, credentials),
        }
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(Error::validation("endpoint is required"));
        }
        if let Err(e) = url::Url::parse(&self.endpoint) {
            return Err(Error::validation(format!("endpoint is not a valid URL: {e}")));
        }
        if self.credentials.username.is_empty() {
            return Err(Error::validation("auth username is required"));
        }
        if self.credentials.password.expose_secret().is_empty() {
            return Err(Error::validation("auth password is required"));
        }
        if self.timeout.is_zero() {
            return Err(Error::validation("timeout must be greater than 0"));
        }
        Ok(())
    }
}

/// Builder for [`Config`].
#[derive(Debug)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the path prefix for service operations.
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.config.base_path = base_path.into();
        self
    }

    /// Set the per-call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Accept self-signed certificates.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.config.accept_invalid_certs = accept;
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Config {
        self.config
    }
}

/// Retry behavior for the retry engine.
///
/// Validated at construction so the backoff formula never receives
/// degenerate inputs; immutable thereafter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a validated retry policy.
    ///
    /// # Errors
    ///
    /// Returns a `Validation`-kind error when `initial_backoff` is zero,
    /// `max_backoff` is below `initial_backoff`, or `multiplier` is not
    /// strictly positive.
    pub fn new(
        max_retries: u32,
        initial_backoff: Duration,
        max_backoff: Duration,
        multiplier: f64,
    ) -> Result<Self> {
        if initial_backoff.is_zero() {
            return Err(Error::validation("initial backoff must be greater than 0"));
        }
        if max_backoff < initial_backoff {
            return Err(Error::validation(
                "max backoff must be greater than or equal to initial backoff",
            ));
        }
        if !(multiplier > 0.0) {
            return Err(Error::validation("multiplier must be greater than 0"));
        }

        Ok(Self {
            max_retries,
            initial_backoff,
            max_backoff,
            multiplier,
        })
    }

    /// Maximum number of re-attempts after the initial one.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Backoff before the first retry.
    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    /// Cap applied to the exponential growth (before jitter).
    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    /// Exponential growth factor.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn creds() -> Credentials {
        Credentials::new("svc_user", "svc_pass")
    }

    #[test]
    fn default_policy_matches_service_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.initial_backoff(), Duration::from_secs(1));
        assert_eq!(policy.max_backoff(), Duration::from_secs(30));
        assert_eq!(policy.multiplier(), 2.0);
    }

    #[test]
    fn policy_rejects_degenerate_inputs() {
        let err = RetryPolicy::new(3, Duration::ZERO, Duration::from_secs(10), 2.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = RetryPolicy::new(3, Duration::from_secs(5), Duration::from_secs(1), 2.0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(10), 0.0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(10), -1.5)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn policy_allows_zero_retries() {
        let policy =
            RetryPolicy::new(0, Duration::from_secs(1), Duration::from_secs(1), 1.0).unwrap();
        assert_eq!(policy.max_retries(), 0);
    }

    #[test]
    fn config_builder_and_validation() {
        let config = Config::builder("https://20.0.0.55:8443", creds())
            .base_path("/CustomerMediaWebService")
            .timeout(Duration::from_secs(10))
            .accept_invalid_certs(true)
            .build();

        assert!(config.validate().is_ok());
        assert_eq!(config.base_path, "/CustomerMediaWebService");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.accept_invalid_certs);
    }

    #[test]
    fn config_rejects_missing_fields() {
        let config = Config::new("", creds());
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Validation);

        let config = Config::new("20.0.0.55:8443", creds());
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Validation);

        let config = Config::new("https://host", Credentials::new("", "p"));
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Validation);

        let config = Config::new("https://host", Credentials::new("u", ""));
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Validation);

        let mut config = Config::new("https://host", creds());
        config.timeout = Duration::ZERO;
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn basic_auth_value_is_rfc7617_encoded() {
        // base64("svc_user:svc_pass")
        assert_eq!(
            creds().basic_auth_value(),
            "Basic c3ZjX3VzZXI6c3ZjX3Bhc3M="
        );
    }

    #[test]
    fn password_is_redacted_in_debug_output() {
        let rendered = format!("{:?}", creds());
        assert!(!rendered.contains("svc_pass"));
    }
}
