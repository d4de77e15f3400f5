//! Client facade composing the transport and the retry engine.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::http::{RequestSpec, Transport};
use crate::retry::Retryer;

/// Client for the CustomerMedia web service.
///
/// Holds validated, immutable configuration plus the transport and retry
/// engine built from it. Domain services build a [`RequestSpec`] and run it
/// through [`Client::execute`]; each call executes one operation and
/// reports one outcome.
#[derive(Debug, Clone)]
pub struct Client {
    config: Config,
    transport: Transport,
    retryer: Retryer,
}

impl Client {
    /// Create a client from configuration.
    ///
    /// The configuration is validated once here; construction fails with a
    /// `Validation`-kind error when it is unusable.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let transport = Transport::new(&config)?;
        let retryer = Retryer::new(config.retry.clone());

        info!(endpoint = %config.endpoint, "client initialized");

        Ok(Self {
            config,
            transport,
            retryer,
        })
    }

    /// Execute one exchange under the configured retry policy.
    ///
    /// The request is rebuilt from `spec` on every attempt; `Ok(None)`
    /// means the service answered with an empty success body.
    pub async fn execute<B, T>(
        &self,
        cancel: &CancellationToken,
        spec: &RequestSpec,
        body: Option<&B>,
    ) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.retryer
            .execute(cancel, || self.transport.exchange(spec, body))
            .await
    }

    /// Execute one exchange, discarding the response body (delete-style
    /// operations with no decode target).
    pub async fn send<B>(
        &self,
        cancel: &CancellationToken,
        spec: &RequestSpec,
        body: Option<&B>,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.retryer
            .execute(cancel, || self.transport.send(spec, body))
            .await
    }

    /// Check connectivity to the service's health endpoint, retrying under
    /// the configured policy.
    pub async fn ping(&self, cancel: &CancellationToken) -> Result<()> {
        self.retryer
            .execute(cancel, || self.transport.ping())
            .await
    }

    /// The client configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying transport (for callers composing their own retry).
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// The retry engine.
    pub fn retryer(&self) -> &Retryer {
        &self.retryer
    }
}
