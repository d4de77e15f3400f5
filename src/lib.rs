//! # mediaws
//!
//! Resilient Rust client SDK for the CustomerMedia web service:
//! - Authenticated XML/JSON exchanges over HTTP (Basic auth)
//! - Automatic retries with capped exponential backoff and jitter
//! - A closed error taxonomy that makes retry eligibility a field read
//! - Cooperative cancellation of backoff waits
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mediaws::{Client, Config, Credentials, RequestSpec};
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(serde::Deserialize)]
//! struct Contract { id: u64 }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::builder(
//!         "https://20.0.0.55:8443",
//!         Credentials::new("svc_user", "svc_pass"),
//!     )
//!     .base_path("/CustomerMediaWebService")
//!     .build();
//!
//!     let client = Client::new(config)?;
//!     let spec = RequestSpec::new(http::Method::GET, "/contracts/42");
//!     let contract: Option<Contract> = client
//!         .execute(&CancellationToken::new(), &spec, None::<&()>)
//!         .await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub use client::Client;
pub use config::{Config, ConfigBuilder, Credentials, RetryPolicy};
pub use error::{Error, ErrorKind, Result};
pub use http::{Format, RequestSpec, Transport};
pub use retry::Retryer;

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod retry;

/// SDK version, taken from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
