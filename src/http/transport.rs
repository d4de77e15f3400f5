//! Wire transport for the CustomerMedia service.
//!
//! [`Transport`] performs one authenticated request/response exchange per
//! call and normalizes every failure path into the error taxonomy before it
//! reaches the retry engine. It is stateless aside from fixed configuration
//! and safe for unlimited concurrent use.

use http::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::{Error, ErrorKind, Result};

/// XML declaration prepended to serialized XML bodies.
const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("mediaws-sdk/", env!("CARGO_PKG_VERSION"));

/// Wire serialization format for a request/response pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// XML with a declaration header (the service default).
    #[default]
    Xml,
    /// JSON.
    Json,
}

impl Format {
    /// The matching Content-Type header value.
    pub fn content_type(&self) -> &'static str {
        match self {
            Format::Xml => "application/xml",
            Format::Json => "application/json",
        }
    }
}

/// One request to perform, built once per attempt.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// HTTP method.
    pub method: Method,
    /// Path below the configured base path, e.g. `/contracts/42`.
    pub path: String,
    /// Body/response serialization format.
    pub format: Format,
    /// Correlation identifier, propagated as the `X-Request-ID` header.
    pub request_id: Option<String>,
}

impl RequestSpec {
    /// Create a spec with the default (XML) format.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            format: Format::default(),
            request_id: None,
        }
    }

    /// Select the serialization format.
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Attach a correlation identifier.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Performs authenticated exchanges against the service.
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    endpoint: String,
    base_path: String,
    auth_header: String,
}

impl Transport {
    /// Build a transport from validated configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| Error::internal("failed to build HTTP client").with_source(e))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            base_path: config.base_path.clone(),
            auth_header: config.credentials.basic_auth_value(),
        })
    }

    /// Perform one exchange and decode the response body into `T`.
    ///
    /// Returns `Ok(None)` when the response body is empty (e.g. a 200 from
    /// a delete); otherwise the body is decoded per the spec's format and a
    /// decode failure yields an `Internal`-kind error.
    pub async fn exchange<B, T>(&self, spec: &RequestSpec, body: Option<&B>) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let raw = self.perform(spec, body).await?;
        if raw.is_empty() {
            return Ok(None);
        }

        let decoded = match spec.format {
            Format::Xml => quick_xml::de::from_str(&raw)
                .map_err(|e| Error::internal("failed to parse XML response").with_source(e))?,
            Format::Json => serde_json::from_str(&raw)
                .map_err(|e| Error::internal("failed to parse JSON response").with_source(e))?,
        };

        Ok(Some(decoded))
    }

    /// Perform one exchange and discard the response body without decoding.
    pub async fn send<B>(&self, spec: &RequestSpec, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.perform(spec, body).await.map(|_| ())
    }

    /// Health check: GET `<endpoint>/health` with the standard auth
    /// headers. Anything but 200 is reported as `ServiceUnavailable`.
    pub async fn ping(&self) -> Result<()> {
        let url = format!("{}/health", self.endpoint);
        let response = self
            .client
            .get(&url)
            .header(http::header::AUTHORIZATION, self.auth_header.as_str())
            .header(http::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| map_dispatch_error("service ping failed", e))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(Error::new(
                ErrorKind::ServiceUnavailable,
                format!("health endpoint returned status {status}"),
            )
            .with_status(status));
        }

        Ok(())
    }

    /// Build, dispatch, and read one exchange, returning the raw body of a
    /// success response. Every failure path comes back as a classified
    /// error; raw transport errors never escape this method.
    async fn perform<B>(&self, spec: &RequestSpec, body: Option<&B>) -> Result<String>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}{}", self.endpoint, self.base_path, spec.path);

        // Serialization failure is a Validation error and skips the call.
        let payload = match body {
            Some(body) => Some(encode_body(spec.format, body)?),
            None => None,
        };

        let mut request = self
            .client
            .request(spec.method.clone(), &url)
            .header(http::header::AUTHORIZATION, self.auth_header.as_str())
            .header(http::header::ACCEPT, "application/xml")
            .header(http::header::USER_AGENT, USER_AGENT);

        if let Some(request_id) = &spec.request_id {
            request = request.header("X-Request-ID", request_id.as_str());
        }

        if let Some(payload) = payload {
            request = request
                .header(http::header::CONTENT_TYPE, spec.format.content_type())
                .body(payload);
        }

        debug!(method = %spec.method, url = %url, "making HTTP request");

        let response = request.send().await.map_err(|e| {
            error!(method = %spec.method, url = %url, error = %e, "HTTP request failed");
            map_dispatch_error("HTTP request failed", e)
        })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let raw = response
            .text()
            .await
            .map_err(|e| Error::network("failed to read response body", e))?;

        debug!(method = %spec.method, url = %url, status, "received HTTP response");

        if status >= 400 {
            return Err(Error::from_response(status, &raw, &headers));
        }

        Ok(raw)
    }
}

fn encode_body<B: Serialize + ?Sized>(format: Format, body: &B) -> Result<Vec<u8>> {
    match format {
        Format::Xml => {
            let xml = quick_xml::se::to_string(body)
                .map_err(|e| Error::validation("failed to serialize XML request body").with_source(e))?;
            Ok(format!("{XML_DECLARATION}{xml}").into_bytes())
        }
        Format::Json => serde_json::to_vec(body)
            .map_err(|e| Error::validation("failed to serialize JSON request body").with_source(e)),
    }
}

// No response was obtained: everything here is a Network-kind failure,
// with the reqwest cause preserved for inspection.
fn map_dispatch_error(context: &str, err: reqwest::Error) -> Error {
    let message = if err.is_timeout() {
        format!("{context}: request timed out")
    } else if err.is_connect() {
        format!("{context}: connection failed")
    } else {
        context.to_string()
    };
    Error::network(message, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Contract {
        id: u64,
        label: String,
    }

    #[test]
    fn format_content_types() {
        assert_eq!(Format::Xml.content_type(), "application/xml");
        assert_eq!(Format::Json.content_type(), "application/json");
        assert_eq!(Format::default(), Format::Xml);
    }

    #[test]
    fn request_spec_builder() {
        let spec = RequestSpec::new(Method::POST, "/contracts")
            .with_format(Format::Json)
            .with_request_id("req-123");

        assert_eq!(spec.method, Method::POST);
        assert_eq!(spec.path, "/contracts");
        assert_eq!(spec.format, Format::Json);
        assert_eq!(spec.request_id.as_deref(), Some("req-123"));
    }

    #[test]
    fn xml_body_carries_declaration() {
        let contract = Contract {
            id: 42,
            label: "gate-a".into(),
        };
        let encoded = encode_body(Format::Xml, &contract).unwrap();
        let text = String::from_utf8(encoded).unwrap();

        assert!(text.starts_with(XML_DECLARATION));
        assert!(text.contains("<Contract>"));
        assert!(text.contains("<id>42</id>"));
    }

    #[test]
    fn json_body_has_no_declaration() {
        let contract = Contract {
            id: 42,
            label: "gate-a".into(),
        };
        let encoded = encode_body(Format::Json, &contract).unwrap();
        let decoded: Contract = serde_json::from_slice(&encoded).unwrap();

        assert_eq!(decoded, contract);
    }

    #[test]
    fn xml_round_trip_is_structurally_equal() {
        let contract = Contract {
            id: 7,
            label: "visitor".into(),
        };
        let encoded = encode_body(Format::Xml, &contract).unwrap();
        let text = String::from_utf8(encoded).unwrap();
        let decoded: Contract = quick_xml::de::from_str(&text).unwrap();

        assert_eq!(decoded, contract);
    }
}
