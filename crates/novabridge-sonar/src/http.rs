//! Blocking HTTP transport.

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tracing::trace;

use crate::error::{SonarError, SonarResult};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Put => "PUT",
        })
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self { url: url.into(), status, body: body.into() }
    }

    /// Parse the body as JSON.
    ///
    /// # Errors
    /// Returns [`SonarError::InvalidResponse`] if the body is not JSON.
    pub fn json(&self) -> SonarResult<Value> {
        serde_json::from_str(&self.body).map_err(|e| SonarError::InvalidResponse {
            url: self.url.clone(),
            message: e.to_string(),
        })
    }
}

/// Something that can issue HTTP requests.
///
/// Implementations return [`SonarError::Request`] for transport failures and
/// for non-2xx statuses.
#[cfg_attr(test, mockall::automock)]
pub trait HttpTransport: Send + Sync {
    /// Send a request with an empty body.
    ///
    /// # Errors
    /// Returns an error if the request fails or the status is not 2xx.
    fn request(&self, method: Method, url: &str) -> SonarResult<HttpResponse>;
}

/// [`HttpTransport`] over a blocking reqwest client.
///
/// GG serves its local APIs with a self-signed certificate, so certificate
/// checks are usually disabled.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Build a client.
    ///
    /// # Errors
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration, accept_invalid_certs: bool) -> SonarResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| request_error("client", &e))?;
        Ok(Self { client })
    }
}

fn request_error(url: &str, err: &reqwest::Error) -> SonarError {
    SonarError::Request {
        url: url.to_string(),
        status: err.status().map(|status| status.as_u16()),
        message: err.to_string(),
    }
}

impl HttpTransport for ReqwestTransport {
    fn request(&self, method: Method, url: &str) -> SonarResult<HttpResponse> {
        trace!(%method, url, "Sonar request");
        let builder = match method {
            Method::Get => self.client.get(url),
            Method::Put => self.client.put(url).body(""),
        };
        let response = builder.send().map_err(|e| request_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SonarError::Request {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }
        let body = response.text().map_err(|e| request_error(url, &e))?;
        Ok(HttpResponse::new(url, status.as_u16(), body))
    }
}
