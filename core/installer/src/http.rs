//! HTTP fetch capability.
//!
//! The catalog and the fetcher only need "GET this URL and give me a status,
//! a length and a body stream". [`Transport`] captures exactly that so both
//! can be driven by an in-memory fake in tests.

use std::fmt;
use std::io::Read;

use tracing::debug;

use crate::config::HttpConfig;
use crate::errors::{InstallError, Result};

/// Response to a GET request. The body is streamed, never buffered whole.
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `Content-Length` header, if present and numeric.
    pub content_length: Option<u64>,
    /// Response body.
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    /// Returns `true` for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Blocking HTTP GET.
///
/// Implementations report transport failures as [`InstallError::Network`]
/// and never interpret the status code; that is up to the caller.
pub trait Transport {
    /// Performs a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Network`] if the request could not be sent or
    /// no response headers were received.
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// [`Transport`] backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Builds a client honoring the timeout, user agent and proxy in `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the proxy URL is invalid or the TLS
    /// backend cannot be initialized.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone());

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::https(proxy).map_err(|e| InstallError::Config {
                message: format!("invalid proxy URL: {proxy}"),
                source: Some(Box::new(e)),
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| InstallError::Config {
            message: "failed to create HTTP client".to_string(),
            source: Some(Box::new(e)),
        })?;

        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| InstallError::network(url, e))?;

        Ok(HttpResponse {
            status: response.status().as_u16(),
            content_length: response.content_length(),
            body: Box::new(response),
        })
    }
}
