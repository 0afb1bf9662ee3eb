//! HTTP client abstraction and the `reqwest` implementation.

use crate::config::HttpConfig;
use crate::error::{HttpError, HttpResult};
use reqwest::header::RANGE;

/// A received HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response headers in received order.
    pub headers: Vec<(String, String)>,
    /// Response body. Empty for `HEAD`.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response with no headers and no body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the first value of a header, matching the name case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. Requests are
/// synchronous: the engine blocks on every read.
pub trait HttpClient: Send + Sync {
    /// Sends a `HEAD` request.
    fn head(&self, url: &str) -> Result<HttpResponse, String>;

    /// Sends a `GET` request with `Range: bytes=start-end_inclusive`.
    fn get_range(&self, url: &str, start: u64, end_inclusive: u64)
        -> Result<HttpResponse, String>;
}

/// Blocking [`HttpClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Builds a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend or client cannot be initialized.
    pub fn new(config: &HttpConfig) -> HttpResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    fn collect(response: reqwest::blocking::Response, with_body: bool) -> Result<HttpResponse, String> {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = if with_body {
            response.bytes().map_err(|e| e.to_string())?.to_vec()
        } else {
            Vec::new()
        };
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl HttpClient for ReqwestClient {
    fn head(&self, url: &str) -> Result<HttpResponse, String> {
        let response = self.client.head(url).send().map_err(|e| e.to_string())?;
        Self::collect(response, false)
    }

    fn get_range(
        &self,
        url: &str,
        start: u64,
        end_inclusive: u64,
    ) -> Result<HttpResponse, String> {
        let response = self
            .client
            .get(url)
            .header(RANGE, format!("bytes={start}-{end_inclusive}"))
            .send()
            .map_err(|e| e.to_string())?;
        Self::collect(response, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(200)
            .with_header("content-length", "4096")
            .with_header("Accept-Ranges", "bytes");

        assert_eq!(response.header("Content-Length"), Some("4096"));
        assert_eq!(response.header("accept-ranges"), Some("bytes"));
        assert_eq!(response.header("ETag"), None);
    }

    #[test]
    fn first_header_wins() {
        let response = HttpResponse::new(200)
            .with_header("Accept-Ranges", "none")
            .with_header("Accept-Ranges", "bytes");
        assert_eq!(response.header("accept-ranges"), Some("none"));
    }

    #[test]
    fn reqwest_client_builds() {
        assert!(ReqwestClient::new(&HttpConfig::default()).is_ok());
    }
}
