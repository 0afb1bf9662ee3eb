//! HTTP range source.

use crate::client::{HttpClient, HttpResponse};
use crate::config::HttpConfig;
use crate::error::HttpError;
use parking_lot::RwLock;
use rangevfs_core::{AccessFlags, RangeSource, RemoteStat, TransportError};
use tracing::{debug, trace, warn};

/// Status a `HEAD` request must return for the resource to be accessible.
pub const STATUS_OK: u16 = 200;

/// Status a range `GET` must return.
pub const STATUS_PARTIAL_CONTENT: u16 = 206;

/// A [`RangeSource`] that talks HTTP.
///
/// - `stat` sends `HEAD`. Anything but 200 reports the resource as
///   inaccessible with size 0. The size is taken from `Content-Length`, and
///   a missing `Accept-Ranges: bytes` marks the resource as not supporting
///   range requests.
/// - `fetch_range` sends `GET` with `Range: bytes=start-end` and requires a
///   206 response whose body is exactly the requested window.
///
/// The last transport failure is kept for diagnostics and cleared by the
/// next successful request.
pub struct HttpSource<C: HttpClient> {
    client: C,
    config: HttpConfig,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpSource<C> {
    /// Creates a source with the default configuration.
    pub fn new(client: C) -> Self {
        Self::with_config(client, HttpConfig::default())
    }

    /// Creates a source with `config`.
    pub fn with_config(client: C, config: HttpConfig) -> Self {
        Self {
            client,
            config,
            last_error: RwLock::new(None),
        }
    }

    /// Returns the client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Returns the last transport error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    fn fail(&self, err: HttpError) -> TransportError {
        warn!(%err, "http transport failure");
        *self.last_error.write() = Some(err.to_string());
        err.into()
    }

    fn clear_error(&self) {
        *self.last_error.write() = None;
    }

    fn content_length(url: &str, response: &HttpResponse) -> Result<u64, HttpError> {
        let value = response.header("Content-Length");
        value
            .and_then(|v| v.trim().parse::<u64>().ok())
            .ok_or_else(|| HttpError::Header {
                url: url.to_string(),
                header: "Content-Length",
                value: value.map(str::to_string),
            })
    }

    fn accepts_byte_ranges(response: &HttpResponse) -> bool {
        response
            .header("Accept-Ranges")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("bytes"))
    }
}

impl<C: HttpClient> RangeSource for HttpSource<C> {
    fn stat(&self, path: &str) -> Result<RemoteStat, TransportError> {
        let url = self.config.resolve(path);
        let response = self.client.head(&url).map_err(|message| {
            self.fail(HttpError::Request {
                url: url.clone(),
                message,
            })
        })?;

        if response.status != STATUS_OK {
            debug!(%url, status = response.status, "resource not accessible");
            self.clear_error();
            return Ok(RemoteStat::INACCESSIBLE);
        }

        let size = Self::content_length(&url, &response).map_err(|e| self.fail(e))?;
        let mut access = AccessFlags::READ_ONLY;
        if !Self::accepts_byte_ranges(&response) {
            access |= AccessFlags::NO_RANGE;
        }

        self.clear_error();
        debug!(%url, size, %access, "stat");
        Ok(RemoteStat::new(access, size))
    }

    fn fetch_range(
        &self,
        path: &str,
        start: u64,
        end_inclusive: u64,
        out: &mut [u8],
    ) -> Result<(), TransportError> {
        let url = self.config.resolve(path);
        trace!(%url, start, end_inclusive, "range request");
        let response = self
            .client
            .get_range(&url, start, end_inclusive)
            .map_err(|message| {
                self.fail(HttpError::Request {
                    url: url.clone(),
                    message,
                })
            })?;

        if response.status != STATUS_PARTIAL_CONTENT {
            return Err(self.fail(HttpError::Status {
                url,
                status: response.status,
                expected: STATUS_PARTIAL_CONTENT,
            }));
        }
        if response.body.len() != out.len() {
            return Err(self.fail(HttpError::BodyLength {
                url,
                expected: out.len(),
                actual: response.body.len(),
            }));
        }

        out.copy_from_slice(&response.body);
        self.clear_error();
        Ok(())
    }
}

impl<C: HttpClient> std::fmt::Debug for HttpSource<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSource")
            .field("config", &self.config)
            .field("last_error", &self.last_error())
            .finish()
    }
}
