//! HTTP fetcher that opens a response body stream for one target.
//!
//! The fetcher only validates the response; it never reads the body. The
//! caller receives a [`FetchOutcome`] that owns the response, and the
//! connection is released when that outcome (or the stream taken from it) is
//! dropped.

use std::time::Duration;

use futures_util::{Stream, TryStreamExt};
use reqwest::Client;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use url::Url;

use super::constants::FETCH_TIMEOUT;
use super::error::{DispatchError, DownloadError};
use super::outcome::Target;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Status codes treated as a successful fetch.
pub const ACCEPTED_STATUSES: [StatusCode; 4] = [
    StatusCode::OK,
    StatusCode::MOVED_PERMANENTLY,
    StatusCode::FOUND,
    StatusCode::PARTIAL_CONTENT,
];

/// Returns `Ok(())` when the status is in the accepted set, otherwise an
/// [`DownloadError::HttpStatus`] carrying the code.
///
/// # Errors
///
/// Returns [`DownloadError::HttpStatus`] for every status outside
/// 200, 206, 301 and 302.
pub fn classify_status(url: &str, status: u16) -> Result<(), DownloadError> {
    if ACCEPTED_STATUSES.iter().any(|s| s.as_u16() == status) {
        Ok(())
    } else {
        Err(DownloadError::http_status(url, status))
    }
}

/// An accepted response whose body has not been read yet.
#[derive(Debug)]
pub struct FetchOutcome {
    target: Target,
    status: u16,
    content_length: Option<u64>,
    response: reqwest::Response,
}

impl FetchOutcome {
    /// The target that was fetched.
    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The accepted HTTP status.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Body size announced by the server; `None` means unknown size.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Consumes the outcome and returns the body as a byte stream.
    ///
    /// Transport errors surface as `std::io::Error` so the stream writer can
    /// treat network and disk failures alike. A deadline passing mid-body
    /// keeps the [`std::io::ErrorKind::TimedOut`] kind.
    pub fn into_body_stream(
        self,
    ) -> impl Stream<Item = std::io::Result<impl AsRef<[u8]> + Send>> + Send {
        self.response.bytes_stream().map_err(body_error)
    }
}

fn body_error(error: reqwest::Error) -> std::io::Error {
    if error.is_timeout() {
        std::io::Error::new(std::io::ErrorKind::TimedOut, error)
    } else {
        std::io::Error::other(error)
    }
}

/// HTTP client wrapper issuing GET requests with a fixed timeout.
///
/// Created once per run and shared by all workers; cloning is cheap and
/// reuses the connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    /// Creates a fetcher with the default 30 second timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Client`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, DispatchError> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    /// Creates a fetcher with an explicit request timeout.
    ///
    /// The timeout spans the whole request, body included.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Client`] if the HTTP client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(DispatchError::Client)?;
        Ok(Self { client, timeout })
    }

    /// Returns the configured request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issues a GET for the target and validates the response status.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidUrl`] if the URL cannot be parsed
    /// - [`DownloadError::Timeout`] / [`DownloadError::Network`] on transport failure
    /// - [`DownloadError::HttpStatus`] for statuses outside the accepted set
    /// - [`DownloadError::Cancelled`] if `cancel` fires before the response arrives
    #[instrument(skip(self, cancel), fields(url = %target))]
    pub async fn fetch(
        &self,
        target: &Target,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, DownloadError> {
        let result = self.fetch_inner(target, cancel).await;
        if let Err(e) = &result {
            warn!(url = %target, error = %e, "fetch failed");
        }
        result
    }

    async fn fetch_inner(
        &self,
        target: &Target,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, DownloadError> {
        let url = target.url();
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
            sent = self.client.get(parsed).send() => {
                sent.map_err(|e| DownloadError::network(url, e))?
            }
        };

        let status = response.status().as_u16();
        // A rejected response is dropped here, which closes its body.
        classify_status(url, status)?;

        let content_length = response.content_length();
        debug!(status, ?content_length, "response accepted");

        Ok(FetchOutcome {
            target: target.clone(),
            status,
            content_length,
            response,
        })
    }
}
