//! HTTP transport.
//!
//! Thin wrapper around a `reqwest` client that issues one request at a
//! time, classifies response status codes, and supports cooperative
//! cancellation. Each [`Transport`] belongs to exactly one client; a new
//! `send` while a call is in flight cancels the previous call
//! (last-write-wins).

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::header::CACHE_CONTROL;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::error::{NetError, NetResult};
use crate::request::Method;

/// Fixed request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Classification of an HTTP response status code.
///
/// The protocol defines success as 200-298 and failure as 400-498. Codes
/// outside both ranges (299, 3xx, 499, 5xx) are unclassified by the
/// protocol; this layer deliberately reports them as failures so that no
/// response ever disappears without a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Failure,
    Unclassified,
}

/// Classify a status code against the protocol's ranges.
#[must_use]
pub fn classify(status: u16) -> StatusClass {
    match status {
        200..=298 => StatusClass::Success,
        400..=498 => StatusClass::Failure,
        _ => StatusClass::Unclassified,
    }
}

/// Issues raw HTTP requests and classifies responses by status code.
pub struct Transport {
    client: reqwest::Client,
    cancel: Mutex<CancellationToken>,
}

impl Transport {
    /// Create a transport with the fixed 10 second timeout.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Config`] if the underlying client cannot be
    /// constructed.
    pub fn new() -> NetResult<Self> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Create a transport with a custom timeout (tests only need this).
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Config`] if the underlying client cannot be
    /// constructed.
    pub fn with_timeout(timeout: Duration) -> NetResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| NetError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self { client, cancel: Mutex::new(CancellationToken::new()) })
    }

    /// Send a single request and classify the response.
    ///
    /// `params`, when present, is JSON-encoded as the request body. Local
    /// and shared caches are bypassed via `Cache-Control`.
    ///
    /// Returns the raw response body on success (`None` when the body is
    /// empty).
    ///
    /// # Errors
    ///
    /// - [`NetError::Serialization`] if the parameters cannot be encoded.
    /// - [`NetError::Transport`] for network-level failures.
    /// - [`NetError::Status`] for responses outside the success range.
    /// - [`NetError::Cancelled`] if [`Transport::cancel`] wins the race.
    pub async fn send(
        &self,
        url: Url,
        method: Method,
        headers: &HashMap<String, String>,
        params: Option<&Map<String, Value>>,
    ) -> NetResult<Option<Vec<u8>>> {
        let body = params
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| NetError::Serialization(e.to_string()))?;

        let mut builder = self
            .client
            .request(method.into(), url.clone())
            .header(CACHE_CONTROL, "no-cache, no-store");
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(bytes) = body {
            builder = builder.body(bytes);
        }

        // Replace the token so a new send cancels any call still in flight.
        let token = {
            let mut guard = self.cancel.lock();
            guard.cancel();
            *guard = CancellationToken::new();
            guard.clone()
        };

        debug!(%method, %url, "sending HTTP request");

        let response = tokio::select! {
            () = token.cancelled() => return Err(NetError::Cancelled),
            result = builder.send() => result.map_err(|e| NetError::Transport(e.to_string()))?,
        };

        let status = response.status().as_u16();
        debug!(%method, %url, status, "received HTTP response");

        match classify(status) {
            StatusClass::Success => {
                let bytes = tokio::select! {
                    () = token.cancelled() => return Err(NetError::Cancelled),
                    result = response.bytes() => {
                        result.map_err(|e| NetError::Transport(e.to_string()))?
                    }
                };
                if bytes.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(bytes.to_vec()))
                }
            }
            class => {
                if class == StatusClass::Unclassified {
                    warn!(status, "unclassified status code, reporting as failure");
                }
                let body = response.text().await.ok().filter(|text| !text.is_empty());
                Err(NetError::Status { code: status, body })
            }
        }
    }

    /// Cancel the in-flight call if one exists; no-op otherwise.
    pub fn cancel(&self) {
        self.cancel.lock().cancel();
    }
}
