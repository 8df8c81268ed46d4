//! Backend endpoint configuration.
//!
//! The base URL is an explicitly constructed value passed by `Arc` into
//! every client that needs it. There is no process-wide holder: tests and
//! multi-environment builds construct their own `BackendConfig` and hand
//! it to the components they own.

use url::Url;

use crate::error::{NetError, NetResult};

/// Base configuration for every backend call.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    base_url: Url,
}

impl BackendConfig {
    /// Create a configuration from a base URL string.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Config`] if the URL does not parse or cannot be
    /// a base (e.g. `mailto:`).
    pub fn new(base_url: &str) -> NetResult<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| NetError::Config(format!("invalid base url {base_url:?}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(NetError::Config(format!("base url {base_url:?} cannot be a base")));
        }
        Ok(Self { base_url: url })
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a full request URL by appending an endpoint path segment.
    ///
    /// The endpoint is appended to the base path, so a base of
    /// `https://api.example.com/v1` and an endpoint of `/users` resolve to
    /// `https://api.example.com/v1/users`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Config`] if the joined value is not a valid URL.
    pub fn endpoint_url(&self, endpoint: &str) -> NetResult<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        Url::parse(&joined)
            .map_err(|e| NetError::Config(format!("invalid endpoint {endpoint:?}: {e}")))
    }
}
