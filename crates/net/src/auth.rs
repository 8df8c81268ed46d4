//! Auth token storage.
//!
//! A single bearer token, persisted under one fixed key and attached to
//! outgoing requests as `X-Api-Auth-Token`. The store is injected into
//! [`crate::client::BackendClient`] as an `Arc<dyn TokenStore>`; there is
//! no process-wide singleton. Every read and write goes through the
//! backing store so that concurrent access is governed by the store's own
//! guarantees.

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{NetError, NetResult};

/// Fixed key the token is persisted under.
pub const TOKEN_KEY: &str = "BackendAuthToken";

/// Persistence interface for the single backend auth token.
///
/// Set by the sign-in flow, read by every outgoing call, deleted by the
/// sign-out flow.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist the token, replacing any previous value.
    async fn set_token(&self, token: &str) -> NetResult<()>;

    /// Current token, or `None` if signed out.
    async fn token(&self) -> NetResult<Option<String>>;

    /// Remove the token. Removing an absent token is not an error.
    async fn delete_token(&self) -> NetResult<()>;
}

/// Token store backed by the platform keychain (macOS Keychain, Windows
/// Credential Manager, Linux Secret Service).
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    /// Create a store scoped to the given keychain service name.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self { service: service.into() }
    }

    fn entry(&self) -> NetResult<keyring::Entry> {
        keyring::Entry::new(&self.service, TOKEN_KEY)
            .map_err(|e| NetError::TokenStore(e.to_string()))
    }
}

#[async_trait]
impl TokenStore for KeyringTokenStore {
    async fn set_token(&self, token: &str) -> NetResult<()> {
        debug!(service = %self.service, "storing auth token");
        self.entry()?.set_password(token).map_err(|e| NetError::TokenStore(e.to_string()))
    }

    async fn token(&self) -> NetResult<Option<String>> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(NetError::TokenStore(e.to_string())),
        }
    }

    async fn delete_token(&self) -> NetResult<()> {
        debug!(service = %self.service, "deleting auth token");
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(NetError::TokenStore(e.to_string())),
        }
    }
}

/// In-process token store for tests and previews.
///
/// Access is synchronized with a lock so the store behaves under true
/// parallelism.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn set_token(&self, token: &str) -> NetResult<()> {
        *self.token.write() = Some(token.to_string());
        Ok(())
    }

    async fn token(&self) -> NetResult<Option<String>> {
        Ok(self.token.read().clone())
    }

    async fn delete_token(&self) -> NetResult<()> {
        *self.token.write() = None;
        Ok(())
    }
}
