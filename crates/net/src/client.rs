//! Backend client.
//!
//! Combines a [`RequestDescriptor`] with the [`Transport`], injecting the
//! auth token into headers and decoding the response body into a generic
//! JSON value. Each client owns exactly one transport.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::auth::TokenStore;
use crate::config::BackendConfig;
use crate::error::{NetError, NetResult};
use crate::request::RequestDescriptor;
use crate::transport::Transport;

/// Header carrying the backend auth token.
pub const AUTH_TOKEN_HEADER: &str = "X-Api-Auth-Token";

/// Authenticated JSON client for the backend API.
#[derive(Clone)]
pub struct BackendClient {
    config: Arc<BackendConfig>,
    tokens: Arc<dyn TokenStore>,
    transport: Arc<Transport>,
}

impl BackendClient {
    /// Create a client with its own transport.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Config`] if the transport cannot be built.
    pub fn new(config: Arc<BackendConfig>, tokens: Arc<dyn TokenStore>) -> NetResult<Self> {
        Ok(Self { config, tokens, transport: Arc::new(Transport::new()?) })
    }

    /// Execute one API call described by `request`.
    ///
    /// The full URL is resolved against the configured base URL, the auth
    /// token (when stored) is attached as `X-Api-Auth-Token`, and a
    /// non-empty success body is parsed as JSON. An empty body maps to
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Surfaces transport, status, and token store errors unchanged, and
    /// reports an unparseable body as [`NetError::Parse`].
    pub async fn call(&self, request: &RequestDescriptor) -> NetResult<Option<Value>> {
        let url = self.config.endpoint_url(request.endpoint())?;

        let mut headers: HashMap<String, String> =
            request.headers().cloned().unwrap_or_default();
        if let Some(token) = self.tokens.token().await? {
            headers.insert(AUTH_TOKEN_HEADER.to_string(), token);
        }

        debug!(endpoint = request.endpoint(), method = %request.method(), "backend call");

        let body =
            self.transport.send(url, request.method(), &headers, request.parameters()).await?;

        match body {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| NetError::Parse(e.to_string())),
        }
    }

    /// Cancel the in-flight transport call, if any.
    pub fn cancel(&self) {
        self.transport.cancel();
    }

    /// The configuration this client resolves URLs against.
    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::request::Method;

    fn client_for(server: &MockServer) -> (BackendClient, Arc<MemoryTokenStore>) {
        let config = Arc::new(BackendConfig::new(&server.uri()).unwrap());
        let tokens = Arc::new(MemoryTokenStore::new());
        let client = BackendClient::new(config, Arc::clone(&tokens) as Arc<dyn TokenStore>)
            .unwrap();
        (client, tokens)
    }

    #[tokio::test]
    async fn parses_success_body_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/things"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
            .mount(&server)
            .await;

        let (client, _) = client_for(&server);
        let descriptor = RequestDescriptor::builder("/things", Method::Get).build();

        let value = client.call(&descriptor).await.unwrap();
        assert_eq!(value, Some(json!({"id": 7})));
    }

    #[tokio::test]
    async fn empty_success_body_maps_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/things"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let (client, _) = client_for(&server);
        let descriptor = RequestDescriptor::builder("/things", Method::Delete).build();

        let value = client.call(&descriptor).await.unwrap();
        assert_eq!(value, None);
    }

    /// A 200 response with a body that is not JSON must surface as a parse
    /// error, never as success.
    #[tokio::test]
    async fn non_json_body_surfaces_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let (client, _) = client_for(&server);
        let descriptor = RequestDescriptor::builder("/broken", Method::Get).build();

        let result = client.call(&descriptor).await;
        assert!(matches!(result, Err(NetError::Parse(_))));
    }

    #[tokio::test]
    async fn failure_status_carries_code_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such thing"))
            .mount(&server)
            .await;

        let (client, _) = client_for(&server);
        let descriptor = RequestDescriptor::builder("/missing", Method::Get).build();

        match client.call(&descriptor).await {
            Err(NetError::Status { code, body }) => {
                assert_eq!(code, 404);
                assert_eq!(body.as_deref(), Some("no such thing"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn auth_header_reflects_token_store() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .and(wiremock::matchers::header(AUTH_TOKEN_HEADER, "abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let (client, tokens) = client_for(&server);
        tokens.set_token("abc123").await.unwrap();

        let descriptor = RequestDescriptor::builder("/me", Method::Get).build();
        let value = client.call(&descriptor).await.unwrap();
        assert_eq!(value, Some(json!({"ok": true})));
    }
}
