//! Request descriptors.
//!
//! A [`RequestDescriptor`] is a passive, immutable value describing the
//! shape of one API call: endpoint path, HTTP method, optional JSON
//! parameters, and optional headers. Descriptors carry no behaviour; the
//! [`crate::client::BackendClient`] turns them into wire requests.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// HTTP method for a backend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Wire name of the method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one API call's shape.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    endpoint: String,
    method: Method,
    parameters: Option<Map<String, Value>>,
    headers: Option<HashMap<String, String>>,
}

impl RequestDescriptor {
    /// Start building a descriptor for the given endpoint and method.
    #[must_use]
    pub fn builder(endpoint: impl Into<String>, method: Method) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder {
            endpoint: endpoint.into(),
            method,
            parameters: None,
            headers: None,
        }
    }

    /// Endpoint path segment, e.g. `/users`.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Parameter mapping serialized as the JSON request body, if any.
    #[must_use]
    pub fn parameters(&self) -> Option<&Map<String, Value>> {
        self.parameters.as_ref()
    }

    #[must_use]
    pub fn headers(&self) -> Option<&HashMap<String, String>> {
        self.headers.as_ref()
    }
}

/// Builder for [`RequestDescriptor`].
#[derive(Debug)]
pub struct RequestDescriptorBuilder {
    endpoint: String,
    method: Method,
    parameters: Option<Map<String, Value>>,
    headers: Option<HashMap<String, String>>,
}

impl RequestDescriptorBuilder {
    /// Add a single body parameter.
    #[must_use]
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.get_or_insert_with(Map::new).insert(key.into(), value.into());
        self
    }

    /// Add a single request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.get_or_insert_with(HashMap::new).insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn build(self) -> RequestDescriptor {
        RequestDescriptor {
            endpoint: self.endpoint,
            method: self.method,
            parameters: self.parameters,
            headers: self.headers,
        }
    }
}

/// Sign-up call: creates a user account.
#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
}

impl SignUpRequest {
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Descriptor for `POST /users` with a JSON body.
    #[must_use]
    pub fn descriptor(&self) -> RequestDescriptor {
        RequestDescriptor::builder("/users", Method::Post)
            .parameter("first_name", self.first_name.clone())
            .parameter("last_name", self.last_name.clone())
            .parameter("email", self.email.clone())
            .parameter("password", self.password.clone())
            .header("Content-Type", "application/json")
            .build()
    }
}

/// Sign-in call: exchanges credentials for a session token.
///
/// The success payload carries the token the caller is expected to persist
/// via [`crate::auth::TokenStore`].
#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest {
    email: String,
    password: String,
}

impl SignInRequest {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }

    /// Descriptor for `POST /sessions` with a JSON body.
    #[must_use]
    pub fn descriptor(&self) -> RequestDescriptor {
        RequestDescriptor::builder("/sessions", Method::Post)
            .parameter("email", self.email.clone())
            .parameter("password", self.password.clone())
            .header("Content-Type", "application/json")
            .build()
    }
}
