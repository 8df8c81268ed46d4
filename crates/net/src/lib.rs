//! Client-side networking layer for the Beacon backend.
//!
//! The crate is built from four small pieces:
//! - [`request`]: passive descriptors for the shape of each API call
//! - [`transport`]: a raw HTTP layer with status classification and
//!   cooperative cancellation
//! - [`client`]: the authenticated backend client tying the two together
//! - [`operation`] / [`queue`]: a cancellable, observable lifecycle for
//!   running calls in the background
//!
//! Auth token persistence lives in [`auth`] behind the [`TokenStore`]
//! trait, with a keychain-backed implementation for production and an
//! in-memory one for tests.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod operation;
pub mod queue;
pub mod request;
pub mod transport;

pub use auth::{KeyringTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
pub use client::{BackendClient, AUTH_TOKEN_HEADER};
pub use config::BackendConfig;
pub use error::{NetError, NetResult};
pub use operation::{
    NetworkOperation, OperationHandle, OperationLifecycle, OperationState,
};
pub use queue::OperationQueue;
pub use request::{
    Method, RequestDescriptor, RequestDescriptorBuilder, SignInRequest, SignUpRequest,
};
pub use transport::{classify, StatusClass, Transport, REQUEST_TIMEOUT};
