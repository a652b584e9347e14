//! medadmin HTTP layer
//!
//! A single [`ApiClient`] talks to the platform backend. It owns the session
//! token store, renews access tokens before they expire, replays a request
//! once after a 401, and exposes one method per backend endpoint.

pub mod client;

pub use client::error::ClientError;
pub use client::navigator::{LogNavigator, Navigator};
pub use client::refresh::{
    HttpTokenRefresher, RefreshCoordinator, RefreshFailure, RefreshedTokens, TokenRefresher,
};
pub use client::request::{ApiRequest, FilePart, MultipartForm, RequestBody};
pub use client::store::{MemoryTokenStore, TokenStore};
pub use client::{ApiClient, ApiClientBuilder};
