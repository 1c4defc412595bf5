//! Remote store gateway: the fetch-all / push-one capability the sync engine
//! runs against.

mod http;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpRemoteGateway;

use crate::models::RemoteId;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid gateway configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error: {0}")]
    Api(String),
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// A remote item after the gateway normalized the service's own shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    pub remote_id: RemoteId,
    /// Quote body; may be empty when the remote item carried none
    pub text: String,
    pub category: String,
}

impl RemoteItem {
    pub fn new(
        remote_id: impl Into<RemoteId>,
        text: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            remote_id: remote_id.into(),
            text: text.into(),
            category: category.into(),
        }
    }
}

/// Remote side of a sync.
///
/// `fetch_all` failures abort a cycle; `push_one` failures only affect the
/// record being pushed.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Fetch the full remote quote list
    async fn fetch_all(&self) -> GatewayResult<Vec<RemoteItem>>;

    /// Push one quote and return the id the remote side assigned
    async fn push_one(&self, text: &str, category: &str) -> GatewayResult<RemoteId>;
}

#[async_trait]
impl<T: RemoteGateway + ?Sized> RemoteGateway for Arc<T> {
    async fn fetch_all(&self) -> GatewayResult<Vec<RemoteItem>> {
        (**self).fetch_all().await
    }

    async fn push_one(&self, text: &str, category: &str) -> GatewayResult<RemoteId> {
        (**self).push_one(text, category).await
    }
}
