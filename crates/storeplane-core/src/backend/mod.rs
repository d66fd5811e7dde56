//! Backend - the REST boundary to the provisioning control plane.

mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::state::{ActionAck, Store};

pub use http::HttpBackend;

/// Operations the dashboard issues against the control plane.
///
/// Each call performs exactly one request and never retries.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// `GET /stores` - every store, in backend order
    async fn list_stores(&self) -> Result<Vec<Store>, FetchError>;

    /// `POST /stores` - returns once the request is acknowledged, long
    /// before the store is ready
    async fn create_store(&self) -> Result<ActionAck, FetchError>;

    /// `DELETE /stores/{store_id}`
    async fn delete_store(&self, store_id: &str) -> Result<ActionAck, FetchError>;

    /// `GET /` - backend liveness message
    async fn health(&self) -> Result<String, FetchError>;
}

#[async_trait]
impl<T: StoreBackend + ?Sized> StoreBackend for Arc<T> {
    async fn list_stores(&self) -> Result<Vec<Store>, FetchError> {
        (**self).list_stores().await
    }

    async fn create_store(&self) -> Result<ActionAck, FetchError> {
        (**self).create_store().await
    }

    async fn delete_store(&self, store_id: &str) -> Result<ActionAck, FetchError> {
        (**self).delete_store(store_id).await
    }

    async fn health(&self) -> Result<String, FetchError> {
        (**self).health().await
    }
}
