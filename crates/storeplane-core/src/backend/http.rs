//! HTTP backend - reqwest client for the provisioning REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::StoreBackend;
use crate::config::DashboardConfig;
use crate::error::FetchError;
use crate::state::{ActionAck, Store, StoreList};

/// Talks to the control plane over plain HTTP(S). No auth headers, no
/// query parameters, no pagination.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base: Url,
    http_client: reqwest::Client,
}

#[derive(Debug, Default, Deserialize)]
struct HealthBody {
    #[serde(default)]
    status: String,
}

impl HttpBackend {
    /// Create a client for the configured base address
    pub fn new(config: &DashboardConfig) -> Result<Self, FetchError> {
        let base = Url::parse(&config.api_base)
            .map_err(|e| FetchError::InvalidBaseUrl(format!("{}: {}", config.api_base, e)))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::InvalidBaseUrl(config.api_base.clone()));
        }

        let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(10));
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base,
            http_client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Join path segments onto the base, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidBaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status));
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Acknowledgement bodies are informational; once a success status is
    /// in, a truncated or unparseable body is still an acknowledgement.
    async fn read_ack(response: Response) -> Result<ActionAck, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status));
        }
        match response.bytes().await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes).unwrap_or_default()),
            Err(e) => {
                tracing::warn!(status = %status, error = %e, "Acknowledgement body unreadable");
                Ok(ActionAck::default())
            }
        }
    }
}

#[async_trait]
impl StoreBackend for HttpBackend {
    async fn list_stores(&self) -> Result<Vec<Store>, FetchError> {
        let url = self.endpoint(&["stores"])?;
        tracing::debug!(url = %url, "Listing stores");

        let response = self.http_client.get(url).send().await?;
        let list: StoreList = Self::read_json(response).await?;

        tracing::debug!(
            count = list.stores.len(),
            total = ?list.total_stores,
            "Store list received"
        );
        Ok(list.stores)
    }

    async fn create_store(&self) -> Result<ActionAck, FetchError> {
        let url = self.endpoint(&["stores"])?;
        tracing::debug!(url = %url, "Requesting store creation");

        let response = self.http_client.post(url).send().await?;
        Self::read_ack(response).await
    }

    async fn delete_store(&self, store_id: &str) -> Result<ActionAck, FetchError> {
        let url = self.endpoint(&["stores", store_id])?;
        tracing::debug!(url = %url, store_id = %store_id, "Requesting store deletion");

        let response = self.http_client.delete(url).send().await?;
        Self::read_ack(response).await
    }

    async fn health(&self) -> Result<String, FetchError> {
        let url = self.endpoint(&[""])?;
        let response = self.http_client.get(url).send().await?;
        let body: HealthBody = Self::read_json(response).await?;
        Ok(body.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        let config = DashboardConfig {
            api_base: base.to_string(),
            ..DashboardConfig::default()
        };
        HttpBackend::new(&config).unwrap()
    }

    #[test]
    fn endpoints_join_onto_base() {
        let b = backend("http://127.0.0.1:8000");
        assert_eq!(b.endpoint(&["stores"]).unwrap().as_str(), "http://127.0.0.1:8000/stores");
        assert_eq!(b.endpoint(&[""]).unwrap().as_str(), "http://127.0.0.1:8000/");

        let b = backend("https://ops.example.com/api/");
        assert_eq!(
            b.endpoint(&["stores", "store-17"]).unwrap().as_str(),
            "https://ops.example.com/api/stores/store-17"
        );
    }

    #[test]
    fn base_query_and_fragment_are_not_forwarded() {
        let b = backend("http://localhost:8000/api/?token=x#top");
        assert_eq!(
            b.endpoint(&["stores"]).unwrap().as_str(),
            "http://localhost:8000/api/stores"
        );
    }

    #[test]
    fn store_ids_are_encoded_as_one_segment() {
        let b = backend("http://localhost:8000");
        assert_eq!(
            b.endpoint(&["stores", "a/b c"]).unwrap().as_str(),
            "http://localhost:8000/stores/a%2Fb%20c"
        );
    }

    #[test]
    fn rejects_unusable_base() {
        let config = DashboardConfig {
            api_base: "not a url".to_string(),
            ..DashboardConfig::default()
        };
        assert!(matches!(
            HttpBackend::new(&config),
            Err(FetchError::InvalidBaseUrl(_))
        ));

        let config = DashboardConfig {
            api_base: "mailto:ops@example.com".to_string(),
            ..DashboardConfig::default()
        };
        assert!(matches!(
            HttpBackend::new(&config),
            Err(FetchError::InvalidBaseUrl(_))
        ));
    }
}
