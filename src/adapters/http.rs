//! HTTP collaborators
//!
//! Talks to a remote collaborator over JSON/HTTP and decodes the uniform
//! response envelope. One [`HttpCollaborator`] per base URL; it implements
//! every contract so the same type serves all six services.

use crate::adapters::traits::*;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// JSON/HTTP client for one collaborator
#[derive(Debug, Clone)]
pub struct HttpCollaborator {
    name: &'static str,
    base_url: Url,
    http: Client,
}

impl HttpCollaborator {
    pub fn new(name: &'static str, base_url: Url, timeout: Duration) -> AdapterResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("governance-orchestrator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AdapterError::configuration(format!("{}: {}", name, e)))?;

        Ok(Self {
            name,
            base_url,
            http,
        })
    }

    fn endpoint(&self, path: &str) -> AdapterResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AdapterError::configuration(format!("{}: invalid path {}: {}", self.name, path, e)))
    }

    /// `<base>/<path>/<key>` with the key percent-encoded as one segment
    fn keyed_endpoint(&self, path: &str, key: &str) -> AdapterResult<Url> {
        // `.` and `..` would be dropped by the segment setter and address the collection
        if key.is_empty() || matches!(key, "." | "..") {
            return Err(AdapterError::rejected(format!("invalid key '{}'", key)));
        }

        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|_| AdapterError::configuration(format!("{}: base URL cannot carry a path", self.name)))?
            .pop_if_empty()
            .push(key);
        Ok(url)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> AdapterResult<AdapterResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        self.send(self.http.post(url).json(body)).await
    }

    async fn get<T>(&self, url: Url) -> AdapterResult<AdapterResponse<T>>
    where
        T: DeserializeOwned,
    {
        self.send(self.http.get(url)).await
    }

    async fn send<T>(&self, request: RequestBuilder) -> AdapterResult<AdapterResponse<T>>
    where
        T: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .map_err(|e| AdapterError::transport(format!("{}: {}", self.name, e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| AdapterError::transport(format!("{}: {}", self.name, e)))?;

        debug!("{} collaborator answered {} ({} bytes)", self.name, status, body.len());

        // Collaborators may answer a failed envelope with a non-2xx status.
        match serde_json::from_slice::<AdapterResponse<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(AdapterError::transport(format!(
                "{} returned HTTP {}: {}",
                self.name,
                status,
                String::from_utf8_lossy(&body).chars().take(200).collect::<String>()
            ))),
            Err(e) => Err(AdapterError::response(format!("{}: {}", self.name, e))),
        }
    }
}

#[async_trait]
impl PolicyAdapter for HttpCollaborator {
    async fn evaluate_policy(&self, query: &PolicyQuery) -> AdapterResult<PolicyVerdict> {
        self.post("policy/evaluate", query).await?.into_result()
    }
}

#[async_trait]
impl CostAdapter for HttpCollaborator {
    async fn get_cost_metrics(&self, query: &CostMetricsQuery) -> AdapterResult<CostMetrics> {
        self.post("cost/metrics", query).await?.into_result()
    }

    async fn get_forecast(&self, query: &ForecastQuery) -> AdapterResult<CostForecast> {
        self.post("cost/forecast", query).await?.into_result()
    }
}

#[async_trait]
impl AnalyticsAdapter for HttpCollaborator {
    async fn track(&self, event: &AnalyticsEvent) -> AdapterResult<()> {
        self.post::<_, Value>("analytics/track", event)
            .await?
            .into_unit()
    }
}

#[async_trait]
impl ConfigAdapter for HttpCollaborator {
    async fn get_config(&self, key: &str) -> AdapterResult<ConfigEntry> {
        let url = self.keyed_endpoint("config/", key)?;
        self.get(url).await?.into_result()
    }
}

#[async_trait]
impl SchemaAdapter for HttpCollaborator {
    async fn validate(&self, schema_id: &str, data: &Value) -> AdapterResult<SchemaValidation> {
        let body = json!({ "schemaId": schema_id, "data": data });
        self.post("schema/validate", &body).await?.into_result()
    }
}

#[async_trait]
impl DashboardAdapter for HttpCollaborator {
    async fn publish_event(&self, event: &GovernanceEvent) -> AdapterResult<()> {
        self.post::<_, Value>("dashboard/events", event)
            .await?
            .into_unit()
    }
}
