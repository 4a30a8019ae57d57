//! Client for the hosted dataset API.
//!
//! Status codes are interpreted only in [`PlusClient::request`]; the public
//! methods see either a successful response or a typed [`SweepError`].

use super::{DatasetRef, DatasetStore};
use crate::config::ClientConfig;
use crate::errors::{SweepError, SweepResult};
use crate::model::{Dataset, Example};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

const USER_AGENT_VALUE: &str = concat!("sweep/", env!("CARGO_PKG_VERSION"));

/// Dataset API client, scoped to one tenant.
#[derive(Debug, Clone)]
pub struct PlusClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    tenant_id: String,
}

impl PlusClient {
    /// Validate `config` and build a client.
    ///
    /// Hosted (non-loopback) URLs need an API key and a tenant id. Against a
    /// local server the tenant defaults to the first seeded tenant.
    pub async fn connect(config: ClientConfig) -> SweepResult<Self> {
        let base_url = config.api_url.trim_end_matches('/').to_string();
        let local = is_localhost(&base_url).await;

        if !local && config.api_key.is_none() {
            return Err(SweepError::config(
                "API key must be provided when using a hosted dataset API",
            ));
        }

        let client = build_http_client(&config)?;
        let mut this = Self {
            client,
            base_url,
            api_key: config.api_key,
            tenant_id: String::new(),
        };

        this.tenant_id = match config.tenant_id {
            Some(tenant_id) => tenant_id,
            None if local => this.seeded_tenant_id().await?,
            None => {
                return Err(SweepError::config(
                    "tenant id must be provided when using a hosted dataset API",
                ))
            }
        };
        debug!(url = %this.base_url, tenant_id = %this.tenant_id, "dataset client ready");
        Ok(this)
    }

    pub async fn from_env() -> SweepResult<Self> {
        Self::connect(ClientConfig::from_env()).await
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn is_authenticated(&self) -> bool {
        self.api_key.is_some()
    }

    async fn seeded_tenant_id(&self) -> SweepResult<String> {
        #[derive(serde::Deserialize)]
        struct Tenant {
            id: String,
        }

        let url = format!("{}/tenants", self.base_url);
        let tenants: Vec<Tenant> = match self.request(Method::GET, &url, &[]).await {
            Ok(resp) => parse_json(resp, "tenants").await?,
            Err(e) => {
                return Err(SweepError::config(format!(
                    "unable to get seeded tenant id ({}); please provide one",
                    e
                )))
            }
        };
        tenants
            .into_iter()
            .next()
            .map(|t| t.id)
            .ok_or_else(|| SweepError::config("no seeded tenant found"))
    }

    /// Datasets visible to the tenant, newest first as returned by the API.
    pub async fn list_datasets(&self, limit: usize) -> SweepResult<Vec<Dataset>> {
        let url = format!("{}/datasets", self.base_url);
        debug!(url = %url, limit, "listing datasets");
        let resp = self.get(&url, &[("limit", limit.to_string())]).await?;
        parse_json(resp, "datasets").await
    }

    /// Delete a dataset, resolving a name to its id first.
    pub async fn delete_dataset(&self, dataset: &DatasetRef) -> SweepResult<Dataset> {
        let id = match dataset {
            DatasetRef::Id(id) => id.clone(),
            DatasetRef::Name(_) => self.read_dataset(dataset).await?.id,
        };
        let url = format!("{}/datasets/{}", self.base_url, id);
        debug!(url = %url, "deleting dataset");
        let resp = self
            .request(Method::DELETE, &url, &[])
            .await
            .map_err(|e| not_found(e, || dataset_not_found(dataset)))?;
        parse_json(resp, "deleted dataset").await
    }

    pub async fn read_example(&self, example_id: &str) -> SweepResult<Example> {
        let url = format!("{}/examples/{}", self.base_url, example_id);
        debug!(url = %url, "reading example");
        let resp = self.get(&url, &[]).await.map_err(|e| {
            not_found(e, || SweepError::ExampleNotFound {
                id: example_id.to_string(),
            })
        })?;
        parse_json(resp, "example").await
    }

    /// Examples of one dataset, or of every dataset when `dataset_id` is `None`.
    pub async fn list_all_examples(&self, dataset_id: Option<&str>) -> SweepResult<Vec<Example>> {
        let url = format!("{}/examples", self.base_url);
        debug!(url = %url, dataset_id = ?dataset_id, "listing examples");
        let params: Vec<(&str, String)> = dataset_id
            .map(|id| vec![("dataset", id.to_string())])
            .unwrap_or_default();
        let resp = self.get(&url, &params).await?;
        parse_json(resp, "examples").await
    }

    /// GET with the tenant query parameter attached.
    async fn get(&self, url: &str, params: &[(&str, String)]) -> SweepResult<reqwest::Response> {
        let mut query: Vec<(&str, String)> = vec![("tenant_id", self.tenant_id.clone())];
        query.extend(params.iter().cloned());
        self.request(Method::GET, url, &query).await
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
    ) -> SweepResult<reqwest::Response> {
        let mut request = self.client.request(method, url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(key) = &self.api_key {
            request = request.header(AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = request.send().await?;
        let status = response.status();

        match status.as_u16() {
            200..=299 => Ok(response),
            401 | 403 => {
                let body = response.text().await.unwrap_or_default();
                Err(SweepError::Unauthorized {
                    message: error_message(&body, "invalid or missing API key"),
                })
            }
            code => {
                let body = response.text().await.unwrap_or_default();
                Err(SweepError::Http {
                    status: code,
                    message: error_message(&body, status.canonical_reason().unwrap_or("error")),
                })
            }
        }
    }
}

#[async_trait]
impl DatasetStore for PlusClient {
    async fn read_dataset(&self, dataset: &DatasetRef) -> SweepResult<Dataset> {
        let (url, params) = match dataset {
            DatasetRef::Id(id) => (format!("{}/datasets/{}", self.base_url, id), vec![]),
            DatasetRef::Name(name) => (
                format!("{}/datasets", self.base_url),
                vec![("name", name.clone()), ("limit", "1".to_string())],
            ),
        };
        debug!(url = %url, dataset = %dataset, "reading dataset");

        let resp = self
            .get(&url, &params)
            .await
            .map_err(|e| not_found(e, || dataset_not_found(dataset)))?;
        let body: serde_json::Value = parse_json(resp, "dataset").await?;

        let found = match body {
            serde_json::Value::Array(items) => match items.into_iter().next() {
                Some(first) => first,
                None => return Err(dataset_not_found(dataset)),
            },
            other => other,
        };
        serde_json::from_value(found).map_err(|e| SweepError::InvalidResponse {
            message: format!("failed to parse dataset: {}", e),
        })
    }

    async fn list_examples(&self, dataset_id: &str) -> SweepResult<Vec<Example>> {
        self.list_all_examples(Some(dataset_id)).await
    }
}

fn build_http_client(config: &ClientConfig) -> SweepResult<reqwest::Client> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .default_headers(default_headers)
        .build()
        .map_err(|e| SweepError::Network {
            message: format!("failed to create HTTP client: {}", e),
        })
}

async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response, what: &str) -> SweepResult<T> {
    resp.json().await.map_err(|e| SweepError::InvalidResponse {
        message: format!("failed to parse {} response: {}", what, e),
    })
}

fn dataset_not_found(dataset: &DatasetRef) -> SweepError {
    SweepError::DatasetNotFound {
        reference: dataset.to_string(),
    }
}

fn not_found(err: SweepError, make: impl FnOnce() -> SweepError) -> SweepError {
    match err {
        SweepError::Http { status: 404, .. } => make(),
        other => other,
    }
}

/// Prefer the API's `{"detail": ...}` message; fall back to the raw body.
fn error_message(body: &str, fallback: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(detail) = json.get("detail").and_then(|d| d.as_str()) {
            return detail.to_string();
        }
    }
    if body.trim().is_empty() {
        fallback.to_string()
    } else {
        body.chars().take(200).collect()
    }
}

/// Whether `url` points at this machine (loopback or unspecified address).
pub async fn is_localhost(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    match parsed.host() {
        Some(url::Host::Ipv4(ip)) => is_local_ip(IpAddr::V4(ip)),
        Some(url::Host::Ipv6(ip)) => is_local_ip(IpAddr::V6(ip)),
        Some(url::Host::Domain(domain)) => {
            let port = parsed.port_or_known_default().unwrap_or(80);
            match tokio::net::lookup_host((domain, port)).await {
                Ok(mut addrs) => addrs.any(|a| is_local_ip(a.ip())),
                Err(_) => false,
            }
        }
        None => false,
    }
}

fn is_local_ip(ip: IpAddr) -> bool {
    ip.is_loopback() || ip.is_unspecified()
}
