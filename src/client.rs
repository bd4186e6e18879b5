use std::time::Duration;

use anyhow::{Context, Result, bail};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use prometheus_client::registry::Registry;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{config::RegistryConfig, metrics::UpstreamMetrics};

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Deserialize)]
struct Catalog {
    repositories: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TagList {
    tags: Option<Vec<String>>,
}

/// Read-only access to a registry's v2 API.
///
/// One instance is shared by every request. It keeps no state besides the
/// connection pool, so every call goes to the registry.
pub(crate) struct RegistryClient {
    base_url: String,
    client: reqwest::Client,
    metrics: UpstreamMetrics,
}

/// Escapes each `/` separated piece of a repository name or reference while
/// keeping the separators themselves.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

impl RegistryClient {
    pub fn new(config: &RegistryConfig, registry: &mut Registry) -> Result<Self> {
        if !config.ssl_verify {
            warn!("TLS certificate verification is disabled for the upstream registry");
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(5))
            .danger_accept_invalid_certs(!config.ssl_verify)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: config.base_url(),
            client,
            metrics: UpstreamMetrics::new(registry),
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        let status = resp.status();
        if status.is_server_error() {
            bail!("Upstream registry returned {status} for {url}");
        }

        // The registry reports unknown names with a JSON `errors` document on
        // a 4xx, which callers inspect themselves.
        let body = resp
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))?;

        serde_json::from_slice(&body).with_context(|| {
            format!("Upstream registry returned an unexpected body ({status}) for {url}")
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Querying upstream registry: {url}");

        let result = self.fetch(&url).await;

        self.metrics.observe(
            endpoint,
            match &result {
                Ok(_) => "ok",
                Err(_) => "error",
            },
        );

        result
    }

    /// `None` when the registry answered without a `repositories` field.
    pub async fn list_repositories(&self) -> Result<Option<Vec<String>>> {
        let catalog: Catalog = self.get("catalog", "/v2/_catalog").await?;
        Ok(catalog.repositories)
    }

    /// Tags in the order the registry returned them, `None` when the
    /// response had no `tags` field at all.
    pub async fn list_tags(&self, repository: &str) -> Result<Option<Vec<String>>> {
        let path = format!("/v2/{}/tags/list", encode_path(repository));
        let tags: TagList = self.get("tags", &path).await?;
        Ok(tags.tags)
    }

    pub async fn get_manifest(
        &self,
        repository: &str,
        reference: &str,
    ) -> Result<Map<String, Value>> {
        let path = format!(
            "/v2/{}/manifests/{}",
            encode_path(repository),
            encode_path(reference)
        );
        self.get("manifest", &path).await
    }
}
