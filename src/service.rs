// Extraction service collaborator - trait seam plus the reqwest client.
//
// The service is an external collaborator exposing three operations; its
// transport-level retry behavior is out of scope here. Metadata lookups use
// a short interactive bound, download preparation a long one reflecting
// backend transcoding latency.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;

use crate::errors::Error;
use crate::models::{CommunityLinks, CommunityLinksEnvelope, DownloadEnvelope, InfoEnvelope};

pub const PRODUCTION_BASE_URL: &str = "https://vidsuka.onrender.com";
pub const DEV_BASE_URL: &str = "http://localhost:5000";

const INFO_TIMEOUT: Duration = Duration::from_secs(8);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

const GENERIC_DOWNLOAD_ERROR: &str = "Failed to download video";

/// Remote extraction/download service contract.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Metadata lookup. Idempotent and safely cancellable.
    async fn fetch_info(&self, url: &str) -> Result<InfoEnvelope, Error>;

    /// Prepare a downloadable artifact and return its locator. May trigger
    /// server-side work, so callers invoke it at most once per user action.
    async fn prepare_download(&self, url: &str, rendition_id: &str) -> Result<String, Error>;

    /// Community locators. Best-effort; callers keep defaults on failure.
    async fn community_links(&self) -> Result<CommunityLinks, Error>;
}

/// Configuration for the HTTP service client.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Service base URL without a trailing slash.
    pub base_url: String,
    /// Bound for metadata lookups (interactive use).
    pub info_timeout: Duration,
    /// Bound for download preparation (backend transcoding).
    pub download_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: resolve_base_url(),
            info_timeout: INFO_TIMEOUT,
            download_timeout: DOWNLOAD_TIMEOUT,
        }
    }
}

impl ServiceConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_info_timeout(mut self, timeout: Duration) -> Self {
        self.info_timeout = timeout;
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }
}

/// Pick the service location from the environment: explicit override first,
/// then the production default when running as production, else localhost.
fn resolve_base_url() -> String {
    if let Ok(value) = std::env::var("VIDFETCH_API_URL") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return trimmed.trim_end_matches('/').to_string();
        }
    }
    match std::env::var("VIDFETCH_ENV") {
        Ok(env) if env.trim() == "production" => PRODUCTION_BASE_URL.to_string(),
        _ => DEV_BASE_URL.to_string(),
    }
}

/// HTTP implementation over a shared reqwest client.
pub struct HttpExtractionService {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl HttpExtractionService {
    pub fn new(config: ServiceConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

#[async_trait]
impl ExtractionService for HttpExtractionService {
    async fn fetch_info(&self, url: &str) -> Result<InfoEnvelope, Error> {
        let endpoint = format!("{}/api/info", self.config.base_url);
        debug!("GET {} url={}", endpoint, url);

        let response = self
            .client
            .get(&endpoint)
            .query(&[("url", url)])
            .timeout(self.config.info_timeout)
            .send()
            .await
            .map_err(|e| map_transport(e, Op::Metadata))?;

        read_envelope(response, Op::Metadata).await
    }

    async fn prepare_download(&self, url: &str, rendition_id: &str) -> Result<String, Error> {
        let endpoint = format!("{}/api/download", self.config.base_url);
        debug!("POST {} url={} format={}", endpoint, url, rendition_id);

        let response = self
            .client
            .post(&endpoint)
            .json(&serde_json::json!({ "url": url, "format_id": rendition_id }))
            .timeout(self.config.download_timeout)
            .send()
            .await
            .map_err(|e| map_transport(e, Op::Download))?;

        let envelope: DownloadEnvelope = read_envelope(response, Op::Download).await?;
        resolve_locator(&self.config.base_url, envelope)
    }

    async fn community_links(&self) -> Result<CommunityLinks, Error> {
        let endpoint = format!("{}/api/whatsapp", self.config.base_url);
        debug!("GET {}", endpoint);

        let response = self
            .client
            .get(&endpoint)
            .timeout(self.config.info_timeout)
            .send()
            .await
            .map_err(|e| map_transport(e, Op::Metadata))?;

        let envelope: CommunityLinksEnvelope = read_envelope(response, Op::Metadata).await?;
        match (envelope.success, envelope.channel, envelope.group) {
            (true, Some(channel), Some(group)) => Ok(CommunityLinks { channel, group }),
            _ => Err(Error::Metadata("Community links unavailable".to_string())),
        }
    }
}

/// Which operation a transport failure belongs to; decides the error kind
/// the failure surfaces as.
#[derive(Clone, Copy)]
enum Op {
    Metadata,
    Download,
}

impl Op {
    fn wrap(self, message: String) -> Error {
        match self {
            Self::Metadata => Error::Metadata(message),
            Self::Download => Error::Download(message),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Metadata => "metadata lookup",
            Self::Download => "download preparation",
        }
    }
}

fn map_transport(error: reqwest::Error, op: Op) -> Error {
    if error.is_timeout() {
        Error::Timeout(op.label().to_string())
    } else {
        op.wrap(error.to_string())
    }
}

async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response, op: Op) -> Result<T, Error> {
    let status = response.status();
    if !status.is_success() {
        // Error bodies carry {"error": "..."} when the service produced them.
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|value| value.get("error")?.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("Service returned {}", status));
        return Err(op.wrap(message));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| op.wrap(format!("Malformed service response: {}", e)))
}

/// Resolve a preparation envelope to a download locator. Newer services
/// return the locator directly; older ones return a bare filename served
/// from the downloads path.
fn resolve_locator(base_url: &str, envelope: DownloadEnvelope) -> Result<String, Error> {
    if !envelope.success {
        return Err(Error::Download(
            envelope
                .error
                .filter(|msg| !msg.trim().is_empty())
                .unwrap_or_else(|| GENERIC_DOWNLOAD_ERROR.to_string()),
        ));
    }

    if let Some(url) = envelope.download_url.filter(|u| !u.trim().is_empty()) {
        return Ok(url);
    }
    if let Some(name) = envelope.filename.filter(|n| !n.trim().is_empty()) {
        return Ok(format!(
            "{}/api/downloads/{}",
            base_url,
            urlencoding::encode(&name)
        ));
    }

    Err(Error::Download(GENERIC_DOWNLOAD_ERROR.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(
        success: bool,
        download_url: Option<&str>,
        filename: Option<&str>,
        error: Option<&str>,
    ) -> DownloadEnvelope {
        DownloadEnvelope {
            success,
            download_url: download_url.map(str::to_string),
            filename: filename.map(str::to_string),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn locator_prefers_explicit_url() {
        let resolved = resolve_locator(
            DEV_BASE_URL,
            envelope(true, Some("http://cdn/x.mp4"), Some("x.mp4"), None),
        )
        .unwrap();
        assert_eq!(resolved, "http://cdn/x.mp4");
    }

    #[test]
    fn locator_built_from_filename_is_percent_encoded() {
        let resolved =
            resolve_locator(DEV_BASE_URL, envelope(true, None, Some("my video.mp4"), None))
                .unwrap();
        assert_eq!(
            resolved,
            "http://localhost:5000/api/downloads/my%20video.mp4"
        );
    }

    #[test]
    fn failed_preparation_surfaces_service_text() {
        let err = resolve_locator(DEV_BASE_URL, envelope(false, None, None, Some("boom")));
        assert_eq!(err, Err(Error::Download("boom".to_string())));

        let err = resolve_locator(DEV_BASE_URL, envelope(false, None, None, None));
        assert_eq!(
            err,
            Err(Error::Download(GENERIC_DOWNLOAD_ERROR.to_string()))
        );
    }

    #[test]
    fn success_without_a_file_is_an_error() {
        let err = resolve_locator(DEV_BASE_URL, envelope(true, None, None, None));
        assert!(matches!(err, Err(Error::Download(_))));
    }

    #[test]
    fn config_builder_trims_trailing_slash() {
        let config = ServiceConfig::default().with_base_url("http://host:9000/");
        assert_eq!(config.base_url, "http://host:9000");
    }
}
