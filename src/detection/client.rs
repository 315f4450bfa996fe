//! HTTP client for the floor-plan detection service.
//!
//! Every backend shares one request path: a multipart form with the uploaded
//! image (and the scale, for backends that need it) posted to the kind's
//! endpoint, with the JSON body decoded into the kind's response type.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::kind::DetectionKind;
use super::slots::RequestTicket;
use super::types::{
    DetectionResponse, HybridResponse, RoboflowResponse, RoomsResponse, UnifiedResponse,
    YoloResponse,
};

/// Default request timeout in seconds. Detection backends can be slow.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default detection service URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Detection client errors.
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Failed to parse response: {0}")]
    Parse(String),
    #[error("No image loaded")]
    NoImage,
    #[error("{0} needs a scale; measure a wall and enter its length first")]
    ScaleRequired(DetectionKind),
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
}

/// Configuration for the detection service.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl DetectionConfig {
    /// Set the service base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// The image exactly as uploaded by the user.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub bytes: Arc<[u8]>,
    pub file_name: String,
    pub mime: String,
}

impl SourceImage {
    /// Wrap uploaded bytes, sniffing the MIME type from the content.
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        let mime = image::guess_format(&bytes)
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| "application/octet-stream".to_string());
        Self {
            bytes: bytes.into(),
            file_name: file_name.into(),
            mime,
        }
    }
}

/// A dispatched detection, tagged with its slot ticket.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    pub ticket: RequestTicket,
    pub image: SourceImage,
    pub scale_m_per_px: Option<f64>,
}

impl DetectionRequest {
    pub fn kind(&self) -> DetectionKind {
        self.ticket.kind
    }
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    ok: bool,
}

/// Client for the detection service.
#[derive(Debug, Clone)]
pub struct DetectionClient {
    config: DetectionConfig,
    client: Client,
}

impl DetectionClient {
    /// Create a new client with the given configuration.
    pub fn new(config: DetectionConfig) -> Result<Self, DetectionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    /// Create a new client with default configuration.
    pub fn with_defaults() -> Result<Self, DetectionError> {
        Self::new(DetectionConfig::default())
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Run a prepared request.
    pub async fn detect(&self, request: &DetectionRequest) -> Result<DetectionResponse, DetectionError> {
        self.detect_kind(request.kind(), &request.image, request.scale_m_per_px)
            .await
    }

    /// Send `image` to the backend selected by `kind`.
    pub async fn detect_kind(
        &self,
        kind: DetectionKind,
        image: &SourceImage,
        scale_m_per_px: Option<f64>,
    ) -> Result<DetectionResponse, DetectionError> {
        let form = Self::build_form(kind, image, scale_m_per_px)?;
        let url = self.url(kind.endpoint());

        tracing::info!("Dispatching {} detection to {}", kind.as_str(), url);

        let response = match kind {
            DetectionKind::Rooms => DetectionResponse::Rooms(self.send::<RoomsResponse>(&url, form).await?),
            DetectionKind::Roboflow => {
                DetectionResponse::Roboflow(self.send::<RoboflowResponse>(&url, form).await?)
            }
            DetectionKind::Yolo => DetectionResponse::Yolo(self.send::<YoloResponse>(&url, form).await?),
            DetectionKind::Unified => {
                DetectionResponse::Unified(self.send::<UnifiedResponse>(&url, form).await?)
            }
            DetectionKind::Hybrid => {
                DetectionResponse::Hybrid(self.send::<HybridResponse>(&url, form).await?)
            }
        };

        tracing::info!("{} detection finished: {}", kind.as_str(), response.summary());
        Ok(response)
    }

    /// Query the service health endpoint.
    pub async fn health(&self) -> Result<bool, DetectionError> {
        let response = self.client.get(self.url("/health")).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), body));
        }
        let health: HealthResponse =
            serde_json::from_str(&body).map_err(|e| DetectionError::Parse(e.to_string()))?;
        Ok(health.ok)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    fn build_form(
        kind: DetectionKind,
        image: &SourceImage,
        scale_m_per_px: Option<f64>,
    ) -> Result<Form, DetectionError> {
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime)?;
        let mut form = Form::new().part("image", part);

        if kind.requires_scale() {
            let scale = scale_m_per_px
                .filter(|s| *s > 0.0)
                .ok_or(DetectionError::ScaleRequired(kind))?;
            form = form.text("scale_m_per_px", scale.to_string());
        }

        Ok(form)
    }

    /// Send a single request to the API.
    async fn send<T: DeserializeOwned>(&self, url: &str, form: Form) -> Result<T, DetectionError> {
        let response = self.client.post(url).multipart(form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), error_text));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| DetectionError::Parse(e.to_string()))
    }
}

fn api_error(status: u16, body: String) -> DetectionError {
    let message = if body.trim().is_empty() {
        format!("Request failed with status {}", status)
    } else {
        body
    };
    DetectionError::Api { status, message }
}
