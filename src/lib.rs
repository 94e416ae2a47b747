pub mod batch;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod detection;
pub mod error;
pub mod image_processor;
pub mod output;
pub mod report;

use std::path::Path;

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::constants::DEFAULT_USER_AGENT;
use crate::image_processor::ProcessedImage;

pub use crate::config::{ApiKey, AppConfig, DashboardSettings, DetectionConfig};
pub use crate::detection::{BoundingBox, Detection};
pub use crate::error::{AnalysisError, ErrorKind, Result};
pub use crate::report::AnalysisReport;

/// Result of one analysis request.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The JSON body exactly as the API returned it.
    pub raw_response: Value,
    /// Usable detections, in response order.
    pub detections: Vec<Detection>,
    pub image_width: u32,
    pub image_height: u32,
    pub outcome: Outcome,
}

impl Analysis {
    pub fn report(&self) -> Option<&AnalysisReport> {
        match &self.outcome {
            Outcome::Detected(report) => Some(report),
            Outcome::NoDetections => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Detected(AnalysisReport),
    /// A valid response with nothing usable in it. Not an error.
    NoDetections,
}

// --- Client Implementation ---

pub struct DetectionClient {
    client: reqwest::Client,
    config: DetectionConfig,
    api_key: ApiKey,
}

impl DetectionClient {
    pub fn new(config: DetectionConfig, api_key: ApiKey) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    pub async fn analyze_image_path(&self, path: impl AsRef<Path>) -> Result<Analysis> {
        let image = image_processor::process_image_from_path(path)?;
        self.analyze(&image).await
    }

    pub async fn analyze_image_bytes(
        &self,
        bytes: impl Into<Bytes>,
        file_name: &str,
    ) -> Result<Analysis> {
        let image = image_processor::process_image_from_bytes(bytes, file_name)?;
        self.analyze(&image).await
    }

    /// Submits `image`, then parses and aggregates the response.
    pub async fn analyze(&self, image: &ProcessedImage) -> Result<Analysis> {
        let raw_response = self.detect(image).await?;
        let detections = detection::parse_detections(&raw_response)?;

        let outcome = match AnalysisReport::from_boxes(
            detections.iter().map(|d| &d.bounding_box),
            image.width,
            image.height,
        ) {
            Some(report) => {
                log::info!("{}: {}", image.file_name, report);
                Outcome::Detected(report)
            }
            None => {
                log::info!("{}: no detections", image.file_name);
                Outcome::NoDetections
            }
        };

        Ok(Analysis {
            raw_response,
            detections,
            image_width: image.width,
            image_height: image.height,
            outcome,
        })
    }

    /// Sends one detection request and returns the JSON body of a 200 response.
    pub async fn detect(&self, image: &ProcessedImage) -> Result<Value> {
        let headers = self.headers()?;

        let image_part = Part::stream_with_length(image.bytes.clone(), image.bytes.len() as u64)
            .file_name(image.file_name.clone())
            .mime_str(image.mime_type())?;
        let form = Form::new()
            .part("image", image_part)
            .text("prompts", self.config.prompt.clone())
            .text("model", self.config.model.clone());

        log::info!(
            "submitting {} ({}x{}, {} bytes) to {} with prompt '{}'",
            image.file_name,
            image.width,
            image.height,
            image.bytes.len(),
            self.config.endpoint,
            self.config.prompt
        );

        let response = self
            .client
            .post(self.config.endpoint.clone())
            .headers(headers)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        log::debug!("detection API answered {status} with {} bytes", text.len());

        if status != StatusCode::OK {
            return Err(AnalysisError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|err| {
            AnalysisError::UnexpectedResponse(format!("response body is not JSON: {err}"))
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut auth = HeaderValue::from_str(&format!("Basic {}", self.api_key.expose()))
            .map_err(|_| {
                AnalysisError::Configuration(
                    "API key contains characters not allowed in a header".into(),
                )
            })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}
