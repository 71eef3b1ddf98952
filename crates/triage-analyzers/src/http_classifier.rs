//! Classifier backed by a remote inference endpoint.
//!
//! The endpoint receives one JPEG per request (`Content-Type: image/jpeg`)
//! and answers with `[{"label": "...", "score": 0.0}]`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use serde::Deserialize;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use triage_core::TriageConfig;

use crate::analyzer::{Classifier, RawScores};
use crate::error::AnalyzerError;
use crate::pool::ClassifierFactory;

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

pub struct HttpClassifier {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl Debug for HttpClassifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        // api_key stays out of logs
        f.debug_struct("HttpClassifier")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl HttpClassifier {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for classifier endpoint")?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn from_config(config: &TriageConfig) -> Result<Self> {
        let endpoint = config
            .classifier_url
            .clone()
            .context("TRIAGE_CLASSIFIER_URL is not set")?;
        Self::new(endpoint, config.classifier_api_key.clone(), config.classifier_timeout)
    }

    /// Factory for [`crate::AnalyzerPool`]: every rebuild gets a fresh client.
    pub fn factory(config: &TriageConfig) -> ClassifierFactory {
        let config = config.clone();
        Box::new(move || -> Result<Arc<dyn Classifier>, AnalyzerError> {
            let classifier: Arc<dyn Classifier> = Arc::new(
                HttpClassifier::from_config(&config)
                    .map_err(|e| AnalyzerError::Classifier(format!("{:#}", e)))?,
            );
            Ok(classifier)
        })
    }

    fn encode(image: &DynamicImage) -> Result<Vec<u8>, AnalyzerError> {
        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let mut buf = Cursor::new(Vec::new());
        rgb.write_to(&mut buf, ImageFormat::Jpeg)
            .map_err(|e| AnalyzerError::Classifier(format!("Failed to encode image: {}", e)))?;
        Ok(buf.into_inner())
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    fn name(&self) -> &str {
        "http"
    }

    async fn classify(&self, image: &DynamicImage) -> Result<RawScores, AnalyzerError> {
        let body = Bytes::from(Self::encode(image)?);

        let mut request = self
            .http_client
            .post(&self.endpoint)
            .header("Content-Type", "image/jpeg")
            .body(body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AnalyzerError::Timeout("classifier request".to_string())
            } else {
                AnalyzerError::Classifier(format!("Failed to send request to classifier: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AnalyzerError::Classifier(format!(
                "classifier request failed: {} - {}",
                status, error_text
            )));
        }

        let labels: Vec<LabelScore> = response.json().await.map_err(|e| {
            AnalyzerError::Classifier(format!("Failed to parse classifier response: {}", e))
        })?;

        Ok(labels
            .into_iter()
            .map(|entry| (entry.label.to_lowercase(), entry.score))
            .collect())
    }
}
