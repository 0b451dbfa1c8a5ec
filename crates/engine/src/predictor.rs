//! Slot predictor boundary
//!
//! The predictor is an external classifier: given the raw user text it
//! returns the slot keys that should be required for this conversation,
//! replacing the tenant's static required list. The controller treats it as
//! a pure function; any failure (network, bad payload, timeout) becomes a
//! `PredictError` and the controller falls back to the static list.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use faq_dialog_core::SlotKey;

/// Predictor errors. Never surfaced to the caller of a turn.
#[derive(thiserror::Error, Debug)]
pub enum PredictError {
    #[error("network error: {0}")]
    Network(String),

    #[error("predictor service error: {0}")]
    Service(String),

    #[error("invalid predictor response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for PredictError {
    fn from(err: reqwest::Error) -> Self {
        PredictError::Network(err.to_string())
    }
}

/// Boundary to the slot classifier.
#[async_trait]
pub trait SlotPredictor: Send + Sync {
    /// Predict the required slot keys for a conversation opened with `text`.
    async fn predict(&self, text: &str) -> Result<Vec<SlotKey>, PredictError>;
}

/// HTTP predictor configuration
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// Base URL of the predictor service
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8500".to_string(),
            timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct PredictResponse {
    slots: Vec<SlotKey>,
}

/// Predictor backed by an HTTP classifier service.
///
/// POSTs `{"text": ...}` to `<endpoint>/predict` and expects
/// `{"slots": ["Vaccine", ...]}` back.
pub struct HttpSlotPredictor {
    client: Client,
    config: PredictorConfig,
}

impl HttpSlotPredictor {
    pub fn new(config: PredictorConfig) -> Result<Self, PredictError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PredictError::Configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn predict_url(&self) -> String {
        format!("{}/predict", self.config.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl SlotPredictor for HttpSlotPredictor {
    async fn predict(&self, text: &str) -> Result<Vec<SlotKey>, PredictError> {
        let response = self
            .client
            .post(self.predict_url())
            .json(&PredictRequest { text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PredictError::Service(format!("{status}: {body}")));
        }

        let decoded: PredictResponse = response
            .json()
            .await
            .map_err(|e| PredictError::InvalidResponse(e.to_string()))?;

        tracing::debug!(slots = decoded.slots.len(), "predictor returned required slots");
        Ok(decoded.slots)
    }
}
