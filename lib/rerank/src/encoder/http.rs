//! Encoder that delegates to an embedding sidecar over HTTP
//!
//! The sidecar hosts the pretrained model and speaks the
//! text-embeddings-inference `/embed` protocol:
//!
//! ```text
//! POST {base_url}/embed
//! {"inputs": ["...", "..."], "normalize": true, "truncate": true}
//! -> [[f32, ...], [f32, ...]]
//! ```
//!
//! Truncation to the model's maximum input length happens on the sidecar.

use serde::Serialize;
use shelfmate_core::{Embedding, Error, Result, TextEncoder};
use std::time::Duration;

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
    normalize: bool,
    truncate: bool,
}

pub struct HttpEncoder {
    client: reqwest::blocking::Client,
    base_url: String,
    dimension: usize,
    model_name: String,
}

impl HttpEncoder {
    /// # Arguments
    /// * `base_url` - Sidecar base URL (e.g., "http://localhost:8080")
    /// * `dimension` - Embedding width the hosted model produces
    /// * `timeout` - Per-request HTTP timeout
    pub fn new(base_url: &str, dimension: usize, timeout: Duration) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidConfig(
                "http encoder dimension must be positive".to_string(),
            ));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Encoder(format!("failed to create HTTP client: {}", e)))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            model_name: format!("http:{}", base_url),
            base_url,
            dimension,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl TextEncoder for HttpEncoder {
    fn encode(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embed", self.base_url);
        let body = EmbedRequest {
            inputs: texts,
            normalize: true,
            truncate: true,
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| Error::Encoder(format!("embed request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            return Err(Error::Encoder(format!("sidecar returned {}: {}", status, body)));
        }

        let vectors: Vec<Vec<f32>> = resp
            .json()
            .map_err(|e| Error::Encoder(format!("failed to parse embed response: {}", e)))?;

        if vectors.len() != texts.len() {
            return Err(Error::Encoder(format!(
                "sidecar returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }

        vectors
            .into_iter()
            .map(|v| {
                if v.len() != self.dimension {
                    return Err(Error::InvalidDimension {
                        expected: self.dimension,
                        actual: v.len(),
                    });
                }
                Ok(Embedding::new(v).normalized())
            })
            .collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
