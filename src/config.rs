//! Process configuration
//!
//! Loaded from an optional JSON file; every field has a default so an
//! empty object (or no file at all) is a valid configuration.

use serde::{Deserialize, Serialize};
use shelfmate_core::{Error, Result, TextEncoder};
use shelfmate_rerank::{
    EngineConfig, HashingEncoder, HttpEncoder, DEFAULT_HASHING_DIM, DEFAULT_HTTP_TIMEOUT_SECS,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

fn default_hashing_dim() -> usize {
    DEFAULT_HASHING_DIM
}

fn default_http_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

/// Which text encoder to construct at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EncoderConfig {
    Hashing {
        #[serde(default = "default_hashing_dim")]
        dimension: usize,
    },
    Http {
        url: String,
        dimension: usize,
        #[serde(default = "default_http_timeout")]
        timeout_secs: u64,
    },
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig::Hashing {
            dimension: DEFAULT_HASHING_DIM,
        }
    }
}

impl EncoderConfig {
    pub fn build(&self) -> Result<Arc<dyn TextEncoder>> {
        match self {
            EncoderConfig::Hashing { dimension } => Ok(Arc::new(HashingEncoder::new(*dimension)?)),
            EncoderConfig::Http {
                url,
                dimension,
                timeout_secs,
            } => Ok(Arc::new(HttpEncoder::new(
                url,
                *dimension,
                Duration::from_secs(*timeout_secs),
            )?)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfmateConfig {
    pub data_dir: PathBuf,
    pub encoder: EncoderConfig,
    pub engine: EngineConfig,
    /// Per-request budget for the reranking call, in milliseconds
    pub request_timeout_ms: Option<u64>,
}

impl Default for ShelfmateConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            encoder: EncoderConfig::default(),
            engine: EngineConfig::default(),
            request_timeout_ms: None,
        }
    }
}

impl ShelfmateConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: ShelfmateConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_ms == Some(0) {
            return Err(Error::InvalidConfig(
                "request_timeout_ms must be positive".to_string(),
            ));
        }
        match &self.encoder {
            EncoderConfig::Hashing { dimension } if *dimension == 0 => Err(Error::InvalidConfig(
                "encoder dimension must be positive".to_string(),
            )),
            EncoderConfig::Http { dimension, .. } if *dimension == 0 => Err(Error::InvalidConfig(
                "encoder dimension must be positive".to_string(),
            )),
            EncoderConfig::Http { url, .. } if url.trim().is_empty() => Err(Error::InvalidConfig(
                "encoder url must not be empty".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfmate_rerank::EncoderFailurePolicy;
    use std::io::Write;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config: ShelfmateConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ShelfmateConfig::default());
        assert_eq!(config.encoder, EncoderConfig::Hashing { dimension: 256 });
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_load_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "data_dir": "/srv/shelfmate",
                "encoder": {{"kind": "http", "url": "http://localhost:8080", "dimension": 1024}},
                "engine": {{"encoder_failure": "propagate", "dedupe_candidates": true}},
                "request_timeout_ms": 2500
            }}"#
        )
        .unwrap();

        let config = ShelfmateConfig::load(file.path()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/shelfmate"));
        assert_eq!(
            config.encoder,
            EncoderConfig::Http {
                url: "http://localhost:8080".to_string(),
                dimension: 1024,
                timeout_secs: 60,
            }
        );
        assert_eq!(config.engine.encoder_failure, EncoderFailurePolicy::Propagate);
        assert!(config.engine.dedupe_candidates);
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero_timeout = ShelfmateConfig {
            request_timeout_ms: Some(0),
            ..ShelfmateConfig::default()
        };
        assert!(matches!(zero_timeout.validate(), Err(Error::InvalidConfig(_))));

        let zero_dim = ShelfmateConfig {
            encoder: EncoderConfig::Hashing { dimension: 0 },
            ..ShelfmateConfig::default()
        };
        assert!(zero_dim.validate().is_err());
    }

    #[test]
    fn test_unknown_encoder_kind_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"encoder": {{"kind": "onnx"}}}}"#).unwrap();
        assert!(matches!(
            ShelfmateConfig::load(file.path()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_build_hashing_encoder() {
        let encoder = EncoderConfig::Hashing { dimension: 32 }.build().unwrap();
        assert_eq!(encoder.dimension(), 32);
    }
}
