//! Caller-facing recommendation service
//!
//! Owns the long-lived engine (and through it the loaded encoder), turns
//! loosely-typed caller input into validated requests, and bounds each
//! reranking call with an optional timeout. Inference runs on the tokio
//! blocking pool so async callers are never stalled by the encoder.

use crate::config::ShelfmateConfig;
use serde::{Deserialize, Serialize};
use shelfmate_core::Error;
use shelfmate_rerank::{
    EncoderFailurePolicy, FallbackReason, Recommendation, RecommendationMode,
    RecommendationRequest, RerankingEngine, DEFAULT_K, DEFAULT_POOL_SIZE,
};
use shelfmate_storage::DataStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("Missing {0} in request")]
    MissingParameter(&'static str),

    #[error(transparent)]
    Engine(#[from] Error),

    #[error("Recommendation task failed: {0}")]
    Task(String),
}

/// Request body as sent by clients: `{"parentId": "...", "complementary": true}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendQuery {
    pub parent_id: Option<String>,
    #[serde(default)]
    pub complementary: bool,
    pub k: Option<i64>,
    pub pool_size: Option<i64>,
}

impl RecommendQuery {
    pub fn new(parent_id: impl Into<String>, complementary: bool) -> Self {
        Self {
            parent_id: Some(parent_id.into()),
            complementary,
            ..Self::default()
        }
    }

    pub fn to_request(&self) -> Result<RecommendationRequest, ServiceError> {
        let parent_id = self
            .parent_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ServiceError::MissingParameter("parentId"))?;

        Ok(RecommendationRequest::try_from_signed(
            parent_id,
            RecommendationMode::from_complementary(self.complementary),
            self.k.unwrap_or(DEFAULT_K as i64),
            self.pool_size.unwrap_or(DEFAULT_POOL_SIZE as i64),
        )?)
    }
}

pub struct RecommendationService {
    engine: Arc<RerankingEngine>,
    request_timeout: Option<Duration>,
}

impl RecommendationService {
    pub fn new(engine: RerankingEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            request_timeout: None,
        }
    }

    /// Load data, construct the encoder once and wire the engine
    pub fn from_config(config: &ShelfmateConfig) -> shelfmate_core::Result<Self> {
        config.validate()?;

        let store = DataStore::open(&config.data_dir)?;
        info!("Data loaded from {:?} ({:?})", config.data_dir, store.source());

        let encoder = config.encoder.build()?;
        info!(
            "Encoder {} ready ({} dimensions)",
            encoder.model_name(),
            encoder.dimension()
        );

        let engine = RerankingEngine::new(store.similarity(), store.catalog(), encoder)
            .with_config(config.engine.clone());

        let mut service = Self::new(engine);
        service.request_timeout = config.request_timeout();
        Ok(service)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn engine(&self) -> &RerankingEngine {
        &self.engine
    }

    pub async fn recommend(&self, query: RecommendQuery) -> Result<Recommendation, ServiceError> {
        let request = query.to_request()?;

        let engine = self.engine.clone();
        let task_request = request.clone();
        let task = tokio::task::spawn_blocking(move || engine.recommend_explained(&task_request));

        let joined = match self.request_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, task).await {
                Ok(joined) => joined,
                Err(_) => return self.on_timeout(&request, timeout),
            },
            None => task.await,
        };

        let recommendation = joined.map_err(|e| ServiceError::Task(e.to_string()))??;
        Ok(recommendation)
    }

    /// Run [`recommend`](Self::recommend) on a private runtime from synchronous code.
    ///
    /// Must not be called from inside a tokio runtime. The runtime is shut
    /// down without waiting for an inference thread left behind by a
    /// timeout, so the call returns within the configured budget.
    pub fn recommend_blocking(&self, query: RecommendQuery) -> Result<Recommendation, ServiceError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| ServiceError::Task(format!("failed to start runtime: {}", e)))?;
        let result = runtime.block_on(self.recommend(query));
        runtime.shutdown_background();
        result
    }

    /// The inference thread cannot be cancelled. It keeps running on the
    /// blocking pool, its result is discarded, and callers owning the
    /// runtime must shut it down without waiting for that thread.
    fn on_timeout(
        &self,
        request: &RecommendationRequest,
        timeout: Duration,
    ) -> Result<Recommendation, ServiceError> {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        match self.engine.config().encoder_failure {
            EncoderFailurePolicy::Fallback => {
                warn!(
                    "Recommendation for {} timed out after {} ms, using pool order",
                    request.parent_id, millis
                );
                Ok(self.engine.fallback(request, FallbackReason::EncoderTimeout)?)
            }
            EncoderFailurePolicy::Propagate => Err(Error::EncoderTimeout(millis).into()),
        }
    }

    /// Release the engine and the encoder it holds
    pub fn shutdown(self) {
        info!(
            "Shutting down encoder {}",
            self.engine.encoder().model_name()
        );
        drop(self.engine);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfmate_core::{Embedding, ProductDescription, ProductId, SimilarityEntry, TextEncoder};
    use shelfmate_rerank::{EngineConfig, HashingEncoder, RankingStrategy};
    use shelfmate_storage::{InMemoryCatalog, SimilarityTable};

    struct SlowEncoder(Duration);

    impl TextEncoder for SlowEncoder {
        fn encode(&self, texts: &[String]) -> shelfmate_core::Result<Vec<Embedding>> {
            std::thread::sleep(self.0);
            Ok(texts.iter().map(|_| Embedding::new(vec![1.0, 0.0])).collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "slow"
        }
    }

    fn engine(encoder: Arc<dyn TextEncoder>) -> RerankingEngine {
        let mut table = SimilarityTable::new();
        table.insert_row(
            "tent",
            vec![
                SimilarityEntry::new("tent", 1.0),
                SimilarityEntry::new("kettle", 0.9),
                SimilarityEntry::new("stakes", 0.8),
            ],
        );
        let mut catalog = InMemoryCatalog::new();
        catalog.insert("tent", ProductDescription::new("Camping tent", "Two person camping tent"));
        catalog.insert("kettle", ProductDescription::new("Electric kettle", "Stainless steel"));
        catalog.insert("stakes", ProductDescription::new("Camping tent stakes", "For any camping tent"));
        RerankingEngine::new(Arc::new(table), Arc::new(catalog), encoder)
    }

    #[test]
    fn test_query_deserializes_client_shape() {
        let query: RecommendQuery =
            serde_json::from_str(r#"{"parentId": "tent", "complementary": true}"#).unwrap();
        assert_eq!(query, RecommendQuery::new("tent", true));

        let request = query.to_request().unwrap();
        assert_eq!(request.parent_id, ProductId::from("tent"));
        assert_eq!(request.mode, RecommendationMode::Complementary);
        assert_eq!((request.k, request.pool_size), (3, 10));
    }

    #[test]
    fn test_missing_parent_id() {
        let query: RecommendQuery = serde_json::from_str(r#"{"complementary": true}"#).unwrap();
        assert!(matches!(
            query.to_request(),
            Err(ServiceError::MissingParameter("parentId"))
        ));

        let blank = RecommendQuery::new("  ", false);
        assert!(matches!(blank.to_request(), Err(ServiceError::MissingParameter(_))));
    }

    #[test]
    fn test_invalid_k_rejected() {
        let query = RecommendQuery {
            k: Some(-2),
            ..RecommendQuery::new("tent", false)
        };
        assert!(matches!(
            query.to_request(),
            Err(ServiceError::Engine(Error::InvalidInput(_)))
        ));
    }

    #[tokio::test]
    async fn test_recommend_reranks() {
        let service = RecommendationService::new(engine(Arc::new(HashingEncoder::default())));
        let rec = service
            .recommend(RecommendQuery {
                k: Some(1),
                ..RecommendQuery::new("tent", false)
            })
            .await
            .unwrap();
        // Shares most vocabulary with the parent despite the lower table score
        assert_eq!(rec.ids, vec![ProductId::from("stakes")]);
        assert!(matches!(rec.strategy, RankingStrategy::Reranked { .. }));
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_pool_order() {
        let service = RecommendationService::new(engine(Arc::new(SlowEncoder(Duration::from_millis(300)))))
            .with_request_timeout(Duration::from_millis(20));
        let rec = service.recommend(RecommendQuery::new("tent", true)).await.unwrap();
        assert_eq!(rec.ids, vec![ProductId::from("kettle"), ProductId::from("stakes")]);
        assert_eq!(
            rec.strategy,
            RankingStrategy::PoolOrder {
                reason: FallbackReason::EncoderTimeout
            }
        );
    }

    #[tokio::test]
    async fn test_timeout_propagates_when_configured() {
        let engine = engine(Arc::new(SlowEncoder(Duration::from_millis(300)))).with_config(EngineConfig {
            encoder_failure: EncoderFailurePolicy::Propagate,
            ..EngineConfig::default()
        });
        let service = RecommendationService::new(engine).with_request_timeout(Duration::from_millis(20));
        let err = service.recommend(RecommendQuery::new("tent", true)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Engine(Error::EncoderTimeout(20))));
    }

    #[test]
    fn test_blocking_recommend_returns_within_timeout() {
        let service = RecommendationService::new(engine(Arc::new(SlowEncoder(Duration::from_millis(1500)))))
            .with_request_timeout(Duration::from_millis(50));

        let started = std::time::Instant::now();
        let rec = service
            .recommend_blocking(RecommendQuery::new("tent", false))
            .unwrap();
        let elapsed = started.elapsed();

        assert!(rec.is_fallback());
        assert!(elapsed < Duration::from_millis(1000), "took {:?}", elapsed);
    }

    #[test]
    fn test_timeout_millis_saturate() {
        let engine = engine(Arc::new(HashingEncoder::default())).with_config(EngineConfig {
            encoder_failure: EncoderFailurePolicy::Propagate,
            ..EngineConfig::default()
        });
        let service = RecommendationService::new(engine);
        let request = RecommendationRequest::new("tent", RecommendationMode::Similar);
        let err = service.on_timeout(&request, Duration::MAX).unwrap_err();
        assert!(matches!(err, ServiceError::Engine(Error::EncoderTimeout(u64::MAX))));
    }

    #[tokio::test]
    async fn test_unknown_parent_is_empty() {
        let service = RecommendationService::new(engine(Arc::new(HashingEncoder::default())));
        let rec = service.recommend(RecommendQuery::new("P2", false)).await.unwrap();
        assert!(rec.ids.is_empty());
    }
}
