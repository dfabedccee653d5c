//! Retrieval-then-rerank recommendation engine
//!
//! 1. The similarity table narrows the catalog to a candidate pool.
//! 2. The parent text, framed by a mode-specific instruction, and the raw
//!    candidate texts are embedded in a single encoder call.
//! 3. Candidates are reordered by cosine similarity to the parent and
//!    the top `k` are returned.
//!
//! Missing text never fails a request: when the parent or every candidate
//! lacks a description the pool order is returned as-is.

use crate::prompt::{PromptTemplates, RecommendationMode};
use crate::rank::{cosine_scores, rank_by_score};
use serde::{Deserialize, Serialize};
use shelfmate_core::{
    CatalogLookup, Error, ProductDescription, ProductId, Result, SimilarityTableProvider,
    TextEncoder,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Number of recommendations returned by default
pub const DEFAULT_K: usize = 3;

/// Number of similarity-table candidates considered by default
pub const DEFAULT_POOL_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub parent_id: ProductId,
    #[serde(default)]
    pub mode: RecommendationMode,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_k() -> usize {
    DEFAULT_K
}

fn default_pool_size() -> usize {
    DEFAULT_POOL_SIZE
}

impl RecommendationRequest {
    pub fn new(parent_id: impl Into<ProductId>, mode: RecommendationMode) -> Self {
        Self {
            parent_id: parent_id.into(),
            mode,
            k: DEFAULT_K,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }

    /// Build from caller-supplied signed values; non-positive `k` and
    /// negative `pool_size` are rejected, never clamped.
    pub fn try_from_signed(
        parent_id: impl Into<ProductId>,
        mode: RecommendationMode,
        k: i64,
        pool_size: i64,
    ) -> Result<Self> {
        if k <= 0 {
            return Err(Error::InvalidInput(format!("k must be positive, got {}", k)));
        }
        if pool_size < 0 {
            return Err(Error::InvalidInput(format!(
                "pool_size must not be negative, got {}",
                pool_size
            )));
        }
        let k = usize::try_from(k).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let pool_size = usize::try_from(pool_size).map_err(|e| Error::InvalidInput(e.to_string()))?;
        Ok(Self::new(parent_id, mode).with_k(k).with_pool_size(pool_size))
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::InvalidInput("k must be positive, got 0".to_string()));
        }
        Ok(())
    }
}

/// What to do when the encoder errors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderFailurePolicy {
    /// Log and return the pool order
    #[default]
    Fallback,
    /// Return the encoder error to the caller
    Propagate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub prompts: PromptTemplates,
    pub encoder_failure: EncoderFailurePolicy,
    /// Drop repeated candidate ids (first occurrence wins). Off by default:
    /// the similarity table output passes through untouched.
    pub dedupe_candidates: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    ParentDescriptionMissing,
    CandidateDescriptionsMissing,
    EncoderFailure,
    EncoderTimeout,
}

/// How the returned ids were ordered
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum RankingStrategy {
    /// Semantic reranking; `scores[i]` is the cosine similarity of `ids[i]`
    Reranked { scores: Vec<f32> },
    /// Precomputed similarity order
    PoolOrder { reason: FallbackReason },
    /// The parent has no candidates in the similarity table
    NoCandidates,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub parent_id: ProductId,
    pub mode: RecommendationMode,
    pub ids: Vec<ProductId>,
    /// Candidate pool the ids were chosen from, in similarity order
    pub pool: Vec<ProductId>,
    #[serde(flatten)]
    pub strategy: RankingStrategy,
}

impl Recommendation {
    pub fn is_fallback(&self) -> bool {
        matches!(self.strategy, RankingStrategy::PoolOrder { .. })
    }
}

pub struct RerankingEngine {
    similarity: Arc<dyn SimilarityTableProvider>,
    catalog: Arc<dyn CatalogLookup>,
    encoder: Arc<dyn TextEncoder>,
    config: EngineConfig,
}

impl RerankingEngine {
    pub fn new(
        similarity: Arc<dyn SimilarityTableProvider>,
        catalog: Arc<dyn CatalogLookup>,
        encoder: Arc<dyn TextEncoder>,
    ) -> Self {
        Self {
            similarity,
            catalog,
            encoder,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn encoder(&self) -> &Arc<dyn TextEncoder> {
        &self.encoder
    }

    /// Recommended ids for the request
    pub fn recommend(&self, request: &RecommendationRequest) -> Result<Vec<ProductId>> {
        Ok(self.recommend_explained(request)?.ids)
    }

    /// Recommended ids along with the pool and the strategy that ordered them
    pub fn recommend_explained(&self, request: &RecommendationRequest) -> Result<Recommendation> {
        request.validate()?;

        let pool = self.candidate_pool(&request.parent_id, request.pool_size);
        if pool.is_empty() {
            debug!("No candidates for {}", request.parent_id);
            return Ok(Self::no_candidates(request));
        }

        let Some(parent) = self.catalog.describe(&request.parent_id) else {
            debug!("No description for parent {}, using pool order", request.parent_id);
            return Ok(Self::pool_order(request, pool, FallbackReason::ParentDescriptionMissing));
        };

        let candidates: Vec<Option<ProductDescription>> =
            pool.iter().map(|id| self.catalog.describe(id)).collect();
        if candidates.iter().all(Option::is_none) {
            debug!(
                "No candidate descriptions for {}, using pool order",
                request.parent_id
            );
            return Ok(Self::pool_order(
                request,
                pool,
                FallbackReason::CandidateDescriptionsMissing,
            ));
        }

        let texts = self.config.prompts.build_batch(
            request.mode,
            &parent.text(),
            candidates
                .iter()
                .map(|d| d.as_ref().map(ProductDescription::text).unwrap_or_default()),
        );

        let scores = match self.score_batch(&texts) {
            Ok(scores) => scores,
            Err(e)
                if e.is_encoder_error()
                    && self.config.encoder_failure == EncoderFailurePolicy::Fallback =>
            {
                warn!(
                    "Encoder failed for {} ({}), using pool order",
                    request.parent_id, e
                );
                return Ok(Self::pool_order(request, pool, FallbackReason::EncoderFailure));
            }
            Err(e) => return Err(e),
        };

        let top: Vec<usize> = rank_by_score(&scores)
            .into_iter()
            .take(request.k)
            .collect();

        debug!(
            "Reranked {} candidates for {} ({})",
            pool.len(),
            request.parent_id,
            request.mode
        );

        Ok(Recommendation {
            parent_id: request.parent_id.clone(),
            mode: request.mode,
            ids: top.iter().map(|&i| pool[i].clone()).collect(),
            strategy: RankingStrategy::Reranked {
                scores: top.iter().map(|&i| scores[i]).collect(),
            },
            pool,
        })
    }

    /// Pool-order result without touching the encoder
    pub fn fallback(
        &self,
        request: &RecommendationRequest,
        reason: FallbackReason,
    ) -> Result<Recommendation> {
        request.validate()?;
        let pool = self.candidate_pool(&request.parent_id, request.pool_size);
        if pool.is_empty() {
            return Ok(Self::no_candidates(request));
        }
        Ok(Self::pool_order(request, pool, reason))
    }

    /// Up to `pool_size` candidates in similarity order, never containing the parent
    pub fn candidate_pool(&self, parent_id: &ProductId, pool_size: usize) -> Vec<ProductId> {
        // Repeated ids would eat into a bounded fetch, so de-duplication reads the whole row
        let fetch = if self.config.dedupe_candidates {
            usize::MAX
        } else {
            pool_size.saturating_add(1)
        };

        let mut pool: Vec<ProductId> = self
            .similarity
            .top_candidates(parent_id, fetch)
            .into_iter()
            .filter(|id| id != parent_id)
            .collect();

        if self.config.dedupe_candidates {
            let mut seen = HashSet::new();
            pool.retain(|id| seen.insert(id.clone()));
        }

        pool.truncate(pool_size);
        pool
    }

    /// Cosine similarity of the conditioned parent (batch index 0) to each candidate
    fn score_batch(&self, texts: &[String]) -> Result<Vec<f32>> {
        let embeddings = self.encoder.encode(texts)?;
        if embeddings.len() != texts.len() {
            return Err(Error::Encoder(format!(
                "encoder returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }

        let (parent, candidates) = embeddings
            .split_first()
            .ok_or_else(|| Error::Encoder("encoder returned no embeddings".to_string()))?;
        if let Some(bad) = candidates.iter().find(|e| e.dim() != parent.dim()) {
            return Err(Error::InvalidDimension {
                expected: parent.dim(),
                actual: bad.dim(),
            });
        }

        Ok(cosine_scores(parent, candidates))
    }

    fn pool_order(
        request: &RecommendationRequest,
        pool: Vec<ProductId>,
        reason: FallbackReason,
    ) -> Recommendation {
        Recommendation {
            parent_id: request.parent_id.clone(),
            mode: request.mode,
            ids: pool.iter().take(request.k).cloned().collect(),
            pool,
            strategy: RankingStrategy::PoolOrder { reason },
        }
    }

    fn no_candidates(request: &RecommendationRequest) -> Recommendation {
        Recommendation {
            parent_id: request.parent_id.clone(),
            mode: request.mode,
            ids: Vec::new(),
            pool: Vec::new(),
            strategy: RankingStrategy::NoCandidates,
        }
    }
}
