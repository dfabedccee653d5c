//! Interfaces the reranking engine consumes
//!
//! The engine never sees storage formats or model internals: only
//! "present" or "absent" descriptions, ranked candidate ids, and
//! unit-norm embeddings.

use crate::{Embedding, ProductDescription, ProductId, Result};

/// Precomputed item-item similarity lookup
pub trait SimilarityTableProvider: Send + Sync {
    /// Up to `k` candidates for `id` in descending score order.
    ///
    /// Implementations must exclude `id` itself and return an empty
    /// vector for unknown ids.
    fn top_candidates(&self, id: &ProductId, k: usize) -> Vec<ProductId>;
}

/// Product id to description lookup
pub trait CatalogLookup: Send + Sync {
    fn describe(&self, id: &ProductId) -> Option<ProductDescription>;
}

/// Batch text encoder backed by a loaded embedding model
///
/// Implementations are shared process-wide behind an `Arc` and must be
/// safe for concurrent `encode` calls. Encoders that need exclusive
/// access can be wrapped in a serializing adapter.
pub trait TextEncoder: Send + Sync {
    /// One unit-norm embedding per input text, in input order
    fn encode(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    /// Width of every embedding this encoder produces
    fn dimension(&self) -> usize;

    /// Model name/identifier
    fn model_name(&self) -> &str;
}
