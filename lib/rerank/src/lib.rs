//! # Shelfmate Rerank
//!
//! Retrieval-then-rerank engine for "complementary" and "similar" product
//! recommendations.
//!
//! ## Features
//!
//! - **Candidate retrieval**: shortlist from a precomputed similarity table
//! - **Mode framing**: the parent text is prefixed with a complementary or
//!   similar instruction before embedding
//! - **Semantic reranking**: stable cosine-similarity ordering of the shortlist
//! - **Graceful fallback**: pool order whenever text or the encoder is unavailable
//!
//! ## Example
//!
//! ```rust
//! use shelfmate_core::{ProductDescription, SimilarityEntry};
//! use shelfmate_rerank::{HashingEncoder, RecommendationMode, RecommendationRequest, RerankingEngine};
//! use shelfmate_storage::{InMemoryCatalog, SimilarityTable};
//! use std::sync::Arc;
//!
//! let mut table = SimilarityTable::new();
//! table.insert_row("tent", vec![
//!     SimilarityEntry::new("tent", 1.0),
//!     SimilarityEntry::new("stakes", 0.8),
//!     SimilarityEntry::new("kettle", 0.7),
//! ]);
//!
//! let mut catalog = InMemoryCatalog::new();
//! catalog.insert("tent", ProductDescription::new("Camping tent", "Two person"));
//! catalog.insert("stakes", ProductDescription::new("Tent stakes", "Aluminium"));
//! catalog.insert("kettle", ProductDescription::new("Electric kettle", "1.7 litre"));
//!
//! let engine = RerankingEngine::new(
//!     Arc::new(table),
//!     Arc::new(catalog),
//!     Arc::new(HashingEncoder::default()),
//! );
//!
//! let request = RecommendationRequest::new("tent", RecommendationMode::Complementary).with_k(1);
//! let ids = engine.recommend(&request).unwrap();
//! assert_eq!(ids.len(), 1);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Similarity  │────>│  Candidate  │────>│   Catalog   │
//! │   table     │     │    pool     │     │ (describe)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │   Cosine    │<────│   Encoder   │
//!                     │    rank     │     │ (one batch) │
//!                     └─────────────┘     └─────────────┘
//!                            │
//!                     ┌─────────────┐
//!                     │  top-k ids  │
//!                     └─────────────┘
//! ```

pub mod encoder;
pub mod engine;
pub mod prompt;
pub mod rank;

pub use encoder::{
    EncoderMut, HashingEncoder, HttpEncoder, SerializedEncoder, DEFAULT_HASHING_DIM,
    DEFAULT_HTTP_TIMEOUT_SECS,
};
pub use engine::{
    EncoderFailurePolicy, EngineConfig, FallbackReason, RankingStrategy, Recommendation,
    RecommendationRequest, RerankingEngine, DEFAULT_K, DEFAULT_POOL_SIZE,
};
pub use prompt::{PromptTemplates, RecommendationMode, COMPLEMENTARY_PROMPT, SIMILAR_PROMPT};
pub use rank::{cosine_scores, rank_by_score};
