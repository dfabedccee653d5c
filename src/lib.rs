//! # Shelfmate
//!
//! Complementary and similar product recommendations.
//!
//! Shelfmate narrows a large catalog to a shortlist with a precomputed
//! item-item similarity table, then reranks that shortlist by
//! text-embedding similarity to the parent product. The parent text is
//! framed with a "complementary" or "similar" instruction so the same
//! shortlist can be ordered two different ways.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! shelfmate snapshot --data-dir ./data
//! shelfmate recommend --data-dir ./data --parent-id B00X1 --complementary -k 3
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use shelfmate::prelude::*;
//!
//! # async fn run() -> std::result::Result<(), ServiceError> {
//! let config = ShelfmateConfig::default();
//! let service = RecommendationService::from_config(&config)?;
//!
//! let recommendation = service
//!     .recommend(RecommendQuery::new("B00X1", true))
//!     .await?;
//! println!("{:?}", recommendation.ids);
//!
//! service.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - `shelfmate-core` - Product ids, descriptions, embeddings, collaborator traits
//! - `shelfmate-storage` - In-memory catalog, similarity table, dataset snapshots
//! - `shelfmate-rerank` - Prompt framing, encoders, the reranking engine

pub mod config;
pub mod service;

pub use config::{EncoderConfig, ShelfmateConfig};
pub use service::{RecommendQuery, RecommendationService, ServiceError};

// Re-export core types
pub use shelfmate_core::{
    CatalogLookup, Embedding, Error, ProductDescription, ProductId, Result, SimilarityEntry,
    SimilarityTableProvider, TextEncoder,
};

// Re-export storage
pub use shelfmate_storage::{DataStore, InMemoryCatalog, SimilarityTable, SnapshotManager};

// Re-export engine
pub use shelfmate_rerank::{
    EngineConfig, FallbackReason, HashingEncoder, HttpEncoder, RankingStrategy, Recommendation,
    RecommendationMode, RecommendationRequest, RerankingEngine,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CatalogLookup, DataStore, Embedding, EngineConfig, Error, HashingEncoder,
        InMemoryCatalog, ProductDescription, ProductId, RecommendQuery, Recommendation,
        RecommendationMode, RecommendationRequest, RecommendationService, RerankingEngine,
        Result, ServiceError, ShelfmateConfig, SimilarityTable, SimilarityTableProvider,
        TextEncoder,
    };
}
