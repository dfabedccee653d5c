//! # Shelfmate Core
//!
//! Core types for the Shelfmate recommendation engine.
//!
//! This crate provides the data model shared by every other crate:
//!
//! - [`ProductId`] - Opaque product identifier
//! - [`ProductDescription`] - Title and body text used for semantic ranking
//! - [`SimilarityEntry`] - One precomputed item-item affinity
//! - [`Embedding`] - Dense text embedding
//! - [`SimilarityTableProvider`], [`CatalogLookup`], [`TextEncoder`] - The
//!   collaborator interfaces the reranking engine consumes
//!
//! ## Example
//!
//! ```rust
//! use shelfmate_core::{Embedding, ProductDescription};
//!
//! let desc = ProductDescription::new("Pour-over kettle", "Gooseneck spout");
//! assert_eq!(desc.text(), "Pour-over kettle. Gooseneck spout");
//!
//! let a = Embedding::new(vec![1.0, 0.0]);
//! let b = Embedding::new(vec![0.6, 0.8]);
//! assert!((a.cosine_similarity(&b) - 0.6).abs() < 1e-6);
//! ```

pub mod embedding;
pub mod error;
pub mod product;
pub mod traits;

pub use embedding::Embedding;
pub use error::{Error, Result};
pub use product::{ProductDescription, ProductId, SimilarityEntry};
pub use traits::{CatalogLookup, SimilarityTableProvider, TextEncoder};
