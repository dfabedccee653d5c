//! Feature-hashing text encoder
//!
//! Deterministic and model-free: character trigrams and whole words are
//! hashed into a fixed number of buckets and the result is L2-normalized.
//! Texts sharing vocabulary land close together, which is enough to drive
//! the reranker without loading a transformer.

use shelfmate_core::{Embedding, Error, Result, TextEncoder};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Default embedding width
pub const DEFAULT_HASHING_DIM: usize = 256;

const TRIGRAM_WEIGHT: f32 = 1.0;
const WORD_WEIGHT: f32 = 2.0;

#[derive(Debug, Clone)]
pub struct HashingEncoder {
    dimension: usize,
    model_name: String,
}

impl HashingEncoder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidConfig(
                "hashing encoder dimension must be positive".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            model_name: format!("hashing-trigram-{}", dimension),
        })
    }

    fn bucket<T: Hash + ?Sized>(&self, value: &T) -> usize {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        (hasher.finish() % self.dimension as u64) as usize
    }

    /// Embed one text; empty or whitespace-only text maps to the zero vector
    pub fn embed(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimension];
        let normalized = text.to_lowercase();

        for word in normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            vector[self.bucket(word)] += WORD_WEIGHT;

            let padded: Vec<char> = format!("#{}#", word).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                vector[self.bucket(trigram.as_str())] += TRIGRAM_WEIGHT;
            }
        }

        Embedding::new(vector).normalized()
    }
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_HASHING_DIM,
            model_name: format!("hashing-trigram-{}", DEFAULT_HASHING_DIM),
        }
    }
}

impl TextEncoder for HashingEncoder {
    fn encode(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
