//! Natural-language framing of the parent product
//!
//! The parent text is prefixed with an instruction so the encoder embeds
//! it "as seen by" a shopper looking for complements or look-alikes.
//! Candidate texts are never prefixed.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const COMPLEMENTARY_PROMPT: &str =
    "I am looking for products that complement the following product, meaning they should be bought together.";

pub const SIMILAR_PROMPT: &str = "I am looking for products similar to the following product.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationMode {
    Complementary,
    #[default]
    Similar,
}

impl RecommendationMode {
    pub fn from_complementary(complementary: bool) -> Self {
        if complementary {
            RecommendationMode::Complementary
        } else {
            RecommendationMode::Similar
        }
    }
}

impl fmt::Display for RecommendationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationMode::Complementary => f.write_str("complementary"),
            RecommendationMode::Similar => f.write_str("similar"),
        }
    }
}

/// Instruction prefixes per mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub complementary: String,
    pub similar: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            complementary: COMPLEMENTARY_PROMPT.to_string(),
            similar: SIMILAR_PROMPT.to_string(),
        }
    }
}

impl PromptTemplates {
    pub fn instruction(&self, mode: RecommendationMode) -> &str {
        match mode {
            RecommendationMode::Complementary => &self.complementary,
            RecommendationMode::Similar => &self.similar,
        }
    }

    /// Instruction, one space, then the parent text
    pub fn condition(&self, mode: RecommendationMode, parent_text: &str) -> String {
        format!("{} {}", self.instruction(mode), parent_text)
    }

    /// Encoder batch: conditioned parent first, then raw candidate texts in pool order
    pub fn build_batch(
        &self,
        mode: RecommendationMode,
        parent_text: &str,
        candidate_texts: impl IntoIterator<Item = String>,
    ) -> Vec<String> {
        std::iter::once(self.condition(mode, parent_text))
            .chain(candidate_texts)
            .collect()
    }
}
