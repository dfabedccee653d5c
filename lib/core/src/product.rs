use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque product identifier shared by the catalog and the similarity table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        ProductId(s.to_string())
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        ProductId(s)
    }
}

impl Borrow<str> for ProductId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Textual description of a product used for semantic ranking
///
/// `body` holds the first element of the source description list and is
/// empty when that list was empty or null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDescription {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl ProductDescription {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Text fed to the encoder: `"{title}. {body}"`
    pub fn text(&self) -> String {
        format!("{}. {}", self.title, self.body)
    }
}

/// One row of the precomputed item-item similarity table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEntry {
    pub candidate: ProductId,
    pub score: f32,
}

impl SimilarityEntry {
    pub fn new(candidate: impl Into<ProductId>, score: f32) -> Self {
        Self {
            candidate: candidate.into(),
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_description_text() {
        let desc = ProductDescription::new("Espresso Machine", "15 bar pump");
        assert_eq!(desc.text(), "Espresso Machine. 15 bar pump");
    }

    #[test]
    fn test_description_text_empty_body() {
        let desc = ProductDescription::new("Milk Frother", "");
        assert_eq!(desc.text(), "Milk Frother. ");
    }

    #[test]
    fn test_product_id_borrow_lookup() {
        let mut map = HashMap::new();
        map.insert(ProductId::from("B00X1"), 1);
        assert_eq!(map.get("B00X1"), Some(&1));
    }

    #[test]
    fn test_product_id_serializes_as_string() {
        let id = ProductId::new("B00X1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"B00X1\"");
        let back: ProductId = serde_json::from_str("\"B00X2\"").unwrap();
        assert_eq!(back.as_str(), "B00X2");
    }
}
