//! Query handling
//!
//! A crawl is driven by one free-text search term. Everything the crawl writes
//! is namespaced by the term's [`QueryKey`], a romanized, filesystem-safe form.

mod romanize;

pub use romanize::romanize;

use crate::HarvestError;
use std::fmt;

/// The search term submitted to the registry listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    key: QueryKey,
}

impl Query {
    /// Creates a query and derives its key
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::InvalidQuery` when the term is blank or has no
    /// characters left after normalization.
    pub fn new(text: &str) -> Result<Self, HarvestError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(HarvestError::InvalidQuery(
                "query cannot be empty".to_string(),
            ));
        }
        let key = QueryKey::derive(text)?;
        Ok(Self {
            text: text.to_string(),
            key,
        })
    }

    /// The term exactly as typed into the search box
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Identifier-safe normalized form of a query
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    /// Romanizes the term, joins words with `_`, and drops anything outside
    /// `[A-Za-z0-9_-]`
    pub fn derive(text: &str) -> Result<Self, HarvestError> {
        let romanized = romanize(text);
        let joined = romanized.split_whitespace().collect::<Vec<_>>().join("_");
        let key: String = joined
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();

        if key.trim_matches('_').is_empty() {
            return Err(HarvestError::InvalidQuery(format!(
                "query '{}' has no characters usable in a record key",
                text
            )));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
