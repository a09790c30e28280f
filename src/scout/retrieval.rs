// SPDX-License-Identifier: MIT

//! Vector retrieval collaborator contract
//!
//! The core only needs `similarity_search_with_score`; real embedding
//! backends live outside this crate. [`MemoryVectorStore`] is the dev/test
//! stand-in: a token-overlap scorer over documents loaded from a directory.

use crate::error::ScoutError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// A retrievable document
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub metadata: HashMap<String, String>,
}

/// Similarity search over a document collection
///
/// Scores are distances (lower is closer); convert with
/// [`relevance_from_distance`].
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<(Document, f32)>, ScoutError>;
}

/// Convert a distance to a 0-1 relevance score
pub fn relevance_from_distance(distance: f32) -> f32 {
    (1.0 - distance).clamp(0.0, 1.0)
}

/// In-memory store scoring by token overlap. Good enough for local
/// knowledge bases and deterministic tests; swap in a real vector backend
/// behind the same trait for production.
#[derive(Default)]
pub struct MemoryVectorStore {
    docs: Vec<Document>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, content: &str, source: &str) {
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), source.to_string());
        self.docs.push(Document {
            content: content.to_string(),
            metadata,
        });
    }

    /// Load every `.md` and `.txt` file under `dir` as one document each
    pub fn from_dir(dir: &Path) -> Result<Self, ScoutError> {
        let mut store = Self::new();
        if !dir.exists() {
            return Ok(store);
        }
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_text = path
                .extension()
                .is_some_and(|ext| ext == "md" || ext == "txt");
            if is_text {
                let content = std::fs::read_to_string(&path)?;
                store.add(&content, &path.to_string_lossy());
            }
        }
        log::info!("Loaded {} knowledge-base documents", store.docs.len());
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn distance(query_tokens: &HashSet<String>, doc: &Document) -> f32 {
        if query_tokens.is_empty() {
            return 1.0;
        }
        let doc_tokens: HashSet<String> = tokenize(&doc.content);
        let overlap = query_tokens.intersection(&doc_tokens).count();
        1.0 - (overlap as f32 / query_tokens.len() as f32)
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<(Document, f32)>, ScoutError> {
        let query_tokens = tokenize(query);
        let mut scored: Vec<(Document, f32)> = self
            .docs
            .iter()
            .map(|d| (d.clone(), Self::distance(&query_tokens, d)))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relevance_from_distance() {
        assert_eq!(relevance_from_distance(0.0), 1.0);
        assert_eq!(relevance_from_distance(1.0), 0.0);
        assert_eq!(relevance_from_distance(1.5), 0.0);
        assert_eq!(relevance_from_distance(0.25), 0.75);
    }

    #[tokio::test]
    async fn test_memory_store_ranks_by_overlap() {
        let mut store = MemoryVectorStore::new();
        store.add("rust ownership and borrowing rules", "rust.md");
        store.add("python garbage collection internals", "python.md");

        let hits = store
            .similarity_search_with_score("rust borrowing", 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.metadata["source"], "rust.md");
        assert!(hits[0].1 < hits[1].1);
    }

    #[tokio::test]
    async fn test_memory_store_truncates_to_k() {
        let mut store = MemoryVectorStore::new();
        for i in 0..5 {
            store.add(&format!("document number {}", i), "kb");
        }
        let hits = store
            .similarity_search_with_score("document", 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
    }
}
