// SPDX-License-Identifier: MIT

//! Web search collaborator with provider-level fallback
//!
//! Providers implement [`WebSearch`]; [`SearchRouter`] tries them in
//! configuration order and falls back to the next one on failure. Which
//! providers are configured is discoverable for health reporting.

pub mod brave;
pub mod tavily;

use crate::error::SearchError;
use crate::scout::research::types::SearchHit;
use async_trait::async_trait;
use std::sync::Arc;

/// One web search provider
#[async_trait]
pub trait WebSearch: Send + Sync {
    fn name(&self) -> &str;

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError>;
}

/// Ordered provider chain with automatic fallback
pub struct SearchRouter {
    providers: Vec<Arc<dyn WebSearch>>,
}

impl SearchRouter {
    pub fn new(providers: Vec<Arc<dyn WebSearch>>) -> Self {
        Self { providers }
    }

    /// Build the chain from configured environment keys: Tavily first,
    /// then Brave
    pub fn from_env() -> Self {
        let mut providers: Vec<Arc<dyn WebSearch>> = Vec::new();
        match tavily::TavilySearch::new() {
            Ok(p) => providers.push(Arc::new(p)),
            Err(e) => log::warn!("Tavily not configured: {}", e),
        }
        match brave::BraveSearch::new() {
            Ok(p) => providers.push(Arc::new(p)),
            Err(e) => log::warn!("Brave not configured: {}", e),
        }
        if providers.is_empty() {
            log::warn!("No web search provider configured; searches will fail in-band");
        }
        Self::new(providers)
    }

    /// Names of the configured providers, in fallback order
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Search via the first provider that succeeds
    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if self.providers.is_empty() {
            return Err(SearchError::NoProviders);
        }

        let mut failures = Vec::new();
        for provider in &self.providers {
            match provider.search(query, max_results).await {
                Ok(hits) => {
                    log::info!(
                        "Provider '{}' returned {} hits for '{}'",
                        provider.name(),
                        hits.len(),
                        query
                    );
                    return Ok(hits);
                }
                Err(e) => {
                    log::warn!("Provider '{}' failed, falling back: {}", provider.name(), e);
                    failures.push(provider.name().to_string());
                }
            }
        }
        Err(SearchError::AllProvidersFailed(failures))
    }
}
