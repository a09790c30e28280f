// SPDX-License-Identifier: MIT

//! Brave Search provider

use super::WebSearch;
use crate::error::SearchError;
use crate::scout::research::types::SearchHit;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::env;

const ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: BraveWeb,
}

#[derive(Debug, Deserialize, Default)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}

/// Brave Search API provider
pub struct BraveSearch {
    client: Client,
    api_key: String,
}

impl BraveSearch {
    /// Requires `BRAVE_API_KEY` environment variable to be set
    pub fn new() -> Result<Self, SearchError> {
        let api_key = env::var("BRAVE_API_KEY").map_err(|_| SearchError::Provider {
            provider: "brave".to_string(),
            message: "BRAVE_API_KEY must be set".to_string(),
        })?;
        Ok(Self {
            client: Client::new(),
            api_key,
        })
    }
}

#[async_trait]
impl WebSearch for BraveSearch {
    fn name(&self) -> &str {
        "brave"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let provider_err = |message: String| SearchError::Provider {
            provider: "brave".to_string(),
            message,
        };

        let mut url = reqwest::Url::parse(ENDPOINT).map_err(|e| provider_err(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("count", &max_results.min(20).to_string());

        let response = self
            .client
            .get(url)
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| provider_err(e.to_string()))?;

        if !response.status().is_success() {
            return Err(provider_err(format!("HTTP {}", response.status())));
        }

        let parsed: BraveResponse = response
            .json()
            .await
            .map_err(|e| provider_err(e.to_string()))?;

        Ok(parsed
            .web
            .results
            .into_iter()
            .take(max_results)
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                content: r.description,
                score: None,
                source: "brave".to_string(),
            })
            .collect())
    }
}
