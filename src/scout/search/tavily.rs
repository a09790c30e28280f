// SPDX-License-Identifier: MIT

//! Tavily Search provider

use super::WebSearch;
use crate::error::SearchError;
use crate::scout::research::types::SearchHit;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::env;

const ENDPOINT: &str = "https://api.tavily.com/search";

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: Option<f32>,
}

/// Tavily search API provider
pub struct TavilySearch {
    client: Client,
    api_key: String,
}

impl TavilySearch {
    /// Requires `TAVILY_API_KEY` environment variable to be set
    pub fn new() -> Result<Self, SearchError> {
        let api_key = env::var("TAVILY_API_KEY").map_err(|_| SearchError::Provider {
            provider: "tavily".to_string(),
            message: "TAVILY_API_KEY must be set".to_string(),
        })?;
        Ok(Self {
            client: Client::new(),
            api_key,
        })
    }
}

#[async_trait]
impl WebSearch for TavilySearch {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let provider_err = |message: String| SearchError::Provider {
            provider: "tavily".to_string(),
            message,
        };

        let body = json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
            "include_answer": false,
        });

        let response = self
            .client
            .post(ENDPOINT)
            .json(&body)
            .send()
            .await
            .map_err(|e| provider_err(e.to_string()))?;

        if !response.status().is_success() {
            return Err(provider_err(format!("HTTP {}", response.status())));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| provider_err(e.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .take(max_results)
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                content: r.content,
                score: r.score,
                source: "tavily".to_string(),
            })
            .collect())
    }
}
