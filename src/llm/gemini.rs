// SPDX-License-Identifier: MIT

//! Gemini Model - Google Gemini API implementation

use super::Model;
use crate::error::ModelError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::env;

/// Google Gemini model implementation
pub struct GeminiModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl GeminiModel {
    /// Create a new GeminiModel
    ///
    /// Requires `GEMINI_API_KEY` environment variable to be set.
    pub fn new(model_name: String) -> Result<Self, ModelError> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| ModelError::ApiKeyMissing("gemini".to_string()))?;
        let base_url = env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
            base_url,
        })
    }
}

#[async_trait]
impl Model for GeminiModel {
    async fn invoke(&self, prompt: &str) -> Result<String, ModelError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model_name, self.api_key
        );

        let body = json!({
            "contents": [
                {"parts": [{"text": prompt}]}
            ]
        });

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                provider: "gemini".to_string(),
                message: format!("{}: {}", status, text),
            });
        }

        let value: serde_json::Value = response.json().await?;
        let text: String = value["candidates"]
            .as_array()
            .and_then(|c| c.first())
            .and_then(|c| c["content"]["parts"].as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ModelError::InvalidResponse(
                "No candidates in Gemini response".to_string(),
            ));
        }
        Ok(text)
    }
}
