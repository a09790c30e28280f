// SPDX-License-Identifier: MIT

//! OpenAI Model - ChatGPT API implementation

use super::Model;
use crate::error::ModelError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::env;

/// OpenAI ChatGPT model implementation
pub struct OpenAIModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl OpenAIModel {
    /// Create a new OpenAIModel
    ///
    /// Requires `OPENAI_API_KEY` environment variable to be set.
    /// Optionally uses `OPENAI_BASE_URL` for custom endpoints.
    pub fn new(model_name: String) -> Result<Self, ModelError> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| ModelError::ApiKeyMissing("openai".to_string()))?;
        let base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
            base_url,
        })
    }
}

#[async_trait]
impl Model for OpenAIModel {
    async fn invoke(&self, prompt: &str) -> Result<String, ModelError> {
        let body = json!({
            "model": self.model_name,
            "messages": [
                {"role": "user", "content": prompt}
            ]
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                provider: "openai".to_string(),
                message: format!("{}: {}", status, text),
            });
        }

        let value: serde_json::Value = response.json().await?;
        value["choices"]
            .as_array()
            .and_then(|c| c.first())
            .and_then(|c| c["message"]["content"].as_str())
            .map(str::to_string)
            .ok_or_else(|| ModelError::InvalidResponse("No choices in OpenAI response".to_string()))
    }
}
