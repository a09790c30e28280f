// SPDX-License-Identifier: MIT

//! Model module - the LLM collaborator contract and its implementations
//!
//! The core consumes models through two operations only:
//! - [`Model::invoke`] - free-text generation
//! - [`invoke_structured`] - schema-constrained generation into a typed value
//!
//! Provider implementations are in their own submodules:
//! - [anthropic] - Anthropic's Claude API
//! - [gemini] - Google's Gemini API
//! - [openai] - OpenAI's ChatGPT API

pub mod anthropic;
pub mod gemini;
pub mod openai;

use crate::error::ModelError;
use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Core trait for LLM model implementations
///
/// `invoke_json` has a default implementation that embeds the schema into
/// the prompt and extracts JSON from the reply; providers with native
/// structured-output modes may override it.
#[async_trait]
pub trait Model: Send + Sync {
    /// Free-text generation
    async fn invoke(&self, prompt: &str) -> Result<String, ModelError>;

    /// Generation constrained to a JSON schema
    async fn invoke_json(&self, prompt: &str, schema: &Value) -> Result<Value, ModelError> {
        let framed = format!(
            "{prompt}\n\nRespond with a single JSON object matching this JSON schema, \
             with no prose before or after it:\n{}",
            serde_json::to_string_pretty(schema).unwrap_or_default()
        );
        let text = self.invoke(&framed).await?;
        extract_json(&text)
            .ok_or_else(|| ModelError::InvalidResponse(truncate_for_error(&text)))
    }
}

/// Schema-constrained generation into a typed value
///
/// Derives the schema from `T` via schemars, asks the model for JSON, and
/// deserializes. Malformed output surfaces as `ModelError::InvalidResponse`
/// so nodes can apply their degraded-output fallbacks.
pub async fn invoke_structured<T>(model: &Arc<dyn Model>, prompt: &str) -> Result<T, ModelError>
where
    T: DeserializeOwned + JsonSchema,
{
    let schema = serde_json::to_value(schema_for!(T))
        .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;
    let value = model.invoke_json(prompt, &schema).await?;
    serde_json::from_value(value).map_err(|e| ModelError::InvalidResponse(e.to_string()))
}

/// Pull a JSON object out of model text
///
/// Tries, in order: the whole reply, a ```json fenced block, and the
/// outermost brace span. Models wrap JSON in prose at a nonzero rate, so
/// every structured call goes through this chain.
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        return Some(v);
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        if let Some(end) = after.find("```") {
            if let Ok(v) = serde_json::from_str::<Value>(after[..end].trim()) {
                return Some(v);
            }
        }
    }

    let start = trimmed.find(['{', '['])?;
    let last = trimmed.rfind(['}', ']'])?;
    if last > start {
        if let Ok(v) = serde_json::from_str::<Value>(&trimmed[start..=last]) {
            return Some(v);
        }
    }
    None
}

fn truncate_for_error(text: &str) -> String {
    const LIMIT: usize = 200;
    if text.len() > LIMIT {
        let mut end = LIMIT;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    } else {
        text.to_string()
    }
}

/// Build a model from a provider/model-name pair, inferring the provider
/// from the model name when it is not given explicitly.
pub fn from_env(
    provider: Option<&str>,
    model_name: &str,
) -> Result<Arc<dyn Model>, ModelError> {
    let provider = provider
        .map(str::to_string)
        .or_else(|| std::env::var("MODEL_PROVIDER").ok())
        .unwrap_or_else(|| {
            if model_name.starts_with("gpt") {
                "openai".to_string()
            } else if model_name.starts_with("claude") {
                "anthropic".to_string()
            } else {
                "gemini".to_string()
            }
        });

    log::info!("Using provider: {} with model: {}", provider, model_name);

    match provider.to_ascii_lowercase().as_str() {
        "openai" => Ok(Arc::new(openai::OpenAIModel::new(model_name.to_string())?)),
        "anthropic" => Ok(Arc::new(anthropic::AnthropicModel::new(
            model_name.to_string(),
        )?)),
        _ => Ok(Arc::new(gemini::GeminiModel::new(model_name.to_string())?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_extract_json_plain() {
        assert_eq!(extract_json(r#"{"a": 1}"#), Some(json!({"a": 1})));
    }

    #[test]
    fn test_extract_json_fenced() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\nHope that helps.";
        assert_eq!(extract_json(text), Some(json!({"a": 1})));
    }

    #[test]
    fn test_extract_json_embedded() {
        let text = "The answer is {\"verdict\": \"sufficient\"} as requested.";
        assert_eq!(extract_json(text), Some(json!({"verdict": "sufficient"})));
    }

    #[test]
    fn test_extract_json_none() {
        assert_eq!(extract_json("no json here at all"), None);
    }

    struct EchoModel(String);

    #[async_trait]
    impl Model for EchoModel {
        async fn invoke(&self, _prompt: &str) -> Result<String, ModelError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    struct Verdict {
        sufficient: bool,
    }

    #[tokio::test]
    async fn test_invoke_structured_parses_typed_value() {
        let model: Arc<dyn Model> =
            Arc::new(EchoModel(r#"Sure: {"sufficient": true}"#.to_string()));
        let v: Verdict = invoke_structured(&model, "evaluate").await.unwrap();
        assert_eq!(v, Verdict { sufficient: true });
    }

    #[tokio::test]
    async fn test_invoke_structured_malformed_is_invalid_response() {
        let model: Arc<dyn Model> = Arc::new(EchoModel("not json".to_string()));
        let result = invoke_structured::<Verdict>(&model, "evaluate").await;
        assert!(matches!(result, Err(ModelError::InvalidResponse(_))));
    }
}
