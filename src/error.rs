// SPDX-License-Identifier: MIT

//! Typed error handling for scout-rs
//!
//! Top-level taxonomy: `ScoutError` wraps the graph, model, and search
//! error families plus the usual transparent conversions. Ceiling-reached
//! is deliberately NOT an error - it is a `RunOutcome` variant returned to
//! the caller (see `scout::graph::executor`).

use thiserror::Error;

/// Top-level error type for scout-rs
#[derive(Debug, Error)]
pub enum ScoutError {
    /// Graph construction/execution errors
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Model/LLM collaborator errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Web search collaborator errors
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Configuration errors (missing env vars, bad depth profile)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Generic error wrapper for compatibility
    #[error("{0}")]
    Other(String),
}

/// Graph construction and state errors
#[derive(Debug, Error)]
pub enum GraphError {
    /// A node patched a state field the workflow schema never declared.
    /// Fails fast: silently adding fields is how near-duplicate workflow
    /// variants corrupt each other's state.
    #[error("Node '{node}' wrote undeclared state field '{field}'")]
    UndeclaredField { node: String, field: String },

    /// `query` is seeded at state creation and never rewritten
    #[error("State field '{0}' is immutable after creation")]
    ImmutableField(String),

    /// Duplicate workflow registration is a programmer error
    #[error("Workflow '{0}' is already registered")]
    DuplicateWorkflow(String),

    /// Unknown workflow name; carries the valid names so callers can
    /// self-correct
    #[error("Unknown workflow '{name}'. Registered workflows: {}", known.join(", "))]
    UnknownWorkflow { name: String, known: Vec<String> },

    /// An edge or router points at a node the graph does not contain
    #[error("Edge from '{from}' targets unknown node '{to}'")]
    UnknownNode { from: String, to: String },

    /// Entry point missing, dangling node, or similar wiring mistake
    #[error("Invalid graph '{workflow}': {reason}")]
    InvalidGraph { workflow: String, reason: String },

    /// A cycle made only of static edges has no router to bound it
    #[error("Unbounded cycle detected: {0:?}")]
    UnboundedCycle(Vec<String>),
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key not configured
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// API error from the provider
    #[error("API error from {provider}: {message}")]
    Api { provider: String, message: String },

    /// The model returned output that does not match the requested schema
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),

    /// HTTP transport failure
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Web-search-specific errors
#[derive(Debug, Error)]
pub enum SearchError {
    /// A single provider failed; the router falls back to the next one
    #[error("Provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    /// Every configured provider failed
    #[error("All search providers exhausted: {0:?}")]
    AllProvidersFailed(Vec<String>),

    /// No provider configured at all
    #[error("No search provider configured")]
    NoProviders,
}

impl ScoutError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create from a generic message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<String> for ScoutError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for ScoutError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}
