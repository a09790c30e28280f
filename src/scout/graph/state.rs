// SPDX-License-Identifier: MIT

//! Workflow state with per-field merge policies
//!
//! Every workflow declares a [`StateSchema`]: the complete set of fields its
//! nodes may read or write, each tagged with a [`MergePolicy`]. Accumulator
//! fields merge by concatenation so looped workflows never lose evidence
//! from earlier iterations; replace fields are last-writer-wins. A patch
//! touching a field the schema never declared fails fast.

use crate::error::GraphError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// The original request. Seeded at state creation, immutable afterwards.
pub const QUERY: &str = "query";

/// How updates to a field are merged into the running state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Last writer wins
    Replace,
    /// Concatenate onto the existing list
    Accumulate,
}

/// Declaration of a single state field
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub policy: MergePolicy,
    pub default: Option<Value>,
}

/// Complete field set for one workflow variant
#[derive(Debug, Clone, Default)]
pub struct StateSchema {
    fields: HashMap<String, FieldDef>,
}

impl StateSchema {
    /// Schema with the `query` field every workflow carries
    pub fn new() -> Self {
        let mut schema = Self::default();
        schema.fields.insert(
            QUERY.to_string(),
            FieldDef {
                policy: MergePolicy::Replace,
                default: None,
            },
        );
        schema
    }

    /// Declare a replace field
    pub fn replace(mut self, name: &str) -> Self {
        self.fields.insert(
            name.to_string(),
            FieldDef {
                policy: MergePolicy::Replace,
                default: None,
            },
        );
        self
    }

    /// Declare a replace field with a default value
    pub fn replace_with_default(mut self, name: &str, default: Value) -> Self {
        self.fields.insert(
            name.to_string(),
            FieldDef {
                policy: MergePolicy::Replace,
                default: Some(default),
            },
        );
        self
    }

    /// Declare an accumulator field (defaults to an empty list)
    pub fn accumulate(mut self, name: &str) -> Self {
        self.fields.insert(
            name.to_string(),
            FieldDef {
                policy: MergePolicy::Accumulate,
                default: Some(Value::Array(vec![])),
            },
        );
        self
    }

    pub fn policy(&self, name: &str) -> Option<MergePolicy> {
        self.fields.get(name).map(|d| d.policy)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    fn defaults(&self) -> HashMap<String, Value> {
        self.fields
            .iter()
            .filter_map(|(k, d)| d.default.clone().map(|v| (k.clone(), v)))
            .collect()
    }
}

/// The partial state a node returns: only the keys it produces
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    entries: Vec<(String, Value)>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key to the patch. Accumulate fields take a list (or a single
    /// item, which is pushed); replace fields take the new value.
    pub fn set(mut self, key: &str, value: Value) -> Self {
        self.entries.push((key.to_string(), value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    /// JSON view of the patch, for streaming events
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// The single mutable record threaded through one workflow invocation
///
/// Values are plain JSON so the whole state stays serializable for
/// checkpointing; no live handles are ever stored here.
#[derive(Debug, Clone)]
pub struct ResearchState {
    fields: HashMap<String, Value>,
    schema: Arc<StateSchema>,
}

impl ResearchState {
    /// Create the state for one invocation, seeding `query` and every
    /// schema default
    pub fn new(schema: Arc<StateSchema>, query: &str) -> Self {
        let mut fields = schema.defaults();
        fields.insert(QUERY.to_string(), Value::String(query.to_string()));
        Self { fields, schema }
    }

    /// Merge a node's patch per the schema's merge policies
    ///
    /// Keys absent from the patch are left untouched. An undeclared key is
    /// a programmer error and fails fast; `query` is immutable after
    /// creation.
    pub fn merge(&mut self, node: &str, patch: &StatePatch) -> Result<(), GraphError> {
        for (key, value) in patch.entries() {
            if key == QUERY {
                return Err(GraphError::ImmutableField(QUERY.to_string()));
            }
            let policy = self
                .schema
                .policy(key)
                .ok_or_else(|| GraphError::UndeclaredField {
                    node: node.to_string(),
                    field: key.clone(),
                })?;
            match policy {
                MergePolicy::Replace => {
                    self.fields.insert(key.clone(), value.clone());
                }
                MergePolicy::Accumulate => {
                    let slot = self
                        .fields
                        .entry(key.clone())
                        .or_insert(Value::Array(vec![]));
                    if let Value::Array(existing) = slot {
                        match value {
                            Value::Array(items) => existing.extend(items.iter().cloned()),
                            other => existing.push(other.clone()),
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }

    pub fn get_u64(&self, key: &str) -> u64 {
        self.fields.get(key).and_then(|v| v.as_u64()).unwrap_or(0)
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.fields
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Deserialize a field into a typed value
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.fields
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Number of items in an accumulator field
    pub fn len_of(&self, key: &str) -> usize {
        self.fields
            .get(key)
            .and_then(|v| v.as_array())
            .map(|a| a.len())
            .unwrap_or(0)
    }

    pub fn query(&self) -> &str {
        self.get_str(QUERY).unwrap_or_default()
    }

    pub fn schema(&self) -> &Arc<StateSchema> {
        &self.schema
    }

    /// Serialize the whole state, for checkpointing and partial reports
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Arc<StateSchema> {
        Arc::new(
            StateSchema::new()
                .replace("report")
                .replace_with_default("loop_count", json!(0))
                .accumulate("search_results")
                .accumulate("rag_results"),
        )
    }

    #[test]
    fn test_new_state_seeds_query_and_defaults() {
        let state = ResearchState::new(schema(), "what is rust?");
        assert_eq!(state.query(), "what is rust?");
        assert_eq!(state.get_u64("loop_count"), 0);
        assert_eq!(state.get("search_results"), Some(&json!([])));
    }

    #[test]
    fn test_replace_is_last_writer_wins() {
        let mut state = ResearchState::new(schema(), "q");
        state
            .merge("a", &StatePatch::new().set("report", json!("first")))
            .unwrap();
        state
            .merge("b", &StatePatch::new().set("report", json!("second")))
            .unwrap();
        assert_eq!(state.get_str("report"), Some("second"));
    }

    #[test]
    fn test_accumulate_concatenates() {
        let mut state = ResearchState::new(schema(), "q");
        state
            .merge("s", &StatePatch::new().set("search_results", json!(["a"])))
            .unwrap();
        state
            .merge("s", &StatePatch::new().set("search_results", json!(["b", "c"])))
            .unwrap();
        assert_eq!(state.get("search_results"), Some(&json!(["a", "b", "c"])));
    }

    #[test]
    fn test_accumulate_pushes_single_item() {
        let mut state = ResearchState::new(schema(), "q");
        state
            .merge("s", &StatePatch::new().set("search_results", json!({"url": "u"})))
            .unwrap();
        assert_eq!(state.len_of("search_results"), 1);
    }

    #[test]
    fn test_undeclared_field_fails_fast() {
        let mut state = ResearchState::new(schema(), "q");
        let err = state
            .merge("bad_node", &StatePatch::new().set("mystery", json!(1)))
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::UndeclaredField { ref node, ref field }
                if node == "bad_node" && field == "mystery"
        ));
    }

    #[test]
    fn test_query_is_immutable() {
        let mut state = ResearchState::new(schema(), "q");
        let err = state
            .merge("n", &StatePatch::new().set(QUERY, json!("other")))
            .unwrap_err();
        assert!(matches!(err, GraphError::ImmutableField(_)));
    }

    #[test]
    fn test_merge_commutes_for_disjoint_accumulators() {
        // Fan-out branches write disjoint accumulator fields; their
        // execution order must not be observable in the merged state.
        let p1 = StatePatch::new().set("search_results", json!(["w1", "w2"]));
        let p2 = StatePatch::new().set("rag_results", json!(["k1"]));

        let mut s_a = ResearchState::new(schema(), "q");
        s_a.merge("web", &p1).unwrap();
        s_a.merge("kb", &p2).unwrap();

        let mut s_b = ResearchState::new(schema(), "q");
        s_b.merge("kb", &p2).unwrap();
        s_b.merge("web", &p1).unwrap();

        assert_eq!(s_a.to_json(), s_b.to_json());
    }

    #[test]
    fn test_untouched_keys_survive_merge() {
        let mut state = ResearchState::new(schema(), "q");
        state
            .merge("a", &StatePatch::new().set("report", json!("r")))
            .unwrap();
        state
            .merge("b", &StatePatch::new().set("search_results", json!(["x"])))
            .unwrap();
        assert_eq!(state.get_str("report"), Some("r"));
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let mut state = ResearchState::new(schema(), "q");
        state
            .merge("s", &StatePatch::new().set("search_results", json!(["a"])))
            .unwrap();
        let json = state.to_json();
        assert_eq!(json["query"], "q");
        assert_eq!(json["search_results"], json!(["a"]));
    }
}
