//! Workflow configuration trees
//!
//! A configuration file is an ordered mapping of string keys to
//! [`serde_json::Value`]s. The two keys with meaning to the importer are
//! `workflows` (workflow name to workflow node) and `imports` (the
//! declarations expanded by [`crate::import::ImportsResolver`]).

use crate::error::{ErrorCode, Result, WorkflowImportError};
use serde_json::{Map, Value};
use std::fmt;

pub mod merge;

pub use merge::{deep_merge, merge_with_replacements};

/// Ordered mapping at the root of every configuration file
pub type ConfigTree = Map<String, Value>;

/// Root key holding workflow definitions
pub const WORKFLOWS_KEY: &str = "workflows";

/// Root key holding import declarations
pub const IMPORTS_KEY: &str = "imports";

/// A dot-delimited key path inside a workflow node, e.g. `steps.step_b`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplacementPath {
    segments: Vec<String>,
}

impl ReplacementPath {
    /// Parse a dot-delimited path; empty segments are rejected
    pub fn parse(raw: &str) -> Result<Self> {
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(WorkflowImportError::validation_with_code(
                ErrorCode::VALIDATION_INVALID_FORMAT,
                format!("Invalid replacement path `{}`", raw),
                Some("replace".to_string()),
            ));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for ReplacementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Borrow the `workflows` mapping of a tree, if present
pub fn workflows(tree: &ConfigTree) -> Option<&Map<String, Value>> {
    tree.get(WORKFLOWS_KEY).and_then(Value::as_object)
}

/// Borrow one workflow node by name
pub fn workflow<'a>(tree: &'a ConfigTree, name: &str) -> Option<&'a Map<String, Value>> {
    workflows(tree).and_then(|w| w.get(name)).and_then(Value::as_object)
}

/// Whether a tree defines the named workflow. A `~` node counts as defined.
pub fn has_workflow(tree: &ConfigTree, name: &str) -> bool {
    workflows(tree)
        .and_then(|w| w.get(name))
        .is_some_and(|node| node.is_object() || node.is_null())
}

/// Mutable access to a workflow node, creating `workflows.<name>` if needed.
///
/// A non-mapping value already stored under either key is replaced by an
/// empty mapping.
pub fn workflow_mut<'a>(tree: &'a mut ConfigTree, name: &str) -> &'a mut Map<String, Value> {
    let workflows = ensure_object(
        tree.entry(WORKFLOWS_KEY.to_string())
            .or_insert_with(|| Value::Object(Map::new())),
    );
    ensure_object(
        workflows
            .entry(name.to_string())
            .or_insert_with(|| Value::Object(Map::new())),
    )
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}

/// Convert a parsed YAML/JSON document into a tree, rejecting non-mappings.
/// An empty document yields an empty tree.
pub fn tree_from_value(value: Value) -> Option<ConfigTree> {
    match value {
        Value::Object(map) => Some(map),
        Value::Null => Some(ConfigTree::new()),
        _ => None,
    }
}
