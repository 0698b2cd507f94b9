//! Testing utilities
//!
//! In-memory collaborators for exercising import processors without touching
//! the file system.

pub mod mocks;

pub use mocks::{InMemoryConfigFiles, MockParentProcessor};

use crate::tree::{tree_from_value, ConfigTree};
use serde_json::Value;

/// Convert a `json!` literal into a tree, panicking on non-mappings
pub fn tree(value: Value) -> ConfigTree {
    tree_from_value(value).expect("test tree must be a JSON object")
}
