//! Reading workflow configuration files and locating import candidates

use crate::error::{common, ErrorCode, Result, WorkflowImportError};
use crate::tree::{tree_from_value, ConfigTree};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub mod finder;

pub use finder::{DirectoryFinderBuilder, WorkflowConfigFinderBuilder};

/// Reads one configuration file into a tree
pub trait ConfigFileReader: Send + Sync {
    fn read(&self, file: &Path) -> Result<ConfigTree>;
}

/// Reads YAML (and therefore JSON) workflow configuration files
#[derive(Debug, Clone, Default)]
pub struct YamlConfigFileReader;

impl YamlConfigFileReader {
    pub fn new() -> Self {
        Self
    }

    /// Parse configuration text; `origin` is only used for error reporting
    pub fn parse(&self, content: &str, origin: &Path) -> Result<ConfigTree> {
        if content.trim().is_empty() {
            return Ok(ConfigTree::new());
        }
        let value: Value = serde_yaml::from_str(content)
            .map_err(|e| WorkflowImportError::from(e).with_path(origin))?;
        tree_from_value(value).ok_or_else(|| common::not_a_mapping(origin))
    }
}

impl ConfigFileReader for YamlConfigFileReader {
    fn read(&self, file: &Path) -> Result<ConfigTree> {
        tracing::debug!("Reading workflow configuration {}", file.display());

        let content = fs::read_to_string(file).map_err(|e| {
            let code = if e.kind() == std::io::ErrorKind::NotFound {
                ErrorCode::STORAGE_NOT_FOUND
            } else {
                ErrorCode::STORAGE_IO_ERROR
            };
            WorkflowImportError::storage_with_code(
                code,
                format!("Failed to read workflow configuration {}", file.display()),
                Some(file.to_path_buf()),
            )
            .with_source(e)
        })?;

        self.parse(&content, file)
    }
}
