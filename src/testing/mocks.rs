//! Mock collaborators for import processors

use crate::error::{ErrorCode, Result, WorkflowImportError};
use crate::files::{ConfigFileReader, WorkflowConfigFinderBuilder, YamlConfigFileReader};
use crate::import::ImportProcessor;
use crate::tree::ConfigTree;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// In-memory configuration files acting as both reader and finder.
///
/// Files are yielded by the finder in insertion order.
#[derive(Clone, Default)]
pub struct InMemoryConfigFiles {
    files: Arc<Mutex<Vec<(PathBuf, ConfigTree)>>>,
    read_errors: Arc<Mutex<Vec<(PathBuf, String)>>>,
    reads: Arc<Mutex<Vec<PathBuf>>>,
}

impl InMemoryConfigFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl AsRef<Path>, content: ConfigTree) -> Self {
        self.add_file(path, content);
        self
    }

    /// Add a file from YAML text
    pub fn with_yaml(self, path: impl AsRef<Path>, yaml: &str) -> Self {
        let tree = YamlConfigFileReader::new()
            .parse(yaml, path.as_ref())
            .expect("test YAML must parse");
        self.with_file(path, tree)
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: ConfigTree) {
        let mut files = self.files.lock().unwrap();
        let path = path.as_ref().to_path_buf();
        files.retain(|(existing, _)| existing != &path);
        files.push((path, content));
    }

    pub fn set_read_error(&self, path: impl AsRef<Path>, error: &str) {
        let mut errors = self.read_errors.lock().unwrap();
        errors.push((path.as_ref().to_path_buf(), error.to_string()));
    }

    /// Paths read so far, in call order
    pub fn reads(&self) -> Vec<PathBuf> {
        self.reads.lock().unwrap().clone()
    }
}

impl ConfigFileReader for InMemoryConfigFiles {
    fn read(&self, file: &Path) -> Result<ConfigTree> {
        self.reads.lock().unwrap().push(file.to_path_buf());

        let errors = self.read_errors.lock().unwrap();
        if let Some((_, error)) = errors.iter().find(|(path, _)| path == file) {
            return Err(WorkflowImportError::config_with_code(
                ErrorCode::CONFIG_INVALID_YAML,
                error.clone(),
                Some(file.to_path_buf()),
            ));
        }

        let files = self.files.lock().unwrap();
        files
            .iter()
            .find(|(path, _)| path == file)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| {
                WorkflowImportError::storage_with_code(
                    ErrorCode::STORAGE_NOT_FOUND,
                    format!("File not found: {}", file.display()),
                    Some(file.to_path_buf()),
                )
            })
    }
}

impl WorkflowConfigFinderBuilder for InMemoryConfigFiles {
    fn create(&self) -> Result<Vec<PathBuf>> {
        let files = self.files.lock().unwrap();
        Ok(files.iter().map(|(path, _)| path.clone()).collect())
    }
}

/// Parent processor that records calls and either echoes the content or
/// returns a canned tree
#[derive(Default)]
pub struct MockParentProcessor {
    response: Option<ConfigTree>,
    calls: Mutex<Vec<PathBuf>>,
}

impl MockParentProcessor {
    /// Return the content unchanged
    pub fn passthrough() -> Self {
        Self::default()
    }

    /// Return `response` for every call
    pub fn returning(response: ConfigTree) -> Self {
        Self {
            response: Some(response),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sources passed to `process`, in call order
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

impl ImportProcessor for MockParentProcessor {
    fn process(&self, content: ConfigTree, source: &Path) -> Result<ConfigTree> {
        self.calls.lock().unwrap().push(source.to_path_buf());
        Ok(self.response.clone().unwrap_or(content))
    }
}
