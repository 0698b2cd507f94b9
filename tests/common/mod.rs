//! Common test utilities and helpers

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test context builder for a directory of workflow configuration files
pub struct TestContextBuilder {
    temp_dir: TempDir,
    initial_files: Vec<(PathBuf, String)>,
    config: Option<String>,
}

impl TestContextBuilder {
    /// Create a new test context builder
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
            initial_files: Vec::new(),
            config: None,
        })
    }

    /// Add a workflow file
    pub fn with_file(mut self, path: impl AsRef<Path>, content: &str) -> Self {
        self.initial_files
            .push((path.as_ref().to_path_buf(), content.to_string()));
        self
    }

    /// Write `wfimport.toml` into the test directory
    pub fn with_config(mut self, content: &str) -> Self {
        self.config = Some(content.to_string());
        self
    }

    /// Build the test context
    pub fn build(self) -> Result<TestContext> {
        let path = self.temp_dir.path();

        for (file_path, content) in self.initial_files {
            write_file(&path.join(file_path), &content)?;
        }

        if let Some(config) = self.config {
            write_file(&path.join("wfimport.toml"), &config)?;
        }

        Ok(TestContext {
            temp_dir: self.temp_dir,
        })
    }
}

/// Test context that manages temporary directories and cleanup
pub struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    /// Get the path to the test directory
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of a file in the test directory
    pub fn file(&self, path: impl AsRef<Path>) -> PathBuf {
        self.temp_dir.path().join(path)
    }

    /// Create a file in the test directory
    pub fn create_file(&self, path: impl AsRef<Path>, content: &str) -> Result<PathBuf> {
        let full_path = self.file(path);
        write_file(&full_path, content)?;
        Ok(full_path)
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Workflow files used by several tests: `order` extends `base_order`
/// found elsewhere in the tree and pulls shared attributes from a resource.
pub fn order_fixture() -> Result<TestContext> {
    TestContextBuilder::new()?
        .with_file(
            "workflows/base/base_order.yml",
            r#"
workflows:
  base_order:
    entity: Acme\Order
    steps:
      open:
        is_start: true
      closed: ~
    transitions:
      close:
        step_to: closed
        triggers:
          - { cron: "0 2 * * *" }
          - { event: update, field: status }
"#,
        )
        .with_file(
            "workflows/shared/attributes.yml",
            r#"
workflows:
  order:
    attributes:
      total:
        type: float
"#,
        )
        .with_file(
            "workflows/order.yml",
            r#"
imports:
  - ./shared/attributes.yml
  - { workflow: base_order, as: order, replace: [steps.closed] }
workflows:
  order:
    steps:
      closed:
        is_final: true
"#,
        )
        .build()
}
