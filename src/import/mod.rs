//! Import resolution for workflow configuration files
//!
//! Every file may start with an `imports` sequence. Each declaration is
//! turned into a processor by an [`ImportProcessorFactory`]; processors form
//! a chain through their parent, which is always the [`ImportsResolver`] that
//! created them, so imports inside imported files are resolved first.

use crate::error::{common, Result};
use crate::tree::{ConfigTree, ReplacementPath};
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

pub mod factory;
pub mod resolver;
pub mod resource;
pub mod workflow;

pub use factory::{
    ImportProcessorFactory, ResourceFileImportProcessorFactory,
    WorkflowFileImportProcessorFactory, WorkflowImportProcessorFactory,
};
pub use resolver::ImportsResolver;
pub use resource::ResourceFileImportProcessor;
pub use workflow::WorkflowImportProcessor;

/// A step in the import chain
pub trait ImportProcessor: Send + Sync {
    /// Resolve imports in `content`, which was read from `source`
    fn process(&self, content: ConfigTree, source: &Path) -> Result<ConfigTree>;

    /// Whether a `process` call is currently on the stack
    fn in_progress(&self) -> bool {
        false
    }
}

/// What an import pulls in; compared by the resolver to detect re-entrancy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSignature {
    Workflow { resource: String, target: String },
    Resource { path: PathBuf },
}

/// A processor built from a declaration and linked into the chain
pub trait ChainedImportProcessor: ImportProcessor {
    fn set_parent(&mut self, parent: Weak<dyn ImportProcessor>);

    fn signature(&self, source: &Path) -> ImportSignature;
}

/// A parsed import declaration: `{resource?, workflow, as, replace}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDirective {
    resource: Option<String>,
    workflow: String,
    target: String,
    replacements: Vec<ReplacementPath>,
}

impl ImportDirective {
    pub fn new(workflow: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            resource: None,
            workflow: workflow.into(),
            target: target.into(),
            replacements: Vec::new(),
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_replacements(mut self, replacements: Vec<ReplacementPath>) -> Self {
        self.replacements = replacements;
        self
    }

    /// Build a directive from a raw declaration mapping
    pub fn from_declaration(declaration: &Value) -> Result<Self> {
        let map = declaration
            .as_object()
            .ok_or_else(|| common::invalid_field_type("imports", "a mapping"))?;

        let resource = match map.get("resource") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(common::invalid_field_type("resource", "a string")),
        };

        let mut directive = Self::new(required_str(map, "workflow")?, required_str(map, "as")?)
            .with_replacements(replacement_paths(map.get("replace"))?);
        directive.resource = resource;
        Ok(directive)
    }

    /// File the workflow is imported from, if restricted to one file
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// Name of the workflow to import from
    pub fn workflow(&self) -> &str {
        &self.workflow
    }

    /// Name of the workflow to import into
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn replacements(&self) -> &[ReplacementPath] {
        &self.replacements
    }
}

fn required_str(map: &Map<String, Value>, key: &str) -> Result<String> {
    match map.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) | None | Some(Value::Null) => Err(common::missing_field(key)),
        Some(_) => Err(common::invalid_field_type(key, "a string")),
    }
}

fn replacement_paths(value: Option<&Value>) -> Result<Vec<ReplacementPath>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| common::invalid_field_type("replace", "a sequence of strings"))
                    .and_then(ReplacementPath::parse)
            })
            .collect(),
        Some(_) => Err(common::invalid_field_type("replace", "a sequence of strings")),
    }
}

/// Resolve `resource` relative to the directory containing `source`
pub fn resolve_resource_path(resource: &str, source: &Path) -> PathBuf {
    let path = Path::new(resource);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        source.parent().unwrap_or_else(|| Path::new("")).join(path)
    };
    normalize_path(&joined)
}

/// Lexically remove `.` and `..` components
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Upgrade an optional weak parent for the duration of one call
pub(crate) fn upgrade_parent(
    parent: &Option<Weak<dyn ImportProcessor>>,
) -> Option<Arc<dyn ImportProcessor>> {
    parent.as_ref().and_then(Weak::upgrade)
}

/// Holds a processor's in-progress flag set until dropped
pub(crate) struct ProgressGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ProgressGuard<'a> {
    pub(crate) fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }
}

impl Drop for ProgressGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
