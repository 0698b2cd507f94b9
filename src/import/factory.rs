//! Factories turning raw `imports` declarations into processors

use super::{
    ChainedImportProcessor, ImportDirective, ResourceFileImportProcessor, WorkflowImportProcessor,
};
use crate::error::{common, Result};
use crate::files::{ConfigFileReader, WorkflowConfigFinderBuilder};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Builds a processor for the declarations it recognises
pub trait ImportProcessorFactory: Send + Sync {
    fn is_applicable(&self, declaration: &Value) -> bool;

    fn create(&self, declaration: &Value) -> Result<Box<dyn ChainedImportProcessor>>;
}

const WORKFLOW_KEYS: [&str; 3] = ["workflow", "as", "replace"];
const RESOURCE_KEY: &str = "resource";

fn has_keys(map: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().all(|key| map.contains_key(*key))
}

/// `{workflow, as, replace}`: import a workflow found anywhere in the search roots
pub struct WorkflowImportProcessorFactory {
    reader: Arc<dyn ConfigFileReader>,
    finder: Arc<dyn WorkflowConfigFinderBuilder>,
}

impl WorkflowImportProcessorFactory {
    pub fn new(
        reader: Arc<dyn ConfigFileReader>,
        finder: Arc<dyn WorkflowConfigFinderBuilder>,
    ) -> Self {
        Self { reader, finder }
    }
}

impl ImportProcessorFactory for WorkflowImportProcessorFactory {
    fn is_applicable(&self, declaration: &Value) -> bool {
        declaration
            .as_object()
            .map(|map| has_keys(map, &WORKFLOW_KEYS) && !map.contains_key(RESOURCE_KEY))
            .unwrap_or(false)
    }

    fn create(&self, declaration: &Value) -> Result<Box<dyn ChainedImportProcessor>> {
        let directive = ImportDirective::from_declaration(declaration)?;
        Ok(Box::new(WorkflowImportProcessor::new(
            directive.workflow(),
            directive.target(),
            directive.replacements().to_vec(),
            self.reader.clone(),
            self.finder.clone(),
        )))
    }
}

/// `{resource, workflow, as, replace}`: import a workflow from one named file
pub struct WorkflowFileImportProcessorFactory {
    reader: Arc<dyn ConfigFileReader>,
    finder: Arc<dyn WorkflowConfigFinderBuilder>,
}

impl WorkflowFileImportProcessorFactory {
    pub fn new(
        reader: Arc<dyn ConfigFileReader>,
        finder: Arc<dyn WorkflowConfigFinderBuilder>,
    ) -> Self {
        Self { reader, finder }
    }
}

impl ImportProcessorFactory for WorkflowFileImportProcessorFactory {
    fn is_applicable(&self, declaration: &Value) -> bool {
        declaration
            .as_object()
            .map(|map| has_keys(map, &WORKFLOW_KEYS) && map.contains_key(RESOURCE_KEY))
            .unwrap_or(false)
    }

    fn create(&self, declaration: &Value) -> Result<Box<dyn ChainedImportProcessor>> {
        let directive = ImportDirective::from_declaration(declaration)?;
        if directive.resource().is_none() {
            return Err(common::missing_field(RESOURCE_KEY));
        }
        Ok(Box::new(WorkflowImportProcessor::from_directive(
            &directive,
            self.reader.clone(),
            self.finder.clone(),
        )))
    }
}

/// `{resource}` or a bare path string: import a whole file
pub struct ResourceFileImportProcessorFactory {
    reader: Arc<dyn ConfigFileReader>,
}

impl ResourceFileImportProcessorFactory {
    pub fn new(reader: Arc<dyn ConfigFileReader>) -> Self {
        Self { reader }
    }
}

impl ImportProcessorFactory for ResourceFileImportProcessorFactory {
    fn is_applicable(&self, declaration: &Value) -> bool {
        match declaration {
            Value::String(path) => !path.is_empty(),
            Value::Object(map) => map.len() == 1 && map.contains_key(RESOURCE_KEY),
            _ => false,
        }
    }

    fn create(&self, declaration: &Value) -> Result<Box<dyn ChainedImportProcessor>> {
        let resource = match declaration {
            Value::String(path) => path.as_str(),
            Value::Object(map) => match map.get(RESOURCE_KEY) {
                Some(Value::String(path)) if !path.is_empty() => path.as_str(),
                Some(Value::String(_)) | Some(Value::Null) | None => {
                    return Err(common::missing_field(RESOURCE_KEY))
                }
                Some(_) => return Err(common::invalid_field_type(RESOURCE_KEY, "a string")),
            },
            _ => return Err(common::invalid_field_type("imports", "a mapping or a string")),
        };

        Ok(Box::new(ResourceFileImportProcessor::new(
            resource,
            self.reader.clone(),
        )))
    }
}
