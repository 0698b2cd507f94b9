//! Head of the import chain
//!
//! The resolver strips the `imports` sequence from a file, builds one
//! processor per declaration and runs them in order. It is the parent of
//! every processor it creates, so imported files are resolved through it as
//! well. An in-progress stack of import signatures stops the recursion: a
//! file revisiting a workflow import it is already resolving is skipped,
//! while two workflow imports waiting on each other, or a resource import of
//! a file still being resolved, are reported as an error.

use super::{
    normalize_path, ChainedImportProcessor, ImportProcessor, ImportProcessorFactory,
    ImportSignature, ResourceFileImportProcessorFactory, WorkflowFileImportProcessorFactory,
    WorkflowImportProcessorFactory,
};
use crate::error::{common, ErrorCode, Result, WorkflowImportError};
use crate::files::{ConfigFileReader, WorkflowConfigFinderBuilder};
use crate::tree::{ConfigTree, IMPORTS_KEY};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::debug;

struct ActiveImport {
    signature: ImportSignature,
    source: PathBuf,
    processor: Arc<dyn ChainedImportProcessor>,
}

/// What to do with an import given the imports currently on the stack
enum Admission {
    Run,
    Skip,
}

pub struct ImportsResolver {
    factories: Vec<Box<dyn ImportProcessorFactory>>,
    active: Mutex<Vec<ActiveImport>>,
    this: Weak<ImportsResolver>,
}

impl ImportsResolver {
    /// Factories are consulted in order; the first applicable one wins
    pub fn new(factories: Vec<Box<dyn ImportProcessorFactory>>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            factories,
            active: Mutex::new(Vec::new()),
            this: this.clone(),
        })
    }

    pub fn with_default_factories(
        reader: Arc<dyn ConfigFileReader>,
        finder: Arc<dyn WorkflowConfigFinderBuilder>,
    ) -> Arc<Self> {
        Self::new(vec![
            Box::new(WorkflowFileImportProcessorFactory::new(
                reader.clone(),
                finder.clone(),
            )),
            Box::new(WorkflowImportProcessorFactory::new(reader.clone(), finder)),
            Box::new(ResourceFileImportProcessorFactory::new(reader)),
        ])
    }

    fn active(&self) -> MutexGuard<'_, Vec<ActiveImport>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn create_processor(&self, declaration: &Value) -> Result<Arc<dyn ChainedImportProcessor>> {
        let factory = self
            .factories
            .iter()
            .find(|factory| factory.is_applicable(declaration))
            .ok_or_else(|| {
                WorkflowImportError::validation_with_code(
                    ErrorCode::VALIDATION_UNKNOWN_DIRECTIVE,
                    format!("Unknown import declaration: {}", declaration),
                    Some(IMPORTS_KEY.to_string()),
                )
            })?;

        let mut processor = factory.create(declaration)?;
        let parent: Weak<dyn ImportProcessor> = self.this.clone();
        processor.set_parent(parent);
        Ok(Arc::from(processor))
    }

    /// `origin` is the normalized path of the file being resolved.
    ///
    /// A workflow import already running for the same file is skipped. A
    /// resource import of any file still being resolved is a cycle, wherever
    /// resolution started.
    fn admit(&self, signature: &ImportSignature, origin: &Path) -> Result<Admission> {
        if let ImportSignature::Resource { path } = signature {
            if path == origin {
                return Err(common::resource_already_resolving(origin, path));
            }
        }

        let active = self.active();
        for entry in active.iter().filter(|entry| entry.processor.in_progress()) {
            match (signature, &entry.signature) {
                (ImportSignature::Workflow { .. }, other)
                    if other == signature && entry.source == origin =>
                {
                    return Ok(Admission::Skip);
                }
                (
                    ImportSignature::Workflow { resource, target },
                    ImportSignature::Workflow {
                        resource: other_resource,
                        target: other_target,
                    },
                ) if resource != target && other_resource == target && other_target == resource => {
                    return Err(common::circular_workflow_import(
                        origin,
                        resource,
                        target,
                        &entry.source,
                    ));
                }
                (ImportSignature::Resource { path }, ImportSignature::Resource { path: other })
                    if path == other =>
                {
                    return Err(common::circular_resource_import(origin, path, &entry.source));
                }
                (ImportSignature::Resource { path }, _) if *path == entry.source => {
                    return Err(common::resource_already_resolving(origin, path));
                }
                _ => {}
            }
        }
        Ok(Admission::Run)
    }

    fn run(
        &self,
        processor: Arc<dyn ChainedImportProcessor>,
        signature: ImportSignature,
        content: ConfigTree,
        source: &Path,
    ) -> Result<ConfigTree> {
        self.active().push(ActiveImport {
            signature,
            source: normalize_path(source),
            processor: processor.clone(),
        });

        let result = processor.process(content, source);

        let mut active = self.active();
        if let Some(index) = active
            .iter()
            .rposition(|entry| Arc::ptr_eq(&entry.processor, &processor))
        {
            active.remove(index);
        }
        result
    }
}

impl ImportProcessor for ImportsResolver {
    fn process(&self, mut content: ConfigTree, source: &Path) -> Result<ConfigTree> {
        let declarations = match content.shift_remove(IMPORTS_KEY) {
            None | Some(Value::Null) => return Ok(content),
            Some(Value::Array(declarations)) => declarations,
            Some(_) => return Err(common::invalid_field_type(IMPORTS_KEY, "a sequence")),
        };

        debug!(
            "Resolving {} import(s) of {}",
            declarations.len(),
            source.display()
        );

        let origin = normalize_path(source);
        for declaration in &declarations {
            let processor = self.create_processor(declaration)?;
            let signature = processor.signature(source);

            match self.admit(&signature, &origin)? {
                Admission::Skip => {
                    debug!(
                        "Skipping re-entrant import {:?} in {}",
                        signature,
                        source.display()
                    );
                }
                Admission::Run => {
                    content = self.run(processor, signature, content, source)?;
                }
            }
        }

        Ok(content)
    }

    fn in_progress(&self) -> bool {
        !self.active().is_empty()
    }
}

#[cfg(test)]
mod tests;
