//! Import of one workflow node into another

use super::{
    resolve_resource_path, upgrade_parent, ChainedImportProcessor, ImportDirective,
    ImportProcessor, ImportSignature, ProgressGuard,
};
use crate::error::{common, Result};
use crate::files::{ConfigFileReader, WorkflowConfigFinderBuilder};
use crate::tree::{self, merge_with_replacements, ConfigTree, ReplacementPath, WORKFLOWS_KEY};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// Where the processor looks for the workflow it imports
#[derive(Clone)]
enum CandidateSource {
    /// Every file the finder yields
    Finder(Arc<dyn WorkflowConfigFinderBuilder>),
    /// One file, relative to the importing file
    File(String),
}

/// Imports workflow `resource` into workflow `target` of the processed content.
///
/// The source workflow is looked up in candidate files (all finder results,
/// or a single file for `{resource, workflow, as, replace}` declarations).
/// Each candidate goes through the parent first so that its own imports are
/// resolved before it is searched. Paths listed in `replacements` are copied
/// from the source wholesale; everything else is deep-merged with the source
/// winning on leaves.
pub struct WorkflowImportProcessor {
    resource: String,
    target: String,
    replacements: Vec<ReplacementPath>,
    candidates: CandidateSource,
    reader: Arc<dyn ConfigFileReader>,
    parent: Option<Weak<dyn ImportProcessor>>,
    in_progress: AtomicBool,
}

impl WorkflowImportProcessor {
    /// Search every file produced by `finder`
    pub fn new(
        resource: impl Into<String>,
        target: impl Into<String>,
        replacements: Vec<ReplacementPath>,
        reader: Arc<dyn ConfigFileReader>,
        finder: Arc<dyn WorkflowConfigFinderBuilder>,
    ) -> Self {
        Self::with_candidates(
            resource.into(),
            target.into(),
            replacements,
            reader,
            CandidateSource::Finder(finder),
        )
    }

    /// Search only `file`, resolved relative to the importing file
    pub fn from_file(
        file: impl Into<String>,
        resource: impl Into<String>,
        target: impl Into<String>,
        replacements: Vec<ReplacementPath>,
        reader: Arc<dyn ConfigFileReader>,
    ) -> Self {
        Self::with_candidates(
            resource.into(),
            target.into(),
            replacements,
            reader,
            CandidateSource::File(file.into()),
        )
    }

    /// Build from a parsed directive; a directive resource restricts the search to that file
    pub fn from_directive(
        directive: &ImportDirective,
        reader: Arc<dyn ConfigFileReader>,
        finder: Arc<dyn WorkflowConfigFinderBuilder>,
    ) -> Self {
        let candidates = match directive.resource() {
            Some(file) => CandidateSource::File(file.to_string()),
            None => CandidateSource::Finder(finder),
        };
        Self::with_candidates(
            directive.workflow().to_string(),
            directive.target().to_string(),
            directive.replacements().to_vec(),
            reader,
            candidates,
        )
    }

    fn with_candidates(
        resource: String,
        target: String,
        replacements: Vec<ReplacementPath>,
        reader: Arc<dyn ConfigFileReader>,
        candidates: CandidateSource,
    ) -> Self {
        Self {
            resource,
            target,
            replacements,
            candidates,
            reader,
            parent: None,
            in_progress: AtomicBool::new(false),
        }
    }

    /// Name of the workflow imported from
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Name of the workflow imported into
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn replacements(&self) -> &[ReplacementPath] {
        &self.replacements
    }

    /// The file this import is restricted to, if any
    pub fn file(&self) -> Option<&str> {
        match &self.candidates {
            CandidateSource::File(file) => Some(file.as_str()),
            CandidateSource::Finder(_) => None,
        }
    }

    pub fn parent(&self) -> Option<Arc<dyn ImportProcessor>> {
        upgrade_parent(&self.parent)
    }

    fn candidate_files(&self, source: &Path) -> Result<Vec<PathBuf>> {
        match &self.candidates {
            CandidateSource::Finder(finder) => finder.create(),
            CandidateSource::File(file) => Ok(vec![resolve_resource_path(file, source)]),
        }
    }

    /// Find the first candidate defining `resource` and take its node
    fn find_source_node(
        &self,
        candidates: &[PathBuf],
        parent: Option<&dyn ImportProcessor>,
    ) -> Result<(Map<String, Value>, PathBuf)> {
        for candidate in candidates {
            debug!(
                "Searching {} for workflow `{}`",
                candidate.display(),
                self.resource
            );

            let mut raw = self.reader.read(candidate)?;
            if let Some(parent) = parent {
                raw = parent.process(raw, candidate)?;
            }

            if tree::has_workflow(&raw, &self.resource) {
                let node = take_workflow(raw, &self.resource);
                return Ok((node, candidate.clone()));
            }
        }

        Err(common::workflow_not_found(&self.resource))
    }
}

fn take_workflow(mut tree: ConfigTree, name: &str) -> Map<String, Value> {
    match tree.remove(WORKFLOWS_KEY) {
        Some(Value::Object(mut workflows)) => match workflows.remove(name) {
            Some(Value::Object(node)) => node,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

impl ImportProcessor for WorkflowImportProcessor {
    fn process(&self, content: ConfigTree, source: &Path) -> Result<ConfigTree> {
        let _guard = ProgressGuard::enter(&self.in_progress);

        let parent = self.parent();
        let mut content = match &parent {
            Some(parent) => parent.process(content, source)?,
            None => content,
        };

        let candidates = self.candidate_files(source)?;
        let (node, found_in) = self.find_source_node(&candidates, parent.as_deref())?;

        merge_with_replacements(
            tree::workflow_mut(&mut content, &self.target),
            &node,
            &self.replacements,
        );

        info!(
            "Imported workflow `{}` from {} into `{}` of {}",
            self.resource,
            found_in.display(),
            self.target,
            source.display()
        );

        Ok(content)
    }

    fn in_progress(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }
}

impl ChainedImportProcessor for WorkflowImportProcessor {
    fn set_parent(&mut self, parent: Weak<dyn ImportProcessor>) {
        self.parent = Some(parent);
    }

    fn signature(&self, _source: &Path) -> ImportSignature {
        ImportSignature::Workflow {
            resource: self.resource.clone(),
            target: self.target.clone(),
        }
    }
}

impl fmt::Debug for WorkflowImportProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowImportProcessor")
            .field("resource", &self.resource)
            .field("target", &self.target)
            .field("replacements", &self.replacements)
            .field("file", &self.file())
            .field("in_progress", &self.in_progress())
            .finish()
    }
}
