//! Import of a whole configuration file

use super::{
    resolve_resource_path, upgrade_parent, ChainedImportProcessor, ImportProcessor,
    ImportSignature, ProgressGuard,
};
use crate::error::Result;
use crate::files::ConfigFileReader;
use crate::tree::{merge::merge_maps, ConfigTree, IMPORTS_KEY};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Merges the content of `resource` underneath the importing file.
///
/// The imported file is resolved through the parent first; on conflicting
/// keys the importing file wins.
pub struct ResourceFileImportProcessor {
    resource: String,
    reader: Arc<dyn ConfigFileReader>,
    parent: Option<Weak<dyn ImportProcessor>>,
    in_progress: AtomicBool,
}

impl ResourceFileImportProcessor {
    pub fn new(resource: impl Into<String>, reader: Arc<dyn ConfigFileReader>) -> Self {
        Self {
            resource: resource.into(),
            reader,
            parent: None,
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl ImportProcessor for ResourceFileImportProcessor {
    fn process(&self, content: ConfigTree, source: &Path) -> Result<ConfigTree> {
        let _guard = ProgressGuard::enter(&self.in_progress);

        let path = resolve_resource_path(&self.resource, source);
        tracing::debug!("Importing {} into {}", path.display(), source.display());

        let mut imported = self.reader.read(&path)?;
        if let Some(parent) = upgrade_parent(&self.parent) {
            imported = parent.process(imported, &path)?;
        }
        imported.shift_remove(IMPORTS_KEY);

        merge_maps(&mut imported, &content);
        Ok(imported)
    }

    fn in_progress(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }
}

impl ChainedImportProcessor for ResourceFileImportProcessor {
    fn set_parent(&mut self, parent: Weak<dyn ImportProcessor>) {
        self.parent = Some(parent);
    }

    fn signature(&self, source: &Path) -> ImportSignature {
        ImportSignature::Resource {
            path: resolve_resource_path(&self.resource, source),
        }
    }
}
