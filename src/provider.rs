//! Loading fully resolved workflow configuration

use crate::config::ResolverConfig;
use crate::error::{ErrorCode, Result, WorkflowImportError};
use crate::files::{
    ConfigFileReader, DirectoryFinderBuilder, WorkflowConfigFinderBuilder, YamlConfigFileReader,
};
use crate::import::{normalize_path, resolve_resource_path, ImportProcessor, ImportsResolver};
use crate::tree::{self, ConfigTree, IMPORTS_KEY, WORKFLOWS_KEY};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Reads workflow files and resolves their imports
pub struct WorkflowConfigurationProvider {
    reader: Arc<dyn ConfigFileReader>,
    finder: Arc<dyn WorkflowConfigFinderBuilder>,
    resolver: Arc<ImportsResolver>,
}

impl WorkflowConfigurationProvider {
    pub fn new(
        reader: Arc<dyn ConfigFileReader>,
        finder: Arc<dyn WorkflowConfigFinderBuilder>,
    ) -> Self {
        let resolver = ImportsResolver::with_default_factories(reader.clone(), finder.clone());
        Self {
            reader,
            finder,
            resolver,
        }
    }

    /// YAML files found under the configured search paths
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        let finder = DirectoryFinderBuilder::from_config(config)?;
        Ok(Self::new(
            Arc::new(YamlConfigFileReader::new()),
            Arc::new(finder),
        ))
    }

    pub fn resolver(&self) -> &Arc<ImportsResolver> {
        &self.resolver
    }

    /// Read one file and resolve its imports
    pub fn load_file(&self, path: &Path) -> Result<ConfigTree> {
        let content = self.reader.read(path)?;
        self.resolver.process(content, path)
    }

    /// Resolve every candidate file and collect their workflows.
    ///
    /// Files imported wholesale by another candidate are fragments of that
    /// file and are not loaded on their own. A workflow defined identically
    /// in several files is kept once, differing definitions are rejected.
    pub fn load_workflows(&self) -> Result<ConfigTree> {
        let mut candidates = Vec::new();
        for file in self.finder.create()? {
            let content = self.reader.read(&file)?;
            candidates.push((file, content));
        }

        let fragments: HashSet<PathBuf> = candidates
            .iter()
            .flat_map(|(file, content)| resource_imports(content, file))
            .collect();

        let mut workflows = Map::new();
        let mut origins: HashMap<String, PathBuf> = HashMap::new();
        let mut loaded = 0;

        for (file, content) in candidates {
            if fragments.contains(&normalize_path(&file)) {
                debug!("Skipping {}, it is imported by another file", file.display());
                continue;
            }

            let resolved = self.resolver.process(content, &file)?;
            loaded += 1;
            let Some(defined) = tree::workflows(&resolved) else {
                continue;
            };

            for (name, node) in defined {
                match workflows.get(name) {
                    Some(existing) if existing == node => {
                        debug!(
                            "Workflow `{}` in {} repeats an earlier definition",
                            name,
                            file.display()
                        );
                    }
                    Some(_) => {
                        let first = origins.get(name).cloned().unwrap_or_default();
                        return Err(duplicate_workflow(name, &first, &file));
                    }
                    None => {
                        origins.insert(name.clone(), file.clone());
                        workflows.insert(name.clone(), node.clone());
                    }
                }
            }
        }

        info!(
            "Loaded {} workflow(s) from {} file(s)",
            workflows.len(),
            loaded
        );

        let mut result = ConfigTree::new();
        result.insert(WORKFLOWS_KEY.to_string(), Value::Object(workflows));
        Ok(result)
    }
}

/// Paths a file imports wholesale, as `- path` or `- { resource: path }`
fn resource_imports(content: &ConfigTree, file: &Path) -> Vec<PathBuf> {
    let Some(Value::Array(declarations)) = content.get(IMPORTS_KEY) else {
        return Vec::new();
    };

    declarations
        .iter()
        .filter_map(|declaration| match declaration {
            Value::String(path) => Some(path.as_str()),
            Value::Object(map) if map.len() == 1 => map.get("resource").and_then(Value::as_str),
            _ => None,
        })
        .map(|resource| resolve_resource_path(resource, file))
        .collect()
}

fn duplicate_workflow(name: &str, first: &Path, second: &Path) -> WorkflowImportError {
    WorkflowImportError::validation_with_code(
        ErrorCode::WORKFLOW_DUPLICATE,
        format!(
            "Workflow `{}` is defined in both `{}` and `{}`",
            name,
            first.display(),
            second.display()
        ),
        Some(name.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{tree, InMemoryConfigFiles};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn provider(files: &InMemoryConfigFiles) -> WorkflowConfigurationProvider {
        WorkflowConfigurationProvider::new(Arc::new(files.clone()), Arc::new(files.clone()))
    }

    #[test]
    fn test_load_file_resolves_imports() {
        let files = InMemoryConfigFiles::new()
            .with_file(
                "child.yml",
                tree(json!({
                    "imports": [{"workflow": "base", "as": "child", "replace": []}],
                    "workflows": {"child": {"entity": "Child"}}
                })),
            )
            .with_file(
                "base.yml",
                tree(json!({"workflows": {"base": {"steps": {"open": null}}}})),
            );

        let result = provider(&files).load_file(Path::new("child.yml")).unwrap();

        assert!(result.get("imports").is_none());
        assert_eq!(
            result["workflows"]["child"],
            json!({"entity": "Child", "steps": {"open": null}})
        );
    }

    #[test]
    fn test_load_workflows_collects_all_files() {
        let files = InMemoryConfigFiles::new()
            .with_file(
                "main.yml",
                tree(json!({
                    "imports": ["./shared.yml"],
                    "workflows": {"order": {"entity": "Order"}}
                })),
            )
            .with_file(
                "shared.yml",
                tree(json!({
                    "workflows": {
                        "order": {"steps": {"open": null}},
                        "invoice": {"entity": "Invoice"}
                    }
                })),
            )
            .with_file("empty.yml", ConfigTree::new());

        let result = provider(&files).load_workflows().unwrap();

        assert_eq!(
            serde_json::Value::Object(result),
            json!({
                "workflows": {
                    "order": {"steps": {"open": null}, "entity": "Order"},
                    "invoice": {"entity": "Invoice"}
                }
            })
        );
    }

    #[test]
    fn test_conflicting_definitions_are_rejected() {
        let files = InMemoryConfigFiles::new()
            .with_file("a.yml", tree(json!({"workflows": {"order": {"entity": "A"}}})))
            .with_file("b.yml", tree(json!({"workflows": {"order": {"entity": "B"}}})));

        let err = provider(&files).load_workflows().unwrap_err();

        assert_eq!(err.code(), ErrorCode::WORKFLOW_DUPLICATE);
        assert_eq!(
            err.to_string(),
            "Workflow `order` is defined in both `a.yml` and `b.yml`"
        );
    }

    #[test]
    fn test_from_config_reads_yaml_tree() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("flows")).unwrap();
        fs::write(
            root.join("flows/base.yml"),
            "workflows:\n  base:\n    entity: Acme\\Order\n    steps:\n      open: ~\n",
        )
        .unwrap();
        fs::write(
            root.join("flows/child.yml"),
            "imports:\n  - { workflow: base, as: child, replace: [] }\nworkflows:\n  child:\n    steps:\n      closed: ~\n",
        )
        .unwrap();
        fs::write(root.join("README.md"), "not a workflow").unwrap();

        let config = ResolverConfig {
            search_paths: vec![root.to_path_buf()],
            file_patterns: vec!["**/*.yml".to_string()],
            ..ResolverConfig::default()
        };
        let provider = WorkflowConfigurationProvider::from_config(&config).unwrap();

        let result = provider.load_workflows().unwrap();

        assert_eq!(
            result["workflows"]["child"],
            json!({"steps": {"closed": null, "open": null}, "entity": "Acme\\Order"})
        );
        assert_eq!(result["workflows"]["base"]["entity"], json!("Acme\\Order"));
        assert!(!provider.resolver().in_progress());
    }
}
