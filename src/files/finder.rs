//! Candidate file discovery for workflow imports

use crate::config::ResolverConfig;
use crate::error::{ErrorCode, Result, WorkflowImportError};
use glob::{MatchOptions, Pattern};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Produces the files that may define a workflow to import.
///
/// Implementations must return candidates in a stable order; the first file
/// defining the requested workflow wins.
pub trait WorkflowConfigFinderBuilder: Send + Sync {
    fn create(&self) -> Result<Vec<PathBuf>>;
}

/// Walks search roots and yields files matching glob patterns
#[derive(Debug, Clone)]
pub struct DirectoryFinderBuilder {
    roots: Vec<PathBuf>,
    patterns: Vec<Pattern>,
    max_depth: Option<usize>,
    follow_links: bool,
}

impl DirectoryFinderBuilder {
    /// Create a finder over `roots` matching `*.yml` and `*.yaml`
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            patterns: ResolverConfig::default_file_patterns()
                .iter()
                .filter_map(|p| Pattern::new(p).ok())
                .collect(),
            max_depth: None,
            follow_links: false,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        let mut finder = Self::new(config.search_paths.clone())
            .with_patterns(config.file_patterns.as_slice())?
            .follow_links(config.follow_links);
        if let Some(depth) = config.max_depth {
            finder = finder.with_max_depth(depth);
        }
        Ok(finder)
    }

    /// Replace the file patterns, matched against the path relative to its root
    pub fn with_patterns<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        self.patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p.as_ref()).map_err(|e| {
                    WorkflowImportError::config_with_code(
                        ErrorCode::CONFIG_INVALID_PATTERN,
                        format!("Invalid file pattern `{}`", p.as_ref()),
                        None,
                    )
                    .with_source(e)
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self)
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    fn matches(&self, root: &Path, file: &Path) -> bool {
        let relative = file.strip_prefix(root).unwrap_or(file);
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: true,
        };
        self.patterns
            .iter()
            .any(|p| p.matches_path_with(relative, options))
    }
}

impl WorkflowConfigFinderBuilder for DirectoryFinderBuilder {
    fn create(&self) -> Result<Vec<PathBuf>> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for root in &self.roots {
            if !root.is_dir() {
                tracing::warn!("Skipping missing search path {}", root.display());
                continue;
            }

            let mut walker = WalkDir::new(root)
                .follow_links(self.follow_links)
                .sort_by_file_name();
            if let Some(depth) = self.max_depth {
                walker = walker.max_depth(depth);
            }

            for entry in walker {
                let entry = entry?;
                if !entry.file_type().is_file() || !self.matches(root, entry.path()) {
                    continue;
                }
                let path = entry.into_path();
                if seen.insert(path.clone()) {
                    files.push(path);
                }
            }
        }

        tracing::debug!("Found {} candidate workflow files", files.len());
        Ok(files)
    }
}
