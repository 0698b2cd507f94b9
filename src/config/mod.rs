use crate::error::{ErrorCode, Result, WorkflowImportError};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod loader;

pub use loader::ConfigLoader;

/// File name of the project-local configuration
pub const PROJECT_CONFIG_FILE: &str = "wfimport.toml";

/// Get the global directory holding `config.toml`
pub fn get_global_config_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "wfimport", "wfimport")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| {
            WorkflowImportError::config_with_code(
                ErrorCode::CONFIG_NOT_FOUND,
                "Could not determine home directory",
                None,
            )
        })
}

/// Settings for locating and resolving workflow configuration files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Directories searched for import candidates
    pub search_paths: Vec<PathBuf>,
    /// Glob patterns a candidate's path (relative to its search root) must match
    pub file_patterns: Vec<String>,
    /// Maximum directory depth below each search root
    pub max_depth: Option<usize>,
    pub follow_links: bool,
    pub log_level: Option<String>,
}

/// One configuration source; unset fields leave the previous value alone
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfigFile {
    pub search_paths: Option<Vec<PathBuf>>,
    pub file_patterns: Option<Vec<String>>,
    pub max_depth: Option<usize>,
    pub follow_links: Option<bool>,
    pub log_level: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            search_paths: vec![PathBuf::from(".")],
            file_patterns: Self::default_file_patterns(),
            max_depth: None,
            follow_links: false,
            log_level: Some("info".to_string()),
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_file_patterns() -> Vec<String> {
        vec!["*.yml".to_string(), "*.yaml".to_string()]
    }

    /// Overlay the fields a configuration file sets
    pub fn apply(&mut self, file: ResolverConfigFile) {
        if let Some(paths) = file.search_paths {
            self.search_paths = paths;
        }
        if let Some(patterns) = file.file_patterns {
            self.file_patterns = patterns;
        }
        if file.max_depth.is_some() {
            self.max_depth = file.max_depth;
        }
        if let Some(follow) = file.follow_links {
            self.follow_links = follow;
        }
        if file.log_level.is_some() {
            self.log_level = file.log_level;
        }
    }

    pub fn merge_env_vars(&mut self) {
        self.merge_env_from(|key| std::env::var(key).ok());
    }

    /// Apply `WFIMPORT_*` overrides read through `lookup`
    pub fn merge_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(paths) = lookup("WFIMPORT_SEARCH_PATHS") {
            let paths: Vec<PathBuf> = std::env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            if !paths.is_empty() {
                self.search_paths = paths;
            }
        }

        if let Some(patterns) = lookup("WFIMPORT_FILE_PATTERNS") {
            let patterns: Vec<String> = patterns
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            if !patterns.is_empty() {
                self.file_patterns = patterns;
            }
        }

        if let Some(log_level) = lookup("WFIMPORT_LOG_LEVEL") {
            self.log_level = Some(log_level);
        }

        if let Some(follow) = lookup("WFIMPORT_FOLLOW_LINKS") {
            if let Ok(value) = follow.parse::<bool>() {
                self.follow_links = value;
            }
        }
    }

    pub fn get_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}
