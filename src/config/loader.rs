use super::{get_global_config_dir, ResolverConfig, ResolverConfigFile, PROJECT_CONFIG_FILE};
use crate::error::{ErrorCode, Result, WorkflowImportError};
use std::fs;
use std::path::{Path, PathBuf};

/// Layers resolver settings: defaults, global file, project file (or an
/// explicit file), then environment variables.
pub struct ConfigLoader {
    global_dir: Option<PathBuf>,
    project_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_dir: get_global_config_dir().ok(),
            project_dir: project_dir.into(),
        }
    }

    /// Use a specific global directory instead of the platform default
    pub fn with_global_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.global_dir = dir;
        self
    }

    /// Load without reading the process environment
    pub fn load_files(&self, explicit: Option<&Path>) -> Result<ResolverConfig> {
        let mut config = ResolverConfig::default();

        if let Some(global_dir) = &self.global_dir {
            let global_path = global_dir.join("config.toml");
            if global_path.exists() {
                config.apply(Self::read_file(&global_path)?);
            }
        }

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(WorkflowImportError::config_with_code(
                        ErrorCode::CONFIG_NOT_FOUND,
                        format!("Configuration file not found: {}", path.display()),
                        Some(path.to_path_buf()),
                    ));
                }
                config.apply(Self::read_file(path)?);
            }
            None => {
                let project_path = self.project_dir.join(PROJECT_CONFIG_FILE);
                if project_path.exists() {
                    config.apply(Self::read_file(&project_path)?);
                }
            }
        }

        Ok(config)
    }

    /// Load all layers including `WFIMPORT_*` environment overrides
    pub fn load(&self, explicit: Option<&Path>) -> Result<ResolverConfig> {
        let mut config = self.load_files(explicit)?;
        config.merge_env_vars();
        tracing::debug!(
            "Resolver configuration: {} search path(s), patterns {:?}",
            config.search_paths.len(),
            config.file_patterns
        );
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<ResolverConfigFile> {
        let content = fs::read_to_string(path)
            .map_err(|e| WorkflowImportError::from(e).with_path(path))?;
        let file: ResolverConfigFile =
            toml::from_str(&content).map_err(|e| WorkflowImportError::from(e).with_path(path))?;
        tracing::debug!("Loaded resolver configuration from {}", path.display());
        Ok(file)
    }
}
