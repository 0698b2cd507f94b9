use std::path::PathBuf;
use thiserror::Error;

pub mod codes;
pub mod helpers;

pub use codes::{describe_error_code, ErrorCode};
pub use helpers::common;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// The unified error type for workflow configuration import resolution.
///
/// `Display` renders the bare message so callers can match on it; use
/// [`WorkflowImportError::developer_message`] for the coded form with the
/// source chain.
#[derive(Error, Debug)]
pub enum WorkflowImportError {
    #[error("{message}")]
    Import {
        code: u16,
        message: String,
        workflow: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("{message}")]
    Config {
        code: u16,
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("{message}")]
    Storage {
        code: u16,
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("{message}")]
    Validation {
        code: u16,
        message: String,
        field: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl WorkflowImportError {
    /// Create an import error with default code
    pub fn import(message: impl Into<String>) -> Self {
        Self::Import {
            code: ErrorCode::IMPORT_GENERIC,
            message: message.into(),
            workflow: None,
            source: None,
        }
    }

    /// Create an import error with specific code and workflow name
    pub fn import_with_code(
        code: u16,
        message: impl Into<String>,
        workflow: Option<String>,
    ) -> Self {
        Self::Import {
            code,
            message: message.into(),
            workflow,
            source: None,
        }
    }

    /// Create a configuration error with default code
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::CONFIG_GENERIC,
            message: message.into(),
            path: None,
            source: None,
        }
    }

    /// Create a configuration error with specific code and path
    pub fn config_with_code(code: u16, message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            path,
            source: None,
        }
    }

    /// Create a storage error with default code
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            code: ErrorCode::STORAGE_GENERIC,
            message: message.into(),
            path: None,
            source: None,
        }
    }

    /// Create a storage error with specific code and path
    pub fn storage_with_code(code: u16, message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Storage {
            code,
            message: message.into(),
            path,
            source: None,
        }
    }

    /// Create a validation error with default code
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            code: ErrorCode::VALIDATION_GENERIC,
            message: message.into(),
            field: None,
            source: None,
        }
    }

    /// Create a validation error with specific code and field
    pub fn validation_with_code(
        code: u16,
        message: impl Into<String>,
        field: Option<String>,
    ) -> Self {
        Self::Validation {
            code,
            message: message.into(),
            field,
            source: None,
        }
    }

    /// Add a source error to this error
    pub fn with_source(mut self, source: impl Into<BoxedSource>) -> Self {
        match &mut self {
            Self::Import { source: src, .. }
            | Self::Config { source: src, .. }
            | Self::Storage { source: src, .. }
            | Self::Validation { source: src, .. } => {
                *src = Some(source.into());
            }
        }
        self
    }

    /// Attach the file path to a config or storage error
    pub fn with_path(mut self, file: impl Into<PathBuf>) -> Self {
        if let Self::Config { path, .. } | Self::Storage { path, .. } = &mut self {
            *path = Some(file.into());
        }
        self
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Storage { .. } => 4,
            Self::Import { .. } => 6,
            Self::Validation { .. } => 8,
        }
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Import { code, .. }
            | Self::Config { code, .. }
            | Self::Storage { code, .. }
            | Self::Validation { code, .. } => *code,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Import {
                message, workflow, ..
            } => {
                if let Some(name) = workflow {
                    format!("Import of workflow '{}' failed: {}", name, message)
                } else {
                    format!("Import failed: {}", message)
                }
            }
            Self::Config { message, path, .. } => {
                if let Some(p) = path {
                    format!("Configuration problem in {}: {}", p.display(), message)
                } else {
                    format!("Configuration problem: {}", message)
                }
            }
            Self::Storage { message, path, .. } => {
                if let Some(p) = path {
                    format!("Storage error at {}: {}", p.display(), message)
                } else {
                    format!("Storage error: {}", message)
                }
            }
            Self::Validation { message, field, .. } => {
                if let Some(f) = field {
                    format!("Validation error for '{}': {}", f, message)
                } else {
                    format!("Validation error: {}", message)
                }
            }
        }
    }

    /// Get a developer-friendly error message with code and full source chain
    pub fn developer_message(&self) -> String {
        let mut msg = format!("[E{:04}] {}", self.code(), self);
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            msg.push_str(&format!("\n  caused by: {}", err));
            source = err.source();
        }
        msg
    }

}

/// Type alias for Results using WorkflowImportError
pub type Result<T> = std::result::Result<T, WorkflowImportError>;

// Conversion from common error types

impl From<std::io::Error> for WorkflowImportError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let (code, message) = match err.kind() {
            ErrorKind::NotFound => (ErrorCode::STORAGE_NOT_FOUND, "File or directory not found"),
            ErrorKind::PermissionDenied => {
                (ErrorCode::STORAGE_PERMISSION_DENIED, "Permission denied")
            }
            ErrorKind::InvalidData => (ErrorCode::STORAGE_INVALID_DATA, "Invalid data"),
            _ => (ErrorCode::STORAGE_IO_ERROR, "IO operation failed"),
        };

        WorkflowImportError::storage_with_code(code, message, None).with_source(err)
    }
}

impl From<serde_yaml::Error> for WorkflowImportError {
    fn from(err: serde_yaml::Error) -> Self {
        WorkflowImportError::config_with_code(ErrorCode::CONFIG_INVALID_YAML, "Invalid YAML syntax", None)
            .with_source(err)
    }
}

impl From<serde_json::Error> for WorkflowImportError {
    fn from(err: serde_json::Error) -> Self {
        WorkflowImportError::config_with_code(ErrorCode::CONFIG_INVALID_JSON, "Invalid JSON syntax", None)
            .with_source(err)
    }
}

impl From<toml::de::Error> for WorkflowImportError {
    fn from(err: toml::de::Error) -> Self {
        WorkflowImportError::config_with_code(ErrorCode::CONFIG_INVALID_TOML, "Invalid TOML syntax", None)
            .with_source(err)
    }
}

impl From<walkdir::Error> for WorkflowImportError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(|p| p.to_path_buf());
        WorkflowImportError::storage_with_code(
            ErrorCode::STORAGE_TRAVERSAL_ERROR,
            "Failed to traverse search directory",
            path,
        )
        .with_source(err)
    }
}
