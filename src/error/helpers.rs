use super::{ErrorCode, WorkflowImportError};
use std::path::Path;

/// Helper functions for common error scenarios
pub mod common {
    use super::*;

    /// The named workflow could not be found in any candidate file
    pub fn workflow_not_found(resource: &str) -> WorkflowImportError {
        WorkflowImportError::import_with_code(
            ErrorCode::IMPORT_WORKFLOW_NOT_FOUND,
            format!("Can not find workflow `{}` for import.", resource),
            Some(resource.to_string()),
        )
    }

    /// Two workflow imports are waiting on each other
    pub fn circular_workflow_import(
        file: &Path,
        resource: &str,
        target: &str,
        other_file: &Path,
    ) -> WorkflowImportError {
        WorkflowImportError::import_with_code(
            ErrorCode::WORKFLOW_CIRCULAR_IMPORT,
            format!(
                "Recursion met. File `{}` tries to import workflow `{}` for `{}` that imports it too in `{}`.",
                file.display(),
                resource,
                target,
                other_file.display()
            ),
            Some(resource.to_string()),
        )
    }

    /// A resource file is imported again while it is still being imported
    pub fn resource_already_resolving(file: &Path, resource: &Path) -> WorkflowImportError {
        WorkflowImportError::import_with_code(
            ErrorCode::WORKFLOW_CIRCULAR_IMPORT,
            format!(
                "Recursion met. File `{}` tries to import `{}` that is still being resolved.",
                file.display(),
                resource.display()
            ),
            None,
        )
    }

    pub fn circular_resource_import(
        file: &Path,
        resource: &Path,
        other_file: &Path,
    ) -> WorkflowImportError {
        WorkflowImportError::import_with_code(
            ErrorCode::WORKFLOW_CIRCULAR_IMPORT,
            format!(
                "Recursion met. File `{}` tries to import `{}` that is already being imported from `{}`.",
                file.display(),
                resource.display(),
                other_file.display()
            ),
            None,
        )
    }

    /// A required declaration field is missing
    pub fn missing_field(field: &str) -> WorkflowImportError {
        WorkflowImportError::validation_with_code(
            ErrorCode::VALIDATION_REQUIRED_FIELD,
            format!("Option `{}` is required", field),
            Some(field.to_string()),
        )
    }

    /// A declaration field has the wrong type
    pub fn invalid_field_type(field: &str, expected: &str) -> WorkflowImportError {
        WorkflowImportError::validation_with_code(
            ErrorCode::VALIDATION_INVALID_TYPE,
            format!("Option `{}` must be {}", field, expected),
            Some(field.to_string()),
        )
    }

    /// A verifier or assembler was handed the wrong kind of value
    pub fn unexpected_type(expected: &str, actual: &str) -> WorkflowImportError {
        WorkflowImportError::validation_with_code(
            ErrorCode::VALIDATION_TYPE_MISMATCH,
            format!("Expected instance of `{}`, `{}` given", expected, actual),
            None,
        )
    }

    /// A document that must be a mapping is not
    pub fn not_a_mapping(path: &Path) -> WorkflowImportError {
        WorkflowImportError::config_with_code(
            ErrorCode::CONFIG_NOT_A_MAPPING,
            format!(
                "Configuration file `{}` must contain a mapping at its root",
                path.display()
            ),
            Some(path.to_path_buf()),
        )
    }
}
