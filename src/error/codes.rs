/// Error code registry
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 3000-3999: Storage errors
/// - 5000-5999: Import errors
/// - 7000-7999: Validation errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_INVALID_YAML: u16 = 1002;
    pub const CONFIG_INVALID_JSON: u16 = 1003;
    pub const CONFIG_INVALID_TOML: u16 = 1004;
    pub const CONFIG_INVALID_VALUE: u16 = 1005;
    pub const CONFIG_NOT_A_MAPPING: u16 = 1006;
    pub const CONFIG_INVALID_PATTERN: u16 = 1007;

    // Storage errors (3000-3999)
    pub const STORAGE_GENERIC: u16 = 3000;
    pub const STORAGE_IO_ERROR: u16 = 3001;
    pub const STORAGE_PERMISSION_DENIED: u16 = 3002;
    pub const STORAGE_NOT_FOUND: u16 = 3004;
    pub const STORAGE_INVALID_DATA: u16 = 3006;
    pub const STORAGE_TRAVERSAL_ERROR: u16 = 3013;

    // Import errors (5000-5999)
    pub const IMPORT_GENERIC: u16 = 5000;
    pub const IMPORT_WORKFLOW_NOT_FOUND: u16 = 5001;
    pub const WORKFLOW_CIRCULAR_IMPORT: u16 = 5010;

    // Validation errors (7000-7999)
    pub const VALIDATION_GENERIC: u16 = 7000;
    pub const VALIDATION_REQUIRED_FIELD: u16 = 7001;
    pub const VALIDATION_INVALID_TYPE: u16 = 7002;
    pub const VALIDATION_TYPE_MISMATCH: u16 = 7003;
    pub const VALIDATION_INVALID_VALUE: u16 = 7004;
    pub const VALIDATION_INVALID_FORMAT: u16 = 7005;
    pub const VALIDATION_CONSTRAINT_VIOLATION: u16 = 7006;
    pub const WORKFLOW_DUPLICATE: u16 = 7007;
    pub const VALIDATION_UNKNOWN_DIRECTIVE: u16 = 7010;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        // Configuration errors
        1000 => "Generic configuration error",
        1001 => "Configuration file not found",
        1002 => "Invalid YAML syntax in configuration",
        1003 => "Invalid JSON syntax in configuration",
        1004 => "Invalid TOML syntax in configuration",
        1005 => "Invalid value in configuration",
        1006 => "Configuration document is not a mapping",
        1007 => "Invalid file pattern",

        // Storage errors
        3000 => "Generic storage error",
        3001 => "Storage I/O error",
        3002 => "Storage permission denied",
        3004 => "Storage item not found",
        3006 => "Storage data is invalid",
        3013 => "Directory traversal failed",

        // Import errors
        5000 => "Generic import error",
        5001 => "Imported workflow not found",
        5010 => "Circular workflow import",

        // Validation errors
        7000 => "Generic validation error",
        7001 => "Required field is missing",
        7002 => "Field has an invalid type",
        7003 => "Unexpected variant handed to a verifier",
        7004 => "Field has an invalid value",
        7005 => "Invalid format",
        7006 => "Constraint violation",
        7007 => "Workflow is defined more than once",
        7010 => "Unknown import directive",

        _ => "Unknown error code",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_descriptions() {
        assert_eq!(
            describe_error_code(ErrorCode::IMPORT_WORKFLOW_NOT_FOUND),
            "Imported workflow not found"
        );
        assert_eq!(
            describe_error_code(ErrorCode::WORKFLOW_CIRCULAR_IMPORT),
            "Circular workflow import"
        );
        assert_eq!(describe_error_code(4242), "Unknown error code");
    }

    #[test]
    fn test_error_code_ranges() {
        assert!((1000..2000).contains(&ErrorCode::CONFIG_INVALID_TOML));
        assert!((3000..4000).contains(&ErrorCode::STORAGE_TRAVERSAL_ERROR));
        assert!((5000..6000).contains(&ErrorCode::WORKFLOW_CIRCULAR_IMPORT));
        assert!((7000..8000).contains(&ErrorCode::VALIDATION_UNKNOWN_DIRECTIVE));
    }
}
