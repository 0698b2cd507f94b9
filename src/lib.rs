//! # workflow-import
//!
//! Resolves `imports` declared in workflow configuration files. A file can
//! import another file wholesale, or import a single workflow into one of its
//! own workflows, either from a named file or from whichever candidate file
//! defines it first. Imported workflows are deep-merged into the target, with
//! selected paths replaced wholesale.
//!
//! ## Usage
//!
//! ```bash
//! wfimport resolve config/workflows/order.yml --format json
//! ```
//!
//! ## Modules
//!
//! - `config` - Resolver settings from TOML files and the environment
//! - `error` - Error type, codes and helpers
//! - `files` - Reading configuration files and finding import candidates
//! - `import` - Import processors, their factories and the resolver chain head
//! - `provider` - Loading resolved workflows from a set of files
//! - `tree` - Configuration trees and the merge rules
//! - `trigger` - Cron and event transition triggers
//! - `testing` - In-memory collaborators for tests
pub mod config;
pub mod error;
pub mod files;
pub mod import;
pub mod provider;
pub mod tree;
pub mod trigger;

pub mod testing;

pub use error::{Result, WorkflowImportError};
pub use provider::WorkflowConfigurationProvider;
