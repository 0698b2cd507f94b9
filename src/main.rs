use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, error, trace};
use tracing_subscriber::EnvFilter;
use workflow_import::config::{ConfigLoader, ResolverConfig};
use workflow_import::error::{ErrorCode, WorkflowImportError};
use workflow_import::tree;
use workflow_import::trigger::{TransitionTriggersAssembler, WorkflowDefinition};
use workflow_import::WorkflowConfigurationProvider;

/// Resolve imports in workflow configuration files
#[derive(Parser)]
#[command(name = "wfimport")]
#[command(about = "Resolve workflow configuration imports", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Directories searched for import candidates (overrides configuration)
    #[arg(short = 's', long = "search-path", value_name = "DIR", global = true)]
    search_paths: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one file with all of its imports resolved
    Resolve {
        /// Workflow configuration file
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: OutputFormat,
    },
    /// List the workflows defined across the search paths
    List,
    /// Assemble and verify the transition triggers of one workflow
    Triggers {
        /// Workflow configuration file
        file: PathBuf,

        /// Name of the workflow
        workflow: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let config = load_config(&cli);
    let configured_level = config
        .as_ref()
        .map(|c| c.get_log_level().to_string())
        .unwrap_or_else(|_| "info".to_string());

    let log_level = match cli.verbose {
        0 => configured_level,
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2) // Show target module for -vv and above
        .with_line_number(cli.verbose >= 3)
        .init();

    debug!("wfimport started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    let result = config
        .map_err(anyhow::Error::from)
        .and_then(|config| run(cli.command, config));

    if let Err(e) = result {
        handle_fatal_error(e, cli.verbose);
    }
}

/// Print the error, with the coded source chain when verbose, and exit
fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {:#}", error);

    if let Some(import_err) = error.downcast_ref::<WorkflowImportError>() {
        eprintln!("Error: {}", import_err.user_message());
        if verbose >= 1 {
            eprintln!("\nContext Chain:\n{}", import_err.developer_message());
        }
    } else {
        eprintln!("Error: {error:#}");
        if verbose >= 1 {
            eprintln!("\nError chain:");
            for (i, cause) in error.chain().enumerate() {
                eprintln!("  {}: {}", i, cause);
            }
        }
    }

    std::process::exit(exit_code(&error))
}

fn load_config(cli: &Cli) -> workflow_import::Result<ResolverConfig> {
    let project_dir = std::env::current_dir()?;
    let mut config = ConfigLoader::new(project_dir).load(cli.config.as_deref())?;
    if !cli.search_paths.is_empty() {
        config.search_paths = cli.search_paths.clone();
    }
    Ok(config)
}

fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<WorkflowImportError>())
        .map(WorkflowImportError::exit_code)
        .unwrap_or(1)
}

fn run(command: Commands, config: ResolverConfig) -> anyhow::Result<()> {
    let provider = WorkflowConfigurationProvider::from_config(&config)?;

    match command {
        Commands::Resolve { file, format } => run_resolve(&provider, &file, format),
        Commands::List => run_list(&provider),
        Commands::Triggers { file, workflow } => run_triggers(&provider, &file, &workflow),
    }
}

fn run_resolve(
    provider: &WorkflowConfigurationProvider,
    file: &Path,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let resolved = Value::Object(provider.load_file(file)?);
    let output = match format {
        OutputFormat::Yaml => serde_yaml::to_string(&resolved)?,
        OutputFormat::Json => serde_json::to_string_pretty(&resolved)?,
    };
    println!("{}", output.trim_end());
    Ok(())
}

fn run_list(provider: &WorkflowConfigurationProvider) -> anyhow::Result<()> {
    let loaded = provider.load_workflows()?;
    if let Some(workflows) = tree::workflows(&loaded) {
        for name in workflows.keys() {
            println!("{name}");
        }
    }
    Ok(())
}

fn run_triggers(
    provider: &WorkflowConfigurationProvider,
    file: &Path,
    workflow: &str,
) -> anyhow::Result<()> {
    let resolved = provider.load_file(file)?;
    let node = tree::workflow(&resolved, workflow).ok_or_else(|| {
        WorkflowImportError::import_with_code(
            ErrorCode::IMPORT_WORKFLOW_NOT_FOUND,
            format!("Workflow `{}` is not defined in {}", workflow, file.display()),
            Some(workflow.to_string()),
        )
    })?;

    let definition = WorkflowDefinition::from_node(workflow, node);
    let triggers = TransitionTriggersAssembler::default()
        .assemble_all(&definition, node)
        .with_context(|| format!("Invalid triggers in workflow `{}`", workflow))?;

    println!("{}", serde_json::to_string_pretty(&triggers)?);
    Ok(())
}
