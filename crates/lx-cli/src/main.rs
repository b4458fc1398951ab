use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::NameDisplay;

/// Runtime installation explorer.
///
/// Reads the feature manifests of an installation, resolves their
/// dependencies and answers queries over the resulting graph.
///
/// PATTERNS:
///     servlet-*           Elements whose name matches the glob
///     servlet-*/**        ...and everything they depend on
///     **/servlet-*        ...and everything that depends on them
///     !**/test-*          Remove matches before anything is included
///     regex:jdbc-4\.[0-9] Regular expression instead of glob
///
/// ENVIRONMENT VARIABLES:
///     LX_DIRECTORY  Default installation directory
///     LX_BUNDLES    Set to '1' to read bundle jars by default
///     LX_VERBOSE    Set to '1' for debug logging
///     RUST_LOG      Override the log filter
#[derive(Parser)]
#[command(name = "lx")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Installation root directory (defaults to the working directory)
    #[arg(long, global = true)]
    directory: Option<PathBuf>,

    /// Process bundles in the dependency analysis
    #[arg(long, global = true)]
    bundles: bool,

    /// Provide more detailed output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List matching features
    ///
    /// EXAMPLES:
    ///     lx list 'servlet-*'
    ///     lx list --display symbolic '**/jdbc-*'
    List {
        /// One or more patterns to match elements by name
        #[arg(required = true)]
        patterns: Vec<String>,
        /// How elements are named in the listing
        #[arg(long, short = 'd', value_enum, default_value_t = NameDisplay::Normal)]
        display: NameDisplay,
    },

    /// Display the description of matching features and bundles
    Describe {
        /// One or more patterns to match elements by name
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Produce a detailed explanation of matching features
    Explain {
        /// Patterns to match features by name
        #[arg(default_value = "*")]
        patterns: Vec<String>,
    },
}

/// Install the stderr log subscriber; `RUST_LOG` wins over `--verbose`
fn initialize_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = config::Settings::resolve(cli.directory, cli.bundles, cli.verbose)?;

    initialize_tracing(settings.verbose);

    match cli.command {
        Commands::List { patterns, display } => {
            commands::list::run(&settings, &patterns, display)?;
        }
        Commands::Describe { patterns } => {
            commands::describe::run(&settings, &patterns)?;
        }
        Commands::Explain { patterns } => {
            commands::explain::run(&settings, &patterns)?;
        }
    }

    Ok(())
}
