use clap::{Parser, Subcommand};

use std::path::PathBuf;

use crate::data::Backend;

use super::constants::{
    ENV_BACKEND, ENV_CONFIG, ENV_DATABASE, ENV_DEFAULT_OPERATOR, ENV_STRICT_COLUMNS,
};

#[derive(Parser)]
#[command(name = "filterable")]
#[command(version, about = "Translate filter maps into SQL predicates", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// SQL backend (sqlite or postgres)
    #[arg(long, global = true, env = ENV_BACKEND, value_parser = parse_backend)]
    pub backend: Option<Backend>,

    /// Reject filter keys that are not in the resource's filterable map
    #[arg(long, global = true, env = ENV_STRICT_COLUMNS)]
    pub strict: Option<bool>,

    /// Operator applied to bare values (canonical token or alias)
    #[arg(long, global = true, env = ENV_DEFAULT_OPERATOR)]
    pub default_operator: Option<String>,
}

/// Parse SQL backend from CLI/env string
fn parse_backend(s: &str) -> Result<Backend, String> {
    s.parse()
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Print the SQL and bound parameters for a filter
    Translate {
        /// Configured resource name
        resource: String,
        /// Filter map as JSON, e.g. '{"age":{"gte":25}}'
        #[arg(default_value = "{}")]
        filter: String,
    },
    /// List filterable fields and the operators each accepts
    Fields {
        /// Only show this resource
        resource: Option<String>,
    },
    /// Run a filter against a SQLite database and print matching rows as JSON
    Query {
        /// SQLite database file (opened read-only)
        #[arg(long, short = 'd', env = ENV_DATABASE)]
        database: PathBuf,
        /// Configured resource name
        resource: String,
        /// Filter map as JSON
        #[arg(default_value = "{}")]
        filter: String,
        /// Maximum number of rows
        #[arg(long, short = 'l')]
        limit: Option<u32>,
        /// Print the number of matching rows instead of the rows
        #[arg(long)]
        count: bool,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub strict_columns: Option<bool>,
    pub default_operator: Option<String>,
}

impl From<&Cli> for CliConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            config: cli.config.clone(),
            backend: cli.backend,
            strict_columns: cli.strict,
            default_operator: cli.default_operator.clone(),
        }
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig::from(&cli);
    (config, cli.command)
}
