//! Command-line application

use anyhow::{Context, Result};
use serde_json::json;

use crate::core::cli::{self, Commands};
use crate::core::config::{AppConfig, ResourceDefinition};
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::data::{SqlQuery, sqlite};
use crate::filter::{FilterRequest, Operator, SemanticType, Value};

pub struct FilterableApp {
    pub config: AppConfig,
}

impl FilterableApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self {
            config: AppConfig::load(&cli_config)?,
        };

        match command {
            Commands::Translate { resource, filter } => app.translate(&resource, &filter),
            Commands::Fields { resource } => app.fields(resource.as_deref()),
            Commands::Query {
                database,
                resource,
                filter,
                limit,
                count,
            } => {
                let pool = sqlite::connect_read_only(&database).await?;
                let query = app.filtered_query(&resource, &filter)?;
                if count {
                    println!("{}", query.count(&pool).await?);
                    return Ok(());
                }
                let query = match limit {
                    Some(limit) => query.limit(limit),
                    None => query,
                };
                let rows: Vec<serde_json::Value> = query
                    .fetch_all(&pool)
                    .await?
                    .iter()
                    .map(|row| serde_json::Value::Object(sqlite::row_to_json(row)))
                    .collect();
                tracing::debug!(rows = rows.len(), "Query finished");
                println!("{}", serde_json::to_string_pretty(&rows)?);
                Ok(())
            }
        }
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        // stdout carries command output
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    /// Parse `filter` and apply it to the resource's base query
    fn filtered_query(&self, resource: &str, filter: &str) -> Result<SqlQuery> {
        let resource = self.config.resource(resource)?;
        let request = FilterRequest::parse_json(filter)?;
        tracing::debug!(resource = %resource.name, filters = request.len(), "Applying filters");

        let query = self
            .config
            .engine(resource)
            .apply(&request, self.config.query(resource))
            .with_context(|| format!("Failed to filter resource '{}'", resource.name))?;
        Ok(query)
    }

    fn translate(&self, resource: &str, filter: &str) -> Result<()> {
        let (sql, params) = self.filtered_query(resource, filter)?.to_sql();
        let output = json!({
            "sql": sql,
            "params": params.iter().map(Value::to_json).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn fields(&self, only: Option<&str>) -> Result<()> {
        let resources: Vec<&ResourceDefinition> = match only {
            Some(name) => vec![self.config.resource(name)?],
            None => self.config.resources.values().collect(),
        };

        if resources.is_empty() {
            println!("No resources configured.");
            return Ok(());
        }

        for resource in resources {
            println!("{} ({})", resource.name, resource.table);
            for (name, semantic_type) in resource.map.entries() {
                println!(
                    "  {:<24} {:<13} {}",
                    name,
                    semantic_type,
                    self.operator_list(semantic_type)
                );
            }
        }
        Ok(())
    }

    fn operator_list(&self, semantic_type: SemanticType) -> String {
        if semantic_type == SemanticType::Scope {
            return "(scope)".to_string();
        }
        Operator::ALL
            .into_iter()
            .filter(|op| self.config.operators.is_allowed(*op, semantic_type))
            .map(|op| op.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
