use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::{Backend, Relation, RelationKind, Schema, SqlQuery};
use crate::filter::{
    FilterEngine, FilterName, FilterOptions, FilterableMap, Operator, OperatorTable,
    SemanticType,
};
use crate::utils::string::accessor_name;

use super::cli::CliConfig;
use super::constants::CONFIG_FILE_NAME;

// =============================================================================
// File Config Structures (all fields optional for partial configs)
// =============================================================================

/// Root structure of `filterable.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub backend: Option<Backend>,
    pub default_operator: Option<String>,
    pub strict_columns: Option<bool>,
    pub operators: Option<OperatorsFileConfig>,
    pub resources: Option<BTreeMap<String, ResourceFileConfig>>,

    /// Catch unknown fields for warning
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// Operator table overrides
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperatorsFileConfig {
    /// alias → canonical operator token
    pub aliases: Option<BTreeMap<String, String>>,
    /// canonical operator token → type tags (replaces the default set)
    pub permissions: Option<BTreeMap<String, Vec<String>>>,
}

/// One filterable resource (usually a table)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceFileConfig {
    /// Table name, defaults to the resource name
    pub table: Option<String>,
    /// field → type tag
    #[serde(default)]
    pub filterable: BTreeMap<String, String>,
    #[serde(default)]
    pub relations: BTreeMap<String, RelationFileConfig>,
    pub default_operator: Option<String>,
    pub strict_columns: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationFileConfig {
    pub kind: RelationKind,
    pub table: String,
    pub foreign_key: String,
    pub key: Option<String>,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// A filterable resource ready to build engines from
#[derive(Debug, Clone)]
pub struct ResourceDefinition {
    pub name: String,
    pub table: String,
    pub map: FilterableMap,
    pub options: FilterOptions,
}

/// Application configuration after layering defaults, file and CLI/env
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: Backend,
    pub operators: OperatorTable,
    pub resources: BTreeMap<String, ResourceDefinition>,
    pub schema: Arc<Schema>,
}

impl AppConfig {
    /// Load configuration: defaults -> config file -> CLI/env overrides
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let path = match &cli.config {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path.clone())
            }
            None => {
                let local = PathBuf::from(CONFIG_FILE_NAME);
                if local.exists() { Some(local) } else { None }
            }
        };

        let file_config = match path {
            Some(path) => {
                let config = FileConfig::load_from_file(&path)?;
                config.warn_unknown_fields();
                config
            }
            None => {
                tracing::debug!("No config file found, using defaults");
                FileConfig::default()
            }
        };

        Self::from_file_config(file_config, cli)
    }

    /// Resolve and validate a parsed config file
    pub fn from_file_config(file: FileConfig, cli: &CliConfig) -> Result<Self> {
        let backend = cli.backend.or(file.backend).unwrap_or_default();
        let operators = build_operator_table(file.operators.unwrap_or_default())?;

        let global_default = file.default_operator;
        let global_strict = file.strict_columns;

        let mut schema = Schema::new();
        let mut resources = BTreeMap::new();

        for (name, resource) in file.resources.unwrap_or_default() {
            let table = resource.table.clone().unwrap_or_else(|| name.clone());

            for (relation_name, relation) in &resource.relations {
                let mut rel = Relation::new(relation.kind, &relation.table, &relation.foreign_key);
                if let Some(key) = &relation.key {
                    rel = rel.with_key(key);
                }
                schema.add_relation(&table, relation_name, rel);
            }

            let map = FilterableMap::from_tags(&resource.filterable)
                .with_context(|| format!("Invalid filterable fields for resource '{}'", name))?;
            validate_relations(&name, &map, &resource.relations)?;

            // CLI/env > resource > global > built-in default
            let default_token = cli
                .default_operator
                .as_deref()
                .or(resource.default_operator.as_deref())
                .or(global_default.as_deref());
            let default_operator = match default_token {
                Some(token) => operators.canonicalize(token).with_context(|| {
                    format!("Invalid default operator for resource '{}'", name)
                })?,
                None => Operator::Eq,
            };
            let strict_columns = cli
                .strict_columns
                .or(resource.strict_columns)
                .or(global_strict)
                .unwrap_or(false);

            tracing::debug!(
                resource = %name,
                table = %table,
                fields = map.len(),
                default_operator = %default_operator,
                strict_columns,
                "Resource configured"
            );

            resources.insert(
                name.clone(),
                ResourceDefinition {
                    name,
                    table,
                    map,
                    options: FilterOptions {
                        default_operator,
                        strict_columns,
                    },
                },
            );
        }

        Ok(Self {
            backend,
            operators,
            resources,
            schema: Arc::new(schema),
        })
    }

    pub fn resource(&self, name: &str) -> Result<&ResourceDefinition> {
        self.resources.get(name).with_context(|| {
            let known: Vec<&str> = self.resources.keys().map(String::as_str).collect();
            format!(
                "Unknown resource '{}'. Configured resources: {}",
                name,
                if known.is_empty() {
                    "(none)".to_string()
                } else {
                    known.join(", ")
                }
            )
        })
    }

    /// Engine for a configured resource
    pub fn engine(&self, resource: &ResourceDefinition) -> FilterEngine<SqlQuery> {
        FilterEngine::new(resource.map.clone())
            .with_operators(self.operators.clone())
            .with_options(resource.options)
    }

    /// Empty query over a configured resource's table
    pub fn query(&self, resource: &ResourceDefinition) -> SqlQuery {
        SqlQuery::new(Arc::clone(&self.schema), resource.table.as_str()).with_backend(self.backend)
    }
}

fn build_operator_table(config: OperatorsFileConfig) -> Result<OperatorTable> {
    let mut table = OperatorTable::default();

    for (token, tags) in config.permissions.unwrap_or_default() {
        let operator = Operator::from_token(&token)
            .with_context(|| format!("Unknown operator '{}' in operator permissions", token))?;
        let types = tags
            .iter()
            .map(|tag| tag.parse::<SemanticType>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Invalid type in permissions for operator '{}'", token))?;
        table.set_permission(operator, &types);
    }

    for (alias, token) in config.aliases.unwrap_or_default() {
        let operator = Operator::from_token(&token)
            .with_context(|| format!("Alias '{}' targets unknown operator '{}'", alias, token))?;
        table.set_alias(alias, operator);
    }

    Ok(table)
}

/// Dotted keys and relationship-typed keys must name a declared relation
fn validate_relations(
    resource: &str,
    map: &FilterableMap,
    relations: &BTreeMap<String, RelationFileConfig>,
) -> Result<()> {
    let declared: Vec<String> = relations.keys().map(|name| accessor_name(name)).collect();

    for (key, semantic_type) in map.entries() {
        let name = FilterName::parse(key)?;
        let relation = match (&name.relation, semantic_type) {
            (Some(relation), _) => relation,
            (None, SemanticType::Relationship) => &name.column,
            _ => continue,
        };
        if !declared.contains(&accessor_name(relation)) {
            anyhow::bail!(
                "Resource '{}': field '{}' refers to undeclared relation '{}'",
                resource,
                key,
                relation
            );
        }
    }
    Ok(())
}
