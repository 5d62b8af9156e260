// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "filterable";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "filterable.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "FILTERABLE_CONFIG";

// =============================================================================
// Environment Variables - Logging
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "FILTERABLE_LOG";

// =============================================================================
// Environment Variables - Filtering
// =============================================================================

/// Environment variable for the SQL backend (sqlite or postgres)
pub const ENV_BACKEND: &str = "FILTERABLE_BACKEND";

/// Environment variable for strict column validation
pub const ENV_STRICT_COLUMNS: &str = "FILTERABLE_STRICT_COLUMNS";

/// Environment variable for the operator applied to bare values
pub const ENV_DEFAULT_OPERATOR: &str = "FILTERABLE_DEFAULT_OPERATOR";

/// Environment variable for the SQLite database used by `query`
pub const ENV_DATABASE: &str = "FILTERABLE_DATABASE";
