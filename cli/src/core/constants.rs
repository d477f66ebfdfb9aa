// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "azscout";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".azscout";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "azscout.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "AZSCOUT_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "AZSCOUT_LOG";

// =============================================================================
// Environment Variables - Search Service
// =============================================================================

/// Environment variable for the search service endpoint
pub const ENV_ENDPOINT: &str = "AZSCOUT_ENDPOINT";

/// Environment variable for the admin API key
pub const ENV_API_KEY: &str = "AZSCOUT_API_KEY";

/// Environment variable for the REST API version
pub const ENV_API_VERSION: &str = "AZSCOUT_API_VERSION";

/// Environment variable for the request timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "AZSCOUT_TIMEOUT_SECS";

// =============================================================================
// Search Defaults
// =============================================================================

/// Page size used by `search --page` when `--top` is not given
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Document key field used by `upload` when `--key` is not given
pub const DEFAULT_DOCUMENT_KEY: &str = "id";
