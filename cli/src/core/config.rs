use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use azure_scout::engine::{
    DEFAULT_SOFT_DELETE_COLUMN, DEFAULT_SOFT_DELETE_MARKER, EngineConfig, SoftDeleteConfig,
};
use azure_scout::filters::{CompilerOptions, DEFAULT_MAX_DEPTH};
use azure_scout::gateway::{DEFAULT_API_VERSION, DEFAULT_TIMEOUT_SECS, GatewayConfig};

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{APP_DOT_FOLDER, CONFIG_FILE_NAME};

// =============================================================================
// File Config (JSON)
// =============================================================================

/// Search service section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchFileConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub api_version: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Filter compilation section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FiltersFileConfig {
    pub max_depth: Option<usize>,
    pub strict: Option<bool>,
}

/// Soft-delete policy section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SoftDeleteFileConfig {
    pub enabled: Option<bool>,
    pub column: Option<String>,
    pub marker: Option<String>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub search: Option<SearchFileConfig>,
    pub filters: Option<FiltersFileConfig>,
    pub soft_delete: Option<SoftDeleteFileConfig>,
    pub index_settings: Option<BTreeMap<String, Value>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if !self.extra.is_empty() {
            let keys_str = self
                .extra
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(search) = other.search {
            let current = self.search.get_or_insert_with(SearchFileConfig::default);
            if search.endpoint.is_some() {
                tracing::trace!(endpoint = ?search.endpoint, "Merging search.endpoint");
                current.endpoint = search.endpoint;
            }
            if search.api_key.is_some() {
                tracing::trace!("Merging search.api_key");
                current.api_key = search.api_key;
            }
            if search.api_version.is_some() {
                current.api_version = search.api_version;
            }
            if search.timeout_secs.is_some() {
                current.timeout_secs = search.timeout_secs;
            }
        }

        if let Some(filters) = other.filters {
            let current = self.filters.get_or_insert_with(FiltersFileConfig::default);
            if filters.max_depth.is_some() {
                tracing::trace!(max_depth = ?filters.max_depth, "Merging filters.max_depth");
                current.max_depth = filters.max_depth;
            }
            if filters.strict.is_some() {
                current.strict = filters.strict;
            }
        }

        if let Some(soft_delete) = other.soft_delete {
            let current = self
                .soft_delete
                .get_or_insert_with(SoftDeleteFileConfig::default);
            if soft_delete.enabled.is_some() {
                current.enabled = soft_delete.enabled;
            }
            if soft_delete.column.is_some() {
                current.column = soft_delete.column;
            }
            if soft_delete.marker.is_some() {
                current.marker = soft_delete.marker;
            }
        }

        // Index definitions replace per index, never field by field
        if let Some(index_settings) = other.index_settings {
            let current = self.index_settings.get_or_insert_with(BTreeMap::new);
            for (name, definition) in index_settings {
                tracing::trace!(index = %name, "Merging index_settings");
                current.insert(name, definition);
            }
        }
    }
}

// =============================================================================
// Resolved Config
// =============================================================================

/// Search service connection settings; endpoint and key stay optional until
/// a command needs the service
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub api_version: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.azscout/azscout.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::resolve(cli, file_config);
        config.validate()?;
        Ok(config)
    }

    /// Layer defaults, file config and CLI/env overrides
    pub(crate) fn resolve(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_search = file_config.search.unwrap_or_default();
        let file_filters = file_config.filters.unwrap_or_default();
        let file_soft_delete = file_config.soft_delete.unwrap_or_default();

        let search = SearchConfig {
            endpoint: cli.endpoint.clone().or(file_search.endpoint),
            api_key: cli.api_key.clone().or(file_search.api_key),
            api_version: cli
                .api_version
                .clone()
                .or(file_search.api_version)
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            timeout_secs: cli
                .timeout
                .or(file_search.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        // --lenient only relaxes; it never re-enables strict mode from a file
        let strict = !cli.lenient && file_filters.strict.unwrap_or(true);
        let compiler = CompilerOptions {
            max_depth: cli
                .max_depth
                .or(file_filters.max_depth)
                .unwrap_or(DEFAULT_MAX_DEPTH),
            strict,
        };

        let soft_delete = SoftDeleteConfig {
            enabled: file_soft_delete.enabled.unwrap_or(false),
            column: file_soft_delete
                .column
                .unwrap_or_else(|| DEFAULT_SOFT_DELETE_COLUMN.to_string()),
            marker: file_soft_delete
                .marker
                .unwrap_or_else(|| DEFAULT_SOFT_DELETE_MARKER.to_string()),
        };

        Self {
            search,
            engine: EngineConfig {
                compiler,
                soft_delete,
                index_settings: file_config.index_settings.unwrap_or_default(),
            },
        }
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.search.timeout_secs == 0 {
            anyhow::bail!("Configuration error: search.timeout_secs must be greater than 0");
        }
        if self.engine.compiler.max_depth == 0 {
            anyhow::bail!("Configuration error: filters.max_depth must be greater than 0");
        }
        if self.search.api_version.trim().is_empty() {
            anyhow::bail!("Configuration error: search.api_version must not be empty");
        }
        if self.engine.soft_delete.column.trim().is_empty() {
            anyhow::bail!("Configuration error: soft_delete.column must not be empty");
        }
        Ok(())
    }

    /// Gateway settings for commands that talk to the search service
    pub fn gateway(&self) -> Result<GatewayConfig> {
        let endpoint = self
            .search
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .context("Configuration error: search.endpoint is required (--endpoint or AZSCOUT_ENDPOINT)")?;
        let api_key = self
            .search
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .context("Configuration error: search.api_key is required (--api-key or AZSCOUT_API_KEY)")?;

        let mut gateway = GatewayConfig::new(endpoint, api_key);
        gateway.api_version = self.search.api_version.clone();
        gateway.timeout_secs = self.search.timeout_secs;
        Ok(gateway)
    }
}

/// Get the profile config path (~/.azscout/azscout.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
