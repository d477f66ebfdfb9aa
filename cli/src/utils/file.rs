//! File utility functions

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

/// Expand `~`, `~/...` and relative paths to an absolute path
///
/// ```text
/// expand_path("~/.azscout")   // -> /home/user/.azscout
/// expand_path("./docs.json")  // -> /current/dir/docs.json
/// expand_path("/etc/azscout") // -> /etc/azscout
/// ```
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let expanded = if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(path))
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

/// Read a text file named on the command line
pub fn read_input(path: &Path) -> Result<String> {
    let path = expand_path(&path.to_string_lossy());
    tracing::debug!(path = %path.display(), "Reading input file");
    fs::read_to_string(&path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Read and parse a JSON file named on the command line
pub fn read_json(path: &Path) -> Result<Value> {
    let content = read_input(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON file: {}", path.display()))
}
