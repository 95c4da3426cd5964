//! Configuration module for the snippet search system.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `SS_` and use double underscores
//! to separate nested levels:
//! - `SS_CACHE__CAPACITY=5000` sets `cache.capacity`
//! - `SS_SERVER__BIND=0.0.0.0:5000` sets `server.bind`
//! - `SS_INDEXING__CHUNK_LINES=80` sets `indexing.chunk_lines`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-workspace configuration directory.
pub const CONFIG_DIR: &str = ".snipsearch";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory holding the persisted index artifacts
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub semantic: SemanticConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    /// Maximum number of lines per snippet
    #[serde(default = "default_chunk_lines")]
    pub chunk_lines: usize,

    /// File extensions (without the dot) that are indexed
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory names skipped anywhere in the tree
    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: Vec<String>,

    /// Also honour .gitignore files while walking
    #[serde(default = "default_false")]
    pub respect_gitignore: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached result sets
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MetricsConfig {
    /// Length of the sliding query history window
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// How many of the newest history entries a snapshot exposes
    #[serde(default = "default_recent_queries")]
    pub recent_queries: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    /// Result count used when a caller does not pass one
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Drop every cached result set when a new index is installed
    #[serde(default = "default_true")]
    pub clear_cache_on_rebuild: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SemanticConfig {
    /// Model to use for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Show a progress bar while the model downloads
    #[serde(default = "default_true")]
    pub show_download_progress: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// HTTP server bind address
    #[serde(default = "default_bind_address")]
    pub bind: String,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_index_path() -> PathBuf {
    PathBuf::from(".snipsearch/index")
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_chunk_lines() -> usize {
    50
}
fn default_extensions() -> Vec<String> {
    [
        "py", "java", "cpp", "c", "js", "jsx", "ts", "tsx", "go", "rs", "rb", "php", "cs", "swift",
        "kt", "scala", "html", "css", "sql", "sh", "yaml", "json", "h", "hpp",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_ignore_dirs() -> Vec<String> {
    [
        "node_modules",
        ".git",
        "__pycache__",
        "venv",
        "dist",
        "build",
        ".venv",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_cache_capacity() -> usize {
    1000
}
fn default_history_limit() -> usize {
    1000
}
fn default_recent_queries() -> usize {
    10
}
fn default_limit() -> usize {
    10
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_bind_address() -> String {
    "127.0.0.1:5000".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            index_path: default_index_path(),
            debug: false,
            indexing: IndexingConfig::default(),
            cache: CacheConfig::default(),
            metrics: MetricsConfig::default(),
            search: SearchConfig::default(),
            semantic: SemanticConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            chunk_lines: default_chunk_lines(),
            extensions: default_extensions(),
            ignore_dirs: default_ignore_dirs(),
            respect_gitignore: false,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            recent_queries: default_recent_queries(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            clear_cache_on_rebuild: true,
        }
    }
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            show_download_progress: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::figment(config_path).extract().map_err(Box::new)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref().to_path_buf())
            .extract()
            .map_err(Box::new)
    }

    fn figment(config_path: PathBuf) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels, single underscore stays
            .merge(Env::prefixed("SS_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the workspace config by looking for the .snipsearch directory
    /// Searches from current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .map(|ancestor| ancestor.join(CONFIG_DIR))
            .find(|dir| dir.is_dir())
            .map(|dir| dir.join("settings.toml"))
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = r#"# snipsearch configuration file

# Version of the configuration schema
version = 1

# Directory holding code.index and metadata.json
index_path = ".snipsearch/index"

# Global debug mode (raises log level to DEBUG)
debug = false

[indexing]
# Maximum number of lines per snippet
chunk_lines = 50

# File extensions that are indexed
extensions = ["py", "java", "cpp", "c", "js", "jsx", "ts", "tsx", "go", "rs", "rb", "php",
              "cs", "swift", "kt", "scala", "html", "css", "sql", "sh", "yaml", "json", "h", "hpp"]

# Directory names skipped anywhere in the tree
ignore_dirs = ["node_modules", ".git", "__pycache__", "venv", "dist", "build", ".venv"]

# Also honour .gitignore files
respect_gitignore = false

[cache]
# Maximum number of cached result sets (least recently used are evicted)
capacity = 1000

[metrics]
# Length of the recent query history
history_limit = 1000

# Number of recent queries shown in stats
recent_queries = 10

[search]
# Result count when none is given
default_limit = 10

# Drop cached results when a new index is installed
clear_cache_on_rebuild = true

[semantic]
# Model to use for embeddings
model = "AllMiniLML6V2"
show_download_progress = true

[server]
# HTTP server bind address
bind = "127.0.0.1:5000"
"#;

        std::fs::write(&config_path, template)?;
        Ok(config_path)
    }
}

/// Directory where embedding models are cached between runs.
pub fn models_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(CONFIG_DIR))
        .join("snipsearch")
        .join("models")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.index_path, PathBuf::from(".snipsearch/index"));
        assert_eq!(settings.indexing.chunk_lines, 50);
        assert_eq!(settings.cache.capacity, 1000);
        assert_eq!(settings.metrics.history_limit, 1000);
        assert!(settings.indexing.extensions.iter().any(|e| e == "rs"));
        assert!(settings.indexing.ignore_dirs.iter().any(|d| d == "node_modules"));
        assert!(settings.search.clear_cache_on_rebuild);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2

[indexing]
chunk_lines = 20
extensions = ["rs"]

[cache]
capacity = 64
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.indexing.chunk_lines, 20);
        assert_eq!(settings.indexing.extensions, vec!["rs"]);
        assert_eq!(settings.cache.capacity, 64);
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        fs::write(&config_path, "[server]\nbind = \"0.0.0.0:9000\"\n").unwrap();

        let settings = Settings::load_from(&config_path).unwrap();

        // Modified values
        assert_eq!(settings.server.bind, "0.0.0.0:9000");

        // Default values should still be present
        assert_eq!(settings.metrics.recent_queries, 10);
        assert!(!settings.indexing.ignore_dirs.is_empty());
    }

    #[test]
    fn test_printed_settings_load_back() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let mut settings = Settings::default();
        settings.cache.capacity = 7;
        settings.debug = true;

        // `snipsearch config` output is valid settings input
        fs::write(&config_path, toml::to_string_pretty(&settings).unwrap()).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.cache.capacity, 7);
        assert!(loaded.debug);
    }

    #[test]
    fn test_env_override() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "[metrics]\nhistory_limit = 50\n").unwrap();

        // Set environment variables that should override config file
        unsafe {
            std::env::set_var("SS_METRICS__HISTORY_LIMIT", "25");
            std::env::set_var("SS_SEARCH__DEFAULT_LIMIT", "3");
        }

        let settings = Settings::load_from(&config_path).unwrap();

        // Environment variable should override config file
        assert_eq!(settings.metrics.history_limit, 25);
        assert_eq!(settings.search.default_limit, 3);

        // Clean up
        unsafe {
            std::env::remove_var("SS_METRICS__HISTORY_LIMIT");
            std::env::remove_var("SS_SEARCH__DEFAULT_LIMIT");
        }
    }

    #[test]
    fn test_template_parses() {
        let temp_dir = TempDir::new().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let path = Settings::init_config_file(false).unwrap();
        let parsed: Settings = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.indexing.extensions, default_extensions());
        assert!(Settings::init_config_file(false).is_err());

        std::env::set_current_dir(original_dir).unwrap();
    }
}
