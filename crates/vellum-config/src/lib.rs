//! Configuration management for Vellum.
//!
//! Parses `vellum.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `remote.endpoint`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "vellum.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote endpoint configuration.
    pub remote: RemoteConfig,
    /// Blob cache configuration.
    pub cache: CacheConfig,
    /// Renderer defaults.
    pub render: RenderConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Remote endpoint configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// URL of the "get database image" endpoint.
    pub endpoint: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
        }
    }
}

/// Blob cache configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory. Relative paths are resolved against the config file
    /// location during load.
    pub dir: PathBuf,
    /// Whether the persistent cache is enabled.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".vellum/cache"),
            enabled: true,
        }
    }
}

/// Renderer defaults.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// CSS class injected into every structural tag of rendered HTML.
    pub class_name: Option<String>,
    /// Whether GitHub Flavored Markdown extensions are enabled.
    pub gfm: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            class_name: None,
            gfm: true,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`remote.endpoint`").
        field: String,
        /// Error message (e.g., "${`VELLUM_ENDPOINT`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `vellum.toml` in the current directory and parents, falling back
    /// to defaults when no file is found.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit `config_path` doesn't exist or parsing
    /// fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }
        let start = std::env::current_dir()?;
        match Self::discover(&start) {
            Some(discovered) => Self::load_from_file(&discovered),
            None => Ok(Self::default()),
        }
    }

    /// Search for `vellum.toml` in `start` and its parents.
    #[must_use]
    pub fn discover(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.remote.endpoint = expand::expand_env(&config.remote.endpoint, "remote.endpoint")?;

        // Resolve the cache directory against the config file location so a
        // load from a parent directory keeps pointing at the same cache.
        let config_dir = path.parent().unwrap_or(Path::new("."));
        if config.cache.dir.is_relative() {
            config.cache.dir = config_dir.join(&config.cache.dir);
        }
        config.config_path = Some(path.to_path_buf());

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the endpoint is set but not an
    /// http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = &self.remote.endpoint;
        if !endpoint.is_empty()
            && !endpoint.starts_with("http://")
            && !endpoint.starts_with("https://")
        {
            return Err(ConfigError::Validation(
                "remote.endpoint must start with http:// or https://".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILENAME);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.remote.endpoint, "");
        assert_eq!(config.cache.dir, PathBuf::from(".vellum/cache"));
        assert!(config.cache.enabled);
        assert_eq!(config.render.class_name, None);
        assert!(config.render.gfm);
    }

    #[test]
    fn test_load_full_config() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
[remote]
endpoint = "https://example.org/api/db"

[cache]
dir = "blobs"
enabled = false

[render]
class_name = "markdown"
gfm = false
"#,
        );

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.remote.endpoint, "https://example.org/api/db");
        assert_eq!(config.cache.dir, tmp.path().join("blobs"));
        assert!(!config.cache.enabled);
        assert_eq!(config.render.class_name.as_deref(), Some("markdown"));
        assert!(!config.render.gfm);
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "[remote]\nendpoint = \"http://localhost:9000/db\"\n");

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.remote.endpoint, "http://localhost:9000/db");
        assert!(config.cache.enabled);
        assert!(config.render.gfm);
    }

    #[test]
    fn test_absolute_cache_dir_not_resolved() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "[cache]\ndir = \"/var/cache/vellum\"\n");

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.cache.dir, PathBuf::from("/var/cache/vellum"));
    }

    #[test]
    fn test_discover_walks_parents() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "");
        let nested = tmp.path().join("posts/drafts");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(Config::discover(&nested), Some(path));
    }

    #[test]
    fn test_discover_none_without_config() {
        let tmp = TempDir::new().unwrap();
        // No vellum.toml anywhere under the temp root; discovery may only
        // terminate at the filesystem root, so scope the search to a path
        // that cannot contain one.
        let nested = tmp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        let found = Config::discover(&nested);
        if let Some(found) = found {
            // A vellum.toml above the temp dir (e.g. in $HOME) is acceptable;
            // it just must not be inside the temp dir.
            assert!(!found.starts_with(tmp.path()));
        }
    }

    #[test]
    fn test_load_missing_explicit_path_errors() {
        let err = Config::load(Some(Path::new("/nonexistent/vellum.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_endpoint_env_expansion() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            "[remote]\nendpoint = \"${VELLUM_CFG_TEST_EP:-https://fallback.example.org/db}\"\n",
        );

        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("VELLUM_CFG_TEST_EP");
        }
        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.remote.endpoint, "https://fallback.example.org/db");

        unsafe {
            std::env::set_var("VELLUM_CFG_TEST_EP", "https://set.example.org/db");
        }
        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.remote.endpoint, "https://set.example.org/db");
        unsafe {
            std::env::remove_var("VELLUM_CFG_TEST_EP");
        }
    }

    #[test]
    fn test_invalid_endpoint_scheme_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "[remote]\nendpoint = \"ftp://example.org/db\"\n");

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "[remote\nendpoint = 3\n");

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
