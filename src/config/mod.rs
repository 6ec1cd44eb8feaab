//! Configuration management.
//!
//! Settings come from a TOML file (explicit path, `SANTRA_CONFIG_PATH`, or
//! the platform config directory) with environment variables layered on top.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Main configuration for santra.
#[derive(Debug, Clone, PartialEq)]
pub struct SantraConfig {
    /// Directory holding one markdown file per idea.
    pub data_dir: PathBuf,
    /// HTTP listen port.
    pub port: u16,
    /// Base URL of a running server, used by `submit`.
    pub server_url: String,
    /// Refinement service settings.
    pub llm: LlmConfig,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Graph canvas settings.
    pub graph: GraphSettings,
}

/// Refinement service settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LlmConfig {
    /// API key. Falls back to `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    /// Model name.
    pub model: Option<String>,
    /// Base URL of an OpenAI-compatible API.
    pub base_url: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
}

/// Logging section in config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    /// Output format: "compact", "pretty" or "json".
    pub format: Option<String>,
    /// Filter directive, e.g. "info" or "santra=debug".
    pub level: Option<String>,
    /// Optional log file; logs go to stderr when unset.
    pub file: Option<PathBuf>,
}

/// Graph canvas size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphSettings {
    /// Canvas width.
    pub width: f64,
    /// Canvas height.
    pub height: f64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Listen port.
    pub port: Option<u16>,
    /// Server URL.
    pub server_url: Option<String>,
    /// LLM configuration.
    pub llm: Option<ConfigFileLlm>,
    /// Logging configuration.
    pub logging: Option<LoggingSettings>,
    /// Graph configuration.
    pub graph: Option<ConfigFileGraph>,
}

/// LLM section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLlm {
    /// Model name.
    pub model: Option<String>,
    /// API key.
    pub api_key: Option<String>,
    /// Base URL.
    pub base_url: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
}

/// Graph section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileGraph {
    /// Canvas width.
    pub width: Option<f64>,
    /// Canvas height.
    pub height: Option<f64>,
}

impl Default for SantraConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("ideas"),
            port: DEFAULT_PORT,
            server_url: format!("http://localhost:{DEFAULT_PORT}"),
            llm: LlmConfig::default(),
            logging: LoggingSettings::default(),
            graph: GraphSettings::default(),
        }
    }
}

impl SantraConfig {
    /// Environment variable naming an explicit config file.
    pub const CONFIG_PATH_ENV: &'static str = "SANTRA_CONFIG_PATH";

    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        Self::parse(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config file.
    pub fn parse(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks `SANTRA_CONFIG_PATH`, then the platform config dir
    /// (`~/.config/santra/config.toml` on Linux). Returns the defaults if no
    /// readable config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        if let Some(path) = std::env::var_os(Self::CONFIG_PATH_ENV) {
            match Self::load_from_file(Path::new(&path)) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(error = %e, "Ignoring unreadable config file"),
            }
        }

        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("santra").join("config.toml");
        if platform_config.exists() {
            if let Ok(config) = Self::load_from_file(&platform_config) {
                return config;
            }
        }

        Self::default()
    }

    /// Loads configuration from `path` if given, else from the default location,
    /// then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit path cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default(),
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Applies environment overrides.
    ///
    /// `lookup` maps a variable name to its value; blank values are ignored.
    /// Recognised: `PORT`, `OPENAI_API_KEY`, and `SANTRA_DATA_DIR`,
    /// `SANTRA_PORT`, `SANTRA_SERVER_URL`, `SANTRA_LLM_MODEL`,
    /// `SANTRA_LLM_BASE_URL`, `SANTRA_LLM_TIMEOUT_MS`, `SANTRA_LOG_FORMAT`,
    /// `SANTRA_LOG_FILE`.
    #[must_use]
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get("SANTRA_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        // SANTRA_PORT wins over the generic PORT.
        for key in ["PORT", "SANTRA_PORT"] {
            if let Some(port) = get(key) {
                match port.trim().parse() {
                    Ok(port) => self.port = port,
                    Err(_) => tracing::warn!(key, value = %port, "Ignoring invalid port"),
                }
            }
        }
        if let Some(url) = get("SANTRA_SERVER_URL") {
            self.server_url = url;
        }
        if self.llm.api_key.is_none() {
            self.llm.api_key = get("OPENAI_API_KEY");
        }
        if let Some(model) = get("SANTRA_LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(url) = get("SANTRA_LLM_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(timeout) = get("SANTRA_LLM_TIMEOUT_MS").and_then(|t| t.trim().parse().ok()) {
            self.llm.timeout_ms = Some(timeout);
        }
        if let Some(format) = get("SANTRA_LOG_FORMAT") {
            self.logging.format = Some(format);
        }
        if let Some(file) = get("SANTRA_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }

        self
    }

    /// Converts a `ConfigFile` to `SantraConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(port) = file.port {
            config.port = port;
            config.server_url = format!("http://localhost:{port}");
        }
        if let Some(server_url) = file.server_url {
            config.server_url = server_url;
        }
        if let Some(llm) = file.llm {
            config.llm = LlmConfig {
                api_key: llm.api_key,
                model: llm.model,
                base_url: llm.base_url,
                timeout_ms: llm.timeout_ms,
                connect_timeout_ms: llm.connect_timeout_ms,
            };
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }
        if let Some(graph) = file.graph {
            if let Some(width) = graph.width.filter(|w| *w > 0.0) {
                config.graph.width = width;
            }
            if let Some(height) = graph.height.filter(|h| *h > 0.0) {
                config.graph.height = height;
            }
        }

        config
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Sets the listen port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SantraConfig::new();
        assert_eq!(config.data_dir, PathBuf::from("ideas"));
        assert_eq!(config.port, 3000);
        assert_eq!(config.server_url, "http://localhost:3000");
        assert_eq!(config.graph, GraphSettings::default());
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_parse_full_file() {
        let config = SantraConfig::parse(
            r#"
            data_dir = "/var/lib/santra"
            port = 8080

            [llm]
            model = "gpt-4o"
            base_url = "http://localhost:11434/v1"
            timeout_ms = 30000

            [logging]
            format = "json"
            level = "debug"

            [graph]
            width = 1024.0
            height = 768.0
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/santra"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.server_url, "http://localhost:8080");
        assert_eq!(config.llm.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.llm.timeout_ms, Some(30_000));
        assert_eq!(config.logging.format.as_deref(), Some("json"));
        assert!((config.graph.width - 1024.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        assert!(SantraConfig::parse("port = \"not a number\"").is_err());
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = SantraConfig::load_from_file(Path::new("/nonexistent/santra.toml"));
        assert!(matches!(result, Err(crate::Error::OperationFailed { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let config = SantraConfig::new().with_env_overrides(env(&[
            ("PORT", "4000"),
            ("OPENAI_API_KEY", "sk-test"),
            ("SANTRA_DATA_DIR", "/tmp/ideas"),
            ("SANTRA_LOG_FORMAT", "pretty"),
        ]));
        assert_eq!(config.port, 4000);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/ideas"));
        assert_eq!(config.logging.format.as_deref(), Some("pretty"));
    }

    #[test]
    fn test_santra_port_wins_and_bad_port_ignored() {
        let config =
            SantraConfig::new().with_env_overrides(env(&[("PORT", "4000"), ("SANTRA_PORT", "5000")]));
        assert_eq!(config.port, 5000);

        let config = SantraConfig::new().with_env_overrides(env(&[("PORT", "huge")]));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_file_key_beats_env_key() {
        let mut config = SantraConfig::new();
        config.llm.api_key = Some("from-file".to_string());
        let config = config.with_env_overrides(env(&[("OPENAI_API_KEY", "from-env")]));
        assert_eq!(config.llm.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let config = SantraConfig::new().with_env_overrides(env(&[("OPENAI_API_KEY", "  ")]));
        assert!(config.llm.api_key.is_none());
    }
}
