//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.slitherd.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Analyzer invocation settings.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Contract scanner settings.
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Repository acquisition settings.
    #[serde(default)]
    pub repository: RepositoryConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origin. Unset or "*" allows any origin (dev mode).
    #[serde(default)]
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Analyzer invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Analyzer binary name or path.
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Deadline for direct-text analysis, in seconds.
    #[serde(default = "default_contract_timeout")]
    pub contract_timeout_secs: u64,

    /// Deadline for whole-repository analysis, in seconds.
    #[serde(default = "default_repository_timeout")]
    pub repository_timeout_secs: u64,

    /// Pass `--disable-color` to the analyzer.
    #[serde(default = "default_true")]
    pub disable_color: bool,

    /// Path patterns excluded from analysis (`--filter-paths`).
    #[serde(default)]
    pub filter_paths: Vec<String>,

    /// Maximum number of analyzer subprocesses running at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_scans: usize,

    /// Line-count ceiling for directly submitted contract text.
    #[serde(default = "default_max_contract_lines")]
    pub max_contract_lines: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            contract_timeout_secs: default_contract_timeout(),
            repository_timeout_secs: default_repository_timeout(),
            disable_color: true,
            filter_paths: Vec::new(),
            max_concurrent_scans: default_max_concurrent(),
            max_contract_lines: default_max_contract_lines(),
        }
    }
}

fn default_binary() -> String {
    "slither".to_string()
}

fn default_contract_timeout() -> u64 {
    60
}

fn default_repository_timeout() -> u64 {
    300 // whole-repo runs compile every contract first
}

fn default_max_concurrent() -> usize {
    4
}

fn default_max_contract_lines() -> usize {
    500
}

fn default_true() -> bool {
    true
}

/// Contract scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// File extensions treated as contract sources.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory names to exclude.
    #[serde(default = "default_excludes")]
    pub excludes: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            excludes: default_excludes(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["sol".to_string()]
}

fn default_excludes() -> Vec<String> {
    vec![".git", "node_modules", "artifacts", "cache", "out", "lib"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Repository acquisition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Branch cloned when the request does not name one.
    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Contracts directory tried first when the request does not name one.
    #[serde(default = "default_contracts_path")]
    pub default_contracts_path: String,

    /// Shallow-clone depth. Zero or negative clones full history.
    #[serde(default = "default_clone_depth")]
    pub clone_depth: i32,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_branch: default_branch(),
            default_contracts_path: default_contracts_path(),
            clone_depth: default_clone_depth(),
        }
    }
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_contracts_path() -> String {
    "contracts/".to_string()
}

fn default_clone_depth() -> i32 {
    1
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".slitherd.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings; only
    /// explicitly provided values override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref host) = args.host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(ref origin) = args.cors_origin {
            self.server.cors_origin = Some(origin.clone());
        }

        if let Some(ref binary) = args.slither_bin {
            self.analyzer.binary = binary.clone();
        }
        if let Some(timeout) = args.contract_timeout {
            self.analyzer.contract_timeout_secs = timeout;
        }
        if let Some(timeout) = args.repository_timeout {
            self.analyzer.repository_timeout_secs = timeout;
        }
        if let Some(max) = args.max_concurrent {
            self.analyzer.max_concurrent_scans = max;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.analyzer.binary, "slither");
        assert_eq!(config.analyzer.contract_timeout_secs, 60);
        assert_eq!(config.analyzer.repository_timeout_secs, 300);
        assert_eq!(config.analyzer.max_contract_lines, 500);
        assert_eq!(config.repository.default_branch, "main");
        assert!(config.scanner.extensions.contains(&"sol".to_string()));
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[server]
host = "127.0.0.1"
port = 9000

[analyzer]
binary = "/opt/slither/bin/slither"
contract_timeout_secs = 30
filter_paths = ["node_modules", "mocks"]

[repository]
default_branch = "master"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.analyzer.binary, "/opt/slither/bin/slither");
        assert_eq!(config.analyzer.contract_timeout_secs, 30);
        assert_eq!(config.analyzer.filter_paths, vec!["node_modules", "mocks"]);
        assert_eq!(config.repository.default_branch, "master");
        // Untouched sections keep their defaults
        assert_eq!(config.analyzer.repository_timeout_secs, 300);
        assert_eq!(config.repository.default_contracts_path, "contracts/");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[analyzer]"));
        assert!(toml_str.contains("[scanner]"));
        assert!(toml_str.contains("[repository]"));
    }
}
