//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Slitherd - Slither analysis as an HTTP service
///
/// Serves Solidity static analysis over HTTP: POST contract source (or a
/// GitHub repository reference) and get back normalized Slither findings.
///
/// Examples:
///   slitherd
///   slitherd --port 9000 --slither-bin /opt/slither/bin/slither
///   slitherd --config ./slitherd.toml --verbose
///   slitherd --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Address to bind the HTTP server to
    #[arg(long, value_name = "HOST", env = "SLITHERD_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, value_name = "PORT", env = "SLITHERD_PORT")]
    pub port: Option<u16>,

    /// Path to the slither binary
    ///
    /// Defaults to `slither` resolved through PATH.
    #[arg(long, value_name = "BIN", env = "SLITHERD_SLITHER_BIN")]
    pub slither_bin: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .slitherd.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Deadline for direct-text analysis, in seconds
    #[arg(long, value_name = "SECS")]
    pub contract_timeout: Option<u64>,

    /// Deadline for whole-repository analysis, in seconds
    #[arg(long, value_name = "SECS")]
    pub repository_timeout: Option<u64>,

    /// Maximum number of analyzer subprocesses running at once
    #[arg(long, value_name = "NUM")]
    pub max_concurrent: Option<usize>,

    /// Allowed CORS origin (unset allows any origin - dev mode)
    #[arg(long, value_name = "ORIGIN", env = "SLITHERD_CORS_ORIGIN")]
    pub cors_origin: Option<String>,

    /// Generate a default .slitherd.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(port) = self.port {
            if port == 0 {
                return Err("Port must be between 1 and 65535".to_string());
            }
        }

        if let Some(timeout) = self.contract_timeout {
            if timeout == 0 {
                return Err("Contract timeout must be at least 1 second".to_string());
            }
        }

        if let Some(timeout) = self.repository_timeout {
            if timeout == 0 {
                return Err("Repository timeout must be at least 1 second".to_string());
            }
        }

        if let Some(max) = self.max_concurrent {
            if max == 0 {
                return Err("Max concurrent scans must be at least 1".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            host: None,
            port: None,
            slither_bin: None,
            config: None,
            verbose: false,
            quiet: false,
            contract_timeout: None,
            repository_timeout: None,
            max_concurrent: None,
            cors_origin: None,
            init_config: false,
        }
    }

    #[test]
    fn test_defaults_validate() {
        let args = make_args();
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_port() {
        let mut args = make_args();
        args.port = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut args = make_args();
        args.contract_timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
