//! Contract file discovery inside a workspace.
//!
//! This module resolves which directory of a cloned repository holds the
//! contract sources and enumerates the matching files, respecting
//! configuration for extensions and excluded directories.

use crate::error::{AuditError, Result};
use crate::models::SourceFile;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directories probed, in order, when the requested contracts path does
/// not exist in the repository. `.` is the repository root itself.
pub const FALLBACK_DIRS: &[&str] = &["contracts", "src", "solidity", "."];

/// Configuration for contract scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// File extensions treated as contract sources (e.g. ["sol"])
    pub extensions: Vec<String>,
    /// Directory names to exclude (e.g. ["node_modules", ".git"])
    pub excludes: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["sol".to_string()],
            excludes: vec![
                ".git",
                "node_modules",
                "artifacts",
                "cache",
                "out",
                "lib",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl From<&crate::config::ScannerConfig> for ScanConfig {
    fn from(config: &crate::config::ScannerConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            excludes: config.excludes.clone(),
        }
    }
}

/// Scanner for locating contract sources under a repository root.
pub struct ContractScanner {
    config: ScanConfig,
    repo_root: PathBuf,
}

impl ContractScanner {
    /// Create a new scanner rooted at a workspace directory.
    pub fn new(repo_root: PathBuf, config: ScanConfig) -> Self {
        Self { config, repo_root }
    }

    /// Resolve the directory holding contract sources.
    ///
    /// The requested path is tried first. If it does not exist, the
    /// fallback list is probed in order and the first directory that
    /// exists *and* contains at least one matching file (recursively)
    /// wins. Fails with `SourcesNotFound` when nothing qualifies.
    pub fn resolve_contracts_dir(&self, requested: &str) -> Result<PathBuf> {
        let trimmed = requested.trim_matches('/');
        let candidate = self.repo_root.join(trimmed);

        if candidate.is_dir() {
            return Ok(candidate);
        }

        for fallback in FALLBACK_DIRS {
            let dir = if *fallback == "." {
                self.repo_root.clone()
            } else {
                self.repo_root.join(fallback)
            };

            if dir.is_dir() && self.has_matching_file(&dir) {
                debug!("Found contracts in: {}", fallback);
                return Ok(dir);
            }
        }

        Err(AuditError::SourcesNotFound(format!(
            "no contract sources found in '{}' or common directories",
            requested
        )))
    }

    /// Recursively collect all matching source files under a directory.
    ///
    /// A file that cannot be read as text is skipped with a warning;
    /// the call only fails when nothing readable remains.
    pub fn collect_sources(&self, dir: &Path) -> Result<Vec<SourceFile>> {
        let mut sources = Vec::new();

        for path in self.matching_files(dir) {
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    let relative = path
                        .strip_prefix(&self.repo_root)
                        .unwrap_or(&path)
                        .to_string_lossy()
                        .to_string();

                    sources.push(SourceFile {
                        name,
                        path: relative,
                        content,
                    });
                }
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                }
            }
        }

        if sources.is_empty() {
            return Err(AuditError::SourcesNotFound(format!(
                "no readable contract files found in {}",
                dir.display()
            )));
        }

        debug!("Collected {} contract files", sources.len());
        Ok(sources)
    }

    /// Whether a directory contains at least one matching file,
    /// searched recursively.
    pub fn has_matching_file(&self, dir: &Path) -> bool {
        self.walk(dir).any(|_| true)
    }

    /// All matching file paths under a directory, in a stable order.
    fn matching_files(&self, dir: &Path) -> Vec<PathBuf> {
        self.walk(dir).collect()
    }

    fn walk(&self, dir: &Path) -> impl Iterator<Item = PathBuf> + '_ {
        let extensions = self.config.extensions.clone();

        WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !self.is_excluded(&entry.file_name().to_string_lossy())
            })
            .filter_map(|entry| entry.ok())
            .filter(move |entry| {
                entry.file_type().is_file()
                    && entry
                        .path()
                        .extension()
                        .and_then(|e| e.to_str())
                        .map(|e| extensions.iter().any(|x| x == e))
                        .unwrap_or(false)
            })
            .map(|entry| entry.into_path())
    }

    /// Check if a name matches exclusion patterns.
    fn is_excluded(&self, name: &str) -> bool {
        // Hidden files
        if name.starts_with('.') {
            return true;
        }

        // Explicit excludes
        self.config.excludes.iter().any(|pattern| name == pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn scanner_for(root: &TempDir) -> ContractScanner {
        ContractScanner::new(root.path().to_path_buf(), ScanConfig::default())
    }

    fn write_file(root: &TempDir, rel: &str, content: &str) {
        let path = root.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_resolve_requested_dir() {
        let root = TempDir::new().unwrap();
        write_file(&root, "contracts/Token.sol", "contract Token {}");

        let scanner = scanner_for(&root);
        let dir = scanner.resolve_contracts_dir("contracts/").unwrap();
        assert_eq!(dir, root.path().join("contracts"));
    }

    #[test]
    fn test_resolve_falls_back_to_src() {
        let root = TempDir::new().unwrap();
        write_file(&root, "src/Vault.sol", "contract Vault {}");

        let scanner = scanner_for(&root);
        let dir = scanner.resolve_contracts_dir("contracts/").unwrap();
        assert_eq!(dir, root.path().join("src"));
    }

    #[test]
    fn test_resolve_falls_back_to_root() {
        let root = TempDir::new().unwrap();
        write_file(&root, "Flat.sol", "contract Flat {}");

        let scanner = scanner_for(&root);
        let dir = scanner.resolve_contracts_dir("contracts/").unwrap();
        assert_eq!(dir, root.path().to_path_buf());
    }

    #[test]
    fn test_resolve_skips_fallback_without_sources() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("src")).unwrap();
        write_file(&root, "src/main.rs", "fn main() {}");
        write_file(&root, "solidity/Escrow.sol", "contract Escrow {}");

        let scanner = scanner_for(&root);
        let dir = scanner.resolve_contracts_dir("contracts/").unwrap();
        assert_eq!(dir, root.path().join("solidity"));
    }

    #[test]
    fn test_resolve_nothing_found() {
        let root = TempDir::new().unwrap();
        write_file(&root, "README.md", "# empty");

        let scanner = scanner_for(&root);
        let result = scanner.resolve_contracts_dir("contracts/");
        assert!(matches!(result, Err(AuditError::SourcesNotFound(_))));
    }

    #[test]
    fn test_collect_sources_recursive() {
        let root = TempDir::new().unwrap();
        write_file(&root, "contracts/Token.sol", "contract Token {}");
        write_file(&root, "contracts/interfaces/IToken.sol", "interface IToken {}");
        write_file(&root, "contracts/README.md", "docs");

        let scanner = scanner_for(&root);
        let dir = scanner.resolve_contracts_dir("contracts").unwrap();
        let sources = scanner.collect_sources(&dir).unwrap();

        assert_eq!(sources.len(), 2);
        let paths: Vec<&str> = sources.iter().map(|s| s.path.as_str()).collect();
        assert!(paths.contains(&"contracts/Token.sol"));
        assert!(paths.contains(&"contracts/interfaces/IToken.sol"));
    }

    #[test]
    fn test_collect_sources_skips_excluded_dirs() {
        let root = TempDir::new().unwrap();
        write_file(&root, "contracts/Token.sol", "contract Token {}");
        write_file(&root, "contracts/node_modules/dep/Dep.sol", "contract Dep {}");

        let scanner = scanner_for(&root);
        let sources = scanner
            .collect_sources(&root.path().join("contracts"))
            .unwrap();

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "Token.sol");
    }

    #[test]
    fn test_collect_sources_empty_is_error() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("contracts")).unwrap();

        let scanner = scanner_for(&root);
        let result = scanner.collect_sources(&root.path().join("contracts"));
        assert!(matches!(result, Err(AuditError::SourcesNotFound(_))));
    }

    #[test]
    fn test_has_matching_file() {
        let root = TempDir::new().unwrap();
        write_file(&root, "a/b/c/Deep.sol", "contract Deep {}");

        let scanner = scanner_for(&root);
        assert!(scanner.has_matching_file(root.path()));
        assert!(!scanner.has_matching_file(&root.path().join("missing")));
    }
}
