//! Git repository cloning into request-scoped workspaces.
//!
//! This module clones GitHub repositories into uniquely-named temporary
//! directories using the git2 library. The workspace is returned as a
//! value and removed when it is dropped, so every exit path (success,
//! clone failure, analyzer failure) cleans up after itself.

use crate::error::{AuditError, Result};
use git2::FetchOptions;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Prefix for workspace directory names, so stray directories are
/// attributable if cleanup is ever interrupted by a hard kill.
const WORKSPACE_PREFIX: &str = "slitherd-";

/// An exclusively-owned, request-scoped temporary directory.
///
/// Holds cloned or staged source files for the duration of one request.
/// Dropping the workspace removes the directory and everything in it;
/// no two requests ever share one.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Allocate a fresh, uniquely-named workspace directory.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()
            .map_err(|e| {
                AuditError::Internal(anyhow::anyhow!("failed to create workspace: {}", e))
            })?;

        debug!("Created workspace: {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Path to the workspace root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a single staged file into the workspace root and return its
    /// absolute path. Used for direct-text analysis.
    pub fn stage_file(&self, file_name: &str, content: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(file_name);
        std::fs::write(&path, content).map_err(|e| {
            AuditError::Internal(anyhow::anyhow!(
                "failed to stage {} in workspace: {}",
                file_name,
                e
            ))
        })?;
        Ok(path)
    }
}

/// Options for cloning a repository.
#[derive(Debug, Clone)]
pub struct CloneOptions {
    /// Branch to checkout.
    pub branch: String,
    /// Depth for shallow clone (None for full clone).
    pub depth: Option<i32>,
    /// Access token for private repositories, embedded into the clone URL.
    pub access_token: Option<String>,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self {
            branch: "main".to_string(),
            depth: Some(1), // Shallow clone by default for speed
            access_token: None,
        }
    }
}

/// Build the URL actually passed to git.
///
/// A supplied token is embedded as credentials only when the URL is in the
/// recognized public-host form (`https://github.com/...`); any other URL is
/// used as-is, on the assumption it already carries credentials.
pub fn build_clone_url(repo_url: &str, access_token: Option<&str>) -> String {
    let token = match access_token.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return repo_url.to_string(),
    };

    match repo_url.strip_prefix("https://github.com/") {
        Some(repo_path) => format!("https://{}@github.com/{}", token, repo_path),
        None => repo_url.to_string(),
    }
}

/// Clone the requested branch of a repository into a fresh workspace.
///
/// Any failure (auth, network, branch-not-found) surfaces as
/// `AuditError::Clone` with the token scrubbed from the message; the
/// partially-written workspace is removed before the error propagates.
/// Transient failures are not retried.
pub fn clone_repository(repo_url: &str, options: &CloneOptions) -> Result<Workspace> {
    let workspace = Workspace::new()?;
    let clone_url = build_clone_url(repo_url, options.access_token.as_deref());

    info!("Cloning repository: {} (branch {})", repo_url, options.branch);
    debug!("Clone target: {}", workspace.path().display());

    let mut fetch_opts = FetchOptions::new();
    if let Some(depth) = options.depth {
        fetch_opts.depth(depth);
    }

    let mut builder = git2::build::RepoBuilder::new();
    builder.fetch_options(fetch_opts);
    builder.branch(&options.branch);

    // Workspace drop removes the partial clone on the error path.
    builder
        .clone(&clone_url, workspace.path())
        .map_err(|e| AuditError::Clone(scrub_token(e.message(), options.access_token.as_deref())))?;

    info!(
        "Successfully cloned repository to: {}",
        workspace.path().display()
    );

    Ok(workspace)
}

/// Replace any occurrence of the access token in a message. Clone errors
/// are returned to the caller, so credentials must never appear in them.
fn scrub_token(message: &str, access_token: Option<&str>) -> String {
    match access_token.map(str::trim) {
        Some(token) if !token.is_empty() => message.replace(token, "***"),
        _ => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_clone_url_with_token() {
        let url = build_clone_url("https://github.com/owner/repo.git", Some("ghp_secret"));
        assert_eq!(url, "https://ghp_secret@github.com/owner/repo.git");
    }

    #[test]
    fn test_build_clone_url_without_token() {
        let url = build_clone_url("https://github.com/owner/repo.git", None);
        assert_eq!(url, "https://github.com/owner/repo.git");
    }

    #[test]
    fn test_build_clone_url_blank_token() {
        let url = build_clone_url("https://github.com/owner/repo.git", Some("   "));
        assert_eq!(url, "https://github.com/owner/repo.git");
    }

    #[test]
    fn test_build_clone_url_non_github_host_passthrough() {
        // Already-credentialed or self-hosted URLs are used verbatim.
        let url = build_clone_url("https://token@gitlab.example.com/owner/repo", Some("other"));
        assert_eq!(url, "https://token@gitlab.example.com/owner/repo");
    }

    #[test]
    fn test_workspace_removed_on_drop() {
        let workspace = Workspace::new().unwrap();
        let path = workspace.path().to_path_buf();
        assert!(path.exists());

        drop(workspace);
        assert!(!path.exists());
    }

    #[test]
    fn test_workspace_names_are_unique() {
        let a = Workspace::new().unwrap();
        let b = Workspace::new().unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_stage_file() {
        let workspace = Workspace::new().unwrap();
        let path = workspace
            .stage_file("Token.sol", "pragma solidity ^0.8.0;\n")
            .unwrap();

        assert!(path.exists());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "pragma solidity ^0.8.0;\n"
        );
    }

    #[test]
    fn test_clone_nonexistent_local_repo_fails() {
        let result = clone_repository("file:///definitely/not/a/repo", &CloneOptions::default());
        match result {
            Err(AuditError::Clone(_)) => {}
            other => panic!("Expected Clone error, got: {:?}", other.map(|w| w.path().to_path_buf())),
        }
    }

    #[test]
    fn test_scrub_token() {
        let scrubbed = scrub_token(
            "failed to authenticate with https://ghp_secret@github.com/o/r",
            Some("ghp_secret"),
        );
        assert!(!scrubbed.contains("ghp_secret"));
        assert!(scrubbed.contains("***"));
    }

    #[test]
    fn test_default_clone_options() {
        let opts = CloneOptions::default();
        assert_eq!(opts.branch, "main");
        assert_eq!(opts.depth, Some(1));
        assert!(opts.access_token.is_none());
    }
}
