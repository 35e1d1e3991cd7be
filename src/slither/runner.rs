//! Subprocess driver for the external analyzer.
//!
//! The analyzer is treated as a black box: it is handed a file or a
//! directory, asked for JSON on stdout, and everything it prints is
//! captured. Deadline enforcement is real process termination: an
//! expired run is killed, so no analyzer processes outlive their
//! request.

use crate::analysis::aggregator;
use crate::error::{AuditError, Result};
use crate::models::AnalysisOutcome;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Configuration for analyzer invocation.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Analyzer binary name or path.
    pub binary: String,
    /// Pass `--disable-color` so stderr stays readable in diagnostics.
    pub disable_color: bool,
    /// Path patterns excluded from analysis, passed as `--filter-paths`.
    pub filter_paths: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            binary: "slither".to_string(),
            disable_color: true,
            filter_paths: Vec::new(),
        }
    }
}

impl From<&crate::config::AnalyzerConfig> for RunnerConfig {
    fn from(config: &crate::config::AnalyzerConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            disable_color: config.disable_color,
            filter_paths: config.filter_paths.clone(),
        }
    }
}

/// What the analyzer is pointed at.
#[derive(Debug, Clone)]
pub enum AnalysisTarget {
    /// A single staged contract file.
    File(PathBuf),
    /// A source directory within a cloned repository. The analyzer runs
    /// with the workspace root as its working directory so relative
    /// imports resolve the way they would in the repository.
    Directory {
        dir: PathBuf,
        workspace_root: PathBuf,
    },
}

impl AnalysisTarget {
    fn path(&self) -> &Path {
        match self {
            AnalysisTarget::File(path) => path,
            AnalysisTarget::Directory { dir, .. } => dir,
        }
    }
}

/// Raw captured output of one completed analyzer run.
#[derive(Debug, Clone)]
pub struct SlitherOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Runs the analyzer against a target and normalizes its output.
pub struct SlitherRunner {
    config: RunnerConfig,
}

impl SlitherRunner {
    /// Create a runner with the given invocation settings.
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Run the analyzer against a target under a hard deadline.
    ///
    /// Returns an `AnalysisOutcome` for every completed run, however the
    /// tool behaved. Only three conditions are errors: the deadline
    /// expired (the child is terminated first), the binary is missing,
    /// or the process could not be awaited at all.
    pub async fn analyze(
        &self,
        target: &AnalysisTarget,
        deadline: Duration,
    ) -> Result<AnalysisOutcome> {
        let output = self.run(target, deadline).await?;

        if output.exit_code != Some(0) {
            // Non-zero exit is routine for this tool family when findings
            // exist; stdout decides the outcome, not the exit code.
            debug!("Analyzer exited with {:?}", output.exit_code);
        }

        Ok(aggregator::normalize(&output))
    }

    async fn run(&self, target: &AnalysisTarget, deadline: Duration) -> Result<SlitherOutput> {
        let mut cmd = Command::new(&self.config.binary);
        cmd.arg(target.path());
        cmd.args(["--json", "-"]);

        if self.config.disable_color {
            cmd.arg("--disable-color");
        }

        if !self.config.filter_paths.is_empty() {
            cmd.arg("--filter-paths");
            cmd.arg(self.config.filter_paths.join(","));
        }

        if let AnalysisTarget::Directory { workspace_root, .. } = target {
            cmd.current_dir(workspace_root);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the child on deadline expiry must kill it, or
            // orphaned analyzer processes pile up under load.
            .kill_on_drop(true);

        info!(
            "Running {} on {}",
            self.config.binary,
            target.path().display()
        );

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AuditError::ToolUnavailable(format!(
                    "'{}' is not installed or not on PATH",
                    self.config.binary
                ))
            } else {
                AuditError::Internal(anyhow::anyhow!(
                    "failed to spawn {}: {}",
                    self.config.binary,
                    e
                ))
            }
        })?;

        match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(SlitherOutput {
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                exit_code: output.status.code(),
            }),
            Ok(Err(e)) => Err(AuditError::Internal(anyhow::anyhow!(
                "failed to collect analyzer output: {}",
                e
            ))),
            Err(_) => {
                // The timed-out future dropped the child handle, which
                // terminates the process (kill_on_drop).
                warn!(
                    "Analyzer exceeded {}s deadline on {}, terminated",
                    deadline.as_secs(),
                    target.path().display()
                );
                Err(AuditError::Timeout {
                    limit_secs: deadline.as_secs(),
                })
            }
        }
    }
}
