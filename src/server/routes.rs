//! API route handlers.
//!
//! Request/response shapes live next to the handlers that use them.
//! Acquisition failures abort a request; analyzer-output anomalies are
//! folded into the response payload instead (see `analysis::aggregator`).

use crate::analysis::aggregator;
use crate::error::AuditError;
use crate::models::{count_lines, AnalysisOutcome, Finding, SeverityCounts};
use crate::repo::{clone_repository, CloneOptions, Workspace};
use crate::scanner::{ContractScanner, ScanConfig};
use crate::server::AppState;
use crate::slither::AnalysisTarget;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

// ─── Request / response types ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Contract source text. Required; validated before any subprocess
    /// is spawned.
    pub contract: Option<String>,
    /// Display name for the contract.
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryAnalyzeRequest {
    /// HTTPS URL of the repository to clone.
    pub repo_url: Option<String>,
    /// Token for private repositories, embedded into the clone URL.
    pub access_token: Option<String>,
    /// Branch to analyze. Defaults to the configured default branch.
    pub branch: Option<String>,
    /// Directory holding the contracts. Defaults to the configured path,
    /// with fallback probing when it does not exist.
    pub contracts_path: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub contract_name: String,
    pub lines_analyzed: usize,
    pub slither_results: Value,
    pub summary: SeverityCounts,
    pub raw_findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct RepositoryAnalyzeResponse {
    pub success: bool,
    pub repo_url: String,
    pub branch: String,
    pub contracts_path: String,
    pub files_analyzed: usize,
    pub contract_files: Vec<String>,
    pub slither_results: Value,
    pub summary: SeverityCounts,
    pub raw_findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    pub timestamp: String,
}

// ─── Handlers ───────────────────────────────────────────────────────────

/// GET /: health payload.
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        service: "slitherd",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// POST /debug: echo the request back for client troubleshooting.
pub async fn debug_echo(req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
    let headers: BTreeMap<String, String> = req
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                value.to_str().unwrap_or("<non-utf8>").to_string(),
            )
        })
        .collect();

    HttpResponse::Ok().json(serde_json::json!({
        "received_data": body.into_inner(),
        "headers": headers,
        "method": req.method().as_str(),
    }))
}

/// POST /analyze: analyze contract source submitted directly.
pub async fn analyze_contract(
    state: web::Data<AppState>,
    body: web::Json<AnalyzeRequest>,
) -> Result<HttpResponse, AuditError> {
    let request = body.into_inner();
    let contract = request.contract.unwrap_or_default();
    let name = request.name.unwrap_or_else(|| "Unknown".to_string());

    validate_contract(&contract, state.config.analyzer.max_contract_lines)?;
    let lines_analyzed = count_lines(&contract);

    info!("Analyzing contract '{}' ({} lines)", name, lines_analyzed);

    let workspace = Workspace::new()?;
    let staged = workspace.stage_file(&contract_file_name(&name), &contract)?;

    let outcome = {
        let _permit = state
            .scan_permits
            .acquire()
            .await
            .map_err(|e| AuditError::Internal(anyhow::anyhow!("admission limiter closed: {}", e)))?;

        state
            .runner
            .analyze(
                &AnalysisTarget::File(staged),
                Duration::from_secs(state.config.analyzer.contract_timeout_secs),
            )
            .await?
    };
    // workspace drops here; the staged file is gone whatever happened above

    Ok(HttpResponse::Ok().json(analyze_response(name, lines_analyzed, outcome)))
}

/// POST /analyze/repository: clone a repository and analyze its contracts.
///
/// Only acquisition failures abort this path. Analyzer-level failures
/// (timeout, missing binary) are reported inside `slither_results`,
/// matching the direct path's degraded-output handling.
pub async fn analyze_repository(
    state: web::Data<AppState>,
    body: web::Json<RepositoryAnalyzeRequest>,
) -> Result<HttpResponse, AuditError> {
    let request = body.into_inner();

    let repo_url = match request.repo_url {
        Some(url) if !url.trim().is_empty() => url,
        _ => return Err(AuditError::Validation("repo_url required".to_string())),
    };
    if !repo_url.starts_with("https://") && !repo_url.starts_with("git@") {
        return Err(AuditError::Validation(
            "repo_url must start with 'https://' or 'git@'".to_string(),
        ));
    }

    let branch = request
        .branch
        .filter(|b| !b.trim().is_empty())
        .unwrap_or_else(|| state.config.repository.default_branch.clone());
    let contracts_path = request
        .contracts_path
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| state.config.repository.default_contracts_path.clone());

    info!("Analyzing repository {} (branch {})", repo_url, branch);

    // Clone on the blocking pool; git2 is synchronous.
    let clone_options = CloneOptions {
        branch: branch.clone(),
        depth: match state.config.repository.clone_depth {
            d if d > 0 => Some(d),
            _ => None,
        },
        access_token: request.access_token,
    };
    let url = repo_url.clone();
    let workspace = tokio::task::spawn_blocking(move || clone_repository(&url, &clone_options))
        .await
        .map_err(|e| AuditError::Internal(anyhow::anyhow!("clone task failed: {}", e)))??;

    let scanner = ContractScanner::new(
        workspace.path().to_path_buf(),
        ScanConfig::from(&state.config.scanner),
    );
    let contracts_dir = scanner.resolve_contracts_dir(&contracts_path)?;
    let sources = scanner.collect_sources(&contracts_dir)?;

    let resolved_path = contracts_dir
        .strip_prefix(workspace.path())
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();
    let resolved_path = if resolved_path.is_empty() {
        ".".to_string()
    } else {
        resolved_path
    };

    let outcome = {
        let _permit = state
            .scan_permits
            .acquire()
            .await
            .map_err(|e| AuditError::Internal(anyhow::anyhow!("admission limiter closed: {}", e)))?;

        let target = AnalysisTarget::Directory {
            dir: contracts_dir.clone(),
            workspace_root: workspace.path().to_path_buf(),
        };
        let deadline = Duration::from_secs(state.config.analyzer.repository_timeout_secs);

        match state.runner.analyze(&target, deadline).await {
            Ok(outcome) => outcome,
            Err(e @ AuditError::Timeout { .. }) | Err(e @ AuditError::ToolUnavailable(_)) => {
                warn!("Analyzer failed on {}: {}", repo_url, e);
                aggregator::failure_outcome(&e.to_string())
            }
            Err(e) => return Err(e),
        }
    };
    // workspace (and the whole clone) is removed when it drops below

    let response = RepositoryAnalyzeResponse {
        success: true,
        repo_url,
        branch,
        contracts_path: resolved_path,
        files_analyzed: sources.len(),
        contract_files: sources.iter().map(|s| s.path.clone()).collect(),
        slither_results: outcome.report,
        summary: outcome.summary,
        raw_findings: outcome.findings,
        diagnostic: outcome.diagnostic,
        timestamp: Utc::now().to_rfc3339(),
    };

    Ok(HttpResponse::Ok().json(response))
}

// ─── Helpers ────────────────────────────────────────────────────────────

/// Reject empty or oversized contract text before anything is spawned.
fn validate_contract(contract: &str, max_lines: usize) -> Result<(), AuditError> {
    if contract.trim().is_empty() {
        return Err(AuditError::Validation("contract code required".to_string()));
    }

    let lines = count_lines(contract);
    if lines > max_lines {
        return Err(AuditError::Validation(format!(
            "contract exceeds the {} line limit ({} lines)",
            max_lines, lines
        )));
    }

    Ok(())
}

/// Turn a client-supplied contract name into a safe workspace file name.
fn contract_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect();

    let base = sanitized.trim_matches('_');
    if base.is_empty() {
        "Contract.sol".to_string()
    } else {
        format!("{}.sol", base)
    }
}

fn analyze_response(
    contract_name: String,
    lines_analyzed: usize,
    outcome: AnalysisOutcome,
) -> AnalyzeResponse {
    AnalyzeResponse {
        success: true,
        contract_name,
        lines_analyzed,
        slither_results: outcome.report,
        summary: outcome.summary,
        raw_findings: outcome.findings,
        diagnostic: outcome.diagnostic,
        timestamp: Utc::now().to_rfc3339(),
    }
}
