//! Normalization of raw analyzer output.
//!
//! Whatever the analyzer printed (a findings document, garbage, or
//! nothing at all) comes out of here as a uniform `AnalysisOutcome`.
//! The tool's exit code is recorded but never decides success: this tool
//! family exits non-zero whenever it has findings.

use crate::models::{AnalysisOutcome, Finding, SeverityCounts};
use crate::slither::SlitherOutput;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Normalize one completed analyzer run.
pub fn normalize(output: &SlitherOutput) -> AnalysisOutcome {
    let stdout = output.stdout.trim();

    if stdout.is_empty() {
        // The tool produced nothing. The request still completes; the
        // embedded report lets callers tell "analysis could not run"
        // apart from "ran and found zero issues".
        warn!(
            "Analyzer produced no output (exit code {:?})",
            output.exit_code
        );
        return AnalysisOutcome {
            succeeded: false,
            report: json!({
                "error": "analysis failed to produce output",
                "stderr": output.stderr,
                "returncode": output.exit_code,
            }),
            findings: Vec::new(),
            summary: SeverityCounts::default(),
            diagnostic: None,
        };
    }

    match serde_json::from_str::<Value>(stdout) {
        Ok(document) => {
            let findings = extract_findings(&document);
            let summary = SeverityCounts::from_findings(&findings);
            debug!(
                "Normalized {} findings ({} high, {} medium, {} low, {} informational)",
                summary.total, summary.high, summary.medium, summary.low, summary.informational
            );

            AnalysisOutcome {
                succeeded: true,
                report: document,
                findings,
                summary,
                diagnostic: None,
            }
        }
        Err(e) => {
            // Degraded but reported: a best-effort payload beats a hard
            // failure when the tool misbehaves.
            warn!("Analyzer output was not valid JSON: {}", e);
            AnalysisOutcome {
                succeeded: true,
                report: json!({
                    "error": "analysis completed but output was not valid JSON",
                    "raw_output": stdout,
                    "stderr": output.stderr,
                    "returncode": output.exit_code,
                }),
                findings: Vec::new(),
                summary: SeverityCounts::default(),
                diagnostic: Some(format!("analyzer output was not valid JSON: {}", e)),
            }
        }
    }
}

/// Build an outcome for an analyzer-level failure that the caller chose
/// to absorb rather than raise (repository path: timeout, missing tool).
pub fn failure_outcome(message: &str) -> AnalysisOutcome {
    AnalysisOutcome {
        succeeded: false,
        report: json!({ "error": message }),
        findings: Vec::new(),
        summary: SeverityCounts::default(),
        diagnostic: None,
    }
}

/// Pull the detector list out of an analyzer document.
///
/// Real output nests it under `results.detectors`; the tool contract
/// also allows a top-level `detectors` list. Entries that are not JSON
/// objects are dropped.
fn extract_findings(document: &Value) -> Vec<Finding> {
    let detectors = document
        .get("results")
        .and_then(|r| r.get("detectors"))
        .or_else(|| document.get("detectors"))
        .and_then(|d| d.as_array());

    match detectors {
        Some(entries) => entries
            .iter()
            .filter_map(|entry| match entry {
                Value::Object(map) => Some(Finding(map.clone())),
                _ => None,
            })
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(stdout: &str, stderr: &str, exit_code: i32) -> SlitherOutput {
        SlitherOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code: Some(exit_code),
        }
    }

    #[test]
    fn test_normalize_top_level_detectors() {
        let raw = r#"{"detectors":[{"impact":"High"},{"impact":"Low"},{"impact":"Low"}]}"#;
        let outcome = normalize(&output(raw, "", 0));

        assert!(outcome.succeeded);
        assert_eq!(outcome.summary.total, 3);
        assert_eq!(outcome.summary.high, 1);
        assert_eq!(outcome.summary.medium, 0);
        assert_eq!(outcome.summary.low, 2);
        assert_eq!(outcome.summary.informational, 0);
        assert!(outcome.diagnostic.is_none());
    }

    #[test]
    fn test_normalize_nested_detectors() {
        let raw = r#"{"success":true,"results":{"detectors":[
            {"impact":"Medium","check":"reentrancy-eth"},
            {"impact":"Informational","check":"naming-convention"}
        ]}}"#;
        let outcome = normalize(&output(raw, "", 0));

        assert!(outcome.succeeded);
        assert_eq!(outcome.summary.total, 2);
        assert_eq!(outcome.summary.medium, 1);
        assert_eq!(outcome.summary.informational, 1);
        assert_eq!(outcome.findings[0].check(), Some("reentrancy-eth"));
    }

    #[test]
    fn test_normalize_nonzero_exit_still_succeeds() {
        // Non-zero exit with parseable stdout is a successful run with
        // findings, never a failure.
        let raw = r#"{"detectors":[{"impact":"High"}]}"#;
        let outcome = normalize(&output(raw, "4 findings", 4));

        assert!(outcome.succeeded);
        assert_eq!(outcome.summary.high, 1);
    }

    #[test]
    fn test_normalize_invalid_json_is_degraded_not_fatal() {
        let outcome = normalize(&output("Traceback: something broke", "stack", 1));

        assert!(outcome.succeeded);
        assert_eq!(outcome.summary.total, 0);
        let diagnostic = outcome.diagnostic.expect("diagnostic must be present");
        assert!(!diagnostic.is_empty());
        assert_eq!(
            outcome.report["raw_output"].as_str(),
            Some("Traceback: something broke")
        );
        assert_eq!(outcome.report["stderr"].as_str(), Some("stack"));
    }

    #[test]
    fn test_normalize_empty_output_is_tool_failure() {
        let outcome = normalize(&output("", "solc not found", 255));

        assert!(!outcome.succeeded);
        assert_eq!(outcome.summary.total, 0);
        assert_eq!(outcome.report["stderr"].as_str(), Some("solc not found"));
        assert_eq!(outcome.report["returncode"].as_i64(), Some(255));
    }

    #[test]
    fn test_normalize_whitespace_only_output_is_empty() {
        let outcome = normalize(&output("  \n\t ", "", 0));
        assert!(!outcome.succeeded);
    }

    #[test]
    fn test_non_object_detector_entries_are_dropped() {
        let raw = r#"{"detectors":[{"impact":"High"},"garbage",42]}"#;
        let outcome = normalize(&output(raw, "", 0));

        assert_eq!(outcome.findings.len(), 1);
        assert_eq!(outcome.summary.total, 1);
    }

    #[test]
    fn test_document_without_detectors_yields_zero_findings() {
        let outcome = normalize(&output(r#"{"results":{}}"#, "", 0));

        assert!(outcome.succeeded);
        assert_eq!(outcome.summary.total, 0);
        assert!(outcome.findings.is_empty());
    }

    #[test]
    fn test_failure_outcome() {
        let outcome = failure_outcome("analysis timed out after 300s");

        assert!(!outcome.succeeded);
        assert_eq!(
            outcome.report["error"].as_str(),
            Some("analysis timed out after 300s")
        );
        assert_eq!(outcome.summary, SeverityCounts::default());
    }
}
