//! Data models for the analysis service.
//!
//! This module contains the core data structures used throughout the
//! application for representing findings, summaries, and acquired source
//! files.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Severity (impact) classification of a finding.
///
/// Mirrors the analyzer's `impact` field. Anything outside these four
/// values is left unclassified and counts into no bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational - style notes, optimization hints
    Informational,
    /// Low severity - minor issues, unlikely to be exploitable
    Low,
    /// Medium severity - potential vulnerabilities worth review
    Medium,
    /// High severity - likely exploitable vulnerabilities
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Informational => write!(f, "Informational"),
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
        }
    }
}

impl Severity {
    /// Parse an analyzer `impact` value. Returns `None` for anything
    /// outside the four known buckets.
    pub fn from_impact(impact: &str) -> Option<Self> {
        match impact.to_lowercase().as_str() {
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            "informational" => Some(Severity::Informational),
            _ => None,
        }
    }
}

/// One finding reported by the analyzer.
///
/// The analyzer owns this shape and may evolve it, so the payload is kept
/// as an opaque JSON object. Only the `impact` field is interpreted, for
/// severity aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Finding(pub Map<String, Value>);

impl Finding {
    /// The severity bucket this finding counts into, if its `impact`
    /// field carries a recognized value.
    pub fn severity(&self) -> Option<Severity> {
        self.0
            .get("impact")
            .and_then(|v| v.as_str())
            .and_then(Severity::from_impact)
    }

    /// The analyzer's check identifier, when present.
    #[allow(dead_code)] // Utility for filtering by detector
    pub fn check(&self) -> Option<&str> {
        self.0.get("check").and_then(|v| v.as_str())
    }
}

/// Aggregated finding counts per severity bucket.
///
/// Field names match the wire format of the `summary` response object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    /// Total number of findings, including unclassified ones.
    #[serde(rename = "total_detectors")]
    pub total: usize,
    /// Number of high severity findings.
    #[serde(rename = "high_severity")]
    pub high: usize,
    /// Number of medium severity findings.
    #[serde(rename = "medium_severity")]
    pub medium: usize,
    /// Number of low severity findings.
    #[serde(rename = "low_severity")]
    pub low: usize,
    /// Number of informational findings.
    pub informational: usize,
}

impl SeverityCounts {
    /// Creates a summary from a list of findings.
    ///
    /// Findings with a missing or unrecognized `impact` still count into
    /// `total` but into none of the four buckets.
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut counts = Self {
            total: findings.len(),
            ..Self::default()
        };

        for finding in findings {
            match finding.severity() {
                Some(Severity::High) => counts.high += 1,
                Some(Severity::Medium) => counts.medium += 1,
                Some(Severity::Low) => counts.low += 1,
                Some(Severity::Informational) => counts.informational += 1,
                None => {}
            }
        }

        counts
    }
}

/// Normalized result of one analyzer run.
///
/// Produced for every completed subprocess, whether the tool fully
/// succeeded, emitted unparseable output, or produced nothing at all.
/// Timeout and missing-binary conditions never reach this type.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    /// Whether the analyzer produced usable output. `false` only when
    /// stdout was empty; degraded (unparseable) output still counts as
    /// a completed run.
    pub succeeded: bool,
    /// The full analyzer document, or a structured error object when the
    /// run was degraded or produced no output.
    pub report: Value,
    /// The detector list extracted from the report, in report order.
    pub findings: Vec<Finding>,
    /// Finding counts per severity bucket.
    pub summary: SeverityCounts,
    /// Present when output normalization was degraded (e.g. the output
    /// was not valid JSON). Carries an explanation, never a panic.
    pub diagnostic: Option<String>,
}

/// A source file acquired from a request body or a cloned repository.
///
/// Read-only once acquired. `path` is relative to the workspace root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// File name (no directory components).
    pub name: String,
    /// Path relative to the repository root.
    pub path: String,
    /// File content as UTF-8 text.
    pub content: String,
}

impl SourceFile {
    /// Number of newline-delimited segments in the content.
    #[allow(dead_code)] // Utility for per-file stats
    pub fn line_count(&self) -> usize {
        count_lines(&self.content)
    }
}

/// Count newline-delimited segments of a text, the way the request
/// validation and `lines_analyzed` response field count them.
///
/// An empty string counts as one segment; a trailing newline adds one.
pub fn count_lines(text: &str) -> usize {
    text.split('\n').count()
}
