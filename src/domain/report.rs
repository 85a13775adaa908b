//! Issue reporting
//!
//! Every pipeline stage produces a report: an ordered list of issues
//! plus a validity flag. Validation findings are values, never errors;
//! the only thrown errors are programmer mistakes (see
//! [`errors`](crate::domain::errors)).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Issue severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Must fix before submission
    Error,
    /// Should fix, may cause issues
    Warning,
    /// Informational, best practice
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        };
        write!(f, "{s}")
    }
}

/// A single finding from any pipeline stage
///
/// The same shape is shared by pre-submission validation, compliance
/// checking, payer rules, and batch processing. `field_path` addresses
/// a field in the input record (`claim.clm_number`, `services[2].hcpcs`)
/// or a location in the emitted interchange (`segment[14]:K3`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Severity of the finding
    pub severity: Severity,

    /// Stable issue code (e.g. `VAL_002`, `ENV_003`, `BATCH_010`)
    pub code: String,

    /// Path of the offending field or segment
    pub field_path: String,

    /// Human-readable description
    pub message: String,

    /// Expected value or format, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    /// Actual value found, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl Issue {
    /// Creates a new issue
    pub fn new(
        severity: Severity,
        code: impl Into<String>,
        field_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            field_path: field_path.into(),
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    /// Creates an ERROR issue
    pub fn error(
        code: impl Into<String>,
        field_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Error, code, field_path, message)
    }

    /// Creates a WARNING issue
    pub fn warning(
        code: impl Into<String>,
        field_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, code, field_path, message)
    }

    /// Creates an INFO issue
    pub fn info(
        code: impl Into<String>,
        field_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Info, code, field_path, message)
    }

    /// Sets the expected value or format
    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Sets the actual value found
    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }
}

/// Ordered list of issues plus a validity flag
///
/// `is_valid` is true iff no ERROR issue has been recorded; warnings
/// and info entries never invalidate a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// All findings in the order they were recorded
    pub issues: Vec<Issue>,

    /// True iff no ERROR issues are present
    pub is_valid: bool,
}

/// Pre-submission validation findings
pub type ValidationReport = Report;

/// Structural re-parse findings on emitted output
pub type ComplianceReport = Report;

/// Payer-specific content findings on emitted output
pub type PayerReport = Report;

impl Report {
    /// Creates an empty, valid report
    pub fn new() -> Self {
        Self {
            issues: Vec::new(),
            is_valid: true,
        }
    }

    /// Records an issue, updating the validity flag
    pub fn push(&mut self, issue: Issue) {
        if issue.severity == Severity::Error {
            self.is_valid = false;
        }
        self.issues.push(issue);
    }

    /// Appends every issue of `other`, preserving order
    pub fn merge(&mut self, other: Report) {
        for issue in other.issues {
            self.push(issue);
        }
    }

    /// Iterates over ERROR issues
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
    }

    /// Iterates over WARNING issues
    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    /// Number of ERROR issues
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Formats the report as a text table for console output
    pub fn format_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Report: {}\n",
            if self.is_valid { "PASS" } else { "FAIL" }
        ));
        for issue in &self.issues {
            out.push_str(&format!(
                "  {:7} [{}] {}: {}\n",
                issue.severity.to_string(),
                issue.code,
                issue.field_path,
                issue.message
            ));
            if let Some(expected) = &issue.expected {
                out.push_str(&format!("          expected: {expected}\n"));
            }
            if let Some(actual) = &issue.actual {
                out.push_str(&format!("          actual:   {actual}\n"));
            }
        }
        out
    }

    /// Formats the report as pretty-printed JSON
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

/// Batch processing report
///
/// Wraps the shared issue list with batch-level counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Number of trip records received
    pub trips_processed: usize,

    /// Number of claims assembled from the trips
    pub claims_generated: usize,

    /// Number of claims excluded from emission
    pub claims_rejected: usize,

    /// Findings, in order
    pub report: Report,
}

impl BatchReport {
    /// Creates an empty batch report
    pub fn new() -> Self {
        Self {
            trips_processed: 0,
            claims_generated: 0,
            claims_rejected: 0,
            report: Report::new(),
        }
    }

    /// Records an issue
    pub fn push(&mut self, issue: Issue) {
        self.report.push(issue);
    }

    /// True iff no ERROR issues are present
    pub fn is_valid(&self) -> bool {
        self.report.is_valid
    }
}

impl Default for BatchReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_valid() {
        let report = Report::new();
        assert!(report.is_valid);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_error_invalidates() {
        let mut report = Report::new();
        report.push(Issue::warning("VAL_050", "claim.total_charge", "close"));
        assert!(report.is_valid);
        report.push(Issue::error("VAL_001", "billing_provider.npi", "required"));
        assert!(!report.is_valid);
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn test_merge_preserves_order_and_validity() {
        let mut a = Report::new();
        a.push(Issue::info("VAL_100", "claim", "first"));
        let mut b = Report::new();
        b.push(Issue::error("VAL_001", "claim", "second"));
        a.merge(b);
        assert_eq!(a.issues.len(), 2);
        assert_eq!(a.issues[1].code, "VAL_001");
        assert!(!a.is_valid);
    }

    #[test]
    fn test_format_text() {
        let mut report = Report::new();
        report.push(
            Issue::error("VAL_002", "billing_provider.npi", "must be 10 digits")
                .with_expected("10 digits")
                .with_actual("12345"),
        );
        let text = report.format_text();
        assert!(text.contains("FAIL"));
        assert!(text.contains("VAL_002"));
        assert!(text.contains("expected: 10 digits"));
    }

    #[test]
    fn test_json_round_trip() {
        let mut report = Report::new();
        report.push(Issue::warning("VAL_060", "services[0].hcpcs", "unknown code"));
        let json = report.format_json().unwrap();
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back.issues.len(), 1);
        assert_eq!(back.issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_batch_report_counters() {
        let mut report = BatchReport::new();
        report.trips_processed = 3;
        report.claims_generated = 2;
        report.push(Issue::error("BATCH_010", "claims[1]", "duplicate"));
        assert!(!report.is_valid());
    }
}
