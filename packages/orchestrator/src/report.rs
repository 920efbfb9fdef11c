//! Request and report models for the backport invocation surface.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::orchestrator::BackportError;

/// A backport request: one request, one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackportRequest {
    /// URL (or local path) of the repository to backport into.
    pub repository_url: String,
    /// Commit whose change should be backported.
    pub commit_reference: String,
    /// Branch or tag identifying the older version to backport to.
    pub target_version: String,
}

/// Terminal status of a backport request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// Patch applied and the test suite passed.
    Success,
    /// The request failed; the message says whether the tree was touched.
    Error,
}

/// Structured result of a backport request.
///
/// The message always distinguishes "no changes were made" from "changes
/// were reverted" so a caller can tell whether any transient state existed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackportReport {
    /// Terminal status.
    pub status: ReportStatus,
    /// Human-readable summary.
    pub message: String,
    /// Raw test-suite output, when a test run was involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_output: Option<String>,
    /// Per-file adapter explanations, when adaptation ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanations: Option<BTreeMap<String, String>>,
}

impl BackportReport {
    /// Report for an accepted backport.
    #[must_use]
    pub fn accepted(explanations: BTreeMap<String, String>, test_output: String) -> Self {
        Self {
            status: ReportStatus::Success,
            message: "Patch successfully applied and passed all tests".to_string(),
            test_output: Some(test_output),
            explanations: Some(explanations),
        }
    }
}

impl From<&BackportError> for BackportReport {
    fn from(error: &BackportError) -> Self {
        let (test_output, explanations) = match error {
            BackportError::BaselineFailed { output } => (Some(output.clone()), None),
            BackportError::ValidationFailed {
                output,
                explanations,
            } => (Some(output.clone()), Some(explanations.clone())),
            _ => (None, None),
        };

        Self {
            status: ReportStatus::Error,
            message: error.to_string(),
            test_output,
            explanations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_from_json() {
        let json = r#"{
            "repository_url": "https://example.com/repo.git",
            "commit_reference": "abc1234",
            "target_version": "v1.2"
        }"#;

        let request: BackportRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.repository_url, "https://example.com/repo.git");
        assert_eq!(request.commit_reference, "abc1234");
        assert_eq!(request.target_version, "v1.2");
    }

    #[test]
    fn test_accepted_report_serializes_expected_fields() {
        let mut explanations = BTreeMap::new();
        explanations.insert("app.py".to_string(), "Adjusted imports".to_string());

        let report = BackportReport::accepted(explanations, "3 passed\n".to_string());
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["status"], "success");
        assert_eq!(value["test_output"], "3 passed\n");
        assert_eq!(value["explanations"]["app.py"], "Adjusted imports");
    }

    #[test]
    fn test_error_report_omits_absent_fields() {
        let report = BackportReport::from(&BackportError::NoChangesFound);
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["status"], "error");
        assert!(value.get("test_output").is_none());
        assert!(value.get("explanations").is_none());
    }

    #[test]
    fn test_validation_failure_report_carries_output_and_explanations() {
        let mut explanations = BTreeMap::new();
        explanations.insert("app.py".to_string(), "Downgraded syntax".to_string());

        let report = BackportReport::from(&BackportError::ValidationFailed {
            output: "1 failed\n".to_string(),
            explanations,
        });

        assert_eq!(report.status, ReportStatus::Error);
        assert!(report.message.contains("Reverted"));
        assert_eq!(report.test_output.as_deref(), Some("1 failed\n"));
        assert_eq!(
            report.explanations.unwrap()["app.py"],
            "Downgraded syntax"
        );
    }
}
