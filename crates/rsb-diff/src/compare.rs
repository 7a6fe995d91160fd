//! Bundle-to-bundle comparison of tests, failures and build issues.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{diff_by, DiffResult};

/// One executed test.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestExecution {
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
}

impl TestExecution {
    fn signature(&self) -> String {
        self.identifier.clone()
    }
}

/// A failure message attached to a test.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFailure {
    pub test_identifier: String,
    pub message: String,
}

impl TestFailure {
    fn signature(&self) -> String {
        format!("{}\u{1f}{}", self.test_identifier, self.message)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub file: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
}

/// A build or analyzer diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildIssue {
    pub issue_type: String,
    #[serde(default)]
    pub target: String,
    pub message: String,
    #[serde(default)]
    pub location: Option<SourceLocation>,
}

impl BuildIssue {
    fn signature(&self) -> String {
        format!(
            "{}\u{1f}{}\u{1f}{}",
            self.issue_type, self.target, self.message
        )
    }
}

/// Test-presence diff keyed by test identifier.
pub fn diff_tests(current: &[TestExecution], baseline: &[TestExecution]) -> DiffResult<TestExecution> {
    diff_by(current, baseline, TestExecution::signature)
}

/// Failure diff keyed by test identifier and message.
pub fn diff_failures(current: &[TestFailure], baseline: &[TestFailure]) -> DiffResult<TestFailure> {
    diff_by(current, baseline, TestFailure::signature)
}

/// Issue diff keyed by type, target and message.
///
/// Issues without a source location are dropped from both sides first.
pub fn diff_issues(current: &[BuildIssue], baseline: &[BuildIssue]) -> DiffResult<BuildIssue> {
    let located = |issues: &[BuildIssue]| -> Vec<BuildIssue> {
        issues
            .iter()
            .filter(|i| i.location.is_some())
            .cloned()
            .collect()
    };
    diff_by(&located(current), &located(baseline), BuildIssue::signature)
}

/// The comparable content of one bundle, as extracted by a report builder.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BundleSummary {
    pub tests: Vec<TestExecution>,
    pub failures: Vec<TestFailure>,
    pub issues: Vec<BuildIssue>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleComparison {
    pub tests: DiffResult<TestExecution>,
    pub failures: DiffResult<TestFailure>,
    pub issues: DiffResult<BuildIssue>,
}

impl BundleComparison {
    /// Returns `true` when nothing was introduced or resolved.
    pub fn is_clean(&self) -> bool {
        self.tests.is_empty() && self.failures.is_empty() && self.issues.is_empty()
    }
}

/// Compare `current` against `baseline`.
pub fn compare(current: &BundleSummary, baseline: &BundleSummary) -> BundleComparison {
    let comparison = BundleComparison {
        tests: diff_tests(&current.tests, &baseline.tests),
        failures: diff_failures(&current.failures, &baseline.failures),
        issues: diff_issues(&current.issues, &baseline.issues),
    };
    debug!(
        tests = comparison.tests.len(),
        failures = comparison.failures.len(),
        issues = comparison.issues.len(),
        "bundle comparison complete"
    );
    comparison
}
