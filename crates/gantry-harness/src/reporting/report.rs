use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "passed"),
            TestStatus::Failed => write!(f, "failed"),
            TestStatus::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub keyword: String,
    pub text: String,
    pub status: TestStatus,
    pub error: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    /// Attempts consumed, including the final one. 1 means no retry.
    pub attempts: u32,
    pub steps: Vec<StepResult>,
    /// First failing step's error, surfaced for report templates.
    pub error: Option<String>,
    pub screenshot: Option<PathBuf>,
}

impl ScenarioResult {
    pub fn new(
        name: String,
        status: TestStatus,
        duration_ms: u64,
        attempts: u32,
        steps: Vec<StepResult>,
        screenshot: Option<PathBuf>,
    ) -> Self {
        let error = steps
            .iter()
            .find(|s| s.status == TestStatus::Failed)
            .and_then(|s| s.error.clone());
        Self {
            name,
            status,
            duration_ms,
            attempts,
            steps,
            error,
            screenshot,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureResult {
    pub name: String,
    pub tests: usize,
    pub failures: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub scenarios: Vec<ScenarioResult>,
}

impl FeatureResult {
    pub fn new(name: String, scenarios: Vec<ScenarioResult>) -> Self {
        let tests = scenarios.len();
        let failures = scenarios
            .iter()
            .filter(|s| s.status == TestStatus::Failed)
            .count();
        let skipped = scenarios
            .iter()
            .filter(|s| s.status == TestStatus::Skipped)
            .count();
        let duration_ms = scenarios.iter().map(|s| s.duration_ms).sum();
        Self {
            name,
            tests,
            failures,
            skipped,
            duration_ms,
            scenarios,
        }
    }

    pub fn passed(&self) -> bool {
        self.failures == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub total_scenarios: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_steps: usize,
    pub duration_ms: u64,
    pub pass_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub summary: Summary,
    pub features: Vec<FeatureResult>,
}

impl RunReport {
    pub fn build(title: impl Into<String>, features: Vec<FeatureResult>) -> Self {
        let total_scenarios: usize = features.iter().map(|f| f.tests).sum();
        let failed: usize = features.iter().map(|f| f.failures).sum();
        let skipped: usize = features.iter().map(|f| f.skipped).sum();
        let passed = total_scenarios - failed - skipped;
        let total_steps = features
            .iter()
            .flat_map(|f| &f.scenarios)
            .map(|s| s.steps.len())
            .sum();
        let duration_ms = features.iter().map(|f| f.duration_ms).sum();
        let pass_rate = if total_scenarios > 0 {
            let rate = (passed as f64 / total_scenarios as f64) * 100.0;
            (rate * 10.0).round() / 10.0
        } else {
            0.0
        };
        Self {
            title: title.into(),
            timestamp: Utc::now(),
            summary: Summary {
                total_scenarios,
                passed,
                failed,
                skipped,
                total_steps,
                duration_ms,
                pass_rate,
            },
            features,
        }
    }

    pub fn passed(&self) -> bool {
        self.summary.failed == 0
    }
}
