pub mod report;
pub mod reporter;

pub use report::{FeatureResult, RunReport, ScenarioResult, StepResult, Summary, TestStatus};
pub use reporter::{OutputFormat, RunReporter};
