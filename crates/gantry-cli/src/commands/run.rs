use crate::steps;
use gantry_harness::binding::StepContext;
use gantry_harness::config::RunConfig;
use gantry_harness::execution::ScenarioRunner;
use gantry_harness::gherkin::{self, Parser};
use gantry_harness::reporting::{OutputFormat, RunReport, RunReporter};
use gantry_session::{InterceptionLedger, ScriptedSession, SiteFixture};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub path: PathBuf,
    pub open: bool,
    pub format: String,
    pub config: Option<PathBuf>,
    pub fixture: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("features"),
            open: false,
            format: "junit".to_string(),
            config: None,
            fixture: None,
        }
    }
}

impl RunOptions {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut options = Self::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--open" => options.open = true,
                "--format" => {
                    options.format = iter
                        .next()
                        .ok_or_else(|| "--format requires a value".to_string())?
                        .clone();
                }
                "--config" => {
                    options.config = Some(PathBuf::from(
                        iter.next()
                            .ok_or_else(|| "--config requires a value".to_string())?,
                    ));
                }
                "--fixture" => {
                    options.fixture = Some(PathBuf::from(
                        iter.next()
                            .ok_or_else(|| "--fixture requires a value".to_string())?,
                    ));
                }
                flag if flag.starts_with("--") => {
                    return Err(format!("unknown option: {flag}"));
                }
                path => options.path = PathBuf::from(path),
            }
        }
        Ok(options)
    }
}

pub fn execute(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let options = RunOptions::parse(args)?;
    let format: OutputFormat = options.format.parse::<OutputFormat>()?;
    let config = RunConfig::load(options.config.as_deref())?;

    let fixture = match &options.fixture {
        Some(path) => SiteFixture::from_json(&std::fs::read_to_string(path)?)?,
        None => SiteFixture::demo(),
    };

    if config.trash_artifacts_before_run {
        trash_artifacts(&config);
    }

    let feature_paths = gherkin::discover(&options.path)?;
    if feature_paths.is_empty() {
        return Err(format!("no feature files under {}", options.path.display()).into());
    }

    let registry = Arc::new(steps::builtin_registry()?);
    let runner = ScenarioRunner::new(registry, config.clone()).with_open_mode(options.open);

    let factory = {
        let config = config.clone();
        let fixture = fixture.clone();
        move || {
            let ledger = Arc::new(InterceptionLedger::new());
            let session = Arc::new(ScriptedSession::new(fixture.clone(), Arc::clone(&ledger)));
            StepContext::new(config.clone(), session, ledger)
        }
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let mut features = Vec::with_capacity(feature_paths.len());
    for path in &feature_paths {
        let feature = Parser::parse_feature_file(path)?;
        println!("Running feature: {} ({})", feature.name, path.display());
        let result = runtime.block_on(runner.run_feature(&feature, &factory));
        for scenario in &result.scenarios {
            println!("  Scenario: {} - {}", scenario.name, scenario.status);
            for step in &scenario.steps {
                if let Some(error) = &step.error {
                    println!("    {} {}: {}", step.keyword, step.text, error);
                }
            }
        }
        features.push(result);
    }

    let report = RunReport::build("Gantry Test Report", features);
    let reporter = RunReporter::new(format)?;
    let rendered = reporter.generate(&report)?;
    std::fs::create_dir_all(&config.reports_dir)?;
    let report_path = config.reports_dir.join(reporter.file_name());
    std::fs::write(&report_path, rendered)?;

    println!();
    println!("Report saved to: {}", report_path.display());
    println!(
        "Scenarios: {} total, {} passed, {} failed, {} skipped",
        report.summary.total_scenarios,
        report.summary.passed,
        report.summary.failed,
        report.summary.skipped
    );

    if !report.passed() {
        return Err(format!(
            "{} of {} scenarios failed",
            report.summary.failed, report.summary.total_scenarios
        )
        .into());
    }
    Ok(())
}

fn trash_artifacts(config: &RunConfig) {
    for dir in [
        &config.reports_dir,
        &config.screenshots_dir,
        &config.videos_dir,
    ] {
        if dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(dir) {
                eprintln!("Warning: could not clear {}: {e}", dir.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_apply_with_no_arguments() {
        let options = RunOptions::parse(&[]).expect("parse");
        assert_eq!(options, RunOptions::default());
    }

    #[test]
    fn flags_and_positional_path() {
        let options = RunOptions::parse(&args(&[
            "specs",
            "--open",
            "--format",
            "markdown",
            "--config",
            "custom.json",
        ]))
        .expect("parse");
        assert_eq!(options.path, PathBuf::from("specs"));
        assert!(options.open);
        assert_eq!(options.format, "markdown");
        assert_eq!(options.config, Some(PathBuf::from("custom.json")));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = RunOptions::parse(&args(&["--parallel"])).expect_err("unknown");
        assert!(err.contains("--parallel"));
    }

    #[test]
    fn missing_flag_value_is_rejected() {
        let err = RunOptions::parse(&args(&["--format"])).expect_err("missing value");
        assert!(err.contains("--format"));
    }
}
