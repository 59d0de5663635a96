use crate::binding::{StepArgs, StepCategory, StepContext, StepRegistry};
use crate::config::RunConfig;
use crate::gherkin::{Background, Feature, Scenario, Step};
use crate::reporting::{FeatureResult, ScenarioResult, StepResult, TestStatus};
use crate::{HarnessError, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Builds one fresh [`StepContext`] per scenario attempt. A fresh session
/// and ledger per attempt is what makes whole-scenario retries safe: no
/// mutable state survives from a failed attempt.
pub type ContextFactory = dyn Fn() -> StepContext + Send + Sync;

/// Drives scenarios through the registry, one step at a time. A step fully
/// resolves, including its asynchronous waits, before the next one starts;
/// there is no step-level parallelism within a scenario.
pub struct ScenarioRunner {
    registry: Arc<StepRegistry>,
    config: RunConfig,
    open_mode: bool,
}

impl ScenarioRunner {
    pub fn new(registry: Arc<StepRegistry>, config: RunConfig) -> Self {
        Self {
            registry,
            config,
            open_mode: false,
        }
    }

    /// Interactive mode uses its own retry count (default 0).
    pub fn with_open_mode(mut self, open_mode: bool) -> Self {
        self.open_mode = open_mode;
        self
    }

    /// Run every scenario in the feature. A failing scenario never blocks
    /// its siblings.
    pub async fn run_feature(
        &self,
        feature: &Feature,
        new_context: &ContextFactory,
    ) -> FeatureResult {
        let mut results = Vec::with_capacity(feature.scenarios.len());
        for scenario in &feature.scenarios {
            results.push(
                self.run_scenario(feature.background.as_ref(), scenario, new_context)
                    .await,
            );
        }
        FeatureResult::new(feature.name.clone(), results)
    }

    /// Run one scenario, retrying the whole scenario from the start on
    /// failure, up to the configured count. Retries never resume
    /// mid-scenario and never reuse a context.
    pub async fn run_scenario(
        &self,
        background: Option<&Background>,
        scenario: &Scenario,
        new_context: &ContextFactory,
    ) -> ScenarioResult {
        let retries = self.config.retry_count(self.open_mode);
        let started = Instant::now();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let mut ctx = new_context();
            let steps = self.run_attempt(background, scenario, &mut ctx).await;
            let passed = steps.iter().all(|s| s.status == TestStatus::Passed);

            if passed {
                return ScenarioResult::new(
                    scenario.name.clone(),
                    TestStatus::Passed,
                    started.elapsed().as_millis() as u64,
                    attempt,
                    steps,
                    None,
                );
            }
            if attempt > retries {
                let screenshot = self.capture_failure(&ctx, &scenario.name).await;
                return ScenarioResult::new(
                    scenario.name.clone(),
                    TestStatus::Failed,
                    started.elapsed().as_millis() as u64,
                    attempt,
                    steps,
                    screenshot,
                );
            }
            warn!(
                scenario = %scenario.name,
                attempt,
                "scenario failed, retrying from the start"
            );
        }
    }

    async fn run_attempt(
        &self,
        background: Option<&Background>,
        scenario: &Scenario,
        ctx: &mut StepContext,
    ) -> Vec<StepResult> {
        let background_steps = background.map(|b| b.steps.as_slice()).unwrap_or(&[]);
        let mut results = Vec::with_capacity(background_steps.len() + scenario.steps.len());
        let mut previous: Option<StepCategory> = None;
        let mut failed = false;

        for step in background_steps.iter().chain(&scenario.steps) {
            if failed {
                results.push(StepResult {
                    keyword: step.keyword.to_string(),
                    text: step.text.clone(),
                    status: TestStatus::Skipped,
                    error: None,
                    duration_ms: 0,
                });
                continue;
            }

            let started = Instant::now();
            let outcome = self.execute_step(step, &mut previous, ctx).await;
            let duration_ms = started.elapsed().as_millis() as u64;
            match outcome {
                Ok(()) => results.push(StepResult {
                    keyword: step.keyword.to_string(),
                    text: step.text.clone(),
                    status: TestStatus::Passed,
                    error: None,
                    duration_ms,
                }),
                Err(e) => {
                    failed = true;
                    results.push(StepResult {
                        keyword: step.keyword.to_string(),
                        text: step.text.clone(),
                        status: TestStatus::Failed,
                        error: Some(e.to_string()),
                        duration_ms,
                    });
                }
            }
        }
        results
    }

    async fn execute_step(
        &self,
        step: &Step,
        previous: &mut Option<StepCategory>,
        ctx: &mut StepContext,
    ) -> Result<()> {
        let category = StepCategory::resolve(step.keyword, *previous)
            .ok_or_else(|| HarnessError::UndefinedStep(step.text.clone()))?;
        *previous = Some(category);

        let resolved = self.registry.resolve(category, &step.text)?;
        debug!(keyword = %step.keyword, text = %step.text, pattern = %resolved.pattern, "executing step");
        let args = StepArgs {
            values: resolved.values,
            table: step.data_table.clone(),
            doc_string: step.doc_string.clone(),
        };
        (resolved.handler)(ctx, args).await
    }

    async fn capture_failure(&self, ctx: &StepContext, scenario_name: &str) -> Option<PathBuf> {
        if !self.config.screenshot_on_run_failure {
            return None;
        }
        let bytes = match ctx.session.screenshot().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(scenario = scenario_name, error = %e, "screenshot capture failed");
                return None;
            }
        };
        let dir = &self.config.screenshots_dir;
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!(error = %e, "could not create screenshots directory");
            return None;
        }
        let path = dir.join(format!("{}.failed.txt", slug(scenario_name)));
        match std::fs::write(&path, bytes) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!(error = %e, "could not write screenshot");
                None
            }
        }
    }
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::StepRegistry;
    use crate::gherkin::Parser;
    use gantry_session::{InterceptionLedger, ScriptedSession, SiteFixture};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn demo_context() -> StepContext {
        let ledger = Arc::new(InterceptionLedger::new());
        let session = Arc::new(ScriptedSession::new(
            SiteFixture::demo(),
            Arc::clone(&ledger),
        ));
        StepContext::new(RunConfig::default(), session, ledger)
    }

    async fn visit_home(ctx: &mut StepContext, _args: StepArgs) -> Result<()> {
        ctx.home_page().visit().await?;
        Ok(())
    }

    async fn always_fails(_ctx: &mut StepContext, _args: StepArgs) -> Result<()> {
        Err(HarnessError::Execution("deliberate failure".to_string()))
    }

    fn registry() -> Arc<StepRegistry> {
        let mut registry = StepRegistry::new();
        registry
            .when("I visit the homepage", |ctx, args| {
                Box::pin(visit_home(ctx, args))
            })
            .expect("register");
        registry
            .then("something goes wrong", |ctx, args| {
                Box::pin(always_fails(ctx, args))
            })
            .expect("register");
        Arc::new(registry)
    }

    fn config_with_retries(run_mode: u32) -> RunConfig {
        let mut config = RunConfig::default();
        config.retries.run_mode = run_mode;
        config
    }

    #[tokio::test]
    async fn passing_scenario_runs_every_step_once() {
        let feature = Parser::parse_feature(
            "Feature: F\n  Scenario: ok\n    When I visit the homepage\n",
        )
        .expect("parse");
        let runner = ScenarioRunner::new(registry(), config_with_retries(2));
        let result = runner.run_feature(&feature, &demo_context).await;

        assert!(result.passed());
        assert_eq!(result.scenarios[0].attempts, 1);
        assert_eq!(result.scenarios[0].steps.len(), 1);
        assert_eq!(result.scenarios[0].steps[0].status, TestStatus::Passed);
    }

    #[tokio::test]
    async fn failure_skips_remaining_steps_and_retries_whole_scenario() {
        let feature = Parser::parse_feature(
            "Feature: F\n  Scenario: bad\n    Then something goes wrong\n    When I visit the homepage\n",
        )
        .expect("parse");
        let runner = ScenarioRunner::new(registry(), config_with_retries(2));
        let result = runner.run_feature(&feature, &demo_context).await;

        let scenario = &result.scenarios[0];
        assert_eq!(scenario.status, TestStatus::Failed);
        assert_eq!(scenario.attempts, 3, "initial run plus two retries");
        assert_eq!(scenario.steps[0].status, TestStatus::Failed);
        assert_eq!(scenario.steps[1].status, TestStatus::Skipped);
        assert!(scenario.error.as_deref().unwrap().contains("deliberate failure"));
    }

    #[tokio::test]
    async fn undefined_step_fails_before_any_handler_runs() {
        let feature = Parser::parse_feature(
            "Feature: F\n  Scenario: s\n    When I perform an unbound action\n",
        )
        .expect("parse");
        let runner = ScenarioRunner::new(registry(), config_with_retries(0));
        let result = runner.run_feature(&feature, &demo_context).await;

        let step = &result.scenarios[0].steps[0];
        assert_eq!(step.status, TestStatus::Failed);
        assert!(step.error.as_deref().unwrap().contains("undefined step"));
    }

    #[tokio::test]
    async fn each_retry_gets_a_fresh_context() {
        let contexts_built = Arc::new(AtomicU32::new(0));
        let factory = {
            let contexts_built = Arc::clone(&contexts_built);
            move || {
                contexts_built.fetch_add(1, Ordering::SeqCst);
                demo_context()
            }
        };

        let feature = Parser::parse_feature(
            "Feature: F\n  Scenario: bad\n    Then something goes wrong\n",
        )
        .expect("parse");
        let runner = ScenarioRunner::new(registry(), config_with_retries(1));
        let result = runner.run_feature(&feature, &factory).await;

        assert_eq!(result.scenarios[0].attempts, 2);
        assert_eq!(contexts_built.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn open_mode_disables_retries() {
        let feature = Parser::parse_feature(
            "Feature: F\n  Scenario: bad\n    Then something goes wrong\n",
        )
        .expect("parse");
        let runner = ScenarioRunner::new(registry(), config_with_retries(2)).with_open_mode(true);
        let result = runner.run_feature(&feature, &demo_context).await;

        assert_eq!(result.scenarios[0].attempts, 1);
    }

    #[tokio::test]
    async fn background_steps_run_before_each_scenario() {
        let feature = Parser::parse_feature(
            "Feature: F\n  Background:\n    When I visit the homepage\n  Scenario: s\n    When I visit the homepage\n",
        )
        .expect("parse");
        let runner = ScenarioRunner::new(registry(), config_with_retries(0));
        let result = runner.run_feature(&feature, &demo_context).await;

        assert!(result.passed());
        assert_eq!(result.scenarios[0].steps.len(), 2);
    }
}
