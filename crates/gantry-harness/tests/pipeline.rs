//! Whole-pipeline coverage: feature text in, report artifact out, with the
//! interception ledger exercised through a real click.

use gantry_harness::binding::{StepArgs, StepContext, StepRegistry};
use gantry_harness::config::RunConfig;
use gantry_harness::execution::ScenarioRunner;
use gantry_harness::gherkin::Parser;
use gantry_harness::reporting::{OutputFormat, RunReport, RunReporter, TestStatus};
use gantry_harness::{HarnessError, Result};
use gantry_session::{InterceptionLedger, ScriptedSession, SessionError, SiteFixture};
use std::sync::Arc;

const FEATURE: &str = r#"
Feature: Comments fetch
  Scenario: The send button fetches comments
    Given I intercept "GET" requests to "**/comments" as "getComments"
    When I visit the homepage
    And I click the "button[class=send-me]" button
    Then the "getComments" exchange responds with status 200

  Scenario: Placeholder text
    When I visit the homepage
    Then I see the placeholder "Search"
"#;

async fn register_interception(ctx: &mut StepContext, args: StepArgs) -> Result<()> {
    let method = args.values[0].as_str().to_string();
    let pattern = args.values[1].as_str().to_string();
    let alias = args.values[2].as_str().to_string();
    ctx.ledger.register(&method, &pattern, &alias).await?;
    Ok(())
}

async fn visit_homepage(ctx: &mut StepContext, _args: StepArgs) -> Result<()> {
    ctx.home_page().visit().await?;
    Ok(())
}

async fn click_button(ctx: &mut StepContext, args: StepArgs) -> Result<()> {
    let selector = args.values[0].as_str().to_string();
    ctx.session.click(&selector).await?;
    Ok(())
}

async fn assert_exchange_status(ctx: &mut StepContext, args: StepArgs) -> Result<()> {
    let alias = args.values[0].as_str().to_string();
    let expected = args.values[1].as_int().unwrap_or_default();
    let exchange = ctx
        .ledger
        .wait_for(&alias, ctx.config.request_timeout())
        .await?;
    if i64::from(exchange.status) != expected {
        return Err(HarnessError::Session(SessionError::Assertion {
            expected: format!("status {expected} for {alias:?}"),
            actual: format!("status {}", exchange.status),
        }));
    }
    Ok(())
}

async fn assert_placeholder(ctx: &mut StepContext, args: StepArgs) -> Result<()> {
    let expected = args.values[0].as_str().to_string();
    ctx.home_page()
        .element("#mongo")
        .should_have_attr("placeholder", &expected)
        .await?;
    Ok(())
}

fn registry() -> Arc<StepRegistry> {
    let mut registry = StepRegistry::new();
    registry
        .given("I intercept {string} requests to {string} as {string}", |ctx, args| {
            Box::pin(register_interception(ctx, args))
        })
        .expect("register");
    registry
        .when("I visit the homepage", |ctx, args| {
            Box::pin(visit_homepage(ctx, args))
        })
        .expect("register");
    registry
        .when("I click the {string} button", |ctx, args| {
            Box::pin(click_button(ctx, args))
        })
        .expect("register");
    registry
        .then("the {string} exchange responds with status {int}", |ctx, args| {
            Box::pin(assert_exchange_status(ctx, args))
        })
        .expect("register");
    registry
        .then("I see the placeholder {string}", |ctx, args| {
            Box::pin(assert_placeholder(ctx, args))
        })
        .expect("register");
    Arc::new(registry)
}

fn new_context() -> StepContext {
    let ledger = Arc::new(InterceptionLedger::new());
    let session = Arc::new(ScriptedSession::new(
        SiteFixture::demo(),
        Arc::clone(&ledger),
    ));
    StepContext::new(RunConfig::default(), session, ledger)
}

#[tokio::test]
async fn feature_runs_end_to_end_and_renders_junit() {
    let feature = Parser::parse_feature(FEATURE).expect("parse");
    let runner = ScenarioRunner::new(registry(), RunConfig::default());
    let result = runner.run_feature(&feature, &new_context).await;

    assert!(result.passed(), "scenarios failed: {:?}", result.scenarios);
    assert_eq!(result.tests, 2);
    for scenario in &result.scenarios {
        assert_eq!(scenario.status, TestStatus::Passed);
        assert_eq!(scenario.attempts, 1);
    }

    let report = RunReport::build("Gantry Test Report", vec![result]);
    let xml = RunReporter::new(OutputFormat::Junit)
        .expect("reporter")
        .generate(&report)
        .expect("render");
    assert!(xml.contains(r#"<testsuite name="Comments fetch" tests="2" failures="0""#));
    assert!(xml.contains(r#"<testcase name="The send button fetches comments""#));
}

#[tokio::test]
async fn interception_timeout_fails_the_scenario_with_the_alias_named() {
    let feature_text = r#"
Feature: Timeouts
  Scenario: Waiting for traffic that never comes
    Given I intercept "GET" requests to "**/comments" as "getComments"
    When I visit the homepage
    Then the "getComments" exchange responds with status 200
"#;
    let feature = Parser::parse_feature(feature_text).expect("parse");
    let mut config = RunConfig::default();
    config.retries.run_mode = 0;
    config.request_timeout_ms = 50;

    let runner = ScenarioRunner::new(registry(), config.clone());
    let factory = move || {
        let ledger = Arc::new(InterceptionLedger::new());
        let session = Arc::new(ScriptedSession::new(
            SiteFixture::demo(),
            Arc::clone(&ledger),
        ));
        StepContext::new(config.clone(), session, ledger)
    };
    let result = runner.run_feature(&feature, &factory).await;

    let scenario = &result.scenarios[0];
    assert_eq!(scenario.status, TestStatus::Failed);
    let error = scenario.error.as_deref().expect("error recorded");
    assert!(error.contains("getComments"), "error was: {error}");
    assert!(error.contains("no matching exchange"), "error was: {error}");
}
