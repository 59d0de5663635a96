//! The built-in step bindings shipped with the CLI. Patterns are compiled
//! and overlap-checked once at startup; handlers drive the page objects,
//! the session, and the interception ledger through the step context.

use gantry_harness::binding::{StepArgs, StepContext, StepRegistry};
use gantry_harness::{HarnessError, Result};
use gantry_session::SessionError;
use tracing::debug;

/// Selector of the storefront search input.
const SEARCH_INPUT: &str = "#mongo";

pub fn builtin_registry() -> Result<StepRegistry> {
    let mut registry = StepRegistry::new();

    registry.given("the following product variants exist", |ctx, args| {
        Box::pin(seed_product_variants(ctx, args))
    })?;
    registry.given(
        "I intercept {string} requests to {string} as {string}",
        |ctx, args| Box::pin(register_interception(ctx, args)),
    )?;

    registry.when("I visit the homepage", |ctx, args| {
        Box::pin(visit_homepage(ctx, args))
    })?;
    registry.when("I visit {string}", |ctx, args| {
        Box::pin(visit_path(ctx, args))
    })?;
    registry.when("I visit the {word} page", |ctx, args| {
        Box::pin(visit_named_route(ctx, args))
    })?;
    registry.when("I click the {string} button", |ctx, args| {
        Box::pin(click_button(ctx, args))
    })?;
    registry.when("I type {string} into {string}", |ctx, args| {
        Box::pin(type_into(ctx, args))
    })?;

    registry.then("I see the placeholder {string}", |ctx, args| {
        Box::pin(assert_placeholder(ctx, args))
    })?;
    registry.then(
        "the {string} exchange responds with status {int}",
        |ctx, args| Box::pin(assert_exchange_status(ctx, args)),
    )?;
    registry.then("the page title contains {string}", |ctx, args| {
        Box::pin(assert_title_contains(ctx, args))
    })?;
    registry.then("the {string} field has value {string}", |ctx, args| {
        Box::pin(assert_field_value(ctx, args))
    })?;

    Ok(registry)
}

/// Fixture-data step. The table rows are validated for shape and logged;
/// the shipped suite performs no business validation on them.
async fn seed_product_variants(_ctx: &mut StepContext, args: StepArgs) -> Result<()> {
    let table = args.table()?;
    table.require_columns(&["Id", "Name", "Buy Price", "Sell Price", "Margin"])?;
    for (index, row) in table.row_maps().iter().enumerate() {
        debug!(
            row = index,
            id = %row["Id"],
            name = %row["Name"],
            buy_price = %row["Buy Price"],
            sell_price = %row["Sell Price"],
            margin = %row["Margin"],
            "product variant"
        );
    }
    Ok(())
}

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

async fn visit_path(ctx: &mut StepContext, args: StepArgs) -> Result<()> {
    let path = args.values[0].as_str().to_string();
    ctx.page(&path).visit().await?;
    Ok(())
}

async fn visit_named_route(ctx: &mut StepContext, args: StepArgs) -> Result<()> {
    let name = args.values[0].as_str().to_string();
    let path = ctx
        .config
        .route(&name)
        .ok_or_else(|| HarnessError::Config(format!("no route named {name:?}")))?
        .to_string();
    ctx.page(&path).visit().await?;
    Ok(())
}

async fn click_button(ctx: &mut StepContext, args: StepArgs) -> Result<()> {
    let selector = args.values[0].as_str().to_string();
    ctx.session.click(&selector).await?;
    Ok(())
}

async fn type_into(ctx: &mut StepContext, args: StepArgs) -> Result<()> {
    let text = args.values[0].as_str().to_string();
    let selector = args.values[1].as_str().to_string();
    ctx.session.type_text(&selector, &text).await?;
    Ok(())
}

async fn assert_placeholder(ctx: &mut StepContext, args: StepArgs) -> Result<()> {
    let expected = args.values[0].as_str().to_string();
    ctx.home_page()
        .element(SEARCH_INPUT)
        .should_have_attr("placeholder", &expected)
        .await?;
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

async fn assert_title_contains(ctx: &mut StepContext, args: StepArgs) -> Result<()> {
    let fragment = args.values[0].as_str().to_string();
    ctx.home_page()
        .should_have_title_containing(&fragment)
        .await?;
    Ok(())
}

async fn assert_field_value(ctx: &mut StepContext, args: StepArgs) -> Result<()> {
    let selector = args.values[0].as_str().to_string();
    let expected = args.values[1].as_str().to_string();
    ctx.home_page()
        .element(&selector)
        .should_have_value(&expected)
        .await?;
    Ok(())
}
