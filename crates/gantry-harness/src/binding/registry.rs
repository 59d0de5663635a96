use crate::binding::context::StepContext;
use crate::binding::pattern::{StepArg, StepPattern};
use crate::gherkin::{DataTable, StepKeyword};
use crate::{HarnessError, Result};
use futures::future::BoxFuture;
use std::sync::Arc;

/// Grammatical category a binding belongs to. `And`/`But` lines resolve
/// against the nearest preceding primary keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepCategory {
    Given,
    When,
    Then,
}

impl StepCategory {
    /// Category for a step keyword, given the category of the previous
    /// step in the scenario. `None` for a leading `And`/`But`.
    pub fn resolve(keyword: StepKeyword, previous: Option<StepCategory>) -> Option<StepCategory> {
        match keyword {
            StepKeyword::Given => Some(StepCategory::Given),
            StepKeyword::When => Some(StepCategory::When),
            StepKeyword::Then => Some(StepCategory::Then),
            StepKeyword::And | StepKeyword::But => previous,
        }
    }
}

impl std::fmt::Display for StepCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepCategory::Given => write!(f, "Given"),
            StepCategory::When => write!(f, "When"),
            StepCategory::Then => write!(f, "Then"),
        }
    }
}

/// Arguments handed to a handler: extracted placeholder values in declared
/// order, plus the step's data table and doc string when present.
pub struct StepArgs {
    pub values: Vec<StepArg>,
    pub table: Option<DataTable>,
    pub doc_string: Option<String>,
}

impl StepArgs {
    pub fn table(&self) -> Result<&DataTable> {
        self.table
            .as_ref()
            .ok_or_else(|| HarnessError::Execution("step requires a data table".to_string()))
    }
}

pub type StepHandler =
    Arc<dyn for<'a> Fn(&'a mut StepContext, StepArgs) -> BoxFuture<'a, Result<()>> + Send + Sync>;

struct Binding {
    pattern: StepPattern,
    handler: StepHandler,
}

/// A step resolved against the registry, ready to execute.
pub struct ResolvedStep {
    pub pattern: String,
    pub values: Vec<StepArg>,
    pub handler: StepHandler,
}

impl std::fmt::Debug for ResolvedStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedStep")
            .field("pattern", &self.pattern)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

/// Static table of (compiled pattern, handler) pairs, built once at
/// startup. Registration rejects overlapping patterns so resolution is
/// unambiguous by construction.
#[derive(Default)]
pub struct StepRegistry {
    given: Vec<Binding>,
    when: Vec<Binding>,
    then: Vec<Binding>,
}

impl std::fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRegistry")
            .field("given", &self.given.len())
            .field("when", &self.when.len())
            .field("then", &self.then.len())
            .finish()
    }
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn given<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self>
    where
        F: for<'a> Fn(&'a mut StepContext, StepArgs) -> BoxFuture<'a, Result<()>>
            + Send
            + Sync
            + 'static,
    {
        self.register(StepCategory::Given, pattern, Arc::new(handler))
    }

    pub fn when<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self>
    where
        F: for<'a> Fn(&'a mut StepContext, StepArgs) -> BoxFuture<'a, Result<()>>
            + Send
            + Sync
            + 'static,
    {
        self.register(StepCategory::When, pattern, Arc::new(handler))
    }

    pub fn then<F>(&mut self, pattern: &str, handler: F) -> Result<&mut Self>
    where
        F: for<'a> Fn(&'a mut StepContext, StepArgs) -> BoxFuture<'a, Result<()>>
            + Send
            + Sync
            + 'static,
    {
        self.register(StepCategory::Then, pattern, Arc::new(handler))
    }

    fn register(
        &mut self,
        category: StepCategory,
        pattern: &str,
        handler: StepHandler,
    ) -> Result<&mut Self> {
        let compiled = StepPattern::compile(pattern)?;
        let bindings = self.bindings(category);
        if let Some(existing) = bindings.iter().find(|b| b.pattern.overlaps(&compiled)) {
            return Err(HarnessError::PatternOverlap {
                new: pattern.to_string(),
                existing: existing.pattern.source().to_string(),
            });
        }
        tracing::debug!(%category, pattern, "registered step binding");
        self.bindings(category).push(Binding {
            pattern: compiled,
            handler,
        });
        Ok(self)
    }

    fn bindings(&mut self, category: StepCategory) -> &mut Vec<Binding> {
        match category {
            StepCategory::Given => &mut self.given,
            StepCategory::When => &mut self.when,
            StepCategory::Then => &mut self.then,
        }
    }

    fn bindings_ref(&self, category: StepCategory) -> &[Binding] {
        match category {
            StepCategory::Given => &self.given,
            StepCategory::When => &self.when,
            StepCategory::Then => &self.then,
        }
    }

    /// Find the single binding matching `text`. Zero matches is an
    /// undefined step; more than one is ambiguous. Either way the caller
    /// fails the scenario before running any handler.
    pub fn resolve(&self, category: StepCategory, text: &str) -> Result<ResolvedStep> {
        let mut matches = Vec::new();
        for binding in self.bindings_ref(category) {
            if let Some(values) = binding.pattern.try_match(text) {
                matches.push((binding, values));
            }
        }
        if matches.len() > 1 {
            return Err(HarnessError::AmbiguousStep {
                text: text.to_string(),
                patterns: matches
                    .iter()
                    .map(|(b, _)| b.pattern.source().to_string())
                    .collect(),
            });
        }
        match matches.pop() {
            Some((binding, values)) => Ok(ResolvedStep {
                pattern: binding.pattern.source().to_string(),
                values,
                handler: Arc::clone(&binding.handler),
            }),
            None => Err(HarnessError::UndefinedStep(text.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::pattern::StepArg;

    async fn pass(_ctx: &mut StepContext, _args: StepArgs) -> Result<()> {
        Ok(())
    }

    fn noop() -> impl for<'a> Fn(&'a mut StepContext, StepArgs) -> BoxFuture<'a, Result<()>>
    + Send
    + Sync
    + 'static {
        |ctx, args| Box::pin(pass(ctx, args))
    }

    #[test]
    fn resolution_extracts_typed_arguments() {
        let mut registry = StepRegistry::new();
        registry
            .then("the {string} exchange responds with status {int}", noop())
            .expect("register");

        let resolved = registry
            .resolve(
                StepCategory::Then,
                r#"the "getComments" exchange responds with status 200"#,
            )
            .expect("resolve");
        assert_eq!(
            resolved.values,
            vec![StepArg::Str("getComments".to_string()), StepArg::Int(200)]
        );
    }

    #[test]
    fn unmatched_step_is_undefined() {
        let registry = StepRegistry::new();
        let err = registry
            .resolve(StepCategory::When, "I do something unheard of")
            .expect_err("undefined");
        assert!(matches!(err, HarnessError::UndefinedStep(_)));
    }

    #[test]
    fn overlapping_registration_is_rejected_up_front() {
        let mut registry = StepRegistry::new();
        registry.when("I visit {string}", noop()).expect("first");
        let err = registry
            .when("I visit {string}", noop())
            .expect_err("duplicate");
        match err {
            HarnessError::PatternOverlap { new, existing } => {
                assert_eq!(new, existing);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn same_pattern_in_different_categories_is_allowed() {
        let mut registry = StepRegistry::new();
        registry.given("the page is open", noop()).expect("given");
        registry.then("the page is open", noop()).expect("then");
    }

    #[test]
    fn and_inherits_the_previous_primary_keyword() {
        assert_eq!(
            StepCategory::resolve(StepKeyword::And, Some(StepCategory::Given)),
            Some(StepCategory::Given)
        );
        assert_eq!(
            StepCategory::resolve(StepKeyword::Then, Some(StepCategory::Given)),
            Some(StepCategory::Then)
        );
        assert_eq!(StepCategory::resolve(StepKeyword::But, None), None);
    }
}
