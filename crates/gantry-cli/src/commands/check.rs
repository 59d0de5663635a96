use crate::steps;
use gantry_harness::binding::StepCategory;
use gantry_harness::gherkin::{self, Parser, Step};
use std::path::PathBuf;

/// Resolve every step in every feature against the built-in registry
/// without executing anything. Catches undefined and ambiguous steps
/// before a run is attempted.
pub fn execute(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let path = args
        .first()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("features"));

    let feature_paths = gherkin::discover(&path)?;
    if feature_paths.is_empty() {
        return Err(format!("no feature files under {}", path.display()).into());
    }

    let registry = steps::builtin_registry()?;
    let mut problems = Vec::new();
    let mut checked = 0usize;

    for feature_path in &feature_paths {
        let feature = Parser::parse_feature_file(feature_path)?;
        let background_steps: &[Step] = feature
            .background
            .as_ref()
            .map(|b| b.steps.as_slice())
            .unwrap_or(&[]);

        for scenario in &feature.scenarios {
            let mut previous: Option<StepCategory> = None;
            for step in background_steps.iter().chain(&scenario.steps) {
                checked += 1;
                let Some(category) = StepCategory::resolve(step.keyword, previous) else {
                    problems.push(format!(
                        "{}: {}: leading {} has no preceding Given/When/Then",
                        feature_path.display(),
                        scenario.name,
                        step.keyword
                    ));
                    continue;
                };
                previous = Some(category);
                if let Err(e) = registry.resolve(category, &step.text) {
                    problems.push(format!(
                        "{}: {}: {e}",
                        feature_path.display(),
                        scenario.name
                    ));
                }
            }
        }
    }

    if problems.is_empty() {
        println!(
            "Checked {checked} steps across {} feature file(s); every step is bound.",
            feature_paths.len()
        );
        Ok(())
    } else {
        for problem in &problems {
            eprintln!("{problem}");
        }
        Err(format!("{} unbound step(s)", problems.len()).into())
    }
}
