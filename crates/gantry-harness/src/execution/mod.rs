pub mod runner;

pub use runner::{ContextFactory, ScenarioRunner};
