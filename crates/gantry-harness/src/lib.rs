pub mod binding;
pub mod config;
mod error;
pub mod execution;
pub mod gherkin;
pub mod reporting;

pub use error::{HarnessError, Result};
