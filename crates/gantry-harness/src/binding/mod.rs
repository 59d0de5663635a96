pub mod context;
pub mod pattern;
pub mod registry;

pub use context::StepContext;
pub use pattern::{PlaceholderKind, StepArg, StepPattern};
pub use registry::{ResolvedStep, StepArgs, StepCategory, StepHandler, StepRegistry};
