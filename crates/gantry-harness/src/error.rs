use gantry_session::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("feature parse error: {0}")]
    FeatureParse(String),

    #[error("undefined step: no binding matches {0:?}")]
    UndefinedStep(String),

    #[error("ambiguous step: {text:?} matches {patterns:?}")]
    AmbiguousStep { text: String, patterns: Vec<String> },

    #[error("step pattern {new:?} overlaps already-registered {existing:?}")]
    PatternOverlap { new: String, existing: String },

    #[error("invalid step pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("missing column {column:?} in table row {row}")]
    MissingColumn { column: String, row: usize },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("reporting error: {0}")]
    Reporting(String),

    #[error("execution error: {0}")]
    Execution(String),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
