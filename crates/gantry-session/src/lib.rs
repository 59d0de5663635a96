mod element;
pub mod intercept;
mod page;
mod scripted;
mod session;

pub use element::{ElementHandle, WaitSettings};
pub use intercept::{Exchange, InterceptionLedger, RouteMatcher};
pub use page::Page;
pub use scripted::{ClickRoute, ElementFixture, PageFixture, ScriptedSession, SiteFixture};
pub use session::{ElementSnapshot, Session};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("no element matched selector {0:?}")]
    ElementNotFound(String),

    #[error("assertion failed: expected {expected}, got {actual}")]
    Assertion { expected: String, actual: String },

    #[error("no matching exchange observed for alias {alias:?} after {elapsed_ms}ms")]
    InterceptTimeout { alias: String, elapsed_ms: u64 },

    #[error("alias {0:?} is already registered")]
    DuplicateAlias(String),

    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidRoutePattern { pattern: String, reason: String },

    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
