use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snapshot of a single DOM element at the moment a selector query resolved.
///
/// Handles never cache these across calls; every assertion queries the
/// session again because the document may have changed in between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub selector: String,
    pub tag: String,
    pub text: String,
    pub attributes: HashMap<String, String>,
}

impl ElementSnapshot {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The element's `value` attribute, or empty when unset.
    pub fn value(&self) -> &str {
        self.attr("value").unwrap_or_default()
    }
}

/// The boundary between the harness and whatever actually drives a browser.
///
/// One session is owned by exactly one scenario attempt. Implementations
/// hold the per-session state (current document, pending network activity)
/// themselves; callers always pass the session explicitly rather than
/// reaching for ambient globals.
#[async_trait]
pub trait Session: Send + Sync {
    /// Navigate to `url`. Fails with [`crate::SessionError::Navigation`]
    /// when the target is unreachable.
    async fn visit(&self, url: &str) -> Result<()>;

    /// Current document title.
    async fn title(&self) -> Result<String>;

    /// First element matching `selector`, or `None`. Absence is not an
    /// error here; assertions decide what absence means.
    async fn query(&self, selector: &str) -> Result<Option<ElementSnapshot>>;

    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Type `text` into the first element matching `selector`.
    async fn type_text(&self, selector: &str, text: &str) -> Result<()>;

    /// Render a failure artifact for the current document state.
    async fn screenshot(&self) -> Result<Vec<u8>>;
}
