use crate::element::{ElementHandle, WaitSettings};
use crate::session::Session;
use crate::{Result, SessionError};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;

/// Stateless façade over one screen: a URL plus named lookups. Holds no
/// element state of its own; every method delegates to the session.
pub struct Page {
    session: Arc<dyn Session>,
    url: String,
    wait: WaitSettings,
}

impl Page {
    pub fn new(session: Arc<dyn Session>, url: impl Into<String>, wait: WaitSettings) -> Self {
        Self {
            session,
            url: url.into(),
            wait,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Navigate the session to this page. Safe to call repeatedly;
    /// navigation errors propagate.
    pub async fn visit(&self) -> Result<()> {
        tracing::debug!(url = %self.url, "visiting page");
        self.session.visit(&self.url).await
    }

    /// Current document title.
    pub async fn title(&self) -> Result<String> {
        self.session.title().await
    }

    /// Lazy element handle; no lookup happens until an assertion runs.
    pub fn element(&self, selector: &str) -> ElementHandle {
        ElementHandle::new(Arc::clone(&self.session), selector, self.wait)
    }

    /// Assert the document title contains `fragment`, polling until the
    /// command deadline.
    pub async fn should_have_title_containing(&self, fragment: &str) -> Result<()> {
        let deadline = Instant::now() + self.wait.timeout;
        loop {
            let title = self.session.title().await?;
            if title.contains(fragment) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SessionError::Assertion {
                    expected: format!("title to contain {fragment:?}"),
                    actual: format!("title {title:?}"),
                });
            }
            sleep(self.wait.poll_interval).await;
        }
    }
}
