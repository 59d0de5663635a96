use crate::session::{ElementSnapshot, Session};
use crate::{Result, SessionError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// How long assertions keep re-querying before giving up, and how often.
#[derive(Debug, Clone, Copy)]
pub struct WaitSettings {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(4000),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl WaitSettings {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Lazy handle to an element. Creating one performs no lookup; each
/// assertion resolves the selector fresh and polls until the deadline,
/// so a handle taken before a DOM mutation still sees the mutation.
pub struct ElementHandle {
    session: Arc<dyn Session>,
    selector: String,
    wait: WaitSettings,
}

impl ElementHandle {
    pub(crate) fn new(
        session: Arc<dyn Session>,
        selector: impl Into<String>,
        wait: WaitSettings,
    ) -> Self {
        Self {
            session,
            selector: selector.into(),
            wait,
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Assert the element exists, yielding its current snapshot.
    pub async fn should_exist(&self) -> Result<ElementSnapshot> {
        self.poll(
            format!("an element matching {:?}", self.selector),
            |el| el.cloned(),
            |el| format!("{} element(s)", if el.is_some() { 1 } else { 0 }),
        )
        .await
    }

    /// Assert attribute `name` equals `expected` exactly. Case-sensitive,
    /// no trimming.
    pub async fn should_have_attr(&self, name: &str, expected: &str) -> Result<()> {
        self.poll(
            format!("{} to have {}={:?}", self.selector, name, expected),
            |el| {
                el.and_then(|el| el.attr(name))
                    .filter(|actual| *actual == expected)
                    .map(|_| ())
            },
            |el| match el.and_then(|el| el.attr(name)) {
                Some(actual) => format!("{name}={actual:?}"),
                None => match el {
                    Some(_) => format!("no {name} attribute"),
                    None => "no element".to_string(),
                },
            },
        )
        .await
    }

    /// Assert the element's `value` attribute equals `expected`.
    pub async fn should_have_value(&self, expected: &str) -> Result<()> {
        self.should_have_attr("value", expected).await
    }

    /// Assert the element's text content contains `fragment`.
    pub async fn should_contain_text(&self, fragment: &str) -> Result<()> {
        self.poll(
            format!("{} text to contain {:?}", self.selector, fragment),
            |el| el.filter(|el| el.text.contains(fragment)).map(|_| ()),
            |el| match el {
                Some(el) => format!("text {:?}", el.text),
                None => "no element".to_string(),
            },
        )
        .await
    }

    /// Re-query until `accept` passes or the deadline does. The last-seen
    /// state feeds `describe_actual` so the failure reports what was
    /// actually on screen.
    async fn poll<T>(
        &self,
        expected: String,
        accept: impl Fn(Option<&ElementSnapshot>) -> Option<T>,
        describe_actual: impl Fn(Option<&ElementSnapshot>) -> String,
    ) -> Result<T> {
        let deadline = Instant::now() + self.wait.timeout;
        loop {
            let found = self.session.query(&self.selector).await?;
            if let Some(value) = accept(found.as_ref()) {
                return Ok(value);
            }
            if Instant::now() >= deadline {
                return Err(SessionError::Assertion {
                    expected,
                    actual: describe_actual(found.as_ref()),
                });
            }
            sleep(self.wait.poll_interval).await;
        }
    }
}
