use crate::config::RunConfig;
use gantry_session::{InterceptionLedger, Page, Session, WaitSettings};
use std::sync::Arc;

/// Everything a step handler may touch: the run configuration, the browser
/// session, and the session's interception ledger. One context exists per
/// scenario attempt; retries get a fresh one so nothing leaks between
/// attempts.
pub struct StepContext {
    pub config: RunConfig,
    pub session: Arc<dyn Session>,
    pub ledger: Arc<InterceptionLedger>,
}

impl StepContext {
    pub fn new(
        config: RunConfig,
        session: Arc<dyn Session>,
        ledger: Arc<InterceptionLedger>,
    ) -> Self {
        Self {
            config,
            session,
            ledger,
        }
    }

    pub fn wait_settings(&self) -> WaitSettings {
        WaitSettings::with_timeout(self.config.command_timeout())
    }

    /// Page object for a path fragment under the configured base URL.
    pub fn page(&self, path: &str) -> Page {
        Page::new(
            Arc::clone(&self.session),
            self.config.url_for(path),
            self.wait_settings(),
        )
    }

    pub fn home_page(&self) -> Page {
        self.page("/")
    }
}
