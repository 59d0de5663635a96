use crate::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Run configuration, consumed by the runner and bindings but never
/// mutated by them. Loaded from `gantry.json` with `GANTRY_*` environment
/// overrides on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub base_url: String,
    /// Named route fragments, e.g. `login` -> `/login`.
    pub routes: HashMap<String, String>,
    pub retries: RetrySettings,
    pub viewport: Viewport,
    pub command_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub reports_dir: PathBuf,
    pub screenshots_dir: PathBuf,
    pub videos_dir: PathBuf,
    pub trash_artifacts_before_run: bool,
    pub screenshot_on_run_failure: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub run_mode: u32,
    pub open_mode: u32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            run_mode: 2,
            open_mode: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 760,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4200".to_string(),
            routes: HashMap::from([
                ("login".to_string(), "/login".to_string()),
                ("products".to_string(), "/products".to_string()),
            ]),
            retries: RetrySettings::default(),
            viewport: Viewport::default(),
            command_timeout_ms: 4000,
            request_timeout_ms: 5000,
            reports_dir: PathBuf::from("reporter"),
            screenshots_dir: PathBuf::from("artifacts/screenshots"),
            videos_dir: PathBuf::from("artifacts/videos"),
            trash_artifacts_before_run: true,
            screenshot_on_run_failure: false,
        }
    }
}

impl RunConfig {
    pub const DEFAULT_FILE: &'static str = "gantry.json";

    /// Load from `path` when given, from [`Self::DEFAULT_FILE`] when it
    /// exists, defaults otherwise. Environment overrides apply last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(Self::DEFAULT_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| HarnessError::Config(format!("{}: {e}", path.display())))
    }

    fn apply_env(&mut self) {
        if let Ok(base_url) = std::env::var("GANTRY_BASE_URL") {
            self.base_url = base_url;
        }
        if let Ok(retries) = std::env::var("GANTRY_RETRIES") {
            if let Ok(count) = retries.parse() {
                self.retries.run_mode = count;
            }
        }
        if let Ok(dir) = std::env::var("GANTRY_REPORTS_DIR") {
            self.reports_dir = PathBuf::from(dir);
        }
    }

    pub fn route(&self, name: &str) -> Option<&str> {
        self.routes.get(name).map(String::as_str)
    }

    /// Full URL for a path fragment, e.g. `/login`.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.is_empty() || path == "/" {
            format!("{base}/")
        } else if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    pub fn retry_count(&self, open_mode: bool) -> u32 {
        if open_mode {
            self.retries.open_mode
        } else {
            self.retries.run_mode
        }
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
