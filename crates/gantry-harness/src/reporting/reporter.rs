use crate::reporting::report::RunReport;
use crate::{HarnessError, Result};
use handlebars::{handlebars_helper, Handlebars};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Junit,
    Markdown,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "junit" | "xml" => Ok(OutputFormat::Junit),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            other => Err(HarnessError::Reporting(format!(
                "unknown report format {other:?} (expected junit, markdown, or json)"
            ))),
        }
    }
}

handlebars_helper!(secs: |ms: u64| format!("{:.3}", ms as f64 / 1000.0));

/// Renders a [`RunReport`] in the configured format. Templates are
/// compiled once at construction.
pub struct RunReporter {
    template_engine: Handlebars<'static>,
    output_format: OutputFormat,
}

impl RunReporter {
    pub fn new(output_format: OutputFormat) -> Result<Self> {
        let mut template_engine = Handlebars::new();
        template_engine.register_helper("secs", Box::new(secs));

        template_engine
            .register_template_string("junit", include_str!("../../templates/report_junit.hbs"))
            .map_err(|e| HarnessError::Reporting(format!("junit template: {e}")))?;

        template_engine
            .register_template_string(
                "markdown",
                include_str!("../../templates/report_markdown.hbs"),
            )
            .map_err(|e| HarnessError::Reporting(format!("markdown template: {e}")))?;

        Ok(Self {
            template_engine,
            output_format,
        })
    }

    pub fn generate(&self, report: &RunReport) -> Result<String> {
        match self.output_format {
            OutputFormat::Junit => self
                .template_engine
                .render("junit", report)
                .map_err(|e| HarnessError::Reporting(format!("junit render: {e}"))),
            OutputFormat::Markdown => self
                .template_engine
                .render("markdown", report)
                .map_err(|e| HarnessError::Reporting(format!("markdown render: {e}"))),
            OutputFormat::Json => serde_json::to_string_pretty(report)
                .map_err(|e| HarnessError::Reporting(format!("json render: {e}"))),
        }
    }

    /// Report file name under the configured reports directory.
    pub fn file_name(&self) -> &'static str {
        match self.output_format {
            OutputFormat::Junit => "gantry-test-results.xml",
            OutputFormat::Markdown => "gantry-test-results.md",
            OutputFormat::Json => "gantry-test-results.json",
        }
    }
}
