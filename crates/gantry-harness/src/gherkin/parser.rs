use crate::{HarnessError, Result};
use gherkin::{Feature as GherkinFeature, GherkinEnv, ParseFileError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub description: Option<String>,
    pub background: Option<Background>,
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Background {
    pub name: Option<String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub tags: Vec<String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub keyword: StepKeyword,
    pub text: String,
    pub data_table: Option<DataTable>,
    pub doc_string: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StepKeyword {
    Given,
    When,
    Then,
    And,
    But,
}

impl StepKeyword {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Given" => Some(StepKeyword::Given),
            "When" => Some(StepKeyword::When),
            "Then" => Some(StepKeyword::Then),
            "And" => Some(StepKeyword::And),
            "But" => Some(StepKeyword::But),
            _ => None,
        }
    }
}

impl std::fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepKeyword::Given => write!(f, "Given"),
            StepKeyword::When => write!(f, "When"),
            StepKeyword::Then => write!(f, "Then"),
            StepKeyword::And => write!(f, "And"),
            StepKeyword::But => write!(f, "But"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Rows as ordered name->value mappings keyed by the header. A row with
    /// more cells than the header has is truncated to the named columns.
    pub fn row_maps(&self) -> Vec<HashMap<String, String>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row.iter())
                    .map(|(h, v)| (h.clone(), v.clone()))
                    .collect()
            })
            .collect()
    }

    /// Check every row carries each required column, reporting the first
    /// violation against its zero-based row index.
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        let mut positions = Vec::with_capacity(required.len());
        for column in required {
            match self.headers.iter().position(|h| h == column) {
                Some(position) => positions.push((*column, position)),
                None => {
                    return Err(HarnessError::MissingColumn {
                        column: column.to_string(),
                        row: 0,
                    })
                }
            }
        }
        for (index, row) in self.rows.iter().enumerate() {
            for (column, position) in &positions {
                if row.get(*position).is_none() {
                    return Err(HarnessError::MissingColumn {
                        column: column.to_string(),
                        row: index,
                    });
                }
            }
        }
        Ok(())
    }
}

pub struct Parser;

impl Parser {
    pub fn parse_feature_file(path: &Path) -> Result<Feature> {
        let env = GherkinEnv::default();
        let parsed = GherkinFeature::parse_path(path, env).map_err(|e| match e {
            ParseFileError::Reading { path: _, source } => HarnessError::Io(source),
            ParseFileError::Parsing { path, .. } => {
                HarnessError::FeatureParse(format!("parse error in {}", path.display()))
            }
        })?;
        Ok(Self::convert_feature(&parsed))
    }

    pub fn parse_feature(content: &str) -> Result<Feature> {
        let env = GherkinEnv::default();
        let parsed = GherkinFeature::parse(content, env)
            .map_err(|e| HarnessError::FeatureParse(e.to_string()))?;
        Ok(Self::convert_feature(&parsed))
    }

    fn convert_feature(feature: &GherkinFeature) -> Feature {
        let background = feature.background.as_ref().map(|bg| Background {
            name: if bg.name.is_empty() {
                None
            } else {
                Some(bg.name.clone())
            },
            steps: bg.steps.iter().map(Self::convert_step).collect(),
        });

        let scenarios = feature
            .scenarios
            .iter()
            .map(|scenario| Scenario {
                name: scenario.name.clone(),
                tags: scenario.tags.to_vec(),
                steps: scenario.steps.iter().map(Self::convert_step).collect(),
            })
            .collect();

        Feature {
            name: feature.name.clone(),
            description: feature.description.clone(),
            background,
            scenarios,
        }
    }

    fn convert_step(step: &gherkin::Step) -> Step {
        Step {
            keyword: StepKeyword::parse(&step.keyword).unwrap_or(StepKeyword::Given),
            text: step.value.clone(),
            data_table: step.table.as_ref().map(|table| {
                let headers = table
                    .rows
                    .first()
                    .map(|row| row.to_vec())
                    .unwrap_or_default();
                let rows = table.rows.iter().skip(1).map(|row| row.to_vec()).collect();
                DataTable { headers, rows }
            }),
            doc_string: step.docstring.clone(),
        }
    }
}
