pub mod parser;

pub use parser::{Background, DataTable, Feature, Parser, Scenario, Step, StepKeyword};

use crate::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// All `.feature` files under `root` (or `root` itself when it is a file),
/// sorted for a stable run order.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "feature")
        })
        .map(|entry| entry.into_path())
        .collect();
    found.sort();
    Ok(found)
}
