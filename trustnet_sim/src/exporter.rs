//! JSON exporter for offline analysis.
//!
//! Exports finished runs (configuration, counters, ratios and, when
//! recorded, per-message traces) as a single pretty-printed document.

use crate::runner::RunResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// Complete simulation export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunExport {
    /// Tool that produced the file
    pub tool: String,

    /// Tool version
    pub version: String,

    /// Every run, in execution order
    pub runs: Vec<RunResult>,
}

impl RunExport {
    /// Creates a new export container.
    pub fn new() -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            runs: Vec::new(),
        }
    }

    /// Adds a finished run.
    pub fn add_run(&mut self, run: RunResult) {
        self.runs.push(run);
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

impl Default for RunExport {
    fn default() -> Self {
        Self::new()
    }
}
