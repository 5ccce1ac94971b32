//! Run state handed over by the pipeline runner.
//!
//! Read for visibility only: reports always cover `start_date` to now + 1
//! day, so no bookmark is applied and nothing is written back.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct State(Map<String, Value>);

impl State {
    /// Load from `path`, or an empty state when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;
        let map: Map<String, Value> = serde_json::from_str(&content)
            .with_context(|| format!("State file is not a JSON object: {}", path.display()))?;
        log::debug!("Loaded state from {} ({} keys)", path.display(), map.len());
        Ok(Self(map))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
