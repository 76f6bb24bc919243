//! Scenario files.
//!
//! A scenario file is TOML with optional top-level run switches and a
//! `[parameters]` table that maps onto the flat parameter configuration:
//!
//! ```toml
//! optimize = true
//! scc = true
//!
//! [parameters]
//! preset = "dice_2010"
//! damages_model = "tipping_point"
//! elasmu = 1.5
//! ```

use crate::model::{RunOptions, Scenario};
use serde::{Deserialize, Serialize};
use std::path::Path;
use webdice_core::errors::DiceResult;
use webdice_core::parameters::ParameterMap;

/// Contents of a scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioFile {
    /// Search for the welfare maximising control path
    pub optimize: bool,
    /// Compute the social cost of carbon
    pub scc: bool,
    pub parameters: ParameterMap,
}

impl Default for ScenarioFile {
    fn default() -> Self {
        let options = RunOptions::default();
        Self {
            optimize: options.optimize,
            scc: options.scc,
            parameters: ParameterMap::new(),
        }
    }
}

impl ScenarioFile {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            optimize: self.optimize,
            scc: self.scc,
        }
    }

    pub fn scenario(&self) -> DiceResult<Scenario> {
        Scenario::from_config(&self.parameters)
    }
}

/// Parse a scenario from TOML text.
pub fn parse_scenario(contents: &str) -> DiceResult<ScenarioFile> {
    Ok(toml::from_str(contents)?)
}

/// Read and parse a scenario file.
pub fn load_scenario_file<P: AsRef<Path>>(path: P) -> DiceResult<ScenarioFile> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "loading scenario file");
    let contents = std::fs::read_to_string(path)?;
    parse_scenario(&contents)
}
