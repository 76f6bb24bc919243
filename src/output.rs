//! Flat serialisable output of a scenario run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use webdice_core::errors::DiceResult;
use webdice_core::parameters::ModelParameters;
use webdice_core::state::{FloatValue, StateTable};

/// A single output entry: either a time series or a scalar parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputValue {
    Series(Vec<FloatValue>),
    Scalar(FloatValue),
}

/// Variable name → time series and user-visible parameter name → value.
///
/// Calendar years of the periods are included as the `year` series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioOutput {
    entries: BTreeMap<String, OutputValue>,
}

impl ScenarioOutput {
    pub fn new(parameters: &ModelParameters, state: &StateTable) -> Self {
        let mut entries: BTreeMap<String, OutputValue> = state
            .to_map()
            .into_iter()
            .map(|(name, series)| (name, OutputValue::Series(series)))
            .collect();

        let years = (0..state.n_periods()).map(|t| parameters.year(t)).collect();
        entries.insert("year".to_string(), OutputValue::Series(years));

        for (name, value) in parameters.user_parameters() {
            entries.insert(name, OutputValue::Scalar(value));
        }
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&OutputValue> {
        self.entries.get(name)
    }

    pub fn series(&self, name: &str) -> Option<&[FloatValue]> {
        match self.entries.get(name) {
            Some(OutputValue::Series(values)) => Some(values),
            _ => None,
        }
    }

    pub fn scalar(&self, name: &str) -> Option<FloatValue> {
        match self.entries.get(name) {
            Some(OutputValue::Scalar(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn to_json(&self, pretty: bool) -> DiceResult<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}
