//! DICE integrated assessment model.
//!
//! Simulates the coupled economy and climate over a multi-century horizon,
//! searches for the welfare maximising emissions control path, and computes the
//! social cost of carbon.
//!
//! # Usage
//!
//! ```no_run
//! use webdice::model::Scenario;
//! use webdice::parameters::{ParameterMap, ParameterValue};
//!
//! let mut config = ParameterMap::new();
//! config.insert("preset".into(), ParameterValue::from("dice_2010"));
//! config.insert("elasmu".into(), ParameterValue::from(1.5));
//!
//! let scenario = Scenario::from_config(&config)?;
//! let state = scenario.run(false)?;
//! let output = scenario.output(&state);
//! println!("{}", output.to_json(true)?);
//! # Ok::<(), webdice::errors::DiceError>(())
//! ```

pub mod config;
pub mod model;
pub mod optimizer;
pub mod output;
pub mod scc;

pub use webdice_components as components;
pub use webdice_core::{errors, parameters, schedules, state, submodel, variants};
