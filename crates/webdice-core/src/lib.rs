//! Core types for the DICE integrated assessment model.
//!
//! This crate holds everything the submodels share: parameters and presets,
//! the state table, the submodel interfaces and the exogenous schedules.
//! Concrete submodels live in `webdice-components`.

pub mod errors;
pub mod parameters;
pub mod schedules;
pub mod state;
pub mod submodel;
pub mod variants;
