//! Submodels for the DICE integrated assessment model
//!
//! This crate provides one component per submodel family. Each component is
//! constructed from [`ModelParameters`](webdice_core::parameters::ModelParameters)
//! and dispatches on the variant selected in the parameters.
//!
//! # Module Organisation
//!
//! Components are organised by family, in the order a period is stepped:
//! - `productivity`: population, total factor productivity, capital and gross output
//! - `emissions`: control rate, industrial and total emissions, fossil budget
//! - `carbon`: carbon reservoirs and radiative forcing
//! - `temperature`: atmosphere and lower ocean temperature
//! - `damages`: climate damages, abatement cost and net output
//! - `consumption`: consumption, investment and consumption discounting
//! - `utility`: period utility and discounted utility

pub mod carbon;
pub mod constants;
pub mod consumption;
pub mod damages;
pub mod emissions;
pub mod productivity;
pub mod temperature;
pub mod utility;

pub use carbon::CarbonComponent;
pub use consumption::ConsumptionComponent;
pub use damages::DamagesComponent;
pub use emissions::EmissionsComponent;
pub use productivity::ProductivityComponent;
pub use temperature::TemperatureComponent;
pub use utility::UtilityComponent;
