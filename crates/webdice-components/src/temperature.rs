//! Temperature component
//!
//! The two-box variant is a discrete energy balance between the atmosphere and
//! the lower ocean:
//!
//! $$ T_{AT}(t) = T_{AT}(t-1) + c_1 \left( F(t) - \frac{F_{2x}}{T_{2x}} T_{AT}(t-1) - c_3 (T_{AT}(t-1) - T_{LO}(t-1)) \right) $$
//! $$ T_{LO}(t) = T_{LO}(t-1) + c_4 (T_{AT}(t-1) - T_{LO}(t-1)) $$
//!
//! The linear variant maps cumulative emissions directly to atmosphere
//! temperature and holds the lower ocean at its initial temperature.

use serde::{Deserialize, Serialize};
use webdice_core::parameters::ModelParameters;
use webdice_core::state::{FloatValue, StateTable, Variable};
use webdice_core::submodel::{TemperatureModel, TemperatureValues};
use webdice_core::variants::TemperatureVariant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureComponent {
    variant: TemperatureVariant,
    parameters: ModelParameters,
}

impl TemperatureComponent {
    pub fn from_parameters(parameters: &ModelParameters) -> Self {
        Self {
            variant: parameters.temperature_model,
            parameters: parameters.clone(),
        }
    }

    /// Warming (degC) per GtC of cumulative emissions in the linear variant.
    pub fn warming_per_carbon(&self) -> FloatValue {
        let p = &self.parameters;
        let doubling = 2.0 * p.mass_preindustrial
            + (2.0 * p.mass_preindustrial
                - p.mass_atmosphere_init * p.carbon_matrix[0][0]
                - p.mass_upper_init * p.carbon_matrix[1][0]);
        p.temp_co2_doubling / (doubling * 1e-3) * 1e-3
    }
}

impl TemperatureModel for TemperatureComponent {
    fn get_model_values(&self, period: usize, state: &StateTable) -> TemperatureValues {
        let p = &self.parameters;
        if period == 0 {
            return TemperatureValues {
                temp_atmosphere: p.temp_atmosphere_init,
                temp_lower: p.temp_lower_init,
            };
        }

        match self.variant {
            TemperatureVariant::TwoBox => {
                let atmosphere = state.get(Variable::TempAtmosphere, period - 1);
                let lower = state.get(Variable::TempLower, period - 1);
                let forcing = state.get(Variable::Forcing, period);
                TemperatureValues {
                    temp_atmosphere: atmosphere
                        + p.c1
                            * (forcing
                                - (p.forcing_co2_doubling / p.temp_co2_doubling) * atmosphere
                                - p.c3 * (atmosphere - lower)),
                    temp_lower: lower + p.c4 * (atmosphere - lower),
                }
            }
            TemperatureVariant::Linear => TemperatureValues {
                temp_atmosphere: p.temp_atmosphere_init
                    + state.get(Variable::CarbonEmitted, period - 1) * self.warming_per_carbon(),
                temp_lower: p.temp_lower_init,
            },
        }
    }
}
