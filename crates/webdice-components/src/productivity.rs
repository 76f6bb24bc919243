//! Productivity component
//!
//! Computes population, carbon intensity, total factor productivity (TFP),
//! capital and gross output from a Cobb-Douglas production function
//!
//! $$ Y = A K^\gamma L^{1-\gamma} $$
//!
//! along with the backstop price that scales abatement costs.
//!
//! The DICE2007 variant drives intensity and TFP growth with exponential decline
//! curves in time. The DICE2010 and DICE2013 variants use recurrences on the
//! previous period instead.

use crate::constants::{CARBON_PER_CO2, CO2_PER_CARBON, PRODUCTIVITY_GROWTH_DAMPING};
use serde::{Deserialize, Serialize};
use webdice_core::parameters::ModelParameters;
use webdice_core::state::{FloatValue, StateTable, Variable};
use webdice_core::submodel::{ProductivityModel, ProductivityValues};
use webdice_core::variants::ProductivityVariant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductivityComponent {
    variant: ProductivityVariant,
    parameters: ModelParameters,
}

impl ProductivityComponent {
    pub fn from_parameters(parameters: &ModelParameters) -> Self {
        Self {
            variant: parameters.productivity_model,
            parameters: parameters.clone(),
        }
    }

    pub fn variant(&self) -> ProductivityVariant {
        self.variant
    }

    /// Backstop price (thousand USD per tC) at `period`.
    pub fn backstop(&self, period: usize) -> FloatValue {
        let p = &self.parameters;
        let t = period as FloatValue;
        match self.variant {
            ProductivityVariant::Dice2007 | ProductivityVariant::Dice2010 => {
                p.backstop_init
                    * ((p.backstop_ratio - 1.0 + (-p.backstop_decline * t).exp()) / p.backstop_ratio)
                    * CARBON_PER_CO2
            }
            ProductivityVariant::DiceBackstop2013 => {
                p.backstop_init * (1.0 - p.backstop_decline).powf(t) * CARBON_PER_CO2
            }
            ProductivityVariant::Dice2013 => p.backstop_init * (1.0 - p.backstop_decline).powf(t),
        }
    }

    /// Growth rate of TFP over the period starting at `period`.
    pub fn productivity_growth(&self, period: usize) -> FloatValue {
        let p = &self.parameters;
        let t = period as FloatValue;
        match self.variant {
            ProductivityVariant::Dice2010 | ProductivityVariant::DiceBackstop2013 => {
                p.productivity_growth_init
                    * (-p.productivity_decline
                        * p.timestep
                        * t
                        * (-PRODUCTIVITY_GROWTH_DAMPING * p.timestep * t).exp())
                    .exp()
            }
            ProductivityVariant::Dice2007 | ProductivityVariant::Dice2013 => {
                p.productivity_growth_init * (-p.productivity_decline * p.timestep * t).exp()
            }
        }
    }

    fn intensity_decline(&self, period: usize, state: &StateTable) -> FloatValue {
        let p = &self.parameters;
        match self.variant {
            ProductivityVariant::Dice2007 => {
                let t = period as FloatValue;
                p.intensity_growth
                    * (-p.intensity_decline_rate * p.timestep * t
                        - p.intensity_quadratic * p.timestep * t.powi(2))
                    .exp()
            }
            _ => {
                state.get(Variable::IntensityDecline, period - 1)
                    * (1.0 - p.intensity_decline_rate).powf(p.timestep)
            }
        }
    }

    fn carbon_intensity(
        &self,
        period: usize,
        state: &StateTable,
        intensity_decline: FloatValue,
    ) -> FloatValue {
        let previous = state.get(Variable::CarbonIntensity, period - 1);
        let previous_decline = state.get(Variable::IntensityDecline, period - 1);
        match self.variant {
            ProductivityVariant::Dice2007 => previous / (1.0 - intensity_decline),
            ProductivityVariant::Dice2010 | ProductivityVariant::DiceBackstop2013 => {
                previous * (1.0 - previous_decline)
            }
            ProductivityVariant::Dice2013 => {
                previous * (previous_decline * self.parameters.timestep).exp()
            }
        }
    }

    fn population(&self, period: usize, state: &StateTable) -> FloatValue {
        let p = &self.parameters;
        match self.variant {
            ProductivityVariant::Dice2007 => {
                let growth = (p.population_growth * period as FloatValue).exp();
                let convergence = (growth - 1.0) / growth;
                p.population_init * (1.0 - convergence) + convergence * p.popasym
            }
            _ => {
                let previous = state.get(Variable::Population, period - 1);
                previous * (p.popasym / previous).powf(p.population_growth)
            }
        }
    }

    fn capital(&self, period: usize, state: &StateTable) -> FloatValue {
        let p = &self.parameters;
        state.get(Variable::Capital, period - 1) * (1.0 - p.depreciation).powf(p.timestep)
            + p.timestep * state.get(Variable::Investment, period - 1)
    }

    /// Gross output from the production function.
    pub fn gross_output(
        &self,
        productivity: FloatValue,
        capital: FloatValue,
        population: FloatValue,
    ) -> FloatValue {
        let gamma = self.parameters.output_elasticity;
        // DICE2013 calibrates productivity against population in billions
        let labour = match self.variant {
            ProductivityVariant::Dice2013 => population * 1e-3,
            _ => population,
        };
        productivity * capital.powf(gamma) * labour.powf(1.0 - gamma)
    }
}

impl ProductivityModel for ProductivityComponent {
    fn get_model_values(&self, period: usize, state: &StateTable) -> ProductivityValues {
        let p = &self.parameters;

        let (carbon_intensity, intensity_decline, productivity, capital, population, gross_output) =
            if period == 0 {
                (
                    p.intensity_init,
                    p.intensity_growth,
                    p.productivity_init,
                    p.capital_init,
                    p.population_init,
                    p.output_init,
                )
            } else {
                let intensity_decline = self.intensity_decline(period, state);
                let carbon_intensity = self.carbon_intensity(period, state, intensity_decline);
                let productivity = state.get(Variable::Productivity, period - 1)
                    / (1.0 - self.productivity_growth(period - 1));
                let capital = self.capital(period, state);
                let population = self.population(period, state);
                let gross_output = self.gross_output(productivity, capital, population);
                (
                    carbon_intensity,
                    intensity_decline,
                    productivity,
                    capital,
                    population,
                    gross_output,
                )
            };

        let backstop = self.backstop(period);
        let backstop_growth =
            backstop * carbon_intensity / p.abatement_exponent * CO2_PER_CARBON;

        ProductivityValues {
            carbon_intensity,
            intensity_decline,
            productivity,
            capital,
            backstop,
            backstop_growth,
            population,
            gross_output,
        }
    }
}
