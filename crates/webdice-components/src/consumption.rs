//! Consumption component
//!
//! Splits net output into consumption and investment at a fixed savings rate
//! and computes the consumption discount factor relative to period 0.
//!
//! Ramsey discounting combines the pure rate of time preference with the growth
//! of per-capita consumption:
//!
//! $$ R_c(t) = \exp\left(-\left(\eta \frac{\ln(c_t / c_0)}{t \Delta t} + \rho\right) t \Delta t\right) $$

use crate::constants::RAMSEY_TIME_OFFSET;
use serde::{Deserialize, Serialize};
use webdice_core::parameters::ModelParameters;
use webdice_core::state::{FloatValue, StateTable, Variable};
use webdice_core::submodel::{ConsumptionModel, ConsumptionValues};
use webdice_core::variants::ConsumptionVariant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionComponent {
    variant: ConsumptionVariant,
    parameters: ModelParameters,
}

impl ConsumptionComponent {
    pub fn from_parameters(parameters: &ModelParameters) -> Self {
        Self {
            variant: parameters.consumption_model,
            parameters: parameters.clone(),
        }
    }

    /// Discount factor and annualised discount rate at `period`, given
    /// per-capita consumption at period 0 and at `period`.
    pub fn discount(
        &self,
        period: usize,
        consumption_pc_init: FloatValue,
        consumption_pc: FloatValue,
    ) -> (FloatValue, FloatValue) {
        let p = &self.parameters;
        let years = period as FloatValue * p.timestep;

        match self.variant {
            ConsumptionVariant::Ramsey => {
                if period == 0 {
                    return (1.0, p.prstp);
                }
                if consumption_pc <= 0.0 || consumption_pc_init <= 0.0 {
                    return (1.0, 0.0);
                }
                let growth = (consumption_pc / consumption_pc_init).ln();
                let factor =
                    (-(p.elasmu * growth / (years + RAMSEY_TIME_OFFSET) + p.prstp) * years).exp();
                (factor, p.prstp + p.elasmu * growth / years)
            }
            ConsumptionVariant::Constant => {
                let rate = p.constant_discount_rate;
                (1.0 / (1.0 + rate).powf(years), rate)
            }
        }
    }
}

impl ConsumptionModel for ConsumptionComponent {
    fn get_model_values(&self, period: usize, state: &StateTable) -> ConsumptionValues {
        let p = &self.parameters;
        let output = state.get(Variable::Output, period);
        let population = state.get(Variable::Population, period);

        let consumption = output * (1.0 - p.savings);
        let consumption_pc = if population > 0.0 {
            1000.0 * consumption / population
        } else {
            0.0
        };

        let (discount_factor, discount_rate, investment) = if period == 0 {
            let (factor, rate) = self.discount(0, consumption_pc, consumption_pc);
            (factor, rate, p.output_init * p.savings)
        } else {
            let (factor, rate) = self.discount(
                period,
                state.get(Variable::ConsumptionPc, 0),
                consumption_pc,
            );
            (factor, rate, p.savings * output)
        };

        ConsumptionValues {
            consumption,
            consumption_pc,
            discount_factor,
            discount_rate,
            investment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn state_with(output: FloatValue, population: FloatValue, cpc_init: FloatValue) -> StateTable {
        let mut state = StateTable::new(5);
        state.set(Variable::Output, 0, 50.0);
        state.set(Variable::Population, 0, 6500.0);
        state.set(Variable::ConsumptionPc, 0, cpc_init);
        state.set(Variable::Output, 2, output);
        state.set(Variable::Population, 2, population);
        state
    }

    #[test]
    fn test_period_zero() {
        let params = ModelParameters::default();
        let component = ConsumptionComponent::from_parameters(&params);
        let state = state_with(0.0, 1.0, 0.0);

        let values = component.get_model_values(0, &state);

        assert_relative_eq!(values.consumption, 50.0 * 0.78, epsilon = 1e-12);
        assert_relative_eq!(values.consumption_pc, 1000.0 * 39.0 / 6500.0, epsilon = 1e-12);
        assert_eq!(values.discount_factor, 1.0);
        assert_relative_eq!(values.investment, 55.667 * 0.22, epsilon = 1e-12);
    }

    #[test]
    fn test_ramsey_discount() {
        let params = ModelParameters::default();
        let component = ConsumptionComponent::from_parameters(&params);
        let state = state_with(80.0, 8000.0, 6.0);

        let values = component.get_model_values(2, &state);

        let cpc = 1000.0 * 80.0 * 0.78 / 8000.0;
        let growth = (cpc / 6.0_f64).ln();
        let expected = (-(2.0 * growth / (20.0 + 1e-6) + 0.015) * 20.0).exp();
        assert_relative_eq!(values.consumption_pc, cpc, epsilon = 1e-12);
        assert_relative_eq!(values.discount_factor, expected, epsilon = 1e-12);
        assert_relative_eq!(values.discount_rate, 0.015 + 2.0 * growth / 20.0, epsilon = 1e-12);
        assert_relative_eq!(values.investment, 0.22 * 80.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_positive_consumption() {
        let params = ModelParameters::default();
        let component = ConsumptionComponent::from_parameters(&params);

        let values = component.get_model_values(2, &state_with(-5.0, 8000.0, 6.0));
        assert_eq!(values.discount_factor, 1.0);

        // Zero population does not divide by zero
        let values = component.get_model_values(2, &state_with(80.0, 0.0, 6.0));
        assert_eq!(values.consumption_pc, 0.0);
        assert_eq!(values.discount_factor, 1.0);
    }

    #[test]
    fn test_constant_discount() {
        let params = ModelParameters {
            consumption_model: ConsumptionVariant::Constant,
            ..ModelParameters::default()
        };
        let component = ConsumptionComponent::from_parameters(&params);

        let (factor, rate) = component.discount(3, 6.0, 12.0);

        assert_relative_eq!(factor, 1.03_f64.powf(-30.0), epsilon = 1e-12);
        assert_eq!(rate, 0.03);
    }
}
