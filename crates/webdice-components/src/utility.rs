//! Utility component
//!
//! Period utility of per-capita consumption with constant relative risk
//! aversion η, weighted by population and discounted at the pure rate of time
//! preference:
//!
//! $$ U(c) = \frac{c^{1-\eta} - 1}{1 - \eta}, \quad W_t = (1 + \rho)^{-t \Delta t} L_t U(c_t) $$
//!
//! With η = 1 utility is logarithmic. The `dice_2007` variant keeps the historical
//! form `c^(1-η)/(1-η) + 1`.

use serde::{Deserialize, Serialize};
use webdice_core::parameters::ModelParameters;
use webdice_core::state::{FloatValue, StateTable, Variable};
use webdice_core::submodel::{UtilityModel, UtilityValues};
use webdice_core::variants::UtilityVariant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilityComponent {
    variant: UtilityVariant,
    parameters: ModelParameters,
}

impl UtilityComponent {
    pub fn from_parameters(parameters: &ModelParameters) -> Self {
        Self {
            variant: parameters.utility_model,
            parameters: parameters.clone(),
        }
    }

    /// Utility discount factor `(1 + ρ)^(-t Δt)`.
    pub fn utility_discount(&self, period: usize) -> FloatValue {
        let p = &self.parameters;
        (1.0 + p.prstp).powf(-p.timestep * period as FloatValue)
    }

    /// Utility of per-capita consumption.
    pub fn utility(&self, consumption_pc: FloatValue) -> FloatValue {
        if consumption_pc <= 0.0 {
            return 0.0;
        }
        let eta = self.parameters.elasmu;
        if eta == 1.0 {
            return consumption_pc.ln();
        }
        let exponent = 1.0 - eta;
        match self.variant {
            UtilityVariant::Crra => (consumption_pc.powf(exponent) - 1.0) / exponent,
            UtilityVariant::Dice2007 => consumption_pc.powf(exponent) / exponent + 1.0,
        }
    }
}

impl UtilityModel for UtilityComponent {
    fn get_model_values(&self, period: usize, state: &StateTable) -> UtilityValues {
        let utility = self.utility(state.get(Variable::ConsumptionPc, period));
        UtilityValues {
            utility,
            utility_discounted: self.utility_discount(period)
                * state.get(Variable::Population, period)
                * utility,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn component(variant: UtilityVariant, elasmu: FloatValue) -> UtilityComponent {
        UtilityComponent::from_parameters(&ModelParameters {
            utility_model: variant,
            elasmu,
            ..ModelParameters::default()
        })
    }

    #[test]
    fn test_crra_utility() {
        let component = component(UtilityVariant::Crra, 2.0);
        assert_relative_eq!(component.utility(4.0), (0.25 - 1.0) / -1.0, epsilon = 1e-12);
        assert_relative_eq!(component.utility(1.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_log_utility() {
        for variant in UtilityVariant::ALL {
            let component = component(*variant, 1.0);
            assert_relative_eq!(component.utility(std::f64::consts::E), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_crra_approaches_log() {
        let near_log = component(UtilityVariant::Crra, 1.0 + 1e-7);
        assert_relative_eq!(near_log.utility(8.0), 8.0_f64.ln(), epsilon = 1e-5);
    }

    #[test]
    fn test_dice_2007_utility() {
        let component = component(UtilityVariant::Dice2007, 2.0);
        assert_relative_eq!(component.utility(4.0), 0.25 / -1.0 + 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_positive_consumption() {
        let component = component(UtilityVariant::Crra, 2.0);
        assert_eq!(component.utility(0.0), 0.0);
        assert_eq!(component.utility(-3.0), 0.0);
    }

    #[test]
    fn test_discounted_utility() {
        let component = component(UtilityVariant::Crra, 2.0);
        let mut state = StateTable::new(4);
        state.set(Variable::ConsumptionPc, 3, 10.0);
        state.set(Variable::Population, 3, 7000.0);

        let values = component.get_model_values(3, &state);

        let discount = 1.015_f64.powf(-30.0);
        assert_relative_eq!(values.utility, 0.9, epsilon = 1e-12);
        assert_relative_eq!(values.utility_discounted, discount * 7000.0 * 0.9, epsilon = 1e-9);
    }
}
