//! Emissions component
//!
//! Determines the emissions control rate μ and the resulting industrial, total
//! and cumulative emissions.
//!
//! The control rate comes from one of four regimes:
//! - supplied: an external control vector (used by the optimiser)
//! - treaty: the rate that keeps industrial emissions at the treaty cap
//! - carbon tax: the rate at which marginal abatement cost equals the tax
//! - baseline: `miu_floor`
//!
//! Cumulative carbon is bounded by the fossil fuel limit. Once the limit is
//! reached no further emissions occur and the policy regimes switch to full
//! abatement for the rest of the horizon.

use crate::constants::{
    CARBON_PER_CO2, LAND_USE_RETENTION_DICE_2007, LAND_USE_RETENTION_DICE_2010,
};
use serde::{Deserialize, Serialize};
use webdice_core::parameters::ModelParameters;
use webdice_core::schedules;
use webdice_core::state::{FloatValue, StateTable, Variable};
use webdice_core::submodel::{EmissionsModel, EmissionsValues, StepInputs};
use webdice_core::variants::EmissionsVariant;

/// Clamp a control rate into [0, 1], mapping NaN to no control.
pub fn clamp_control(miu: FloatValue) -> FloatValue {
    if miu.is_nan() {
        0.0
    } else {
        miu.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionsComponent {
    variant: EmissionsVariant,
    parameters: ModelParameters,
}

impl EmissionsComponent {
    pub fn from_parameters(parameters: &ModelParameters) -> Self {
        Self {
            variant: parameters.emissions_model,
            parameters: parameters.clone(),
        }
    }

    /// Emissions from land use change (GtC/yr).
    pub fn land_use_emissions(&self, period: usize) -> FloatValue {
        let retention = match self.variant {
            EmissionsVariant::Dice2007 => LAND_USE_RETENTION_DICE_2007,
            EmissionsVariant::Dice2010 => LAND_USE_RETENTION_DICE_2010,
        };
        schedules::land_use_emissions(&self.parameters, retention, period)
    }

    /// Control rate implied by the configured policy regime, before clamping.
    fn policy_miu(&self, period: usize, state: &StateTable) -> FloatValue {
        let p = &self.parameters;
        if period == 0 {
            return p.miu_init;
        }
        if state.get(Variable::CarbonEmitted, period - 1) >= p.fosslim {
            return 1.0;
        }

        if p.treaty {
            let cap = schedules::emissions_cap(p, period - 1);
            if cap == 0.0 {
                return 1.0;
            }
            let unabated = state.get(Variable::CarbonIntensity, period)
                * state.get(Variable::GrossOutput, period);
            if unabated <= 0.0 {
                return 0.0;
            }
            1.0 - state.get(Variable::EmissionsInd, 0) * cap / unabated
        } else if p.carbon_tax {
            let tax = schedules::carbon_tax(p, period);
            let backstop = state.get(Variable::Backstop, period);
            (tax / (backstop * 1000.0)).powf(1.0 / (p.abatement_exponent - 1.0))
        } else {
            p.miu_floor
        }
    }

    /// Implied carbon price (USD per tC) at control rate `miu`.
    pub fn tax_rate(&self, miu: FloatValue, backstop: FloatValue) -> FloatValue {
        backstop * miu.powf(self.parameters.abatement_exponent - 1.0) * 1000.0 * CARBON_PER_CO2
    }
}

impl EmissionsModel for EmissionsComponent {
    fn get_model_values(
        &self,
        period: usize,
        state: &StateTable,
        inputs: &StepInputs,
    ) -> EmissionsValues {
        let p = &self.parameters;

        let miu = clamp_control(match inputs.miu {
            Some(miu) => miu,
            None => self.policy_miu(period, state),
        });

        let mut emissions_ind = state.get(Variable::CarbonIntensity, period)
            * (1.0 - miu)
            * state.get(Variable::GrossOutput, period);
        let mut emissions_total =
            emissions_ind + self.land_use_emissions(period) + inputs.emissions_shock;

        let previous = if period == 0 {
            0.0
        } else {
            state.get(Variable::CarbonEmitted, period - 1)
        };
        let exhausted = period > 0 && previous >= p.fosslim;
        let mut carbon_emitted = previous + p.timestep * emissions_total;

        if exhausted || carbon_emitted > p.fosslim {
            if !exhausted {
                tracing::debug!(period, limit = p.fosslim, "fossil fuel limit reached");
            }
            emissions_ind = 0.0;
            emissions_total = 0.0;
            carbon_emitted = p.fosslim;
        }

        EmissionsValues {
            miu,
            emissions_ind,
            emissions_total,
            carbon_emitted,
            tax_rate: self.tax_rate(miu, state.get(Variable::Backstop, period)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn state_with_economy(params: &ModelParameters) -> StateTable {
        let mut state = StateTable::seeded(params);
        for t in 0..params.n_periods {
            state.set(Variable::GrossOutput, t, 60.0);
            state.set(Variable::CarbonIntensity, t, 0.12);
            state.set(Variable::Backstop, t, 0.3);
        }
        state
    }

    #[test]
    fn test_baseline_regime() {
        let params = ModelParameters::default();
        let component = EmissionsComponent::from_parameters(&params);
        let state = state_with_economy(&params);

        let first = component.get_model_values(0, &state, &StepInputs::default());
        assert_relative_eq!(first.miu, params.miu_init);
        assert_relative_eq!(first.emissions_ind, 0.12 * (1.0 - 0.005) * 60.0);
        assert_relative_eq!(first.emissions_total, first.emissions_ind + 1.1);
        assert_relative_eq!(first.carbon_emitted, 10.0 * first.emissions_total);

        let later = component.get_model_values(3, &state, &StepInputs::default());
        assert_eq!(later.miu, 0.0);
        assert_eq!(later.tax_rate, 0.0);
        assert_relative_eq!(later.emissions_total, 7.2 + 1.1 * 0.9_f64.powi(3), epsilon = 1e-12);
    }

    #[test]
    fn test_land_use_retention() {
        let dice_2010 = ModelParameters {
            emissions_model: EmissionsVariant::Dice2010,
            ..ModelParameters::default()
        };
        let component = EmissionsComponent::from_parameters(&dice_2010);
        assert_relative_eq!(component.land_use_emissions(2), 1.1 * 0.64, epsilon = 1e-12);
    }

    #[test]
    fn test_treaty_regime_meets_cap() {
        let params = ModelParameters {
            treaty: true,
            e2050: 0.5,
            ..ModelParameters::default()
        };
        let component = EmissionsComponent::from_parameters(&params);
        let mut state = state_with_economy(&params);
        state.set(Variable::EmissionsInd, 0, 6.0);

        // Cap of the previous period applies
        let values = component.get_model_values(6, &state, &StepInputs::default());

        assert_relative_eq!(values.miu, 1.0 - 6.0 * 0.5 / 7.2, epsilon = 1e-12);
        assert_relative_eq!(values.emissions_ind, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_treaty_zero_cap_is_full_abatement() {
        let params = ModelParameters {
            treaty: true,
            e2050: 1.0,
            ..ModelParameters::default()
        };
        let component = EmissionsComponent::from_parameters(&params);
        let state = state_with_economy(&params);

        let values = component.get_model_values(7, &state, &StepInputs::default());
        assert_eq!(values.miu, 1.0);
        assert_eq!(values.emissions_ind, 0.0);
    }

    #[test]
    fn test_carbon_tax_regime() {
        let params = ModelParameters {
            carbon_tax: true,
            c2050: 100.0,
            ..ModelParameters::default()
        };
        let component = EmissionsComponent::from_parameters(&params);
        let state = state_with_economy(&params);

        let values = component.get_model_values(5, &state, &StepInputs::default());

        let expected = (100.0_f64 / 300.0).powf(1.0 / 1.8);
        assert_relative_eq!(values.miu, expected, epsilon = 1e-12);
        // The implied tax recovers the schedule (converted to CO2)
        assert_relative_eq!(values.tax_rate, 100.0 * 12.0 / 44.0, epsilon = 1e-9);
    }

    #[test]
    fn test_supplied_control_is_clamped() {
        let params = ModelParameters::default();
        let component = EmissionsComponent::from_parameters(&params);
        let state = state_with_economy(&params);

        let high = component.get_model_values(2, &state, &StepInputs::supplied(1.7));
        assert_eq!(high.miu, 1.0);
        let low = component.get_model_values(2, &state, &StepInputs::supplied(-0.3));
        assert_eq!(low.miu, 0.0);
        assert_eq!(clamp_control(FloatValue::NAN), 0.0);
    }

    #[test]
    fn test_emissions_shock_added_to_total() {
        let params = ModelParameters::default();
        let component = EmissionsComponent::from_parameters(&params);
        let state = state_with_economy(&params);
        let inputs = StepInputs {
            miu: None,
            emissions_shock: 1.0,
        };

        let base = component.get_model_values(2, &state, &StepInputs::default());
        let shocked = component.get_model_values(2, &state, &inputs);

        assert_relative_eq!(shocked.emissions_total - base.emissions_total, 1.0, epsilon = 1e-12);
        assert_eq!(shocked.emissions_ind, base.emissions_ind);
    }

    #[test]
    fn test_fossil_limit_clamps_and_absorbs() {
        let params = ModelParameters {
            fosslim: 100.0,
            ..ModelParameters::default()
        };
        let component = EmissionsComponent::from_parameters(&params);
        let mut state = state_with_economy(&params);
        state.set(Variable::CarbonEmitted, 1, 95.0);

        let crossing = component.get_model_values(2, &state, &StepInputs::default());
        assert_eq!(crossing.emissions_ind, 0.0);
        assert_eq!(crossing.emissions_total, 0.0);
        assert_eq!(crossing.carbon_emitted, 100.0);
        crossing.apply(&mut state, 2);

        // Policy regimes switch to full abatement after exhaustion
        let after = component.get_model_values(3, &state, &StepInputs::default());
        assert_eq!(after.miu, 1.0);
        assert_eq!(after.emissions_total, 0.0);
        assert_eq!(after.carbon_emitted, 100.0);

        // A supplied control cannot emit past the limit either
        let supplied = component.get_model_values(3, &state, &StepInputs::supplied(0.0));
        assert_eq!(supplied.emissions_total, 0.0);
        assert_eq!(supplied.carbon_emitted, 100.0);
    }
}
