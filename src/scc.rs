//! Social cost of carbon.
//!
//! For each of the first `scc_periods` periods the completed trajectory is
//! copied, one extra GtC/yr of emissions is added in that period, and the rest
//! of the horizon is re-stepped. The discounted loss of per-capita consumption
//! relative to the unshocked run, converted to USD per tonne of CO2, is the
//! social cost of carbon for that period.
//!
//! The shocked runs are independent and are evaluated in parallel.

use crate::model::Model;
use ndarray::Array1;
use rayon::prelude::*;
use webdice_core::parameters::CARBON_PER_CO2;
use webdice_core::state::{FloatValue, StateTable, Variable};
use webdice_core::submodel::StepInputs;

/// Size of the emissions shock (GtC/yr).
pub const EMISSIONS_SHOCK: FloatValue = 1.0;

/// Social cost of carbon (USD/tCO2) of a single period.
///
/// # Arguments
///
/// * `model` - Model that produced `base`
/// * `base` - Completed unshocked trajectory
/// * `control` - Control vector used for `base`, if any
/// * `period` - Period receiving the emissions shock
pub fn period_scc(
    model: &Model,
    base: &StateTable,
    control: Option<&Array1<FloatValue>>,
    period: usize,
) -> FloatValue {
    let parameters = model.parameters();
    let horizon = parameters.n_periods - 1;

    let mut shocked = base.clone();
    for t in period..=horizon {
        let inputs = StepInputs {
            miu: control.map(|c| c[t]),
            emissions_shock: if t == period { EMISSIONS_SHOCK } else { 0.0 },
        };
        model.step(t, &mut shocked, &inputs);
    }

    let loss: FloatValue = (period..horizon)
        .map(|t| {
            let difference = base.get(Variable::ConsumptionPc, t)
                - shocked.get(Variable::ConsumptionPc, t);
            difference.max(0.0) * shocked.get(Variable::DiscountFactor, t - period)
        })
        .sum();

    loss * 1000.0 * parameters.timestep * CARBON_PER_CO2
}

/// Social cost of carbon of every period.
///
/// Periods beyond `scc_periods` are zero.
pub fn social_cost_of_carbon(
    model: &Model,
    base: &StateTable,
    control: Option<&Array1<FloatValue>>,
) -> Vec<FloatValue> {
    let parameters = model.parameters();
    let evaluated: Vec<(usize, FloatValue)> = (0..parameters.scc_periods)
        .into_par_iter()
        .map(|period| (period, period_scc(model, base, control, period)))
        .collect();

    let mut values = vec![0.0; parameters.n_periods];
    for (period, value) in evaluated {
        values[period] = value;
    }
    tracing::debug!(periods = parameters.scc_periods, "social cost of carbon evaluated");
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use webdice_core::parameters::ModelParameters;

    #[test]
    fn test_scc_positive_and_deterministic() {
        let model = Model::from_parameters(ModelParameters::default());
        let base = model.run_loop(None, false).unwrap();

        let first = social_cost_of_carbon(&model, &base, None);
        let second = social_cost_of_carbon(&model, &base, None);

        assert_eq!(first, second);
        assert!(first[0] > 0.0, "SCC(0) = {}", first[0]);
        assert!(first[0].is_finite());
        assert_eq!(first.len(), 60);
        assert!(first[20..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_shock_does_not_touch_base() {
        let model = Model::from_parameters(ModelParameters::default());
        let base = model.run_loop(None, false).unwrap();
        let copy = base.clone();

        period_scc(&model, &base, None, 3);

        assert_eq!(base, copy);
    }

    #[test]
    fn test_no_scc_periods() {
        let model = Model::from_parameters(ModelParameters {
            scc_periods: 0,
            ..ModelParameters::default()
        });
        let base = model.run_loop(None, false).unwrap();

        let values = social_cost_of_carbon(&model, &base, None);
        assert!(values.iter().all(|v| *v == 0.0));
    }
}
