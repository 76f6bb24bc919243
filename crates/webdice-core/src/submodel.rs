//! Interfaces of the seven submodel families.
//!
//! A submodel computes the values of its family's variables for one period.
//! Implementations read the current period's exogenous inputs and the values
//! already written for the current period by earlier families, plus anything
//! from the previous period. Period 0 yields initial-condition constants.
//!
//! Each family returns a plain value struct which the step function writes
//! back into the [`StateTable`] with `apply`.

use crate::state::{FloatValue, StateTable, Variable};

/// Run-time inputs to a single step that are not part of the parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepInputs {
    /// Externally supplied control rate, overriding the policy regime.
    pub miu: Option<FloatValue>,
    /// Additional emissions (GtC/yr) added to total emissions this period.
    pub emissions_shock: FloatValue,
}

impl StepInputs {
    pub fn supplied(miu: FloatValue) -> Self {
        Self {
            miu: Some(miu),
            ..Self::default()
        }
    }
}

macro_rules! impl_apply {
    ($ty:ident { $($field:ident => $variable:ident),+ $(,)? }) => {
        impl $ty {
            /// Write the values into `state` at `period`.
            pub fn apply(&self, state: &mut StateTable, period: usize) {
                $(state.set(Variable::$variable, period, self.$field);)+
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProductivityValues {
    pub carbon_intensity: FloatValue,
    pub intensity_decline: FloatValue,
    pub productivity: FloatValue,
    pub capital: FloatValue,
    pub backstop: FloatValue,
    pub backstop_growth: FloatValue,
    pub population: FloatValue,
    pub gross_output: FloatValue,
}

impl_apply!(ProductivityValues {
    carbon_intensity => CarbonIntensity,
    intensity_decline => IntensityDecline,
    productivity => Productivity,
    capital => Capital,
    backstop => Backstop,
    backstop_growth => BackstopGrowth,
    population => Population,
    gross_output => GrossOutput,
});

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EmissionsValues {
    pub miu: FloatValue,
    pub emissions_ind: FloatValue,
    pub emissions_total: FloatValue,
    pub carbon_emitted: FloatValue,
    pub tax_rate: FloatValue,
}

impl_apply!(EmissionsValues {
    miu => Miu,
    emissions_ind => EmissionsInd,
    emissions_total => EmissionsTotal,
    carbon_emitted => CarbonEmitted,
    tax_rate => TaxRate,
});

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CarbonValues {
    pub mass_atmosphere: FloatValue,
    pub mass_upper: FloatValue,
    pub mass_lower: FloatValue,
}

impl_apply!(CarbonValues {
    mass_atmosphere => MassAtmosphere,
    mass_upper => MassUpper,
    mass_lower => MassLower,
});

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TemperatureValues {
    pub temp_atmosphere: FloatValue,
    pub temp_lower: FloatValue,
}

impl_apply!(TemperatureValues {
    temp_atmosphere => TempAtmosphere,
    temp_lower => TempLower,
});

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamagesValues {
    pub participation: FloatValue,
    pub abatement: FloatValue,
    pub damages: FloatValue,
    pub output: FloatValue,
    pub output_abate: FloatValue,
}

impl_apply!(DamagesValues {
    participation => Participation,
    abatement => Abatement,
    damages => Damages,
    output => Output,
    output_abate => OutputAbate,
});

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConsumptionValues {
    pub consumption: FloatValue,
    pub consumption_pc: FloatValue,
    pub discount_factor: FloatValue,
    pub discount_rate: FloatValue,
    pub investment: FloatValue,
}

impl_apply!(ConsumptionValues {
    consumption => Consumption,
    consumption_pc => ConsumptionPc,
    discount_factor => DiscountFactor,
    discount_rate => DiscountRate,
    investment => Investment,
});

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UtilityValues {
    pub utility: FloatValue,
    pub utility_discounted: FloatValue,
}

impl_apply!(UtilityValues {
    utility => Utility,
    utility_discounted => UtilityDiscounted,
});

/// Population, technology, capital and gross output.
pub trait ProductivityModel {
    fn get_model_values(&self, period: usize, state: &StateTable) -> ProductivityValues;
}

/// Control rate and emissions.
pub trait EmissionsModel {
    fn get_model_values(
        &self,
        period: usize,
        state: &StateTable,
        inputs: &StepInputs,
    ) -> EmissionsValues;
}

/// Carbon reservoirs and radiative forcing.
pub trait CarbonModel {
    fn get_model_values(&self, period: usize, state: &StateTable) -> CarbonValues;

    /// Total radiative forcing (W/m^2) using the reservoir masses at `period`.
    fn forcing(&self, period: usize, state: &StateTable) -> FloatValue;
}

/// Atmosphere and lower ocean temperature.
pub trait TemperatureModel {
    fn get_model_values(&self, period: usize, state: &StateTable) -> TemperatureValues;
}

/// Damages, abatement cost and net output.
pub trait DamagesModel {
    fn get_model_values(&self, period: usize, state: &StateTable) -> DamagesValues;

    /// Multiplicative factor applied to total factor productivity.
    ///
    /// Only variants in which damages reduce productivity differ from one.
    fn production_factor(&self, _temp_atmosphere: FloatValue) -> FloatValue {
        1.0
    }
}

/// Consumption, investment and consumption discounting.
pub trait ConsumptionModel {
    fn get_model_values(&self, period: usize, state: &StateTable) -> ConsumptionValues;
}

/// Period utility.
pub trait UtilityModel {
    fn get_model_values(&self, period: usize, state: &StateTable) -> UtilityValues;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_writes_period() {
        let mut state = StateTable::new(3);
        let values = TemperatureValues {
            temp_atmosphere: 1.5,
            temp_lower: 0.2,
        };

        values.apply(&mut state, 1);

        assert_eq!(state.get(Variable::TempAtmosphere, 1), 1.5);
        assert_eq!(state.get(Variable::TempLower, 1), 0.2);
        assert_eq!(state.get(Variable::TempAtmosphere, 0), 0.0);
    }

    #[test]
    fn test_step_inputs() {
        let inputs = StepInputs::supplied(0.4);
        assert_eq!(inputs.miu, Some(0.4));
        assert_eq!(inputs.emissions_shock, 0.0);
        assert_eq!(StepInputs::default().miu, None);
    }
}
