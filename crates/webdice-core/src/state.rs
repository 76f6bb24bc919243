//! Time-indexed state of a scenario run.
//!
//! The [`StateTable`] stores every model [`Variable`] for each of the T periods in
//! a single owned array. Cloning a table produces an independent copy, which is
//! how perturbed runs (SCC shocks, gradient evaluations) are isolated from the
//! primary trajectory.

use crate::parameters::ModelParameters;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Floating point type used throughout the model.
pub type FloatValue = f64;

macro_rules! define_variables {
    (
        $(
            $variant:ident => ($name:literal, $unit:literal, $description:literal)
        ),+ $(,)?
    ) => {
        /// A named model variable.
        ///
        /// The discriminant doubles as the row index into a [`StateTable`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Variable {
            $($variant,)+
        }

        impl Variable {
            /// All variables in storage order.
            pub const ALL: &'static [Variable] = &[$(Variable::$variant),+];
            /// Number of variables.
            pub const COUNT: usize = Self::ALL.len();

            /// Name used in serialised output.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Variable::$variant => $name,)+
                }
            }

            pub fn unit(&self) -> &'static str {
                match self {
                    $(Variable::$variant => $unit,)+
                }
            }

            pub fn description(&self) -> &'static str {
                match self {
                    $(Variable::$variant => $description,)+
                }
            }

            /// Look up a variable by its output name.
            pub fn from_name(name: &str) -> Option<Variable> {
                match name {
                    $($name => Some(Variable::$variant),)+
                    _ => None,
                }
            }

            fn index(&self) -> usize {
                *self as usize
            }
        }
    };
}

define_variables!(
    Abatement => ("abatement", "trillion USD", "Cost of emissions reductions"),
    Backstop => ("backstop", "thousand USD/tC", "Backstop price"),
    BackstopGrowth => ("backstop_growth", "thousand USD/tC", "Abatement cost scale"),
    Capital => ("capital", "trillion USD", "Capital stock"),
    CarbonEmitted => ("carbon_emitted", "GtC", "Cumulative carbon emissions"),
    CarbonIntensity => ("carbon_intensity", "GtC/trillion USD", "Carbon intensity of output"),
    Consumption => ("consumption", "trillion USD", "Consumption"),
    DiscountFactor => ("consumption_discount", "1", "Consumption discount factor"),
    DiscountRate => ("consumption_discount_rate", "1/yr", "Annualised consumption discount rate"),
    ConsumptionPc => ("consumption_pc", "thousand USD", "Per-capita consumption"),
    Damages => ("damages", "trillion USD", "Climate damages"),
    EmissionsInd => ("emissions_ind", "GtC/yr", "Industrial emissions"),
    EmissionsTotal => ("emissions_total", "GtC/yr", "Total emissions"),
    Forcing => ("forcing", "W/m^2", "Radiative forcing"),
    GrossOutput => ("gross_output", "trillion USD", "Gross output"),
    IntensityDecline => ("intensity_decline", "1", "Decline of carbon intensity"),
    Investment => ("investment", "trillion USD", "Investment"),
    MassAtmosphere => ("mass_atmosphere", "GtC", "Carbon in the atmosphere"),
    MassUpper => ("mass_upper", "GtC", "Carbon in the upper ocean and biosphere"),
    MassLower => ("mass_lower", "GtC", "Carbon in the lower ocean"),
    Miu => ("miu", "1", "Emissions control rate"),
    Output => ("output", "trillion USD", "Net output"),
    OutputAbate => ("output_abate", "%", "Abatement cost as share of output"),
    Participation => ("participation", "1", "Treaty participation"),
    Population => ("population", "millions", "World population"),
    Productivity => ("productivity", "1", "Total factor productivity"),
    Scc => ("scc", "USD/tCO2", "Social cost of carbon"),
    TaxRate => ("tax_rate", "USD/tC", "Implied carbon price"),
    TempAtmosphere => ("temp_atmosphere", "degC", "Atmosphere temperature above 1900"),
    TempLower => ("temp_lower", "degC", "Lower ocean temperature above 1900"),
    Utility => ("utility", "1", "Period utility"),
    UtilityDiscounted => ("utility_discounted", "1", "Discounted period utility"),
);

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values of every [`Variable`] for each period of the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTable {
    values: Array2<FloatValue>,
}

impl StateTable {
    /// An all-zero table over `n_periods` periods.
    pub fn new(n_periods: usize) -> Self {
        Self {
            values: Array2::zeros((Variable::COUNT, n_periods)),
        }
    }

    /// A table seeded with the initial conditions of `parameters`.
    ///
    /// Stock variables are filled with their period-0 values across the whole
    /// horizon and the discount factor with ones; every flow variable starts at
    /// zero.
    pub fn seeded(parameters: &ModelParameters) -> Self {
        let mut state = Self::new(parameters.n_periods);

        let fills = [
            (Variable::Capital, parameters.capital_init),
            (Variable::CarbonIntensity, parameters.intensity_init),
            (Variable::DiscountFactor, 1.0),
            (Variable::IntensityDecline, parameters.intensity_growth),
            (Variable::Investment, parameters.savings * parameters.output_init),
            (Variable::MassAtmosphere, parameters.mass_atmosphere_init),
            (Variable::MassUpper, parameters.mass_upper_init),
            (Variable::MassLower, parameters.mass_lower_init),
            (Variable::Miu, parameters.miu_init),
            (Variable::Output, parameters.output_init),
            (Variable::Population, parameters.population_init),
            (Variable::Productivity, parameters.productivity_init),
            (Variable::TempAtmosphere, parameters.temp_atmosphere_init),
            (Variable::TempLower, parameters.temp_lower_init),
        ];
        for (variable, value) in fills {
            state.values.row_mut(variable.index()).fill(value);
        }
        state
    }

    pub fn n_periods(&self) -> usize {
        self.values.ncols()
    }

    /// Value of `variable` at `period`.
    ///
    /// # Panics
    ///
    /// Panics if `period` is outside the horizon.
    pub fn get(&self, variable: Variable, period: usize) -> FloatValue {
        self.values[[variable.index(), period]]
    }

    pub fn set(&mut self, variable: Variable, period: usize, value: FloatValue) {
        self.values[[variable.index(), period]] = value;
    }

    /// Full time series of a variable.
    pub fn column(&self, variable: Variable) -> ArrayView1<'_, FloatValue> {
        self.values.row(variable.index())
    }

    /// Overwrite the full time series of a variable.
    ///
    /// Values beyond the horizon are ignored and missing values leave the
    /// existing entries untouched.
    pub fn set_column(&mut self, variable: Variable, values: &[FloatValue]) {
        for (dst, src) in self
            .values
            .row_mut(variable.index())
            .iter_mut()
            .zip(values.iter())
        {
            *dst = *src;
        }
    }

    /// Every variable keyed by its output name.
    pub fn to_map(&self) -> BTreeMap<String, Vec<FloatValue>> {
        Variable::ALL
            .iter()
            .map(|v| (v.name().to_string(), self.column(*v).to_vec()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_variable_lookup() {
        assert_eq!(Variable::COUNT, 32);
        for variable in Variable::ALL {
            assert_eq!(Variable::from_name(variable.name()), Some(*variable));
        }
        assert_eq!(Variable::from_name("unknown"), None);
    }

    #[test]
    fn test_seeded_initial_conditions() {
        let params = ModelParameters::default();
        let state = StateTable::seeded(&params);

        assert_eq!(state.n_periods(), 60);
        assert_relative_eq!(state.get(Variable::Population, 0), 6514.0);
        assert_relative_eq!(state.get(Variable::MassAtmosphere, 59), 808.9);
        assert_relative_eq!(state.get(Variable::DiscountFactor, 30), 1.0);
        assert_relative_eq!(state.get(Variable::Investment, 0), 0.22 * 55.667);
        assert_eq!(state.get(Variable::Scc, 0), 0.0);
    }

    #[test]
    fn test_clone_does_not_alias() {
        let params = ModelParameters::default();
        let primary = StateTable::seeded(&params);
        let mut shocked = primary.clone();

        shocked.set(Variable::EmissionsTotal, 3, 42.0);

        assert_eq!(primary.get(Variable::EmissionsTotal, 3), 0.0);
        assert_eq!(shocked.get(Variable::EmissionsTotal, 3), 42.0);
    }

    #[test]
    fn test_set_column_partial() {
        let mut state = StateTable::new(4);
        state.set_column(Variable::Miu, &[0.1, 0.2]);

        assert_eq!(state.column(Variable::Miu).to_vec(), vec![0.1, 0.2, 0.0, 0.0]);
    }

    #[test]
    fn test_to_map_names() {
        let state = StateTable::new(3);
        let map = state.to_map();

        assert_eq!(map.len(), Variable::COUNT);
        assert_eq!(map["temp_atmosphere"].len(), 3);
    }
}
