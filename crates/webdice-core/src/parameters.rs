//! Model parameters
//!
//! All scalar coefficients, the submodel variant selectors and the policy
//! switches for one scenario. Parameters are built once from a preset, optionally
//! overridden from a flat name → value map, validated, and then only read by the
//! submodels.
//!
//! # Default Values
//!
//! Defaults match the DICE2007 calibration. [`ModelParameters::dice_2010`] and
//! [`ModelParameters::dice_2013`] provide the later calibrations.

use crate::errors::{DiceError, DiceResult};
use crate::state::FloatValue;
use crate::variants::{
    CarbonVariant, ConsumptionVariant, DamagesVariant, EmissionsVariant, Preset,
    ProductivityVariant, SolverKind, TemperatureVariant, UtilityVariant,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Conversion from carbon to CO2 mass (44/12 inverted).
pub const CARBON_PER_CO2: FloatValue = 12.0 / 44.0;

/// Parameters exposed to users in serialised output.
///
/// Only numeric parameters from this list are reported.
pub const USER_PARAMETERS: &[&str] = &[
    "temp_co2_doubling",
    "damages_exponent",
    "productivity_decline",
    "intensity_decline_rate",
    "abatement_exponent",
    "backstop_decline",
    "backstop_ratio",
    "popasym",
    "depreciation",
    "savings",
    "fosslim",
    "prod_frac",
    "elasmu",
    "prstp",
    "e2050",
    "e2100",
    "e2150",
    "p2050",
    "p2100",
    "p2150",
    "c2050",
    "c2100",
    "c2150",
];

/// A single configuration value as submitted by an external caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Number(FloatValue),
    Text(String),
}

impl ParameterValue {
    fn to_json(&self) -> serde_json::Value {
        match self {
            ParameterValue::Bool(b) => serde_json::Value::Bool(*b),
            // Integral numbers are passed as integers so that count parameters
            // such as `n_periods` accept `60.0`.
            ParameterValue::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serde_json::Value::from(*n as i64)
            }
            ParameterValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ParameterValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<FloatValue> for ParameterValue {
    fn from(value: FloatValue) -> Self {
        ParameterValue::Number(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Bool(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::Text(value.to_string())
    }
}

/// Flat parameter name → value mapping.
pub type ParameterMap = BTreeMap<String, ParameterValue>;

/// Parameters for a single scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParameters {
    /// Calibration the parameters were initialised from.
    pub preset: Preset,

    // Horizon
    /// Number of periods T.
    /// Default: 60
    pub n_periods: usize,
    /// Length of one period (yr).
    /// Default: 10.0
    pub timestep: FloatValue,
    /// Calendar year of period 0.
    pub start_year: FloatValue,

    // Submodel selectors
    pub productivity_model: ProductivityVariant,
    pub emissions_model: EmissionsVariant,
    pub carbon_model: CarbonVariant,
    pub temperature_model: TemperatureVariant,
    pub damages_model: DamagesVariant,
    pub consumption_model: ConsumptionVariant,
    pub utility_model: UtilityVariant,

    // Policy switches
    /// Derive the control rate from the treaty emissions caps.
    pub treaty: bool,
    /// Derive the control rate from the carbon tax schedule.
    pub carbon_tax: bool,
    /// Cumulative fossil fuel limit (GtC).
    /// Default: 6000.0
    pub fosslim: FloatValue,

    // Treaty schedule: fraction of period-0 industrial emissions cut by each year
    pub e2050: FloatValue,
    pub e2100: FloatValue,
    pub e2150: FloatValue,
    // Treaty participation
    pub p2050: FloatValue,
    pub p2100: FloatValue,
    pub p2150: FloatValue,
    pub pmax: FloatValue,
    // Carbon tax ($/tC)
    pub c2050: FloatValue,
    pub c2100: FloatValue,
    pub c2150: FloatValue,
    pub cmax: FloatValue,

    // Population and technology
    /// Population at period 0 (millions).
    pub population_init: FloatValue,
    /// Population convergence rate.
    pub population_growth: FloatValue,
    /// Asymptotic population (millions).
    pub popasym: FloatValue,
    /// Total factor productivity at period 0.
    pub productivity_init: FloatValue,
    /// Initial growth rate of TFP per period.
    pub productivity_growth_init: FloatValue,
    /// Decline rate of TFP growth (per yr).
    pub productivity_decline: FloatValue,
    /// Capital elasticity in the production function.
    pub output_elasticity: FloatValue,
    /// Gross output at period 0 (trillions USD).
    pub output_init: FloatValue,
    /// Capital stock at period 0 (trillions USD).
    pub capital_init: FloatValue,
    /// Depreciation rate of capital (per yr).
    pub depreciation: FloatValue,
    /// Savings rate, fraction of net output.
    pub savings: FloatValue,

    // Emissions
    /// Carbon intensity of output at period 0 (GtC per trillion USD).
    pub intensity_init: FloatValue,
    /// Initial growth of carbon intensity per period.
    pub intensity_growth: FloatValue,
    /// Decline rate of decarbonisation (per yr).
    pub intensity_decline_rate: FloatValue,
    /// Quadratic term of the decarbonisation decline.
    pub intensity_quadratic: FloatValue,
    /// Land use emissions at period 0 (GtC/yr).
    pub emissions_deforest_init: FloatValue,

    // Carbon cycle
    /// Reservoir transfer coefficients per period, `carbon_matrix[from][to]`
    /// over (atmosphere, upper ocean, lower ocean).
    pub carbon_matrix: [[FloatValue; 3]; 3],
    /// Atmospheric carbon at period 0 (GtC).
    pub mass_atmosphere_init: FloatValue,
    /// Upper ocean carbon at period 0 (GtC).
    pub mass_upper_init: FloatValue,
    /// Lower ocean carbon at period 0 (GtC).
    pub mass_lower_init: FloatValue,
    /// Pre-industrial atmospheric carbon (GtC).
    pub mass_preindustrial: FloatValue,
    /// BEAM reservoir masses at period 0 (GtC).
    pub beam_mass_atmosphere_init: FloatValue,
    pub beam_mass_upper_init: FloatValue,
    pub beam_mass_lower_init: FloatValue,

    // Climate
    /// Forcing of non-CO2 greenhouse gases at period 0 (W/m^2).
    pub forcing_ghg_init: FloatValue,
    /// Forcing of non-CO2 greenhouse gases from period 10 on (W/m^2).
    pub forcing_ghg_future: FloatValue,
    /// Forcing from a doubling of atmospheric CO2 (W/m^2).
    pub forcing_co2_doubling: FloatValue,
    /// Equilibrium temperature response to CO2 doubling (degC).
    pub temp_co2_doubling: FloatValue,
    /// Atmosphere temperature at period 0 (degC above 1900).
    pub temp_atmosphere_init: FloatValue,
    /// Lower ocean temperature at period 0 (degC above 1900).
    pub temp_lower_init: FloatValue,
    /// Speed of adjustment of atmosphere temperature.
    pub c1: FloatValue,
    /// Heat transfer from atmosphere to lower ocean.
    pub c3: FloatValue,
    /// Heat transfer from lower ocean to atmosphere.
    pub c4: FloatValue,

    // Damages
    /// Linear damage coefficient.
    pub a1: FloatValue,
    /// Damage coefficient on temperature raised to `damages_exponent`.
    pub damages_coefficient: FloatValue,
    pub damages_exponent: FloatValue,
    /// Fraction of damages that hits productivity (productivity fraction damages).
    pub prod_frac: FloatValue,
    pub damages_multiplier: FloatValue,
    pub catastrophic_rate: FloatValue,
    pub catastrophic_threshold: FloatValue,
    pub catastrophic_exponent: FloatValue,
    pub catastrophic_gate: FloatValue,

    // Abatement cost
    /// Backstop price at period 0 (thousands USD per tC).
    pub backstop_init: FloatValue,
    /// Ratio of initial to final backstop price.
    pub backstop_ratio: FloatValue,
    /// Decline rate of the backstop price.
    pub backstop_decline: FloatValue,
    /// Exponent of the abatement cost curve.
    pub abatement_exponent: FloatValue,
    /// Control rate at period 0.
    pub miu_init: FloatValue,
    /// Control rate of the baseline regime after period 0.
    pub miu_floor: FloatValue,

    // Discounting
    /// Elasticity of marginal utility of consumption.
    pub elasmu: FloatValue,
    /// Pure rate of social time preference (per yr).
    pub prstp: FloatValue,
    /// Annual rate used by constant consumption discounting.
    pub constant_discount_rate: FloatValue,

    // Optimisation
    pub solver: SolverKind,
    /// Finite difference step for the welfare gradient.
    pub opt_epsilon: FloatValue,
    /// Scale applied to welfare before it is handed to the solver.
    pub opt_scale: FloatValue,
    pub opt_tolerance: FloatValue,
    pub opt_max_iterations: usize,
    pub opt_max_seconds: FloatValue,
    /// Number of final periods pinned to full abatement.
    pub opt_pinned_tail: usize,

    // Social cost of carbon
    /// Number of early periods with an SCC evaluation.
    pub scc_periods: usize,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self::dice_2007()
    }
}

impl ModelParameters {
    /// DICE2007 calibration.
    pub fn dice_2007() -> Self {
        Self {
            preset: Preset::Dice2007,

            n_periods: 60,
            timestep: 10.0,
            start_year: 2005.0,

            productivity_model: ProductivityVariant::Dice2007,
            emissions_model: EmissionsVariant::Dice2007,
            carbon_model: CarbonVariant::Dice,
            temperature_model: TemperatureVariant::TwoBox,
            damages_model: DamagesVariant::Dice2007,
            consumption_model: ConsumptionVariant::Ramsey,
            utility_model: UtilityVariant::Crra,

            treaty: false,
            carbon_tax: false,
            fosslim: 6000.0,

            e2050: 1.0,
            e2100: 1.0,
            e2150: 1.0,
            p2050: 1.0,
            p2100: 1.0,
            p2150: 1.0,
            pmax: 1.0,
            c2050: 0.0,
            c2100: 0.0,
            c2150: 0.0,
            cmax: 500.0,

            population_init: 6514.0,
            population_growth: 0.35,
            popasym: 8600.0,
            productivity_init: 0.02722,
            productivity_growth_init: 0.092,
            productivity_decline: 0.001,
            output_elasticity: 0.3,
            output_init: 55.667,
            capital_init: 137.0,
            depreciation: 0.1,
            savings: 0.22,

            intensity_init: 0.13418,
            intensity_growth: -0.073,
            intensity_decline_rate: 0.003,
            intensity_quadratic: 0.0,
            emissions_deforest_init: 1.1,

            carbon_matrix: [
                [0.810712, 0.189288, 0.0],
                [0.097213, 0.852787, 0.05],
                [0.0, 0.003119, 0.996881],
            ],
            mass_atmosphere_init: 808.9,
            mass_upper_init: 1255.0,
            mass_lower_init: 18365.0,
            mass_preindustrial: 592.14,
            beam_mass_atmosphere_init: 808.9,
            beam_mass_upper_init: 725.0,
            beam_mass_lower_init: 35641.0,

            forcing_ghg_init: -0.06,
            forcing_ghg_future: 0.30,
            forcing_co2_doubling: 3.8,
            temp_co2_doubling: 3.0,
            temp_atmosphere_init: 0.7307,
            temp_lower_init: 0.0068,
            c1: 0.220,
            c3: 0.310,
            c4: 0.050,

            a1: 0.0,
            damages_coefficient: 0.0028388,
            damages_exponent: 2.0,
            prod_frac: 0.05,
            damages_multiplier: 1.25,
            catastrophic_rate: 0.00644,
            catastrophic_threshold: 4.0,
            catastrophic_exponent: 3.0,
            catastrophic_gate: 0.0,

            backstop_init: 1.17,
            backstop_ratio: 2.0,
            backstop_decline: 0.05,
            abatement_exponent: 2.8,
            miu_init: 0.005,
            miu_floor: 0.0,

            elasmu: 2.0,
            prstp: 0.015,
            constant_discount_rate: 0.03,

            solver: SolverKind::ProjectedGradient,
            opt_epsilon: 1e-8,
            opt_scale: 1e-4,
            opt_tolerance: 1e-5,
            opt_max_iterations: 30,
            opt_max_seconds: 60.0,
            opt_pinned_tail: 20,

            scc_periods: 20,
        }
    }

    /// DICE2010 calibration.
    pub fn dice_2010() -> Self {
        Self {
            preset: Preset::Dice2010,
            productivity_model: ProductivityVariant::Dice2010,
            emissions_model: EmissionsVariant::Dice2010,

            temp_co2_doubling: 3.2,
            productivity_decline: 0.009,
            intensity_decline_rate: 0.00646,
            popasym: 8700.0,
            elasmu: 1.5,

            population_init: 6411.0,
            population_growth: 0.5,
            productivity_init: 0.0303220,
            productivity_growth_init: 0.16,
            output_init: 55.34,

            intensity_init: 0.14452,
            intensity_growth: 0.158,

            carbon_matrix: [
                [0.88, 0.12, 0.0],
                [0.04704, 0.94796, 0.005],
                [0.0, 0.00075, 0.99925],
            ],
            mass_atmosphere_init: 787.0,
            mass_upper_init: 1600.0,
            mass_lower_init: 10100.0,

            forcing_ghg_init: 0.83,
            temp_atmosphere_init: 0.83,
            c1: 0.208,
            c3: 0.310,

            backstop_init: 1.26,
            ..Self::dice_2007()
        }
    }

    /// DICE2013 calibration on 5-year periods.
    pub fn dice_2013() -> Self {
        let b12 = 0.088;
        let b23 = 0.0025;
        let b21 = b12 * 588.0 / 1350.0;
        let b32 = b23 * 1350.0 / 10000.0;

        Self {
            preset: Preset::Dice2013,
            n_periods: 120,
            timestep: 5.0,
            start_year: 2010.0,

            productivity_model: ProductivityVariant::Dice2013,
            emissions_model: EmissionsVariant::Dice2010,
            damages_model: DamagesVariant::Dice2013,

            intensity_init: 0.489 * CARBON_PER_CO2,
            intensity_growth: -0.01,
            intensity_decline_rate: 0.001,
            emissions_deforest_init: 1.54,
            miu_init: 0.039,
            elasmu: 1.45,

            population_init: 6838.0,
            population_growth: 0.134,
            popasym: 10500.0,
            output_init: 63.69,
            capital_init: 135.0,
            savings: 0.25,
            productivity_init: 3.8,
            productivity_growth_init: 0.079,
            productivity_decline: 0.006,
            backstop_init: 1.26,

            carbon_matrix: [
                [1.0 - b12, b12, 0.0],
                [b21, 1.0 - b21 - b23, b23],
                [0.0, b32, 1.0 - b32],
            ],
            mass_atmosphere_init: 830.4,
            mass_upper_init: 1527.0,
            mass_lower_init: 10010.0,

            forcing_ghg_init: -0.06,
            forcing_ghg_future: 0.62,
            temp_co2_doubling: 3.2,
            temp_atmosphere_init: 0.83,
            c1: 0.104,
            c3: 0.155,
            c4: 0.025,

            damages_coefficient: 0.002131,
            ..Self::dice_2007()
        }
    }

    /// Parameters for a named calibration.
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Dice2007 => Self::dice_2007(),
            Preset::Dice2010 => Self::dice_2010(),
            Preset::Dice2013 => Self::dice_2013(),
        }
    }

    /// Build parameters from a flat configuration map.
    ///
    /// The optional `preset` entry selects the calibration; every other entry
    /// overrides a single field. Unknown names and values that do not fit the
    /// field (including unknown variant names) fail with the field named.
    pub fn from_map(map: &ParameterMap) -> DiceResult<Self> {
        let preset = match map.get("preset") {
            None => Preset::Dice2007,
            Some(ParameterValue::Text(name)) => name.parse()?,
            Some(other) => {
                return Err(DiceError::InvalidParameter {
                    name: "preset".to_string(),
                    reason: format!("expected a preset name, got {:?}", other),
                })
            }
        };

        tracing::debug!(preset = %preset, overrides = map.len(), "building parameters");
        let mut parameters = Self::from_preset(preset);
        parameters.apply_overrides(map.iter().filter(|(name, _)| name.as_str() != "preset"))?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Override individual fields by name.
    ///
    /// Overrides are applied one at a time so that a failure names the offending
    /// parameter. The parameters are left untouched on failure.
    pub fn apply_overrides<'a, I>(&mut self, overrides: I) -> DiceResult<()>
    where
        I: IntoIterator<Item = (&'a String, &'a ParameterValue)>,
    {
        let mut fields = match serde_json::to_value(&*self)? {
            serde_json::Value::Object(fields) => fields,
            _ => return Err(DiceError::Error("parameters must serialise to a map".into())),
        };

        for (name, value) in overrides {
            if !fields.contains_key(name) {
                return Err(DiceError::UnknownParameter(name.clone()));
            }
            fields.insert(name.clone(), value.to_json());
            if let Err(e) =
                serde_json::from_value::<ModelParameters>(serde_json::Value::Object(fields.clone()))
            {
                return Err(DiceError::InvalidParameter {
                    name: name.clone(),
                    reason: e.to_string(),
                });
            }
        }

        *self = serde_json::from_value(serde_json::Value::Object(fields))?;
        Ok(())
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> DiceResult<()> {
        fn invalid(name: &str, reason: impl Into<String>) -> DiceError {
            DiceError::InvalidParameter {
                name: name.to_string(),
                reason: reason.into(),
            }
        }

        if self.n_periods < 2 {
            return Err(invalid("n_periods", "horizon needs at least 2 periods"));
        }
        if !(self.timestep > 0.0) {
            return Err(invalid("timestep", "must be positive"));
        }
        if self.treaty && self.carbon_tax {
            return Err(invalid(
                "carbon_tax",
                "cannot be combined with `treaty`; choose one policy regime",
            ));
        }
        if !(0.0..=1.0).contains(&self.miu_init) {
            return Err(invalid("miu_init", "control rate must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.miu_floor) {
            return Err(invalid("miu_floor", "control rate must lie in [0, 1]"));
        }
        if !(0.0..1.0).contains(&self.savings) {
            return Err(invalid("savings", "must lie in [0, 1)"));
        }
        if !(self.abatement_exponent > 1.0) {
            return Err(invalid("abatement_exponent", "must be greater than 1"));
        }
        if self.elasmu < 0.0 {
            return Err(invalid("elasmu", "must be non-negative"));
        }
        if !(self.mass_preindustrial > 0.0) {
            return Err(invalid("mass_preindustrial", "must be positive"));
        }
        if !(self.population_init > 0.0) {
            return Err(invalid("population_init", "must be positive"));
        }
        if !(self.opt_epsilon > 0.0) {
            return Err(invalid("opt_epsilon", "must be positive"));
        }
        if self.opt_pinned_tail >= self.n_periods {
            return Err(invalid(
                "opt_pinned_tail",
                format!("must be smaller than the horizon ({})", self.n_periods),
            ));
        }
        if self.scc_periods > self.n_periods - 1 {
            return Err(invalid(
                "scc_periods",
                format!("must not exceed {}", self.n_periods - 1),
            ));
        }
        Ok(())
    }

    /// Numeric user-visible parameters by name.
    pub fn user_parameters(&self) -> BTreeMap<String, FloatValue> {
        let fields = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        USER_PARAMETERS
            .iter()
            .filter_map(|name| {
                fields
                    .get(*name)
                    .and_then(|v| v.as_f64())
                    .map(|v| (name.to_string(), v))
            })
            .collect()
    }

    /// Time of period `t` measured in years from period 0.
    pub fn years_since_start(&self, period: usize) -> FloatValue {
        period as FloatValue * self.timestep
    }

    /// Calendar year of period `t`.
    pub fn year(&self, period: usize) -> FloatValue {
        self.start_year + self.years_since_start(period)
    }
}
