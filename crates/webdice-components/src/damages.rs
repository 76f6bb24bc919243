//! Damages component
//!
//! Climate damages Ω and abatement cost Λ both reduce gross output Y. Net output is
//!
//! $$ Q = \frac{(Y - \Lambda)(Y - \Omega)}{Y} $$
//!
//! Abatement cost follows the backstop cost curve, scaled up when only part of
//! the world participates in the control regime:
//!
//! $$ \Lambda = \min\left(Y, Y \phi^{1-\theta} \theta_1 \mu^\theta\right) $$
//!
//! The variants differ in the damage function. The productivity fraction variant
//! additionally moves part of the damages onto total factor productivity, and the
//! incommensurable variant treats environmental goods as an additive consumption
//! good, solving net output directly.

use crate::constants::{
    DICE_2013_DAMAGES_BOUND_EXPONENT, INCOMMENSURABLE_C25D, TIPPING_EXPONENT_HIGH,
    TIPPING_SCALE_HIGH, TIPPING_SCALE_LOW,
};
use serde::{Deserialize, Serialize};
use webdice_core::parameters::ModelParameters;
use webdice_core::schedules;
use webdice_core::state::{FloatValue, StateTable, Variable};
use webdice_core::submodel::{DamagesModel, DamagesValues};
use webdice_core::variants::DamagesVariant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamagesComponent {
    variant: DamagesVariant,
    parameters: ModelParameters,
}

impl DamagesComponent {
    pub fn from_parameters(parameters: &ModelParameters) -> Self {
        Self {
            variant: parameters.damages_model,
            parameters: parameters.clone(),
        }
    }

    /// Damage polynomial `a1 T + a2 T^a3`. Negative anomalies count as no warming.
    fn damage_polynomial(&self, temp_atmosphere: FloatValue) -> FloatValue {
        let p = &self.parameters;
        let t = temp_atmosphere.max(0.0);
        p.a1 * t + p.damages_coefficient * t.powf(p.damages_exponent)
    }

    /// Abatement cost (trillion USD).
    pub fn abatement(
        &self,
        gross_output: FloatValue,
        miu: FloatValue,
        backstop_growth: FloatValue,
        participation: FloatValue,
    ) -> FloatValue {
        if miu <= 0.0 || gross_output <= 0.0 {
            return 0.0;
        }
        let theta = self.parameters.abatement_exponent;
        let cost = gross_output
            * participation.powf(1.0 - theta)
            * backstop_growth
            * miu.powf(theta);
        // An infinite cost (no participation) saturates at gross output
        gross_output.min(cost)
    }

    /// Climate damages (trillion USD) for every variant but the incommensurable one.
    pub fn damages(&self, gross_output: FloatValue, temp_atmosphere: FloatValue) -> FloatValue {
        let p = &self.parameters;
        match self.variant {
            DamagesVariant::Dice2007 | DamagesVariant::Incommensurable => {
                gross_output * (1.0 - 1.0 / (1.0 + self.damage_polynomial(temp_atmosphere)))
            }
            DamagesVariant::ExponentialMap => {
                gross_output * (1.0 - (-self.damage_polynomial(temp_atmosphere)).exp())
            }
            DamagesVariant::TippingPoint => {
                let t = temp_atmosphere.max(0.0);
                gross_output
                    * (1.0
                        - 1.0
                            / (1.0
                                + (t / TIPPING_SCALE_LOW).powi(2)
                                + (t / TIPPING_SCALE_HIGH).powf(TIPPING_EXPONENT_HIGH)))
            }
            DamagesVariant::ProductivityFraction => {
                let remaining = 1.0 / (1.0 + self.damage_polynomial(temp_atmosphere))
                    / self.production_factor(temp_atmosphere);
                gross_output * (1.0 - remaining)
            }
            DamagesVariant::Dice2013 => {
                let t = temp_atmosphere.max(0.0);
                let d = p.a1 * t
                    + p.damages_multiplier * p.damages_coefficient * t.powf(p.damages_exponent)
                    + p.catastrophic_rate
                        * p.catastrophic_gate
                        * (t / p.catastrophic_threshold).powf(p.catastrophic_exponent);
                gross_output * d / (1.0 + d.powi(DICE_2013_DAMAGES_BOUND_EXPONENT))
            }
        }
    }

    /// Net output after damages and abatement.
    pub fn output(
        &self,
        gross_output: FloatValue,
        damages: FloatValue,
        abatement: FloatValue,
    ) -> FloatValue {
        if gross_output <= 0.0 {
            return 0.0;
        }
        (gross_output - abatement) * (gross_output - damages) / gross_output
    }

    /// Net output with incommensurable environmental goods.
    fn incommensurable_output(
        &self,
        gross_output: FloatValue,
        abatement: FloatValue,
        temp_atmosphere: FloatValue,
    ) -> FloatValue {
        let savings = self.parameters.savings;
        let consumption_no_damages = (gross_output - abatement) * (1.0 - savings);
        let consumption = consumption_no_damages
            / (1.0
                + consumption_no_damages
                    * INCOMMENSURABLE_C25D
                    * temp_atmosphere.max(0.0).powf(self.parameters.damages_exponent));
        consumption / (1.0 - savings)
    }
}

impl DamagesModel for DamagesComponent {
    fn get_model_values(&self, period: usize, state: &StateTable) -> DamagesValues {
        let gross_output = state.get(Variable::GrossOutput, period);
        let temp_atmosphere = state.get(Variable::TempAtmosphere, period);

        let participation = schedules::participation(&self.parameters, period);
        let abatement = self.abatement(
            gross_output,
            state.get(Variable::Miu, period),
            state.get(Variable::BackstopGrowth, period),
            participation,
        );

        let (damages, output) = match self.variant {
            DamagesVariant::Incommensurable => {
                let output = self.incommensurable_output(gross_output, abatement, temp_atmosphere);
                (gross_output - abatement - output, output)
            }
            _ => {
                let damages = self.damages(gross_output, temp_atmosphere);
                (damages, self.output(gross_output, damages, abatement))
            }
        };

        let output_abate = if gross_output > 0.0 {
            abatement / gross_output * 100.0
        } else {
            0.0
        };

        DamagesValues {
            participation,
            abatement,
            damages,
            output,
            output_abate,
        }
    }

    fn production_factor(&self, temp_atmosphere: FloatValue) -> FloatValue {
        match self.variant {
            DamagesVariant::ProductivityFraction => {
                let damage_fraction =
                    1.0 - 1.0 / (1.0 + self.damage_polynomial(temp_atmosphere));
                1.0 - self.parameters.prod_frac * damage_fraction
            }
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use is_close::is_close;

    fn component(variant: DamagesVariant) -> DamagesComponent {
        let params = ModelParameters {
            damages_model: variant,
            catastrophic_gate: 1.0,
            ..ModelParameters::default()
        };
        DamagesComponent::from_parameters(&params)
    }

    fn state(gross_output: FloatValue, temp: FloatValue, miu: FloatValue) -> StateTable {
        let mut state = StateTable::new(3);
        state.set(Variable::GrossOutput, 1, gross_output);
        state.set(Variable::TempAtmosphere, 1, temp);
        state.set(Variable::Miu, 1, miu);
        state.set(Variable::BackstopGrowth, 1, 0.05);
        state
    }

    #[test]
    fn test_dice_2007_values() {
        let component = component(DamagesVariant::Dice2007);
        let values = component.get_model_values(1, &state(100.0, 2.0, 0.5));

        let damages = 100.0 * (1.0 - 1.0 / (1.0 + 0.0028388 * 4.0));
        let abatement = 100.0 * 0.05 * 0.5_f64.powf(2.8);
        assert_relative_eq!(values.damages, damages, epsilon = 1e-10);
        assert_relative_eq!(values.abatement, abatement, epsilon = 1e-10);
        assert_relative_eq!(
            values.output,
            (100.0 - abatement) * (100.0 - damages) / 100.0,
            epsilon = 1e-10
        );
        assert_relative_eq!(values.output_abate, abatement, epsilon = 1e-10);
        assert_eq!(values.participation, 1.0);
    }

    #[test]
    fn test_no_warming_no_damages() {
        for variant in DamagesVariant::ALL {
            let component = component(*variant);
            let values = component.get_model_values(1, &state(80.0, 0.0, 0.0));
            assert!(
                is_close!(values.damages, 0.0, abs_tol = 1e-12),
                "{}: {}",
                variant,
                values.damages
            );
            assert_relative_eq!(values.output, 80.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_cooling_has_no_damages() {
        for variant in DamagesVariant::ALL {
            let component = component(*variant);
            let values = component.get_model_values(1, &state(80.0, -0.5, 0.0));
            assert!(
                is_close!(values.damages, 0.0, abs_tol = 1e-12),
                "{}: {}",
                variant,
                values.damages
            );
            assert_relative_eq!(values.output, 80.0, epsilon = 1e-10);
            assert_eq!(component.production_factor(-0.5), 1.0, "{}", variant);
        }
    }

    #[test]
    fn test_damages_increase_with_temperature() {
        for variant in DamagesVariant::ALL {
            let component = component(*variant);
            let mild = component.get_model_values(1, &state(80.0, 1.0, 0.0)).damages;
            let hot = component.get_model_values(1, &state(80.0, 4.0, 0.0)).damages;
            assert!(hot > mild, "{}: {} <= {}", variant, hot, mild);
            assert!(hot < 80.0);
        }
    }

    #[test]
    fn test_abatement_bounded_by_gross_output() {
        let component = component(DamagesVariant::Dice2007);
        assert_eq!(component.abatement(50.0, 1.0, 5.0, 1.0), 50.0);
        assert_eq!(component.abatement(50.0, 0.5, 0.05, 0.0), 50.0);
        assert_eq!(component.abatement(50.0, 0.0, 0.05, 0.0), 0.0);
    }

    #[test]
    fn test_zero_gross_output() {
        let component = component(DamagesVariant::Dice2007);
        let values = component.get_model_values(1, &state(0.0, 2.0, 0.5));
        assert_eq!(values.output, 0.0);
        assert_eq!(values.output_abate, 0.0);
    }

    #[test]
    fn test_production_factor() {
        assert_eq!(component(DamagesVariant::Dice2007).production_factor(3.0), 1.0);

        let fraction = component(DamagesVariant::ProductivityFraction);
        let factor = fraction.production_factor(3.0);
        let damage_fraction = 1.0 - 1.0 / (1.0 + 0.0028388 * 9.0);
        assert_relative_eq!(factor, 1.0 - 0.05 * damage_fraction, epsilon = 1e-12);
        // Damages on output are reduced by the share moved to productivity
        assert!(
            fraction.damages(100.0, 3.0)
                < component(DamagesVariant::Dice2007).damages(100.0, 3.0)
        );
    }

    #[test]
    fn test_incommensurable_output() {
        let component = component(DamagesVariant::Incommensurable);
        let values = component.get_model_values(1, &state(100.0, 3.0, 0.0));

        let cnd = 100.0 * (1.0 - 0.22);
        let consumption = cnd / (1.0 + cnd * 1.4771e-05 * 9.0);
        assert_relative_eq!(values.output, consumption / (1.0 - 0.22), epsilon = 1e-10);
        assert_relative_eq!(values.damages, 100.0 - values.output, epsilon = 1e-10);
    }

    #[test]
    fn test_treaty_participation() {
        let params = ModelParameters {
            treaty: true,
            p2050: 0.5,
            ..ModelParameters::default()
        };
        let component = DamagesComponent::from_parameters(&params);
        let values = component.get_model_values(1, &state(100.0, 1.0, 0.5));

        assert_relative_eq!(values.participation, 0.5);
        // Partial participation raises the cost of a given control rate
        let full = component.abatement(100.0, 0.5, 0.05, 1.0);
        assert!(values.abatement > full);
    }
}
