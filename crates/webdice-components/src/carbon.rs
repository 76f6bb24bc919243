//! Carbon cycle component
//!
//! Three carbon reservoirs (atmosphere, upper ocean and biosphere, lower ocean)
//! exchange carbon through a transfer matrix. Total emissions of the previous
//! period enter the atmosphere.
//!
//! The DICE variant applies a fixed transfer matrix once per period:
//!
//! $$ M(t) = B^T M(t-1) + (\Delta t \, E(t-1), 0, 0) $$
//!
//! The BEAM variant integrates the exchange in `2 Δt` explicit Euler sub-steps and
//! re-derives the ocean to atmosphere coefficient from a carbonate chemistry
//! approximation before every sub-step, so ocean uptake weakens as the upper
//! ocean accumulates carbon.
//!
//! Radiative forcing is logarithmic in atmospheric carbon with an exogenous
//! contribution from other greenhouse gases.

use crate::constants::{
    BEAM_A, BEAM_K_1, BEAM_K_2, BEAM_K_A, BEAM_K_D, BEAM_K_D_RETURN, BEAM_MIN_H,
    MIN_CARBON_MASS,
};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use webdice_core::parameters::ModelParameters;
use webdice_core::schedules;
use webdice_core::state::{FloatValue, StateTable, Variable};
use webdice_core::submodel::{CarbonModel, CarbonValues};
use webdice_core::variants::CarbonVariant;

type Reservoirs = Vector3<FloatValue>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarbonComponent {
    variant: CarbonVariant,
    parameters: ModelParameters,
}

impl CarbonComponent {
    pub fn from_parameters(parameters: &ModelParameters) -> Self {
        Self {
            variant: parameters.carbon_model,
            parameters: parameters.clone(),
        }
    }

    /// Reservoir masses at period 0.
    pub fn initial_carbon(&self) -> Reservoirs {
        let p = &self.parameters;
        match self.variant {
            CarbonVariant::Dice => Reservoirs::new(
                p.mass_atmosphere_init,
                p.mass_upper_init,
                p.mass_lower_init,
            ),
            CarbonVariant::Beam => Reservoirs::new(
                p.beam_mass_atmosphere_init,
                p.beam_mass_upper_init,
                p.beam_mass_lower_init,
            ),
        }
    }

    /// Per-period transfer matrix of the DICE variant, indexed `[from][to]`.
    pub fn transfer_matrix(&self) -> Matrix3<FloatValue> {
        let b = &self.parameters.carbon_matrix;
        Matrix3::new(
            b[0][0], b[0][1], b[0][2],
            b[1][0], b[1][1], b[1][2],
            b[2][0], b[2][1], b[2][2],
        )
    }

    fn dice_step(&self, previous: &Reservoirs, emissions: FloatValue) -> Reservoirs {
        self.transfer_matrix().transpose() * previous
            + Reservoirs::new(self.parameters.timestep * emissions, 0.0, 0.0)
    }

    /// Ratio of upper ocean to atmosphere carbon at equilibrium for the
    /// current upper ocean mass.
    fn beam_partition(mass_upper: FloatValue) -> FloatValue {
        let discriminant =
            (5.06546e15 * mass_upper.powi(2) - 7.75282e18 * mass_upper + 2.97321e21).max(0.0);
        let h = (5.21512e-10 * mass_upper + 7.32749e-18 * discriminant.sqrt() - 4e-7)
            .max(BEAM_MIN_H);
        BEAM_A / (1.0 + BEAM_K_1 / h + BEAM_K_1 * BEAM_K_2 / h)
    }

    fn beam_step(&self, previous: &Reservoirs, emissions: FloatValue) -> Reservoirs {
        let ts = self.parameters.timestep;
        let substeps = (2.0 * ts).round().max(1.0);

        let mut m = Matrix3::new(
            -BEAM_K_A, BEAM_K_A, 0.0,
            BEAM_K_A, -BEAM_K_A, BEAM_K_D,
            0.0, BEAM_K_D_RETURN, -BEAM_K_D_RETURN,
        );
        let (mut ma, mut mu, mut ml) = (previous[0], previous[1], previous[2]);

        for _ in 0..substeps as usize {
            let b = Self::beam_partition(mu);
            m[(1, 0)] = BEAM_K_A * b;
            m[(1, 1)] = -BEAM_K_A * b - BEAM_K_D;

            // Sequential update: each reservoir sees the others' new values
            ma += (m[(0, 0)] * ma + m[(1, 0)] * mu + ts * emissions) / substeps;
            mu += (m[(0, 1)] * ma + m[(1, 1)] * mu + m[(2, 1)] * ml) / substeps;
            ml += (m[(1, 2)] * mu + m[(2, 2)] * ml) / substeps;
        }
        Reservoirs::new(ma, mu, ml)
    }
}

impl CarbonModel for CarbonComponent {
    fn get_model_values(&self, period: usize, state: &StateTable) -> CarbonValues {
        let masses = if period == 0 {
            self.initial_carbon()
        } else {
            let previous = Reservoirs::new(
                state.get(Variable::MassAtmosphere, period - 1),
                state.get(Variable::MassUpper, period - 1),
                state.get(Variable::MassLower, period - 1),
            );
            let emissions = state.get(Variable::EmissionsTotal, period - 1);
            match self.variant {
                CarbonVariant::Dice => self.dice_step(&previous, emissions),
                CarbonVariant::Beam => self.beam_step(&previous, emissions),
            }
        };

        CarbonValues {
            mass_atmosphere: masses[0],
            mass_upper: masses[1],
            mass_lower: masses[2],
        }
    }

    fn forcing(&self, period: usize, state: &StateTable) -> FloatValue {
        let p = &self.parameters;
        let mass_atmosphere = state.get(Variable::MassAtmosphere, period).max(MIN_CARBON_MASS);
        p.forcing_co2_doubling * (mass_atmosphere / p.mass_preindustrial).log2()
            + schedules::forcing_ghg(p, period)
    }
}
