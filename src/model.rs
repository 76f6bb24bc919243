//! Period stepping and full scenario runs.
//!
//! [`StepFunction`] advances a [`StateTable`] by one period by calling the seven
//! submodels in dependency order. [`Model`] drives the step function over the
//! whole horizon, optionally across a batch of control vectors in parallel, and
//! [`Scenario`] is the entry point used by callers: it owns the parameters,
//! runs the optimiser and the social cost of carbon when requested, and shapes
//! the output.

use crate::optimizer::{OptimizationReport, PolicyOptimizer};
use crate::output::ScenarioOutput;
use crate::scc;
use ndarray::Array1;
use rayon::prelude::*;
use webdice_components::{
    CarbonComponent, ConsumptionComponent, DamagesComponent, EmissionsComponent,
    ProductivityComponent, TemperatureComponent, UtilityComponent,
};
use webdice_core::errors::{DiceError, DiceResult};
use webdice_core::parameters::{ModelParameters, ParameterMap};
use webdice_core::state::{FloatValue, StateTable, Variable};
use webdice_core::submodel::{
    CarbonModel, ConsumptionModel, DamagesModel, EmissionsModel, ProductivityModel,
    StepInputs, TemperatureModel, UtilityModel,
};

/// The seven submodels, resolved from the parameters' variant selectors.
#[derive(Debug, Clone)]
pub struct StepFunction {
    timestep: FloatValue,
    productivity: ProductivityComponent,
    emissions: EmissionsComponent,
    carbon: CarbonComponent,
    temperature: TemperatureComponent,
    damages: DamagesComponent,
    consumption: ConsumptionComponent,
    utility: UtilityComponent,
}

impl StepFunction {
    pub fn from_parameters(parameters: &ModelParameters) -> Self {
        Self {
            timestep: parameters.timestep,
            productivity: ProductivityComponent::from_parameters(parameters),
            emissions: EmissionsComponent::from_parameters(parameters),
            carbon: CarbonComponent::from_parameters(parameters),
            temperature: TemperatureComponent::from_parameters(parameters),
            damages: DamagesComponent::from_parameters(parameters),
            consumption: ConsumptionComponent::from_parameters(parameters),
            utility: UtilityComponent::from_parameters(parameters),
        }
    }

    /// Compute every variable at `period` from the inputs and the previous period.
    pub fn step(&self, period: usize, state: &mut StateTable, inputs: &StepInputs) {
        let productivity = self.productivity.get_model_values(period, state);
        productivity.apply(state, period);
        if period > 0 {
            // Damages to productivity apply after gross output is computed
            let factor = self
                .damages
                .production_factor(state.get(Variable::TempAtmosphere, period - 1));
            if factor != 1.0 {
                state.set(
                    Variable::Productivity,
                    period,
                    productivity.productivity * factor.powf(self.timestep),
                );
            }
        }

        self.emissions
            .get_model_values(period, state, inputs)
            .apply(state, period);

        self.carbon.get_model_values(period, state).apply(state, period);
        let forcing = self.carbon.forcing(period, state);
        state.set(Variable::Forcing, period, forcing);

        self.temperature
            .get_model_values(period, state)
            .apply(state, period);
        self.damages.get_model_values(period, state).apply(state, period);
        self.consumption
            .get_model_values(period, state)
            .apply(state, period);
        self.utility.get_model_values(period, state).apply(state, period);
    }
}

/// Total discounted utility of a completed run.
pub fn welfare(state: &StateTable) -> FloatValue {
    state.column(Variable::UtilityDiscounted).sum()
}

/// Drives the step function across the horizon of one scenario.
#[derive(Debug, Clone)]
pub struct Model {
    parameters: ModelParameters,
    step_function: StepFunction,
}

impl Model {
    pub fn from_parameters(parameters: ModelParameters) -> Self {
        let step_function = StepFunction::from_parameters(&parameters);
        Self {
            parameters,
            step_function,
        }
    }

    pub fn parameters(&self) -> &ModelParameters {
        &self.parameters
    }

    pub fn n_periods(&self) -> usize {
        self.parameters.n_periods
    }

    /// Step a single period.
    pub fn step(&self, period: usize, state: &mut StateTable, inputs: &StepInputs) {
        self.step_function.step(period, state, inputs);
    }

    /// Run every period in order on a freshly seeded state.
    ///
    /// With a control vector the control rate of each period is taken from it;
    /// otherwise the configured policy regime decides. When `with_scc` is set the
    /// social cost of carbon is computed on the completed trajectory.
    pub fn run_loop(
        &self,
        control: Option<&Array1<FloatValue>>,
        with_scc: bool,
    ) -> DiceResult<StateTable> {
        let n_periods = self.n_periods();
        if let Some(control) = control {
            if control.len() != n_periods {
                return Err(DiceError::ControlLength {
                    expected: n_periods,
                    actual: control.len(),
                });
            }
        }

        let mut state = StateTable::seeded(&self.parameters);
        for period in 0..n_periods {
            let inputs = StepInputs {
                miu: control.map(|c| c[period]),
                emissions_shock: 0.0,
            };
            self.step(period, &mut state, &inputs);
        }

        if with_scc {
            let values = scc::social_cost_of_carbon(self, &state, control);
            state.set_column(Variable::Scc, &values);
        }
        Ok(state)
    }

    /// Run several independent control vectors in parallel.
    ///
    /// Results are returned in the order of `controls`.
    pub fn run_batch(&self, controls: &[Array1<FloatValue>]) -> DiceResult<Vec<StateTable>> {
        controls
            .par_iter()
            .map(|control| self.run_loop(Some(control), false))
            .collect()
    }
}

/// Options for [`Scenario::run_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Search for the welfare maximising control path.
    pub optimize: bool,
    /// Compute the social cost of carbon.
    pub scc: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            optimize: false,
            scc: true,
        }
    }
}

/// Results of a scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    pub state: StateTable,
    pub welfare: FloatValue,
    /// Present when the run was optimised.
    pub optimization: Option<OptimizationReport>,
}

/// A configured scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    model: Model,
}

impl Scenario {
    /// Create a scenario from validated parameters.
    pub fn new(parameters: ModelParameters) -> DiceResult<Self> {
        parameters.validate()?;
        Ok(Self {
            model: Model::from_parameters(parameters),
        })
    }

    /// Create a scenario from a flat name → value configuration.
    ///
    /// The `preset` entry, if any, selects the calibration before the remaining
    /// entries are applied.
    pub fn from_config(config: &ParameterMap) -> DiceResult<Self> {
        Self::new(ModelParameters::from_map(config)?)
    }

    pub fn parameters(&self) -> &ModelParameters {
        self.model.parameters()
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Replace the parameters between runs.
    pub fn set_parameters(&mut self, parameters: ModelParameters) -> DiceResult<()> {
        parameters.validate()?;
        self.model = Model::from_parameters(parameters);
        Ok(())
    }

    /// Run the scenario with the social cost of carbon filled in.
    pub fn run(&self, optimize: bool) -> DiceResult<StateTable> {
        Ok(self
            .run_with(RunOptions {
                optimize,
                scc: true,
            })?
            .state)
    }

    /// Run the scenario.
    pub fn run_with(&self, options: RunOptions) -> DiceResult<ScenarioRun> {
        let parameters = self.parameters();
        tracing::info!(
            preset = %parameters.preset,
            n_periods = parameters.n_periods,
            optimize = options.optimize,
            scc = options.scc,
            "running scenario"
        );

        let optimization = if options.optimize {
            Some(PolicyOptimizer::new(&self.model).optimize()?)
        } else {
            None
        };

        let control = optimization.as_ref().map(|report| &report.miu);
        let state = self.model.run_loop(control, options.scc)?;
        let welfare = welfare(&state);
        tracing::info!(welfare, "scenario complete");

        Ok(ScenarioRun {
            state,
            welfare,
            optimization,
        })
    }

    /// Flat output mapping of a completed run.
    pub fn output(&self, state: &StateTable) -> ScenarioOutput {
        ScenarioOutput::new(self.parameters(), state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use webdice_core::variants::DamagesVariant;

    #[test]
    fn test_run_loop_fills_horizon() {
        let model = Model::from_parameters(ModelParameters::default());
        let state = model.run_loop(None, false).unwrap();

        assert_eq!(state.n_periods(), 60);
        for t in 0..60 {
            assert!(state.get(Variable::GrossOutput, t) > 0.0, "period {}", t);
            assert!(state.get(Variable::UtilityDiscounted, t).is_finite());
        }
    }

    #[test]
    fn test_control_length_checked() {
        let model = Model::from_parameters(ModelParameters::default());
        let control = Array1::zeros(10);

        let err = model.run_loop(Some(&control), false).unwrap_err();
        assert!(matches!(
            err,
            DiceError::ControlLength {
                expected: 60,
                actual: 10
            }
        ));
    }

    #[test]
    fn test_batch_matches_sequential() {
        let model = Model::from_parameters(ModelParameters::default());
        let controls: Vec<Array1<FloatValue>> = [0.0, 0.3, 0.8]
            .iter()
            .map(|level| {
                let mut control = Array1::from_elem(60, *level);
                control[0] = 0.005;
                control
            })
            .collect();

        let batch = model.run_batch(&controls).unwrap();

        assert_eq!(batch.len(), 3);
        for (control, state) in controls.iter().zip(batch.iter()) {
            let sequential = model.run_loop(Some(control), false).unwrap();
            assert_eq!(&sequential, state);
        }
    }

    #[test]
    fn test_supplied_control_written() {
        let model = Model::from_parameters(ModelParameters::default());
        let control = Array1::linspace(0.0, 1.0, 60);

        let state = model.run_loop(Some(&control), false).unwrap();

        for t in 0..60 {
            assert_relative_eq!(state.get(Variable::Miu, t), control[t]);
        }
    }

    #[test]
    fn test_productivity_fraction_reduces_productivity() {
        let base = Model::from_parameters(ModelParameters::default());
        let fraction = Model::from_parameters(ModelParameters {
            damages_model: DamagesVariant::ProductivityFraction,
            ..ModelParameters::default()
        });

        let base = base.run_loop(None, false).unwrap();
        let fraction = fraction.run_loop(None, false).unwrap();

        assert_eq!(
            base.get(Variable::Productivity, 0),
            fraction.get(Variable::Productivity, 0)
        );
        assert!(fraction.get(Variable::Productivity, 10) < base.get(Variable::Productivity, 10));
    }

    #[test]
    fn test_set_parameters_validates() {
        let mut scenario = Scenario::new(ModelParameters::default()).unwrap();
        let invalid = ModelParameters {
            n_periods: 1,
            ..ModelParameters::default()
        };

        assert!(scenario.set_parameters(invalid).is_err());
        assert_eq!(scenario.parameters().n_periods, 60);
    }
}
