//! Welfare maximising emissions control.
//!
//! The decision variable is the control rate of every period. The first
//! period is pinned to `miu_init` and the final `opt_pinned_tail` periods to full
//! abatement; the rest are bounded to [0, 1]. The objective is total
//! discounted utility of a full run, scaled by `opt_scale`, and its gradient is
//! estimated by finite differences with one full rerun per free period. The
//! reruns are independent and are evaluated as a parallel batch.
//!
//! The search itself is delegated to an [`NlpSolver`]. The built-in solver is a
//! projected gradient ascent with Barzilai-Borwein step lengths and Armijo
//! backtracking.

use crate::model::{welfare, Model};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use webdice_core::errors::{DiceError, DiceResult};
use webdice_core::state::FloatValue;
use webdice_core::variants::SolverKind;

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    /// The projected gradient or the step fell below the tolerance
    Converged,
    /// The iteration limit was reached
    MaxIterations,
    /// The wall clock limit was reached
    TimeLimit,
    /// No ascent step could be found along the projected gradient
    LineSearchFailed,
}

impl SolverStatus {
    pub fn converged(&self) -> bool {
        matches!(self, SolverStatus::Converged)
    }
}

/// Box constraints on the decision variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Array1<FloatValue>,
    pub upper: Array1<FloatValue>,
}

impl Bounds {
    /// Project a point onto the box.
    pub fn project(&self, x: &Array1<FloatValue>) -> Array1<FloatValue> {
        let mut projected = x.clone();
        for ((value, lower), upper) in projected
            .iter_mut()
            .zip(self.lower.iter())
            .zip(self.upper.iter())
        {
            *value = value.max(*lower).min(*upper);
        }
        projected
    }

    /// Whether element `i` is fixed by its bounds.
    pub fn is_pinned(&self, i: usize) -> bool {
        self.lower[i] == self.upper[i]
    }
}

/// Objective and gradient of a maximisation problem.
pub trait Objective {
    fn value(&mut self, x: &Array1<FloatValue>) -> DiceResult<FloatValue>;

    fn gradient(&mut self, x: &Array1<FloatValue>) -> DiceResult<Array1<FloatValue>>;
}

/// Final iterate of a solver.
#[derive(Debug, Clone)]
pub struct SolverResult {
    pub x: Array1<FloatValue>,
    pub value: FloatValue,
    pub status: SolverStatus,
    pub iterations: usize,
}

/// A box-constrained nonlinear maximiser.
pub trait NlpSolver {
    fn maximize(
        &self,
        objective: &mut dyn Objective,
        x0: Array1<FloatValue>,
        bounds: &Bounds,
    ) -> DiceResult<SolverResult>;
}

/// Projected gradient ascent.
#[derive(Debug, Clone)]
pub struct ProjectedGradient {
    pub tolerance: FloatValue,
    pub max_iterations: usize,
    pub max_time: Duration,
    /// Length of the first step along the gradient
    pub initial_step: FloatValue,
    /// Required fraction of the linearised increase (Armijo constant)
    pub sufficient_increase: FloatValue,
    /// Steps shorter than this end the line search
    pub min_step: FloatValue,
}

impl Default for ProjectedGradient {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            max_iterations: 30,
            max_time: Duration::from_secs(60),
            initial_step: 1.0,
            sufficient_increase: 1e-4,
            min_step: 1e-12,
        }
    }
}

fn max_abs(x: &Array1<FloatValue>) -> FloatValue {
    x.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

impl NlpSolver for ProjectedGradient {
    fn maximize(
        &self,
        objective: &mut dyn Objective,
        x0: Array1<FloatValue>,
        bounds: &Bounds,
    ) -> DiceResult<SolverResult> {
        let start = Instant::now();

        let mut x = bounds.project(&x0);
        let mut value = objective.value(&x)?;
        let mut gradient = objective.gradient(&x)?;
        let mut step = self.initial_step / max_abs(&gradient).max(1.0);

        for iteration in 0..self.max_iterations {
            let projected_gradient = bounds.project(&(&x + &gradient)) - &x;
            if max_abs(&projected_gradient) < self.tolerance {
                return Ok(SolverResult {
                    x,
                    value,
                    status: SolverStatus::Converged,
                    iterations: iteration,
                });
            }
            if start.elapsed() > self.max_time {
                return Ok(SolverResult {
                    x,
                    value,
                    status: SolverStatus::TimeLimit,
                    iterations: iteration,
                });
            }

            // Backtrack along the projection arc until the increase is sufficient
            let mut alpha = step;
            let (candidate, candidate_value) = loop {
                let candidate = bounds.project(&(&x + &(&gradient * alpha)));
                let candidate_value = objective.value(&candidate)?;
                let predicted = gradient.dot(&(&candidate - &x));
                if candidate_value >= value + self.sufficient_increase * predicted {
                    break (candidate, candidate_value);
                }
                alpha *= 0.5;
                if alpha < self.min_step {
                    tracing::warn!(iteration, value, "line search failed");
                    return Ok(SolverResult {
                        x,
                        value,
                        status: SolverStatus::LineSearchFailed,
                        iterations: iteration,
                    });
                }
            };

            let candidate_gradient = objective.gradient(&candidate)?;
            let s = &candidate - &x;
            let y = &candidate_gradient - &gradient;

            // Barzilai-Borwein step for a maximisation: curvature along s is s.y < 0
            let curvature = s.dot(&y);
            step = if curvature < 0.0 {
                (s.dot(&s) / -curvature).clamp(self.min_step, 1e12)
            } else {
                (alpha * 2.0).min(1e12)
            };

            let change = (candidate_value - value).abs();
            let moved = max_abs(&s);
            x = candidate;
            value = candidate_value;
            gradient = candidate_gradient;

            tracing::debug!(iteration, value, step, "projected gradient iteration");

            if moved < self.tolerance && change <= self.tolerance * value.abs().max(1.0) {
                return Ok(SolverResult {
                    x,
                    value,
                    status: SolverStatus::Converged,
                    iterations: iteration + 1,
                });
            }
        }

        Ok(SolverResult {
            x,
            value,
            status: SolverStatus::MaxIterations,
            iterations: self.max_iterations,
        })
    }
}

/// Cached objective and gradient at one point.
#[derive(Debug, Clone)]
struct Evaluation {
    x: Array1<FloatValue>,
    value: FloatValue,
    gradient: Option<Array1<FloatValue>>,
}

/// Scaled welfare of a full run as a function of the control vector.
///
/// The last evaluated point is memoised so that asking for the value and then
/// the gradient at the same point reruns the model only for the perturbations.
pub struct WelfareObjective<'a> {
    model: &'a Model,
    bounds: Bounds,
    scale: FloatValue,
    epsilon: FloatValue,
    last: Option<Evaluation>,
    evaluations: usize,
}

impl<'a> WelfareObjective<'a> {
    pub fn new(model: &'a Model, bounds: Bounds) -> Self {
        let parameters = model.parameters();
        Self {
            model,
            bounds,
            scale: parameters.opt_scale,
            epsilon: parameters.opt_epsilon,
            last: None,
            evaluations: 0,
        }
    }

    /// Number of full model runs performed so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    fn cached(&self, x: &Array1<FloatValue>) -> Option<&Evaluation> {
        self.last.as_ref().filter(|e| &e.x == x)
    }

    fn run_value(&mut self, x: &Array1<FloatValue>) -> DiceResult<FloatValue> {
        self.evaluations += 1;
        let state = self.model.run_loop(Some(x), false)?;
        Ok(welfare(&state) * self.scale)
    }
}

impl Objective for WelfareObjective<'_> {
    fn value(&mut self, x: &Array1<FloatValue>) -> DiceResult<FloatValue> {
        if let Some(evaluation) = self.cached(x) {
            return Ok(evaluation.value);
        }
        let value = self.run_value(x)?;
        self.last = Some(Evaluation {
            x: x.clone(),
            value,
            gradient: None,
        });
        Ok(value)
    }

    fn gradient(&mut self, x: &Array1<FloatValue>) -> DiceResult<Array1<FloatValue>> {
        if let Some(gradient) = self.cached(x).and_then(|e| e.gradient.clone()) {
            return Ok(gradient);
        }
        let value = self.value(x)?;

        // Forward difference, or backward where the forward step leaves the box
        let free: Vec<usize> = (0..x.len()).filter(|i| !self.bounds.is_pinned(*i)).collect();
        let directions: Vec<FloatValue> = free
            .iter()
            .map(|&i| {
                if x[i] + self.epsilon > self.bounds.upper[i] {
                    -self.epsilon
                } else {
                    self.epsilon
                }
            })
            .collect();
        let controls: Vec<Array1<FloatValue>> = free
            .iter()
            .zip(directions.iter())
            .map(|(&i, step)| {
                let mut perturbed = x.clone();
                perturbed[i] += step;
                perturbed
            })
            .collect();

        let states = self.model.run_batch(&controls)?;
        self.evaluations += states.len();

        let mut gradient = Array1::zeros(x.len());
        for ((&i, step), state) in free.iter().zip(directions.iter()).zip(states.iter()) {
            gradient[i] = (welfare(state) * self.scale - value) / step;
        }

        self.last = Some(Evaluation {
            x: x.clone(),
            value,
            gradient: Some(gradient.clone()),
        });
        Ok(gradient)
    }
}

/// Outcome of a policy optimisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    /// Best control vector found
    pub miu: Array1<FloatValue>,
    /// Unscaled welfare at `miu`
    pub welfare: FloatValue,
    pub status: SolverStatus,
    pub iterations: usize,
    /// Number of full model runs
    pub evaluations: usize,
}

/// Initial control vector: `x^(1-x)` over `linspace(0, 1, n)` for the free
/// periods followed by ones, with period 0 at `miu_init`.
pub fn initial_guess(n_periods: usize, pinned_tail: usize, miu_init: FloatValue) -> Array1<FloatValue> {
    let n_free = n_periods - pinned_tail;
    let ramp: Array1<FloatValue> = Array1::linspace(0.0, 1.0, n_free);
    let mut x0 = Array1::ones(n_periods);
    for (i, v) in ramp.iter().enumerate() {
        x0[i] = v.powf(1.0 - v);
    }
    x0[0] = miu_init;
    x0
}

/// Bounds with period 0 pinned to `miu_init` and the tail pinned to one.
pub fn control_bounds(n_periods: usize, pinned_tail: usize, miu_init: FloatValue) -> Bounds {
    let mut lower = Array1::zeros(n_periods);
    let mut upper = Array1::ones(n_periods);
    for i in (n_periods - pinned_tail)..n_periods {
        lower[i] = 1.0;
    }
    lower[0] = miu_init;
    upper[0] = miu_init;
    Bounds { lower, upper }
}

/// Searches for the control vector that maximises welfare.
pub struct PolicyOptimizer<'a> {
    model: &'a Model,
}

impl<'a> PolicyOptimizer<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self { model }
    }

    fn solver(&self) -> DiceResult<Box<dyn NlpSolver>> {
        let parameters = self.model.parameters();
        match parameters.solver {
            SolverKind::ProjectedGradient => Ok(Box::new(ProjectedGradient {
                tolerance: parameters.opt_tolerance,
                max_iterations: parameters.opt_max_iterations,
                max_time: Duration::from_secs_f64(parameters.opt_max_seconds.max(0.0)),
                ..ProjectedGradient::default()
            })),
            SolverKind::Ipopt => Err(DiceError::SolverUnavailable(
                SolverKind::Ipopt.name().to_string(),
            )),
        }
    }

    pub fn optimize(&self) -> DiceResult<OptimizationReport> {
        let parameters = self.model.parameters();
        let solver = self.solver()?;

        let n_periods = parameters.n_periods;
        let tail = parameters.opt_pinned_tail;
        let bounds = control_bounds(n_periods, tail, parameters.miu_init);
        let x0 = initial_guess(n_periods, tail, parameters.miu_init);

        let mut objective = WelfareObjective::new(self.model, bounds.clone());
        let result = solver.maximize(&mut objective, x0, &bounds)?;

        if !result.status.converged() {
            tracing::warn!(
                status = ?result.status,
                iterations = result.iterations,
                "optimisation did not converge, returning last iterate"
            );
        } else {
            tracing::info!(iterations = result.iterations, "optimisation converged");
        }

        Ok(OptimizationReport {
            welfare: result.value / parameters.opt_scale,
            miu: result.x,
            status: result.status,
            iterations: result.iterations,
            evaluations: objective.evaluations(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use webdice_core::parameters::ModelParameters;

    /// Concave quadratic with its maximum at `target`.
    struct Quadratic {
        target: Array1<FloatValue>,
    }

    impl Objective for Quadratic {
        fn value(&mut self, x: &Array1<FloatValue>) -> DiceResult<FloatValue> {
            Ok(-(x - &self.target).mapv(|v| v * v).sum())
        }

        fn gradient(&mut self, x: &Array1<FloatValue>) -> DiceResult<Array1<FloatValue>> {
            Ok((&self.target - x) * 2.0)
        }
    }

    fn unit_box(n: usize) -> Bounds {
        Bounds {
            lower: Array1::zeros(n),
            upper: Array1::ones(n),
        }
    }

    #[test]
    fn test_projected_gradient_interior_maximum() {
        let mut objective = Quadratic {
            target: Array1::from(vec![0.2, 0.5, 0.9]),
        };
        let result = ProjectedGradient::default()
            .maximize(&mut objective, Array1::zeros(3), &unit_box(3))
            .unwrap();

        assert_eq!(result.status, SolverStatus::Converged);
        for (x, t) in result.x.iter().zip([0.2, 0.5, 0.9]) {
            assert_relative_eq!(*x, t, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_projected_gradient_respects_bounds() {
        let mut objective = Quadratic {
            target: Array1::from(vec![-1.0, 2.0]),
        };
        let result = ProjectedGradient::default()
            .maximize(&mut objective, Array1::from(vec![0.5, 0.5]), &unit_box(2))
            .unwrap();

        assert_relative_eq!(result.x[0], 0.0, epsilon = 1e-8);
        assert_relative_eq!(result.x[1], 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_max_iterations_status() {
        let mut objective = Quadratic {
            target: Array1::from(vec![0.3; 4]),
        };
        let solver = ProjectedGradient {
            max_iterations: 0,
            ..ProjectedGradient::default()
        };
        let result = solver
            .maximize(&mut objective, Array1::zeros(4), &unit_box(4))
            .unwrap();

        assert_eq!(result.status, SolverStatus::MaxIterations);
        assert_eq!(result.x, Array1::<FloatValue>::zeros(4));
    }

    #[test]
    fn test_initial_guess_and_bounds() {
        let x0 = initial_guess(60, 20, 0.005);
        let bounds = control_bounds(60, 20, 0.005);

        assert_eq!(x0.len(), 60);
        assert_eq!(x0[0], 0.005);
        assert_eq!(x0[39], 1.0);
        assert!(x0.iter().skip(40).all(|v| *v == 1.0));
        assert!(x0[10] > 0.0 && x0[10] < 1.0);

        assert!(bounds.is_pinned(0));
        assert!(bounds.is_pinned(45));
        assert!(!bounds.is_pinned(1));
        assert_eq!(bounds.project(&x0), x0);
    }

    #[test]
    fn test_welfare_objective_memoises() {
        let params = ModelParameters {
            n_periods: 10,
            opt_pinned_tail: 2,
            scc_periods: 0,
            ..ModelParameters::default()
        };
        let model = Model::from_parameters(params);
        let bounds = control_bounds(10, 2, 0.005);
        let mut objective = WelfareObjective::new(&model, bounds);
        let x = initial_guess(10, 2, 0.005);

        let value = objective.value(&x).unwrap();
        assert_eq!(objective.evaluations(), 1);
        assert_eq!(objective.value(&x).unwrap(), value);
        assert_eq!(objective.evaluations(), 1);

        let gradient = objective.gradient(&x).unwrap();
        // Seven free periods, one rerun each
        assert_eq!(objective.evaluations(), 8);
        assert_eq!(gradient[0], 0.0);
        assert_eq!(gradient[9], 0.0);
        assert!(gradient.iter().all(|g| g.is_finite()));

        objective.gradient(&x).unwrap();
        assert_eq!(objective.evaluations(), 8);
    }

    fn gradient_with_epsilon(
        epsilon: FloatValue,
        x: &Array1<FloatValue>,
    ) -> Array1<FloatValue> {
        let model = Model::from_parameters(ModelParameters {
            n_periods: 10,
            opt_pinned_tail: 2,
            scc_periods: 0,
            opt_epsilon: epsilon,
            ..ModelParameters::default()
        });
        let mut objective = WelfareObjective::new(&model, control_bounds(10, 2, 0.005));
        objective.gradient(x).unwrap()
    }

    #[test]
    fn test_gradient_insensitive_to_epsilon() {
        let x = initial_guess(10, 2, 0.005);

        let coarse = gradient_with_epsilon(1e-6, &x);
        let fine = gradient_with_epsilon(1e-8, &x);

        for i in 1..8 {
            assert!(coarse[i].abs() > 0.0, "period {} has a zero gradient", i);
            assert_relative_eq!(coarse[i], fine[i], epsilon = 1e-6, max_relative = 1e-3);
        }
    }

    #[test]
    fn test_gradient_at_upper_bound_steps_backward() {
        let mut x = initial_guess(10, 2, 0.005);
        x[3] = 1.0;

        let gradient = gradient_with_epsilon(1e-6, &x);
        assert!(gradient[3].is_finite());
        // Full abatement this early costs more than the avoided damages
        assert!(gradient[3] < 0.0, "gradient at the upper bound = {}", gradient[3]);

        let model = Model::from_parameters(ModelParameters {
            n_periods: 10,
            opt_pinned_tail: 2,
            scc_periods: 0,
            ..ModelParameters::default()
        });
        let step = 1e-4;
        let mut below = x.clone();
        below[3] -= step;
        let at = welfare(&model.run_loop(Some(&x), false).unwrap());
        let left = welfare(&model.run_loop(Some(&below), false).unwrap());
        let expected = (at - left) / step * model.parameters().opt_scale;
        assert_relative_eq!(gradient[3], expected, max_relative = 1e-2);
    }

    #[test]
    fn test_ipopt_unavailable() {
        let model = Model::from_parameters(ModelParameters {
            solver: SolverKind::Ipopt,
            ..ModelParameters::default()
        });

        let err = PolicyOptimizer::new(&model).optimize().unwrap_err();
        assert!(matches!(err, DiceError::SolverUnavailable(_)));
    }
}
