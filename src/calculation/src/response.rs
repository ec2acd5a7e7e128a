//! Time-domain step response of the linear model.
//!
//! The default route discretizes the continuous model exactly under a
//! zero-order hold:
//!
//! ```text
//! exp([[A, B], [0, 0]]·h) = [[Φ, Γ], [0, I]]
//! x_{k+1} = Φ·x_k + Γ·u
//! ```
//!
//! RK4 on the same ODE is available as a cross-check. An unstable model
//! diverges and the samples are returned as computed.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1, Axis, s};
use tracing::{debug, warn};

use crate::analysis::to_dmatrix;
use crate::constants::settings::{ResponseMethod, SimulationSettings};
use crate::error::{MaglevError, Result};
use crate::model::StateSpaceModel;
use crate::ode::{ConstantInputSystem, integrate_trajectory};

/// Magnitude beyond which a diverging response is logged.
const DIVERGENCE_LOG_THRESHOLD: f64 = 1e12;

/// State samples at evenly spaced instants.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    times: Array1<f64>,
    /// One row per sample, one column per state
    states: Array2<f64>,
}

impl Trajectory {
    /// Pair sample times with state rows; row count must match.
    pub fn new(times: Array1<f64>, states: Array2<f64>) -> Result<Self> {
        if states.nrows() != times.len() {
            return Err(MaglevError::DimensionMismatch {
                matrix: "trajectory states",
                expected: (times.len(), states.ncols()),
                actual: states.dim(),
            });
        }
        Ok(Self { times, states })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True when there are no samples.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Sample instants (s).
    pub fn times(&self) -> &Array1<f64> {
        &self.times
    }

    /// States, one row per sample.
    pub fn states(&self) -> &Array2<f64> {
        &self.states
    }

    /// Number of state components.
    pub fn state_dim(&self) -> usize {
        self.states.ncols()
    }

    /// One state component over time.
    pub fn channel(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.state_dim()).then(|| self.states.column(index))
    }

    /// Position deviation Δx (m).
    pub fn position(&self) -> ArrayView1<'_, f64> {
        self.states.column(0)
    }

    /// Velocity deviation Δẋ (m/s).
    pub fn velocity(&self) -> ArrayView1<'_, f64> {
        self.states.column(1)
    }

    /// Coil current deviation Δi (A).
    pub fn current(&self) -> ArrayView1<'_, f64> {
        self.states.column(2)
    }

    /// `(t, state)` pairs in time order.
    pub fn samples(&self) -> impl Iterator<Item = (f64, ArrayView1<'_, f64>)> {
        self.times.iter().copied().zip(self.states.axis_iter(Axis(0)))
    }

    /// Euclidean norm of the state at every sample.
    pub fn state_norms(&self) -> Array1<f64> {
        self.states.map_axis(Axis(1), |row| row.dot(&row).sqrt())
    }

    /// State at the last sample.
    pub fn final_state(&self) -> Option<ArrayView1<'_, f64>> {
        (!self.is_empty()).then(|| self.states.row(self.len() - 1))
    }
}

/// `sample_count` evenly spaced instants over [0, horizon], both ends included.
pub fn time_grid(horizon: f64, sample_count: usize) -> Result<Array1<f64>> {
    SimulationSettings { horizon, sample_count, method: ResponseMethod::default() }.validate()?;
    let mut grid = Array1::linspace(0.0, horizon, sample_count);
    // pin the end point exactly
    grid[sample_count - 1] = horizon;
    Ok(grid)
}

/// Unit step response from the zero state, via the matrix exponential.
pub fn step_response(model: &StateSpaceModel, horizon: f64, sample_count: usize) -> Result<Trajectory> {
    step_response_with(model, &SimulationSettings { horizon, sample_count, method: ResponseMethod::MatrixExponential })
}

/// Unit step response from the zero state with explicit settings.
pub fn step_response_with(model: &StateSpaceModel, settings: &SimulationSettings) -> Result<Trajectory> {
    settings.validate()?;
    let times = time_grid(settings.horizon, settings.sample_count)?;
    let input = Array1::<f64>::ones(model.ninputs());

    let states = match settings.method {
        ResponseMethod::MatrixExponential => {
            zoh_response(model, &input, settings.sample_interval(), settings.sample_count)
        }
        ResponseMethod::Rk4 { substeps } => {
            let system = ConstantInputSystem::new(model, &input);
            let x0 = Array1::<f64>::zeros(model.nstates());
            let grid = times.to_vec();
            let rows = integrate_trajectory(&system, &grid, &x0, substeps);
            stack_rows(&rows, model.nstates())
        }
    };

    let trajectory = Trajectory::new(times, states)?;
    log_divergence(&trajectory);
    debug!(
        samples = trajectory.len(),
        horizon = settings.horizon,
        method = ?settings.method,
        "step response"
    );
    Ok(trajectory)
}

/// Exact discretization of ẋ = A·x + B·u with constant `u` and step `h`.
fn zoh_response(model: &StateSpaceModel, input: &Array1<f64>, h: f64, sample_count: usize) -> Array2<f64> {
    let n = model.nstates();
    let m = model.ninputs();

    let mut augmented = DMatrix::<f64>::zeros(n + m, n + m);
    augmented.view_mut((0, 0), (n, n)).copy_from(&to_dmatrix(model.a()));
    augmented.view_mut((0, n), (n, m)).copy_from(&to_dmatrix(model.b()));
    let exp = (augmented * h).exp();

    let phi = exp.view((0, 0), (n, n)).into_owned();
    let gamma = exp.view((0, n), (n, m)).into_owned();
    let u = DVector::from_iterator(m, input.iter().copied());
    let forced = &gamma * &u;

    let mut states = Array2::<f64>::zeros((sample_count, n));
    let mut x = DVector::<f64>::zeros(n);
    for k in 1..sample_count {
        x = &phi * &x + &forced;
        for (j, value) in x.iter().enumerate() {
            states[[k, j]] = *value;
        }
    }
    states
}

fn stack_rows(rows: &[Array1<f64>], n: usize) -> Array2<f64> {
    let mut states = Array2::<f64>::zeros((rows.len(), n));
    for (k, row) in rows.iter().enumerate() {
        states.slice_mut(s![k, ..]).assign(row);
    }
    states
}

fn log_divergence(trajectory: &Trajectory) {
    let peak = trajectory.states().iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if !peak.is_finite() || peak > DIVERGENCE_LOG_THRESHOLD {
        warn!(peak, "step response diverges (open-loop unstable model)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PhysicalConstants;
    use crate::model::linearize;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::array;

    fn reference_model() -> StateSpaceModel {
        linearize(&PhysicalConstants::reference()).unwrap().1
    }

    /// Closed-form position response of the maglev model to a unit voltage step.
    fn analytic_position(t: f64) -> f64 {
        let c = PhysicalConstants::reference();
        let i0 = (c.weight() * c.nominal_gap.powi(2) / c.ke).sqrt();
        let w2 = c.gravity / c.nominal_gap;
        let w = w2.sqrt();
        let k = c.ke * i0 / (c.mass * c.nominal_gap.powi(2));
        let p = c.resistance / c.inductance;

        (k / c.inductance)
            * (-1.0 / (p * w2) - (-p * t).exp() / (p * (p * p - w2))
                + (w * t).exp() / (2.0 * w2 * (w + p))
                + (-w * t).exp() / (2.0 * w2 * (p - w)))
    }

    #[test]
    fn test_invalid_horizon() {
        let model = reference_model();
        for (horizon, samples) in [(0.0, 10), (-1.0, 10), (1.0, 1), (1.0, 0), (f64::NAN, 10)] {
            let err = step_response(&model, horizon, samples).unwrap_err();
            assert!(matches!(err, MaglevError::InvalidHorizon { .. }), "{horizon} {samples}");
        }
    }

    #[test]
    fn test_sample_count_and_endpoints() {
        let model = reference_model();
        for samples in [2, 3, 17, 1000] {
            let traj = step_response(&model, 2.0, samples).unwrap();
            assert_eq!(traj.len(), samples);
            assert_eq!(traj.states().dim(), (samples, 3));
            assert_eq!(traj.times()[0], 0.0);
            assert_eq!(traj.times()[samples - 1], 2.0);
            assert!(traj.times().windows(2).into_iter().all(|w| w[1] > w[0]));
        }
    }

    #[test]
    fn test_starts_from_rest() {
        let traj = step_response(&reference_model(), 1.0, 50).unwrap();
        let (t0, x0) = traj.samples().next().unwrap();
        assert_eq!(t0, 0.0);
        assert!(x0.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_matches_closed_form() {
        // h = 0.005, t = 0.5 at k = 100
        let traj = step_response(&reference_model(), 2.0, 401).unwrap();
        assert_relative_eq!(traj.times()[100], 0.5, epsilon = 1e-12);
        assert_relative_eq!(traj.position()[100], analytic_position(0.5), max_relative = 1e-6);
        assert_relative_eq!(traj.position()[400], analytic_position(2.0), max_relative = 1e-6);
    }

    #[test]
    fn test_current_settles_to_one_over_r() {
        let traj = step_response(&reference_model(), 1.0, 200).unwrap();
        let current = traj.current();
        assert_relative_eq!(current[current.len() - 1], 1.0 / 10.0, epsilon = 1e-9);
        assert!(current.windows(2).into_iter().all(|w| w[1] >= w[0] - 1e-15));
    }

    #[test]
    fn test_diverges_over_back_half() {
        let traj = step_response(&reference_model(), 2.0, 1000).unwrap();
        let half = traj.len() / 2;

        let position = traj.position();
        let norms = traj.state_norms();
        for k in half..traj.len() - 1 {
            assert!(position[k + 1].abs() > position[k].abs(), "position stalled at {k}");
            assert!(norms[k + 1] > norms[k], "norm stalled at {k}");
        }
        // e^{37.4·2} growth, not damped
        assert!(position[traj.len() - 1].abs() > 1e25);
        assert!(traj.final_state().unwrap().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_rk4_agrees_with_exponential() {
        let model = reference_model();
        let exact = step_response(&model, 1.0, 200).unwrap();
        let settings = SimulationSettings::new(1.0, 200)
            .unwrap()
            .with_method(ResponseMethod::Rk4 { substeps: 8 });
        let rk4 = step_response_with(&model, &settings).unwrap();

        assert_eq!(exact.times(), rk4.times());
        for (a, b) in exact.states().iter().zip(rk4.states().iter()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-6, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_stable_first_order() {
        // ẋ = -x + u → x(t) = 1 - e^{-t}
        let model = StateSpaceModel::new(array![[-1.0]], array![[1.0]], array![[1.0]], array![[0.0]]).unwrap();
        let traj = step_response(&model, 5.0, 51).unwrap();
        for (t, state) in traj.samples() {
            assert_abs_diff_eq!(state[0], 1.0 - (-t).exp(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_channels() {
        let traj = step_response(&reference_model(), 0.1, 5).unwrap();
        assert!(traj.channel(2).is_some());
        assert!(traj.channel(3).is_none());
        assert_eq!(traj.channel(0).unwrap(), traj.position());
        assert_eq!(traj.channel(1).unwrap(), traj.velocity());
    }

    #[test]
    fn test_time_grid() {
        let grid = time_grid(1.0, 5).unwrap();
        assert_eq!(grid, array![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(time_grid(1.0, 1).is_err());
    }

    #[test]
    fn test_trajectory_shape_check() {
        let err = Trajectory::new(array![0.0, 1.0], Array2::zeros((3, 3)));
        assert!(matches!(err, Err(MaglevError::DimensionMismatch { .. })));
    }
}
