//! Fixed-step ODE integration.
//!
//! Classic RK4 over a caller-supplied time grid, with optional substeps
//! between grid points. Used as the cross-check integrator for the
//! step response; the exact discretization lives in `response`.

use ndarray::{Array1, Array2};

use crate::model::StateSpaceModel;

/// Trait representing an ODE system: dy/dt = f(t, y)
pub trait OdeSystem {
    /// The state type
    type State: Clone + StateAddMul;

    /// Compute the right-hand side of the ODE system
    fn rhs(&self, t: f64, state: &Self::State) -> Self::State;
}

/// state + scalar * other, without touching `self`.
pub trait StateAddMul {
    /// `self + scalar * other`
    fn add_mul(&self, other: &Self, scalar: f64) -> Self;
}

impl<const N: usize> StateAddMul for [f64; N] {
    #[inline(always)]
    fn add_mul(&self, other: &Self, scalar: f64) -> Self {
        std::array::from_fn(|k| self[k] + other[k] * scalar)
    }
}

impl StateAddMul for Array1<f64> {
    #[inline(always)]
    fn add_mul(&self, other: &Self, scalar: f64) -> Self {
        self + &(other * scalar)
    }
}

/// Single RK4 step.
#[inline(always)]
pub fn rk4_step<S: OdeSystem>(system: &S, t: f64, state: &S::State, h: f64) -> S::State {
    let h2 = 0.5 * h;

    // k1 = f(t, y)
    let k1 = system.rhs(t, state);

    // k2 = f(t + h/2, y + h/2 * k1)
    let k2 = system.rhs(t + h2, &state.add_mul(&k1, h2));

    // k3 = f(t + h/2, y + h/2 * k2)
    let k3 = system.rhs(t + h2, &state.add_mul(&k2, h2));

    // k4 = f(t + h, y + h * k3)
    let k4 = system.rhs(t + h, &state.add_mul(&k3, h));

    // y_new = y + h/6 * (k1 + 2*k2 + 2*k3 + k4)
    let sum = k1.add_mul(&k2, 2.0).add_mul(&k3, 2.0).add_mul(&k4, 1.0);
    state.add_mul(&sum, h / 6.0)
}

/// Integrate from `state0` at `t_eval[0]`, returning the state at every
/// point of `t_eval`. `substeps` RK4 steps are taken between grid points.
pub fn integrate_trajectory<S: OdeSystem>(
    system: &S,
    t_eval: &[f64],
    state0: &S::State,
    substeps: usize,
) -> Vec<S::State> {
    let substeps = substeps.max(1);
    let mut result = Vec::with_capacity(t_eval.len());
    if t_eval.is_empty() {
        return result;
    }

    let mut state = state0.clone();
    result.push(state.clone());

    for window in t_eval.windows(2) {
        let (t0, t1) = (window[0], window[1]);
        let dt = (t1 - t0) / substeps as f64;

        let mut curr_t = t0;
        for _ in 0..substeps {
            state = rk4_step(system, curr_t, &state, dt);
            curr_t += dt;
        }
        result.push(state.clone());
    }

    result
}

/// ẋ = A·x + B·u for a constant input vector `u`.
pub struct ConstantInputSystem {
    a: Array2<f64>,
    bu: Array1<f64>,
}

impl ConstantInputSystem {
    /// Freeze `B·u` for the given input.
    pub fn new(model: &StateSpaceModel, input: &Array1<f64>) -> Self {
        Self { a: model.a().clone(), bu: model.b().dot(input) }
    }
}

impl OdeSystem for ConstantInputSystem {
    type State = Array1<f64>;

    fn rhs(&self, _t: f64, state: &Array1<f64>) -> Array1<f64> {
        self.a.dot(state) + &self.bu
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // Simple harmonic oscillator for testing: [x, v]
    struct HarmonicOscillator {
        k: f64, // spring constant
        m: f64, // mass
    }

    impl OdeSystem for HarmonicOscillator {
        type State = [f64; 2];

        fn rhs(&self, _t: f64, state: &[f64; 2]) -> [f64; 2] {
            [state[1], -self.k / self.m * state[0]]
        }
    }

    #[test]
    fn test_rk4_step_moves_state() {
        let system = HarmonicOscillator { k: 1.0, m: 1.0 };
        let state1 = rk4_step(&system, 0.0, &[1.0, 0.0], 0.1);
        assert!(state1[0] < 1.0);
        assert!(state1[1] < 0.0);
    }

    #[test]
    fn test_oscillator_period() {
        let system = HarmonicOscillator { k: 4.0, m: 1.0 };
        // ω = 2, so x(t) = cos(2t)
        let t_eval: Vec<f64> = (0..=100).map(|i| i as f64 * 0.01).collect();
        let trajectory = integrate_trajectory(&system, &t_eval, &[1.0, 0.0], 4);

        assert_eq!(trajectory.len(), t_eval.len());
        for (t, state) in t_eval.iter().zip(&trajectory) {
            assert_relative_eq!(state[0], (2.0 * t).cos(), epsilon = 1e-8);
            assert_relative_eq!(state[1], -2.0 * (2.0 * t).sin(), epsilon = 1e-8);
        }
    }

    #[test]
    fn test_empty_grid() {
        let system = HarmonicOscillator { k: 1.0, m: 1.0 };
        assert!(integrate_trajectory(&system, &[], &[1.0, 0.0], 1).is_empty());
    }

    #[test]
    fn test_constant_input_decay() {
        // ẋ = -2x + 1·u, u = 3 → x(t) = 1.5 (1 - e^{-2t})
        let model = StateSpaceModel::new(
            array![[-2.0]],
            array![[1.0]],
            array![[1.0]],
            array![[0.0]],
        )
        .unwrap();
        let system = ConstantInputSystem::new(&model, &array![3.0]);
        let t_eval: Vec<f64> = (0..=20).map(|i| i as f64 * 0.05).collect();
        let trajectory = integrate_trajectory(&system, &t_eval, &array![0.0], 2);

        let last = trajectory.last().unwrap();
        assert_relative_eq!(last[0], 1.5 * (1.0 - (-2.0_f64).exp()), epsilon = 1e-7);
    }
}
