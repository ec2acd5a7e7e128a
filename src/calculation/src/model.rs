//! Equilibrium and linearized state-space model of the levitated ball.
//!
//! Nonlinear plant, with position `x` measured downward from the magnet face:
//!
//! ```text
//! m·ẍ = m·g − ke·i²/x²
//! L·di/dt = −R·i + u
//! ```
//!
//! Linearizing around `(x = a0, ẋ = 0, i = i0)` with state
//! `[Δx, Δẋ, Δi]` and input `Δu` gives the matrices built here. The
//! force gains are lumped as `ke·i0²/(m·a0³)` (position) and
//! `ke·i0/(m·a0²)` (current), both positive. The positive (2,1) entry
//! makes the open-loop plant unstable.

use ndarray::{Array2, array};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::PhysicalConstants;
use crate::error::{MaglevError, Result};

/// Dimension of the state vector (position, velocity, current).
pub const STATE_DIM: usize = 3;

/// Coil current balancing gravity at the nominal gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumPoint {
    /// Equilibrium current i0 (A)
    pub current: f64,
    /// Gap at which the balance holds (m)
    pub gap: f64,
}

impl EquilibriumPoint {
    /// Equilibrium at the nominal gap of `constants`.
    pub fn from_constants(constants: &PhysicalConstants) -> Result<Self> {
        let current = compute_equilibrium_current(constants)?;
        Ok(Self { current, gap: constants.nominal_gap })
    }

    /// Magnetic force minus weight at this point (N). Zero up to rounding.
    pub fn force_residual(&self, constants: &PhysicalConstants) -> f64 {
        constants.force(self.current, self.gap) - constants.weight()
    }
}

/// Solve ke·i²/a0² = m·g for the positive current.
pub fn compute_equilibrium_current(constants: &PhysicalConstants) -> Result<f64> {
    constants.validate()?;

    let radicand = constants.weight() * constants.nominal_gap.powi(2) / constants.ke;
    if !radicand.is_finite() || radicand < 0.0 {
        return Err(MaglevError::Domain(format!(
            "equilibrium requires i0² = {radicand}, no real current exists"
        )));
    }

    let current = radicand.sqrt();
    debug!(current, gap = constants.nominal_gap, "equilibrium current");
    Ok(current)
}

/// Continuous-time LTI model ẋ = A·x + B·u, y = C·x + D·u.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSpaceModel {
    a: Array2<f64>,
    b: Array2<f64>,
    c: Array2<f64>,
    d: Array2<f64>,
}

impl StateSpaceModel {
    /// Assemble a model, checking that the four matrices are conformable
    /// and hold only finite entries.
    pub fn new(a: Array2<f64>, b: Array2<f64>, c: Array2<f64>, d: Array2<f64>) -> Result<Self> {
        let n = a.nrows();
        check_shape("A", a.dim(), (n, n))?;
        check_shape("B", b.dim(), (n, b.ncols()))?;
        check_shape("C", c.dim(), (c.nrows(), n))?;
        check_shape("D", d.dim(), (c.nrows(), b.ncols()))?;
        for (name, m) in [("A", &a), ("B", &b), ("C", &c), ("D", &d)] {
            if m.iter().any(|v| !v.is_finite()) {
                return Err(MaglevError::Domain(format!("matrix {name} has non-finite entries")));
            }
        }
        Ok(Self { a, b, c, d })
    }

    /// State matrix.
    pub fn a(&self) -> &Array2<f64> {
        &self.a
    }

    /// Input matrix.
    pub fn b(&self) -> &Array2<f64> {
        &self.b
    }

    /// Output matrix.
    pub fn c(&self) -> &Array2<f64> {
        &self.c
    }

    /// Feedthrough matrix.
    pub fn d(&self) -> &Array2<f64> {
        &self.d
    }

    /// System order.
    pub fn nstates(&self) -> usize {
        self.a.nrows()
    }

    /// Number of inputs.
    pub fn ninputs(&self) -> usize {
        self.b.ncols()
    }

    /// Number of outputs.
    pub fn noutputs(&self) -> usize {
        self.c.nrows()
    }
}

fn check_shape(matrix: &'static str, actual: (usize, usize), expected: (usize, usize)) -> Result<()> {
    if actual != expected {
        return Err(MaglevError::DimensionMismatch { matrix, expected, actual });
    }
    Ok(())
}

/// Linearize the plant around `equilibrium_current` at the nominal gap.
pub fn build_state_space_model(
    constants: &PhysicalConstants,
    equilibrium_current: f64,
) -> Result<StateSpaceModel> {
    constants.validate()?;
    if !equilibrium_current.is_finite() || equilibrium_current <= 0.0 {
        return Err(MaglevError::Domain(format!(
            "equilibrium current must be positive, got {equilibrium_current}"
        )));
    }

    let PhysicalConstants { mass: m, ke, resistance: r, inductance: l, nominal_gap: a0, .. } =
        *constants;
    let i0 = equilibrium_current;

    // ∂(ẍ)/∂x: closer ball, stronger pull
    let a21 = ke * i0.powi(2) / (m * a0.powi(3));
    // ∂(ẍ)/∂i
    let a23 = ke * i0 / (m * a0.powi(2));

    let a = array![
        [0.0, 1.0, 0.0],
        [a21, 0.0, a23],
        [0.0, 0.0, -r / l],
    ];
    let b = array![[0.0], [0.0], [1.0 / l]];
    let c = Array2::eye(STATE_DIM);
    let d = Array2::zeros((c.nrows(), b.ncols()));

    debug!(a21, a23, a33 = -r / l, b3 = 1.0 / l, "linearized model");
    StateSpaceModel::new(a, b, c, d)
}

/// Equilibrium and linear model in one call.
pub fn linearize(constants: &PhysicalConstants) -> Result<(EquilibriumPoint, StateSpaceModel)> {
    let equilibrium = EquilibriumPoint::from_constants(constants)?;
    let model = build_state_space_model(constants, equilibrium.current)?;
    Ok((equilibrium, model))
}
