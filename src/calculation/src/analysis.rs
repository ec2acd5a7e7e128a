//! Eigen-analysis and stability classification of the linear model.
//!
//! Eigenvalues come back in whatever order the decomposition produces, so
//! spectra are compared as multisets (see [`EigenSpectrum::approx_eq_multiset`]).
//!
//! Two independent routes are provided:
//! - **Schur**: real Schur factorization of A (nalgebra), the default
//! - **Characteristic polynomial**: Faddeev–LeVerrier coefficients, then
//!   Durand–Kerner simultaneous root iteration

use std::fmt;

use nalgebra::{Complex, DMatrix};
use ndarray::Array2;
use tracing::{debug, trace};

use crate::model::StateSpaceModel;

/// Iteration cap for the Durand–Kerner root finder.
const MAX_ROOT_ITERATIONS: usize = 500;

/// Relative size below which an imaginary part is treated as rounding noise.
const IMAG_NOISE: f64 = 1e-12;

/// Eigen-decomposition route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EigenMethod {
    /// Real Schur factorization of A.
    #[default]
    Schur,
    /// Roots of det(λI − A).
    CharacteristicPolynomial,
}

/// Eigenvalues of A, in decomposition order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EigenSpectrum {
    /// Eigenvalues, possibly complex
    pub values: Vec<Complex<f64>>,
}

impl EigenSpectrum {
    /// Wrap eigenvalues as computed.
    pub fn new(values: Vec<Complex<f64>>) -> Self {
        Self { values }
    }

    /// Number of eigenvalues, with multiplicity.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when A has no states.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Eigenvalues in decomposition order.
    pub fn iter(&self) -> impl Iterator<Item = &Complex<f64>> {
        self.values.iter()
    }

    /// Largest real part, or `None` for an empty spectrum.
    pub fn max_real_part(&self) -> Option<f64> {
        self.values.iter().map(|z| z.re).reduce(f64::max)
    }

    /// See [`is_stable`].
    pub fn is_stable(&self) -> bool {
        is_stable(self)
    }

    /// Same multiset of values within `tol` (relative to magnitude, with an
    /// absolute floor of `tol`). Each value is matched to its nearest unused
    /// counterpart, so order does not matter.
    pub fn approx_eq_multiset(&self, other: &EigenSpectrum, tol: f64) -> bool {
        if self.len() != other.len() {
            return false;
        }

        let mut used = vec![false; other.len()];
        for z in &self.values {
            let nearest = other
                .values
                .iter()
                .enumerate()
                .filter(|(k, _)| !used[*k])
                .map(|(k, w)| (k, (z - w).norm()))
                .min_by(|a, b| a.1.total_cmp(&b.1));

            match nearest {
                Some((k, dist)) if dist <= tol * (1.0 + z.norm()) => used[k] = true,
                _ => return false,
            }
        }
        true
    }
}

/// Open-loop stability classification, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    /// Every eigenvalue strictly in the left half-plane
    Stable,
    /// At least one eigenvalue with a non-negative real part
    Unstable,
}

impl From<bool> for Stability {
    fn from(stable: bool) -> Self {
        if stable { Stability::Stable } else { Stability::Unstable }
    }
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stability::Stable => write!(f, "stable"),
            Stability::Unstable => write!(f, "unstable"),
        }
    }
}

/// Eigenvalues of the model's A matrix via real Schur factorization.
pub fn eigenvalues(model: &StateSpaceModel) -> EigenSpectrum {
    eigenvalues_with(model, EigenMethod::Schur)
}

/// Eigenvalues of A through the chosen route.
pub fn eigenvalues_with(model: &StateSpaceModel, method: EigenMethod) -> EigenSpectrum {
    let a = model.a();
    let values = match method {
        EigenMethod::Schur => schur_eigenvalues(a),
        EigenMethod::CharacteristicPolynomial => {
            let coeffs = characteristic_polynomial(a);
            trace!(?coeffs, "characteristic polynomial");
            polynomial_roots(&coeffs)
        }
    };

    let spectrum = EigenSpectrum::new(values.into_iter().map(clean_rounding).collect());
    debug!(?method, eigenvalues = ?spectrum.values, "spectrum of A");
    spectrum
}

/// True iff every eigenvalue has a strictly negative real part.
/// Zero, purely imaginary and empty spectra are not stable.
pub fn is_stable(spectrum: &EigenSpectrum) -> bool {
    !spectrum.is_empty() && spectrum.iter().all(|z| z.re < 0.0)
}

/// Convert an ndarray matrix to nalgebra's dense type.
pub(crate) fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

fn schur_eigenvalues(a: &Array2<f64>) -> Vec<Complex<f64>> {
    if a.is_empty() {
        return Vec::new();
    }
    to_dmatrix(a).complex_eigenvalues().iter().copied().collect()
}

/// Coefficients `[c0, c1, ..., c_{n-1}, 1]` of det(λI − A), lowest degree first.
pub fn characteristic_polynomial(a: &Array2<f64>) -> Vec<f64> {
    let n = a.nrows();
    let mut coeffs = vec![0.0; n + 1];
    coeffs[n] = 1.0;

    // Faddeev–LeVerrier: M_k = A·M_{k-1} + c_{n-k+1}·I, c_{n-k} = -tr(A·M_k)/k
    let identity = Array2::<f64>::eye(n);
    let mut m = Array2::<f64>::zeros((n, n));
    for k in 1..=n {
        m = a.dot(&m) + &(&identity * coeffs[n - k + 1]);
        let am = a.dot(&m);
        coeffs[n - k] = -am.diag().sum() / k as f64;
    }
    coeffs
}

/// Roots of a monic polynomial given lowest-degree-first coefficients.
pub fn polynomial_roots(coeffs: &[f64]) -> Vec<Complex<f64>> {
    let degree = coeffs.len().saturating_sub(1);
    if degree == 0 {
        return Vec::new();
    }

    let eval = |z: Complex<f64>| {
        coeffs.iter().rev().fold(Complex::new(0.0, 0.0), |acc, &c| acc * z + c)
    };

    // Fujiwara bound on root magnitude
    let radius = (1..=degree)
        .map(|k| (coeffs[degree - k] / coeffs[degree]).abs().powf(1.0 / k as f64))
        .fold(0.0_f64, f64::max)
        .max(1.0)
        * 2.0;

    let seed = Complex::new(0.4_f64, 0.9);
    let mut roots: Vec<Complex<f64>> = (0..degree)
        .map(|k| seed.powu(k as u32 + 1) / seed.norm().powi(k as i32 + 1) * radius)
        .collect();

    for iteration in 0..MAX_ROOT_ITERATIONS {
        let mut max_step = 0.0_f64;
        for k in 0..degree {
            let zk = roots[k];
            let denom = roots
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != k)
                .fold(Complex::new(coeffs[degree], 0.0), |acc, (_, &zj)| acc * (zk - zj));
            if denom.norm() == 0.0 {
                continue;
            }
            let step = eval(zk) / denom;
            roots[k] = zk - step;
            max_step = max_step.max(step.norm() / (1.0 + zk.norm()));
        }
        if max_step < 1e-15 {
            trace!(iteration, "Durand–Kerner converged");
            break;
        }
    }
    roots
}

fn clean_rounding(z: Complex<f64>) -> Complex<f64> {
    if z.im.abs() <= IMAG_NOISE * (1.0 + z.re.abs()) {
        Complex::new(z.re, 0.0)
    } else {
        z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PhysicalConstants;
    use crate::model::linearize;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn model_from_a(a: Array2<f64>) -> StateSpaceModel {
        let n = a.nrows();
        StateSpaceModel::new(a, Array2::zeros((n, 1)), Array2::eye(n), Array2::zeros((n, 1))).unwrap()
    }

    fn reference_spectrum() -> EigenSpectrum {
        let g_over_a0: f64 = 9.81 / 0.007;
        EigenSpectrum::new(vec![
            Complex::new(g_over_a0.sqrt(), 0.0),
            Complex::new(-g_over_a0.sqrt(), 0.0),
            Complex::new(-10.0 / 0.4125, 0.0),
        ])
    }

    #[test]
    fn test_reference_is_unstable() {
        let (_, model) = linearize(&PhysicalConstants::reference()).unwrap();
        let spectrum = eigenvalues(&model);

        assert_eq!(spectrum.len(), 3);
        assert!(!is_stable(&spectrum));
        assert!(spectrum.max_real_part().unwrap() > 0.0);
        assert_relative_eq!(spectrum.max_real_part().unwrap(), 37.43566, epsilon = 1e-4);
        assert!(spectrum.approx_eq_multiset(&reference_spectrum(), 1e-9));
    }

    #[test]
    fn test_methods_agree() {
        let (_, model) = linearize(&PhysicalConstants::reference()).unwrap();
        let schur = eigenvalues_with(&model, EigenMethod::Schur);
        let poly = eigenvalues_with(&model, EigenMethod::CharacteristicPolynomial);
        assert!(schur.approx_eq_multiset(&poly, 1e-9));
        assert!(poly.approx_eq_multiset(&schur, 1e-9));
    }

    #[test]
    fn test_complex_pair() {
        // Damped oscillator: λ = -1 ± 2i, plus a real pole at -3
        let a = array![[0.0, 1.0, 0.0], [-5.0, -2.0, 0.0], [0.0, 0.0, -3.0]];
        let model = model_from_a(a);
        let expected = EigenSpectrum::new(vec![
            Complex::new(-1.0, 2.0),
            Complex::new(-1.0, -2.0),
            Complex::new(-3.0, 0.0),
        ]);

        for method in [EigenMethod::Schur, EigenMethod::CharacteristicPolynomial] {
            let spectrum = eigenvalues_with(&model, method);
            assert!(spectrum.approx_eq_multiset(&expected, 1e-9), "{method:?}: {:?}", spectrum);
            assert!(is_stable(&spectrum));
        }
    }

    #[test]
    fn test_marginal_is_not_stable() {
        // Undamped oscillator: λ = ±i
        let oscillator = EigenSpectrum::new(vec![Complex::new(0.0, 1.0), Complex::new(0.0, -1.0)]);
        assert!(!is_stable(&oscillator));

        // Integrator next to a stable pole
        let integrator = EigenSpectrum::new(vec![Complex::new(0.0, 0.0), Complex::new(-4.0, 0.0)]);
        assert!(!is_stable(&integrator));

        assert!(!is_stable(&EigenSpectrum::default()));
        assert_eq!(EigenSpectrum::default().max_real_part(), None);
    }

    #[test]
    fn test_multiset_ignores_order() {
        let a = EigenSpectrum::new(vec![Complex::new(1.0, 0.0), Complex::new(2.0, 0.0)]);
        let b = EigenSpectrum::new(vec![Complex::new(2.0, 0.0), Complex::new(1.0, 0.0)]);
        assert!(a.approx_eq_multiset(&b, 1e-12));

        // multiplicity matters
        let c = EigenSpectrum::new(vec![Complex::new(1.0, 0.0), Complex::new(1.0, 0.0)]);
        assert!(!a.approx_eq_multiset(&c, 1e-12));
        assert!(!a.approx_eq_multiset(&EigenSpectrum::default(), 1e-12));
    }

    #[test]
    fn test_characteristic_polynomial() {
        // det(λI - A) = λ³ + (R/L)λ² - w²λ - w²R/L for the maglev structure
        let a = array![[0.0, 1.0, 0.0], [4.0, 0.0, 1.5], [0.0, 0.0, -2.0]];
        let c = characteristic_polynomial(&a);
        assert_eq!(c.len(), 4);
        assert_relative_eq!(c[3], 1.0);
        assert_relative_eq!(c[2], 2.0, epsilon = 1e-12);
        assert_relative_eq!(c[1], -4.0, epsilon = 1e-12);
        assert_relative_eq!(c[0], -8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_polynomial_roots() {
        // (λ - 1)(λ + 2)(λ - 5) = λ³ - 4λ² - 7λ + 10
        let roots = EigenSpectrum::new(polynomial_roots(&[10.0, -7.0, -4.0, 1.0]));
        let expected = EigenSpectrum::new(vec![
            Complex::new(1.0, 0.0),
            Complex::new(-2.0, 0.0),
            Complex::new(5.0, 0.0),
        ]);
        assert!(roots.approx_eq_multiset(&expected, 1e-9));
        assert!(polynomial_roots(&[1.0]).is_empty());
    }

    #[test]
    fn test_stability_label() {
        assert_eq!(Stability::from(true).to_string(), "stable");
        assert_eq!(Stability::from(false).to_string(), "unstable");
    }
}
