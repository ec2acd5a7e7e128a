//! Human-readable analysis report.
//!
//! The report is assembled completely before anything is formatted, so a
//! failing step never leaves partially printed matrices behind.

use std::fmt;

use nalgebra::Complex;
use ndarray::Array2;

use crate::analysis::{EigenSpectrum, Stability, eigenvalues, is_stable};
use crate::constants::PhysicalConstants;
use crate::error::Result;
use crate::model::{EquilibriumPoint, StateSpaceModel, linearize};

/// Everything the diagnostic report prints, in print order.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// Constants the model was built from
    pub constants: PhysicalConstants,
    /// Operating point
    pub equilibrium: EquilibriumPoint,
    /// Linearized model
    pub model: StateSpaceModel,
    /// Eigenvalues of A
    pub spectrum: EigenSpectrum,
    /// Open-loop verdict
    pub stable: bool,
}

impl AnalysisReport {
    /// Verdict as a printable label.
    pub fn stability(&self) -> Stability {
        Stability::from(self.stable)
    }
}

/// Run the model builder and the eigen-analysis.
pub fn analyze(constants: &PhysicalConstants) -> Result<AnalysisReport> {
    let (equilibrium, model) = linearize(constants)?;
    let spectrum = eigenvalues(&model);
    let stable = is_stable(&spectrum);
    Ok(AnalysisReport { constants: *constants, equilibrium, model, spectrum, stable })
}

/// `37.4357` for real values, `-1.0000 + 2.0000j` for complex ones.
pub fn format_eigenvalue(z: &Complex<f64>) -> String {
    if z.im == 0.0 {
        format!("{:.4}", z.re)
    } else {
        let sign = if z.im < 0.0 { '-' } else { '+' };
        format!("{:.4} {} {:.4}j", z.re, sign, z.im.abs())
    }
}

fn write_matrix(f: &mut fmt::Formatter<'_>, name: &str, m: &Array2<f64>) -> fmt::Result {
    writeln!(f, "Matrix {name}:")?;
    for row in m.rows() {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:>12.4}")).collect();
        writeln!(f, "  [{}]", cells.join(" "))?;
    }
    Ok(())
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Equilibrium current i0 = {:.4} A", self.equilibrium.current)?;
        writeln!(f)?;

        writeln!(f, "System matrices:")?;
        write_matrix(f, "A", self.model.a())?;
        write_matrix(f, "B", self.model.b())?;
        write_matrix(f, "C", self.model.c())?;
        write_matrix(f, "D", self.model.d())?;
        writeln!(f)?;

        writeln!(f, "State-space system:")?;
        writeln!(f, "  Order:   {}", self.model.nstates())?;
        writeln!(f, "  Inputs:  {}", self.model.ninputs())?;
        writeln!(f, "  Outputs: {}", self.model.noutputs())?;
        writeln!(f)?;

        writeln!(f, "Eigenvalues:")?;
        for (k, z) in self.spectrum.iter().enumerate() {
            writeln!(f, "  λ{} = {}", k + 1, format_eigenvalue(z))?;
        }
        writeln!(f)?;

        write!(f, "The system is {}", self.stability())
    }
}
