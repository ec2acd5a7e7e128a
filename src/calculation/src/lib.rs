//! Linearized model of a single-axis magnetic-levitation ball.
//!
//! A steel ball hangs below an electromagnet, held at a nominal gap by the
//! coil current. This library provides:
//! - Equilibrium current from the force law F = Ke·i²/a²
//! - Linearization into a continuous-time state-space model (A, B, C, D)
//! - Eigen-analysis and open-loop stability classification
//! - Step response of the linear model (exact ZOH or RK4)
//! - Ball position series for external renderers
//!
//! Everything here is a pure function over immutable inputs. Printing,
//! plotting and animation live in the `maglev` binary.
//!
//! # Example
//!
//! ```
//! use maglev_calc::{PhysicalConstants, linearize, eigenvalues, is_stable, step_response};
//!
//! let constants = PhysicalConstants::reference();
//! let (equilibrium, model) = linearize(&constants).unwrap();
//! assert!(equilibrium.current > 0.0);
//!
//! let spectrum = eigenvalues(&model);
//! assert!(!is_stable(&spectrum));
//!
//! let trajectory = step_response(&model, 2.0, 1000).unwrap();
//! assert_eq!(trajectory.len(), 1000);
//! ```

#![warn(missing_docs)]
#![warn(clippy::doc_markdown)]
#![allow(clippy::len_without_is_empty)]

pub mod analysis;
pub mod constants;
pub mod error;
pub mod model;
pub mod ode;
pub mod position;
pub mod report;
pub mod response;

// Re-export key types and functions for easy use
pub use analysis::{EigenMethod, EigenSpectrum, Stability, eigenvalues, eigenvalues_with, is_stable};
pub use constants::PhysicalConstants;
pub use constants::settings::{ResponseMethod, SimulationSettings};
pub use error::{MaglevError, Result};
pub use model::{
    EquilibriumPoint, StateSpaceModel, build_state_space_model, compute_equilibrium_current, linearize,
};
pub use position::BallPositionSeries;
pub use report::{AnalysisReport, analyze};
pub use response::{Trajectory, step_response, step_response_with};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
