//! Physical constants and run settings for the maglev rig.
//!
//! The reference values describe a steel ball of 68 g hanging 7 mm below a
//! laboratory electromagnet. All quantities are SI.

use serde::{Deserialize, Serialize};

use crate::error::{MaglevError, Result};

/// Physical constants of the ball, coil and environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    /// Ball mass (kg)
    pub mass: f64,

    /// Electromagnetic force coefficient (N·m²/A²)
    /// Force law: F = ke · i² / a²
    pub ke: f64,

    /// Coil resistance (Ω)
    pub resistance: f64,

    /// Coil inductance (H)
    pub inductance: f64,

    /// Gravitational acceleration (m/s²)
    pub gravity: f64,

    /// Nominal air gap between electromagnet face and ball (m)
    pub nominal_gap: f64,
}

impl PhysicalConstants {
    /// Create a validated set of constants.
    pub fn new(
        mass: f64,
        ke: f64,
        resistance: f64,
        inductance: f64,
        gravity: f64,
        nominal_gap: f64,
    ) -> Result<Self> {
        let constants = Self { mass, ke, resistance, inductance, gravity, nominal_gap };
        constants.validate()?;
        Ok(constants)
    }

    /// Constants of the laboratory rig.
    pub const fn reference() -> Self {
        Self {
            mass: 0.068,
            ke: 6.53e-5,
            resistance: 10.0,
            inductance: 0.4125,
            gravity: 9.81,
            nominal_gap: 0.007,
        }
    }

    /// Reference rig with a different ball and operating gap.
    /// Coil and environment keep their reference values.
    pub fn custom(mass: f64, nominal_gap: f64, ke: Option<f64>) -> Result<Self> {
        let reference = Self::reference();
        Self::new(
            mass,
            ke.unwrap_or(reference.ke),
            reference.resistance,
            reference.inductance,
            reference.gravity,
            nominal_gap,
        )
    }

    /// Check that every constant is a strictly positive, finite number.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("mass", self.mass),
            ("ke", self.ke),
            ("resistance", self.resistance),
            ("inductance", self.inductance),
            ("gravity", self.gravity),
            ("nominal_gap", self.nominal_gap),
        ];

        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(MaglevError::InvalidConfiguration(format!(
                    "{name} must be strictly positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Magnetic lift force F = ke · i² / a² (N).
    #[inline(always)]
    pub fn force(&self, current: f64, gap: f64) -> f64 {
        self.ke * current * current / (gap * gap)
    }

    /// Weight of the ball, m · g (N).
    #[inline(always)]
    pub fn weight(&self) -> f64 {
        self.mass * self.gravity
    }

    /// Coil time constant L / R (s).
    pub fn electrical_time_constant(&self) -> f64 {
        self.inductance / self.resistance
    }

    /// Constants as labelled strings, in declaration order.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("m (kg)", format!("{:.4}", self.mass)),
            ("Ke (N·m²/A²)", format!("{:.3e}", self.ke)),
            ("R (Ω)", format!("{:.3}", self.resistance)),
            ("L (H)", format!("{:.4}", self.inductance)),
            ("g (m/s²)", format!("{:.3}", self.gravity)),
            ("a0 (m)", format!("{:.4}", self.nominal_gap)),
        ]
    }

    /// Constants as `[m, ke, R, L, g, a0]`.
    pub fn to_slice(&self) -> [f64; 6] {
        [self.mass, self.ke, self.resistance, self.inductance, self.gravity, self.nominal_gap]
    }

    /// Build from `[m, ke, R, L, g, a0]`.
    pub fn from_slice(p: &[f64]) -> Result<Self> {
        if p.len() != 6 {
            return Err(MaglevError::InvalidConfiguration(format!(
                "physical constants require exactly 6 elements, got {}",
                p.len()
            )));
        }
        Self::new(p[0], p[1], p[2], p[3], p[4], p[5])
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self::reference()
    }
}

/// Time-domain run settings.
pub mod settings {
    use serde::{Deserialize, Serialize};

    use crate::error::{MaglevError, Result};

    /// How the step response is computed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
    #[serde(rename_all = "snake_case")]
    pub enum ResponseMethod {
        /// Zero-order-hold discretization through the matrix exponential.
        #[default]
        MatrixExponential,
        /// Classic fourth-order Runge–Kutta with `substeps` steps per sample.
        Rk4 {
            /// RK4 steps between consecutive samples
            substeps: usize,
        },
    }

    /// Horizon and sampling of a step-response run.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct SimulationSettings {
        /// Simulated time span (s)
        pub horizon: f64,
        /// Number of evenly spaced samples over [0, horizon]
        pub sample_count: usize,
        #[serde(default)]
        pub method: ResponseMethod,
    }

    impl SimulationSettings {
        /// Validated settings using the default response method.
        pub fn new(horizon: f64, sample_count: usize) -> Result<Self> {
            let settings = Self { horizon, sample_count, method: ResponseMethod::default() };
            settings.validate()?;
            Ok(settings)
        }

        /// Same horizon and sampling, another response method.
        pub fn with_method(mut self, method: ResponseMethod) -> Self {
            self.method = method;
            self
        }

        /// Reject a non-positive horizon, fewer than two samples or zero RK4 substeps.
        pub fn validate(&self) -> Result<()> {
            if !self.horizon.is_finite() || self.horizon <= 0.0 || self.sample_count < 2 {
                return Err(MaglevError::InvalidHorizon {
                    horizon: self.horizon,
                    sample_count: self.sample_count,
                });
            }
            if let ResponseMethod::Rk4 { substeps: 0 } = self.method {
                return Err(MaglevError::InvalidConfiguration(
                    "RK4 needs at least one substep per sample".to_string(),
                ));
            }
            Ok(())
        }

        /// Spacing between consecutive samples.
        pub fn sample_interval(&self) -> f64 {
            self.horizon / (self.sample_count - 1) as f64
        }
    }

    impl Default for SimulationSettings {
        fn default() -> Self {
            Self {
                horizon: 2.0,
                sample_count: 1000,
                method: ResponseMethod::MatrixExponential,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::settings::{ResponseMethod, SimulationSettings};
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_constants() {
        let c = PhysicalConstants::reference();
        assert_eq!(c.mass, 0.068);
        assert_eq!(c.ke, 6.53e-5);
        assert_eq!(c.nominal_gap, 0.007);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive() {
        for index in 0..6 {
            let mut p = PhysicalConstants::reference().to_slice();
            p[index] = 0.0;
            let err = PhysicalConstants::from_slice(&p).unwrap_err();
            assert!(matches!(err, MaglevError::InvalidConfiguration(_)));

            p[index] = -1.0;
            assert!(PhysicalConstants::from_slice(&p).is_err());
        }
    }

    #[test]
    fn test_rejects_nan() {
        let err = PhysicalConstants::new(f64::NAN, 6.53e-5, 10.0, 0.4125, 9.81, 0.007);
        assert!(matches!(err, Err(MaglevError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_slice_wrong_length() {
        assert!(PhysicalConstants::from_slice(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_force_and_weight() {
        let c = PhysicalConstants::reference();
        assert_relative_eq!(c.weight(), 0.068 * 9.81, epsilon = 1e-12);
        // 6.53e-5 * 1 / 0.007² = 1.3327 N
        assert_relative_eq!(c.force(1.0, 0.007), 6.53e-5 / 4.9e-5, epsilon = 1e-12);
        assert_relative_eq!(c.electrical_time_constant(), 0.04125, epsilon = 1e-12);
    }

    #[test]
    fn test_custom_keeps_coil() {
        let c = PhysicalConstants::custom(0.05, 0.01, None).unwrap();
        assert_eq!(c.resistance, 10.0);
        assert_eq!(c.inductance, 0.4125);
        assert_eq!(c.mass, 0.05);
        assert!(PhysicalConstants::custom(0.05, -0.01, None).is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let c = PhysicalConstants::reference();
        let json = serde_json::to_string(&c).unwrap();
        let back: PhysicalConstants = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }

    #[test]
    fn test_settings_defaults() {
        let s = SimulationSettings::default();
        assert_eq!(s.horizon, 2.0);
        assert_eq!(s.sample_count, 1000);
        assert_eq!(s.method, ResponseMethod::MatrixExponential);
        assert_relative_eq!(s.sample_interval(), 2.0 / 999.0);
    }

    #[test]
    fn test_settings_validation() {
        assert!(SimulationSettings::new(0.0, 10).is_err());
        assert!(SimulationSettings::new(1.0, 1).is_err());
        assert!(SimulationSettings::new(f64::INFINITY, 10).is_err());
        let rk4 = SimulationSettings::new(1.0, 10)
            .unwrap()
            .with_method(ResponseMethod::Rk4 { substeps: 0 });
        assert!(matches!(rk4.validate(), Err(MaglevError::InvalidConfiguration(_))));
    }
}
