//! Ball position series handed to renderers.
//!
//! Positions are distances of the ball below the electromagnet face, in
//! centimetres, the unit the rig geometry is drawn in. A series is either
//! synthesized analytically or taken from a trajectory's position channel.

use std::f64::consts;

use crate::error::{MaglevError, Result};
use crate::response::Trajectory;

/// Centimetres per metre.
pub const CM_PER_M: f64 = 100.0;

/// Positions (cm) plus the interval between frames (s).
#[derive(Debug, Clone, PartialEq)]
pub struct BallPositionSeries {
    positions: Vec<f64>,
    frame_interval: f64,
}

impl BallPositionSeries {
    /// Series from explicit positions (cm); the interval must be positive.
    pub fn new(positions: Vec<f64>, frame_interval: f64) -> Result<Self> {
        if !frame_interval.is_finite() || frame_interval <= 0.0 {
            return Err(MaglevError::InvalidConfiguration(format!(
                "frame interval must be positive, got {frame_interval}"
            )));
        }
        Ok(Self { positions, frame_interval })
    }

    /// `offset + amplitude·sin(2π·frequency·t)` sampled every `dt` over [0, duration).
    ///
    /// The default demo is `sinusoidal(0.7, 0.5, 1.0, 5.0, 0.01)`: the ball
    /// swings ±0.5 cm around 0.7 cm below the magnet.
    pub fn sinusoidal(offset: f64, amplitude: f64, frequency: f64, duration: f64, dt: f64) -> Result<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(MaglevError::InvalidConfiguration(format!("dt must be positive, got {dt}")));
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err(MaglevError::InvalidConfiguration(format!(
                "duration must be non-negative, got {duration}"
            )));
        }

        let n = (duration / dt).ceil() as usize;
        let positions = (0..n)
            .map(|k| k as f64 * dt)
            .filter(|t| *t < duration)
            .map(|t| offset + amplitude * (2.0 * consts::PI * frequency * t).sin())
            .collect();
        Self::new(positions, dt)
    }

    /// Absolute ball distance from a trajectory: nominal gap plus the
    /// position deviation, converted to centimetres. The frame interval
    /// is the trajectory's sample spacing.
    pub fn from_trajectory(trajectory: &Trajectory, nominal_gap: f64) -> Result<Self> {
        if trajectory.len() < 2 {
            return Err(MaglevError::InvalidConfiguration(
                "trajectory needs at least two samples to define a frame interval".to_string(),
            ));
        }

        let times = trajectory.times();
        let frame_interval = times[1] - times[0];
        let positions = trajectory
            .position()
            .iter()
            .map(|dx| (nominal_gap + dx) * CM_PER_M)
            .collect();
        Self::new(positions, frame_interval)
    }

    /// Ball distances below the magnet face (cm).
    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    /// Seconds between frames.
    pub fn frame_interval(&self) -> f64 {
        self.frame_interval
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True when there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Playback length (s).
    pub fn duration(&self) -> f64 {
        self.positions.len() as f64 * self.frame_interval
    }

    /// Keep only the positions inside `[min, max]`; a diverging trajectory
    /// leaves the rig after a few frames.
    pub fn truncate_outside(&self, min: f64, max: f64) -> Self {
        let positions = self
            .positions
            .iter()
            .copied()
            .take_while(|x| (min..=max).contains(x))
            .collect();
        Self { positions, frame_interval: self.frame_interval }
    }
}
