//! CLI command implementations.

use std::path::Path;

use anyhow::{Context, Result, anyhow};

use maglev_calc::{BallPositionSeries, Trajectory, analyze, linearize, step_response_with};

use crate::config::RunConfig;
use crate::export;
use crate::plot;
use crate::render::RigRenderer;

/// Default frame interval of the demo animation (s)
pub const DEMO_FRAME_INTERVAL: f64 = 0.01;

fn simulate(config: &RunConfig) -> Result<Trajectory> {
    let (_, model) = linearize(&config.constants)?;
    let trajectory = step_response_with(&model, &config.simulation)?;
    Ok(trajectory)
}

/// Print the constants, the linearized model, its spectrum and the step
/// response end state.
pub fn report(config: &RunConfig) -> Result<()> {
    println!("Maglev Ball Model");
    println!("─────────────────");
    for (name, value) in config.constants.summary() {
        println!("{name:<22} {value}");
    }
    println!();

    let analysis = analyze(&config.constants)?;
    println!("{analysis}");
    println!();

    let trajectory = simulate(config)?;
    let settings = &config.simulation;
    println!(
        "Step response: {} samples over {} s ({:?})",
        trajectory.len(),
        settings.horizon,
        settings.method
    );
    if let Some(last) = trajectory.final_state() {
        println!("  position = {:.6e} m", last[0]);
        println!("  velocity = {:.6e} m/s", last[1]);
        println!("  current  = {:.6e} A", last[2]);
    }
    Ok(())
}

pub fn export_csv(config: &RunConfig, output: &Path) -> Result<()> {
    let trajectory = simulate(config)?;
    export::write_csv(&trajectory, output)?;
    println!("Wrote {} samples to {}", trajectory.len(), output.display());
    Ok(())
}

pub fn plot(config: &RunConfig, output: &Path) -> Result<()> {
    let trajectory = simulate(config)?;
    plot::plot_step_response(&trajectory, output, (800, 900))
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("failed plotting {}", output.display()))?;
    println!("Wrote {}", output.display());
    Ok(())
}

/// Animate the ball. Without `from_response` the ball follows a 1 Hz
/// sinusoid around the middle of its travel.
pub fn animate(config: &RunConfig, output: &Path, frame_interval: Option<f64>, from_response: bool) -> Result<()> {
    let renderer = RigRenderer::default();
    let series = if from_response {
        let trajectory = simulate(config)?;
        let series = BallPositionSeries::from_trajectory(&trajectory, config.constants.nominal_gap)?;
        let kept = series.truncate_outside(0.0, renderer.geometry.ball_travel);
        if kept.len() < series.len() {
            tracing::warn!(
                kept = kept.len(),
                total = series.len(),
                "ball leaves the rig, animation truncated"
            );
        }
        kept
    } else {
        let dt = frame_interval.unwrap_or(DEMO_FRAME_INTERVAL);
        BallPositionSeries::sinusoidal(0.7, 0.5, 1.0, 5.0, dt)?
    };

    if series.is_empty() {
        return Err(anyhow!("no frames to render"));
    }

    let frames = renderer
        .render_gif(&series, output)
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("failed rendering {}", output.display()))?;
    println!("Wrote {frames} frames ({:.2} s) to {}", series.duration(), output.display());
    Ok(())
}
