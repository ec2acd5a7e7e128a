//! Step-response plot: one stacked panel per state.

use std::path::Path;

use plotters::prelude::*;

use maglev_calc::Trajectory;

const PANEL_COLORS: [RGBColor; 3] = [BLUE, RED, GREEN];

/// Value range of a channel, padded so flat channels still get a panel.
fn padded_range(values: &[f64]) -> (f64, f64) {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(1e-12 * (1.0 + lo.abs().max(hi.abs())));
    (lo - pad, hi + pad)
}

/// Write a PNG with position, velocity and current panels over time.
pub fn plot_step_response(
    trajectory: &Trajectory,
    path: &Path,
    size: (u32, u32),
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let times = trajectory.times().to_vec();
    let t_end = times.last().copied().unwrap_or(1.0);
    let panels = root.split_evenly((trajectory.state_dim(), 1));

    for (k, panel) in panels.iter().enumerate() {
        let Some(channel) = trajectory.channel(k) else { continue };
        let values = channel.to_vec();
        let (y_min, y_max) = padded_range(&values);

        let mut chart = ChartBuilder::on(panel)
            .margin(15)
            .build_cartesian_2d(0.0..t_end, y_min..y_max)?;

        // axes through the panel origin
        chart.draw_series(LineSeries::new(vec![(0.0, y_min), (0.0, y_max)], &BLACK))?;
        if y_min < 0.0 && y_max > 0.0 {
            chart.draw_series(LineSeries::new(vec![(0.0, 0.0), (t_end, 0.0)], &BLACK))?;
        }

        let color = PANEL_COLORS[k % PANEL_COLORS.len()];
        chart.draw_series(LineSeries::new(
            times.iter().copied().zip(values.iter().copied()),
            color.stroke_width(2),
        ))?;
    }

    root.present()?;
    tracing::info!(path = %path.display(), samples = trajectory.len(), "step response plot written");
    Ok(())
}
