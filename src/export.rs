//! Step-response export through a polars DataFrame.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

use maglev_calc::Trajectory;

/// Column names, in output order.
pub const COLUMNS: [&str; 4] = ["t", "position", "velocity", "current"];

/// One row per sample: time plus the three state deviations.
pub fn trajectory_frame(trajectory: &Trajectory) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Series::new(COLUMNS[0], trajectory.times().to_vec()),
        Series::new(COLUMNS[1], trajectory.position().to_vec()),
        Series::new(COLUMNS[2], trajectory.velocity().to_vec()),
        Series::new(COLUMNS[3], trajectory.current().to_vec()),
    ])?;
    Ok(df)
}

pub fn write_csv(trajectory: &Trajectory, path: &Path) -> Result<()> {
    let mut df = trajectory_frame(trajectory)?;
    let mut file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .has_header(true)
        .finish(&mut df)
        .with_context(|| format!("failed writing {}", path.display()))?;
    Ok(())
}
