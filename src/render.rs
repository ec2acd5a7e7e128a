//! Offline animation of the maglev rig.
//!
//! Draws the fixed rig (pedestal, striped electromagnet, grid) and the
//! ball for each position of a [`BallPositionSeries`], writing the frames
//! to an animated GIF whose frame delay is the series' frame interval.
//! All geometry is in centimetres; `y` grows upward from the pedestal base.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use maglev_calc::BallPositionSeries;

const GRAY: RGBColor = RGBColor(180, 180, 180);
const DARK_GRAY: RGBColor = RGBColor(128, 128, 128);
const GRID: RGBColor = RGBColor(230, 230, 230);
const BALL_BLUE: RGBColor = RGBColor(77, 77, 204);

/// Dimensions of the rig (cm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigGeometry {
    /// Ball travel between pedestal and magnet
    pub ball_travel: f64,
    pub ball_diameter: f64,
    pub pedestal_height: f64,
    pub pedestal_width: f64,
    pub magnet_width: f64,
    pub magnet_height: f64,
    /// Number of diagonal stripes drawn on the magnet
    pub magnet_stripes: usize,
}

impl Default for RigGeometry {
    fn default() -> Self {
        Self {
            ball_travel: 1.4,
            ball_diameter: 2.54,
            pedestal_height: 10.0,
            pedestal_width: 3.0,
            magnet_width: 8.0,
            magnet_height: 4.0,
            magnet_stripes: 8,
        }
    }
}

impl RigGeometry {
    pub fn ball_radius(&self) -> f64 {
        self.ball_diameter / 2.0
    }

    pub fn pedestal_top(&self) -> f64 {
        self.pedestal_height
    }

    /// Lowest point of the ball centre: resting on the pedestal.
    pub fn ball_min(&self) -> f64 {
        self.pedestal_top() + self.ball_diameter
    }

    /// Face of the electromagnet; positions are measured down from here.
    pub fn magnet_base(&self) -> f64 {
        self.ball_min() + self.ball_travel
    }

    pub fn magnet_top(&self) -> f64 {
        self.magnet_base() + self.magnet_height
    }

    /// Height of the ball centre for a distance `x` below the magnet face.
    pub fn ball_center_height(&self, x: f64) -> f64 {
        self.magnet_base() - (self.ball_radius() + x)
    }
}

/// Canvas size and cm → pixel scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    /// Pixels per centimetre
    pub scale: f64,
    /// Blank margin under the pedestal (cm)
    pub bottom_margin: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 600, height: 800, scale: 30.0, bottom_margin: 1.0 }
    }
}

impl Viewport {
    /// Rig coordinates (cm, y up, x centred) to pixel coordinates (y down).
    pub fn cm_to_pixels(&self, x_cm: f64, y_cm: f64) -> (i32, i32) {
        let x_px = (self.width / 2) as f64 + x_cm * self.scale;
        let y_px = self.height as f64 - (y_cm + self.bottom_margin) * self.scale;
        (x_px as i32, y_px as i32)
    }
}

/// Renders one frame per ball position.
pub struct RigRenderer {
    pub geometry: RigGeometry,
    pub viewport: Viewport,
}

impl Default for RigRenderer {
    fn default() -> Self {
        Self { geometry: RigGeometry::default(), viewport: Viewport::default() }
    }
}

impl RigRenderer {
    fn rect(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<(i32, i32)> {
        vec![
            self.viewport.cm_to_pixels(x0, y0),
            self.viewport.cm_to_pixels(x1, y0),
            self.viewport.cm_to_pixels(x1, y1),
            self.viewport.cm_to_pixels(x0, y1),
        ]
    }

    fn draw_outlined<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        points: Vec<(i32, i32)>,
        fill: RGBColor,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let mut outline = points.clone();
        outline.push(points[0]);
        area.draw(&Polygon::new(points, fill.filled()))?;
        area.draw(&PathElement::new(outline, BLACK.stroke_width(2)))?;
        Ok(())
    }

    /// Pedestal, electromagnet with stripes, and the background grid.
    pub fn draw_rig<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let g = &self.geometry;
        let vp = &self.viewport;
        area.fill(&WHITE)?;

        // grid every 2 cm
        let mut y = 0.0;
        while y <= g.magnet_top().floor() {
            area.draw(&PathElement::new(vec![vp.cm_to_pixels(-6.0, y), vp.cm_to_pixels(6.0, y)], GRID))?;
            y += 2.0;
        }

        let half_magnet = g.magnet_width / 2.0;
        Self::draw_outlined(area, self.rect(-half_magnet, g.magnet_base(), half_magnet, g.magnet_top()), GRAY)?;

        let stripe = g.magnet_width / g.magnet_stripes as f64;
        for k in 0..g.magnet_stripes {
            let x_start = -half_magnet + k as f64 * stripe;
            let top = vp.cm_to_pixels(x_start, g.magnet_top());
            let bottom = vp.cm_to_pixels(x_start + stripe, g.magnet_base());
            area.draw(&PathElement::new(vec![top, bottom], BLACK))?;
        }

        let half_pedestal = g.pedestal_width / 2.0;
        Self::draw_outlined(area, self.rect(-half_pedestal, 0.0, half_pedestal, g.pedestal_top()), DARK_GRAY)?;
        Ok(())
    }

    /// Rig plus the ball `x` cm below the magnet face.
    pub fn draw_frame<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        x: f64,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        self.draw_rig(area)?;

        let center = self.viewport.cm_to_pixels(0.0, self.geometry.ball_center_height(x));
        let radius = (self.geometry.ball_radius() * self.viewport.scale) as i32;
        area.draw(&Circle::new(center, radius, BALL_BLUE.filled()))?;
        area.draw(&Circle::new(center, radius, BLACK.stroke_width(2)))?;
        Ok(())
    }

    /// Write every position of `series` as one GIF frame. Returns the
    /// number of frames written.
    pub fn render_gif(&self, series: &BallPositionSeries, path: &Path) -> Result<usize, Box<dyn std::error::Error>> {
        let delay_ms = (series.frame_interval() * 1000.0).round().max(1.0) as u32;
        let root = BitMapBackend::gif(path, (self.viewport.width, self.viewport.height), delay_ms)?
            .into_drawing_area();

        for &x in series.positions() {
            self.draw_frame(&root, x)?;
            root.present()?;
        }

        tracing::info!(frames = series.len(), delay_ms, path = %path.display(), "animation written");
        Ok(series.len())
    }
}
