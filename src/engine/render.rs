//! Swirl ring renderer.
//!
//! Draws concentric rings of single-pixel points whose angular positions
//! wobble with the phase accumulator. All shape constants are fixed engine
//! parameters; only `phase` and `zoom` perturb the output.

use std::f64::consts::TAU;

use super::surface::{DrawTarget, Rgba, SurfaceDimensions};

/// Number of concentric rings per frame.
pub const RINGS: u32 = 50;

/// Number of points on each ring.
pub const POINTS_PER_RING: u32 = 80;

/// Total points drawn per frame; reported via telemetry.
pub const POINTS_PER_FRAME: u64 = (RINGS * POINTS_PER_RING) as u64;

/// Base ring radius as a fraction of the shorter surface extent.
const RADIUS_SCALE: f64 = 0.015;

/// Peak angular displacement of the wobble, in radians.
const WOBBLE_AMPLITUDE: f64 = 0.3;

/// Wobble phase offset per ring.
const RING_PHASE_STEP: f64 = 0.3;

/// Wobble phase offset per point.
const POINT_PHASE_STEP: f64 = 0.1;

/// Whole-pattern rotation rate on the x axis.
const ROTATION_RATE_X: f64 = 0.2;

/// Counter-rotation rate on the y axis.
const ROTATION_RATE_Y: f64 = 0.18;

const BACKGROUND: Rgba = Rgba::new(5, 5, 5, 1.0);
const POINT_COLOR: Rgba = Rgba::new(255, 255, 255, 0.3);

/// Position of one swirl point in logical coordinates.
///
/// Pure function of its inputs, exposed so the pattern is testable without a
/// drawing surface.
pub fn swirl_point(
    phase: f64,
    zoom: f64,
    dims: SurfaceDimensions,
    ring: u32,
    index: u32,
) -> (f64, f64) {
    let width = dims.logical_width as f64;
    let height = dims.logical_height as f64;
    let cx = width / 2.0;
    let cy = height / 2.0;

    let radius = width.min(height) * RADIUS_SCALE * (ring as f64 + 2.0) * zoom;

    let angle = (index as f64 / POINTS_PER_RING as f64) * TAU;
    let wobble =
        (phase + ring as f64 * RING_PHASE_STEP + index as f64 * POINT_PHASE_STEP).sin()
            * WOBBLE_AMPLITUDE;
    let a = angle + wobble;

    let x = cx + (a + phase * ROTATION_RATE_X).cos() * radius;
    let y = cy + (a - phase * ROTATION_RATE_Y).sin() * radius;
    (x, y)
}

/// Renders one frame of the ring pattern.
#[derive(Debug, Default)]
pub struct SwirlRenderer;

impl SwirlRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Draw one frame. Returns the number of points drawn.
    pub fn draw(
        &self,
        target: &mut dyn DrawTarget,
        phase: f64,
        zoom: f64,
        dims: SurfaceDimensions,
    ) -> u64 {
        let width = dims.logical_width as f64;
        let height = dims.logical_height as f64;

        target.clear(width, height);
        target.fill_rect(0.0, 0.0, width, height, BACKGROUND);

        let mut count = 0u64;
        for ring in 0..RINGS {
            for index in 0..POINTS_PER_RING {
                let (x, y) = swirl_point(phase, zoom, dims, ring, index);
                target.fill_rect(x, y, 1.0, 1.0, POINT_COLOR);
                count += 1;
            }
        }
        count
    }
}
