//! Shift search for one (pair, scale, direction) hypothesis.

use image::RgbaImage;
use tracing::trace;

use crate::direction::Direction;
use crate::metric::overlap_error;
use crate::options::StitchOptions;
use crate::raster::Image;

/// Best alignment found for one hypothesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub scale: f64,
    pub direction: Direction,
    pub shift_x: i32,
    pub shift_y: i32,
    /// Mean squared RGB difference, or `f64::INFINITY` if nothing overlapped.
    pub error: f64,
    /// Nominal overlap length along the primary axis, in pixels.
    pub overlap: u32,
}

/// Search the hypothesis "`b` scaled by `scale` sits at `direction` of `a`".
pub fn search_match(
    a: &Image,
    b: &Image,
    scale: f64,
    direction: Direction,
    options: &StitchOptions,
) -> Candidate {
    let scaled = b.scaled(scale);
    search_scaled(a.buffer(), &scaled, scale, direction, options)
}

/// Same as [`search_match`] with B already resized by `scale`.
///
/// Shifts are visited nearest-to-zero first (secondary axis outer), and only
/// a strictly lower error replaces the current best, so ties resolve to the
/// smallest shift.
pub fn search_scaled(
    a: &RgbaImage,
    b_scaled: &RgbaImage,
    scale: f64,
    direction: Direction,
    options: &StitchOptions,
) -> Candidate {
    let window = direction.overlap_window(
        a.width(),
        a.height(),
        b_scaled.width(),
        b_scaled.height(),
        options.overlap_fraction,
    );
    let (rx, ry) = direction.search_radii(&window, options.search_primary, options.search_secondary);

    let mut best = Candidate {
        scale,
        direction,
        shift_x: 0,
        shift_y: 0,
        error: f64::INFINITY,
        overlap: window.primary_len(direction),
    };

    let xs = ordered_shifts(rx);
    for shift_y in ordered_shifts(ry) {
        for &shift_x in &xs {
            let offset = direction.shift_to_offset(shift_x, shift_y);
            let error = overlap_error(a, b_scaled, &window, offset, options.sample_stride);
            if error < best.error {
                best.shift_x = shift_x;
                best.shift_y = shift_y;
                best.error = error;
            }
        }
    }

    trace!(
        %direction,
        scale,
        shift_x = best.shift_x,
        shift_y = best.shift_y,
        error = best.error,
        "Hypothesis searched"
    );
    best
}

/// `0, -1, 1, -2, 2, ..., -radius, radius`.
fn ordered_shifts(radius: i32) -> Vec<i32> {
    let radius = radius.max(0);
    let mut shifts = Vec::with_capacity(radius as usize * 2 + 1);
    shifts.push(0);
    for r in 1..=radius {
        shifts.push(-r);
        shifts.push(r);
    }
    shifts
}
