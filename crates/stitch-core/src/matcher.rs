//! Best match for every ordered image pair.

use std::ops::ControlFlow;

use image::RgbaImage;
use tracing::debug;

use crate::direction::Direction;
use crate::options::StitchOptions;
use crate::raster::Image;
use crate::search::{Candidate, search_scaled};
use crate::{Result, StitchError};

/// Best hypothesis for placing image `to` relative to image `from`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    pub from: usize,
    pub to: usize,
    pub scale: f64,
    pub direction: Direction,
    pub shift_x: i32,
    pub shift_y: i32,
    /// Non-negative, or `f64::INFINITY` when no hypothesis overlapped.
    pub error: f64,
    /// Nominal overlap length along the primary axis, in pixels.
    pub overlap: u32,
}

impl MatchResult {
    fn from_candidate(from: usize, to: usize, c: Candidate) -> Self {
        Self {
            from,
            to,
            scale: c.scale,
            direction: c.direction,
            shift_x: c.shift_x,
            shift_y: c.shift_y,
            error: c.error,
            overlap: c.overlap,
        }
    }
}

/// Search every ordered pair `(i, j)`, `i != j`.
///
/// Hypotheses are tried scales outer, directions inner; the first strictly
/// lowest error wins. `on_pair(done, total)` runs after each pair; a
/// `Break` stops the search with [`StitchError::Cancelled`]. Returns exactly
/// `n * (n - 1)` results in `(i, j)` row-major order.
pub fn match_all<F>(images: &[Image], options: &StitchOptions, mut on_pair: F) -> Result<Vec<MatchResult>>
where
    F: FnMut(usize, usize) -> ControlFlow<()>,
{
    let n = images.len();
    let total = n * n.saturating_sub(1);
    debug!(images = n, pairs = total, scales = options.scales.len(), "Matching image pairs");

    // Each image is resized once per scale and reused for every partner.
    let scaled: Vec<Vec<RgbaImage>> = images
        .iter()
        .map(|img| options.scales.iter().map(|&s| img.scaled(s)).collect())
        .collect();

    let mut results = Vec::with_capacity(total);
    for (i, a) in images.iter().enumerate() {
        for (j, b_scaled) in scaled.iter().enumerate() {
            if i == j {
                continue;
            }

            let mut best: Option<Candidate> = None;
            for (s, &scale) in options.scales.iter().enumerate() {
                for direction in Direction::ALL {
                    let c = search_scaled(a.buffer(), &b_scaled[s], scale, direction, options);
                    if best.is_none_or(|b| c.error < b.error) {
                        best = Some(c);
                    }
                }
            }

            // scales is validated non-empty, so best is always set
            if let Some(best) = best {
                debug!(
                    from = i,
                    to = j,
                    scale = best.scale,
                    direction = %best.direction,
                    shift_x = best.shift_x,
                    shift_y = best.shift_y,
                    error = best.error,
                    "Pair matched"
                );
                results.push(MatchResult::from_candidate(i, j, best));
            }
            if on_pair(results.len(), total).is_break() {
                debug!(done = results.len(), total, "Matching stopped by caller");
                return Err(StitchError::Cancelled);
            }
        }
    }

    Ok(results)
}
