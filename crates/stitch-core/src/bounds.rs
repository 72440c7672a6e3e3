//! Canvas extent covering every placed image.

use crate::assemble::Position;

/// Extrema of all placed image corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// Output canvas size and the translation that moves `(min_x, min_y)` to the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl CanvasBounds {
    /// Whole-pixel canvas dimensions, rounded up.
    pub fn canvas(&self) -> CanvasSize {
        CanvasSize {
            width: (self.max_x - self.min_x).ceil().max(0.0) as u32,
            height: (self.max_y - self.min_y).ceil().max(0.0) as u32,
            offset_x: self.min_x,
            offset_y: self.min_y,
        }
    }
}

/// Bounds of the placed positions; `sizes[p.index]` is the unscaled
/// `(width, height)` of each image. Unplaced positions are skipped.
///
/// Returns `None` if nothing is placed.
pub fn compute_bounds(positions: &[Position], sizes: &[(u32, u32)]) -> Option<CanvasBounds> {
    positions
        .iter()
        .filter(|p| p.placed)
        .filter_map(|p| {
            let (w, h) = *sizes.get(p.index)?;
            Some(CanvasBounds {
                min_x: p.x,
                min_y: p.y,
                max_x: p.x + f64::from(w) * p.scale,
                max_y: p.y + f64::from(h) * p.scale,
            })
        })
        .reduce(|acc, b| CanvasBounds {
            min_x: acc.min_x.min(b.min_x),
            min_y: acc.min_y.min(b.min_y),
            max_x: acc.max_x.max(b.max_x),
            max_y: acc.max_y.max(b.max_y),
        })
}
