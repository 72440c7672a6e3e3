//! Greedy placement of every image into the anchor's coordinate space.
//!
//! Each step commits the lowest-error usable match whose source is already
//! placed and whose target is not. Commitments are never revisited.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tracing::{debug, warn};

use crate::direction::Direction;
use crate::matcher::MatchResult;
use crate::options::StitchOptions;

/// Where one image lands in the shared coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub placed: bool,
}

impl Position {
    fn unplaced(index: usize) -> Self {
        Self {
            index,
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            placed: false,
        }
    }
}

/// One committed assembly step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// 1-based step number.
    pub step: usize,
    pub by: MatchResult,
}

/// Frozen output of the assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub positions: Vec<Position>,
    pub placements: Vec<Placement>,
}

impl Assembly {
    /// Indices the greedy pass could not reach.
    pub fn unplaced(&self) -> Vec<usize> {
        self.positions
            .iter()
            .filter(|p| !p.placed)
            .map(|p| p.index)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.positions.iter().all(|p| p.placed)
    }
}

/// Heap entry ordered by `(error, rank)`; rank is the match's index in the
/// input list, which keeps equal-error ties in matcher order.
#[derive(Debug, Clone, Copy)]
struct Edge {
    error: f64,
    rank: usize,
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Edge {}

impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Edge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.error
            .total_cmp(&other.error)
            .then(self.rank.cmp(&other.rank))
    }
}

/// Place every image reachable from image 0.
///
/// `sizes[i]` is the unscaled `(width, height)` of image `i`. Image 0 is
/// fixed at the origin with scale 1. Matches with a non-finite error, or
/// one above `options.max_match_error`, are never used. `on_place(placed,
/// total)` runs after every committed step, where `total` is `n - 1`.
///
/// Equivalent to rescanning the error-sorted match list from the start on
/// every step; the heap only holds edges leaving placed images and drops
/// entries whose target was placed in the meantime.
pub fn assemble<F>(
    sizes: &[(u32, u32)],
    matches: &[MatchResult],
    options: &StitchOptions,
    mut on_place: F,
) -> Assembly
where
    F: FnMut(usize, usize),
{
    let n = sizes.len();
    let mut positions: Vec<Position> = (0..n).map(Position::unplaced).collect();
    let mut placements = Vec::new();
    if n == 0 {
        return Assembly {
            positions,
            placements,
        };
    }

    positions[0].placed = true;

    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (rank, m) in matches.iter().enumerate() {
        if m.from < n && m.to < n && m.from != m.to && options.accepts_error(m.error) {
            outgoing[m.from].push(rank);
        }
    }

    let mut heap = BinaryHeap::new();
    let push_from = |heap: &mut BinaryHeap<Reverse<Edge>>, node: usize| {
        for &rank in &outgoing[node] {
            heap.push(Reverse(Edge {
                error: matches[rank].error,
                rank,
            }));
        }
    };
    push_from(&mut heap, 0);

    let total = n - 1;
    while placements.len() < total {
        let Some(Reverse(edge)) = heap.pop() else {
            break;
        };
        let m = matches[edge.rank];
        if positions[m.to].placed {
            continue;
        }

        let from = positions[m.from];
        let (x, y) = place(&from, sizes[m.from], sizes[m.to], &m);
        positions[m.to] = Position {
            index: m.to,
            x,
            y,
            scale: m.scale,
            placed: true,
        };

        placements.push(Placement {
            step: placements.len() + 1,
            by: m,
        });
        debug!(
            from = m.from,
            to = m.to,
            direction = %m.direction,
            error = m.error,
            x,
            y,
            scale = m.scale,
            "Image placed"
        );
        push_from(&mut heap, m.to);
        on_place(placements.len(), total);
    }

    let assembly = Assembly {
        positions,
        placements,
    };
    let unplaced = assembly.unplaced();
    if !unplaced.is_empty() {
        warn!(?unplaced, "No usable match reaches these images; leaving them unplaced");
    }
    assembly
}

/// Top-left of `m.to` given the placed `from` position.
fn place(from: &Position, from_size: (u32, u32), to_size: (u32, u32), m: &MatchResult) -> (f64, f64) {
    let (from_w, from_h) = (f64::from(from_size.0), f64::from(from_size.1));
    let (to_w, to_h) = (f64::from(to_size.0), f64::from(to_size.1));
    let overlap = f64::from(m.overlap);
    let (sx, sy) = (f64::from(m.shift_x), f64::from(m.shift_y));

    match m.direction {
        Direction::Right => (from.x + from_w * from.scale - overlap - sx, from.y + sy),
        Direction::Bottom => (from.x + sx, from.y + from_h * from.scale - overlap - sy),
        Direction::Left => (from.x - to_w * m.scale + overlap + sx, from.y + sy),
        Direction::Top => (from.x + sx, from.y - to_h * m.scale + overlap + sy),
    }
}
