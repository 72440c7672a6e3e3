//! Full stitching run: Matching -> Assembling -> Done.

use std::ops::ControlFlow;

use tracing::{info, warn};

use crate::assemble::{Placement, Position, assemble};
use crate::bounds::{CanvasBounds, CanvasSize, compute_bounds};
use crate::matcher::{MatchResult, match_all};
use crate::options::StitchOptions;
use crate::raster::Image;
use crate::{MIN_IMAGES, Result, StitchError};

/// Share of the progress bar spent on pairwise matching.
const MATCHING_SHARE: f64 = 80.0;

/// Run state. Moves forward only; `Error` can follow any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Matching,
    Assembling,
    Done,
    Error,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Matching => "matching",
            Self::Assembling => "assembling",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    /// The following state on success, if any.
    pub fn next(self) -> Option<Stage> {
        match self {
            Self::Matching => Some(Self::Assembling),
            Self::Assembling => Some(Self::Done),
            Self::Done | Self::Error => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Whether moving from `self` to `to` is a legal transition.
    pub fn can_transition_to(self, to: Stage) -> bool {
        (to == Self::Error && !self.is_terminal()) || self.next() == Some(to)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory progress update. `percent` never decreases within a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub stage: Stage,
    pub percent: f64,
    pub detail: Option<String>,
}

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct StitchOutcome {
    /// One per input image, in input order.
    pub positions: Vec<Position>,
    pub placements: Vec<Placement>,
    pub matches: Vec<MatchResult>,
    pub bounds: CanvasBounds,
    pub canvas: CanvasSize,
}

impl StitchOutcome {
    /// Images no usable match could reach.
    pub fn unplaced(&self) -> Vec<usize> {
        self.positions
            .iter()
            .filter(|p| !p.placed)
            .map(|p| p.index)
            .collect()
    }
}

/// Match every pair, place every reachable image and size the canvas.
///
/// `images[i].index()` must equal `i`; image 0 is the anchor.
pub fn stitch<F>(images: &[Image], options: &StitchOptions, mut on_progress: F) -> Result<StitchOutcome>
where
    F: FnMut(Progress),
{
    stitch_with_control(images, options, |progress| {
        on_progress(progress);
        ControlFlow::Continue(())
    })
}

/// Same as [`stitch`], but `on_progress` can stop the run.
///
/// Returning `ControlFlow::Break` ends the run at the next progress point
/// with [`StitchError::Cancelled`].
pub fn stitch_with_control<F>(
    images: &[Image],
    options: &StitchOptions,
    mut on_progress: F,
) -> Result<StitchOutcome>
where
    F: FnMut(Progress) -> ControlFlow<()>,
{
    validate_input(images)?;
    options.validate()?;

    let mut stage = Stage::Matching;
    info!(images = images.len(), %stage, "Stitching started");

    let result = run_stages(images, options, &mut stage, &mut on_progress);
    if let Err(e) = &result {
        transition(stage, Stage::Error);
        warn!(error = %e, "Stitching stopped");
    }
    result
}

fn run_stages<F>(
    images: &[Image],
    options: &StitchOptions,
    stage: &mut Stage,
    on_progress: &mut F,
) -> Result<StitchOutcome>
where
    F: FnMut(Progress) -> ControlFlow<()>,
{
    let sizes: Vec<(u32, u32)> = images.iter().map(|i| (i.width(), i.height())).collect();

    let matches = match_all(images, options, |done, total| {
        on_progress(Progress {
            stage: Stage::Matching,
            percent: MATCHING_SHARE * done as f64 / total as f64,
            detail: Some(format!("pair {done}/{total}")),
        })
    })?;

    *stage = advance(*stage);
    let mut stopped = false;
    let assembly = assemble(&sizes, &matches, options, |placed, total| {
        if stopped {
            return;
        }
        let flow = on_progress(Progress {
            stage: Stage::Assembling,
            percent: MATCHING_SHARE + (100.0 - MATCHING_SHARE) * placed as f64 / total as f64,
            detail: Some(format!("placed {placed}/{total}")),
        });
        stopped = flow.is_break();
    });
    if stopped {
        return Err(StitchError::Cancelled);
    }

    let bounds = compute_bounds(&assembly.positions, &sizes).unwrap_or(CanvasBounds {
        min_x: 0.0,
        min_y: 0.0,
        max_x: f64::from(sizes[0].0),
        max_y: f64::from(sizes[0].1),
    });
    let canvas = bounds.canvas();

    *stage = advance(*stage);
    // The run is complete; a late stop request changes nothing.
    let _ = on_progress(Progress {
        stage: *stage,
        percent: 100.0,
        detail: None,
    });
    info!(
        stage = %stage,
        placed = assembly.placements.len() + 1,
        total = images.len(),
        width = canvas.width,
        height = canvas.height,
        "Stitching finished"
    );

    Ok(StitchOutcome {
        positions: assembly.positions,
        placements: assembly.placements,
        matches,
        bounds,
        canvas,
    })
}

fn advance(stage: Stage) -> Stage {
    match stage.next() {
        Some(next) => transition(stage, next),
        None => stage,
    }
}

fn transition(from: Stage, to: Stage) -> Stage {
    debug_assert!(from.can_transition_to(to), "illegal stage transition {from} -> {to}");
    info!(%from, %to, "Stage transition");
    to
}

fn validate_input(images: &[Image]) -> Result<()> {
    if images.len() < MIN_IMAGES {
        return Err(StitchError::TooFewImages(images.len()));
    }
    for (position, img) in images.iter().enumerate() {
        if img.index() != position {
            return Err(StitchError::IndexMismatch {
                position,
                index: img.index(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
