use std::ops::ControlFlow;

use image::{Rgba, RgbaImage};

use super::*;
use crate::direction::Direction;

fn solid(index: usize, w: u32, h: u32) -> Image {
    let buffer = RgbaImage::from_pixel(w, h, Rgba([30, 160, 90, 255]));
    Image::from_buffer(index, buffer).unwrap()
}

fn texel(gx: i64, gy: i64) -> Rgba<u8> {
    let h = (gx.wrapping_mul(73_856_093) ^ gy.wrapping_mul(19_349_663)) as u64;
    let h = h.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    Rgba([(h >> 16) as u8, (h >> 32) as u8, (h >> 48) as u8, 255])
}

/// Tile of a shared noise texture with its top-left at `(ox, oy)`.
fn tile(index: usize, ox: i64, oy: i64, w: u32, h: u32) -> Image {
    let buffer = RgbaImage::from_fn(w, h, |x, y| texel(ox + i64::from(x), oy + i64::from(y)));
    Image::from_buffer(index, buffer).unwrap()
}

fn fast_opts() -> StitchOptions {
    StitchOptions::new().with_scales([1.0, 1.05]).with_sample_stride(3)
}

#[test]
fn identical_solid_pair_places_second_image_after_overlap() {
    let images = vec![solid(0, 100, 100), solid(1, 100, 100)];
    let out = stitch(&images, &StitchOptions::default(), |_| {}).unwrap();

    let m = out.matches[0];
    assert_eq!((m.from, m.to), (0, 1));
    assert_eq!(m.scale, 1.0);
    assert_eq!(m.direction, Direction::Right);
    assert_eq!((m.shift_x, m.shift_y, m.error), (0, 0, 0.0));

    assert_eq!(
        out.positions[0],
        Position {
            index: 0,
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            placed: true,
        }
    );
    let p = out.positions[1];
    assert_eq!((p.x, p.y, p.scale, p.placed), (70.0, 0.0, 1.0, true));
    assert_eq!(
        out.canvas,
        CanvasSize {
            width: 170,
            height: 100,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    );
}

#[test]
fn three_tiles_in_a_row_chain_through_the_middle() {
    // A: x 0..100, B: x 70..170, C: x 140..240. C never touches A.
    let images = vec![
        tile(0, 0, 0, 100, 60),
        tile(1, 70, 0, 100, 60),
        tile(2, 140, 0, 100, 60),
    ];
    let out = stitch(&images, &fast_opts(), |_| {}).unwrap();

    let steps: Vec<(usize, usize)> = out.placements.iter().map(|p| (p.by.from, p.by.to)).collect();
    assert_eq!(steps, vec![(0, 1), (1, 2)]);
    assert_eq!((out.positions[1].x, out.positions[1].y), (70.0, 0.0));
    assert_eq!((out.positions[2].x, out.positions[2].y), (140.0, 0.0));
    assert!(out.unplaced().is_empty());
    assert_eq!((out.canvas.width, out.canvas.height), (240, 60));
}

#[test]
fn vertical_tiles_with_offset_seam() {
    // B reaches 2px deeper into A than the nominal 18px overlap and sits 4px right.
    let images = vec![tile(0, 0, 0, 80, 60), tile(1, 4, 60 - 18 - 2, 80, 60)];
    let opts = StitchOptions::new().with_scales([1.0]).with_sample_stride(2);
    let out = stitch(&images, &opts, |_| {}).unwrap();

    let m = out.matches[0];
    assert_eq!(m.direction, Direction::Bottom);
    assert_eq!((m.shift_x, m.shift_y), (4, 2));
    assert_eq!(m.error, 0.0);
    assert_eq!((out.positions[1].x, out.positions[1].y), (4.0, 40.0));
}

#[test]
fn produces_n_times_n_minus_one_matches() {
    let images: Vec<Image> = (0..4).map(|i| solid(i, 24, 24)).collect();
    let out = stitch(&images, &fast_opts(), |_| {}).unwrap();
    assert_eq!(out.matches.len(), 12);
    assert_eq!(out.positions.len(), 4);
    assert!(out.placements.len() <= 3);
}

#[test]
fn progress_is_non_decreasing_and_ends_at_done() {
    let images: Vec<Image> = (0..3).map(|i| solid(i, 30, 30)).collect();
    let mut events = Vec::new();
    stitch(&images, &fast_opts(), |p| events.push(p)).unwrap();

    // 6 pairs + 2 placements + done
    assert_eq!(events.len(), 9);
    assert!(events.windows(2).all(|w| w[0].percent <= w[1].percent));
    assert_eq!(events[5].stage, Stage::Matching);
    assert_eq!(events[5].percent, 80.0);
    assert_eq!(events[6].stage, Stage::Assembling);
    let last = events.last().unwrap();
    assert_eq!(last.stage, Stage::Done);
    assert_eq!(last.percent, 100.0);
}

#[test]
fn identical_inputs_give_identical_outcomes() {
    let make = || vec![tile(0, 0, 0, 50, 40), tile(1, 35, 3, 50, 40), tile(2, 5, 30, 50, 40)];
    let first = stitch(&make(), &fast_opts(), |_| {}).unwrap();
    let second = stitch(&make(), &fast_opts(), |_| {}).unwrap();
    assert_eq!(first, second);
}

#[test]
fn rejects_single_image() {
    let err = stitch(&[solid(0, 10, 10)], &StitchOptions::default(), |_| {}).unwrap_err();
    assert!(matches!(err, StitchError::TooFewImages(1)));
}

#[test]
fn rejects_empty_input() {
    let err = stitch(&[], &StitchOptions::default(), |_| {}).unwrap_err();
    assert!(matches!(err, StitchError::TooFewImages(0)));
}

#[test]
fn rejects_out_of_order_indices() {
    let images = vec![solid(0, 10, 10), solid(5, 10, 10)];
    let err = stitch(&images, &StitchOptions::default(), |_| {}).unwrap_err();
    assert!(matches!(
        err,
        StitchError::IndexMismatch {
            position: 1,
            index: 5
        }
    ));
}

#[test]
fn rejects_invalid_options() {
    let images = vec![solid(0, 10, 10), solid(1, 10, 10)];
    let opts = StitchOptions::new().with_sample_stride(0);
    let err = stitch(&images, &opts, |_| {}).unwrap_err();
    assert!(matches!(err, StitchError::InvalidOptions(_)));
}

#[test]
fn ceiling_leaves_poor_matches_unplaced() {
    let images = vec![tile(0, 0, 0, 40, 40), tile(1, 1000, 1000, 40, 40)];
    let opts = fast_opts().with_max_match_error(Some(1.0));
    let out = stitch(&images, &opts, |_| {}).unwrap();
    assert_eq!(out.unplaced(), vec![1]);
    assert_eq!((out.canvas.width, out.canvas.height), (40, 40));
}

#[test]
fn break_during_matching_cancels_the_run() {
    let images: Vec<Image> = (0..4).map(|i| solid(i, 24, 24)).collect();
    let mut events = Vec::new();
    let err = stitch_with_control(&images, &fast_opts(), |p| {
        events.push(p);
        ControlFlow::Break(())
    })
    .unwrap_err();
    assert!(matches!(err, StitchError::Cancelled));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].stage, Stage::Matching);
}

#[test]
fn break_during_assembling_cancels_the_run() {
    let images: Vec<Image> = (0..3).map(|i| solid(i, 24, 24)).collect();
    let mut events = Vec::new();
    let err = stitch_with_control(&images, &fast_opts(), |p| {
        let stage = p.stage;
        events.push(p);
        if stage == Stage::Assembling {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
    .unwrap_err();
    assert!(matches!(err, StitchError::Cancelled));
    // 6 pairs, then the first placement stops the run
    assert_eq!(events.len(), 7);
    assert!(events.iter().all(|e| e.stage != Stage::Done));
}

#[test]
fn break_on_done_keeps_the_outcome() {
    let images = vec![solid(0, 24, 24), solid(1, 24, 24)];
    let out = stitch_with_control(&images, &fast_opts(), |p| {
        if p.stage == Stage::Done {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
    .unwrap();
    assert!(out.unplaced().is_empty());
}

#[test]
fn stage_transitions_only_move_forward() {
    assert!(Stage::Matching.can_transition_to(Stage::Assembling));
    assert!(Stage::Assembling.can_transition_to(Stage::Done));
    assert!(Stage::Matching.can_transition_to(Stage::Error));
    assert!(Stage::Assembling.can_transition_to(Stage::Error));
    assert!(!Stage::Assembling.can_transition_to(Stage::Matching));
    assert!(!Stage::Matching.can_transition_to(Stage::Done));
    assert!(!Stage::Done.can_transition_to(Stage::Error));
    assert!(Stage::Done.is_terminal());
    assert!(Stage::Error.is_terminal());
}
