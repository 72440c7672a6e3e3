//! Pixel-difference error between two overlapping regions.

use image::RgbaImage;

use crate::direction::OverlapWindow;

/// Mean squared RGB difference over the sampled overlap.
///
/// Window point `(u, v)` (both multiples of `stride`) compares A at
/// `a_origin + (u, v)` with B at `b_origin + (u, v) + offset`. Pairs where
/// either pixel falls outside its image are skipped. Alpha is ignored.
///
/// Returns `f64::INFINITY` when no sampled pair lands inside both images.
pub fn overlap_error(
    a: &RgbaImage,
    b: &RgbaImage,
    window: &OverlapWindow,
    offset: (i32, i32),
    stride: u32,
) -> f64 {
    let stride = stride.max(1) as usize;
    let (a_w, a_h) = (i64::from(a.width()), i64::from(a.height()));
    let (b_w, b_h) = (i64::from(b.width()), i64::from(b.height()));
    let a_px = a.as_raw();
    let b_px = b.as_raw();

    let mut sum: u64 = 0;
    let mut count: u64 = 0;

    for v in (0..i64::from(window.height)).step_by(stride) {
        let ay = i64::from(window.a_origin.1) + v;
        let by = i64::from(window.b_origin.1) + v + i64::from(offset.1);
        if ay < 0 || ay >= a_h || by < 0 || by >= b_h {
            continue;
        }

        for u in (0..i64::from(window.width)).step_by(stride) {
            let ax = i64::from(window.a_origin.0) + u;
            let bx = i64::from(window.b_origin.0) + u + i64::from(offset.0);
            if ax < 0 || ax >= a_w || bx < 0 || bx >= b_w {
                continue;
            }

            let ai = ((ay * a_w + ax) * 4) as usize;
            let bi = ((by * b_w + bx) * 4) as usize;
            for c in 0..3 {
                let diff = i32::from(a_px[ai + c]) - i32::from(b_px[bi + c]);
                sum += (diff * diff) as u64;
            }
            count += 1;
        }
    }

    if count == 0 {
        return f64::INFINITY;
    }
    sum as f64 / (count * 3) as f64
}
