//! Placement directions and the overlap-window geometry for each of them.

/// Where the second image of a pair sits relative to the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Right,
    Bottom,
    Left,
    Top,
}

impl Direction {
    /// All directions in search order.
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Bottom,
        Direction::Left,
        Direction::Top,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Top => "top",
        }
    }

    /// Whether the seam runs vertically (B beside A) rather than horizontally.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Right | Self::Left)
    }

    /// Nominal overlap window between `a` and a scaled `b`.
    ///
    /// `b_w`/`b_h` are the dimensions of B *after* scaling. The overlap
    /// length along the seam's primary axis is `fraction` of B's extent on
    /// that axis; the secondary extent is the smaller of the two images.
    ///
    /// A's origin goes negative when A is shorter than the overlap on the
    /// primary axis. The metric skips the samples that fall outside A.
    pub fn overlap_window(
        self,
        a_w: u32,
        a_h: u32,
        b_w: u32,
        b_h: u32,
        fraction: f64,
    ) -> OverlapWindow {
        let overlap_w = overlap_len(b_w, fraction);
        let overlap_h = overlap_len(b_h, fraction);

        match self {
            Self::Right => OverlapWindow {
                a_origin: (a_w as i32 - overlap_w as i32, 0),
                b_origin: (0, 0),
                width: overlap_w,
                height: a_h.min(b_h),
            },
            Self::Left => OverlapWindow {
                a_origin: (0, 0),
                b_origin: ((b_w - overlap_w) as i32, 0),
                width: overlap_w,
                height: a_h.min(b_h),
            },
            Self::Bottom => OverlapWindow {
                a_origin: (0, a_h as i32 - overlap_h as i32),
                b_origin: (0, 0),
                width: a_w.min(b_w),
                height: overlap_h,
            },
            Self::Top => OverlapWindow {
                a_origin: (0, 0),
                b_origin: (0, (b_h - overlap_h) as i32),
                width: a_w.min(b_w),
                height: overlap_h,
            },
        }
    }

    /// Half-widths `(rx, ry)` of the shift search around the nominal seam.
    ///
    /// The primary axis gets `primary` of the window's extent on that axis,
    /// the secondary axis gets `secondary`; each window is centred on zero.
    pub fn search_radii(self, window: &OverlapWindow, primary: f64, secondary: f64) -> (i32, i32) {
        let radius = |extent: u32, fraction: f64| (f64::from(extent) * fraction / 2.0).round() as i32;
        if self.is_horizontal() {
            (radius(window.width, primary), radius(window.height, secondary))
        } else {
            (radius(window.width, secondary), radius(window.height, primary))
        }
    }

    /// Convert a seam shift into the offset applied to B's sampling coordinates.
    ///
    /// Signs are chosen so a positive primary shift deepens the overlap and
    /// the assembler's placement formulas reproduce the sampled alignment.
    pub fn shift_to_offset(self, shift_x: i32, shift_y: i32) -> (i32, i32) {
        match self {
            Self::Right => (shift_x, -shift_y),
            Self::Left => (-shift_x, -shift_y),
            Self::Bottom => (-shift_x, shift_y),
            Self::Top => (-shift_x, -shift_y),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Corresponding rectangles in image A and scaled image B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapWindow {
    pub a_origin: (i32, i32),
    pub b_origin: (i32, i32),
    pub width: u32,
    pub height: u32,
}

impl OverlapWindow {
    /// Overlap length along the seam's primary axis.
    pub fn primary_len(&self, direction: Direction) -> u32 {
        if direction.is_horizontal() {
            self.width
        } else {
            self.height
        }
    }
}

fn overlap_len(extent: u32, fraction: f64) -> u32 {
    ((f64::from(extent) * fraction).round() as u32).clamp(1, extent.max(1))
}
