//! Search configuration for a stitching run.
//!
//! Every value here must stay fixed for the whole run so results are
//! reproducible.

use crate::{Result, StitchError};

/// Scale candidates, nearest to unity first so ties favour unscaled matches.
pub const DEFAULT_SCALES: [f64; 7] = [1.0, 0.95, 1.05, 0.9, 1.1, 0.8, 1.2];

/// Fraction of B's extent assumed to overlap along the seam.
pub const DEFAULT_OVERLAP_FRACTION: f64 = 0.3;

/// Shift window along the seam's primary axis, as a fraction of the overlap.
pub const DEFAULT_SEARCH_PRIMARY: f64 = 0.4;

/// Shift window along the secondary axis, as a fraction of the overlap.
pub const DEFAULT_SEARCH_SECONDARY: f64 = 0.2;

/// Pixel stride used when sampling the overlap.
pub const DEFAULT_SAMPLE_STRIDE: u32 = 2;

/// Tuning for the overlap search and greedy assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct StitchOptions {
    /// Candidate scales applied to the second image of each pair, in search order.
    pub scales: Vec<f64>,

    /// Nominal overlap fraction (0.0, 1.0].
    pub overlap_fraction: f64,

    /// Shift window size along the primary axis (0.0, 1.0].
    pub search_primary: f64,

    /// Shift window size along the secondary axis (0.0, 1.0].
    pub search_secondary: f64,

    /// Sample every n-th pixel in both axes. Must be at least 1.
    pub sample_stride: u32,

    /// Matches with a larger error are never used for placement.
    pub max_match_error: Option<f64>,
}

impl Default for StitchOptions {
    fn default() -> Self {
        Self {
            scales: DEFAULT_SCALES.to_vec(),
            overlap_fraction: DEFAULT_OVERLAP_FRACTION,
            search_primary: DEFAULT_SEARCH_PRIMARY,
            search_secondary: DEFAULT_SEARCH_SECONDARY,
            sample_stride: DEFAULT_SAMPLE_STRIDE,
            max_match_error: None,
        }
    }
}

impl StitchOptions {
    /// Create options with the default candidate sets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: replace the scale candidates.
    pub fn with_scales(mut self, scales: impl Into<Vec<f64>>) -> Self {
        self.scales = scales.into();
        self
    }

    /// Builder: set the nominal overlap fraction.
    pub fn with_overlap_fraction(mut self, val: f64) -> Self {
        self.overlap_fraction = val;
        self
    }

    /// Builder: set both shift window fractions.
    pub fn with_search_window(mut self, primary: f64, secondary: f64) -> Self {
        self.search_primary = primary;
        self.search_secondary = secondary;
        self
    }

    /// Builder: set the sampling stride.
    pub fn with_sample_stride(mut self, val: u32) -> Self {
        self.sample_stride = val;
        self
    }

    /// Builder: reject matches whose error exceeds `val`.
    pub fn with_max_match_error(mut self, val: Option<f64>) -> Self {
        self.max_match_error = val;
        self
    }

    /// Check every field is in range.
    pub fn validate(&self) -> Result<()> {
        if self.scales.is_empty() {
            return Err(invalid("at least one scale candidate is required"));
        }
        if let Some(bad) = self.scales.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            return Err(invalid(format!("scale must be positive and finite, got {bad}")));
        }
        for (name, val) in [
            ("overlap_fraction", self.overlap_fraction),
            ("search_primary", self.search_primary),
            ("search_secondary", self.search_secondary),
        ] {
            if !(val > 0.0 && val <= 1.0) {
                return Err(invalid(format!("{name} must be in (0.0, 1.0], got {val}")));
            }
        }
        if self.sample_stride == 0 {
            return Err(invalid("sample_stride must be at least 1"));
        }
        if let Some(max) = self.max_match_error {
            if max.is_nan() || max < 0.0 {
                return Err(invalid(format!("max_match_error must be non-negative, got {max}")));
            }
        }
        Ok(())
    }

    /// Whether a match with `error` may be used to place an image.
    pub fn accepts_error(&self, error: f64) -> bool {
        error.is_finite() && self.max_match_error.is_none_or(|max| error <= max)
    }
}

fn invalid(msg: impl Into<String>) -> StitchError {
    StitchError::InvalidOptions(msg.into())
}
