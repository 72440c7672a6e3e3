//! Worker configuration loaded from environment variables and `.env`.

use stitch_core::StitchOptions;
use stitch_core::options::{
    DEFAULT_OVERLAP_FRACTION, DEFAULT_SAMPLE_STRIDE, DEFAULT_SEARCH_PRIMARY,
    DEFAULT_SEARCH_SECONDARY,
};

use crate::{Result, WorkerError};

/// Capacity of the event channel between the task and the caller.
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Recognised environment keys.
pub const SETTING_KEYS: [&str; 7] = [
    "STITCH_SCALES",
    "STITCH_OVERLAP_FRACTION",
    "STITCH_SEARCH_PRIMARY",
    "STITCH_SEARCH_SECONDARY",
    "STITCH_SAMPLE_STRIDE",
    "STITCH_MAX_ERROR",
    "STITCH_EVENT_CAPACITY",
];

/// Runtime configuration for a worker run.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    pub options: StitchOptions,
    pub event_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            options: StitchOptions::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl WorkerConfig {
    /// Load from `.env` (if present) and the process environment.
    pub fn load() -> Result<Self> {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let g = |key: &str| -> String { lookup(key).map(|v| v.trim().to_string()).unwrap_or_default() };

        for key in SETTING_KEYS {
            let value = g(key);
            if value.is_empty() {
                continue;
            }
            validate_setting(key, &value)
                .map_err(|e| WorkerError::Config(format!("{key}: {e}")))?;
        }

        let scales = {
            let raw = g("STITCH_SCALES");
            if raw.is_empty() {
                StitchOptions::default().scales
            } else {
                parse_scales(&raw).unwrap_or_default()
            }
        };
        let max_error = g("STITCH_MAX_ERROR");

        let options = StitchOptions::new()
            .with_scales(scales)
            .with_overlap_fraction(parse_f64(&g("STITCH_OVERLAP_FRACTION"), DEFAULT_OVERLAP_FRACTION))
            .with_search_window(
                parse_f64(&g("STITCH_SEARCH_PRIMARY"), DEFAULT_SEARCH_PRIMARY),
                parse_f64(&g("STITCH_SEARCH_SECONDARY"), DEFAULT_SEARCH_SECONDARY),
            )
            .with_sample_stride(parse_u32(&g("STITCH_SAMPLE_STRIDE"), DEFAULT_SAMPLE_STRIDE))
            .with_max_match_error(max_error.parse().ok());
        options.validate()?;

        let config = Self {
            options,
            event_capacity: parse_usize(&g("STITCH_EVENT_CAPACITY"), DEFAULT_EVENT_CAPACITY),
        };
        tracing::debug!(?config, "Worker configuration loaded");
        Ok(config)
    }
}

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> std::result::Result<(), String> {
    match key {
        "STITCH_SCALES" => {
            let scales = parse_scales(value).ok_or("must be a comma-separated list of numbers")?;
            if scales.is_empty() {
                return Err("at least one scale is required".into());
            }
            if scales.iter().any(|s| !s.is_finite() || *s <= 0.0) {
                return Err("scales must be positive".into());
            }
        }
        "STITCH_OVERLAP_FRACTION" | "STITCH_SEARCH_PRIMARY" | "STITCH_SEARCH_SECONDARY" => {
            let v: f64 = value.parse().map_err(|_| "must be a float")?;
            if !(v > 0.0 && v <= 1.0) {
                return Err("must be greater than 0.0 and at most 1.0".into());
            }
        }
        "STITCH_SAMPLE_STRIDE" => validate_int_range(value, 1, 64)?,
        "STITCH_MAX_ERROR" => {
            let v: f64 = value.parse().map_err(|_| "must be a float")?;
            if v.is_nan() || v < 0.0 {
                return Err("must be non-negative".into());
            }
        }
        "STITCH_EVENT_CAPACITY" => validate_int_range(value, 1, 65_536)?,
        _ => return Err(format!("unknown setting key: {key}")),
    }
    Ok(())
}

fn validate_int_range(value: &str, min: i64, max: i64) -> std::result::Result<(), String> {
    let v: i64 = value.parse().map_err(|_| "must be an integer")?;
    if !(min..=max).contains(&v) {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}

/// Load .env from multiple candidate paths.
fn load_dotenv() {
    let candidates = [".env", "../.env", "../../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::debug!("No .env file found, using system environment variables");
}

fn parse_scales(s: &str) -> Option<Vec<f64>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().ok())
        .collect()
}

fn parse_f64(s: &str, default: f64) -> f64 {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}

fn parse_u32(s: &str, default: u32) -> u32 {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}

fn parse_usize(s: &str, default: usize) -> usize {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}
