//! Escape-time evaluation of `z <- z^2 + c` over a rectangular grid.
//!
//! Every grid point is evaluated by [`escape_time`] from its own seed alone,
//! so a full grid, any subset of it, and any evaluation order agree exactly.

use crate::error::ConfigError;
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;

/// Axis-aligned window of the complex plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            x_min: -2.0,
            x_max: 2.0,
            y_min: -2.0,
            y_max: 2.0,
        }
    }
}

impl Bounds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_axis("x", self.x_min, self.x_max)?;
        check_axis("y", self.y_min, self.y_max)
    }
}

fn check_axis(axis: &'static str, min: f64, max: f64) -> Result<(), ConfigError> {
    if !min.is_finite() || !max.is_finite() || min >= max {
        return Err(ConfigError::InvalidBounds { axis, min, max });
    }
    Ok(())
}

/// Everything a render needs: resolution, window, iteration cap, escape
/// radius, and the log scale applied by [`EscapeGrid::log_scaled`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractalConfig {
    pub width: usize,
    pub height: usize,
    pub bounds: Bounds,
    pub max_iter: usize,
    pub escape_radius: f64,
    pub log_scale_factor: f64,
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            bounds: Bounds::default(),
            max_iter: 1024,
            escape_radius: 2.0,
            log_scale_factor: 10.0,
        }
    }
}

impl FractalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroResolution {
                width: self.width,
                height: self.height,
            });
        }
        if self.cell_count().is_none() {
            return Err(ConfigError::GridTooLarge {
                width: self.width,
                height: self.height,
            });
        }
        self.bounds.validate()?;
        if self.max_iter == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if !(self.escape_radius > 0.0) || !self.escape_radius.is_finite() {
            return Err(ConfigError::InvalidEscapeRadius(self.escape_radius));
        }
        if !(self.log_scale_factor >= 0.0) || !self.log_scale_factor.is_finite() {
            return Err(ConfigError::InvalidLogScale(self.log_scale_factor));
        }
        Ok(())
    }

    /// The sample at `(col, row)`. Axes are sampled with inclusive endpoints;
    /// row 0 lies on `y_min`.
    /// `width * height`, or `None` when the record buffer could not be
    /// allocated.
    pub fn cell_count(&self) -> Option<usize> {
        let cells = self.width.checked_mul(self.height)?;
        let bytes = cells.checked_mul(std::mem::size_of::<EscapeRecord>())?;
        (bytes <= isize::MAX as usize).then_some(cells)
    }

    pub fn point(&self, col: usize, row: usize) -> Complex<f64> {
        Complex::new(
            lerp_sample(self.bounds.x_min, self.bounds.x_max, col, self.width),
            lerp_sample(self.bounds.y_min, self.bounds.y_max, row, self.height),
        )
    }
}

fn lerp_sample(min: f64, max: f64, index: usize, count: usize) -> f64 {
    if count <= 1 {
        return min;
    }
    if index + 1 == count {
        return max;
    }
    let step = (max - min) / (count - 1) as f64;
    min + index as f64 * step
}

/// How a grid point seeds the recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeedRule {
    /// `z0 = c = point`: the orbit of 0 from its first iterate, so the
    /// trivial check of `z = 0` is not counted.
    Mandelbrot,
    /// `z0 = point`, `c` fixed.
    Julia { c: Complex<f64> },
}

impl SeedRule {
    pub fn julia(re: f64, im: f64) -> Self {
        SeedRule::Julia {
            c: Complex::new(re, im),
        }
    }

    /// Returns `(z0, c)` for a grid point.
    pub fn seed(&self, point: Complex<f64>) -> (Complex<f64>, Complex<f64>) {
        match *self {
            SeedRule::Mandelbrot => (point, point),
            SeedRule::Julia { c } => (point, c),
        }
    }
}

/// Outcome of iterating a single point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EscapeRecord {
    /// First iteration index at which `|z| > R`, or `max_iter` if never.
    pub iterations: usize,
    pub escaped: bool,
    /// Continuous escape index; only for points that escaped.
    pub smooth: Option<f64>,
    /// `z` at the escape check, or after the last update for interior points.
    pub z: Complex<f64>,
}

/// Iterates `z <- z^2 + c` from `z0` at most `max_iter` times.
///
/// `|z|` is tested before each update; the index of the first failing test is
/// the escape index. With `max_iter == 0` nothing is iterated and the point
/// is reported as interior.
pub fn escape_time(
    z0: Complex<f64>,
    c: Complex<f64>,
    max_iter: usize,
    escape_radius: f64,
) -> EscapeRecord {
    let mut z = z0;
    for index in 0..max_iter {
        let norm = z.norm();
        if norm > escape_radius {
            return EscapeRecord {
                iterations: index,
                escaped: true,
                smooth: smooth_iteration(index, norm, escape_radius),
                z,
            };
        }
        z = z * z + c;
    }
    EscapeRecord {
        iterations: max_iter,
        escaped: false,
        smooth: None,
        z,
    }
}

/// `index + 1 - log2(ln|z| / ln R)`.
///
/// Returns `None` unless both `R` and `|z|` exceed 1 (every logarithm then has
/// a positive argument) and the result is finite.
pub fn smooth_iteration(index: usize, z_norm: f64, escape_radius: f64) -> Option<f64> {
    if !(escape_radius > 1.0) || !(z_norm > 1.0) {
        return None;
    }
    let ratio = z_norm.ln() / escape_radius.ln();
    if !(ratio > 0.0) {
        return None;
    }
    let value = index as f64 + 1.0 - ratio.ln() / LN_2;
    value.is_finite().then_some(value)
}

/// Row-major escape records: `height` rows of `width` cells, row 0 at `y_min`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscapeGrid {
    pub width: usize,
    pub height: usize,
    pub max_iter: usize,
    pub records: Vec<EscapeRecord>,
}

impl EscapeGrid {
    pub fn get(&self, col: usize, row: usize) -> Option<&EscapeRecord> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.records.get(row * self.width + col)
    }

    pub fn escaped_count(&self) -> usize {
        self.records.iter().filter(|r| r.escaped).count()
    }

    pub fn iterations(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.iterations).collect()
    }

    pub fn smooth_values(&self) -> Vec<Option<f64>> {
        self.records.iter().map(|r| r.smooth).collect()
    }

    /// [`log_scale`] of every smooth value; points without one stay masked.
    pub fn log_scaled(&self, factor: f64) -> Vec<Option<f64>> {
        self.records
            .iter()
            .map(|r| r.smooth.map(|value| log_scale(value, factor)))
            .collect()
    }
}

/// Evaluates every cell of the configured grid.
pub fn evaluate_grid(config: &FractalConfig, rule: &SeedRule) -> Result<EscapeGrid, ConfigError> {
    config.validate()?;
    let mut records = Vec::with_capacity(config.cell_count().unwrap_or_default());
    for row in 0..config.height {
        for col in 0..config.width {
            records.push(evaluate_cell(config, rule, col, row));
        }
    }
    Ok(EscapeGrid {
        width: config.width,
        height: config.height,
        max_iter: config.max_iter,
        records,
    })
}

/// Evaluates only the listed `(col, row)` cells, in the given order.
pub fn evaluate_points(
    config: &FractalConfig,
    rule: &SeedRule,
    cells: &[(usize, usize)],
) -> Result<Vec<EscapeRecord>, ConfigError> {
    config.validate()?;
    cells
        .iter()
        .map(|&(col, row)| {
            if col >= config.width || row >= config.height {
                return Err(ConfigError::CellOutOfRange {
                    col,
                    row,
                    width: config.width,
                    height: config.height,
                });
            }
            Ok(evaluate_cell(config, rule, col, row))
        })
        .collect()
}

fn evaluate_cell(config: &FractalConfig, rule: &SeedRule, col: usize, row: usize) -> EscapeRecord {
    let (z0, c) = rule.seed(config.point(col, row));
    escape_time(z0, c, config.max_iter, config.escape_radius)
}

/// Log transform used for colouring: `ln(v + 1) * factor` for positive `v`,
/// identity otherwise.
pub fn log_scale(value: f64, factor: f64) -> f64 {
    if value > 0.0 {
        (value + 1.0).ln() * factor
    } else {
        value
    }
}

/// Fixed colour range `(0, ln(101) * factor)` shared by a gallery so every
/// image uses the same scale.
pub fn color_range(factor: f64) -> (f64, f64) {
    (0.0, 101.0_f64.ln() * factor)
}
