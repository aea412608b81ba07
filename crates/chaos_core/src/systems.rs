//! Right-hand sides for the chaotic flows shipped with the crate.
//!
//! All systems are `f64`, three-dimensional unless noted, and pure.

use crate::error::ConfigError;
use crate::traits::DynamicalSystem;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Lorenz convection model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lorenz {
    pub sigma: f64,
    pub rho: f64,
    pub beta: f64,
}

impl Default for Lorenz {
    fn default() -> Self {
        Self {
            sigma: 10.0,
            rho: 28.0,
            beta: 8.0 / 3.0,
        }
    }
}

impl Lorenz {
    pub fn with_rho(rho: f64) -> Self {
        Self {
            rho,
            ..Self::default()
        }
    }
}

impl DynamicalSystem<f64> for Lorenz {
    fn dimension(&self) -> usize {
        3
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        out[0] = self.sigma * (x[1] - x[0]);
        out[1] = x[0] * (self.rho - x[2]) - x[1];
        out[2] = x[0] * x[1] - self.beta * x[2];
    }
}

/// Rössler attractor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rossler {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Default for Rossler {
    fn default() -> Self {
        Self {
            a: 0.1,
            b: 0.1,
            c: 14.0,
        }
    }
}

impl Rossler {
    pub fn with_c(c: f64) -> Self {
        Self {
            c,
            ..Self::default()
        }
    }
}

impl DynamicalSystem<f64> for Rossler {
    fn dimension(&self) -> usize {
        3
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        out[0] = -x[1] - x[2];
        out[1] = x[0] + self.a * x[1];
        out[2] = self.b + x[2] * (x[0] - self.c);
    }
}

/// Hindmarsh-Rose neuron with the classic `a=1, b=3, c=1, d=5, s=4, x_r=-1.6`
/// coefficients. `r` sets the slow adaptation rate and `current` the applied
/// current `I`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HindmarshRose {
    pub r: f64,
    pub current: f64,
}

impl Default for HindmarshRose {
    fn default() -> Self {
        Self {
            r: 0.005,
            current: 3.2,
        }
    }
}

impl HindmarshRose {
    pub fn with_current(current: f64) -> Self {
        Self {
            current,
            ..Self::default()
        }
    }
}

impl DynamicalSystem<f64> for HindmarshRose {
    fn dimension(&self) -> usize {
        3
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let v = x[0];
        out[0] = x[1] + 3.0 * v * v - v * v * v - x[2] + self.current;
        out[1] = 1.0 - 5.0 * v * v - x[1];
        out[2] = self.r * (4.0 * (v + 1.6) - x[2]);
    }
}

/// Constant-coefficient linear flow `dy/dt = A y`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSystem {
    matrix: DMatrix<f64>,
}

impl LinearSystem {
    pub fn new(matrix: DMatrix<f64>) -> Result<Self, ConfigError> {
        if !matrix.is_square() {
            return Err(ConfigError::DimensionMismatch {
                expected: matrix.nrows(),
                actual: matrix.ncols(),
            });
        }
        Ok(Self { matrix })
    }

    /// Builds the system from a row-major `dim x dim` slice.
    pub fn from_row_slice(dim: usize, entries: &[f64]) -> Result<Self, ConfigError> {
        if dim.checked_mul(dim) != Some(entries.len()) {
            return Err(ConfigError::DimensionMismatch {
                expected: dim.saturating_mul(dim),
                actual: entries.len(),
            });
        }
        Self::new(DMatrix::from_row_slice(dim, dim, entries))
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }
}

impl DynamicalSystem<f64> for LinearSystem {
    fn dimension(&self) -> usize {
        self.matrix.nrows()
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let rhs = &self.matrix * DVector::from_column_slice(x);
        out.copy_from_slice(rhs.as_slice());
    }
}

/// Adapts a plain closure into a [`DynamicalSystem`].
pub struct FnSystem<F> {
    dimension: usize,
    f: F,
}

impl<F> FnSystem<F>
where
    F: Fn(f64, &[f64], &mut [f64]),
{
    pub fn new(dimension: usize, f: F) -> Self {
        Self { dimension, f }
    }
}

impl<F> DynamicalSystem<f64> for FnSystem<F>
where
    F: Fn(f64, &[f64], &mut [f64]),
{
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        (self.f)(t, x, out)
    }
}
