use thiserror::Error;

/// Rejected inputs, reported before any computation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Step size dt must be positive and finite, got {0}.")]
    NonPositiveStep(f64),
    #[error("Duration must be non-negative and finite, got {0}.")]
    InvalidDuration(f64),
    #[error("Integration requires at least one sample.")]
    ZeroSamples,
    #[error("{samples} samples of dimension {dimension} do not fit in memory.")]
    TooManySamples { samples: usize, dimension: usize },
    #[error("State dimension mismatch. Expected {expected}, got {actual}.")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Sample times must be finite and strictly increasing (violated at index {index}).")]
    NonIncreasingTimes { index: usize },
    #[error("Trajectories differ in shape: {left_len}x{left_dim} vs {right_len}x{right_dim}.")]
    TrajectoryShapeMismatch {
        left_len: usize,
        left_dim: usize,
        right_len: usize,
        right_dim: usize,
    },
    #[error("Invalid {axis} bounds: min {min} must be finite and below max {max}.")]
    InvalidBounds {
        axis: &'static str,
        min: f64,
        max: f64,
    },
    #[error("Grid resolution must be positive, got {width}x{height}.")]
    ZeroResolution { width: usize, height: usize },
    #[error("Grid of {width}x{height} cells does not fit in memory.")]
    GridTooLarge { width: usize, height: usize },
    #[error("max_iter must be at least 1.")]
    ZeroIterations,
    #[error("Escape radius must be positive and finite, got {0}.")]
    InvalidEscapeRadius(f64),
    #[error("Log scale factor must be non-negative and finite, got {0}.")]
    InvalidLogScale(f64),
    #[error("Grid cell ({col}, {row}) lies outside a {width}x{height} grid.")]
    CellOutOfRange {
        col: usize,
        row: usize,
        width: usize,
        height: usize,
    },
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(&'static str),
}
