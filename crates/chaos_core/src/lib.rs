pub mod error;
pub mod escape;
pub mod geometry;
pub mod integrate;
pub mod presets;
pub mod solvers;
pub mod systems;
/// The `chaos_core` crate holds the numerical kernels behind the chaos and fractal renders.
/// Everything here is synchronous, deterministic and free of I/O; plotting happens elsewhere.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (ODE right-hand sides), `Steppable` (Solvers).
/// - **Solvers / Integrate**: Fixed-step RK4 and the trajectory builders layered on it.
/// - **Systems**: Lorenz, Rössler, Hindmarsh-Rose and linear flows.
/// - **Escape**: Mandelbrot/Julia escape-time evaluation with smooth iteration counts.
/// - **Geometry**: Cantor set, Pythagoras tree, Koch snowflake and the chaos game.
pub mod traits;
