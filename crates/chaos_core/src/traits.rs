use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars by the integrators.
/// Must support basic arithmetic, debug printing, and conversion from primitives.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// An explicit ODE right-hand side `dy/dt = f(t, y)`.
///
/// Implementations must be pure: the same `(t, x)` always writes the same `out`.
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// t: current time
    /// x: current state
    /// out: buffer receiving dx/dt
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

impl<T: Scalar, S: DynamicalSystem<T> + ?Sized> DynamicalSystem<T> for &S {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn apply(&self, t: T, x: &[T], out: &mut [T]) {
        (**self).apply(t, x, out)
    }
}

/// A trait for solvers that can step a system forward.
pub trait Steppable<T: Scalar> {
    /// Performs one step of size dt.
    /// t: current time (updated after step)
    /// state: current state (updated after step)
    /// dt: step size
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T);
}
