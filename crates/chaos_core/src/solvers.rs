use crate::traits::{DynamicalSystem, Scalar, Steppable};
use std::convert::Infallible;

/// Classic Runge-Kutta 4th Order Solver.
///
/// Fixed step, no error estimate. Scratch buffers are sized once for the
/// state dimension and reused across steps.
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![T::zero(); dim],
            k2: vec![T::zero(); dim],
            k3: vec![T::zero(); dim],
            k4: vec![T::zero(); dim],
            tmp: vec![T::zero(); dim],
        }
    }

    pub fn dimension(&self) -> usize {
        self.tmp.len()
    }

    /// Performs one step with a fallible derivative.
    ///
    /// The first error returned by `f` aborts the step; `t` and `state` are
    /// left untouched in that case.
    pub fn try_step<E, F>(&mut self, mut f: F, t: &mut T, state: &mut [T], dt: T) -> Result<(), E>
    where
        F: FnMut(T, &[T], &mut [T]) -> Result<(), E>,
    {
        let two = T::one() + T::one();
        let half = T::one() / two;
        let sixth = T::one() / (two + two + two);

        let t0 = *t;

        // k1 = f(t, y)
        f(t0, &*state, &mut self.k1)?;

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k1[i] * half;
        }
        f(t0 + dt * half, &self.tmp, &mut self.k2)?;

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k2[i] * half;
        }
        f(t0 + dt * half, &self.tmp, &mut self.k3)?;

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        f(t0 + dt, &self.tmp, &mut self.k4)?;

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        for i in 0..state.len() {
            state[i] = state[i]
                + dt * sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
        Ok(())
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let result = self.try_step(
            |time, x, out| {
                system.apply(time, x, out);
                Ok::<(), Infallible>(())
            },
            t,
            state,
            dt,
        );
        match result {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }
}
