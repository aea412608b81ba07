//! Fixed-step trajectory integration on top of [`RK4`].
//!
//! Sample `0` of every trajectory is the initial state; sample `i` is the
//! state after `i` RK4 steps. Times are `t0 + i * dt`, computed by
//! multiplication so long runs carry no accumulated drift.

use crate::error::ConfigError;
use crate::solvers::RK4;
use crate::traits::{DynamicalSystem, Steppable};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegrationSettings {
    pub t0: f64,
    pub dt: f64,
    pub samples: usize,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            t0: 0.0,
            dt: 0.005,
            samples: 20_000,
        }
    }
}

impl IntegrationSettings {
    pub fn new(t0: f64, dt: f64, samples: usize) -> Result<Self, ConfigError> {
        let settings = Self { t0, dt, samples };
        settings.validate()?;
        Ok(settings)
    }

    /// Settings covering `duration` with `floor(duration / dt)` samples.
    pub fn from_duration(t0: f64, duration: f64, dt: f64) -> Result<Self, ConfigError> {
        let samples = step_count(duration, dt)?;
        Self::new(t0, dt, samples)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dt > 0.0) || !self.dt.is_finite() {
            return Err(ConfigError::NonPositiveStep(self.dt));
        }
        if self.samples == 0 {
            return Err(ConfigError::ZeroSamples);
        }
        Ok(())
    }

    /// Time of sample `index`.
    pub fn time(&self, index: usize) -> f64 {
        self.t0 + index as f64 * self.dt
    }
}

/// Number of whole steps of size `dt` that fit in `duration`.
pub fn step_count(duration: f64, dt: f64) -> Result<usize, ConfigError> {
    if !(dt > 0.0) || !dt.is_finite() {
        return Err(ConfigError::NonPositiveStep(dt));
    }
    if !(duration >= 0.0) || !duration.is_finite() {
        return Err(ConfigError::InvalidDuration(duration));
    }
    Ok((duration / dt).floor() as usize)
}

/// A sampled solution, stored row-major: `states[i * dimension..(i + 1) * dimension]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    dimension: usize,
    times: Vec<f64>,
    states: Vec<f64>,
}

impl Trajectory {
    pub fn with_capacity(dimension: usize, samples: usize) -> Result<Self, ConfigError> {
        let values = samples
            .checked_mul(dimension)
            .filter(|&n| fits_f64_buffer(n) && fits_f64_buffer(samples))
            .ok_or(ConfigError::TooManySamples { samples, dimension })?;
        Ok(Self {
            dimension,
            times: Vec::with_capacity(samples),
            states: Vec::with_capacity(values),
        })
    }

    fn push(&mut self, t: f64, state: &[f64]) {
        debug_assert_eq!(state.len(), self.dimension);
        self.times.push(t);
        self.states.extend_from_slice(state);
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Flat row-major state storage.
    pub fn states(&self) -> &[f64] {
        &self.states
    }

    pub fn time(&self, index: usize) -> Option<f64> {
        self.times.get(index).copied()
    }

    pub fn state(&self, index: usize) -> Option<&[f64]> {
        if index >= self.len() {
            return None;
        }
        let start = index * self.dimension;
        Some(&self.states[start..start + self.dimension])
    }

    pub fn last(&self) -> Option<&[f64]> {
        self.len().checked_sub(1).and_then(|index| self.state(index))
    }

    /// The time series of one coordinate.
    pub fn component(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.dimension {
            return None;
        }
        Some(
            self.states
                .chunks_exact(self.dimension)
                .map(|row| row[index])
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &[f64])> + '_ {
        self.times
            .iter()
            .copied()
            .zip(self.states.chunks_exact(self.dimension.max(1)))
    }

    /// Drops the first `count` samples. Dropping more than `len()` leaves an
    /// empty trajectory of the same dimension.
    pub fn discard_transient(&self, count: usize) -> Trajectory {
        let count = count.min(self.len());
        Trajectory {
            dimension: self.dimension,
            times: self.times[count..].to_vec(),
            states: self.states[count * self.dimension..].to_vec(),
        }
    }
}

/// Integrates `system` from `initial_state` with fixed RK4 steps.
pub fn integrate<S>(
    system: &S,
    initial_state: &[f64],
    settings: &IntegrationSettings,
) -> Result<Trajectory>
where
    S: DynamicalSystem<f64> + ?Sized,
{
    check_dimension(system.dimension(), initial_state)?;
    try_integrate(
        |t, x, out| {
            system.apply(t, x, out);
            Ok(())
        },
        initial_state,
        settings,
    )
}

/// Closure form of [`integrate`]; the first error returned by `f` is
/// propagated with the failing step attached as context.
pub fn try_integrate<F>(
    mut f: F,
    initial_state: &[f64],
    settings: &IntegrationSettings,
) -> Result<Trajectory>
where
    F: FnMut(f64, &[f64], &mut [f64]) -> Result<()>,
{
    settings.validate()?;
    if initial_state.is_empty() {
        bail!("Initial state must have positive dimension.");
    }

    let dim = initial_state.len();
    let mut solver = RK4::new(dim);
    let mut state = initial_state.to_vec();
    let mut trajectory = Trajectory::with_capacity(dim, settings.samples)?;
    trajectory.push(settings.t0, &state);

    for step in 1..settings.samples {
        let mut t = settings.time(step - 1);
        solver
            .try_step(&mut f, &mut t, &mut state, settings.dt)
            .with_context(|| format!("Derivative evaluation failed during step {step}."))?;
        trajectory.push(settings.time(step), &state);
    }

    Ok(trajectory)
}

/// Integrates onto an explicit, strictly increasing time grid. Each interval
/// is covered by a single RK4 step of its own width.
pub fn integrate_at_times<S>(system: &S, initial_state: &[f64], times: &[f64]) -> Result<Trajectory>
where
    S: DynamicalSystem<f64> + ?Sized,
{
    let dim = check_dimension(system.dimension(), initial_state)?;
    let Some(&t0) = times.first() else {
        bail!(ConfigError::ZeroSamples);
    };
    if !t0.is_finite() {
        bail!(ConfigError::NonIncreasingTimes { index: 0 });
    }
    for (index, pair) in times.windows(2).enumerate() {
        if !(pair[1] > pair[0]) || !pair[1].is_finite() {
            bail!(ConfigError::NonIncreasingTimes { index: index + 1 });
        }
    }

    let mut solver = RK4::new(dim);
    let mut state = initial_state.to_vec();
    let mut trajectory = Trajectory::with_capacity(dim, times.len())?;
    trajectory.push(t0, &state);

    for pair in times.windows(2) {
        let mut t = pair[0];
        solver.step(&system, &mut t, &mut state, pair[1] - pair[0]);
        trajectory.push(pair[1], &state);
    }

    Ok(trajectory)
}

fn fits_f64_buffer(len: usize) -> bool {
    len.checked_mul(std::mem::size_of::<f64>())
        .is_some_and(|bytes| bytes <= isize::MAX as usize)
}

fn check_dimension(expected: usize, initial_state: &[f64]) -> Result<usize, ConfigError> {
    if expected == 0 || initial_state.len() != expected {
        return Err(ConfigError::DimensionMismatch {
            expected,
            actual: initial_state.len(),
        });
    }
    Ok(expected)
}

/// Euclidean distance between two trajectories at every sample.
pub fn separation(a: &Trajectory, b: &Trajectory) -> Result<Vec<f64>, ConfigError> {
    if a.len() != b.len() || a.dimension() != b.dimension() {
        return Err(ConfigError::TrajectoryShapeMismatch {
            left_len: a.len(),
            left_dim: a.dimension(),
            right_len: b.len(),
            right_dim: b.dimension(),
        });
    }
    Ok(a.iter()
        .zip(b.iter())
        .map(|((_, x), (_, y))| {
            x.iter()
                .zip(y)
                .map(|(p, q)| (p - q) * (p - q))
                .sum::<f64>()
                .sqrt()
        })
        .collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub parameter: f64,
    pub trajectory: Trajectory,
}

/// Runs one independent integration per parameter value, discarding the
/// first `transient` samples of each. Results keep the order of `values`.
pub fn sweep<S, B>(
    values: &[f64],
    mut build: B,
    initial_state: &[f64],
    settings: &IntegrationSettings,
    transient: usize,
) -> Result<Vec<SweepResult>>
where
    S: DynamicalSystem<f64>,
    B: FnMut(f64) -> S,
{
    let mut results = Vec::with_capacity(values.len());
    for &parameter in values {
        let system = build(parameter);
        let trajectory = integrate(&system, initial_state, settings)
            .with_context(|| format!("Sweep failed at parameter {parameter}."))?;
        results.push(SweepResult {
            parameter,
            trajectory: trajectory.discard_transient(transient),
        });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::{FnSystem, Lorenz, Rossler};
    use anyhow::anyhow;

    fn assert_err_contains<T: std::fmt::Debug>(result: Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err:#}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    fn decay() -> FnSystem<impl Fn(f64, &[f64], &mut [f64])> {
        FnSystem::new(1, |_t: f64, x: &[f64], out: &mut [f64]| out[0] = -x[0])
    }

    fn decay_error(dt: f64, steps: usize) -> f64 {
        let settings = IntegrationSettings::new(0.0, dt, steps + 1).expect("settings");
        let trajectory = integrate(&decay(), &[1.0], &settings).expect("integrate");
        let t_end = trajectory.time(steps).expect("final time");
        let y_end = trajectory.last().expect("final state")[0];
        (y_end - (-t_end).exp()).abs()
    }

    #[test]
    fn exponential_decay_error_shrinks_as_dt_to_the_fourth() {
        let coarse = decay_error(0.1, 10);
        let fine = decay_error(0.05, 20);
        assert!(coarse < 1e-6, "coarse error too large: {coarse}");
        let ratio = coarse / fine;
        assert!(
            (12.0..20.0).contains(&ratio),
            "expected ~16x error reduction, got {ratio}"
        );
    }

    #[test]
    fn trajectory_has_requested_samples_and_uniform_times() {
        let settings = IntegrationSettings::new(2.0, 0.25, 9).expect("settings");
        let trajectory = integrate(&decay(), &[1.0], &settings).expect("integrate");
        assert_eq!(trajectory.len(), 9);
        assert_eq!(trajectory.dimension(), 1);
        assert_eq!(trajectory.state(0), Some(&[1.0][..]));
        for (i, t) in trajectory.times().iter().enumerate() {
            assert_eq!(*t, 2.0 + i as f64 * 0.25);
        }
    }

    #[test]
    fn single_sample_returns_initial_state_only() {
        let settings = IntegrationSettings::new(0.0, 0.1, 1).expect("settings");
        let trajectory =
            integrate(&Lorenz::default(), &[1.0, 2.0, 3.0], &settings).expect("integrate");
        assert_eq!(trajectory.len(), 1);
        assert_eq!(trajectory.states(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn integration_is_bit_identical_across_runs() {
        let settings = IntegrationSettings::new(0.0, 0.005, 5_000).expect("settings");
        let first = integrate(&Lorenz::default(), &[0.0, 1.0, 1.0], &settings).expect("first");
        let second = integrate(&Lorenz::default(), &[0.0, 1.0, 1.0], &settings).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn integrate_rejects_invalid_inputs() {
        assert_eq!(
            IntegrationSettings::new(0.0, 0.0, 10),
            Err(ConfigError::NonPositiveStep(0.0))
        );
        assert_eq!(
            IntegrationSettings::new(0.0, -0.1, 10),
            Err(ConfigError::NonPositiveStep(-0.1))
        );
        assert!(IntegrationSettings::new(0.0, f64::NAN, 10).is_err());
        assert_eq!(
            IntegrationSettings::new(0.0, 0.1, 0),
            Err(ConfigError::ZeroSamples)
        );

        let settings = IntegrationSettings::new(0.0, 0.1, 10).expect("settings");
        assert_err_contains(
            integrate(&Lorenz::default(), &[1.0, 2.0], &settings),
            "Expected 3, got 2",
        );

        let bad = IntegrationSettings {
            t0: 0.0,
            dt: -1.0,
            samples: 3,
        };
        assert_err_contains(
            integrate(&Lorenz::default(), &[1.0, 2.0, 3.0], &bad),
            "dt must be positive",
        );
        assert_err_contains(
            try_integrate(|_, _, _| Ok(()), &[], &settings),
            "positive dimension",
        );
    }

    #[test]
    fn oversized_sample_counts_are_rejected_before_allocation() {
        assert_eq!(
            Trajectory::with_capacity(3, usize::MAX / 2),
            Err(ConfigError::TooManySamples {
                samples: usize::MAX / 2,
                dimension: 3,
            })
        );
        assert!(Trajectory::with_capacity(1, usize::MAX).is_err());
        assert_eq!(Trajectory::with_capacity(3, 10).expect("capacity").len(), 0);

        let huge = IntegrationSettings {
            t0: 0.0,
            dt: 0.1,
            samples: usize::MAX,
        };
        assert_err_contains(
            integrate(&Lorenz::default(), &[1.0, 1.0, 1.0], &huge),
            "do not fit in memory",
        );

        let times = [0.0, 1.0];
        let trajectory = integrate_at_times(&Lorenz::default(), &[1.0, 1.0, 1.0], &times)
            .expect("integrate");
        assert_eq!(trajectory.len(), 2);
    }

    #[derive(Debug)]
    struct Singular;

    impl std::fmt::Display for Singular {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "singular derivative")
        }
    }

    impl std::error::Error for Singular {}

    #[test]
    fn try_integrate_propagates_derivative_error() {
        let settings = IntegrationSettings::new(0.0, 0.1, 100).expect("settings");
        let result = try_integrate(
            |t, x, out| {
                if t >= 0.5 {
                    return Err(Singular.into());
                }
                out[0] = x[0];
                Ok(())
            },
            &[1.0],
            &settings,
        );
        let err = result.expect_err("expected derivative error");
        assert!(err.downcast_ref::<Singular>().is_some());
        assert!(format!("{err:#}").contains("singular derivative"));
        // Step 5 starts at t = 0.4; its k4 stage is the first to reach t = 0.5.
        assert!(format!("{err}").contains("step 5"));
    }

    #[test]
    fn try_integrate_accepts_successful_closure() {
        let settings = IntegrationSettings::new(0.0, 0.5, 3).expect("settings");
        let trajectory = try_integrate(
            |_, _, out| {
                out[0] = 2.0;
                Ok(())
            },
            &[0.0],
            &settings,
        )
        .expect("integrate");
        assert_eq!(trajectory.component(0), Some(vec![0.0, 1.0, 2.0]));
    }

    #[test]
    fn try_integrate_surfaces_anyhow_messages() {
        let settings = IntegrationSettings::new(0.0, 0.1, 3).expect("settings");
        assert_err_contains(
            try_integrate(|_, _, _| Err(anyhow!("rhs unavailable")), &[1.0], &settings),
            "rhs unavailable",
        );
    }

    #[test]
    fn integrate_at_times_matches_uniform_integration() {
        let settings = IntegrationSettings::new(0.0, 0.01, 200).expect("settings");
        let uniform = integrate(&Rossler::with_c(5.0), &[0.1, 0.1, 0.1], &settings).expect("uniform");
        let times: Vec<f64> = (0..200).map(|i| settings.time(i)).collect();
        let explicit =
            integrate_at_times(&Rossler::with_c(5.0), &[0.1, 0.1, 0.1], &times).expect("explicit");
        assert_eq!(explicit.len(), uniform.len());
        for (a, b) in explicit.states().iter().zip(uniform.states()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert_eq!(explicit.times(), times.as_slice());
    }

    #[test]
    fn integrate_at_times_handles_uneven_grid() {
        let times = [0.0, 0.1, 0.3, 0.35, 1.0];
        let trajectory = integrate_at_times(&decay(), &[1.0], &times).expect("integrate");
        for (t, state) in trajectory.iter() {
            assert!((state[0] - (-t).exp()).abs() < 1e-3);
        }
    }

    #[test]
    fn integrate_at_times_rejects_bad_grids() {
        assert_err_contains(integrate_at_times(&decay(), &[1.0], &[]), "at least one sample");
        assert_err_contains(
            integrate_at_times(&decay(), &[1.0], &[0.0, 0.5, 0.5]),
            "index 2",
        );
        assert_err_contains(
            integrate_at_times(&decay(), &[1.0], &[f64::NAN, 1.0]),
            "index 0",
        );
    }

    #[test]
    fn step_count_floors_and_is_stable() {
        assert_eq!(step_count(300.0, 0.005), Ok(60_000));
        assert_eq!(step_count(1.0, 0.3), Ok(3));
        assert_eq!(step_count(0.0, 0.1), Ok(0));
        let first = step_count(200.0, 0.005);
        for _ in 0..10 {
            assert_eq!(step_count(200.0, 0.005), first);
        }
        assert_eq!(step_count(1.0, 0.0), Err(ConfigError::NonPositiveStep(0.0)));
        assert_eq!(step_count(-1.0, 0.1), Err(ConfigError::InvalidDuration(-1.0)));
    }

    #[test]
    fn from_duration_uses_step_count() {
        let settings = IntegrationSettings::from_duration(0.0, 300.0, 0.005).expect("settings");
        assert_eq!(settings.samples, 60_000);
        assert_eq!(
            IntegrationSettings::from_duration(0.0, 0.01, 0.1),
            Err(ConfigError::ZeroSamples)
        );
    }

    #[test]
    fn discard_transient_drops_prefix_and_saturates() {
        let settings = IntegrationSettings::new(0.0, 0.1, 10).expect("settings");
        let trajectory = integrate(&decay(), &[1.0], &settings).expect("integrate");
        let tail = trajectory.discard_transient(4);
        assert_eq!(tail.len(), 6);
        assert_eq!(tail.time(0), trajectory.time(4));
        assert_eq!(tail.state(0), trajectory.state(4));

        let empty = trajectory.discard_transient(50);
        assert!(empty.is_empty());
        assert_eq!(empty.dimension(), 1);
        assert_eq!(empty.last(), None);
    }

    #[test]
    fn component_extracts_coordinate_series() {
        let settings = IntegrationSettings::new(0.0, 0.01, 5).expect("settings");
        let trajectory =
            integrate(&Lorenz::default(), &[1.0, 2.0, 3.0], &settings).expect("integrate");
        let z = trajectory.component(2).expect("z series");
        assert_eq!(z.len(), 5);
        assert_eq!(z[0], 3.0);
        assert_eq!(trajectory.component(3), None);
    }

    #[test]
    fn separation_grows_for_nearby_lorenz_states() {
        let settings = IntegrationSettings::new(0.0, 0.005, 8_000).expect("settings");
        let a = integrate(&Lorenz::default(), &[1.0, 1.0, 1.0], &settings).expect("a");
        let b = integrate(&Lorenz::default(), &[1.0, 1.0, 1.0 + 1e-8], &settings).expect("b");
        let distance = separation(&a, &b).expect("separation");
        assert_eq!(distance.len(), a.len());
        assert!((distance[0] - 1e-8).abs() < 1e-12);
        let max = distance.iter().cloned().fold(0.0, f64::max);
        assert!(max > 1.0, "nearby states should diverge, max separation {max}");

        assert_eq!(separation(&a, &a), Ok(vec![0.0; a.len()]));
        assert!(separation(&a, &a.discard_transient(1)).is_err());
    }

    #[test]
    fn sweep_keeps_order_and_discards_transient() {
        let settings = IntegrationSettings::new(0.0, 0.01, 300).expect("settings");
        let values = [5.0, 6.0, 8.0];
        let results = sweep(&values, Rossler::with_c, &[0.1, 0.1, 0.1], &settings, 100)
            .expect("sweep");
        assert_eq!(results.len(), 3);
        for (result, value) in results.iter().zip(values) {
            assert_eq!(result.parameter, value);
            assert_eq!(result.trajectory.len(), 200);
            assert_eq!(result.trajectory.time(0), Some(settings.time(100)));
        }

        let standalone = integrate(&Rossler::with_c(6.0), &[0.1, 0.1, 0.1], &settings)
            .expect("standalone")
            .discard_transient(100);
        assert_eq!(results[1].trajectory, standalone);
    }

    #[test]
    fn sweep_reports_failing_parameter() {
        let settings = IntegrationSettings::new(0.0, 0.01, 10).expect("settings");
        assert_err_contains(
            sweep(&[145.0], Lorenz::with_rho, &[1.0], &settings, 0),
            "Sweep failed at parameter 145",
        );
    }
}
