//! Named parameters, sweep lists and the integration windows of the
//! original driver runs.

use crate::error::ConfigError;
use crate::escape::{Bounds, FractalConfig, SeedRule};
use crate::integrate::{integrate, step_count, IntegrationSettings, Trajectory};
use crate::traits::DynamicalSystem;
use anyhow::Result;
use num_complex::Complex;
use serde::{Deserialize, Serialize};

/// Lorenz `rho` values stepping through the period-doubling route to chaos.
pub const LORENZ_RHO_SWEEP: [f64; 4] = [145.0, 148.0, 155.0, 166.0];

/// Rössler `c` values (with `a = b = 0.1`) for the period-doubling cascade.
pub const ROSSLER_C_SWEEP: [f64; 6] = [5.0, 6.0, 8.0, 9.0, 12.0, 18.0];

/// Applied currents taking the Hindmarsh-Rose neuron from rest to bursting.
pub const HINDMARSH_ROSE_CURRENT_SWEEP: [f64; 4] = [1.2, 2.0, 3.2, 3.9];

/// Samples a driver drops before plotting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transient {
    Samples { count: usize },
    /// Keeps everything when the second half of `x` is flat (population
    /// standard deviation below `threshold`, a resting neuron), otherwise
    /// drops the first half.
    RestOrBurst { threshold: f64 },
}

impl Transient {
    /// Number of leading samples of `trajectory` to discard.
    pub fn resolve(&self, trajectory: &Trajectory) -> usize {
        match *self {
            Transient::Samples { count } => count.min(trajectory.len()),
            Transient::RestOrBurst { threshold } => {
                let half = trajectory.len() / 2;
                let x = trajectory.component(0).unwrap_or_default();
                let tail = x.get(half..).unwrap_or(&[]);
                if tail.is_empty() {
                    return 0;
                }
                let n = tail.len() as f64;
                let mean = tail.iter().sum::<f64>() / n;
                let variance = tail.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
                if variance.sqrt() < threshold {
                    0
                } else {
                    half
                }
            }
        }
    }
}

/// Time grid, transient and start state of one driver run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverPreset {
    pub settings: IntegrationSettings,
    pub transient: Transient,
    pub initial_state: [f64; 3],
}

impl DriverPreset {
    /// Integrates `system` over the preset window and drops the transient.
    pub fn run<S>(&self, system: &S) -> Result<Trajectory>
    where
        S: DynamicalSystem<f64> + ?Sized,
    {
        let trajectory = integrate(system, &self.initial_state, &self.settings)?;
        let cut = self.transient.resolve(&trajectory);
        Ok(trajectory.discard_transient(cut))
    }
}

/// Attractor render: `T = 300`, `dt = 0.005` from `(0, 1, 1)`, first 30000
/// samples dropped.
pub fn lorenz_attractor() -> Result<DriverPreset, ConfigError> {
    Ok(DriverPreset {
        settings: IntegrationSettings::from_duration(0.0, 300.0, 0.005)?,
        transient: Transient::Samples { count: 30_000 },
        initial_state: [0.0, 1.0, 1.0],
    })
}

/// `rho` sweep: 20000 steps of 0.005 from `(1, 1, 1)`; the states after steps
/// 4001..=20000 are kept.
pub fn lorenz_period_doubling() -> Result<DriverPreset, ConfigError> {
    Ok(DriverPreset {
        settings: IntegrationSettings::new(0.0, 0.005, 20_001)?,
        transient: Transient::Samples { count: 4_001 },
        initial_state: [1.0, 1.0, 1.0],
    })
}

/// Sensitivity comparison: `T = 200`, `dt = 0.005`, first 500 samples dropped.
/// The second run starts from [`LORENZ_SENSITIVITY_PERTURBED_STATE`].
pub fn lorenz_sensitivity() -> Result<DriverPreset, ConfigError> {
    Ok(DriverPreset {
        settings: IntegrationSettings::from_duration(0.0, 200.0, 0.005)?,
        transient: Transient::Samples { count: 500 },
        initial_state: [1.0, 1.0, 1.0],
    })
}

pub const LORENZ_SENSITIVITY_PERTURBED_STATE: [f64; 3] = [1.0, 1.0, 1.0 + 1e-8];

/// `c` sweep: `T = 300`, `dt = 0.01` from `(0.1, 0.1, 0.1)`, the first 220 time
/// units dropped.
pub fn rossler_period_doubling() -> Result<DriverPreset, ConfigError> {
    let dt = 0.01;
    Ok(DriverPreset {
        settings: IntegrationSettings::from_duration(0.0, 300.0, dt)?,
        transient: Transient::Samples {
            count: step_count(220.0, dt)?,
        },
        initial_state: [0.1, 0.1, 0.1],
    })
}

/// Current sweep: 20000 samples evenly spanning `[0, 1200]` from
/// `(-1, 0, 2)`, with the rest-or-burst transient rule.
pub fn hindmarsh_rose_bursting() -> Result<DriverPreset, ConfigError> {
    let samples = 20_000;
    Ok(DriverPreset {
        settings: IntegrationSettings::new(0.0, 1200.0 / (samples - 1) as f64, samples)?,
        transient: Transient::RestOrBurst { threshold: 0.1 },
        initial_state: [-1.0, 0.0, 2.0],
    })
}

pub const FAMOUS_JULIA_SETS: [(&str, Complex<f64>); 8] = [
    ("Classic Spiral", Complex::new(-0.79, 0.15)),
    ("Douady's Rabbit", Complex::new(-0.122561, 0.744862)),
    ("The San Marco Dragon", Complex::new(0.285, 0.01)),
    ("Spiral Galaxy", Complex::new(-0.75, 0.1)),
    ("The Basilica", Complex::new(-1.0, 0.0)),
    ("Fatou Dust", Complex::new(-0.4, 0.6)),
    ("Snowflake", Complex::new(0.36, 0.1)),
    ("Cantor Dust", Complex::new(0.5, 0.0)),
];

/// Julia parameters keyed by the period of the attracting cycle they were
/// picked for (n = 0..=6). All but period 1 are hyperbolic centres.
pub const JULIA_PERIOD_PRESETS: [(u32, Complex<f64>); 7] = [
    (0, Complex::new(0.0, 0.0)),
    (1, Complex::new(-0.74543, 0.11301)),
    (2, Complex::new(-1.0, 0.0)),
    (3, Complex::new(-0.12256117, 0.74486177)),
    (4, Complex::new(-0.15652017, 1.03224711)),
    (5, Complex::new(-0.19804210, 1.10026954)),
    (6, Complex::new(-0.21752675, 1.11445427)),
];

/// Path of `c` values traced across the Mandelbrot set, one Julia set per stop.
pub const JULIA_ANIMATION_PATH: [Complex<f64>; 8] = [
    Complex::new(-0.745, 0.113),
    Complex::new(-1.25, 0.0),
    Complex::new(0.285, 0.01),
    Complex::new(-0.8, 0.156),
    Complex::new(0.4, 0.4),
    Complex::new(-0.162, 1.04),
    Complex::new(-0.70176, -0.3842),
    Complex::new(0.0, 0.0),
];

pub fn famous_julia(name: &str) -> Option<SeedRule> {
    FAMOUS_JULIA_SETS
        .iter()
        .find(|(preset, _)| *preset == name)
        .map(|&(_, c)| SeedRule::Julia { c })
}

pub fn julia_for_period(period: u32) -> Option<SeedRule> {
    JULIA_PERIOD_PRESETS
        .iter()
        .find(|(p, _)| *p == period)
        .map(|&(_, c)| SeedRule::Julia { c })
}

/// Full Mandelbrot view used for the overview render.
pub fn mandelbrot_view() -> FractalConfig {
    FractalConfig {
        width: 1200,
        height: 1200,
        bounds: Bounds {
            x_min: -2.0,
            x_max: 1.0,
            y_min: -1.5,
            y_max: 1.5,
        },
        ..FractalConfig::default()
    }
}

/// Square `[-1.5, 1.5]` window with 100 iterations for animation frames.
pub fn animation_frame(width: usize, height: usize) -> FractalConfig {
    FractalConfig {
        width,
        height,
        bounds: Bounds {
            x_min: -1.5,
            x_max: 1.5,
            y_min: -1.5,
            y_max: 1.5,
        },
        max_iter: 100,
        ..FractalConfig::default()
    }
}

/// Filesystem-safe stem for a named Julia render, e.g.
/// `Douadys_Rabbit_c_minus0_122561_0_744862i`.
pub fn julia_file_stem(name: &str, c: Complex<f64>) -> String {
    let safe: String = name
        .chars()
        .filter(|ch| ch.is_alphanumeric() || *ch == '_' || *ch == '-' || ch.is_whitespace())
        .collect();
    let safe = safe.trim().replace(' ', "_");
    let c_str = format!("{:.6}_{:.6}i", c.re, c.im)
        .replace('.', "_")
        .replace('-', "minus")
        .replace('+', "plus");
    format!("{safe}_c_{c_str}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::escape_time;
    use crate::systems::{LinearSystem, Lorenz};

    #[test]
    fn presets_are_valid_configs() {
        assert_eq!(mandelbrot_view().validate(), Ok(()));
        assert_eq!(animation_frame(64, 64).validate(), Ok(()));
        assert_eq!(mandelbrot_view().max_iter, 1024);
    }

    #[test]
    fn lorenz_presets_match_driver_windows() {
        let attractor = lorenz_attractor().expect("preset");
        assert_eq!(attractor.settings.samples, 60_000);
        assert_eq!(attractor.settings.dt, 0.005);
        assert_eq!(attractor.transient, Transient::Samples { count: 30_000 });
        assert_eq!(attractor.initial_state, [0.0, 1.0, 1.0]);

        let route = lorenz_period_doubling().expect("preset");
        assert_eq!(route.settings.samples, 20_001);
        assert_eq!(route.settings.dt, 0.005);
        assert_eq!(route.transient, Transient::Samples { count: 4_001 });
        assert_eq!(route.initial_state, [1.0, 1.0, 1.0]);

        let sensitivity = lorenz_sensitivity().expect("preset");
        assert_eq!(sensitivity.settings.samples, 40_000);
        assert_eq!(sensitivity.transient, Transient::Samples { count: 500 });
        assert_eq!(LORENZ_SENSITIVITY_PERTURBED_STATE, [1.0, 1.0, 1.0 + 1e-8]);
    }

    #[test]
    fn rossler_preset_matches_driver_window() {
        let preset = rossler_period_doubling().expect("preset");
        assert_eq!(preset.settings.dt, 0.01);
        assert_eq!(preset.settings.samples, 30_000);
        assert_eq!(preset.transient, Transient::Samples { count: 22_000 });
        assert_eq!(preset.initial_state, [0.1, 0.1, 0.1]);
    }

    #[test]
    fn hindmarsh_rose_preset_matches_driver_window() {
        let preset = hindmarsh_rose_bursting().expect("preset");
        assert_eq!(preset.settings.samples, 20_000);
        assert!((preset.settings.time(19_999) - 1200.0).abs() < 1e-9);
        assert_eq!(preset.transient, Transient::RestOrBurst { threshold: 0.1 });
        assert_eq!(preset.initial_state, [-1.0, 0.0, 2.0]);
    }

    #[test]
    fn period_doubling_run_keeps_post_transient_states() {
        let preset = lorenz_period_doubling().expect("preset");
        let trajectory = preset
            .run(&Lorenz::with_rho(LORENZ_RHO_SWEEP[0]))
            .expect("run");
        assert_eq!(trajectory.len(), 16_000);
        assert!((trajectory.times()[0] - 4_001.0 * 0.005).abs() < 1e-9);
    }

    #[test]
    fn rest_or_burst_keeps_flat_runs_and_halves_oscillating_ones() {
        let rule = Transient::RestOrBurst { threshold: 0.1 };
        let settings = IntegrationSettings::new(0.0, 0.1, 101).expect("settings");

        let resting = LinearSystem::from_row_slice(1, &[0.0]).expect("system");
        let flat = integrate(&resting, &[-1.5], &settings).expect("integrate");
        assert_eq!(rule.resolve(&flat), 0);

        let oscillator = LinearSystem::from_row_slice(2, &[0.0, 1.0, -1.0, 0.0]).expect("system");
        let bursting = integrate(&oscillator, &[1.0, 0.0], &settings).expect("integrate");
        assert_eq!(rule.resolve(&bursting), 50);

        let samples = Transient::Samples { count: 500 };
        assert_eq!(samples.resolve(&flat), 101);
    }

    #[test]
    fn famous_julia_lookup_by_name() {
        assert_eq!(
            famous_julia("The Basilica"),
            Some(SeedRule::julia(-1.0, 0.0))
        );
        assert_eq!(famous_julia("Nope"), None);
    }

    #[test]
    fn period_presets_lie_in_the_mandelbrot_set() {
        // The seahorse-valley entry sits just outside the set.
        for (period, c) in JULIA_PERIOD_PRESETS.into_iter().filter(|(p, _)| *p != 1) {
            let (z0, c) = SeedRule::Mandelbrot.seed(c);
            let record = escape_time(z0, c, 2_000, 2.0);
            assert!(!record.escaped, "period {period} preset escaped");
            assert!(julia_for_period(period).is_some());
        }
        assert!(julia_for_period(1).is_some());
        assert_eq!(julia_for_period(7), None);
    }

    #[test]
    fn file_stem_matches_gallery_naming() {
        assert_eq!(
            julia_file_stem("Douady's Rabbit", Complex::new(-0.122561, 0.744862)),
            "Douadys_Rabbit_c_minus0_122561_0_744862i"
        );
    }
}
