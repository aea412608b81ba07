//! Core WASM system wrapper and low-level utilities.

use chaos_core::integrate::{integrate, IntegrationSettings, Trajectory};
use chaos_core::solvers::RK4;
use chaos_core::systems::{HindmarshRose, Lorenz, Rossler};
use chaos_core::traits::{DynamicalSystem, Steppable};
use js_sys::Float64Array;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmSystem {
    pub(crate) model: Model,
    state: Vec<f64>,
    t: f64,
    solver: RK4<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Model {
    Lorenz(Lorenz),
    Rossler(Rossler),
    HindmarshRose(HindmarshRose),
}

impl DynamicalSystem<f64> for Model {
    fn dimension(&self) -> usize {
        match self {
            Model::Lorenz(s) => s.dimension(),
            Model::Rossler(s) => s.dimension(),
            Model::HindmarshRose(s) => s.dimension(),
        }
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        match self {
            Model::Lorenz(s) => s.apply(t, x, out),
            Model::Rossler(s) => s.apply(t, x, out),
            Model::HindmarshRose(s) => s.apply(t, x, out),
        }
    }
}

/// Builds a model from its name and parameter list. An empty list selects the
/// model defaults.
pub(crate) fn build_model(name: &str, params: &[f64]) -> Result<Model, String> {
    let arity = |count: usize| {
        if params.len() == count {
            Ok(())
        } else {
            Err(format!(
                "Model '{name}' expects {count} parameters, got {}.",
                params.len()
            ))
        }
    };
    match name {
        "lorenz" if params.is_empty() => Ok(Model::Lorenz(Lorenz::default())),
        "lorenz" => {
            arity(3)?;
            Ok(Model::Lorenz(Lorenz {
                sigma: params[0],
                rho: params[1],
                beta: params[2],
            }))
        }
        "rossler" if params.is_empty() => Ok(Model::Rossler(Rossler::default())),
        "rossler" => {
            arity(3)?;
            Ok(Model::Rossler(Rossler {
                a: params[0],
                b: params[1],
                c: params[2],
            }))
        }
        "hindmarsh_rose" if params.is_empty() => {
            Ok(Model::HindmarshRose(HindmarshRose::default()))
        }
        "hindmarsh_rose" => {
            arity(2)?;
            Ok(Model::HindmarshRose(HindmarshRose {
                r: params[0],
                current: params[1],
            }))
        }
        _ => Err(format!("Unknown model '{name}'.")),
    }
}

impl WasmSystem {
    pub(crate) fn from_model(model: Model) -> Self {
        let dim = model.dimension();
        WasmSystem {
            model,
            state: vec![0.0; dim],
            t: 0.0,
            solver: RK4::new(dim),
        }
    }

    pub(crate) fn trajectory(
        &self,
        samples: usize,
        dt: f64,
        transient: usize,
    ) -> Result<Trajectory, String> {
        let settings =
            IntegrationSettings::new(self.t, dt, samples).map_err(|err| err.to_string())?;
        let trajectory =
            integrate(&self.model, &self.state, &settings).map_err(|err| format!("{err:#}"))?;
        Ok(trajectory.discard_transient(transient))
    }

    fn check_state(&self, state: &[f64]) -> Result<(), String> {
        let dim = self.model.dimension();
        if state.len() != dim {
            return Err(format!(
                "State dimension mismatch. Expected {dim}, got {}.",
                state.len()
            ));
        }
        Ok(())
    }
}

#[wasm_bindgen]
impl WasmSystem {
    #[wasm_bindgen(constructor)]
    pub fn new(model: &str, params: Vec<f64>) -> Result<WasmSystem, JsValue> {
        #[cfg(target_arch = "wasm32")]
        console_error_panic_hook::set_once();

        let model = build_model(model, &params).map_err(|e| JsValue::from_str(&e))?;
        Ok(WasmSystem::from_model(model))
    }

    pub fn dimension(&self) -> usize {
        self.model.dimension()
    }

    pub fn set_state(&mut self, state: &[f64]) -> Result<(), JsValue> {
        self.check_state(state).map_err(|e| JsValue::from_str(&e))?;
        self.state = state.to_vec();
        Ok(())
    }

    pub fn get_state(&self) -> Vec<f64> {
        self.state.clone()
    }

    pub fn set_t(&mut self, t: f64) {
        self.t = t;
    }

    pub fn get_t(&self) -> f64 {
        self.t
    }

    pub fn step(&mut self, dt: f64) {
        self.solver.step(&self.model, &mut self.t, &mut self.state, dt);
    }

    /// Integrates `samples` points from the current state and time, drops the
    /// first `transient` of them, and returns the rest row-major.
    /// The wrapper's own state and time are left untouched.
    pub fn integrate(&self, samples: u32, dt: f64, transient: u32) -> Result<Float64Array, JsValue> {
        let trajectory = self
            .trajectory(samples as usize, dt, transient as usize)
            .map_err(|e| JsValue::from_str(&e))?;
        Ok(Float64Array::from(trajectory.states()))
    }

    /// Same as [`WasmSystem::integrate`] but returns `{ dimension, times, states }`.
    pub fn integrate_trajectory(
        &self,
        samples: u32,
        dt: f64,
        transient: u32,
    ) -> Result<JsValue, JsValue> {
        let trajectory = self
            .trajectory(samples as usize, dt, transient as usize)
            .map_err(|e| JsValue::from_str(&e))?;
        serde_wasm_bindgen::to_value(&trajectory)
            .map_err(|err| JsValue::from_str(&format!("Failed to serialize trajectory: {err}")))
    }
}
