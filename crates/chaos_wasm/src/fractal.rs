//! Escape-time grids and geometric fractals for the plotting front end.

use chaos_core::escape::{color_range, evaluate_grid, EscapeGrid, FractalConfig, SeedRule};
use chaos_core::geometry::{
    cantor_set, koch_snowflake, pythagoras_tree, sierpinski_triangle, turtle_path, Point2, Segment,
    TreeSettings,
};
use chaos_core::presets::{famous_julia, JULIA_ANIMATION_PATH};
use js_sys::Float64Array;
use num_complex::Complex;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EscapeGridPayload {
    width: usize,
    height: usize,
    max_iter: usize,
    iterations: Vec<f64>,
    /// Smooth counts; interior points are NaN.
    smooth: Vec<f64>,
    /// Log-scaled smooth counts; interior points are NaN.
    scaled: Vec<f64>,
    color_min: f64,
    color_max: f64,
}

impl EscapeGridPayload {
    pub(crate) fn from_grid(grid: &EscapeGrid, log_scale_factor: f64) -> Self {
        let masked = |values: Vec<Option<f64>>| -> Vec<f64> {
            values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect()
        };
        let (color_min, color_max) = color_range(log_scale_factor);
        EscapeGridPayload {
            width: grid.width,
            height: grid.height,
            max_iter: grid.max_iter,
            iterations: grid.records.iter().map(|r| r.iterations as f64).collect(),
            smooth: masked(grid.smooth_values()),
            scaled: masked(grid.log_scaled(log_scale_factor)),
            color_min,
            color_max,
        }
    }
}

pub(crate) fn escape_payload(
    config: &FractalConfig,
    rule: &SeedRule,
) -> Result<EscapeGridPayload, String> {
    let grid = evaluate_grid(config, rule).map_err(|err| err.to_string())?;
    Ok(EscapeGridPayload::from_grid(&grid, config.log_scale_factor))
}

fn to_js(payload: &EscapeGridPayload) -> Result<JsValue, JsValue> {
    to_value(payload)
        .map_err(|err| JsValue::from_str(&format!("Failed to serialize escape grid: {err}")))
}

/// Evaluates a full grid. `config` deserializes into a `FractalConfig` and
/// `rule` into a `SeedRule` (`{ kind: "mandelbrot" }` or
/// `{ kind: "julia", c: [re, im] }`).
#[wasm_bindgen]
pub fn compute_escape_grid(config: JsValue, rule: JsValue) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let config: FractalConfig =
        from_value(config).map_err(|err| JsValue::from_str(&format!("Invalid config: {err}")))?;
    let rule: SeedRule =
        from_value(rule).map_err(|err| JsValue::from_str(&format!("Invalid seed rule: {err}")))?;
    let payload = escape_payload(&config, &rule).map_err(|e| JsValue::from_str(&e))?;
    to_js(&payload)
}

#[wasm_bindgen]
pub fn compute_julia(
    c_re: f64,
    c_im: f64,
    width: usize,
    height: usize,
    max_iter: usize,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let config = FractalConfig {
        width,
        height,
        max_iter,
        ..FractalConfig::default()
    };
    let rule = SeedRule::Julia {
        c: Complex::new(c_re, c_im),
    };
    let payload = escape_payload(&config, &rule).map_err(|e| JsValue::from_str(&e))?;
    to_js(&payload)
}

#[wasm_bindgen]
pub fn compute_named_julia(name: &str, width: usize, height: usize) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let rule = famous_julia(name)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown Julia preset '{name}'.")))?;
    let config = FractalConfig {
        width,
        height,
        ..FractalConfig::default()
    };
    let payload = escape_payload(&config, &rule).map_err(|e| JsValue::from_str(&e))?;
    to_js(&payload)
}

/// `[re0, im0, re1, im1, ...]` for the animation stops.
#[wasm_bindgen]
pub fn julia_animation_path() -> Float64Array {
    let flat: Vec<f64> = JULIA_ANIMATION_PATH
        .iter()
        .flat_map(|c| [c.re, c.im])
        .collect();
    Float64Array::from(flat.as_slice())
}

pub(crate) fn flatten_points(points: &[Point2]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

/// `[x0, y0, x1, y1, depth]` per segment.
pub(crate) fn flatten_segments(segments: &[Segment]) -> Vec<f64> {
    segments
        .iter()
        .flat_map(|s| [s.start.x, s.start.y, s.end.x, s.end.y, s.depth as f64])
        .collect()
}

#[wasm_bindgen]
pub fn cantor_segments(depth: usize) -> Float64Array {
    Float64Array::from(flatten_segments(&cantor_set(depth)).as_slice())
}

#[wasm_bindgen]
pub fn pythagoras_tree_segments(max_depth: usize) -> Result<Float64Array, JsValue> {
    let settings = TreeSettings {
        max_depth,
        ..TreeSettings::default()
    };
    let segments = pythagoras_tree(&settings).map_err(|err| JsValue::from_str(&err.to_string()))?;
    Ok(Float64Array::from(flatten_segments(&segments).as_slice()))
}

#[wasm_bindgen]
pub fn koch_snowflake_path(iterations: usize) -> Float64Array {
    let points = turtle_path(&koch_snowflake(iterations), 60.0, 1.0);
    Float64Array::from(flatten_points(&points).as_slice())
}

#[wasm_bindgen]
pub fn sierpinski_points(iterations: usize, seed: u32) -> Float64Array {
    let points = sierpinski_triangle(iterations, u64::from(seed));
    Float64Array::from(flatten_points(&points).as_slice())
}
