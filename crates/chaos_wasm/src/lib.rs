mod fractal;
mod system;

pub use fractal::{
    cantor_segments, compute_escape_grid, compute_julia, compute_named_julia,
    julia_animation_path, koch_snowflake_path, pythagoras_tree_segments, sierpinski_points,
};
pub use system::WasmSystem;
