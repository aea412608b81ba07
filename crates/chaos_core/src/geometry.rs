//! Line-segment and point-cloud fractals: Cantor set, Pythagoras tree, Koch
//! snowflake and the Sierpiński chaos game.
//!
//! Generators return plain geometry; drawing is left to the caller.

use crate::error::ConfigError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_6};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Point2) -> Point2 {
        Point2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point2,
    pub end: Point2,
    /// Generation that produced the segment, starting at 0.
    pub depth: usize,
}

impl Segment {
    pub fn length(&self) -> f64 {
        (self.end.x - self.start.x).hypot(self.end.y - self.start.y)
    }
}

/// Cantor set drawn level by level: level `n` sits at `y = -n` and keeps the
/// outer thirds of every interval of level `n - 1`, starting from `[0, 1]`.
pub fn cantor_set(depth: usize) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut intervals = vec![(0.0_f64, 1.0_f64)];
    for level in 0..depth {
        let y = -(level as f64);
        segments.extend(intervals.iter().map(|&(x, length)| Segment {
            start: Point2::new(x, y),
            end: Point2::new(x + length, y),
            depth: level,
        }));
        if level + 1 < depth {
            intervals = intervals
                .iter()
                .flat_map(|&(x, length)| {
                    let third = length / 3.0;
                    [(x, third), (x + 2.0 * third, third)]
                })
                .collect();
        }
    }
    segments
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeSettings {
    pub origin: Point2,
    pub length: f64,
    /// Heading of the trunk in radians.
    pub angle: f64,
    /// Turn applied to each child branch, in radians.
    pub spread: f64,
    /// Length ratio between a branch and its children.
    pub scale: f64,
    pub max_depth: usize,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            origin: Point2::new(0.0, -1.0),
            length: 1.0,
            angle: FRAC_PI_2,
            spread: FRAC_PI_6,
            scale: 0.7,
            max_depth: 15,
        }
    }
}

impl TreeSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.length > 0.0) || !self.length.is_finite() {
            return Err(ConfigError::InvalidGeometry("tree length must be positive"));
        }
        if !(self.scale > 0.0 && self.scale < 1.0) {
            return Err(ConfigError::InvalidGeometry("tree scale must lie in (0, 1)"));
        }
        if !self.angle.is_finite() || !self.spread.is_finite() {
            return Err(ConfigError::InvalidGeometry("tree angles must be finite"));
        }
        Ok(())
    }
}

struct Branch {
    start: Point2,
    length: f64,
    angle: f64,
    depth: usize,
}

/// Binary branching tree, depths `0..=max_depth`, built with an explicit
/// stack. Segments come out in depth-first order, left child first.
pub fn pythagoras_tree(settings: &TreeSettings) -> Result<Vec<Segment>, ConfigError> {
    settings.validate()?;
    let mut segments = Vec::new();
    let mut stack = vec![Branch {
        start: settings.origin,
        length: settings.length,
        angle: settings.angle,
        depth: 0,
    }];

    while let Some(branch) = stack.pop() {
        let end = Point2::new(
            branch.start.x + branch.length * branch.angle.cos(),
            branch.start.y + branch.length * branch.angle.sin(),
        );
        segments.push(Segment {
            start: branch.start,
            end,
            depth: branch.depth,
        });
        if branch.depth == settings.max_depth {
            continue;
        }
        let length = branch.length * settings.scale;
        // Right pushed first so the left child is popped first.
        for turn in [-settings.spread, settings.spread] {
            stack.push(Branch {
                start: end,
                length,
                angle: branch.angle + turn,
                depth: branch.depth + 1,
            });
        }
    }

    Ok(segments)
}

/// Deterministic, context-free L-system.
#[derive(Debug, Clone, Default)]
pub struct LSystem {
    axiom: String,
    rules: HashMap<char, String>,
}

impl LSystem {
    pub fn new(axiom: &str) -> Self {
        Self {
            axiom: axiom.to_string(),
            rules: HashMap::new(),
        }
    }

    pub fn with_rule(mut self, predecessor: char, successor: &str) -> Self {
        self.rules.insert(predecessor, successor.to_string());
        self
    }

    /// Rewrites every symbol in parallel `iterations` times. Symbols without a
    /// rule are copied through.
    pub fn expand(&self, iterations: usize) -> String {
        let mut current = self.axiom.clone();
        for _ in 0..iterations {
            let mut next = String::with_capacity(current.len() * 4);
            for symbol in current.chars() {
                match self.rules.get(&symbol) {
                    Some(successor) => next.push_str(successor),
                    None => next.push(symbol),
                }
            }
            current = next;
        }
        current
    }
}

/// Turtle commands for the Koch snowflake after `iterations` rewrites.
pub fn koch_snowflake(iterations: usize) -> String {
    LSystem::new("F++F++F")
        .with_rule('F', "F-F++F-F")
        .expand(iterations)
}

/// Walks `commands` with a turtle starting at the origin facing +x.
/// `F` moves forward by `step`, `+`/`-` turn by `angle_deg`; anything else
/// is ignored. Returns every visited point, origin first.
pub fn turtle_path(commands: &str, angle_deg: f64, step: f64) -> Vec<Point2> {
    let mut position = Point2::default();
    let mut heading = 0.0_f64;
    let mut points = vec![position];
    for command in commands.chars() {
        match command {
            'F' => {
                let radians = heading.to_radians();
                position = Point2::new(
                    position.x + step * radians.cos(),
                    position.y + step * radians.sin(),
                );
                points.push(position);
            }
            '+' => heading += angle_deg,
            '-' => heading -= angle_deg,
            _ => {}
        }
    }
    points
}

/// Chaos game: repeatedly jump halfway toward a uniformly chosen vertex.
/// Returns the `iterations` points after each jump (the start is excluded).
pub fn chaos_game<R: Rng + ?Sized>(
    vertices: &[Point2],
    start: Point2,
    iterations: usize,
    rng: &mut R,
) -> Result<Vec<Point2>, ConfigError> {
    if vertices.is_empty() {
        return Err(ConfigError::InvalidGeometry(
            "chaos game needs at least one vertex",
        ));
    }
    let mut point = start;
    let mut points = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let vertex = vertices[rng.gen_range(0..vertices.len())];
        point = point.midpoint(vertex);
        points.push(point);
    }
    Ok(points)
}

/// Sierpiński triangle on `(0,0), (1,0), (1/2, √3/2)` from `(1/4, 1/4)`,
/// reproducible for a given `seed`.
pub fn sierpinski_triangle(iterations: usize, seed: u64) -> Vec<Point2> {
    let mut rng = StdRng::seed_from_u64(seed);
    chaos_game(&sierpinski_vertices(), Point2::new(0.25, 0.25), iterations, &mut rng)
        .unwrap_or_default()
}

pub fn sierpinski_vertices() -> [Point2; 3] {
    [
        Point2::new(0.0, 0.0),
        Point2::new(1.0, 0.0),
        Point2::new(0.5, 3.0_f64.sqrt() / 2.0),
    ]
}
