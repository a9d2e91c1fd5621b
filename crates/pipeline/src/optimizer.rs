//! The shape-fitting capability consumed by the run engine.
//!
//! [`ShapeOptimizer`] is the seam: one call proposes and commits the
//! single best-scoring shape it can find. [`HillClimbOptimizer`] is the
//! default implementation: random restarts refined by bounded
//! hill-climbing mutation, each candidate scored against the model with
//! its optimal color.

use image::Rgba;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use shapeflow_core::params::ShapeKind;

use crate::model::Model;
use crate::shapes::{Scanline, Shape};

/// Substituted when the caller passes alpha 0 ("pick for me").
const DEFAULT_ALPHA: u8 = 128;

/// Fits one shape per call, committing it to the model.
pub trait ShapeOptimizer: Send + Sync + 'static {
    /// Propose and commit the best shape found; returns the model's
    /// score after the call. Never fails: a step that finds no improving
    /// shape leaves the canvas untouched and returns the unchanged
    /// score, so the score never increases across steps.
    fn step(&self, model: &mut Model, kind: ShapeKind, alpha: u8) -> f64;
}

struct Candidate {
    score: f64,
    lines: Vec<Scanline>,
    color: Rgba<u8>,
}

/// Random-restart hill climber over shape geometry.
pub struct HillClimbOptimizer {
    /// Independent random starting shapes per step.
    restarts: usize,
    /// Consecutive non-improving mutations tolerated before a climb
    /// gives up.
    max_stale: usize,
}

impl HillClimbOptimizer {
    pub fn new() -> Self {
        Self {
            restarts: 16,
            max_stale: 40,
        }
    }
}

impl Default for HillClimbOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeOptimizer for HillClimbOptimizer {
    fn step(&self, model: &mut Model, kind: ShapeKind, alpha: u8) -> f64 {
        let alpha = if alpha == 0 { DEFAULT_ALPHA } else { alpha };
        let (w, h) = model.dimensions();
        let mut rng = SmallRng::from_os_rng();

        let mut best: Option<Candidate> = None;
        for _ in 0..self.restarts {
            let mut shape = Shape::random(kind, w, h, &mut rng);
            let mut climbed = evaluate(model, &shape, alpha, w, h);

            let mut stale = 0;
            while stale < self.max_stale {
                let mutated = shape.mutate(w, h, &mut rng);
                let candidate = evaluate(model, &mutated, alpha, w, h);
                if candidate.score < climbed.score {
                    shape = mutated;
                    climbed = candidate;
                    stale = 0;
                } else {
                    stale += 1;
                }
            }

            if best.as_ref().is_none_or(|b| climbed.score < b.score) {
                best = Some(climbed);
            }
        }

        match best {
            Some(found) if found.score < model.score() => model.commit(&found.lines, found.color),
            _ => model.score(),
        }
    }
}

fn evaluate(model: &Model, shape: &Shape, alpha: u8, w: u32, h: u32) -> Candidate {
    let lines = shape.rasterize(w, h);
    if lines.is_empty() {
        return Candidate {
            score: f64::INFINITY,
            lines,
            color: Rgba([0, 0, 0, alpha]),
        };
    }
    let color = model.optimal_color(&lines, alpha);
    Candidate {
        score: model.trial_score(&lines, color),
        lines,
        color,
    }
}
