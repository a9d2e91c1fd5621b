//! Shape geometry: random generation, mutation, and scanline
//! rasterization for the optimizer's candidates.

use rand::Rng;
use shapeflow_core::params::ShapeKind;

/// One horizontal run of covered pixels (inclusive x range).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scanline {
    pub y: u32,
    pub x1: u32,
    pub x2: u32,
}

/// Candidate geometry under optimization. Circles are ellipses whose
/// radii are kept equal through mutation.
#[derive(Debug, Clone)]
pub enum Shape {
    Triangle {
        x: [i32; 3],
        y: [i32; 3],
    },
    Rectangle {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
    },
    Ellipse {
        cx: i32,
        cy: i32,
        rx: i32,
        ry: i32,
        circle: bool,
    },
}

/// Spread of the second and third triangle vertices around the first.
const SPAWN_SPREAD: i32 = 31;
/// Largest initial rectangle side / ellipse radius.
const SPAWN_EXTENT: i32 = 32;
/// How far a single mutation may move a coordinate.
const MUTATE_RANGE: i32 = 16;

impl Shape {
    /// Sample a random shape of the given kind within a w×h canvas.
    pub fn random<R: Rng>(kind: ShapeKind, w: u32, h: u32, rng: &mut R) -> Self {
        let (wi, hi) = (w as i32, h as i32);
        match concrete(kind, rng) {
            ShapeKind::Triangle => {
                let x0 = rng.random_range(0..wi);
                let y0 = rng.random_range(0..hi);
                let spread = |c: i32, max: i32, rng: &mut R| {
                    (c + rng.random_range(-SPAWN_SPREAD..=SPAWN_SPREAD)).clamp(0, max - 1)
                };
                Shape::Triangle {
                    x: [x0, spread(x0, wi, rng), spread(x0, wi, rng)],
                    y: [y0, spread(y0, hi, rng), spread(y0, hi, rng)],
                }
            }
            ShapeKind::Rectangle => {
                let x1 = rng.random_range(0..wi);
                let y1 = rng.random_range(0..hi);
                let x2 = (x1 + rng.random_range(1..=SPAWN_EXTENT)).clamp(0, wi - 1);
                let y2 = (y1 + rng.random_range(1..=SPAWN_EXTENT)).clamp(0, hi - 1);
                Shape::Rectangle { x1, y1, x2, y2 }
            }
            ShapeKind::Ellipse => Shape::Ellipse {
                cx: rng.random_range(0..wi),
                cy: rng.random_range(0..hi),
                rx: rng.random_range(1..=SPAWN_EXTENT),
                ry: rng.random_range(1..=SPAWN_EXTENT),
                circle: false,
            },
            ShapeKind::Circle => {
                let r = rng.random_range(1..=SPAWN_EXTENT);
                Shape::Ellipse {
                    cx: rng.random_range(0..wi),
                    cy: rng.random_range(0..hi),
                    rx: r,
                    ry: r,
                    circle: true,
                }
            }
            ShapeKind::Combo => unreachable!("combo is resolved by concrete()"),
        }
    }

    /// Jitter one degree of freedom, keeping the result on-canvas.
    pub fn mutate<R: Rng>(&self, w: u32, h: u32, rng: &mut R) -> Self {
        let (wi, hi) = (w as i32, h as i32);
        let jitter = |rng: &mut R| rng.random_range(-MUTATE_RANGE..=MUTATE_RANGE);
        let mut next = self.clone();
        match &mut next {
            Shape::Triangle { x, y } => {
                let i = rng.random_range(0..3);
                x[i] = (x[i] + jitter(rng)).clamp(0, wi - 1);
                y[i] = (y[i] + jitter(rng)).clamp(0, hi - 1);
            }
            Shape::Rectangle { x1, y1, x2, y2 } => {
                if rng.random_range(0..2) == 0 {
                    *x1 = (*x1 + jitter(rng)).clamp(0, wi - 1);
                    *y1 = (*y1 + jitter(rng)).clamp(0, hi - 1);
                } else {
                    *x2 = (*x2 + jitter(rng)).clamp(0, wi - 1);
                    *y2 = (*y2 + jitter(rng)).clamp(0, hi - 1);
                }
            }
            Shape::Ellipse {
                cx,
                cy,
                rx,
                ry,
                circle,
            } => match rng.random_range(0..3) {
                0 => {
                    *cx = (*cx + jitter(rng)).clamp(0, wi - 1);
                    *cy = (*cy + jitter(rng)).clamp(0, hi - 1);
                }
                1 => {
                    *rx = (*rx + jitter(rng)).clamp(1, wi);
                    if *circle {
                        *ry = *rx;
                    }
                }
                _ => {
                    *ry = (*ry + jitter(rng)).clamp(1, hi);
                    if *circle {
                        *rx = *ry;
                    }
                }
            },
        }
        next
    }

    /// Covered scanlines, clipped to the canvas. May be empty for
    /// degenerate geometry.
    pub fn rasterize(&self, w: u32, h: u32) -> Vec<Scanline> {
        match *self {
            Shape::Triangle { x, y } => triangle_scanlines(x, y, w, h),
            Shape::Rectangle { x1, y1, x2, y2 } => rect_scanlines(x1, y1, x2, y2, w, h),
            Shape::Ellipse { cx, cy, rx, ry, .. } => ellipse_scanlines(cx, cy, rx, ry, w, h),
        }
    }
}

/// For combo runs a concrete kind is drawn per step.
fn concrete<R: Rng>(kind: ShapeKind, rng: &mut R) -> ShapeKind {
    if kind != ShapeKind::Combo {
        return kind;
    }
    match rng.random_range(0..4) {
        0 => ShapeKind::Triangle,
        1 => ShapeKind::Rectangle,
        2 => ShapeKind::Ellipse,
        _ => ShapeKind::Circle,
    }
}

fn rect_scanlines(x1: i32, y1: i32, x2: i32, y2: i32, w: u32, h: u32) -> Vec<Scanline> {
    let (lo_x, hi_x) = (x1.min(x2), x1.max(x2));
    let (lo_y, hi_y) = (y1.min(y2), y1.max(y2));
    let lo_x = lo_x.max(0) as u32;
    let hi_x = hi_x.min(w as i32 - 1);
    let lo_y = lo_y.max(0);
    let hi_y = hi_y.min(h as i32 - 1);
    if hi_x < lo_x as i32 || hi_y < lo_y {
        return Vec::new();
    }
    (lo_y..=hi_y)
        .map(|y| Scanline {
            y: y as u32,
            x1: lo_x,
            x2: hi_x as u32,
        })
        .collect()
}

fn ellipse_scanlines(cx: i32, cy: i32, rx: i32, ry: i32, w: u32, h: u32) -> Vec<Scanline> {
    let mut lines = Vec::new();
    for dy in -ry..=ry {
        let y = cy + dy;
        if y < 0 || y >= h as i32 {
            continue;
        }
        let frac = 1.0 - (dy as f64 / ry as f64).powi(2);
        let half = (rx as f64 * frac.max(0.0).sqrt()) as i32;
        let x1 = (cx - half).max(0);
        let x2 = (cx + half).min(w as i32 - 1);
        if x2 < x1 {
            continue;
        }
        lines.push(Scanline {
            y: y as u32,
            x1: x1 as u32,
            x2: x2 as u32,
        });
    }
    lines
}

fn triangle_scanlines(x: [i32; 3], y: [i32; 3], w: u32, h: u32) -> Vec<Scanline> {
    let ymin = y.iter().copied().min().unwrap_or(0).max(0);
    let ymax = y.iter().copied().max().unwrap_or(0).min(h as i32 - 1);
    let mut lines = Vec::new();
    for yy in ymin..=ymax {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for e in 0..3 {
            let (x0, y0) = (x[e] as f64, y[e] as f64);
            let (x1, y1) = (x[(e + 1) % 3] as f64, y[(e + 1) % 3] as f64);
            if y0 == y1 {
                if yy as f64 == y0 {
                    lo = lo.min(x0.min(x1));
                    hi = hi.max(x0.max(x1));
                }
                continue;
            }
            let t = (yy as f64 - y0) / (y1 - y0);
            if (0.0..=1.0).contains(&t) {
                let xi = x0 + t * (x1 - x0);
                lo = lo.min(xi);
                hi = hi.max(xi);
            }
        }
        if lo > hi {
            continue;
        }
        let x1 = (lo.round() as i32).max(0);
        let x2 = (hi.round() as i32).min(w as i32 - 1);
        if x2 < x1 {
            continue;
        }
        lines.push(Scanline {
            y: yy as u32,
            x1: x1 as u32,
            x2: x2 as u32,
        });
    }
    lines
}
