//! Approximation state for one run: the target image, the working
//! canvas, and running error bookkeeping.
//!
//! The score is the root-mean-square error over all RGB channels,
//! normalized to `0..=1` (lower is better). A running sum of squared
//! channel differences makes candidate scoring a delta computation over
//! only the pixels a shape covers, instead of a full-image pass.

use image::{Rgba, RgbaImage};

use crate::shapes::Scanline;

pub struct Model {
    target: RgbaImage,
    current: RgbaImage,
    /// Sum of squared channel differences between target and current.
    sq_error: f64,
    score: f64,
}

impl Model {
    /// Start from a solid background fill.
    pub fn new(target: RgbaImage, background: Rgba<u8>) -> Self {
        let (w, h) = target.dimensions();
        let current = RgbaImage::from_pixel(w, h, background);
        let sq_error = full_sq_error(&target, &current);
        let score = normalize(sq_error, w, h);
        Self {
            target,
            current,
            sq_error,
            score,
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn current(&self) -> &RgbaImage {
        &self.current
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.target.dimensions()
    }

    /// Best constant color for drawing `lines` at `alpha`, solved per
    /// channel as the mean of `(target - (1-a)·current) / a` over the
    /// covered pixels.
    pub fn optimal_color(&self, lines: &[Scanline], alpha: u8) -> Rgba<u8> {
        let a = f64::from(alpha) / 255.0;
        let mut sums = [0f64; 3];
        let mut n = 0u64;
        for line in lines {
            for x in line.x1..=line.x2 {
                let t = self.target.get_pixel(x, line.y);
                let c = self.current.get_pixel(x, line.y);
                for ch in 0..3 {
                    sums[ch] += (f64::from(t[ch]) - f64::from(c[ch]) * (1.0 - a)) / a;
                }
                n += 1;
            }
        }
        if n == 0 {
            return Rgba([0, 0, 0, alpha]);
        }
        let channel = |s: f64| (s / n as f64).round().clamp(0.0, 255.0) as u8;
        Rgba([channel(sums[0]), channel(sums[1]), channel(sums[2]), alpha])
    }

    /// Score the model as if `lines` were drawn in `color`, without
    /// committing anything.
    pub fn trial_score(&self, lines: &[Scanline], color: Rgba<u8>) -> f64 {
        let (w, h) = self.target.dimensions();
        normalize(self.sq_error + self.sq_error_delta(lines, color), w, h)
    }

    /// Draw `lines` in `color` onto the working canvas and fold the
    /// error delta into the running total. Returns the new score.
    pub fn commit(&mut self, lines: &[Scanline], color: Rgba<u8>) -> f64 {
        let delta = self.sq_error_delta(lines, color);
        let a = f64::from(color[3]) / 255.0;
        for line in lines {
            for x in line.x1..=line.x2 {
                let px = self.current.get_pixel_mut(x, line.y);
                for ch in 0..3 {
                    px[ch] =
                        (f64::from(px[ch]) * (1.0 - a) + f64::from(color[ch]) * a).round() as u8;
                }
            }
        }
        self.sq_error += delta;
        let (w, h) = self.target.dimensions();
        self.score = normalize(self.sq_error, w, h);
        self.score
    }

    /// Change in the squared-error sum if `lines` were drawn in `color`.
    /// Uses the same rounding as `commit` so the running total tracks
    /// the canvas exactly.
    fn sq_error_delta(&self, lines: &[Scanline], color: Rgba<u8>) -> f64 {
        let a = f64::from(color[3]) / 255.0;
        let mut delta = 0.0;
        for line in lines {
            for x in line.x1..=line.x2 {
                let t = self.target.get_pixel(x, line.y);
                let c = self.current.get_pixel(x, line.y);
                for ch in 0..3 {
                    let before = f64::from(t[ch]) - f64::from(c[ch]);
                    let blended =
                        (f64::from(c[ch]) * (1.0 - a) + f64::from(color[ch]) * a).round();
                    let after = f64::from(t[ch]) - blended;
                    delta += after * after - before * before;
                }
            }
        }
        delta
    }
}

fn full_sq_error(target: &RgbaImage, current: &RgbaImage) -> f64 {
    let mut sum = 0.0;
    for (t, c) in target.pixels().zip(current.pixels()) {
        for ch in 0..3 {
            let d = f64::from(t[ch]) - f64::from(c[ch]);
            sum += d * d;
        }
    }
    sum
}

fn normalize(sq_error: f64, w: u32, h: u32) -> f64 {
    let samples = f64::from(w) * f64::from(h) * 3.0;
    (sq_error.max(0.0) / samples).sqrt() / 255.0
}
