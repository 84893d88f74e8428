//! 2D Catmull-Rom spline with arc-length parameterisation.
//!
//! `point(t)` moves through the control points at a rate that depends on
//! their spacing; `point_at(u)` moves at constant speed along the curve, which
//! is what a vehicle following a path wants.

use glam::Vec2;

/// Number of segments used to approximate the arc length.
const ARC_LENGTH_DIVISIONS: usize = 200;

#[derive(Debug, Clone)]
pub struct SplineCurve {
    points: Vec<Vec2>,
    /// Cumulative arc length at `t = i / ARC_LENGTH_DIVISIONS`.
    lengths: Vec<f32>,
}

impl SplineCurve {
    /// Builds a curve through `points`. Returns `None` for fewer than two points.
    pub fn new(points: Vec<Vec2>) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let mut curve = Self {
            points,
            lengths: Vec::with_capacity(ARC_LENGTH_DIVISIONS + 1),
        };
        curve.lengths = curve.compute_lengths();
        Some(curve)
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn length(&self) -> f32 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Point at curve parameter `t` in `[0, 1]`.
    pub fn point(&self, t: f32) -> Vec2 {
        let last = self.points.len() - 1;
        let p = last as f32 * t.clamp(0.0, 1.0);
        let index = (p.floor() as usize).min(last);
        let weight = p - index as f32;

        let p0 = self.points[index.saturating_sub(1)];
        let p1 = self.points[index];
        let p2 = self.points[(index + 1).min(last)];
        let p3 = self.points[(index + 2).min(last)];

        Vec2::new(
            catmull_rom(weight, p0.x, p1.x, p2.x, p3.x),
            catmull_rom(weight, p0.y, p1.y, p2.y, p3.y),
        )
    }

    /// Point at fraction `u` in `[0, 1]` of the total arc length.
    pub fn point_at(&self, u: f32) -> Vec2 {
        self.point(self.u_to_t(u))
    }

    /// Evenly spaced points along the curve parameter, including both ends.
    pub fn sample(&self, divisions: usize) -> Vec<Vec2> {
        let divisions = divisions.max(1);
        (0..=divisions)
            .map(|d| self.point(d as f32 / divisions as f32))
            .collect()
    }

    fn compute_lengths(&self) -> Vec<f32> {
        let mut lengths = Vec::with_capacity(ARC_LENGTH_DIVISIONS + 1);
        let mut total = 0.0;
        let mut previous = self.point(0.0);
        lengths.push(0.0);
        for d in 1..=ARC_LENGTH_DIVISIONS {
            let current = self.point(d as f32 / ARC_LENGTH_DIVISIONS as f32);
            total += current.distance(previous);
            lengths.push(total);
            previous = current;
        }
        lengths
    }

    /// Maps an arc-length fraction to the curve parameter.
    fn u_to_t(&self, u: f32) -> f32 {
        let total = self.length();
        if total <= 0.0 {
            return u.clamp(0.0, 1.0);
        }
        let target = u.clamp(0.0, 1.0) * total;

        // First sample whose cumulative length reaches the target
        let upper = self
            .lengths
            .partition_point(|&length| length < target)
            .min(self.lengths.len() - 1);
        if upper == 0 || self.lengths[upper] == target {
            return upper as f32 / ARC_LENGTH_DIVISIONS as f32;
        }

        let lower = upper - 1;
        let before = self.lengths[lower];
        let segment = self.lengths[upper] - before;
        let fraction = if segment > 0.0 {
            (target - before) / segment
        } else {
            0.0
        };
        (lower as f32 + fraction) / ARC_LENGTH_DIVISIONS as f32
    }
}

fn catmull_rom(t: f32, p0: f32, p1: f32, p2: f32, p3: f32) -> f32 {
    let v0 = (p2 - p0) * 0.5;
    let v1 = (p3 - p1) * 0.5;
    let t2 = t * t;
    let t3 = t * t2;
    (2.0 * p1 - 2.0 * p2 + v0 + v1) * t3 + (-3.0 * p1 + 3.0 * p2 - 2.0 * v0 - v1) * t2 + v0 * t + p1
}
