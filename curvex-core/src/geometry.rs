//! Parametric curves shared by the drivers and the trial-parameter contract.

use crate::trial::{AdjustParams, TrialSpec};
use std::f32::consts::{FRAC_1_SQRT_2, TAU};

pub type Point3 = [f32; 3];

/// Angle of the first sample on the presented curves, in degrees.
pub const START_ANGLE_DEG: f32 = 20.0;

/// Samples the `n`-lobed curve of a trial at `segments + 1` points, closing the loop.
pub fn trefoil_points(spec: &TrialSpec) -> Vec<Point3> {
    let segments = spec.segments.max(1);
    let step = 360.0 / segments as f32;
    let k = 1.0 - spec.n as f32;
    (0..=segments)
        .map(|i| {
            let t = (START_ANGLE_DEG + i as f32 * step).to_radians();
            [
                spec.r1 * t.cos() + spec.r2 * (k * t).cos(),
                spec.r1 * t.sin() + spec.r2 * (k * t).sin(),
                0.0,
            ]
        })
        .collect()
}

/// Samples the adjustable preview curve. `z` carries the participant's adjustment.
pub fn preview_points(r1: f32, r2: f32, params: AdjustParams, resolution: usize) -> Vec<Point3> {
    let resolution = resolution.max(1);
    (0..=resolution)
        .map(|i| {
            let phi = i as f32 * TAU / resolution as f32;
            [
                r1 * phi.cos() + r2 * (2.0 * phi).cos(),
                r1 * phi.sin() - r2 * (2.0 * phi).sin(),
                params.multiplier * FRAC_1_SQRT_2 * (params.a * phi.cos() - params.b * phi.sin()),
            ]
        })
        .collect()
}

/// Unit tangent at `index`, estimated from its neighbours.
pub fn tangent(points: &[Point3], index: usize) -> Point3 {
    if points.len() < 2 {
        return [1.0, 0.0, 0.0];
    }
    let i = index.min(points.len() - 1);
    let prev = points[i.saturating_sub(1)];
    let next = points[(i + 1).min(points.len() - 1)];
    let d = [next[0] - prev[0], next[1] - prev[1], next[2] - prev[2]];
    let len = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
    if len <= f32::EPSILON {
        [1.0, 0.0, 0.0]
    } else {
        [d[0] / len, d[1] / len, d[2] / len]
    }
}

/// Rotates a point about the z axis.
pub fn rotate_z(p: Point3, degrees: f32) -> Point3 {
    let (s, c) = degrees.to_radians().sin_cos();
    [p[0] * c - p[1] * s, p[0] * s + p[1] * c, p[2]]
}
