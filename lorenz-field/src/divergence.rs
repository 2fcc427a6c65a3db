// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Separation between trajectories started from nearby states.
//!
//! Chaotic divergence is the behavior being visualized, so nothing here is
//! an error condition; the report just measures how fast it happens.

use serde::Serialize;

use crate::trajectory::Trajectory;

/// Euclidean distance between same-index samples. Stops at the shorter
/// trajectory.
pub fn separation(a: &Trajectory, b: &Trajectory) -> Vec<f64> {
    a.samples()
        .iter()
        .zip(b.samples())
        .map(|(sa, sb)| sa.distance(sb))
        .collect()
}

/// Index of the first sample whose separation exceeds `threshold`.
pub fn first_exceedance(a: &Trajectory, b: &Trajectory, threshold: f64) -> Option<usize> {
    a.samples()
        .iter()
        .zip(b.samples())
        .position(|(sa, sb)| sa.distance(sb) > threshold)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DivergenceReport {
    pub initial_separation: f64,
    pub max_separation: f64,
    pub threshold: f64,
    /// Time of the first sample beyond `threshold`
    pub first_exceedance_time: Option<f64>,
    /// Least-squares slope of ln(separation) against time up to the first
    /// exceedance: a finite-time estimate of the largest Lyapunov exponent.
    pub growth_rate: Option<f64>,
}

/// Summarize the divergence of `b` from `a`; times use `a`'s dt.
pub fn analyze_divergence(a: &Trajectory, b: &Trajectory, threshold: f64) -> DivergenceReport {
    let seps = separation(a, b);
    let first = seps.iter().position(|&d| d > threshold);
    let max_separation = seps.iter().copied().fold(0.0, f64::max);

    let fit_end = first.unwrap_or(seps.len());
    let points: Vec<(f64, f64)> = seps[..fit_end]
        .iter()
        .enumerate()
        .filter(|(_, &d)| d > 0.0 && d.is_finite())
        .map(|(n, &d)| (a.time_at(n), d.ln()))
        .collect();

    DivergenceReport {
        initial_separation: seps.first().copied().unwrap_or(0.0),
        max_separation,
        threshold,
        first_exceedance_time: first.map(|n| a.time_at(n)),
        growth_rate: least_squares_slope(&points),
    }
}

fn least_squares_slope(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_t = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_v = points.iter().map(|p| p.1).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var = 0.0;
    for &(t, v) in points {
        cov += (t - mean_t) * (v - mean_v);
        var += (t - mean_t) * (t - mean_t);
    }
    if var <= 0.0 {
        None
    } else {
        Some(cov / var)
    }
}
