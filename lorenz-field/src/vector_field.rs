// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! The Lorenz vector field:
//!
//!   dx/dt = σ(y − x)
//!   dy/dt = x(ρ − z) − y
//!   dz/dt = xy − βz
//!
//! Overflow and NaN propagate through ordinary floating-point arithmetic.

use nalgebra::Vector3;

use crate::params::{State, SystemParameters};

/// Instantaneous derivative of `state` under `params`.
pub fn lorenz(state: &State, params: &SystemParameters) -> State {
    State::from(lorenz_vec(&Vector3::from(*state), params))
}

/// Solver-facing form of [`lorenz`].
#[inline]
pub(crate) fn lorenz_vec(y: &Vector3<f64>, p: &SystemParameters) -> Vector3<f64> {
    Vector3::new(
        p.sigma * (y.y - y.x),
        y.x * (p.rho - y.z) - y.y,
        y.x * y.y - p.beta * y.z,
    )
}

/// Equilibria of the field.
///
/// The origin always; for ρ > 1 also C± = (±√(β(ρ−1)), ±√(β(ρ−1)), ρ−1).
pub fn fixed_points(params: &SystemParameters) -> Vec<State> {
    let origin = State::new(0.0, 0.0, 0.0);
    if params.rho <= 1.0 {
        return vec![origin];
    }
    let c = (params.beta * (params.rho - 1.0)).sqrt();
    vec![
        origin,
        State::new(c, c, params.rho - 1.0),
        State::new(-c, -c, params.rho - 1.0),
    ]
}

/// Divergence of the field, −(σ + 1 + β). Constant over phase space;
/// negative means volumes contract.
pub fn divergence(params: &SystemParameters) -> f64 {
    -(params.sigma + 1.0 + params.beta)
}
