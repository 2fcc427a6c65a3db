// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! System parameters and phase-space states.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{FieldError, Result};

/// Parameters (σ, ρ, β) of the Lorenz vector field.
///
/// - σ (sigma): Prandtl number
/// - ρ (rho): Rayleigh number
/// - β (beta): geometric aspect factor
///
/// The defaults σ=10, ρ=28, β=8/3 are the canonical chaotic regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemParameters {
    pub sigma: f64,
    pub rho: f64,
    pub beta: f64,
}

impl SystemParameters {
    pub const CANONICAL: Self = Self {
        sigma: 10.0,
        rho: 28.0,
        beta: 8.0 / 3.0,
    };

    pub fn new(sigma: f64, rho: f64, beta: f64) -> Self {
        Self { sigma, rho, beta }
    }

    pub fn is_finite(&self) -> bool {
        self.sigma.is_finite() && self.rho.is_finite() && self.beta.is_finite()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.is_finite() {
            return Err(FieldError::invalid(format!(
                "system parameters must be finite (sigma={}, rho={}, beta={})",
                self.sigma, self.rho, self.beta
            )));
        }
        Ok(())
    }
}

impl Default for SystemParameters {
    fn default() -> Self {
        Self::CANONICAL
    }
}

/// A point (x, y, z) in phase space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct State {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl State {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// State with all three coordinates equal to `v`.
    pub const fn splat(v: f64) -> Self {
        Self { x: v, y: v, z: v }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance between two states.
    pub fn distance(&self, other: &State) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<Vector3<f64>> for State {
    fn from(v: Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<State> for Vector3<f64> {
    fn from(s: State) -> Self {
        Vector3::new(s.x, s.y, s.z)
    }
}

impl From<[f64; 3]> for State {
    fn from(a: [f64; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }
}

impl From<State> for [f64; 3] {
    fn from(s: State) -> Self {
        s.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_defaults() {
        let p = SystemParameters::default();
        assert_eq!(p.sigma, 10.0);
        assert_eq!(p.rho, 28.0);
        assert!((p.beta - 8.0 / 3.0).abs() < 1e-15);
    }

    #[test]
    fn test_non_finite_parameters_rejected() {
        let p = SystemParameters::new(10.0, f64::NAN, 8.0 / 3.0);
        assert!(p.validate().unwrap_err().is_invalid_parameters());
        assert!(SystemParameters::CANONICAL.validate().is_ok());
    }

    #[test]
    fn test_state_distance_and_norm() {
        let a = State::new(1.0, 2.0, 2.0);
        assert!((a.norm() - 3.0).abs() < 1e-12);
        let b = State::new(1.0, 2.0, 5.0);
        assert!((a.distance(&b) - 3.0).abs() < 1e-12);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn test_vector_conversions() {
        let s = State::new(1.5, -2.0, 30.0);
        let v: Vector3<f64> = s.into();
        assert_eq!(State::from(v), s);
        let arr: [f64; 3] = s.into();
        assert_eq!(State::from(arr), s);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let p: SystemParameters = serde_json::from_str(r#"{"rho": 99.96}"#).unwrap();
        assert_eq!(p.sigma, 10.0);
        assert_eq!(p.rho, 99.96);
    }
}
