// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! TOML run configuration. Every field is optional; command-line flags
//! override whatever the file sets.
//!
//! ```toml
//! [parameters]
//! rho = 28.0
//!
//! [ensemble]
//! curves = 8
//! duration = 20.0
//!
//! [ensemble.initial]
//! rule = "perturbed"
//! base = { x = 1.0, y = 1.0, z = 1.0 }
//! axis = "x"
//! epsilon = 1e-5
//!
//! [render]
//! mode = "live"
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use lorenz_field::{InitialConditions, SolverOptions, SystemParameters};
use lorenz_viz::{AnimationTiming, RenderConfig};

/// Ensemble shape. Unset values fall back to per-command defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleSettings {
    pub curves: Option<usize>,
    pub duration: Option<f64>,
    pub dt: Option<f64>,
    pub initial: InitialConditions,
    /// Worker threads; 0 uses every available core
    pub parallel: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LorenzConfig {
    pub parameters: SystemParameters,
    pub solver: SolverOptions,
    pub ensemble: EnsembleSettings,
    pub render: RenderConfig,
    pub animation: AnimationTiming,
}

impl LorenzConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Load `path` when given, otherwise all defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
