// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Lorenz system core: vector field, adaptive integration and trajectory
//! ensembles.
//!
//! The only entry point most callers need is [`generate_trajectory`], which
//! integrates the Lorenz equations from one initial state and returns the
//! solution sampled on a uniform time grid.

pub mod error;
pub mod params;
pub mod vector_field;
pub mod dopri;
pub mod trajectory;
pub mod ensemble;
pub mod divergence;

pub use dopri::{SolveStats, SolverOptions};
pub use divergence::{analyze_divergence, DivergenceReport};
pub use ensemble::{Axis, Ensemble, EnsembleBuilder, InitialConditions};
pub use error::{FieldError, Result};
pub use params::{State, SystemParameters};
pub use trajectory::{generate_trajectory, progress_index, TimeGrid, Trajectory, TrajectoryGenerator};
pub use vector_field::lorenz;
