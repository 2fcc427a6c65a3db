// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Trajectory generation: adaptive integration resampled on a uniform grid.
//!
//! The solver picks its own steps; callers only see samples at
//! t_n = n·dt for every n with t_n < duration.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dopri::{DormandPrince, SolveStats, SolverOptions};
use crate::error::{FieldError, Result};
use crate::params::{State, SystemParameters};
use crate::vector_field::lorenz_vec;

/// Refuse grids that would not fit comfortably in memory.
const MAX_SAMPLES: usize = 50_000_000;

/// Sample index for progress `alpha` through `n` samples:
/// floor(clamp(α, 0, 1) · (n − 1)). `None` when there are no samples.
///
/// NaN progress is treated as 0.
pub fn progress_index(alpha: f64, n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    let a = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
    let idx = (a * (n - 1) as f64).floor() as usize;
    Some(idx.min(n - 1))
}

/// Uniform sample times 0, dt, 2·dt, … strictly below `duration`.
///
/// The sample count is ceil(duration / dt), nudged by one where rounding in
/// the quotient disagrees with the `n·dt < duration` test. `dt == duration`
/// gives the single sample t=0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGrid {
    duration: f64,
    dt: f64,
    len: usize,
}

impl TimeGrid {
    pub fn new(duration: f64, dt: f64) -> Result<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(FieldError::invalid(format!(
                "duration must be positive and finite, got {}",
                duration
            )));
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(FieldError::invalid(format!("dt must be positive and finite, got {}", dt)));
        }
        if dt > duration {
            return Err(FieldError::invalid(format!(
                "dt ({}) must not exceed duration ({})",
                dt, duration
            )));
        }

        let estimate = (duration / dt).ceil();
        if estimate > MAX_SAMPLES as f64 {
            return Err(FieldError::invalid(format!(
                "grid of {} samples exceeds the limit of {}",
                estimate, MAX_SAMPLES
            )));
        }

        let mut len = (estimate as usize).max(1);
        while len > 1 && (len - 1) as f64 * dt >= duration {
            len -= 1;
        }
        while (len as f64) * dt < duration {
            len += 1;
        }

        Ok(Self { duration, dt, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Time of sample `n`.
    pub fn time(&self, n: usize) -> f64 {
        n as f64 * self.dt
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len).map(move |n| self.time(n))
    }
}

/// Solution of the Lorenz system sampled on a [`TimeGrid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    initial: State,
    parameters: SystemParameters,
    duration: f64,
    dt: f64,
    samples: Vec<State>,
    #[serde(default)]
    stats: SolveStats,
}

impl Trajectory {
    pub fn samples(&self) -> &[State] {
        &self.samples
    }

    /// Mutable access to this trajectory's own sample storage.
    pub fn samples_mut(&mut self) -> &mut [State] {
        &mut self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, n: usize) -> Option<&State> {
        self.samples.get(n)
    }

    pub fn first(&self) -> Option<&State> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&State> {
        self.samples.last()
    }

    pub fn initial(&self) -> State {
        self.initial
    }

    pub fn parameters(&self) -> SystemParameters {
        self.parameters
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn stats(&self) -> SolveStats {
        self.stats
    }

    pub fn time_at(&self, n: usize) -> f64 {
        n as f64 * self.dt
    }

    /// Sample times t_n = n·dt.
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.samples.len()).map(move |n| self.time_at(n))
    }

    /// Sample reached at progress `alpha` in [0, 1] through the trajectory.
    pub fn sample_at_progress(&self, alpha: f64) -> Option<State> {
        progress_index(alpha, self.samples.len()).and_then(|n| self.samples.get(n).copied())
    }
}

/// Lorenz trajectory generator with configurable solver options.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrajectoryGenerator {
    options: SolverOptions,
}

impl TrajectoryGenerator {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// Integrate from `initial` over [0, duration] and sample every `dt`.
    ///
    /// Blocks until every grid sample exists or the solver gives up. All
    /// argument checks happen before any integration work.
    pub fn generate(
        &self,
        initial: State,
        parameters: SystemParameters,
        duration: f64,
        dt: f64,
    ) -> Result<Trajectory> {
        let grid = TimeGrid::new(duration, dt)?;
        parameters.validate()?;
        if !initial.is_finite() {
            return Err(FieldError::invalid(format!(
                "initial state must be finite, got {:?}",
                initial
            )));
        }

        let mut solver = DormandPrince::new(
            move |y| lorenz_vec(y, &parameters),
            0.0,
            initial.into(),
            duration,
            &self.options,
        )?;

        let mut samples = Vec::with_capacity(grid.len());
        while samples.len() < grid.len() && !solver.is_finished() {
            let step = solver.step()?;
            while samples.len() < grid.len() {
                let t = grid.time(samples.len());
                if t > step.t_new() {
                    break;
                }
                samples.push(State::from(step.eval(t)));
            }
        }
        if samples.len() < grid.len() {
            return Err(FieldError::integration(
                solver.t(),
                format!("produced {} of {} samples", samples.len(), grid.len()),
            ));
        }

        // The solve must still reach `duration` even past the last sample.
        while !solver.is_finished() {
            solver.step()?;
        }

        let stats = solver.stats();
        debug!(
            samples = samples.len(),
            accepted = stats.accepted_steps,
            rejected = stats.rejected_steps,
            evaluations = stats.evaluations,
            "trajectory generated"
        );

        Ok(Trajectory {
            initial,
            parameters,
            duration,
            dt,
            samples,
            stats,
        })
    }
}

/// Integrate the Lorenz system from `initial_state` with default solver
/// options and return the samples at 0, dt, 2·dt, … below `duration`.
pub fn generate_trajectory(
    initial_state: State,
    parameters: SystemParameters,
    duration: f64,
    dt: f64,
) -> Result<Trajectory> {
    TrajectoryGenerator::default().generate(initial_state, parameters, duration, dt)
}
