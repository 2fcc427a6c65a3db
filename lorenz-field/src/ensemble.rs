// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Ensembles: one independent trajectory per initial condition, all sharing
//! parameters, duration and dt.
//!
//! Members never share storage, so they can be computed on separate threads
//! in any order. `build` and `build_parallel` return identical ensembles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dopri::SolverOptions;
use crate::error::{FieldError, Result};
use crate::params::{State, SystemParameters};
use crate::trajectory::{Trajectory, TrajectoryGenerator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Rule deriving the initial state of each ensemble member from its index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum InitialConditions {
    /// Member i starts at (base + i·step) on every axis.
    DiagonalOffset { base: f64, step: f64 },
    /// Member i is `base` shifted by i·epsilon along `axis`.
    Perturbed { base: State, axis: Axis, epsilon: f64 },
    /// Seeded uniform offsets in the cube of half-width `radius` around `center`.
    RandomCloud { center: State, radius: f64, seed: u64 },
    /// Caller-supplied states, used in order.
    Explicit { states: Vec<State> },
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self::DiagonalOffset { base: 1.0, step: 1.0 }
    }
}

impl InitialConditions {
    /// The first `count` initial states of this rule.
    pub fn states(&self, count: usize) -> Result<Vec<State>> {
        let states = match self {
            Self::DiagonalOffset { base, step } => (0..count)
                .map(|i| State::splat(base + i as f64 * step))
                .collect(),
            Self::Perturbed { base, axis, epsilon } => (0..count)
                .map(|i| {
                    let shift = i as f64 * epsilon;
                    let mut s = *base;
                    match axis {
                        Axis::X => s.x += shift,
                        Axis::Y => s.y += shift,
                        Axis::Z => s.z += shift,
                    }
                    s
                })
                .collect(),
            Self::RandomCloud { center, radius, seed } => {
                if !(radius.is_finite() && *radius >= 0.0) {
                    return Err(FieldError::invalid(format!(
                        "cloud radius must be non-negative and finite, got {}",
                        radius
                    )));
                }
                let mut rng = StdRng::seed_from_u64(*seed);
                (0..count)
                    .map(|_| {
                        let mut offset = || {
                            if *radius == 0.0 {
                                0.0
                            } else {
                                rng.gen_range(-*radius..=*radius)
                            }
                        };
                        State::new(center.x + offset(), center.y + offset(), center.z + offset())
                    })
                    .collect()
            }
            Self::Explicit { states } => {
                if states.len() < count {
                    return Err(FieldError::invalid(format!(
                        "{} explicit initial states supplied for {} members",
                        states.len(),
                        count
                    )));
                }
                states[..count].to_vec()
            }
        };
        Ok(states)
    }
}

/// A set of independent trajectories over a shared grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ensemble {
    parameters: SystemParameters,
    duration: f64,
    dt: f64,
    members: Vec<Trajectory>,
}

impl Ensemble {
    pub fn members(&self) -> &[Trajectory] {
        &self.members
    }

    pub fn members_mut(&mut self) -> &mut [Trajectory] {
        &mut self.members
    }

    pub fn get(&self, index: usize) -> Option<&Trajectory> {
        self.members.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trajectory> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
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

    /// Total sample count across members.
    pub fn total_samples(&self) -> usize {
        self.members.iter().map(Trajectory::len).sum()
    }
}

impl<'a> IntoIterator for &'a Ensemble {
    type Item = &'a Trajectory;
    type IntoIter = std::slice::Iter<'a, Trajectory>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// Builder for [`Ensemble`].
///
/// Defaults match the interactive page: canonical parameters, duration 15,
/// dt 0.02, initial states (1+i, 1+i, 1+i).
#[derive(Debug, Clone)]
pub struct EnsembleBuilder {
    count: usize,
    rule: InitialConditions,
    parameters: SystemParameters,
    duration: f64,
    dt: f64,
    generator: TrajectoryGenerator,
}

impl EnsembleBuilder {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            rule: InitialConditions::default(),
            parameters: SystemParameters::CANONICAL,
            duration: 15.0,
            dt: 0.02,
            generator: TrajectoryGenerator::default(),
        }
    }

    pub fn with_rule(mut self, rule: InitialConditions) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_parameters(mut self, parameters: SystemParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_solver_options(mut self, options: SolverOptions) -> Self {
        self.generator = TrajectoryGenerator::new(options);
        self
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn initial_states(&self) -> Result<Vec<State>> {
        if self.count == 0 {
            return Err(FieldError::invalid("an ensemble needs at least one member"));
        }
        self.rule.states(self.count)
    }

    /// Generate every member in index order on the calling thread.
    pub fn build(&self) -> Result<Ensemble> {
        let states = self.initial_states()?;
        let mut members = Vec::with_capacity(states.len());
        for (index, state) in states.into_iter().enumerate() {
            members.push(self.generate_member(index, state)?);
        }
        Ok(self.finish(members))
    }

    /// Generate members on up to `threads` scoped worker threads.
    ///
    /// Workers pull member indices from a shared counter; results land in
    /// their index slot so the output order matches `build`.
    pub fn build_parallel(&self, threads: usize) -> Result<Ensemble> {
        let states = self.initial_states()?;
        let total = states.len();
        let threads = threads.clamp(1, total);
        let counter = AtomicUsize::new(0);
        let slots: Mutex<Vec<Option<Result<Trajectory>>>> =
            Mutex::new((0..total).map(|_| None).collect());

        thread::scope(|s| {
            for _ in 0..threads {
                let counter = &counter;
                let slots = &slots;
                let states = &states;
                s.spawn(move || loop {
                    let idx = counter.fetch_add(1, Ordering::Relaxed);
                    if idx >= total {
                        break;
                    }
                    let result = self.generate_member(idx, states[idx]);
                    let mut guard = slots.lock().unwrap_or_else(|e| e.into_inner());
                    guard[idx] = Some(result);
                });
            }
        });

        let slots = slots.into_inner().unwrap_or_else(|e| e.into_inner());
        let mut members = Vec::with_capacity(total);
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(result) => members.push(result?),
                None => {
                    return Err(FieldError::EnsembleMember {
                        index,
                        source: Box::new(FieldError::integration(0.0, "worker produced no result")),
                    })
                }
            }
        }
        Ok(self.finish(members))
    }

    fn generate_member(&self, index: usize, state: State) -> Result<Trajectory> {
        debug!(index, x = state.x, y = state.y, z = state.z, "generating ensemble member");
        self.generator
            .generate(state, self.parameters, self.duration, self.dt)
            .map_err(|e| FieldError::EnsembleMember {
                index,
                source: Box::new(e),
            })
    }

    fn finish(&self, members: Vec<Trajectory>) -> Ensemble {
        let ensemble = Ensemble {
            parameters: self.parameters,
            duration: self.duration,
            dt: self.dt,
            members,
        };
        info!(
            members = ensemble.len(),
            samples = ensemble.total_samples(),
            "ensemble built"
        );
        ensemble
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_offset_matches_index_rule() {
        let states = InitialConditions::default().states(3).unwrap();
        assert_eq!(
            states,
            vec![State::splat(1.0), State::splat(2.0), State::splat(3.0)]
        );
    }

    #[test]
    fn test_perturbed_rule() {
        let rule = InitialConditions::Perturbed {
            base: State::splat(1.0),
            axis: Axis::Z,
            epsilon: 1e-5,
        };
        let states = rule.states(3).unwrap();
        assert_eq!(states[0], State::splat(1.0));
        assert_eq!(states[1].x, 1.0);
        assert!((states[2].z - 1.00002).abs() < 1e-15);
    }

    #[test]
    fn test_random_cloud_is_seeded_and_bounded() {
        let rule = InitialConditions::RandomCloud {
            center: State::new(0.0, 0.0, 25.0),
            radius: 2.0,
            seed: 7,
        };
        let a = rule.states(16).unwrap();
        let b = rule.states(16).unwrap();
        assert_eq!(a, b);
        for s in &a {
            assert!(s.x.abs() <= 2.0 && s.y.abs() <= 2.0 && (s.z - 25.0).abs() <= 2.0);
        }
    }

    #[test]
    fn test_explicit_rule_needs_enough_states() {
        let rule = InitialConditions::Explicit {
            states: vec![State::splat(1.0)],
        };
        assert!(rule.states(2).unwrap_err().is_invalid_parameters());
        assert_eq!(rule.states(1).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_ensemble_rejected() {
        let err = EnsembleBuilder::new(0).build().unwrap_err();
        assert!(err.is_invalid_parameters());
    }

    #[test]
    fn test_member_failure_carries_index() {
        let rule = InitialConditions::Explicit {
            states: vec![State::splat(1.0), State::new(f64::NAN, 0.0, 0.0)],
        };
        let err = EnsembleBuilder::new(2)
            .with_rule(rule)
            .with_duration(1.0)
            .build()
            .unwrap_err();
        match err {
            FieldError::EnsembleMember { index, ref source } => {
                assert_eq!(index, 1);
                assert!(source.is_invalid_parameters());
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let builder = EnsembleBuilder::new(4).with_duration(3.0).with_dt(0.01);
        let sequential = builder.build().unwrap();
        let parallel = builder.build_parallel(3).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_parallel_thread_count_clamped() {
        let builder = EnsembleBuilder::new(2).with_duration(1.0).with_dt(0.1);
        assert_eq!(builder.build_parallel(0).unwrap().len(), 2);
        assert_eq!(builder.build_parallel(64).unwrap().len(), 2);
    }

    #[test]
    fn test_rule_serde_tagging() {
        let json = serde_json::to_string(&InitialConditions::default()).unwrap();
        assert_eq!(json, r#"{"rule":"diagonal_offset","base":1.0,"step":1.0}"#);
        let back: InitialConditions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, InitialConditions::default());
    }
}
