// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Dormand–Prince 5(4) adaptive Runge–Kutta solver with dense output.
//!
//! Fifth-order propagation, embedded fourth-order error estimate, and a
//! quartic continuous extension used to resample the solution at arbitrary
//! times inside each accepted step. The step controller:
//!
//!   err    = rms( h·Σ E_j k_j / (atol + max(|y|, |y_new|)·rtol) )
//!   accept   err < 1,  grow by min(10, 0.9·err^(-1/5)) (no growth right after a rejection)
//!   reject   shrink by max(0.2, 0.9·err^(-1/5))
//!
//! A step below 10 ulp of the current time is a failure.
//!
//! The systems integrated here are autonomous, so the right-hand side takes
//! only the state and the stage nodes c_i are not needed.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{FieldError, Result};

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
/// -1 / (error estimator order + 1)
const ERROR_EXPONENT: f64 = -1.0 / 5.0;
const STAGES: usize = 6;

const A: [[f64; 5]; STAGES] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0],
    [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0],
    [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0],
];

const B: [f64; STAGES] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];

const E: [f64; STAGES + 1] = [
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];

/// Coefficients of the quartic continuous extension, one row per stage.
const P: [[f64; 4]; STAGES + 1] = [
    [
        1.0,
        -8048581381.0 / 2820520608.0,
        8663915743.0 / 2820520608.0,
        -12715105075.0 / 11282082432.0,
    ],
    [0.0, 0.0, 0.0, 0.0],
    [
        0.0,
        131558114200.0 / 32700410799.0,
        -68118460800.0 / 10900136933.0,
        87487479700.0 / 32700410799.0,
    ],
    [
        0.0,
        -1754552775.0 / 470086768.0,
        14199869525.0 / 1410260304.0,
        -10690763975.0 / 1880347072.0,
    ],
    [
        0.0,
        127303824393.0 / 49829197408.0,
        -318862633887.0 / 49829197408.0,
        701980252875.0 / 199316789632.0,
    ],
    [
        0.0,
        -282668133.0 / 205662961.0,
        2019193451.0 / 616988883.0,
        -1453857185.0 / 822651844.0,
    ],
    [
        0.0,
        40617522.0 / 29380423.0,
        -110615467.0 / 29380423.0,
        69997945.0 / 29380423.0,
    ],
];

/// Tolerances and limits for the adaptive solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Relative tolerance
    pub rtol: f64,
    /// Absolute tolerance
    pub atol: f64,
    /// Upper bound on any single step
    pub max_step: f64,
    /// Accepted-step budget; exhausting it before the end time is a failure
    pub max_steps: usize,
    /// Initial step. `None` picks one from the local derivative scale.
    pub first_step: Option<f64>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-3,
            atol: 1e-6,
            max_step: f64::INFINITY,
            max_steps: 1_000_000,
            first_step: None,
        }
    }
}

impl SolverOptions {
    pub fn with_tolerances(rtol: f64, atol: f64) -> Self {
        Self {
            rtol,
            atol,
            ..Self::default()
        }
    }

    /// Check the options and lift an unreachably small `rtol` to 100·ε.
    pub(crate) fn sanitized(&self) -> Result<Self> {
        if !(self.rtol.is_finite() && self.rtol > 0.0) {
            return Err(FieldError::invalid(format!("rtol must be positive and finite, got {}", self.rtol)));
        }
        if !(self.atol.is_finite() && self.atol >= 0.0) {
            return Err(FieldError::invalid(format!("atol must be non-negative and finite, got {}", self.atol)));
        }
        if !(self.max_step > 0.0) {
            return Err(FieldError::invalid(format!("max_step must be positive, got {}", self.max_step)));
        }
        if self.max_steps == 0 {
            return Err(FieldError::invalid("max_steps must be at least 1"));
        }
        if let Some(h) = self.first_step {
            if !(h.is_finite() && h > 0.0) {
                return Err(FieldError::invalid(format!("first_step must be positive and finite, got {}", h)));
            }
        }

        let mut out = *self;
        let floor = 100.0 * f64::EPSILON;
        if out.rtol < floor {
            warn!(rtol = out.rtol, floor, "rtol below attainable precision, raising it");
            out.rtol = floor;
        }
        Ok(out)
    }
}

/// Work counters for one solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    /// Right-hand side evaluations, including the initial-step probe
    pub evaluations: usize,
}

/// Continuous extension over one accepted step `[t_old, t_new]`.
#[derive(Debug, Clone, Copy)]
pub struct DenseStep {
    t_old: f64,
    t_new: f64,
    h: f64,
    y_old: Vector3<f64>,
    q: [Vector3<f64>; 4],
}

impl DenseStep {
    fn new(t_old: f64, t_new: f64, y_old: Vector3<f64>, k: &[Vector3<f64>; STAGES + 1]) -> Self {
        let mut q = [Vector3::zeros(); 4];
        for (kj, row) in k.iter().zip(P.iter()) {
            for (qc, &p) in q.iter_mut().zip(row.iter()) {
                *qc += kj * p;
            }
        }
        Self {
            t_old,
            t_new,
            h: t_new - t_old,
            y_old,
            q,
        }
    }

    pub fn t_old(&self) -> f64 {
        self.t_old
    }

    pub fn t_new(&self) -> f64 {
        self.t_new
    }

    /// Interpolated state at `t`. Exact at `t_old`.
    pub fn eval(&self, t: f64) -> Vector3<f64> {
        let x = (t - self.t_old) / self.h;
        let mut acc = Vector3::zeros();
        let mut power = x;
        for qc in &self.q {
            acc += qc * power;
            power *= x;
        }
        self.y_old + acc * self.h
    }
}

/// Forward-in-time Dormand–Prince integrator for an autonomous 3D system.
pub struct DormandPrince<F> {
    f: F,
    options: SolverOptions,
    t: f64,
    y: Vector3<f64>,
    f_cur: Vector3<f64>,
    t_bound: f64,
    h_abs: f64,
    stats: SolveStats,
}

impl<F> DormandPrince<F>
where
    F: FnMut(&Vector3<f64>) -> Vector3<f64>,
{
    pub fn new(mut f: F, t0: f64, y0: Vector3<f64>, t_bound: f64, options: &SolverOptions) -> Result<Self> {
        let options = options.sanitized()?;
        if !(t0.is_finite() && t_bound.is_finite() && t_bound > t0) {
            return Err(FieldError::invalid(format!(
                "integration interval [{}, {}] must be finite and non-empty",
                t0, t_bound
            )));
        }

        let f0 = f(&y0);
        let mut stats = SolveStats {
            evaluations: 1,
            ..SolveStats::default()
        };
        let interval = t_bound - t0;
        let h_abs = match options.first_step {
            Some(h) if h > interval => {
                return Err(FieldError::invalid(format!(
                    "first_step {} exceeds the integration interval {}",
                    h, interval
                )));
            }
            Some(h) => h,
            None => {
                stats.evaluations += 1;
                initial_step(&mut f, &y0, &f0, interval, &options)
            }
        };

        Ok(Self {
            f,
            options,
            t: t0,
            y: y0,
            f_cur: f0,
            t_bound,
            h_abs,
            stats,
        })
    }

    pub fn t(&self) -> f64 {
        self.t
    }

    pub fn y(&self) -> Vector3<f64> {
        self.y
    }

    pub fn stats(&self) -> SolveStats {
        self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.t >= self.t_bound
    }

    /// Advance by one accepted step, retrying with smaller steps as needed.
    pub fn step(&mut self) -> Result<DenseStep> {
        if self.is_finished() {
            return Err(FieldError::integration(self.t, "solver already reached its end time"));
        }
        if self.stats.accepted_steps >= self.options.max_steps {
            return Err(FieldError::integration(
                self.t,
                format!(
                    "step limit of {} reached before t={}",
                    self.options.max_steps, self.t_bound
                ),
            ));
        }

        let min_step = 10.0 * ulp_spacing(self.t);
        let mut h_abs = if self.h_abs > self.options.max_step {
            self.options.max_step
        } else if self.h_abs < min_step {
            min_step
        } else {
            self.h_abs
        };
        let mut step_rejected = false;

        loop {
            if h_abs < min_step {
                return Err(FieldError::integration(
                    self.t,
                    format!("step size {:e} fell below the minimum {:e}", h_abs, min_step),
                ));
            }

            let t_new = (self.t + h_abs).min(self.t_bound);
            let h = t_new - self.t;
            h_abs = h;

            let (y_new, k) = self.rk_step(h);
            self.stats.evaluations += STAGES;
            let error_norm = self.error_norm(h, &k, &y_new);

            if error_norm < 1.0 {
                let mut factor = if error_norm == 0.0 {
                    MAX_FACTOR
                } else {
                    (SAFETY * error_norm.powf(ERROR_EXPONENT)).min(MAX_FACTOR)
                };
                if step_rejected {
                    factor = factor.min(1.0);
                }

                let dense = DenseStep::new(self.t, t_new, self.y, &k);
                self.h_abs = h_abs * factor;
                self.t = t_new;
                self.y = y_new;
                self.f_cur = k[STAGES];
                self.stats.accepted_steps += 1;
                return Ok(dense);
            }

            // NaN/inf error norms (overflowing stages) shrink at the floor rate
            let factor = if error_norm.is_finite() {
                (SAFETY * error_norm.powf(ERROR_EXPONENT)).max(MIN_FACTOR)
            } else {
                MIN_FACTOR
            };
            h_abs *= factor;
            step_rejected = true;
            self.stats.rejected_steps += 1;
        }
    }

    /// One trial step of size `h`. The last stage is f(y_new) (FSAL).
    fn rk_step(&mut self, h: f64) -> (Vector3<f64>, [Vector3<f64>; STAGES + 1]) {
        let mut k = [Vector3::zeros(); STAGES + 1];
        k[0] = self.f_cur;
        for s in 1..STAGES {
            let mut dy = Vector3::zeros();
            for (kj, &a) in k.iter().zip(A[s].iter()).take(s) {
                dy += kj * a;
            }
            k[s] = (self.f)(&(self.y + dy * h));
        }

        let mut incr = Vector3::zeros();
        for (kj, &b) in k.iter().zip(B.iter()) {
            incr += kj * b;
        }
        let y_new = self.y + incr * h;
        k[STAGES] = (self.f)(&y_new);
        (y_new, k)
    }

    fn error_norm(&self, h: f64, k: &[Vector3<f64>; STAGES + 1], y_new: &Vector3<f64>) -> f64 {
        let mut err = Vector3::zeros();
        for (kj, &e) in k.iter().zip(E.iter()) {
            err += kj * e;
        }
        err *= h;
        let scale = self.y.abs().sup(&y_new.abs()) * self.options.rtol
            + Vector3::repeat(self.options.atol);
        rms_norm(&err.component_div(&scale))
    }
}

/// Starting step from the size of y0, f(y0) and a one-Euler-step probe of
/// the second derivative.
fn initial_step<F>(
    f: &mut F,
    y0: &Vector3<f64>,
    f0: &Vector3<f64>,
    interval: f64,
    options: &SolverOptions,
) -> f64
where
    F: FnMut(&Vector3<f64>) -> Vector3<f64>,
{
    let scale = y0.abs() * options.rtol + Vector3::repeat(options.atol);
    let d0 = rms_norm(&y0.component_div(&scale));
    let d1 = rms_norm(&f0.component_div(&scale));

    let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };
    let h0 = h0.min(interval);

    let y1 = y0 + f0 * h0;
    let f1 = f(&y1);
    let d2 = rms_norm(&(f1 - f0).component_div(&scale)) / h0;

    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(-ERROR_EXPONENT)
    };

    (100.0 * h0).min(h1).min(interval)
}

fn rms_norm(v: &Vector3<f64>) -> f64 {
    (v.norm_squared() / 3.0).sqrt()
}

/// Distance from |t| to the next representable double above it.
fn ulp_spacing(t: f64) -> f64 {
    let a = t.abs();
    f64::from_bits(a.to_bits() + 1) - a
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tight() -> SolverOptions {
        SolverOptions::with_tolerances(1e-10, 1e-12)
    }

    fn run_to_end<F>(solver: &mut DormandPrince<F>) -> Result<Vec<DenseStep>>
    where
        F: FnMut(&Vector3<f64>) -> Vector3<f64>,
    {
        let mut steps = Vec::new();
        while !solver.is_finished() {
            steps.push(solver.step()?);
        }
        Ok(steps)
    }

    #[test]
    fn test_exponential_decay() {
        let y0 = Vector3::new(1.0, 2.0, -0.5);
        let mut solver = DormandPrince::new(|y: &Vector3<f64>| -y, 0.0, y0, 1.0, &tight()).unwrap();
        run_to_end(&mut solver).unwrap();

        let expected = y0 * (-1.0f64).exp();
        assert_eq!(solver.t(), 1.0);
        assert!((solver.y() - expected).amax() < 1e-9, "got {:?}", solver.y());
    }

    #[test]
    fn test_dense_output_endpoints() {
        let f = |y: &Vector3<f64>| Vector3::new(y.y, -y.x, 0.1 * y.z);
        let y0 = Vector3::new(1.0, 0.0, 1.0);
        let mut solver = DormandPrince::new(f, 0.0, y0, 2.0, &SolverOptions::default()).unwrap();

        let step = solver.step().unwrap();
        assert_eq!(step.eval(step.t_old()), y0);
        assert!((step.eval(step.t_new()) - solver.y()).amax() < 1e-12);
    }

    #[test]
    fn test_dense_output_interior_accuracy() {
        let f = |y: &Vector3<f64>| Vector3::new(y.y, -y.x, 0.0);
        let mut solver = DormandPrince::new(f, 0.0, Vector3::new(1.0, 0.0, 0.0), 10.0, &tight()).unwrap();
        let steps = run_to_end(&mut solver).unwrap();

        for step in &steps {
            let t = 0.5 * (step.t_old() + step.t_new());
            let y = step.eval(t);
            assert!((y.x - t.cos()).abs() < 1e-7, "x({}) = {}", t, y.x);
            assert!((y.y + t.sin()).abs() < 1e-7, "y({}) = {}", t, y.y);
        }
    }

    #[test]
    fn test_finite_time_blowup_fails() {
        // y' = y² from y=1 blows up at t=1
        let f = |y: &Vector3<f64>| Vector3::new(y.x * y.x, 0.0, 0.0);
        let mut solver =
            DormandPrince::new(f, 0.0, Vector3::new(1.0, 0.0, 0.0), 2.0, &SolverOptions::default()).unwrap();
        let err = run_to_end(&mut solver).unwrap_err();
        assert!(err.is_integration_failure(), "unexpected error: {}", err);
        assert!(solver.t() < 1.0);
    }

    #[test]
    fn test_step_budget_exhaustion() {
        let options = SolverOptions {
            max_steps: 3,
            max_step: 0.01,
            ..SolverOptions::default()
        };
        let mut solver = DormandPrince::new(|y: &Vector3<f64>| -y, 0.0, Vector3::repeat(1.0), 1.0, &options).unwrap();
        let err = run_to_end(&mut solver).unwrap_err();
        assert!(err.is_integration_failure());
        assert_eq!(solver.stats().accepted_steps, 3);
    }

    #[test]
    fn test_max_step_respected() {
        let options = SolverOptions {
            max_step: 0.05,
            ..SolverOptions::default()
        };
        let mut solver = DormandPrince::new(|y: &Vector3<f64>| -y, 0.0, Vector3::repeat(1.0), 1.0, &options).unwrap();
        let steps = run_to_end(&mut solver).unwrap();
        assert!(steps.len() >= 20);
        for s in &steps {
            assert!(s.t_new() - s.t_old() <= 0.05 + 1e-15);
        }
    }

    #[test]
    fn test_invalid_options_rejected() {
        let bad = [
            SolverOptions::with_tolerances(0.0, 1e-6),
            SolverOptions::with_tolerances(1e-3, -1.0),
            SolverOptions { max_step: 0.0, ..SolverOptions::default() },
            SolverOptions { max_steps: 0, ..SolverOptions::default() },
            SolverOptions { first_step: Some(-0.1), ..SolverOptions::default() },
        ];
        for options in &bad {
            let err = DormandPrince::new(|y: &Vector3<f64>| -y, 0.0, Vector3::repeat(1.0), 1.0, options)
                .err()
                .expect("options should be rejected");
            assert!(err.is_invalid_parameters(), "{:?} gave {}", options, err);
        }
    }

    #[test]
    fn test_tiny_rtol_is_raised() {
        let options = SolverOptions::with_tolerances(1e-20, 1e-12).sanitized().unwrap();
        assert_eq!(options.rtol, 100.0 * f64::EPSILON);
    }

    #[test]
    fn test_initial_step_within_interval() {
        let mut f = |y: &Vector3<f64>| Vector3::new(10.0 * (y.y - y.x), y.x * (28.0 - y.z) - y.y, y.x * y.y - 8.0 / 3.0 * y.z);
        let y0 = Vector3::repeat(1.0);
        let f0 = f(&y0);
        let h = initial_step(&mut f, &y0, &f0, 0.5, &SolverOptions::default());
        assert!(h > 0.0 && h <= 0.5, "h = {}", h);
    }

    #[test]
    fn test_ulp_spacing() {
        assert_eq!(ulp_spacing(1.0), f64::EPSILON);
        assert!(ulp_spacing(0.0) > 0.0);
    }
}
