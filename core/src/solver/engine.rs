//! Solve Engine: the adaptive fixed-point corrector loop.
//!
//! Each iteration applies every constraint's correction once, in the
//! original primitive order, accumulating `|r|` across all constraints into
//! a single scalar total error. The step size adapts from two independent
//! rules checked every iteration: an improvement rule (scale up on steady
//! progress, penalize on stagnation) and an oscillation rule (scale down
//! when a rolling window of recent totals shows neither a clear fall nor a
//! clear rise, i.e. an increasing-fraction in `[0.4, 0.6]`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::constraints::ConstraintKind;
use super::model::PrimitiveId;
use super::points::PointTable;
use super::ring_buffer::RingBuffer;

/// Only `GradientDescent` has a differentiated kernel; the other three
/// names are accepted and routed to the same loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    GradientDescent,
    LevenbergMarquardt,
    DogLeg,
    Bfgs,
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::GradientDescent
    }
}

#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub algorithm: Algorithm,
    pub max_iterations: u32,
    pub convergence_epsilon: f64,
    pub step_initial: f64,
    pub step_min: f64,
    pub step_max: f64,
    pub history_window: usize,
    pub stall_patience: u32,
    pub stall_error_threshold: f64,
    pub time_budget: Option<Duration>,
    pub cancel_token: Option<Arc<AtomicBool>>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::GradientDescent,
            max_iterations: 200,
            convergence_epsilon: 1.0,
            step_initial: 0.5,
            step_min: 0.05,
            step_max: 0.8,
            history_window: 10,
            stall_patience: 100,
            stall_error_threshold: 10.0,
            time_budget: None,
            cancel_token: None,
        }
    }
}

/// "Converged" and "Success" are kept as distinct tags: both mean "the
/// caller can trust this assignment", but `Converged` reached the
/// epsilon exactly while `Success` was accepted at stall, at the time
/// budget, or at the iteration cap because the total error was already
/// below `stall_error_threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Converged,
    Success,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct SolveReport {
    pub status: SolveStatus,
    pub iterations: u32,
    pub final_error: f64,
}

/// Runs the adaptive corrector over `points` until convergence, stall,
/// cancellation, the time budget, or `max_iterations`, whichever comes
/// first. Mutates `points` in place unconditionally: a cancelled, timed-out
/// or failed solve keeps whatever partial correction was already applied;
/// solver errors never roll back point mutations.
pub fn solve(
    points: &mut PointTable,
    constraints: &[(PrimitiveId, ConstraintKind)],
    config: &SolverConfig,
    cancel: Option<Arc<AtomicBool>>,
) -> SolveReport {
    if config.algorithm != Algorithm::GradientDescent {
        tracing::warn!(
            algorithm = ?config.algorithm,
            "solver algorithm has no dedicated kernel, falling back to gradient descent"
        );
    }

    let cancel = cancel.or_else(|| config.cancel_token.clone());
    let start = Instant::now();
    let mut step = config.step_initial.clamp(config.step_min, config.step_max);
    let mut ring = RingBuffer::new(config.history_window.max(1));
    let mut previous_error = f64::INFINITY;
    let mut no_improvement: u32 = 0;
    let mut last_total = f64::INFINITY;
    let mut iterations: u32 = 0;

    loop {
        if let Some(flag) = &cancel {
            if flag.load(Ordering::Relaxed) {
                debug!(iterations, "solve cancelled");
                return SolveReport {
                    status: SolveStatus::Cancelled,
                    iterations,
                    final_error: last_total,
                };
            }
        }
        if let Some(budget) = config.time_budget {
            if start.elapsed() > budget {
                debug!(iterations, last_total, "solve timed out, treating as stall");
                return accept_or_fail(last_total, config.stall_error_threshold, iterations);
            }
        }
        if iterations >= config.max_iterations {
            debug!(iterations, last_total, "max iterations reached");
            return accept_or_fail(last_total, config.stall_error_threshold, iterations);
        }

        let mut total_error = 0.0;
        for (index, (id, kind)) in constraints.iter().enumerate() {
            let seed = (iterations as u64)
                .wrapping_mul(constraints.len().max(1) as u64)
                .wrapping_add(index as u64);
            let err = kind.apply_correction(points, step, seed);
            trace!(constraint = %id, kind = kind.name(), error = err, "applied correction");
            total_error += err;
        }
        iterations += 1;
        last_total = total_error;
        ring.push(total_error);

        if total_error < config.convergence_epsilon {
            debug!(iterations, total_error, "converged");
            return SolveReport {
                status: SolveStatus::Converged,
                iterations,
                final_error: total_error,
            };
        }

        if total_error < 0.98 * previous_error {
            step = (step * 1.1).min(config.step_max);
            no_improvement = 0;
        } else {
            no_improvement += 1;
        }

        if ring.is_full() {
            let frac = ring.increasing_fraction();
            if (0.4..=0.6).contains(&frac) {
                step = (step * 0.5).max(config.step_min);
                ring.clear();
            }
        }

        if no_improvement > config.stall_patience {
            debug!(iterations, total_error, "stalled");
            return accept_or_fail(total_error, config.stall_error_threshold, iterations);
        }

        previous_error = total_error;
    }
}

fn accept_or_fail(total_error: f64, threshold: f64, iterations: u32) -> SolveReport {
    let status = if total_error <= threshold {
        SolveStatus::Success
    } else {
        SolveStatus::Failed
    };
    SolveReport {
        status,
        iterations,
        final_error: total_error,
    }
}
