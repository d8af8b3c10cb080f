//! Diagnostics: post-solve residual reporting. A worst-offenders summary
//! over the final constraint residuals, useful to a caller even though this
//! kernel has no CLI/backend surface of its own to host one.

use super::constraints::ConstraintKind;
use super::engine::SolveReport;
use super::model::PrimitiveId;
use super::points::PointTable;

/// A single constraint's residual at the moment diagnostics were captured.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualEntry {
    pub constraint_id: PrimitiveId,
    pub kind: &'static str,
    pub participants: Vec<PrimitiveId>,
    pub error: f64,
}

/// The top worst-residual constraints after a solve, plus the solve's own
/// outcome summary. Never panics on an empty constraint set.
#[derive(Debug, Clone)]
pub struct DiagnosticReport {
    pub status: super::engine::SolveStatus,
    pub iterations: u32,
    pub total_error: f64,
    pub worst: Vec<ResidualEntry>,
}

const WORST_LIMIT: usize = 10;

/// Builds a diagnostic report from a solve's final point positions and the
/// report returned by [`super::engine::solve`]. `constraints` must be the
/// same slice the solve ran over.
pub fn report(
    points: &PointTable,
    constraints: &[(PrimitiveId, ConstraintKind)],
    solve_report: &SolveReport,
) -> DiagnosticReport {
    let mut entries: Vec<ResidualEntry> = constraints
        .iter()
        .map(|(id, kind)| ResidualEntry {
            constraint_id: id.clone(),
            kind: kind.name(),
            participants: kind.participant_ids(),
            error: kind.error(points),
        })
        .collect();

    entries.sort_by(|a, b| b.error.partial_cmp(&a.error).unwrap_or(std::cmp::Ordering::Equal));
    entries.truncate(WORST_LIMIT);

    DiagnosticReport {
        status: solve_report.status,
        iterations: solve_report.iterations,
        total_error: solve_report.final_error,
        worst: entries,
    }
}
