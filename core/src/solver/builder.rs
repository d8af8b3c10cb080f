//! Constraint Builder: the translator from an input primitive list into a
//! [`PointTable`] and a resolved constraint list.
//!
//! Ingest order within each primitive kind is the caller's order, but the
//! builder itself always processes points, then lines/circles, then
//! constraints, regardless of how the caller interleaved them. (Three
//! passes, since circles share line's pass.)
//!
//! On any failure the whole ingest is rejected: nothing is written into the
//! structures this function returns (they're local variables until the
//! final `Ok`), so the caller's prior session state is untouched.

use std::collections::HashSet;

use tracing::debug;

use super::constraints::ConstraintKind;
use super::error::{LoadError, LoadResult};
use super::model::{Primitive, PrimitiveId};
use super::points::PointTable;
use super::registry::PrimitiveRegistry;

/// The fully-resolved outcome of a successful ingest.
pub struct BuiltModel {
    pub points: PointTable,
    pub constraints: Vec<(PrimitiveId, ConstraintKind)>,
    /// The original primitive list, preserved verbatim and in order, so the
    /// Result Extractor can reproduce ids/order/types on `extract()`.
    pub original: Vec<Primitive>,
}

pub fn ingest(primitives: Vec<Primitive>) -> LoadResult<BuiltModel> {
    let mut seen_ids = HashSet::new();
    for primitive in &primitives {
        if !seen_ids.insert(primitive.id().clone()) {
            return Err(LoadError::DuplicateId {
                id: primitive.id().clone(),
            });
        }
    }

    let mut points = PointTable::new();
    for primitive in &primitives {
        if let Primitive::Point(p) = primitive {
            points.add(p.id.clone(), p.x, p.y, p.fixed);
        }
    }

    let mut registry = PrimitiveRegistry::new();
    for primitive in &primitives {
        match primitive {
            Primitive::Line(line) => {
                points.lookup_point(&line.id, &line.p1_id)?;
                points.lookup_point(&line.id, &line.p2_id)?;
                registry.register_line(line.clone());
            }
            Primitive::Circle(circle) => {
                points.lookup_point(&circle.id, &circle.center_id)?;
                registry.register_circle(circle.clone());
            }
            _ => {}
        }
    }

    let mut constraints = Vec::new();
    for primitive in &primitives {
        if let Primitive::Constraint(constraint) = primitive {
            for participant in spec_point_refs(&constraint.kind) {
                points.lookup_point(&constraint.id, &participant)?;
            }
            let resolved = constraint.kind.resolve(&constraint.id, &registry)?;
            constraints.push((constraint.id.clone(), resolved));
        }
    }

    debug!(
        points = points.len(),
        constraints = constraints.len(),
        "ingested sketch"
    );

    Ok(BuiltModel {
        points,
        constraints,
        original: primitives,
    })
}

/// Direct point references carried by a constraint spec (i.e. everything
/// that isn't resolved through a line). Checked up front so a bad point id
/// on, say, a `Distance` constraint is reported before attempting line
/// resolution.
fn spec_point_refs(kind: &super::constraints::ConstraintSpec) -> Vec<PrimitiveId> {
    use super::constraints::ConstraintSpec as CS;
    match kind {
        CS::Distance { p1, p2, .. }
        | CS::Horizontal { p1, p2 }
        | CS::Vertical { p1, p2 }
        | CS::Coincident { p1, p2 } => vec![p1.clone(), p2.clone()],
        CS::CoordinateX { p, .. } | CS::CoordinateY { p, .. } => vec![p.clone()],
        CS::Parallel { .. }
        | CS::Perpendicular { .. }
        | CS::Angle { .. }
        | CS::EqualLength { .. }
        | CS::LineLength { .. } => Vec::new(),
    }
}
