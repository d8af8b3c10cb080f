//! Constraint Catalog: the closed set of constraint variants.
//!
//! Each variant is a plain data payload carrying already-resolved point
//! references (lines are resolved to their two endpoint points once, at
//! build time, by the [`super::builder`]; the solver never re-resolves a
//! line per iteration). Dispatch is a single `match` on a tagged Rust enum
//! rather than a string-keyed dictionary.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use super::error::LoadError;
use super::model::PrimitiveId;
use super::points::PointTable;
use super::registry::PrimitiveRegistry;

/// Threshold below which two points are treated as coincident for the
/// purposes of perturbing a degenerate distance/length correction. Distinct
/// from the per-kind [`ConstraintKind::tolerance`] table.
const DEGENERACY_EPSILON: f64 = 1e-9;

/// A line resolved to its two endpoint points. `line_id` is retained only
/// for diagnostics; all math uses `p1`/`p2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRef {
    pub line_id: PrimitiveId,
    pub p1: PrimitiveId,
    pub p2: PrimitiveId,
}

/// The wire-level shape of a constraint, as the caller supplies it: line
/// references are bare ids, not yet resolved to endpoint points. The
/// [`super::builder`] turns this into a [`ConstraintKind`] during ingest,
/// resolving each line to its endpoint points at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ConstraintSpec {
    Distance {
        p1: PrimitiveId,
        p2: PrimitiveId,
        value: f64,
    },
    Horizontal {
        p1: PrimitiveId,
        p2: PrimitiveId,
    },
    Vertical {
        p1: PrimitiveId,
        p2: PrimitiveId,
    },
    Coincident {
        p1: PrimitiveId,
        p2: PrimitiveId,
    },
    CoordinateX {
        p: PrimitiveId,
        value: f64,
    },
    CoordinateY {
        p: PrimitiveId,
        value: f64,
    },
    Parallel {
        line1: PrimitiveId,
        line2: PrimitiveId,
    },
    Perpendicular {
        line1: PrimitiveId,
        line2: PrimitiveId,
    },
    Angle {
        line1: PrimitiveId,
        line2: PrimitiveId,
        value: f64,
    },
    EqualLength {
        line1: PrimitiveId,
        line2: PrimitiveId,
    },
    LineLength {
        line: PrimitiveId,
        value: f64,
    },
}

impl ConstraintSpec {
    /// Tag strings recognized by the typed enum; used to translate an
    /// unrecognized wire tag into `LoadError::UnknownConstraintKind` at the
    /// JSON ingestion boundary (see `Session::load_json`) instead of a
    /// generic serde parse failure.
    pub const KNOWN_KINDS: &'static [&'static str] = &[
        "Distance",
        "Horizontal",
        "Vertical",
        "Coincident",
        "CoordinateX",
        "CoordinateY",
        "Parallel",
        "Perpendicular",
        "Angle",
        "EqualLength",
        "LineLength",
    ];

    /// Resolves line id references to their endpoint points, looking them
    /// up via the registry's `lookup_line` built during the builder's first
    /// pass.
    pub fn resolve(
        &self,
        owner: &PrimitiveId,
        registry: &PrimitiveRegistry,
    ) -> Result<ConstraintKind, LoadError> {
        let line_ref = |line_id: &PrimitiveId| -> Result<LineRef, LoadError> {
            let line = registry.lookup_line(owner, line_id)?;
            Ok(LineRef {
                line_id: line_id.clone(),
                p1: line.p1_id.clone(),
                p2: line.p2_id.clone(),
            })
        };

        Ok(match self {
            ConstraintSpec::Distance { p1, p2, value } => ConstraintKind::Distance {
                p1: p1.clone(),
                p2: p2.clone(),
                value: *value,
            },
            ConstraintSpec::Horizontal { p1, p2 } => ConstraintKind::Horizontal {
                p1: p1.clone(),
                p2: p2.clone(),
            },
            ConstraintSpec::Vertical { p1, p2 } => ConstraintKind::Vertical {
                p1: p1.clone(),
                p2: p2.clone(),
            },
            ConstraintSpec::Coincident { p1, p2 } => ConstraintKind::Coincident {
                p1: p1.clone(),
                p2: p2.clone(),
            },
            ConstraintSpec::CoordinateX { p, value } => ConstraintKind::CoordinateX {
                p: p.clone(),
                value: *value,
            },
            ConstraintSpec::CoordinateY { p, value } => ConstraintKind::CoordinateY {
                p: p.clone(),
                value: *value,
            },
            ConstraintSpec::Parallel { line1, line2 } => ConstraintKind::Parallel {
                line1: line_ref(line1)?,
                line2: line_ref(line2)?,
            },
            ConstraintSpec::Perpendicular { line1, line2 } => ConstraintKind::Perpendicular {
                line1: line_ref(line1)?,
                line2: line_ref(line2)?,
            },
            ConstraintSpec::Angle { line1, line2, value } => ConstraintKind::Angle {
                line1: line_ref(line1)?,
                line2: line_ref(line2)?,
                value: *value,
            },
            ConstraintSpec::EqualLength { line1, line2 } => ConstraintKind::EqualLength {
                line1: line_ref(line1)?,
                line2: line_ref(line2)?,
            },
            ConstraintSpec::LineLength { line, value } => ConstraintKind::LineLength {
                line: line_ref(line)?,
                value: *value,
            },
        })
    }
}

/// The build-time-resolved constraint, as the engine consumes it: every
/// line reference has already been expanded to its two endpoint points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ConstraintKind {
    Distance {
        p1: PrimitiveId,
        p2: PrimitiveId,
        value: f64,
    },
    Horizontal {
        p1: PrimitiveId,
        p2: PrimitiveId,
    },
    Vertical {
        p1: PrimitiveId,
        p2: PrimitiveId,
    },
    Coincident {
        p1: PrimitiveId,
        p2: PrimitiveId,
    },
    CoordinateX {
        p: PrimitiveId,
        value: f64,
    },
    CoordinateY {
        p: PrimitiveId,
        value: f64,
    },
    Parallel {
        line1: LineRef,
        line2: LineRef,
    },
    Perpendicular {
        line1: LineRef,
        line2: LineRef,
    },
    Angle {
        line1: LineRef,
        line2: LineRef,
        value: f64,
    },
    EqualLength {
        line1: LineRef,
        line2: LineRef,
    },
    LineLength {
        line: LineRef,
        value: f64,
    },
}

impl ConstraintKind {
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintKind::Distance { .. } => "Distance",
            ConstraintKind::Horizontal { .. } => "Horizontal",
            ConstraintKind::Vertical { .. } => "Vertical",
            ConstraintKind::Coincident { .. } => "Coincident",
            ConstraintKind::CoordinateX { .. } => "CoordinateX",
            ConstraintKind::CoordinateY { .. } => "CoordinateY",
            ConstraintKind::Parallel { .. } => "Parallel",
            ConstraintKind::Perpendicular { .. } => "Perpendicular",
            ConstraintKind::Angle { .. } => "Angle",
            ConstraintKind::EqualLength { .. } => "EqualLength",
            ConstraintKind::LineLength { .. } => "LineLength",
        }
    }

    /// All primitive ids this constraint reads, in a stable order, for
    /// diagnostic reporting.
    pub fn participant_ids(&self) -> Vec<PrimitiveId> {
        match self {
            ConstraintKind::Distance { p1, p2, .. }
            | ConstraintKind::Horizontal { p1, p2 }
            | ConstraintKind::Vertical { p1, p2 }
            | ConstraintKind::Coincident { p1, p2 } => vec![p1.clone(), p2.clone()],
            ConstraintKind::CoordinateX { p, .. } | ConstraintKind::CoordinateY { p, .. } => {
                vec![p.clone()]
            }
            ConstraintKind::Parallel { line1, line2 }
            | ConstraintKind::Perpendicular { line1, line2 }
            | ConstraintKind::EqualLength { line1, line2 } => {
                vec![line1.line_id.clone(), line2.line_id.clone()]
            }
            ConstraintKind::Angle { line1, line2, .. } => {
                vec![line1.line_id.clone(), line2.line_id.clone()]
            }
            ConstraintKind::LineLength { line, .. } => vec![line.line_id.clone()],
        }
    }

    /// The skip-correction-this-iteration tolerance for this constraint kind.
    pub fn tolerance(&self) -> f64 {
        match self {
            ConstraintKind::Distance { .. }
            | ConstraintKind::Coincident { .. }
            | ConstraintKind::CoordinateX { .. }
            | ConstraintKind::CoordinateY { .. }
            | ConstraintKind::EqualLength { .. }
            | ConstraintKind::LineLength { .. } => 0.1,
            ConstraintKind::Horizontal { .. } | ConstraintKind::Vertical { .. } => 0.1,
            ConstraintKind::Parallel { .. } | ConstraintKind::Perpendicular { .. } => 0.5,
            ConstraintKind::Angle { .. } => 0.01,
        }
    }

    /// `|r|` (or, for `Coincident`, the Euclidean gap). Never NaN: points
    /// missing from the table (should not happen post-build) are treated as
    /// the origin rather than panicking.
    pub fn error(&self, points: &PointTable) -> f64 {
        let at = |id: &PrimitiveId| points.get(id).unwrap_or(super::points::PointCoords {
            x: 0.0,
            y: 0.0,
            fixed: false,
        });

        match self {
            ConstraintKind::Distance { p1, p2, value } => {
                let (a, b) = (at(p1), at(p2));
                (dist(a.x, a.y, b.x, b.y) - value).abs()
            }
            ConstraintKind::Horizontal { p1, p2 } => {
                let (a, b) = (at(p1), at(p2));
                (b.y - a.y).abs()
            }
            ConstraintKind::Vertical { p1, p2 } => {
                let (a, b) = (at(p1), at(p2));
                (b.x - a.x).abs()
            }
            ConstraintKind::Coincident { p1, p2 } => {
                let (a, b) = (at(p1), at(p2));
                dist(a.x, a.y, b.x, b.y)
            }
            ConstraintKind::CoordinateX { p, value } => (at(p).x - value).abs(),
            ConstraintKind::CoordinateY { p, value } => (at(p).y - value).abs(),
            ConstraintKind::Parallel { line1, line2 } => {
                let (a, b, c, d) = (at(&line1.p1), at(&line1.p2), at(&line2.p1), at(&line2.p2));
                ((b.x - a.x) * (d.y - c.y) - (b.y - a.y) * (d.x - c.x)).abs()
            }
            ConstraintKind::Perpendicular { line1, line2 } => {
                let (a, b, c, d) = (at(&line1.p1), at(&line1.p2), at(&line2.p1), at(&line2.p2));
                ((b.x - a.x) * (d.x - c.x) + (b.y - a.y) * (d.y - c.y)).abs()
            }
            ConstraintKind::Angle { line1, line2, value } => {
                let a1 = line_angle(at(&line1.p1), at(&line1.p2));
                let a2 = line_angle(at(&line2.p1), at(&line2.p2));
                normalize_angle((a2 - a1) - value).abs()
            }
            ConstraintKind::EqualLength { line1, line2 } => {
                let l1 = dist_p(at(&line1.p1), at(&line1.p2));
                let l2 = dist_p(at(&line2.p1), at(&line2.p2));
                (l1 - l2).abs()
            }
            ConstraintKind::LineLength { line, value } => {
                (dist_p(at(&line.p1), at(&line.p2)) - value).abs()
            }
        }
    }

    /// Mutates the participating non-fixed points to reduce `|r|`, per this
    /// variant's correction rule. Returns the error value *before* this
    /// correction was applied (what the engine sums into `total_error`), so
    /// a skipped-because-already-satisfied constraint still contributes its
    /// (near-zero) error honestly.
    pub fn apply_correction(&self, points: &mut PointTable, step: f64, seed: u64) -> f64 {
        let err = self.error(points);
        if err < self.tolerance() {
            return err;
        }

        match self {
            ConstraintKind::Distance { p1, p2, value } => {
                apply_length_correction(points, p1, p2, *value, step, seed);
            }
            ConstraintKind::Horizontal { p1, p2 } => {
                let (a, b) = (points.get(p1), points.get(p2));
                if let (Some(a), Some(b)) = (a, b) {
                    let r = b.y - a.y;
                    let delta = r * step * 0.5;
                    if !a.fixed {
                        points.update(p1, a.x, a.y + delta);
                    }
                    if !b.fixed {
                        points.update(p2, b.x, b.y - delta);
                    }
                }
            }
            ConstraintKind::Vertical { p1, p2 } => {
                let (a, b) = (points.get(p1), points.get(p2));
                if let (Some(a), Some(b)) = (a, b) {
                    let r = b.x - a.x;
                    let delta = r * step * 0.5;
                    if !a.fixed {
                        points.update(p1, a.x + delta, a.y);
                    }
                    if !b.fixed {
                        points.update(p2, b.x - delta, b.y);
                    }
                }
            }
            ConstraintKind::Coincident { p1, p2 } => {
                let (a, b) = (points.get(p1), points.get(p2));
                if let (Some(a), Some(b)) = (a, b) {
                    let t = step * 0.5;
                    if !a.fixed {
                        points.update(p1, a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t);
                    }
                    if !b.fixed {
                        points.update(p2, b.x + (a.x - b.x) * t, b.y + (a.y - b.y) * t);
                    }
                }
            }
            ConstraintKind::CoordinateX { p, value } => {
                if let Some(pt) = points.get(p) {
                    if !pt.fixed {
                        let r = pt.x - value;
                        points.update(p, pt.x - r * step, pt.y);
                    }
                }
            }
            ConstraintKind::CoordinateY { p, value } => {
                if let Some(pt) = points.get(p) {
                    if !pt.fixed {
                        let r = pt.y - value;
                        points.update(p, pt.x, pt.y - r * step);
                    }
                }
            }
            ConstraintKind::Parallel { line1, line2 } => {
                let target = line_angle(
                    points.get(&line1.p1).unwrap_or_default_coords(),
                    points.get(&line1.p2).unwrap_or_default_coords(),
                );
                rotate_line_toward(points, line2, target, step);
            }
            ConstraintKind::Perpendicular { line1, line2 } => {
                let target = line_angle(
                    points.get(&line1.p1).unwrap_or_default_coords(),
                    points.get(&line1.p2).unwrap_or_default_coords(),
                ) + PI / 2.0;
                rotate_line_toward(points, line2, target, step);
            }
            ConstraintKind::Angle { line1, line2, value } => {
                let target = line_angle(
                    points.get(&line1.p1).unwrap_or_default_coords(),
                    points.get(&line1.p2).unwrap_or_default_coords(),
                ) + value;
                rotate_line_toward(points, line2, target, step);
            }
            ConstraintKind::EqualLength { line1, line2 } => {
                let target_len = dist_p(
                    points.get(&line1.p1).unwrap_or_default_coords(),
                    points.get(&line1.p2).unwrap_or_default_coords(),
                );
                rescale_line_toward(points, line2, target_len, step);
            }
            ConstraintKind::LineLength { line, value } => {
                apply_length_correction(points, &line.p1, &line.p2, *value, step, seed);
            }
        }

        err
    }
}

trait CoordsOrDefault {
    fn unwrap_or_default_coords(self) -> super::points::PointCoords;
}

impl CoordsOrDefault for Option<super::points::PointCoords> {
    fn unwrap_or_default_coords(self) -> super::points::PointCoords {
        self.unwrap_or(super::points::PointCoords {
            x: 0.0,
            y: 0.0,
            fixed: false,
        })
    }
}

fn dist(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
}

fn dist_p(a: super::points::PointCoords, b: super::points::PointCoords) -> f64 {
    dist(a.x, a.y, b.x, b.y)
}

fn line_angle(a: super::points::PointCoords, b: super::points::PointCoords) -> f64 {
    (b.y - a.y).atan2(b.x - a.x)
}

/// Wraps an angle difference into (-pi, pi].
fn normalize_angle(mut a: f64) -> f64 {
    a %= TAU;
    if a > PI {
        a -= TAU;
    } else if a <= -PI {
        a += TAU;
    }
    a
}

/// A deterministic pseudo-random unit direction derived from a seed (meant
/// to be `iteration * constraint_count + constraint_index`-style), so that
/// two solves of the same input under the same configuration are
/// bit-identical.
fn pseudo_unit_dir(seed: u64) -> (f64, f64) {
    let mut x = seed
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(0xD1B5_4A32_D192_ED03);
    x ^= x >> 33;
    x = x.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    x ^= x >> 33;
    let angle = (x as f64 / u64::MAX as f64) * TAU;
    (angle.cos(), angle.sin())
}

/// Shared distance/length correction: moves the two endpoints along the
/// current connecting unit vector by opposite signed amounts of magnitude
/// `|r| * step * 0.8`, split equally between
/// non-fixed endpoints; a single free endpoint absorbs the full correction.
/// Perturbs along a deterministic pseudo-random direction first if the
/// points are coincident and a nonzero distance is required.
fn apply_length_correction(
    points: &mut PointTable,
    p1: &PrimitiveId,
    p2: &PrimitiveId,
    value: f64,
    step: f64,
    seed: u64,
) {
    let (a, b) = match (points.get(p1), points.get(p2)) {
        (Some(a), Some(b)) => (a, b),
        _ => return,
    };

    let mut dx = b.x - a.x;
    let mut dy = b.y - a.y;
    let mut current = (dx * dx + dy * dy).sqrt();

    if current < DEGENERACY_EPSILON && value > DEGENERACY_EPSILON {
        let (ux, uy) = pseudo_unit_dir(seed);
        dx = ux * DEGENERACY_EPSILON.sqrt();
        dy = uy * DEGENERACY_EPSILON.sqrt();
        current = (dx * dx + dy * dy).sqrt();
    }
    if current < DEGENERACY_EPSILON {
        return;
    }

    let r = current - value;
    let mut magnitude = r.abs() * step * 0.8;
    if r > 0.0 {
        // Shrinking: never let the endpoints cross past one another.
        magnitude = magnitude.min(current * 0.9);
    }
    let sign = -r.signum(); // move apart when current < value, together when current > value
    let ux = dx / current;
    let uy = dy / current;

    let free1 = !a.fixed;
    let free2 = !b.fixed;
    let (share1, share2) = match (free1, free2) {
        (true, true) => (0.5, 0.5),
        (true, false) => (1.0, 0.0),
        (false, true) => (0.0, 1.0),
        (false, false) => (0.0, 0.0),
    };

    if free1 {
        points.update(
            p1,
            a.x - sign * ux * magnitude * share1,
            a.y - sign * uy * magnitude * share1,
        );
    }
    if free2 {
        points.update(
            p2,
            b.x + sign * ux * magnitude * share2,
            b.y + sign * uy * magnitude * share2,
        );
    }
}

/// Picks the pivot/free endpoint pair for a rotation or rescale: the
/// globally fixed endpoint (if exactly one is fixed) always pivots;
/// otherwise `p1` pivots and `p2` is the one that moves, by convention.
fn pivot_and_free(
    points: &PointTable,
    p1: &PrimitiveId,
    p2: &PrimitiveId,
) -> Option<(PrimitiveId, PrimitiveId, bool)> {
    let (a, b) = (points.get(p1)?, points.get(p2)?);
    Some(if b.fixed && !a.fixed {
        (p2.clone(), p1.clone(), true) // pivot is p2, p1 is free, "p1 is the free endpoint"
    } else if a.fixed && b.fixed {
        (p1.clone(), p2.clone(), false) // nothing can move
    } else {
        (p1.clone(), p2.clone(), false) // default: p1 pivots, p2 is free
    })
}

/// Rotates `line`'s free endpoint about its pivot toward `target_angle`
/// (the line's canonical p1->p2 direction), preserving the line's length,
/// interpolating by `step * 0.3`.
fn rotate_line_toward(points: &mut PointTable, line: &LineRef, target_angle: f64, step: f64) {
    let (pivot_id, free_id, free_is_p1) = match pivot_and_free(points, &line.p1, &line.p2) {
        Some(v) => v,
        None => return,
    };
    let pivot = match points.get(&pivot_id) {
        Some(p) => p,
        None => return,
    };
    let free = match points.get(&free_id) {
        Some(p) => p,
        None => return,
    };
    if free.fixed {
        return;
    }

    // Canonical vector is always p1 -> p2; if p1 is the free endpoint the
    // vector we rotate is the negation of pivot->free.
    let (vx, vy) = if free_is_p1 {
        (pivot.x - free.x, pivot.y - free.y)
    } else {
        (free.x - pivot.x, free.y - pivot.y)
    };
    let len = (vx * vx + vy * vy).sqrt();
    if len < DEGENERACY_EPSILON {
        return;
    }

    let current_angle = vy.atan2(vx);
    let delta = normalize_angle(target_angle - current_angle) * step * 0.3;
    let new_angle = current_angle + delta;
    let (nx, ny) = (new_angle.cos() * len, new_angle.sin() * len);

    if free_is_p1 {
        points.update(&free_id, pivot.x - nx, pivot.y - ny);
    } else {
        points.update(&free_id, pivot.x + nx, pivot.y + ny);
    }
}

/// Rescales `line`'s free endpoint about its start point (`p1`) so the
/// line's length approaches `target_len`, interpolating by `step * 0.3`.
fn rescale_line_toward(points: &mut PointTable, line: &LineRef, target_len: f64, step: f64) {
    let (start, end) = match (points.get(&line.p1), points.get(&line.p2)) {
        (Some(a), Some(b)) => (a, b),
        _ => return,
    };
    if end.fixed {
        return;
    }

    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < DEGENERACY_EPSILON {
        return;
    }

    let new_len = len + (target_len - len) * step * 0.3;
    let scale = new_len / len;
    points.update(&line.p2, start.x + dx * scale, start.y + dy * scale);
}
