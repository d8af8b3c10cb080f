//! Data model: the primitives a caller hands to [`super::session::Session::load`]
//! and gets back from [`super::session::Session::extract`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::constraints::ConstraintSpec;

/// Stable string identifier shared by points, lines, circles and constraints.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PrimitiveId(pub String);

impl PrimitiveId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PrimitiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PrimitiveId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PrimitiveId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A mutable 2D point. The solver is the only writer; `fixed` is set once at
/// construction and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: PrimitiveId,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub fixed: bool,
}

impl Point {
    pub fn new(id: impl Into<PrimitiveId>, x: f64, y: f64, fixed: bool) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            fixed,
        }
    }
}

/// A pure reference to two endpoint points. Owns no coordinates of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: PrimitiveId,
    pub p1_id: PrimitiveId,
    pub p2_id: PrimitiveId,
}

/// Present for forward compatibility: the center point and radius are
/// tracked, but no constraint kind in this kernel operates on a circle
/// beyond that stored radius value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub id: PrimitiveId,
    pub center_id: PrimitiveId,
    pub radius: f64,
}

/// An immutable constraint instance, as supplied by the caller. Line
/// references are bare ids; the builder resolves them to endpoint points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: PrimitiveId,
    #[serde(flatten)]
    pub kind: ConstraintSpec,
}

/// The wire-level sum type carried on the input/output primitive list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Primitive {
    Point(Point),
    Line(Line),
    Circle(Circle),
    Constraint(Constraint),
}

impl Primitive {
    pub fn id(&self) -> &PrimitiveId {
        match self {
            Primitive::Point(p) => &p.id,
            Primitive::Line(l) => &l.id,
            Primitive::Circle(c) => &c.id,
            Primitive::Constraint(c) => &c.id,
        }
    }
}
