//! 2D parametric geometric constraint solver.
//!
//! Submodule layout mirrors the pipeline a caller drives through
//! [`Session`]: `model` (wire types) -> `builder` (ingest/resolve) ->
//! `points` + `registry` (storage) -> `constraints` (the catalog) ->
//! `engine` (the iterative corrector) -> `diagnostics` (post-solve report).

pub mod builder;
pub mod constraints;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod model;
pub mod points;
pub mod registry;
mod ring_buffer;
pub mod session;

pub use builder::BuiltModel;
pub use constraints::{ConstraintKind, ConstraintSpec, LineRef};
pub use diagnostics::{DiagnosticReport, ResidualEntry};
pub use engine::{Algorithm, SolveReport, SolveStatus, SolverConfig};
pub use error::{LoadError, LoadResult};
pub use model::{Circle, Constraint, Line, Point, Primitive, PrimitiveId};
pub use points::{PointCoords, PointTable};
pub use registry::PrimitiveRegistry;
pub use session::Session;
