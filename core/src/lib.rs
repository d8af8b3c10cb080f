pub mod solver;

pub use solver::{
    Circle, Constraint, ConstraintKind, ConstraintSpec, DiagnosticReport, Line, LoadError,
    LoadResult, Point, Primitive, PrimitiveId, Session, SolveReport, SolveStatus, SolverConfig,
};

pub fn version() -> &'static str {
    "0.1.0"
}
