//! Session: the top-level API a caller drives. Wraps the
//! load/configure/solve/extract/clear lifecycle in an owned handle rather
//! than threading loose state between free functions.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serde_json::Value;

use super::builder::{self, BuiltModel};
use super::constraints::ConstraintSpec;
use super::diagnostics::{self, DiagnosticReport};
use super::engine::{self, SolveReport, SolverConfig};
use super::error::{LoadError, LoadResult};
use super::model::{Point, Primitive, PrimitiveId};

/// Owns a built sketch model and its solver configuration across a
/// load -> configure -> solve -> extract lifecycle. Not `Sync`; a caller
/// wanting a cancellable solve from another thread should clone the
/// `Arc<AtomicBool>` it hands to [`Session::solve_cancellable`] before
/// moving the session (or its results) across threads.
pub struct Session {
    model: Option<BuiltModel>,
    config: SolverConfig,
    last_report: Option<SolveReport>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            model: None,
            config: SolverConfig::default(),
            last_report: None,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a primitive list, replacing any previously loaded model.
    /// Atomic: on failure the session's prior state (if any) is untouched.
    pub fn load(&mut self, primitives: Vec<Primitive>) -> LoadResult<()> {
        let built = builder::ingest(primitives)?;
        self.model = Some(built);
        self.last_report = None;
        Ok(())
    }

    /// Loads from a raw JSON array of primitives. Unlike [`Session::load`],
    /// this path can receive a constraint with a `"kind"` tag the typed enum
    /// doesn't recognize; it is checked against
    /// [`ConstraintSpec::KNOWN_KINDS`] up front and reported as
    /// `LoadError::UnknownConstraintKind` instead of a generic JSON parse
    /// failure, since a closed Rust enum has no "unknown variant" case to
    /// deserialize into.
    pub fn load_json(&mut self, raw: &str) -> LoadResult<()> {
        let values: Vec<Value> = serde_json::from_str(raw)
            .map_err(|e| LoadError::InvalidJson { detail: e.to_string() })?;

        for value in &values {
            if value.get("type").and_then(Value::as_str) == Some("Constraint") {
                let tag = value.get("kind").and_then(Value::as_str).unwrap_or("");
                if !ConstraintSpec::KNOWN_KINDS.contains(&tag) {
                    return Err(LoadError::UnknownConstraintKind {
                        tag: tag.to_string(),
                    });
                }
            }
        }

        let primitives: Vec<Primitive> = values
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()
            .map_err(|e| LoadError::InvalidJson { detail: e.to_string() })?;

        self.load(primitives)
    }

    pub fn configure(&mut self, config: SolverConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Runs the solver to completion (or cancellation/timeout) over the
    /// currently loaded model. Returns `None` if nothing has been loaded.
    pub fn solve(&mut self) -> Option<SolveReport> {
        self.solve_cancellable(None)
    }

    pub fn solve_cancellable(&mut self, cancel: Option<Arc<AtomicBool>>) -> Option<SolveReport> {
        let model = self.model.as_mut()?;
        let report = engine::solve(&mut model.points, &model.constraints, &self.config, cancel);
        self.last_report = Some(report.clone());
        Some(report)
    }

    /// Returns the original primitive list with point coordinates replaced
    /// by their current (post-solve, or as-loaded) values. `None` if
    /// nothing has been loaded.
    pub fn extract(&self) -> Option<Vec<Primitive>> {
        let model = self.model.as_ref()?;
        let mut latest = std::collections::HashMap::new();
        for (id, coords) in model.points.snapshot() {
            latest.insert(id, coords);
        }

        Some(
            model
                .original
                .iter()
                .cloned()
                .map(|primitive| match primitive {
                    Primitive::Point(p) => {
                        let coords = latest.get(&p.id).copied();
                        match coords {
                            Some(c) => Primitive::Point(Point::new(p.id, c.x, c.y, c.fixed)),
                            None => Primitive::Point(p),
                        }
                    }
                    other => other,
                })
                .collect(),
        )
    }

    /// Diagnostics for the last solve, or `None` if no solve has run yet.
    pub fn diagnostics(&self) -> Option<DiagnosticReport> {
        let model = self.model.as_ref()?;
        let last_report = self.last_report.as_ref()?;
        Some(diagnostics::report(&model.points, &model.constraints, last_report))
    }

    /// Looks up a single point's current coordinates without extracting the
    /// whole primitive list.
    pub fn point_coords(&self, id: &PrimitiveId) -> Option<(f64, f64)> {
        let model = self.model.as_ref()?;
        model.points.get(id).map(|c| (c.x, c.y))
    }

    /// Drops the loaded model and last solve report, returning the session
    /// to its post-`new()` state. Configuration is preserved.
    pub fn clear(&mut self) {
        self.model = None;
        self.last_report = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }
}
