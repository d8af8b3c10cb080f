//! Point Table: the single source of truth for free variables the solver
//! mutates. Backed by a vector (for stable iteration/snapshot order) plus an
//! id-to-index map (for O(1) random access), the same shape the teacher's
//! solve loop builds ad hoc per call (`id_map` in `SketchSolver::solve`),
//! generalized here into an owned, reusable table.

use std::collections::HashMap;

use super::error::LoadError;
use super::model::PrimitiveId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointCoords {
    pub x: f64,
    pub y: f64,
    pub fixed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PointTable {
    ids: Vec<PrimitiveId>,
    coords: Vec<PointCoords>,
    index: HashMap<PrimitiveId, usize>,
}

impl PointTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new point. Fails (returns `false`) on duplicate id; callers
    /// ingesting untrusted input should check `contains` first so they can
    /// raise `LoadError::DuplicateId` with full context.
    pub fn add(&mut self, id: PrimitiveId, x: f64, y: f64, fixed: bool) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }
        let idx = self.ids.len();
        self.index.insert(id.clone(), idx);
        self.ids.push(id);
        self.coords.push(PointCoords { x, y, fixed });
        true
    }

    pub fn contains(&self, id: &PrimitiveId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &PrimitiveId) -> Option<PointCoords> {
        self.index.get(id).map(|&idx| self.coords[idx])
    }

    /// Total function over successfully ingested point ids: resolves `id`
    /// or reports it as an unknown reference on behalf of `referrer`.
    pub fn lookup_point(
        &self,
        referrer: &PrimitiveId,
        id: &PrimitiveId,
    ) -> Result<PointCoords, LoadError> {
        self.get(id).ok_or_else(|| LoadError::BadReference {
            referrer: referrer.clone(),
            missing_id: id.clone(),
        })
    }

    /// Writes new coordinates for a point. No-op when the point is fixed.
    pub fn update(&mut self, id: &PrimitiveId, x: f64, y: f64) {
        if let Some(&idx) = self.index.get(id) {
            if !self.coords[idx].fixed {
                self.coords[idx].x = x;
                self.coords[idx].y = y;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// A consistent, order-preserving copy of all point coordinates, used
    /// for result extraction.
    pub fn snapshot(&self) -> Vec<(PrimitiveId, PointCoords)> {
        self.ids
            .iter()
            .cloned()
            .zip(self.coords.iter().copied())
            .collect()
    }

    pub fn iter_ids(&self) -> impl Iterator<Item = &PrimitiveId> {
        self.ids.iter()
    }
}
