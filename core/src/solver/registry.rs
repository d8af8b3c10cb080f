//! Primitive Registry: owns the line/circle records ingested during a
//! build, and answers the `lookup_line` / `lookup_circle` half of the
//! builder's reference resolution (`lookup_point` is answered by
//! [`super::points::PointTable`], which already owns point storage).

use std::collections::HashMap;

use super::error::LoadError;
use super::model::{Circle, Line, PrimitiveId};

#[derive(Debug, Default)]
pub struct PrimitiveRegistry {
    lines: HashMap<PrimitiveId, Line>,
    circles: HashMap<PrimitiveId, Circle>,
}

impl PrimitiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_line(&mut self, line: Line) -> bool {
        if self.lines.contains_key(&line.id) {
            return false;
        }
        self.lines.insert(line.id.clone(), line);
        true
    }

    pub fn register_circle(&mut self, circle: Circle) -> bool {
        if self.circles.contains_key(&circle.id) {
            return false;
        }
        self.circles.insert(circle.id.clone(), circle);
        true
    }

    /// Total function over successfully registered line ids: resolves `id`
    /// or reports it as an unknown reference on behalf of `referrer`.
    pub fn lookup_line(&self, referrer: &PrimitiveId, id: &PrimitiveId) -> Result<&Line, LoadError> {
        self.lines.get(id).ok_or_else(|| LoadError::BadReference {
            referrer: referrer.clone(),
            missing_id: id.clone(),
        })
    }

    /// Total function over successfully registered circle ids: resolves
    /// `id` or reports it as an unknown reference on behalf of `referrer`.
    pub fn lookup_circle(
        &self,
        referrer: &PrimitiveId,
        id: &PrimitiveId,
    ) -> Result<&Circle, LoadError> {
        self.circles.get(id).ok_or_else(|| LoadError::BadReference {
            referrer: referrer.clone(),
            missing_id: id.clone(),
        })
    }
}
