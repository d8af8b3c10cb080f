//! Load-time error taxonomy for the constraint solver core.
//!
//! Distinct from [`super::engine::SolveStatus`]: these errors abort `load`
//! atomically before a session exists, whereas solve-time outcomes never
//! roll back point mutations.

use thiserror::Error;

use super::model::PrimitiveId;

/// Errors that can occur while ingesting a primitive list.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
    #[error("{referrer} references unknown id {missing_id}")]
    BadReference {
        referrer: PrimitiveId,
        missing_id: PrimitiveId,
    },

    #[error("duplicate primitive id {id}")]
    DuplicateId { id: PrimitiveId },

    #[error("unknown constraint kind {tag}")]
    UnknownConstraintKind { tag: String },

    #[error("invalid primitive list JSON: {detail}")]
    InvalidJson { detail: String },
}

pub type LoadResult<T> = Result<T, LoadError>;
