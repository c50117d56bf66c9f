//! Errors that abort a document build.

use crate::model::{EntityId, EntityKind};
use crate::template::TemplateError;

/// Errors that can occur while assembling or rendering a document.
///
/// Every variant is fatal for the build: nothing is retried, and no
/// partial document is produced.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{kind} not found: {id}")]
    MissingEntity { kind: EntityKind, id: EntityId },

    #[error("malformed task tree under task {task_id}: {reason}")]
    StructuralInvariant { task_id: EntityId, reason: String },

    #[error("segment {tag}: row {position} failed: {source}")]
    RowBinding {
        tag: String,
        position: usize,
        source: Box<BuildError>,
    },

    #[error("template region {tag}: {source}")]
    TemplateRegion { tag: String, source: TemplateError },

    #[error("failed to finalize document: {0}")]
    Finalize(#[source] TemplateError),
}

impl BuildError {
    pub(crate) fn missing(kind: EntityKind, id: EntityId) -> Self {
        Self::MissingEntity { kind, id }
    }
}

pub type Result<T> = core::result::Result<T, BuildError>;
