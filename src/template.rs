//! The boundary with the template-merge engine.
//!
//! The assembler never renders anything itself. It asks the engine which
//! repeating regions the template defines, hands it bound rows for each,
//! and finally the flat placeholder map plus embedded image paths.
//!
//! Two engines ship with the crate:
//!
//! - [`TextTemplate`]: plain-text handlebars templates, with `{{key}}`
//!   placeholders and `{{#each tag}}` repeating regions.
//! - [`RecordingEngine`]: keeps every binding in memory and renders them
//!   as JSON. Used by tests and by `inquest render` without a template.

mod recording;
mod text;

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use uuid::Uuid;

use crate::model::{PlaceholderMap, SegmentRowSet};

pub use recording::RecordingEngine;
pub use text::TextTemplate;

/// Errors reported by a template engine.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("region not found: {0}")]
    RegionNotFound(String),

    #[error("region rejected: {tag}: {reason}")]
    RegionRejected { tag: String, reason: String },

    #[error("malformed template: {0}")]
    Malformed(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A template-merge engine.
pub trait TemplateEngine {
    /// Whether the template defines a repeating region named `tag`.
    fn has_region(&self, tag: &str) -> bool;

    /// Render `rows` into the region named `tag`.
    fn merge_region(&mut self, tag: &str, rows: &SegmentRowSet) -> Result<(), TemplateError>;

    /// Substitute the remaining flat placeholders and produce the document.
    fn finalize(
        &mut self,
        fields: &PlaceholderMap,
        images: &[PathBuf],
    ) -> Result<BuiltDocument, TemplateError>;
}

/// A finished document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltDocument {
    pub id: Uuid,
    pub content: String,
    pub images: Vec<PathBuf>,
}

impl BuiltDocument {
    pub(crate) fn new(content: String, images: &[PathBuf]) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            images: images.to_vec(),
        }
    }
}
