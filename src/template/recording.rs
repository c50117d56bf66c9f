//! In-memory engine that records what it is given.

use std::path::PathBuf;

use serde::Serialize;

use super::{BuiltDocument, TemplateEngine, TemplateError};
use crate::model::{PlaceholderMap, SegmentRowSet};

/// Which regions a [`RecordingEngine`] claims to define.
#[derive(Debug, Clone)]
enum Regions {
    All,
    Only(Vec<String>),
}

/// Records merged regions and final fields instead of rendering a document.
///
/// `finalize` renders the recorded bindings as pretty JSON.
#[derive(Debug, Clone)]
pub struct RecordingEngine {
    regions: Regions,
    rejecting: Vec<String>,
    merged: Vec<(String, SegmentRowSet)>,
    fields: Option<PlaceholderMap>,
}

#[derive(Serialize)]
struct Bindings<'a> {
    fields: &'a PlaceholderMap,
    segments: Vec<Segment<'a>>,
    images: &'a [PathBuf],
}

#[derive(Serialize)]
struct Segment<'a> {
    tag: &'a str,
    rows: &'a SegmentRowSet,
}

impl RecordingEngine {
    /// An engine that defines every region it is asked about.
    pub fn permissive() -> Self {
        Self::with(Regions::All)
    }

    /// An engine that defines only the named regions.
    pub fn with_regions<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with(Regions::Only(regions.into_iter().map(Into::into).collect()))
    }

    /// Report `tag` as present but reject any merge into it.
    #[must_use]
    pub fn rejecting(mut self, tag: impl Into<String>) -> Self {
        self.rejecting.push(tag.into());
        self
    }

    /// Rows merged so far for `tag`.
    pub fn merged(&self, tag: &str) -> Option<&SegmentRowSet> {
        self.merged
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, rows)| rows)
    }

    /// Tags merged so far, in merge order.
    pub fn merged_tags(&self) -> Vec<&str> {
        self.merged.iter().map(|(t, _)| t.as_str()).collect()
    }

    /// Fields passed to `finalize`, once it has run.
    pub fn fields(&self) -> Option<&PlaceholderMap> {
        self.fields.as_ref()
    }

    fn with(regions: Regions) -> Self {
        Self {
            regions,
            rejecting: Vec::new(),
            merged: Vec::new(),
            fields: None,
        }
    }
}

impl TemplateEngine for RecordingEngine {
    fn has_region(&self, tag: &str) -> bool {
        if self.rejecting.iter().any(|t| t == tag) {
            return true;
        }
        match &self.regions {
            Regions::All => true,
            Regions::Only(tags) => tags.iter().any(|t| t == tag),
        }
    }

    fn merge_region(&mut self, tag: &str, rows: &SegmentRowSet) -> Result<(), TemplateError> {
        if self.rejecting.iter().any(|t| t == tag) {
            return Err(TemplateError::RegionRejected {
                tag: tag.to_string(),
                reason: "region rejected by engine".to_string(),
            });
        }
        if !self.has_region(tag) {
            return Err(TemplateError::RegionNotFound(tag.to_string()));
        }
        self.merged.push((tag.to_string(), rows.clone()));
        Ok(())
    }

    fn finalize(
        &mut self,
        fields: &PlaceholderMap,
        images: &[PathBuf],
    ) -> Result<BuiltDocument, TemplateError> {
        let bindings = Bindings {
            fields,
            segments: self
                .merged
                .iter()
                .map(|(tag, rows)| Segment { tag, rows })
                .collect(),
            images,
        };
        let content = serde_json::to_string_pretty(&bindings)?;
        self.fields = Some(fields.clone());
        Ok(BuiltDocument::new(content, images))
    }
}
