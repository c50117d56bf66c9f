//! Segment binding: one placeholder map per row of a repeating region.

use tracing::{debug, error};

use crate::error::{BuildError, Result};
use crate::model::{PlaceholderMap, SegmentRowSet};
use crate::template::TemplateEngine;

/// Outcome of binding a repeating region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentBinding {
    /// The template doesn't define the region. Nothing to merge.
    Absent,

    /// Rows to merge. Never empty.
    Rows(SegmentRowSet),
}

impl SegmentBinding {
    pub fn rows(&self) -> Option<&SegmentRowSet> {
        match self {
            Self::Absent => None,
            Self::Rows(rows) => Some(rows),
        }
    }
}

/// Bind `items` to the region `tag`, one row each, in order.
///
/// A template without the region yields [`SegmentBinding::Absent`] whatever
/// the items. An existing region with no items gets `empty_row` as its only
/// row, so the document shows a blank line rather than nothing.
///
/// A failing `row_builder` aborts with [`BuildError::RowBinding`] carrying
/// the zero-based position of the item.
pub fn bind_segment<E, T, F>(
    engine: &E,
    tag: &str,
    items: &[T],
    empty_row: PlaceholderMap,
    mut row_builder: F,
) -> Result<SegmentBinding>
where
    E: TemplateEngine + ?Sized,
    F: FnMut(&T) -> Result<PlaceholderMap>,
{
    if !engine.has_region(tag) {
        debug!(tag, "template has no region, skipping segment");
        return Ok(SegmentBinding::Absent);
    }

    if items.is_empty() {
        return Ok(SegmentBinding::Rows(SegmentRowSet::new(vec![empty_row])));
    }

    let rows = items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            row_builder(item).map_err(|source| BuildError::RowBinding {
                tag: tag.to_string(),
                position,
                source: Box::new(source),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SegmentBinding::Rows(SegmentRowSet::new(rows)))
}

/// Merge a bound segment into the template. Absent segments are skipped.
pub fn merge_segment<E>(engine: &mut E, tag: &str, binding: &SegmentBinding) -> Result<()>
where
    E: TemplateEngine + ?Sized,
{
    let SegmentBinding::Rows(rows) = binding else {
        return Ok(());
    };
    engine.merge_region(tag, rows).map_err(|source| {
        error!(tag, %source, "template rejected region");
        BuildError::TemplateRegion {
            tag: tag.to_string(),
            source,
        }
    })
}
