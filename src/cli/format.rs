//! Output formatting for CLI display.

use inquest::BuiltDocument;

/// One-line summary of a built document.
pub(super) fn describe_document(document: &BuiltDocument) -> String {
    let short_id = &document.id.to_string()[..8];
    match document.images.len() {
        0 => format!("Built document {short_id}"),
        1 => format!("Built document {short_id} (1 image)"),
        n => format!("Built document {short_id} ({n} images)"),
    }
}
