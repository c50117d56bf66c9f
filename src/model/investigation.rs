//! Investigation types: the document being built.

use serde::{Deserialize, Serialize};

use super::{EntityId, UnixTime};

/// An accident investigation.
///
/// References exactly one accident and one root task, under which the
/// curative and preventive action branches are filed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestigationRecord {
    pub id: EntityId,
    #[serde(rename = "ref")]
    pub reference: String,
    pub fk_accident: EntityId,
    pub fk_task: EntityId,

    pub date_start: UnixTime,
    pub date_end: UnixTime,

    /// When the victim took up their current post.
    pub seniority_at_post: UnixTime,

    pub victim_skills: String,
    pub collective_equipment: String,
    pub individual_equipment: String,
    pub circumstances: String,
    pub note_public: String,

    /// File name of the causality tree image, if one was uploaded.
    pub causality_tree: Option<String>,
}
