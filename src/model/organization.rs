//! Organisation types: elements, standards, companies, and their risks.

use serde::{Deserialize, Serialize};

use super::EntityId;

/// A node of the organisational hierarchy (group or work unit).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DigiriskElement {
    pub id: EntityId,
    #[serde(rename = "ref")]
    pub reference: String,
    pub label: String,
    pub parent: Option<EntityId>,
}

/// The root standard record of the organisation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DigiriskStandard {
    pub id: EntityId,
    #[serde(rename = "ref")]
    pub reference: String,
}

/// A third-party company.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Company {
    pub id: EntityId,
    pub name: String,
}

/// An assessed risk attached to an element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Risk {
    pub id: EntityId,
    #[serde(rename = "ref")]
    pub reference: String,
    pub fk_element: EntityId,
    pub category: String,
    pub description: String,

    /// Latest evaluation score, 0 to 100.
    pub cotation: u32,

    /// Elements this risk is shared into, besides the one it was
    /// assessed on.
    pub shared_with: Vec<EntityId>,
}

impl Risk {
    /// Cotation level (1 to 4) that selects the document region.
    pub fn level(&self) -> u8 {
        match self.cotation {
            0..=47 => 1,
            48..=50 => 2,
            51..=79 => 3,
            _ => 4,
        }
    }
}
