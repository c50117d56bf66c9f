//! Accident types: the investigated event and where it happened.

use serde::{Deserialize, Serialize};

use super::{EntityId, UnixTime};

/// `external_accident` code for an accident inside the company.
const INTERNAL: u8 = 1;

/// `external_accident` code for an accident at an external company.
const EXTERNAL_COMPANY: u8 = 2;

/// The investigated event, as stored by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccidentRecord {
    pub id: EntityId,
    #[serde(rename = "ref")]
    pub reference: String,
    pub accident_date: UnixTime,

    /// Raw location classification: 1 internal, 2 external company,
    /// anything else a free-text location.
    pub external_accident: u8,
    pub fk_element: EntityId,
    pub fk_standard: EntityId,
    pub fk_soc: EntityId,
    pub accident_location: String,

    pub fk_user_victim: EntityId,
}

/// Where an accident happened, resolved from the raw columns.
///
/// Exactly one variant applies per accident. Columns that don't belong
/// to the chosen variant are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccidentLocation {
    /// Internal, at a linked organisational element.
    Element(EntityId),

    /// Internal, with no element linked: falls back to the standard record.
    Standard(EntityId),

    /// At an external company.
    Company(EntityId),

    /// Anywhere else, described in free text.
    FreeText(String),
}

impl AccidentRecord {
    /// Classify the accident's location.
    pub fn location(&self) -> AccidentLocation {
        match self.external_accident {
            INTERNAL if self.fk_element > 0 => AccidentLocation::Element(self.fk_element),
            INTERNAL => AccidentLocation::Standard(self.fk_standard),
            EXTERNAL_COMPANY => AccidentLocation::Company(self.fk_soc),
            _ => AccidentLocation::FreeText(self.accident_location.clone()),
        }
    }
}

/// The active metadata row attached to an accident.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccidentMetadata {
    pub fk_accident: EntityId,
    pub relative_location: String,
}
