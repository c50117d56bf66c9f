//! Core data model for inquest.
//!
//! These are read-only snapshots of the records an investigation document
//! draws on: the accident, the investigation itself, its task tree, the
//! people involved, and the organisational elements and risks around them.

mod accident;
mod investigation;
mod organization;
mod person;
mod placeholder;
mod task;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use accident::{AccidentLocation, AccidentMetadata, AccidentRecord};
pub use investigation::InvestigationRecord;
pub use organization::{Company, DigiriskElement, DigiriskStandard, Risk};
pub use person::{Attendance, Signatory, User};
pub use placeholder::{PlaceholderMap, SegmentRowSet};
pub use task::{BranchRole, ContactType, TaskContact, TaskNode, TaskTree};

/// Host row identifier. Zero and negative values mean "not linked".
pub type EntityId = i64;

/// Unix seconds as stored by the host. Zero and negative values mean "not set".
pub type UnixTime = i64;

/// The kinds of record the fetch layer supplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Investigation,
    Accident,
    User,
    Task,
    Element,
    Standard,
    Company,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Investigation => "investigation",
            Self::Accident => "accident",
            Self::User => "user",
            Self::Task => "task",
            Self::Element => "element",
            Self::Standard => "standard",
            Self::Company => "company",
        };
        f.write_str(name)
    }
}
