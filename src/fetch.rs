//! The fetch layer: where assembled records come from.
//!
//! The assembler reads everything through [`EntityStore`]. Lookups by id
//! fail with [`BuildError::MissingEntity`] naming the kind and id; list
//! lookups return an empty list when nothing matches. Repeated fetches of
//! the same id must return the same data for the duration of a build.
//!
//! [`Snapshot`] is a JSON document holding every record a build needs:
//!
//! ```text
//! { "investigations": [...], "accidents": [...], "tasks": [...], ... }
//! ```

use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};
use crate::model::{
    AccidentMetadata, AccidentRecord, Company, DigiriskElement, DigiriskStandard, EntityId,
    EntityKind, InvestigationRecord, Risk, Signatory, TaskNode, User,
};

/// Read access to the host's records.
pub trait EntityStore {
    fn investigation(&self, id: EntityId) -> Result<InvestigationRecord>;
    fn accident(&self, id: EntityId) -> Result<AccidentRecord>;

    /// The active metadata row of an accident, if one exists.
    fn accident_metadata(&self, accident: EntityId) -> Result<Option<AccidentMetadata>>;

    fn user(&self, id: EntityId) -> Result<User>;
    fn task(&self, id: EntityId) -> Result<TaskNode>;

    /// Direct children of a task, in rank order.
    fn child_tasks(&self, parent: EntityId) -> Result<Vec<TaskNode>>;

    fn signatories(&self, investigation: EntityId) -> Result<Vec<Signatory>>;
    fn element(&self, id: EntityId) -> Result<DigiriskElement>;
    fn element_children(&self, parent: EntityId) -> Result<Vec<DigiriskElement>>;
    fn standard(&self, id: EntityId) -> Result<DigiriskStandard>;
    fn company(&self, id: EntityId) -> Result<Company>;

    /// Every risk assessed on an element, shared into others or not.
    fn risks_of_element(&self, element: EntityId) -> Result<Vec<Risk>>;

    /// Risks assessed on other elements and shared into this one.
    fn shared_risks_of_element(&self, element: EntityId) -> Result<Vec<Risk>>;
}

/// Errors that can occur loading a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Signatories recorded for one investigation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatoryList {
    pub investigation: EntityId,
    pub signatories: Vec<Signatory>,
}

/// Every record a build needs, held in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub investigations: Vec<InvestigationRecord>,
    pub accidents: Vec<AccidentRecord>,
    pub accident_metadata: Vec<AccidentMetadata>,
    pub users: Vec<User>,
    pub tasks: Vec<TaskNode>,
    pub signatories: Vec<SignatoryList>,
    pub elements: Vec<DigiriskElement>,
    pub standards: Vec<DigiriskStandard>,
    pub companies: Vec<Company>,
    pub risks: Vec<Risk>,
}

impl Snapshot {
    /// Read a snapshot from a JSON file.
    pub fn load(path: &Path) -> core::result::Result<Self, SnapshotError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn find<T: Clone>(
    records: &[T],
    kind: EntityKind,
    id: EntityId,
    id_of: impl Fn(&T) -> EntityId,
) -> Result<T> {
    records
        .iter()
        .find(|r| id_of(*r) == id)
        .cloned()
        .ok_or_else(|| BuildError::missing(kind, id))
}

impl EntityStore for Snapshot {
    fn investigation(&self, id: EntityId) -> Result<InvestigationRecord> {
        find(&self.investigations, EntityKind::Investigation, id, |r| r.id)
    }

    fn accident(&self, id: EntityId) -> Result<AccidentRecord> {
        find(&self.accidents, EntityKind::Accident, id, |r| r.id)
    }

    fn accident_metadata(&self, accident: EntityId) -> Result<Option<AccidentMetadata>> {
        Ok(self
            .accident_metadata
            .iter()
            .find(|m| m.fk_accident == accident)
            .cloned())
    }

    fn user(&self, id: EntityId) -> Result<User> {
        find(&self.users, EntityKind::User, id, |r| r.id)
    }

    fn task(&self, id: EntityId) -> Result<TaskNode> {
        find(&self.tasks, EntityKind::Task, id, |r| r.id)
    }

    fn child_tasks(&self, parent: EntityId) -> Result<Vec<TaskNode>> {
        Ok(self
            .tasks
            .iter()
            .filter(|t| t.parent == Some(parent))
            .cloned()
            .collect())
    }

    fn signatories(&self, investigation: EntityId) -> Result<Vec<Signatory>> {
        Ok(self
            .signatories
            .iter()
            .find(|l| l.investigation == investigation)
            .map(|l| l.signatories.clone())
            .unwrap_or_default())
    }

    fn element(&self, id: EntityId) -> Result<DigiriskElement> {
        find(&self.elements, EntityKind::Element, id, |r| r.id)
    }

    fn element_children(&self, parent: EntityId) -> Result<Vec<DigiriskElement>> {
        Ok(self
            .elements
            .iter()
            .filter(|e| e.parent == Some(parent))
            .cloned()
            .collect())
    }

    fn standard(&self, id: EntityId) -> Result<DigiriskStandard> {
        find(&self.standards, EntityKind::Standard, id, |r| r.id)
    }

    fn company(&self, id: EntityId) -> Result<Company> {
        find(&self.companies, EntityKind::Company, id, |r| r.id)
    }

    fn risks_of_element(&self, element: EntityId) -> Result<Vec<Risk>> {
        Ok(self
            .risks
            .iter()
            .filter(|r| r.fk_element == element)
            .cloned()
            .collect())
    }

    fn shared_risks_of_element(&self, element: EntityId) -> Result<Vec<Risk>> {
        Ok(self
            .risks
            .iter()
            .filter(|r| r.fk_element != element && r.shared_with.contains(&element))
            .cloned()
            .collect())
    }
}
