//! Task types: the action tree filed under an investigation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{EntityId, UnixTime};
use crate::error::BuildError;

/// A node in a task tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskNode {
    pub id: EntityId,
    pub parent: Option<EntityId>,
    #[serde(rename = "ref")]
    pub reference: String,
    pub description: String,
    pub budget: Decimal,
    pub due_date: UnixTime,

    /// Set on the two direct children of an investigation's root task.
    pub role: Option<BranchRole>,

    pub contacts: Vec<TaskContact>,
}

impl TaskNode {
    /// The first user assigned as executive, if any.
    pub fn executive(&self) -> Option<EntityId> {
        self.contacts
            .iter()
            .find(|c| c.kind == ContactType::TaskExecutive)
            .map(|c| c.user)
    }
}

/// Which action branch a task heads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BranchRole {
    /// Corrective actions addressing this accident.
    Curative,

    /// Actions preventing it from happening again.
    Preventive,
}

impl BranchRole {
    /// Template region name for this branch's rows.
    pub fn segment_tag(self) -> &'static str {
        match self {
            Self::Curative => "cur_task",
            Self::Preventive => "prev_task",
        }
    }
}

/// A user linked to a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskContact {
    pub user: EntityId,
    pub kind: ContactType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactType {
    TaskExecutive,
    TaskContributor,
}

/// An investigation's root task with its two role-tagged branches.
///
/// Construction fails unless the root has exactly two children, one
/// curative and one preventive. Branches are found by role, not position.
#[derive(Debug, Clone)]
pub struct TaskTree {
    root: TaskNode,
    curative: TaskNode,
    preventive: TaskNode,
}

impl TaskTree {
    pub fn new(root: TaskNode, children: Vec<TaskNode>) -> Result<Self, BuildError> {
        let root_id = root.id;
        let invariant = |reason: String| BuildError::StructuralInvariant {
            task_id: root_id,
            reason,
        };

        if children.len() != 2 {
            return Err(invariant(format!(
                "expected 2 branch tasks, found {}",
                children.len()
            )));
        }

        let mut curative = None;
        let mut preventive = None;
        for child in children {
            let slot = match child.role {
                Some(BranchRole::Curative) => &mut curative,
                Some(BranchRole::Preventive) => &mut preventive,
                None => {
                    return Err(invariant(format!(
                        "branch task {} has no role",
                        child.id
                    )));
                }
            };
            if slot.is_some() {
                return Err(invariant(format!(
                    "branch task {} repeats an existing role",
                    child.id
                )));
            }
            *slot = Some(child);
        }

        // Two children with distinct roles fill both slots.
        let (Some(curative), Some(preventive)) = (curative, preventive) else {
            return Err(invariant("missing branch role".to_string()));
        };

        Ok(Self {
            root,
            curative,
            preventive,
        })
    }

    pub fn root(&self) -> &TaskNode {
        &self.root
    }

    pub fn branch(&self, role: BranchRole) -> &TaskNode {
        match role {
            BranchRole::Curative => &self.curative,
            BranchRole::Preventive => &self.preventive,
        }
    }
}
