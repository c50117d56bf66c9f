//! People: users (victims, task executives) and investigation signatories.

use serde::{Deserialize, Serialize};

use super::{EntityId, UnixTime};

/// A host user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: EntityId,
    pub lastname: String,
    pub firstname: String,
    pub job: String,
    pub date_employment: UnixTime,
}

/// A person recorded as having attended or signed the investigation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Signatory {
    pub lastname: String,
    pub firstname: String,
    pub job: String,
    pub role: String,
    pub signature_date: UnixTime,
    pub attendance: Attendance,
}

/// Whether a signatory was there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Attendance {
    #[default]
    Present,
    Delayed,
    Absent,
}
