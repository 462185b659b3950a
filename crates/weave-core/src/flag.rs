use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{FlagId, ProfileId};

/// An active/constant directive surfaced in the current prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flag {
    pub id: FlagId,
    pub value: String,
    pub active: bool,
    pub constant: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub profile_id: ProfileId,
}

impl Flag {
    /// The timestamp the ordering rule sorts by: `lastUsedAt` if the flag
    /// has ever been consumed, else `createdAt`.
    pub fn ordering_timestamp(&self) -> DateTime<Utc> {
        self.last_used_at.unwrap_or(self.created_at)
    }
}
