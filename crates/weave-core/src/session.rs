use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ProfileId, SessionId};

/// A persistent conversation session, read-only from the pipeline's
/// perspective (session CRUD is an external collaborator).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub profile_id: ProfileId,
    pub active_persona_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Which kind of system-message record a [`SystemMessage`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemMessageKind {
    Persona,
    Perception,
}

/// A read-only system-message record (persona content, or a perception
/// analyzer prompt). System-message CRUD is an external collaborator; the
/// pipeline only ever reads active records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMessage {
    pub id: i64,
    pub profile_id: ProfileId,
    pub kind: SystemMessageKind,
    pub name: Option<String>,
    pub content: String,
    pub is_active: bool,
}
