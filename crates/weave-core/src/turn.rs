use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{SessionId, TurnId};

/// A single exchange within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub session_id: SessionId,
    pub input: String,
    pub response: Option<String>,
    pub serialized_request: Option<String>,
    /// Compressed form produced out-of-band by the background post-turn
    /// stripper worker. `None` until that worker processes this turn.
    pub stripped_turn: Option<String>,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new_pending(id: TurnId, session_id: SessionId, input: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            session_id,
            input,
            response: None,
            serialized_request: None,
            stripped_turn: None,
            accepted: false,
            created_at: now,
        }
    }

    /// Text to use when this turn appears in the dialogue log or recent-turns
    /// block: the stripped form if present, else raw input/response.
    pub fn display_input(&self) -> &str {
        self.stripped_turn.as_deref().unwrap_or(&self.input)
    }
}
