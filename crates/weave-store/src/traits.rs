use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use weave_core::{
    ContextData, ContextId, ContextType, Flag, FlagId, ProfileId, Session, SessionId,
    SystemMessage, Turn, TurnId,
};

/// The port the pipeline programs against for the relational store:
/// persistent storage is an external collaborator, with the query
/// capabilities the enrichers and promptbuilder need. One object implements
/// the full surface, mirroring the reference codebase's single async
/// `MemoryManager` rather than a bundle of single-method traits.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    // ── sessions / personas (read-only external CRUD) ──────────────────────
    async fn get_session(&self, session_id: SessionId) -> Result<Option<Session>>;
    async fn get_active_persona(&self, profile_id: ProfileId) -> Result<Option<SystemMessage>>;
    async fn get_active_perception_prompts(&self, profile_id: ProfileId) -> Result<Vec<SystemMessage>>;

    // ── context items (context-item service) ────────────────────────────────
    async fn get_always_on(&self, profile_id: ProfileId, ty: ContextType) -> Result<Vec<ContextData>>;
    async fn get_active_manual(&self, profile_id: ProfileId, ty: ContextType) -> Result<Vec<ContextData>>;
    async fn get_trigger_candidates(&self, profile_id: ProfileId) -> Result<Vec<ContextData>>;
    async fn get_semantic_candidates(&self, profile_id: ProfileId, ty: ContextType) -> Result<Vec<ContextData>>;
    async fn get_user_profile(&self, profile_id: ProfileId) -> Result<Option<ContextData>>;
    async fn get_by_ids(&self, ids: &[ContextId]) -> Result<Vec<ContextData>>;
    async fn get_by_id(&self, id: ContextId) -> Result<Option<ContextData>>;

    /// Insert or replace a context item wholesale. Used by the external CRUD
    /// surface and by test/demo fixtures — not part of the pipeline's own
    /// per-turn read path.
    async fn upsert_context_item(&self, item: ContextData) -> Result<()>;

    /// Bulk-set `usedLastOnTurnId` for every item referenced in the committed
    /// turn's state.
    async fn mark_used_bulk(&self, ids: &[ContextId], turn_id: TurnId) -> Result<()>;

    /// Record a trigger activation: increments a usage counter and the
    /// per-item trigger-activation timestamp.
    async fn record_trigger_activation(&self, id: ContextId, at: DateTime<Utc>) -> Result<()>;

    /// `processPostTurn`: for every item with
    /// `useNextTurnOnly == true` whose `usedLastOnTurnId == turn_id`, revert
    /// to `previousAvailability` and clear both toggle fields. Returns the
    /// number of items reverted. Idempotent: calling this twice for the same
    /// `turn_id` reverts nothing the second time, since the first call already
    /// cleared `useNextTurnOnly`.
    async fn process_post_turn(&self, turn_id: TurnId) -> Result<usize>;

    // ── turns (TurnHistoryEnricher/DialogueLogEnricher) ─────────────────────
    async fn create_turn(&self, session_id: SessionId, input: String) -> Result<Turn>;

    /// Most recent `count` accepted turns, chronological ascending.
    async fn get_recent_accepted_turns(&self, session_id: SessionId, count: u32) -> Result<Vec<Turn>>;

    /// Accepted turns older than the most recent `skip`, up to `limit` of
    /// them (chronological ascending), plus whether still-older accepted
    /// turns exist beyond `skip + limit` — drives the DialogueLogEnricher's
    /// truncation notice.
    async fn get_dialogue_log_turns(
        &self,
        session_id: SessionId,
        skip: u32,
        limit: u32,
    ) -> Result<(Vec<Turn>, bool)>;

    async fn count_accepted_turns(&self, session_id: SessionId) -> Result<u32>;

    async fn commit_turn(&self, turn: Turn) -> Result<()>;

    /// Accepted turns still missing `strippedTurn`, oldest first, up to
    /// `limit` of them — the background post-turn-stripper worker's queue.
    async fn get_turns_missing_stripped(&self, limit: u32) -> Result<Vec<Turn>>;

    /// Writes back the compressed form produced by the stripper worker.
    async fn update_stripped_turn(&self, turn_id: TurnId, stripped_turn: String) -> Result<()>;

    // ── flags (FlagEnricher, flag consumption) ──────────────────────────────
    async fn get_active_or_constant_flags(&self, profile_id: ProfileId) -> Result<Vec<Flag>>;

    /// Deactivate consumed flags: non-constant flags have `active` cleared;
    /// every flag in `ids` gets `lastUsedAt := now`, regardless of
    /// `constant`.
    async fn deactivate_consumed_flags(&self, ids: &[FlagId], now: DateTime<Utc>) -> Result<()>;

    async fn upsert_flag(&self, flag: Flag) -> Result<()>;
}
