//! In-memory reference adapter for [`ConversationStore`].
//!
//! Grounded on the reference codebase's `MemoryStore` (index-by-id, no
//! duplicate ids) layered under an optional JSONL event log for
//! crash-recoverable persistence, the same split the reference codebase uses
//! between its in-memory index and its event log.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use weave_core::{
    Availability, ContextData, ContextId, ContextType, Flag, FlagId, ProfileId, Session,
    SessionId, SystemMessage, SystemMessageKind, Turn, TurnId,
};

use crate::event_log::{StoreEvent, StoreEventLog};
use crate::traits::ConversationStore;

pub struct InMemoryStore {
    sessions: RwLock<HashMap<i64, Session>>,
    personas: RwLock<HashMap<i64, SystemMessage>>,
    context_items: RwLock<Vec<ContextData>>,
    turns: RwLock<Vec<Turn>>,
    flags: RwLock<Vec<Flag>>,
    trigger_usage: RwLock<HashMap<ContextId, (u32, DateTime<Utc>)>>,
    next_turn_id: AtomicI64,
    event_log: Option<StoreEventLog>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            personas: RwLock::new(HashMap::new()),
            context_items: RwLock::new(Vec::new()),
            turns: RwLock::new(Vec::new()),
            flags: RwLock::new(Vec::new()),
            trigger_usage: RwLock::new(HashMap::new()),
            next_turn_id: AtomicI64::new(1),
            event_log: None,
        }
    }

    pub fn with_event_log(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            event_log: Some(StoreEventLog::new(path)),
            ..Self::new()
        }
    }

    /// Replay the event log (if configured) to repopulate in-memory state.
    pub async fn replay(&self) -> Result<()> {
        let Some(log) = &self.event_log else {
            return Ok(());
        };
        let events = log.load()?;
        for event in events {
            match event {
                StoreEvent::ContextItemUpserted(item) => {
                    self.apply_context_upsert(item).await;
                }
                StoreEvent::TurnCommitted(turn) => {
                    self.apply_turn_commit(turn).await;
                }
                StoreEvent::FlagUpserted(flag) => {
                    self.apply_flag_upsert(flag).await;
                }
            }
        }
        tracing::info!(path = %log.path().display(), "replayed conversation store event log");
        Ok(())
    }

    pub async fn insert_session(&self, session: Session) {
        self.sessions.write().await.insert(session.id.get(), session);
    }

    pub async fn insert_persona(&self, persona: SystemMessage) {
        self.personas.write().await.insert(persona.id, persona);
    }

    async fn apply_context_upsert(&self, item: ContextData) {
        let mut items = self.context_items.write().await;
        if let Some(existing) = items.iter_mut().find(|existing| existing.id == item.id) {
            *existing = item;
        } else {
            items.push(item);
        }
    }

    async fn apply_turn_commit(&self, turn: Turn) {
        let mut turns = self.turns.write().await;
        if let Some(existing) = turns.iter_mut().find(|existing| existing.id == turn.id) {
            *existing = turn;
        } else {
            if turn.id.get() >= self.next_turn_id.load(Ordering::SeqCst) {
                self.next_turn_id.store(turn.id.get() + 1, Ordering::SeqCst);
            }
            turns.push(turn);
        }
    }

    async fn apply_flag_upsert(&self, flag: Flag) {
        let mut flags = self.flags.write().await;
        if let Some(existing) = flags.iter_mut().find(|existing| existing.id == flag.id) {
            *existing = flag;
        } else {
            flags.push(flag);
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn in_scope(item: &ContextData, active_profile: ProfileId) -> bool {
    item.profile_id.matches_active(active_profile) && item.is_enabled && !item.is_archived
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn get_session(&self, session_id: SessionId) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(&session_id.get()).cloned())
    }

    async fn get_active_persona(&self, profile_id: ProfileId) -> Result<Option<SystemMessage>> {
        Ok(self
            .personas
            .read()
            .await
            .values()
            .find(|p| {
                p.kind == SystemMessageKind::Persona
                    && p.is_active
                    && p.profile_id.matches_active(profile_id)
            })
            .cloned())
    }

    async fn get_active_perception_prompts(&self, profile_id: ProfileId) -> Result<Vec<SystemMessage>> {
        Ok(self
            .personas
            .read()
            .await
            .values()
            .filter(|p| {
                p.kind == SystemMessageKind::Perception
                    && p.is_active
                    && p.profile_id.matches_active(profile_id)
            })
            .cloned()
            .collect())
    }

    async fn get_always_on(&self, profile_id: ProfileId, ty: ContextType) -> Result<Vec<ContextData>> {
        Ok(self
            .context_items
            .read()
            .await
            .iter()
            .filter(|item| {
                item.ty == ty && item.availability == Availability::AlwaysOn && in_scope(item, profile_id)
            })
            .cloned()
            .collect())
    }

    async fn get_active_manual(&self, profile_id: ProfileId, ty: ContextType) -> Result<Vec<ContextData>> {
        Ok(self
            .context_items
            .read()
            .await
            .iter()
            .filter(|item| {
                item.ty == ty
                    && item.availability == Availability::Manual
                    && (item.use_every_turn || item.use_next_turn_only)
                    && in_scope(item, profile_id)
            })
            .cloned()
            .collect())
    }

    async fn get_trigger_candidates(&self, profile_id: ProfileId) -> Result<Vec<ContextData>> {
        Ok(self
            .context_items
            .read()
            .await
            .iter()
            .filter(|item| item.availability == Availability::Trigger && in_scope(item, profile_id))
            .cloned()
            .collect())
    }

    async fn get_semantic_candidates(&self, profile_id: ProfileId, ty: ContextType) -> Result<Vec<ContextData>> {
        Ok(self
            .context_items
            .read()
            .await
            .iter()
            .filter(|item| {
                item.ty == ty && item.availability == Availability::Semantic && in_scope(item, profile_id)
            })
            .cloned()
            .collect())
    }

    async fn get_user_profile(&self, profile_id: ProfileId) -> Result<Option<ContextData>> {
        Ok(self
            .context_items
            .read()
            .await
            .iter()
            .find(|item| {
                item.ty == ContextType::CharacterProfile && item.is_user && in_scope(item, profile_id)
            })
            .cloned())
    }

    async fn get_by_ids(&self, ids: &[ContextId]) -> Result<Vec<ContextData>> {
        let items = self.context_items.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| items.iter().find(|item| item.id == *id).cloned())
            .collect())
    }

    async fn get_by_id(&self, id: ContextId) -> Result<Option<ContextData>> {
        Ok(self.context_items.read().await.iter().find(|item| item.id == id).cloned())
    }

    async fn upsert_context_item(&self, item: ContextData) -> Result<()> {
        self.apply_context_upsert(item.clone()).await;
        if let Some(log) = &self.event_log {
            log.append(StoreEvent::ContextItemUpserted(item)).await?;
        }
        Ok(())
    }

    async fn mark_used_bulk(&self, ids: &[ContextId], turn_id: TurnId) -> Result<()> {
        let mut items = self.context_items.write().await;
        for item in items.iter_mut() {
            if ids.contains(&item.id) {
                item.used_last_on_turn_id = Some(turn_id);
            }
        }
        Ok(())
    }

    async fn record_trigger_activation(&self, id: ContextId, at: DateTime<Utc>) -> Result<()> {
        let mut usage = self.trigger_usage.write().await;
        let entry = usage.entry(id).or_insert((0, at));
        entry.0 += 1;
        entry.1 = at;
        Ok(())
    }

    async fn process_post_turn(&self, turn_id: TurnId) -> Result<usize> {
        let mut items = self.context_items.write().await;
        let mut reverted = 0usize;
        for item in items.iter_mut() {
            if item.use_next_turn_only && item.used_last_on_turn_id == Some(turn_id) {
                if let Some(previous) = item.previous_availability.take() {
                    item.availability = previous;
                }
                item.use_next_turn_only = false;
                reverted += 1;
            }
        }
        Ok(reverted)
    }

    async fn create_turn(&self, session_id: SessionId, input: String) -> Result<Turn> {
        let id = TurnId::new(self.next_turn_id.fetch_add(1, Ordering::SeqCst));
        let turn = Turn::new_pending(id, session_id, input, Utc::now());
        self.turns.write().await.push(turn.clone());
        Ok(turn)
    }

    async fn get_recent_accepted_turns(&self, session_id: SessionId, count: u32) -> Result<Vec<Turn>> {
        let mut accepted: Vec<Turn> = self
            .turns
            .read()
            .await
            .iter()
            .filter(|t| t.session_id == session_id && t.accepted)
            .cloned()
            .collect();
        accepted.sort_by_key(|t| t.created_at);
        let start = accepted.len().saturating_sub(count as usize);
        Ok(accepted[start..].to_vec())
    }

    async fn get_dialogue_log_turns(
        &self,
        session_id: SessionId,
        skip: u32,
        limit: u32,
    ) -> Result<(Vec<Turn>, bool)> {
        let mut accepted: Vec<Turn> = self
            .turns
            .read()
            .await
            .iter()
            .filter(|t| t.session_id == session_id && t.accepted)
            .cloned()
            .collect();
        accepted.sort_by_key(|t| t.created_at);

        let recent_start = accepted.len().saturating_sub(skip as usize);
        let older = &accepted[..recent_start];
        if older.len() > limit as usize {
            let start = older.len() - limit as usize;
            Ok((older[start..].to_vec(), true))
        } else {
            Ok((older.to_vec(), false))
        }
    }

    async fn count_accepted_turns(&self, session_id: SessionId) -> Result<u32> {
        Ok(self
            .turns
            .read()
            .await
            .iter()
            .filter(|t| t.session_id == session_id && t.accepted)
            .count() as u32)
    }

    async fn commit_turn(&self, turn: Turn) -> Result<()> {
        self.apply_turn_commit(turn.clone()).await;
        if let Some(log) = &self.event_log {
            log.append(StoreEvent::TurnCommitted(turn)).await?;
        }
        Ok(())
    }

    async fn get_turns_missing_stripped(&self, limit: u32) -> Result<Vec<Turn>> {
        let mut missing: Vec<Turn> = self
            .turns
            .read()
            .await
            .iter()
            .filter(|t| t.accepted && t.stripped_turn.is_none())
            .cloned()
            .collect();
        missing.sort_by_key(|t| t.created_at);
        missing.truncate(limit as usize);
        Ok(missing)
    }

    async fn update_stripped_turn(&self, turn_id: TurnId, stripped_turn: String) -> Result<()> {
        let mut turns = self.turns.write().await;
        if let Some(turn) = turns.iter_mut().find(|t| t.id == turn_id) {
            turn.stripped_turn = Some(stripped_turn);
        }
        drop(turns);
        if let Some(log) = &self.event_log {
            let turns = self.turns.read().await;
            if let Some(turn) = turns.iter().find(|t| t.id == turn_id).cloned() {
                drop(turns);
                log.append(StoreEvent::TurnCommitted(turn)).await?;
            }
        }
        Ok(())
    }

    async fn get_active_or_constant_flags(&self, profile_id: ProfileId) -> Result<Vec<Flag>> {
        Ok(self
            .flags
            .read()
            .await
            .iter()
            .filter(|f| f.profile_id.matches_active(profile_id) && (f.active || f.constant))
            .cloned()
            .collect())
    }

    async fn deactivate_consumed_flags(&self, ids: &[FlagId], now: DateTime<Utc>) -> Result<()> {
        let mut flags = self.flags.write().await;
        for flag in flags.iter_mut() {
            if ids.contains(&flag.id) {
                if !flag.constant {
                    flag.active = false;
                }
                flag.last_used_at = Some(now);
            }
        }
        Ok(())
    }

    async fn upsert_flag(&self, flag: Flag) -> Result<()> {
        self.apply_flag_upsert(flag.clone()).await;
        if let Some(log) = &self.event_log {
            log.append(StoreEvent::FlagUpserted(flag)).await?;
        }
        Ok(())
    }
}
