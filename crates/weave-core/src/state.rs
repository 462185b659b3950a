use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::context_data::ContextData;
use crate::flag::Flag;
use crate::ids::ContextId;
use crate::session::{Session, SystemMessage};
use crate::turn::Turn;

/// Concurrent, id-deduplicating collection of [`ContextData`] items.
///
/// Grounded on the reference codebase's `MemoryStore`: `insert` is a no-op if
/// the id has already been inserted ("first wins"), and `by_id` gives O(1)
/// existence/lookup without scanning `entries`.
#[derive(Debug, Default)]
pub struct TypedCollection {
    inner: Mutex<TypedCollectionInner>,
}

#[derive(Debug, Default)]
struct TypedCollectionInner {
    entries: Vec<ContextData>,
    by_id: HashMap<ContextId, usize>,
}

impl TypedCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `item`. Returns `true` if it was newly inserted, `false` if an
    /// item with the same id was already present (no-op, first insert wins).
    pub fn insert(&self, item: ContextData) -> bool {
        let mut inner = self.inner.lock().expect("TypedCollection mutex poisoned");
        if inner.by_id.contains_key(&item.id) {
            return false;
        }
        let idx = inner.entries.len();
        inner.by_id.insert(item.id, idx);
        inner.entries.push(item);
        true
    }

    pub fn contains(&self, id: ContextId) -> bool {
        let inner = self.inner.lock().expect("TypedCollection mutex poisoned");
        inner.by_id.contains_key(&id)
    }

    /// Read-only chronological (insertion-order) snapshot for the request
    /// builder.
    pub fn snapshot(&self) -> Vec<ContextData> {
        let inner = self.inner.lock().expect("TypedCollection mutex poisoned");
        inner.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("TypedCollection mutex poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A `(property, explanation)` annotation produced by perception analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerceptionRecord {
    pub property: String,
    pub explanation: String,
}

/// Concurrent, dedup-by-value set of [`PerceptionRecord`]s.
#[derive(Debug, Default)]
pub struct PerceptionSet {
    inner: Mutex<PerceptionSetInner>,
}

#[derive(Debug, Default)]
struct PerceptionSetInner {
    order: Vec<PerceptionRecord>,
    seen: HashSet<PerceptionRecord>,
}

impl PerceptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: PerceptionRecord) -> bool {
        let mut inner = self.inner.lock().expect("PerceptionSet mutex poisoned");
        if inner.seen.contains(&record) {
            return false;
        }
        inner.seen.insert(record.clone());
        inner.order.push(record);
        true
    }

    pub fn snapshot(&self) -> Vec<PerceptionRecord> {
        let inner = self.inner.lock().expect("PerceptionSet mutex poisoned");
        inner.order.clone()
    }
}

/// The shared mutable bag populated by enrichers and consumed by the request
/// builder for exactly one turn.
pub struct ConversationState {
    pub session: Session,
    pub current_turn: Turn,
    pub persona: Option<SystemMessage>,
    pub user_profile: Mutex<Option<ContextData>>,
    pub user_name: Mutex<String>,
    pub persona_name: String,

    pub quotes: TypedCollection,
    pub persona_voice_samples: TypedCollection,
    pub memories: TypedCollection,
    pub insights: TypedCollection,
    pub character_profiles: TypedCollection,
    pub generic_data: TypedCollection,

    pub recent_turns: Mutex<Vec<Turn>>,
    pub previous_turn: Mutex<Option<Turn>>,
    pub previous_response: Mutex<String>,

    pub dialogue_log: Mutex<String>,

    pub perceptions: PerceptionSet,

    pub flags: Mutex<Vec<Flag>>,

    pub is_ooc: bool,

    pub gemini_request: Mutex<Option<serde_json::Value>>,
    pub claude_request: Mutex<Option<serde_json::Value>>,
}

impl ConversationState {
    pub fn new(session: Session, current_turn: Turn, persona: Option<SystemMessage>) -> Self {
        let is_ooc = current_turn.input.trim_start().to_lowercase().starts_with("[ooc]");
        let persona_name = persona
            .as_ref()
            .and_then(|p| p.name.clone())
            .unwrap_or_default();
        Self {
            session,
            current_turn,
            persona,
            user_profile: Mutex::new(None),
            user_name: Mutex::new("User".to_string()),
            persona_name,
            quotes: TypedCollection::new(),
            persona_voice_samples: TypedCollection::new(),
            memories: TypedCollection::new(),
            insights: TypedCollection::new(),
            character_profiles: TypedCollection::new(),
            generic_data: TypedCollection::new(),
            recent_turns: Mutex::new(Vec::new()),
            previous_turn: Mutex::new(None),
            previous_response: Mutex::new(String::new()),
            dialogue_log: Mutex::new(String::new()),
            perceptions: PerceptionSet::new(),
            flags: Mutex::new(Vec::new()),
            is_ooc,
            gemini_request: Mutex::new(None),
            claude_request: Mutex::new(None),
        }
    }

    /// Count of distinct ids across every typed collection — used to assert
    /// the cross-collection uniqueness invariant in tests.
    pub fn total_item_count(&self) -> usize {
        self.quotes.len()
            + self.persona_voice_samples.len()
            + self.memories.len()
            + self.insights.len()
            + self.character_profiles.len()
            + self.generic_data.len()
    }

    pub fn set_user_profile(&self, profile: ContextData, user_name: String) {
        *self.user_profile.lock().expect("user_profile mutex poisoned") = Some(profile);
        *self.user_name.lock().expect("user_name mutex poisoned") = user_name;
    }

    /// Every distinct item id referenced across all six typed collections —
    /// used to stamp `usedLastOnTurnId` on commit.
    pub fn all_item_ids(&self) -> Vec<ContextId> {
        [
            &self.quotes,
            &self.persona_voice_samples,
            &self.memories,
            &self.insights,
            &self.character_profiles,
            &self.generic_data,
        ]
        .iter()
        .flat_map(|collection| collection.snapshot())
        .map(|item| item.id)
        .collect()
    }
}
