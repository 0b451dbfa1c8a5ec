//! Conversation state store
//!
//! Maps an active conversation id to its remaining slot list. Concurrent
//! turns for the same conversation id must observe the read-modify-write
//! cycle as atomic, while turns for distinct ids must not serialize against
//! each other. A fixed array of mutex-guarded shards, selected by hashed
//! conversation id, gives per-id exclusion without a global lock; `update`
//! runs a whole turn's state transition inside one shard critical section.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use faq_dialog_core::ConversationState;

const SHARD_COUNT: usize = 16;

struct Entry {
    state: ConversationState,
    last_activity: Instant,
}

/// Sharded in-memory store of active conversation state.
pub struct ConversationStateStore {
    shards: Vec<Mutex<HashMap<String, Entry>>>,
}

impl ConversationStateStore {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, conversation_id: &str) -> &Mutex<HashMap<String, Entry>> {
        let mut hasher = DefaultHasher::new();
        conversation_id.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARD_COUNT]
    }

    /// Snapshot of one conversation's state.
    pub fn get(&self, conversation_id: &str) -> Option<ConversationState> {
        self.shard(conversation_id)
            .lock()
            .get(conversation_id)
            .map(|entry| entry.state.clone())
    }

    /// Replace a conversation's state wholesale.
    pub fn put(&self, conversation_id: &str, state: ConversationState) {
        self.shard(conversation_id).lock().insert(
            conversation_id.to_string(),
            Entry {
                state,
                last_activity: Instant::now(),
            },
        );
    }

    /// Drop all trace of a conversation.
    pub fn remove(&self, conversation_id: &str) {
        self.shard(conversation_id).lock().remove(conversation_id);
    }

    /// Run one atomic read-modify-write cycle for a conversation id.
    ///
    /// The closure receives the current state (if any) and returns the state
    /// to persist (`None` removes the conversation) together with a result
    /// value. No other turn for the same id can interleave with the cycle.
    pub fn update<R>(
        &self,
        conversation_id: &str,
        f: impl FnOnce(Option<ConversationState>) -> (Option<ConversationState>, R),
    ) -> R {
        let mut shard = self.shard(conversation_id).lock();
        let existing = shard.get(conversation_id).map(|entry| entry.state.clone());
        let (next, result) = f(existing);
        match next {
            Some(state) => {
                shard.insert(
                    conversation_id.to_string(),
                    Entry {
                        state,
                        last_activity: Instant::now(),
                    },
                );
            }
            None => {
                shard.remove(conversation_id);
            }
        }
        result
    }

    /// Remove conversations idle for longer than `max_age`. Returns how many
    /// were dropped.
    pub fn cleanup_idle(&self, max_age: Duration) -> usize {
        let mut removed = 0;
        for shard in &self.shards {
            let mut shard = shard.lock();
            let before = shard.len();
            shard.retain(|_, entry| entry.last_activity.elapsed() <= max_age);
            removed += before - shard.len();
        }
        if removed > 0 {
            tracing::info!(removed, "dropped idle conversations");
        }
        removed
    }

    /// Number of active conversations.
    pub fn count(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }
}

impl Default for ConversationStateStore {
    fn default() -> Self {
        Self::new()
    }
}
