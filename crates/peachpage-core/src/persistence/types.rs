//! Persistence data types.
//!
//! # Data Model Overview
//!
//! Peach Page persists data in three JSON files:
//!
//! ```text
//! <data-dir>/
//! ├── users.json       # All registered users
//! ├── messages.json    # All threads and their messages
//! └── metadata.json    # Id counters and current-thread pointer
//! ```
//!
//! # Design Principles
//!
//! - **Stable thread order**: `messages.json` is an insertion-ordered
//!   object, so thread listings are stable across restarts
//! - **Monotonic ids**: counters only ever grow; deleting a message never
//!   frees its id
//! - **Canonical author field**: messages carry `author` (an early
//!   revision used `name`; that spelling is not read or written)

use std::collections::BTreeMap;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Thread created on first run.
pub const HOME_THREAD: &str = "Home";

// ============================================================================
// User Types
// ============================================================================

/// A registered user, keyed by username in `users.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Stored credential. Plain text under the default scheme (toy project).
    pub password: String,

    /// Whether this user may delete messages.
    #[serde(default)]
    pub admin: bool,
}

/// The full `users.json` document: username → record.
pub type Users = BTreeMap<String, UserRecord>;

// ============================================================================
// Message Types
// ============================================================================

/// A single message in a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Username of the poster.
    pub author: String,

    /// Message body.
    pub content: String,

    /// Unique within the owning thread, assigned from its counter.
    pub id: u64,
}

/// The full `messages.json` document: thread name → ordered message list.
///
/// JSON objects carry key order on disk, and thread listings must follow
/// persisted insertion order, so this is backed by a `Vec` of entries
/// rather than a hash map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadMap {
    entries: Vec<(String, Vec<Message>)>,
}

impl ThreadMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of threads.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Thread names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&[Message]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m.as_slice())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Vec<Message>> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }

    /// Get the message list for `name`, creating an empty thread at the
    /// end of the map if it does not exist yet.
    pub fn messages_mut(&mut self, name: &str) -> &mut Vec<Message> {
        if let Some(idx) = self.entries.iter().position(|(n, _)| n == name) {
            return &mut self.entries[idx].1;
        }
        self.entries.push((name.to_string(), Vec::new()));
        let idx = self.entries.len() - 1;
        &mut self.entries[idx].1
    }

    /// Create an empty thread. Returns `false` without mutation if a
    /// thread with that name already exists.
    pub fn insert_empty(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.entries.push((name.to_string(), Vec::new()));
        true
    }
}

// Serialized as a plain JSON object so the on-disk format stays
// `{"Home": [...], ...}` while key order survives the round trip.
impl Serialize for ThreadMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, messages) in &self.entries {
            map.serialize_entry(name, messages)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ThreadMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ThreadMapVisitor;

        impl<'de> Visitor<'de> for ThreadMapVisitor {
            type Value = ThreadMap;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of thread name to message list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ThreadMap, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, Vec<Message>>()? {
                    entries.push(entry);
                }
                Ok(ThreadMap { entries })
            }
        }

        deserializer.deserialize_map(ThreadMapVisitor)
    }
}

// ============================================================================
// Metadata Types
// ============================================================================

/// The full `metadata.json` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Next id to issue, per thread. `counters[t]` is always one past the
    /// highest id ever issued in `t`; deletions do not decrement it.
    #[serde(default)]
    pub message_id_counters: BTreeMap<String, u64>,

    /// Global active-thread pointer. Not validated against existing threads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_thread: Option<String>,
}

// ============================================================================
// Bootstrap Defaults
// ============================================================================

/// First-run `messages.json`: a `"Home"` thread with one welcome message.
pub fn default_messages() -> ThreadMap {
    let mut map = ThreadMap::new();
    map.messages_mut(HOME_THREAD).push(Message {
        author: "Peach".to_string(),
        content: "Welcome to Peach page!".to_string(),
        id: 0,
    });
    map
}

/// First-run `metadata.json`. `"Home"` already used id 0, so its counter
/// starts at 1.
pub fn default_metadata() -> Metadata {
    let mut counters = BTreeMap::new();
    counters.insert(HOME_THREAD.to_string(), 1);
    Metadata {
        message_id_counters: counters,
        current_thread: None,
    }
}

// ============================================================================
// TESTS
// ============================================================================
