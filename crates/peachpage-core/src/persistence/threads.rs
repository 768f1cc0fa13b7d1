//! Thread/message store and board metadata.
//!
//! # Files
//!
//! - `messages.json` - Thread name → ordered message list
//! - `metadata.json` - Per-thread id counters and the current-thread pointer
//!
//! # Design
//!
//! Message ids come from a per-thread counter in `metadata.json`. The
//! counter only ever grows, so ids within a thread are unique and
//! strictly increasing even across deletions. Posting rewrites both
//! files; each write is atomic on its own, so their order does not
//! matter.

use std::path::Path;

use thiserror::Error;

use super::store::{self, StoreError};
use super::types::{self, Message, Metadata, ThreadMap};

/// File name for the message document inside the data directory.
pub const MESSAGES_FILE: &str = "messages.json";

/// File name for the metadata document inside the data directory.
pub const METADATA_FILE: &str = "metadata.json";

/// Error type for thread store operations.
#[derive(Debug, Error)]
pub enum ThreadError {
    /// No thread argument and no current thread to fall back to.
    #[error("no thread specified")]
    NoThread,
    /// Underlying document load/save failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// Document Operations
// ============================================================================

/// Load the message document, seeding the `"Home"` thread on first run.
pub fn load_messages(dir: &Path) -> Result<ThreadMap, StoreError> {
    store::load_or_init(&dir.join(MESSAGES_FILE), types::default_messages())
}

/// Save the message document.
pub fn save_messages(dir: &Path, messages: &ThreadMap) -> Result<(), StoreError> {
    store::save_document(&dir.join(MESSAGES_FILE), messages)
}

/// Load the metadata document, seeding the `"Home"` counter on first run.
pub fn load_metadata(dir: &Path) -> Result<Metadata, StoreError> {
    store::load_or_init(&dir.join(METADATA_FILE), types::default_metadata())
}

/// Save the metadata document.
pub fn save_metadata(dir: &Path, metadata: &Metadata) -> Result<(), StoreError> {
    store::save_document(&dir.join(METADATA_FILE), metadata)
}

// ============================================================================
// Thread Operations
// ============================================================================

/// Thread names in persisted insertion order.
pub fn list_threads(dir: &Path) -> Result<Vec<String>, StoreError> {
    let messages = load_messages(dir)?;
    Ok(messages.names().map(str::to_string).collect())
}

/// Create a new, empty thread and initialize its id counter to 0.
///
/// Returns `false` without mutation if the thread already exists.
pub fn create_thread(dir: &Path, name: &str) -> Result<bool, StoreError> {
    let mut messages = load_messages(dir)?;
    if !messages.insert_empty(name) {
        return Ok(false);
    }
    save_messages(dir, &messages)?;

    let mut metadata = load_metadata(dir)?;
    metadata.message_id_counters.insert(name.to_string(), 0);
    save_metadata(dir, &metadata)?;

    log::debug!("created thread {name}");
    Ok(true)
}

/// Messages in a thread, in post order.
///
/// Returns an empty list for an unknown or unspecified thread.
pub fn messages_in(dir: &Path, thread: Option<&str>) -> Result<Vec<Message>, StoreError> {
    let Some(thread) = thread else {
        return Ok(Vec::new());
    };
    let messages = load_messages(dir)?;
    Ok(messages.get(thread).map(<[Message]>::to_vec).unwrap_or_default())
}

/// Append a message and return its id.
///
/// The target is the explicit `thread` argument, falling back to the
/// current thread from metadata; with neither, fails with
/// [`ThreadError::NoThread`]. Posting to a thread name that does not
/// exist yet creates it implicitly.
pub fn post_message(
    dir: &Path,
    author: &str,
    content: &str,
    thread: Option<&str>,
) -> Result<u64, ThreadError> {
    let mut metadata = load_metadata(dir)?;
    let thread = match thread {
        Some(name) => name.to_string(),
        None => metadata.current_thread.clone().ok_or(ThreadError::NoThread)?,
    };

    let next_id = metadata
        .message_id_counters
        .get(&thread)
        .copied()
        .unwrap_or(0);
    metadata
        .message_id_counters
        .insert(thread.clone(), next_id + 1);

    let mut messages = load_messages(dir)?;
    messages.messages_mut(&thread).push(Message {
        author: author.to_string(),
        content: content.to_string(),
        id: next_id,
    });

    save_messages(dir, &messages)?;
    save_metadata(dir, &metadata)?;

    log::debug!("posted message {next_id} to {thread}");
    Ok(next_id)
}

/// Remove the message with the given id from a thread.
///
/// The target thread resolves like [`post_message`]. Returns `false` if
/// the thread is unknown or holds no message with that id; the counter
/// is never decremented.
pub fn delete_message(dir: &Path, thread: Option<&str>, id: u64) -> Result<bool, ThreadError> {
    let thread = match thread {
        Some(name) => name.to_string(),
        None => load_metadata(dir)?
            .current_thread
            .ok_or(ThreadError::NoThread)?,
    };

    let mut messages = load_messages(dir)?;
    let Some(list) = messages.get_mut(&thread) else {
        return Ok(false);
    };

    let before = list.len();
    list.retain(|m| m.id != id);
    if list.len() == before {
        return Ok(false);
    }

    save_messages(dir, &messages)?;

    log::debug!("deleted message {id} from {thread}");
    Ok(true)
}

// ============================================================================
// Current Thread Operations
// ============================================================================

/// The global active-thread pointer, if one has been set.
pub fn current_thread(dir: &Path) -> Result<Option<String>, StoreError> {
    Ok(load_metadata(dir)?.current_thread)
}

/// Set the global active-thread pointer.
///
/// The name is not validated against existing threads; a later post will
/// create the thread implicitly.
pub fn set_current_thread(dir: &Path, name: &str) -> Result<(), StoreError> {
    let mut metadata = load_metadata(dir)?;
    metadata.current_thread = Some(name.to_string());
    save_metadata(dir, &metadata)
}

// ============================================================================
// TESTS
// ============================================================================
