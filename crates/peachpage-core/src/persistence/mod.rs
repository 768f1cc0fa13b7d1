//! Persistence layer for users, threads, and board metadata.
//!
//! # Overview
//!
//! This module handles all file I/O for Peach Page's persistent state:
//!
//! - **Users** - Registered accounts with credentials and admin flag
//! - **Threads** - Named, ordered message lists
//! - **Metadata** - Per-thread id counters and the current-thread pointer
//!
//! # File Locations
//!
//! All data lives under a single data directory:
//!
//! ```text
//! <data-dir>/
//! ├── users.json       # username → {password, admin}
//! ├── messages.json    # thread name → [{author, content, id}, ...]
//! └── metadata.json    # {message_id_counters, current_thread}
//! ```
//!
//! # Design Principles
//!
//! ## Atomic Writes
//!
//! All save operations use write-then-rename to prevent corruption:
//!
//! 1. Write to `file.json.tmp`
//! 2. Rename to `file.json` (atomic on Unix)
//!
//! ## Default Initialization
//!
//! A missing or unparsable document is replaced with its bootstrap
//! default and never surfaced as an error. A fresh board starts with a
//! `"Home"` thread containing one welcome message.
//!
//! ## No In-Memory State
//!
//! Every operation is a full read-modify-write cycle over the relevant
//! document. Callers that need serialization across operations must hold
//! a lock around them; the [`crate::forum::Forum`] service does exactly
//! that.

pub mod store;
pub mod threads;
pub mod types;
pub mod users;

// Re-export commonly used items for convenience
pub use store::{load_or_init, save_document, StoreError};
pub use threads::{
    create_thread, current_thread, delete_message, list_threads, load_messages, load_metadata,
    messages_in, post_message, save_messages, save_metadata, set_current_thread, ThreadError,
};
pub use types::{Message, Metadata, ThreadMap, UserRecord, Users, HOME_THREAD};
pub use users::{create_user, is_admin, load_users, save_users, verify_user};
