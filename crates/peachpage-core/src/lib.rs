//! # peachpage-core
//!
//! Core business logic for Peach Page, a small file-backed discussion forum.
//!
//! This crate is framework-agnostic and can be used by:
//! - Web frontends (via route handlers)
//! - CLI tools (via direct calls)
//! - Tests (via a temp data directory)
//!
//! ## Key Concepts
//!
//! - **Thread**: a named, independently-ordered list of messages
//! - **Message**: `{author, content, id}`, with ids assigned from a
//!   per-thread monotonic counter
//! - **Forum**: the service layer that gates store operations behind a
//!   caller-supplied identity

pub mod forum;
pub mod paths;
pub mod persistence;

// Re-export commonly used types
pub use forum::{Forum, ForumError, ForumPolicy, RequestContext};
pub use persistence::types::Message;
pub use persistence::users::{CredentialScheme, PlainText};
