//! Forum service: store operations gated by caller identity.
//!
//! # Design
//!
//! The stores in [`crate::persistence`] are plain read-modify-write
//! cycles over shared files, so the service serializes them: one mutex
//! for `users.json`, one for `messages.json` + `metadata.json` (those
//! two mutate together when posting). Locks are per-`Forum`; concurrent
//! writers from other processes are not coordinated.
//!
//! Identity is an explicit [`RequestContext`] passed into each call.
//! There is no ambient session state; the frontend tracks who is logged
//! in and hands it over per request.

use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

use crate::persistence::store::StoreError;
use crate::persistence::threads::{self, ThreadError};
use crate::persistence::types::Message;
use crate::persistence::users::{self, CredentialScheme, PlainText};

/// Policy knobs the service layer must decide explicitly.
///
/// The default policy lets anyone switch the current thread, matching
/// the newest board revision; stricter deployments can flip the knob.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForumPolicy {
    /// Whether switching the current thread requires a logged-in caller.
    pub switch_requires_login: bool,
}

/// Caller identity for a single service call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// The logged-in username, if any.
    pub username: Option<String>,
}

impl RequestContext {
    /// A caller with no session.
    pub fn anonymous() -> Self {
        Self { username: None }
    }

    /// A logged-in caller.
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            username: Some(name.into()),
        }
    }
}

/// Error type for service operations.
#[derive(Debug, Error)]
pub enum ForumError {
    /// The caller lacks the required identity or role.
    #[error("login required")]
    Unauthorized,
    /// The default data directory could not be resolved.
    #[error("data directory unavailable: {0}")]
    DataDir(String),
    /// No thread argument and no current thread to fall back to.
    #[error("no thread specified")]
    NoThread,
    /// Underlying document load/save failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ThreadError> for ForumError {
    fn from(e: ThreadError) -> Self {
        match e {
            ThreadError::NoThread => ForumError::NoThread,
            ThreadError::Store(e) => ForumError::Store(e),
        }
    }
}

/// The forum service.
///
/// Frontends create one `Forum` at startup and share it across request
/// handlers; it is `Send + Sync` and serializes file access internally.
pub struct Forum {
    data_dir: PathBuf,
    policy: ForumPolicy,
    credentials: Box<dyn CredentialScheme>,
    users_lock: Mutex<()>,
    board_lock: Mutex<()>,
}

impl Forum {
    /// Open a forum over `data_dir` with default policy and plain-text
    /// credentials.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_policy(data_dir, ForumPolicy::default())
    }

    /// Open a forum over the default data directory
    /// (see [`crate::paths::default_data_dir`]).
    pub fn open_default() -> Result<Self, ForumError> {
        let data_dir = crate::paths::default_data_dir().map_err(ForumError::DataDir)?;
        Ok(Self::new(data_dir))
    }

    /// Open a forum with an explicit policy.
    pub fn with_policy(data_dir: impl Into<PathBuf>, policy: ForumPolicy) -> Self {
        Self {
            data_dir: data_dir.into(),
            policy,
            credentials: Box::new(PlainText),
            users_lock: Mutex::new(()),
            board_lock: Mutex::new(()),
        }
    }

    /// Replace the credential scheme (e.g. with a hashing one).
    pub fn with_credential_scheme(mut self, scheme: Box<dyn CredentialScheme>) -> Self {
        self.credentials = scheme;
        self
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Register a new user. Returns `false` if the name is taken.
    pub fn register_user(
        &self,
        username: &str,
        password: &str,
        admin: bool,
    ) -> Result<bool, ForumError> {
        let _guard = self.users_lock.lock().unwrap();
        Ok(users::create_user(
            &self.data_dir,
            self.credentials.as_ref(),
            username,
            password,
            admin,
        )?)
    }

    /// Check a username/password pair.
    pub fn login(&self, username: &str, password: &str) -> Result<bool, ForumError> {
        let _guard = self.users_lock.lock().unwrap();
        Ok(users::verify_user(
            &self.data_dir,
            self.credentials.as_ref(),
            username,
            password,
        )?)
    }

    /// Whether a user holds the admin flag.
    pub fn is_admin(&self, username: &str) -> Result<bool, ForumError> {
        let _guard = self.users_lock.lock().unwrap();
        Ok(users::is_admin(&self.data_dir, username)?)
    }

    // ========================================================================
    // Board Operations
    // ========================================================================

    /// Thread names in creation order.
    pub fn threads(&self) -> Result<Vec<String>, ForumError> {
        let _guard = self.board_lock.lock().unwrap();
        Ok(threads::list_threads(&self.data_dir)?)
    }

    /// Messages in a thread; empty for an unknown or unspecified thread.
    pub fn messages(&self, thread: Option<&str>) -> Result<Vec<Message>, ForumError> {
        let _guard = self.board_lock.lock().unwrap();
        Ok(threads::messages_in(&self.data_dir, thread)?)
    }

    /// Post a message as the logged-in caller. Requires a login.
    ///
    /// The target is the explicit `thread`, falling back to the current
    /// thread; with neither, fails with [`ForumError::NoThread`].
    pub fn post(
        &self,
        ctx: &RequestContext,
        content: &str,
        thread: Option<&str>,
    ) -> Result<u64, ForumError> {
        let author = ctx.username.as_deref().ok_or(ForumError::Unauthorized)?;
        let _guard = self.board_lock.lock().unwrap();
        Ok(threads::post_message(&self.data_dir, author, content, thread)?)
    }

    /// Delete a message by id. Requires an admin caller.
    ///
    /// Returns `false` if the thread or id is unknown.
    pub fn delete(
        &self,
        ctx: &RequestContext,
        thread: Option<&str>,
        id: u64,
    ) -> Result<bool, ForumError> {
        let username = ctx.username.as_deref().ok_or(ForumError::Unauthorized)?;
        let admin = {
            let _guard = self.users_lock.lock().unwrap();
            users::is_admin(&self.data_dir, username)?
        };
        if !admin {
            return Err(ForumError::Unauthorized);
        }

        let _guard = self.board_lock.lock().unwrap();
        Ok(threads::delete_message(&self.data_dir, thread, id)?)
    }

    /// Create a new, empty thread. Requires a login.
    ///
    /// Returns `false` if the thread already exists.
    pub fn create_thread(&self, ctx: &RequestContext, name: &str) -> Result<bool, ForumError> {
        if ctx.username.is_none() {
            return Err(ForumError::Unauthorized);
        }
        let _guard = self.board_lock.lock().unwrap();
        Ok(threads::create_thread(&self.data_dir, name)?)
    }

    /// Point the board at a different thread.
    ///
    /// Requires a login only when the policy says so. The name is not
    /// validated against existing threads.
    pub fn switch_thread(&self, ctx: &RequestContext, name: &str) -> Result<(), ForumError> {
        if self.policy.switch_requires_login && ctx.username.is_none() {
            return Err(ForumError::Unauthorized);
        }
        let _guard = self.board_lock.lock().unwrap();
        Ok(threads::set_current_thread(&self.data_dir, name)?)
    }

    /// The current thread, if one has been selected.
    pub fn current_thread(&self) -> Result<Option<String>, ForumError> {
        let _guard = self.board_lock.lock().unwrap();
        Ok(threads::current_thread(&self.data_dir)?)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::types::HOME_THREAD;
    use tempfile::tempdir;

    fn forum(dir: &tempfile::TempDir) -> Forum {
        Forum::new(dir.path())
    }

    #[test]
    fn register_login_admin_scenario() {
        let dir = tempdir().unwrap();
        let forum = forum(&dir);

        assert!(forum.register_user("alice", "pw1", false).unwrap());
        assert!(forum.login("alice", "pw1").unwrap());
        assert!(!forum.login("alice", "wrong").unwrap());
        assert!(!forum.is_admin("alice").unwrap());
    }

    #[test]
    fn anonymous_cannot_post_or_create_threads() {
        let dir = tempdir().unwrap();
        let forum = forum(&dir);
        let ctx = RequestContext::anonymous();

        let err = forum.post(&ctx, "hi", Some(HOME_THREAD)).unwrap_err();
        assert!(matches!(err, ForumError::Unauthorized));

        let err = forum.create_thread(&ctx, "general").unwrap_err();
        assert!(matches!(err, ForumError::Unauthorized));
    }

    #[test]
    fn post_and_admin_delete_scenario() {
        let dir = tempdir().unwrap();
        let forum = forum(&dir);
        forum.register_user("alice", "pw1", false).unwrap();
        forum.register_user("root", "pw2", true).unwrap();

        let alice = RequestContext::user("alice");
        let id = forum.post(&alice, "hi", Some(HOME_THREAD)).unwrap();
        assert_eq!(id, 1);

        // Non-admin delete is rejected before reaching the store
        let err = forum.delete(&alice, Some(HOME_THREAD), id).unwrap_err();
        assert!(matches!(err, ForumError::Unauthorized));

        let root = RequestContext::user("root");
        assert!(forum.delete(&root, Some(HOME_THREAD), id).unwrap());
        assert_eq!(forum.messages(Some(HOME_THREAD)).unwrap().len(), 1);

        // Second delete finds nothing
        assert!(!forum.delete(&root, Some(HOME_THREAD), id).unwrap());
    }

    #[test]
    fn unknown_caller_is_not_admin() {
        let dir = tempdir().unwrap();
        let forum = forum(&dir);

        let ghost = RequestContext::user("ghost");
        let err = forum.delete(&ghost, Some(HOME_THREAD), 0).unwrap_err();
        assert!(matches!(err, ForumError::Unauthorized));
    }

    #[test]
    fn create_thread_then_post_uses_current_thread() {
        let dir = tempdir().unwrap();
        let forum = forum(&dir);
        forum.register_user("alice", "pw1", false).unwrap();
        let alice = RequestContext::user("alice");

        assert!(forum.create_thread(&alice, "general").unwrap());
        assert!(forum.messages(Some("general")).unwrap().is_empty());

        forum.switch_thread(&alice, "general").unwrap();
        assert_eq!(forum.current_thread().unwrap().as_deref(), Some("general"));

        let id = forum.post(&alice, "hi", None).unwrap();
        assert_eq!(id, 0);
        assert_eq!(forum.messages(Some("general")).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_thread_returns_false() {
        let dir = tempdir().unwrap();
        let forum = forum(&dir);
        forum.register_user("alice", "pw1", false).unwrap();
        let alice = RequestContext::user("alice");

        assert!(forum.create_thread(&alice, "general").unwrap());
        assert!(!forum.create_thread(&alice, "general").unwrap());
    }

    #[test]
    fn post_without_thread_or_selection_fails() {
        let dir = tempdir().unwrap();
        let forum = forum(&dir);
        forum.register_user("alice", "pw1", false).unwrap();

        let err = forum
            .post(&RequestContext::user("alice"), "hi", None)
            .unwrap_err();
        assert!(matches!(err, ForumError::NoThread));
    }

    #[test]
    fn switch_policy_gates_anonymous_callers() {
        let dir = tempdir().unwrap();

        // Default policy: anyone may switch
        let open = Forum::new(dir.path());
        open.switch_thread(&RequestContext::anonymous(), "general")
            .unwrap();

        // Strict policy: login required
        let strict = Forum::with_policy(
            dir.path(),
            ForumPolicy {
                switch_requires_login: true,
            },
        );
        let err = strict
            .switch_thread(&RequestContext::anonymous(), "general")
            .unwrap_err();
        assert!(matches!(err, ForumError::Unauthorized));

        strict
            .switch_thread(&RequestContext::user("alice"), "general")
            .unwrap();
    }

    #[test]
    fn open_default_honors_data_dir_override() {
        let dir = tempdir().unwrap();
        let path = dir.path().to_str().unwrap().to_string();

        crate::paths::test_env::with_vars(
            &[(crate::paths::DATA_DIR_ENV, Some(path.as_str()))],
            || {
                let forum = Forum::open_default().unwrap();
                assert_eq!(forum.threads().unwrap(), vec![HOME_THREAD.to_string()]);
                // The board was materialized in the override directory
                assert!(dir.path().join("messages.json").exists());
            },
        );
    }

    #[test]
    fn concurrent_posts_get_unique_sequential_ids() {
        use std::sync::Arc;
        use std::thread;

        let dir = tempdir().unwrap();
        let forum = Arc::new(Forum::new(dir.path()));
        forum.register_user("alice", "pw1", false).unwrap();

        let workers: usize = 8;
        let posts_per_worker: usize = 5;

        let mut handles = Vec::new();
        for _ in 0..workers {
            let forum = Arc::clone(&forum);
            handles.push(thread::spawn(move || {
                let ctx = RequestContext::user("alice");
                (0..posts_per_worker)
                    .map(|_| forum.post(&ctx, "hi", Some("general")).unwrap())
                    .collect::<Vec<u64>>()
            }));
        }

        let mut ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        ids.sort_unstable();

        // No duplicate or skipped ids across racing posters
        let expected: Vec<u64> = (0..(workers * posts_per_worker) as u64).collect();
        assert_eq!(ids, expected);
        assert_eq!(
            forum.messages(Some("general")).unwrap().len(),
            workers * posts_per_worker
        );
    }

    #[test]
    fn fresh_forum_lists_home() {
        let dir = tempdir().unwrap();
        let forum = forum(&dir);

        assert_eq!(forum.threads().unwrap(), vec![HOME_THREAD.to_string()]);
        assert!(forum.messages(None).unwrap().is_empty());
    }
}
