//! User store: registration, credential checks, and the admin flag.
//!
//! Users are append-only from this crate's point of view. There is no
//! update or delete operation; admin flags are granted at creation time
//! or by editing `users.json` out of band.

use std::path::Path;

use super::store::{self, StoreError};
use super::types::{UserRecord, Users};

/// File name for the user document inside the data directory.
pub const USERS_FILE: &str = "users.json";

/// How plain passwords map to their stored representation.
///
/// The store never compares passwords directly; it goes through this
/// seam so a hashing scheme can replace [`PlainText`] without touching
/// the store contract.
pub trait CredentialScheme: Send + Sync {
    /// Transform a plain password into its stored form.
    fn protect(&self, plain: &str) -> String;

    /// Check a plain password against a stored form.
    fn matches(&self, plain: &str, stored: &str) -> bool;
}

/// Stores passwords as-is. Exact, case-sensitive comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl CredentialScheme for PlainText {
    fn protect(&self, plain: &str) -> String {
        plain.to_string()
    }

    fn matches(&self, plain: &str, stored: &str) -> bool {
        plain == stored
    }
}

/// Load the user document, creating an empty one on first run.
pub fn load_users(dir: &Path) -> Result<Users, StoreError> {
    store::load_or_init(&dir.join(USERS_FILE), Users::default())
}

/// Save the user document.
pub fn save_users(dir: &Path, users: &Users) -> Result<(), StoreError> {
    store::save_document(&dir.join(USERS_FILE), users)
}

/// Create a new user.
///
/// Returns `false` without mutation if the username is already taken.
pub fn create_user(
    dir: &Path,
    scheme: &dyn CredentialScheme,
    username: &str,
    password: &str,
    admin: bool,
) -> Result<bool, StoreError> {
    let mut users = load_users(dir)?;
    if users.contains_key(username) {
        return Ok(false);
    }

    users.insert(
        username.to_string(),
        UserRecord {
            password: scheme.protect(password),
            admin,
        },
    );
    save_users(dir, &users)?;

    log::debug!("created user {username} (admin: {admin})");
    Ok(true)
}

/// Check a username/password pair. Unknown users verify as `false`.
pub fn verify_user(
    dir: &Path,
    scheme: &dyn CredentialScheme,
    username: &str,
    password: &str,
) -> Result<bool, StoreError> {
    let users = load_users(dir)?;
    Ok(users
        .get(username)
        .map(|user| scheme.matches(password, &user.password))
        .unwrap_or(false))
}

/// Whether a user may delete messages. Unknown users are not admins.
pub fn is_admin(dir: &Path, username: &str) -> Result<bool, StoreError> {
    let users = load_users(dir)?;
    Ok(users.get(username).map(|user| user.admin).unwrap_or(false))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_and_verify_user() {
        let dir = tempdir().unwrap();

        assert!(create_user(dir.path(), &PlainText, "alice", "pw1", false).unwrap());

        assert!(verify_user(dir.path(), &PlainText, "alice", "pw1").unwrap());
        assert!(!verify_user(dir.path(), &PlainText, "alice", "wrong").unwrap());
        assert!(!is_admin(dir.path(), "alice").unwrap());
    }

    #[test]
    fn create_duplicate_user_fails_without_mutation() {
        let dir = tempdir().unwrap();

        assert!(create_user(dir.path(), &PlainText, "alice", "pw1", false).unwrap());
        assert!(!create_user(dir.path(), &PlainText, "alice", "pw2", true).unwrap());

        // Original credentials and role survive
        assert!(verify_user(dir.path(), &PlainText, "alice", "pw1").unwrap());
        assert!(!is_admin(dir.path(), "alice").unwrap());
    }

    #[test]
    fn verify_unknown_user_is_false() {
        let dir = tempdir().unwrap();
        assert!(!verify_user(dir.path(), &PlainText, "nobody", "pw").unwrap());
        assert!(!is_admin(dir.path(), "nobody").unwrap());
    }

    #[test]
    fn admin_flag_is_persisted() {
        let dir = tempdir().unwrap();

        create_user(dir.path(), &PlainText, "root", "pw", true).unwrap();

        assert!(is_admin(dir.path(), "root").unwrap());
    }

    #[test]
    fn passwords_are_case_sensitive() {
        let dir = tempdir().unwrap();

        create_user(dir.path(), &PlainText, "alice", "Secret", false).unwrap();

        assert!(!verify_user(dir.path(), &PlainText, "alice", "secret").unwrap());
    }

    #[test]
    fn custom_scheme_controls_stored_form() {
        struct Reversed;
        impl CredentialScheme for Reversed {
            fn protect(&self, plain: &str) -> String {
                plain.chars().rev().collect()
            }
            fn matches(&self, plain: &str, stored: &str) -> bool {
                self.protect(plain) == stored
            }
        }

        let dir = tempdir().unwrap();
        create_user(dir.path(), &Reversed, "alice", "pw1", false).unwrap();

        let users = load_users(dir.path()).unwrap();
        assert_eq!(users.get("alice").unwrap().password, "1wp");
        assert!(verify_user(dir.path(), &Reversed, "alice", "pw1").unwrap());
    }
}
