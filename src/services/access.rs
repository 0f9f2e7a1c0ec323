//! Access control
//!
//! Derives entry visibility and write authorization from the validated
//! user's role. Every decision starts from the session-validated user,
//! never from client-supplied flags.

use crate::models::User;

/// Visibility scope applied to entry queries
///
/// Admins see every entry; regular users only their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryScope {
    /// All entries visible (admin)
    Unrestricted,
    /// Only entries owned by this user id
    Owner(i64),
}

impl EntryScope {
    /// The owner filter to pass to the entry repository
    pub fn owner_filter(&self) -> Option<i64> {
        match self {
            EntryScope::Unrestricted => None,
            EntryScope::Owner(user_id) => Some(*user_id),
        }
    }

    /// Whether an entry owned by `owner_id` is visible under this scope
    pub fn permits(&self, owner_id: i64) -> bool {
        match self {
            EntryScope::Unrestricted => true,
            EntryScope::Owner(user_id) => *user_id == owner_id,
        }
    }
}

/// Derive the visibility scope for a user
pub fn scope_for(user: &User) -> EntryScope {
    if user.is_admin() {
        EntryScope::Unrestricted
    } else {
        EntryScope::Owner(user.id)
    }
}

/// Error type for authorization failures
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// The user may not modify this entry
    #[error("Access denied")]
    Forbidden,
}

/// Check whether `user` may update or delete an entry owned by
/// `entry_owner_id`.
///
/// Owners and admins pass; everyone else is rejected. Existence of the
/// entry must be established by the caller before this check.
pub fn authorize_write(user: &User, entry_owner_id: i64) -> Result<(), AccessError> {
    if user.id == entry_owner_id || user.is_admin() {
        Ok(())
    } else {
        Err(AccessError::Forbidden)
    }
}
