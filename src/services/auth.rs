//! Authentication service
//!
//! Implements the session store: exchanging an external identity assertion
//! for an internal session token, validating tokens on subsequent requests,
//! and logout. The external assertion is single-use and short-lived; the
//! internal token is minted here (never reused from the provider) and
//! carries an absolute expiry.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, User, UserRole};
use crate::services::identity::IdentityProvider;
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration time in days
const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// Error types for authentication operations
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    /// The identity provider rejected, errored, or timed out
    #[error("External authentication failed: {0}")]
    ExternalAuthFailed(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Authentication service managing users and sessions
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    provider: Arc<dyn IdentityProvider>,
    session_ttl_days: i64,
    admin_emails: Vec<String>,
}

impl AuthService {
    /// Create a new auth service with the default session lifetime
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            provider,
            session_ttl_days: DEFAULT_SESSION_TTL_DAYS,
            admin_emails: Vec::new(),
        }
    }

    /// Create a new auth service with a custom session lifetime and admin list
    pub fn with_config(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        provider: Arc<dyn IdentityProvider>,
        session_ttl_days: i64,
        admin_emails: Vec<String>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            provider,
            session_ttl_days,
            admin_emails,
        }
    }

    /// Exchange an external assertion for an internal session.
    ///
    /// Calls the identity provider once (time-bounded, failing closed),
    /// upserts the user by email, mints a fresh opaque token and persists a
    /// session with an absolute expiry.
    ///
    /// The user's role is decided only at creation, from the configured
    /// admin email list; later logins leave the stored role untouched.
    ///
    /// # Errors
    ///
    /// - `ExternalAuthFailed` if the provider call errors, rejects, or
    ///   times out
    /// - `InternalError` for database errors
    pub async fn create_session(
        &self,
        assertion: &str,
    ) -> Result<(Session, User), AuthServiceError> {
        let profile = self
            .provider
            .exchange(assertion)
            .await
            .map_err(|e| AuthServiceError::ExternalAuthFailed(e.to_string()))?;

        let user = match self
            .user_repo
            .get_by_email(&profile.email)
            .await
            .context("Failed to look up user")?
        {
            Some(existing) => existing,
            None => {
                let role = if self.admin_emails.contains(&profile.email) {
                    UserRole::Admin
                } else {
                    UserRole::User
                };
                let user = User::new(profile.email, profile.name, profile.picture, role);
                self.user_repo
                    .create(&user)
                    .await
                    .context("Failed to create user")?
            }
        };

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user.id,
            expires_at: now + Duration::days(self.session_ttl_days),
            created_at: now,
        };

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        tracing::info!(user_id = user.id, "Session created");

        Ok((created, user))
    }

    /// Validate a session token and return the associated user.
    ///
    /// This is a pure lookup: it neither extends the expiry (absolute TTL)
    /// nor deletes expired rows; reclamation is the sweep's job. Returns
    /// `None` for an absent, malformed, or expired token.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, AuthServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    /// Logout (invalidate session).
    ///
    /// Deletes the session row if present; deleting an already-absent token
    /// is not an error.
    pub async fn logout(&self, token: &str) -> Result<(), AuthServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    /// Delete all expired sessions.
    ///
    /// Maintenance operation run periodically from a background task.
    ///
    /// # Returns
    ///
    /// The number of sessions deleted
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, AuthServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;

        Ok(count)
    }
}
