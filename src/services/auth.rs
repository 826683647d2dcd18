//! Authentication service
//!
//! Registration, password login and bearer-token sessions. Tokens are handed
//! out once; the sessions file only ever sees their SHA-256 digest.

use chrono::{Duration, Utc};

use crate::audit::EntityType;
use crate::config::settings::Settings;
use crate::crypto::{generate_token, hash_password, hash_token, verify_password, SecureString};
use crate::error::{FintrackError, FintrackResult};
use crate::models::user::{normalize, validate_email, validate_username};
use crate::models::{Session, User, UserId};
use crate::storage::Storage;

/// Message for every failed login, whichever part was wrong
const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Service for accounts and sessions
pub struct AuthService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub password: SecureString,
}

/// A successful login: the plaintext token is only available here
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub session: Session,
    pub token: SecureString,
}

impl<'a> AuthService<'a> {
    pub fn new(storage: &'a Storage, settings: &'a Settings) -> Self {
        Self { storage, settings }
    }

    fn check_password_policy(&self, password: &str) -> FintrackResult<()> {
        let min = self.settings.min_password_length;
        if password.chars().count() < min {
            return Err(FintrackError::Validation(format!(
                "Password must be at least {} characters",
                min
            )));
        }
        Ok(())
    }

    /// Create a new account
    pub fn register(&self, input: RegisterInput) -> FintrackResult<User> {
        let username = normalize(&input.username);
        let email = normalize(&input.email);

        validate_username(&username).map_err(|e| FintrackError::Validation(e.to_string()))?;
        validate_email(&email).map_err(|e| FintrackError::Validation(e.to_string()))?;
        self.check_password_policy(&input.password)?;

        if self.storage.users.find_by_username(&username)?.is_some() {
            return Err(FintrackError::Duplicate {
                entity_type: "User",
                identifier: username,
            });
        }
        if self.storage.users.find_by_email(&email)?.is_some() {
            return Err(FintrackError::Duplicate {
                entity_type: "User",
                identifier: email,
            });
        }

        let mut user = User::new(username, email, hash_password(&input.password)?);
        if let Some(display_name) = input.display_name {
            user.display_name = display_name.trim().to_string();
        }
        user.validate()
            .map_err(|e| FintrackError::Validation(e.to_string()))?;

        self.storage.users.upsert(user.clone())?;
        self.storage.users.save()?;

        self.storage.log_create(
            Some(user.id),
            EntityType::User,
            user.id.to_string(),
            Some(user.username.clone()),
            &user.profile(),
        )?;
        tracing::info!(user = %user.id, "user registered");

        Ok(user)
    }

    /// Log in by username or email
    pub fn login(&self, identifier: &str, password: &str) -> FintrackResult<LoginOutcome> {
        let user = self
            .storage
            .users
            .find_by_login(identifier)?
            .filter(|u| verify_password(password, &u.password_hash))
            .ok_or_else(|| {
                tracing::warn!("failed login attempt");
                FintrackError::Unauthorized(INVALID_CREDENTIALS.into())
            })?;

        let token = generate_token();
        let session = Session::new(
            user.id,
            hash_token(&token),
            Duration::hours(self.settings.session_ttl_hours),
        );

        self.storage.sessions.purge_expired(Utc::now())?;
        self.storage.sessions.upsert(session.clone())?;
        self.storage.sessions.save()?;
        tracing::info!(user = %user.id, session = %session.id, "session opened");

        Ok(LoginOutcome {
            user,
            session,
            token,
        })
    }

    /// Resolve a bearer token to its user
    ///
    /// Expired sessions are removed on sight; every success refreshes
    /// `last_used_at`.
    pub fn authenticate(&self, token: &str) -> FintrackResult<User> {
        let unauthorized = || FintrackError::Unauthorized("Invalid or expired session".into());
        let now = Utc::now();

        let mut session = self
            .storage
            .sessions
            .find_by_token_hash(&hash_token(token))?
            .ok_or_else(unauthorized)?;

        if session.is_expired(now) {
            self.storage.sessions.delete(session.id)?;
            self.storage.sessions.save()?;
            return Err(unauthorized());
        }

        let user = self
            .storage
            .users
            .get(session.user_id)?
            .ok_or_else(unauthorized)?;

        session.touch(now);
        self.storage.sessions.upsert(session)?;
        self.storage.sessions.save()?;

        Ok(user)
    }

    /// End the session behind `token`; unknown tokens are ignored
    pub fn logout(&self, token: &str) -> FintrackResult<bool> {
        let Some(session) = self
            .storage
            .sessions
            .find_by_token_hash(&hash_token(token))?
        else {
            return Ok(false);
        };
        self.storage.sessions.delete(session.id)?;
        self.storage.sessions.save()?;
        tracing::info!(session = %session.id, "session closed");
        Ok(true)
    }

    /// End every session of a user
    pub fn logout_all(&self, user_id: UserId) -> FintrackResult<usize> {
        let removed = self.storage.sessions.delete_for_user(user_id, None)?;
        self.storage.sessions.save()?;
        Ok(removed)
    }

    /// Change a password, revoking every session except `keep_token`'s
    pub fn change_password(
        &self,
        user_id: UserId,
        old_password: &str,
        new_password: &str,
        keep_token: Option<&str>,
    ) -> FintrackResult<()> {
        let mut user = self
            .storage
            .users
            .get(user_id)?
            .ok_or_else(|| FintrackError::user_not_found(user_id.to_string()))?;

        if !verify_password(old_password, &user.password_hash) {
            return Err(FintrackError::Unauthorized(
                "Current password is incorrect".into(),
            ));
        }
        self.check_password_policy(new_password)?;

        user.password_hash = hash_password(new_password)?;
        user.touch();
        self.storage.users.upsert(user.clone())?;
        self.storage.users.save()?;

        let keep = match keep_token {
            Some(token) => self
                .storage
                .sessions
                .find_by_token_hash(&hash_token(token))?
                .map(|s| s.id),
            None => None,
        };
        self.storage.sessions.delete_for_user(user_id, keep)?;
        self.storage.sessions.save()?;

        // Never put hashes in the audit log
        self.storage.log_update(
            Some(user_id),
            EntityType::User,
            user.id.to_string(),
            Some(user.username.clone()),
            &serde_json::json!({"password": "old"}),
            &serde_json::json!({"password": "changed"}),
        )?;
        Ok(())
    }

    pub fn purge_expired(&self) -> FintrackResult<usize> {
        let purged = self.storage.sessions.purge_expired(Utc::now())?;
        if purged > 0 {
            self.storage.sessions.save()?;
        }
        Ok(purged)
    }
}
