//! User and session repositories

use chrono::{DateTime, Utc};

use crate::error::FintrackResult;
use crate::models::user::normalize as normalize_identity;
use crate::models::{Session, SessionId, User, UserId};

use super::repository::{JsonRepository, Record};

pub type UserRepository = JsonRepository<User>;
pub type SessionRepository = JsonRepository<Session>;

impl Record for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }

    fn owner(&self) -> Option<UserId> {
        Some(self.id)
    }
}

impl Record for Session {
    type Id = SessionId;

    fn id(&self) -> SessionId {
        self.id
    }

    fn owner(&self) -> Option<UserId> {
        Some(self.user_id)
    }
}

impl JsonRepository<User> {
    pub fn find_by_username(&self, username: &str) -> FintrackResult<Option<User>> {
        let username = normalize_identity(username);
        self.find(|u| u.username == username)
    }

    pub fn find_by_email(&self, email: &str) -> FintrackResult<Option<User>> {
        let email = normalize_identity(email);
        self.find(|u| u.email == email)
    }

    /// Look up by username, or by email when the identifier contains `@`
    pub fn find_by_login(&self, identifier: &str) -> FintrackResult<Option<User>> {
        if identifier.contains('@') {
            self.find_by_email(identifier)
        } else {
            self.find_by_username(identifier)
        }
    }
}

impl JsonRepository<Session> {
    pub fn find_by_token_hash(&self, token_hash: &str) -> FintrackResult<Option<Session>> {
        self.find(|s| s.token_hash == token_hash)
    }

    /// Remove every session belonging to `user_id`, optionally sparing one
    pub fn delete_for_user(
        &self,
        user_id: UserId,
        keep: Option<SessionId>,
    ) -> FintrackResult<usize> {
        self.delete_where(|s| s.user_id == user_id && Some(s.id) != keep)
    }

    pub fn purge_expired(&self, now: DateTime<Utc>) -> FintrackResult<usize> {
        self.delete_where(|s| s.is_expired(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_user_lookup_is_case_insensitive() {
        let temp_dir = TempDir::new().unwrap();
        let repo = UserRepository::new(temp_dir.path().join("users.json"));
        let user = User::new("Alice", "Alice@Example.com", "hash");
        repo.upsert(user.clone()).unwrap();

        assert_eq!(repo.find_by_username("ALICE").unwrap().unwrap().id, user.id);
        assert_eq!(
            repo.find_by_email(" alice@example.COM ").unwrap().unwrap().id,
            user.id
        );
        assert_eq!(
            repo.find_by_login("alice@example.com").unwrap().unwrap().id,
            user.id
        );
        assert!(repo.find_by_login("bob").unwrap().is_none());
    }

    #[test]
    fn test_session_purge_and_revoke() {
        let temp_dir = TempDir::new().unwrap();
        let repo = SessionRepository::new(temp_dir.path().join("sessions.json"));
        let user = UserId::new();

        let live = Session::new(user, "live", Duration::hours(1));
        let other = Session::new(user, "other", Duration::hours(1));
        let stale = Session::new(user, "stale", Duration::hours(-1));
        repo.upsert(live.clone()).unwrap();
        repo.upsert(other).unwrap();
        repo.upsert(stale).unwrap();

        assert_eq!(repo.purge_expired(Utc::now()).unwrap(), 1);
        assert_eq!(repo.find_by_token_hash("live").unwrap().unwrap().id, live.id);

        assert_eq!(repo.delete_for_user(user, Some(live.id)).unwrap(), 1);
        assert_eq!(repo.count().unwrap(), 1);
    }
}
