//! The CLI's persisted login
//!
//! `auth login` writes the plaintext bearer token to `session.json`; every
//! later command authenticates with it like an API client would.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::paths::FintrackPaths;
use crate::config::settings::Settings;
use crate::error::{FintrackError, FintrackResult};
use crate::models::User;
use crate::services::AuthService;
use crate::storage::file_io::{read_json_required, remove_if_exists, write_json_atomic};
use crate::storage::Storage;

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    username: String,
    token: String,
    logged_in_at: DateTime<Utc>,
}

pub fn save_session(paths: &FintrackPaths, username: &str, token: &str) -> FintrackResult<()> {
    write_json_atomic(
        paths.session_file(),
        &SessionFile {
            username: username.to_string(),
            token: token.to_string(),
            logged_in_at: Utc::now(),
        },
    )
}

/// The saved token, if any
pub fn load_token(paths: &FintrackPaths) -> FintrackResult<Option<String>> {
    let path = paths.session_file();
    if !path.exists() {
        return Ok(None);
    }
    let session: SessionFile = read_json_required(path)?;
    Ok(Some(session.token))
}

pub fn clear_session(paths: &FintrackPaths) -> FintrackResult<()> {
    remove_if_exists(paths.session_file())
}

/// The logged-in user, or `Unauthorized` with a hint to log in
pub fn require_user(
    storage: &Storage,
    settings: &Settings,
    paths: &FintrackPaths,
) -> FintrackResult<User> {
    let token = load_token(paths)?.ok_or_else(|| {
        FintrackError::Unauthorized("Not logged in. Run 'fintrack auth login' first".into())
    })?;

    AuthService::new(storage, settings)
        .authenticate(&token)
        .map_err(|e| match e {
            FintrackError::Unauthorized(_) => FintrackError::Unauthorized(
                "Session expired or revoked. Run 'fintrack auth login' again".into(),
            ),
            other => other,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{create_test_storage, register};

    #[test]
    fn test_session_roundtrip() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let paths = storage.paths().clone();
        let alice = register(&storage, "alice");

        assert!(require_user(&storage, &settings, &paths)
            .unwrap_err()
            .is_auth());

        let outcome = AuthService::new(&storage, &settings)
            .login("alice", "password123")
            .unwrap();
        save_session(&paths, "alice", &outcome.token).unwrap();
        assert_eq!(require_user(&storage, &settings, &paths).unwrap().id, alice.id);

        AuthService::new(&storage, &settings)
            .logout(&outcome.token)
            .unwrap();
        assert!(require_user(&storage, &settings, &paths)
            .unwrap_err()
            .to_string()
            .contains("expired or revoked"));

        clear_session(&paths).unwrap();
        assert_eq!(load_token(&paths).unwrap(), None);
    }
}
