//! User account model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{FamilyId, UserId};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 32;
pub const MAX_DISPLAY_NAME_LEN: usize = 64;

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    /// Lowercase login name
    pub username: String,

    /// Lowercase email address
    pub email: String,

    #[serde(default)]
    pub display_name: String,

    /// Argon2id PHC string
    pub password_hash: String,

    /// The family group this user belongs to, if any
    #[serde(default)]
    pub family_id: Option<FamilyId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user; username and email are normalised to lowercase
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            username: normalize(&username.into()),
            email: normalize(&email.into()),
            display_name: String::new(),
            password_hash: password_hash.into(),
            family_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name to show in listings (display name, falling back to the username)
    pub fn name(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            family_id: self.family_id,
            created_at: self.created_at,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), UserValidationError> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        if self.display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
            return Err(UserValidationError::DisplayNameTooLong(
                self.display_name.chars().count(),
            ));
        }
        if self.password_hash.is_empty() {
            return Err(UserValidationError::MissingPasswordHash);
        }
        Ok(())
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.username, self.email)
    }
}

/// Public view of a user, safe to return from the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub family_id: Option<FamilyId>,
    pub created_at: DateTime<Utc>,
}

pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Usernames are 3-32 characters of `[a-z0-9_.-]`
pub fn validate_username(username: &str) -> Result<(), UserValidationError> {
    let len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return Err(UserValidationError::UsernameLength(len));
    }
    if let Some(c) = username
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-')))
    {
        return Err(UserValidationError::UsernameCharacter(c));
    }
    Ok(())
}

/// Minimal structural check: one `@`, non-empty local part, dotted domain
pub fn validate_email(email: &str) -> Result<(), UserValidationError> {
    let invalid = || UserValidationError::InvalidEmail(email.to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }
    Ok(())
}

/// Validation errors for users
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    UsernameLength(usize),
    UsernameCharacter(char),
    InvalidEmail(String),
    DisplayNameTooLong(usize),
    MissingPasswordHash,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsernameLength(len) => write!(
                f,
                "Username must be {}-{} characters (got {})",
                MIN_USERNAME_LEN, MAX_USERNAME_LEN, len
            ),
            Self::UsernameCharacter(c) => write!(
                f,
                "Username may only contain a-z, 0-9, '_', '.' and '-' (found '{}')",
                c
            ),
            Self::InvalidEmail(email) => write!(f, "Invalid email address: {}", email),
            Self::DisplayNameTooLong(len) => write!(
                f,
                "Display name too long ({} characters, max {})",
                len, MAX_DISPLAY_NAME_LEN
            ),
            Self::MissingPasswordHash => write!(f, "User has no password hash"),
        }
    }
}

impl std::error::Error for UserValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_normalizes() {
        let user = User::new("  Alice ", "Alice@Example.COM", "$argon2id$stub");
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(user.validate().is_ok());
        assert_eq!(user.name(), "alice");
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("bob.smith-2").is_ok());
        assert_eq!(
            validate_username("ab"),
            Err(UserValidationError::UsernameLength(2))
        );
        assert_eq!(
            validate_username("bob smith"),
            Err(UserValidationError::UsernameCharacter(' '))
        );
        assert!(validate_username(&"x".repeat(33)).is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("a@b.io").is_ok());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@localhost").is_err());
        assert!(validate_email("a@example.").is_err());
    }

    #[test]
    fn test_profile_has_no_hash() {
        let mut user = User::new("carol", "carol@example.com", "secret-hash");
        user.display_name = "Carol".into();
        let json = serde_json::to_string(&user.profile()).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("Carol"));
        assert_eq!(user.name(), "Carol");
    }
}
