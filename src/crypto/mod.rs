//! Credential handling
//!
//! Argon2id password hashing, random bearer tokens stored only as SHA-256
//! digests, and a zeroizing string type for secrets in transit.

pub mod password;
pub mod secure_memory;
pub mod token;

pub use password::{hash_password, verify_password};
pub use secure_memory::SecureString;
pub use token::{generate_token, hash_token};
