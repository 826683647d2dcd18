//! Audit logging
//!
//! Every create, update and delete performed through a service is appended to
//! `audit.log` as one JSON line recording who did what, with before/after
//! snapshots of the entity and a short diff for updates.
//!
//! ```rust,ignore
//! let entry = AuditEntry::update(
//!     EntityType::Budget,
//!     budget.id.to_string(),
//!     Some(category_name),
//!     &before,
//!     &after,
//!     generate_diff(&before_json, &after_json),
//! )
//! .by(Some(actor));
//! logger.log(&entry)?;
//! ```

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
