//! Audit log CLI command

use clap::Args;

use crate::error::FintrackResult;
use crate::models::User;
use crate::storage::Storage;

use super::print_json;

/// Show your recent audit log entries
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Number of entries to show
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,

    /// Only entries for this entity type (e.g. Transaction, Budget)
    #[arg(short, long)]
    pub entity: Option<String>,

    /// Print raw JSON entries
    #[arg(long)]
    pub json: bool,
}

/// Handle the audit command
pub fn handle_audit_command(storage: &Storage, user: &User, args: AuditArgs) -> FintrackResult<()> {
    let mut entries = storage.audit().read_by_actor(user.id, usize::MAX)?;
    if let Some(entity) = &args.entity {
        entries.retain(|e| e.entity_type.to_string().eq_ignore_ascii_case(entity.trim()));
    }
    let start = entries.len().saturating_sub(args.limit);
    let entries = &entries[start..];

    if args.json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }
    for entry in entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}
