//! CLI commands for data export
//!
//! Exports cover only the logged-in user's own data.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::error::{FintrackError, FintrackResult};
use crate::export::{
    export_budgets_csv, export_transactions_csv, export_user_json, export_user_yaml,
    import_from_json, import_from_yaml, UserExport,
};
use crate::models::User;
use crate::storage::Storage;

use super::parse_month;

/// Export subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Everything you own as JSON
    Json {
        /// Output file path
        output: PathBuf,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Everything you own as YAML
    Yaml {
        /// Output file path
        output: PathBuf,
    },

    /// Transactions (or budgets) as CSV
    Csv {
        /// Output file path
        output: PathBuf,
        /// Export budgets instead of transactions
        #[arg(long)]
        budgets: bool,
        /// Only budgets of this month (YYYY-MM)
        #[arg(short, long, requires = "budgets")]
        month: Option<String>,
    },

    /// Show what an export would contain without writing files
    Info,

    /// Check that a JSON or YAML export file can be read back
    Verify {
        /// Export file (.json, .yaml or .yml)
        file: PathBuf,
    },
}

/// Handle export commands
pub fn handle_export_command(
    storage: &Storage,
    user: &User,
    cmd: ExportCommands,
) -> FintrackResult<()> {
    match cmd {
        ExportCommands::Json { output, pretty } => {
            with_file(&output, |w| export_user_json(storage, user.id, w, pretty))?;
            println!("Data exported to: {}", output.display());
        }

        ExportCommands::Yaml { output } => {
            with_file(&output, |w| export_user_yaml(storage, user.id, w))?;
            println!("Data exported to: {}", output.display());
        }

        ExportCommands::Csv {
            output,
            budgets,
            month,
        } => {
            if budgets {
                let month = month.as_deref().map(|m| parse_month(Some(m))).transpose()?;
                let count =
                    with_file(&output, |w| export_budgets_csv(storage, user.id, month, w))?;
                println!("Exported {} budgets to: {}", count, output.display());
            } else {
                let count =
                    with_file(&output, |w| export_transactions_csv(storage, user.id, None, w))?;
                println!("Exported {} transactions to: {}", count, output.display());
            }
        }

        ExportCommands::Info => {
            let export = UserExport::from_storage(storage, user.id)?;
            print_summary(&export);
        }

        ExportCommands::Verify { file } => {
            let content = std::fs::read_to_string(&file).map_err(|e| {
                FintrackError::Import(format!("Cannot read {}: {}", file.display(), e))
            })?;
            let is_yaml = file
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
                .unwrap_or(false);
            let export = if is_yaml {
                import_from_yaml(&content)?
            } else {
                import_from_json(&content)?
            };
            println!("{} is a valid export", file.display());
            print_summary(&export);
        }
    }

    Ok(())
}

fn with_file<T, F>(path: &Path, write: F) -> FintrackResult<T>
where
    F: FnOnce(&mut BufWriter<File>) -> FintrackResult<T>,
{
    let file = File::create(path).map_err(|e| {
        FintrackError::Export(format!("Failed to create file {}: {}", path.display(), e))
    })?;
    let mut writer = BufWriter::new(file);
    let value = write(&mut writer)?;
    writer.flush()?;
    Ok(value)
}

fn print_summary(export: &UserExport) {
    println!("Export for {} (schema {})", export.user.username, export.schema_version);
    println!("  Categories:   {}", export.categories.len());
    println!("  Transactions: {}", export.metadata.transaction_count);
    println!("  Budgets:      {}", export.metadata.budget_count);
    println!("  Goals:        {}", export.metadata.goal_count);
    println!("  Liabilities:  {}", export.metadata.liability_count);
    if let (Some(first), Some(last)) = (
        &export.metadata.earliest_transaction,
        &export.metadata.latest_transaction,
    ) {
        println!("  Date range:   {} to {}", first, last);
    }
}
