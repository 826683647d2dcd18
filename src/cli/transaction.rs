//! Transaction CLI commands
//!
//! Implements CLI commands for recording, listing, importing and exporting
//! income and expense transactions.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Subcommand;

use crate::display::transaction::{
    format_monthly_summary, format_transaction_details, format_transaction_table,
};
use crate::error::{FintrackError, FintrackResult};
use crate::export::export_transactions_csv;
use crate::models::category::{FALLBACK_EXPENSE_CATEGORY, FALLBACK_INCOME_CATEGORY};
use crate::models::{TransactionKind, User};
use crate::services::{
    CategoryService, CreateTransactionInput, ImportService, ImportStatus, TransactionFilter,
    TransactionService, UpdateTransactionInput,
};
use crate::storage::Storage;

use super::{category_names, parse_amount, parse_date, parse_month, print_json};

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Record an expense (or income with --income)
    Add {
        /// Amount (e.g., "42.50")
        amount: String,
        /// Category name or ID (defaults to Miscellaneous / Other Income)
        #[arg(short, long)]
        category: Option<String>,
        /// Record as income
        #[arg(short, long)]
        income: bool,
        /// Transaction date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Description
        #[arg(short = 'm', long, default_value = "")]
        description: String,
        /// Payee or payer
        #[arg(short, long, default_value = "")]
        payee: String,
        /// Tags (repeatable)
        #[arg(short, long)]
        tag: Vec<String>,
    },

    /// List transactions, newest first
    List {
        /// Only this month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "month")]
        from: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "month")]
        to: Option<String>,
        /// Filter by category name or ID
        #[arg(short = 'C', long)]
        category: Option<String>,
        /// "income" or "expense"
        #[arg(short, long)]
        kind: Option<String>,
        /// Search description, payee and tags
        #[arg(short, long)]
        search: Option<String>,
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show transaction details
    Show {
        /// Transaction ID (or a unique prefix)
        id: String,
    },

    /// Edit a transaction
    Edit {
        /// Transaction ID (or a unique prefix)
        id: String,
        #[arg(short, long)]
        amount: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short = 'm', long)]
        description: Option<String>,
        #[arg(short, long)]
        payee: Option<String>,
        /// Replace the tags (repeatable)
        #[arg(short, long)]
        tag: Option<Vec<String>>,
        /// Change the type: "income" or "expense"
        #[arg(long)]
        kind: Option<String>,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID (or a unique prefix)
        id: String,
    },

    /// Income, expenses and savings rate for a month
    Summary {
        /// Month (YYYY-MM), defaults to the current month
        month: Option<String>,
        #[arg(long)]
        json: bool,
    },

    /// Import transactions from CSV
    Import {
        /// CSV file with a header row (date, type, amount, category, description, payee)
        file: PathBuf,
        /// Show what would be imported without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Export transactions as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Start date (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<String>,
    },
}

/// Handle a transaction command
pub fn handle_transaction_command(
    storage: &Storage,
    user: &User,
    cmd: TransactionCommands,
) -> FintrackResult<()> {
    let service = TransactionService::new(storage);
    let categories = CategoryService::new(storage);

    match cmd {
        TransactionCommands::Add {
            amount,
            category,
            income,
            date,
            description,
            payee,
            tag,
        } => {
            let kind = if income {
                TransactionKind::Income
            } else {
                TransactionKind::Expense
            };
            let category_name = category.unwrap_or_else(|| {
                match kind {
                    TransactionKind::Income => FALLBACK_INCOME_CATEGORY,
                    TransactionKind::Expense => FALLBACK_EXPENSE_CATEGORY,
                }
                .to_string()
            });
            let category = categories.resolve(user.id, &category_name)?;

            let txn = service.create(
                user.id,
                CreateTransactionInput {
                    kind,
                    amount: parse_amount(&amount)?,
                    category_id: category.id,
                    date: parse_date(date.as_deref())?,
                    description,
                    payee,
                    tags: tag,
                },
            )?;

            println!(
                "Recorded {} of {} in {} on {}",
                kind.to_string().to_lowercase(),
                txn.amount,
                category.name,
                txn.date
            );
            println!("  ID: {}", txn.id);
        }

        TransactionCommands::List {
            month,
            from,
            to,
            category,
            kind,
            search,
            limit,
            json,
        } => {
            let mut filter = TransactionFilter::new().limit(limit);
            if let Some(month) = month {
                filter = filter.month(parse_month(Some(&month))?);
            } else {
                if let Some(from) = from {
                    filter.start = Some(parse_date(Some(&from))?);
                }
                if let Some(to) = to {
                    filter.end = Some(parse_date(Some(&to))?);
                }
            }
            if let Some(category) = category {
                filter = filter.category(categories.resolve(user.id, &category)?.id);
            }
            if let Some(kind) = kind {
                filter = filter.kind(kind.parse().map_err(FintrackError::Validation)?);
            }
            if let Some(search) = search {
                filter = filter.search(search);
            }

            let txns = service.list(user.id, &filter)?;
            if json {
                print_json(&txns)?;
            } else {
                let names = category_names(storage, user.id)?;
                print!("{}", format_transaction_table(&txns, &names));
            }
        }

        TransactionCommands::Show { id } => {
            let txn = service.find(user.id, &id)?;
            let category = categories.get(user.id, txn.category_id).ok();
            print!(
                "{}",
                format_transaction_details(&txn, category.as_ref().map(|c| c.name.as_str()))
            );
        }

        TransactionCommands::Edit {
            id,
            amount,
            category,
            date,
            description,
            payee,
            tag,
            kind,
        } => {
            let txn = service.find(user.id, &id)?;

            let input = UpdateTransactionInput {
                kind: kind
                    .map(|k| k.parse::<TransactionKind>())
                    .transpose()
                    .map_err(FintrackError::Validation)?,
                amount: amount.as_deref().map(parse_amount).transpose()?,
                category_id: match category {
                    Some(c) => Some(categories.resolve(user.id, &c)?.id),
                    None => None,
                },
                date: match date {
                    Some(d) => Some(parse_date(Some(&d))?),
                    None => None,
                },
                description,
                payee,
                tags: tag,
            };

            if input.kind.is_none()
                && input.amount.is_none()
                && input.category_id.is_none()
                && input.date.is_none()
                && input.description.is_none()
                && input.payee.is_none()
                && input.tags.is_none()
            {
                println!("No changes specified.");
                return Ok(());
            }

            let updated = service.update(user.id, txn.id, input)?;
            println!("Updated transaction {}", updated.id);
        }

        TransactionCommands::Delete { id } => {
            let txn = service.find(user.id, &id)?;
            service.delete(user.id, txn.id)?;
            println!("Deleted transaction {} ({} on {})", txn.id, txn.amount, txn.date);
        }

        TransactionCommands::Summary { month, json } => {
            let summary = service.monthly_summary(user.id, parse_month(month.as_deref())?)?;
            if json {
                print_json(&summary)?;
            } else {
                print!("{}", format_monthly_summary(&summary));
            }
        }

        TransactionCommands::Import { file, dry_run } => {
            let import = ImportService::new(storage);
            let reader = File::open(&file).map_err(|e| {
                FintrackError::Import(format!("Cannot open {}: {}", file.display(), e))
            })?;
            let preview = import.preview(user.id, reader)?;

            println!("Import preview for {}", file.display());
            println!("{}", "=".repeat(40));
            println!("  New transactions:   {}", preview.new_count());
            println!("  Duplicates (skip):  {}", preview.duplicate_count());
            println!("  Errors:             {}", preview.error_count());

            for entry in &preview.entries {
                match (&entry.status, &entry.parsed) {
                    (ImportStatus::Error(msg), _) => println!("    Row {}: {}", entry.row, msg),
                    (ImportStatus::New, Some(row)) if entry.fell_back => println!(
                        "    Row {}: unknown category '{}', using {}",
                        entry.row,
                        row.category,
                        entry.category_name.as_deref().unwrap_or("-")
                    ),
                    _ => {}
                }
            }

            if dry_run {
                println!("\nDry run; nothing was saved.");
                return Ok(());
            }
            if preview.new_count() == 0 {
                println!("\nNo new transactions to import.");
                return Ok(());
            }

            let result = import.execute(user.id, &preview)?;
            println!("\nImported {} transaction(s)", result.imported);
        }

        TransactionCommands::Export { output, from, to } => {
            let range = match (from, to) {
                (Some(from), Some(to)) => {
                    Some((parse_date(Some(&from))?, parse_date(Some(&to))?))
                }
                _ => None,
            };

            match output {
                Some(path) => {
                    let mut file = File::create(&path).map_err(|e| {
                        FintrackError::Export(format!("Cannot create {}: {}", path.display(), e))
                    })?;
                    let count = export_transactions_csv(storage, user.id, range, &mut file)?;
                    println!("Exported {} transaction(s) to {}", count, path.display());
                }
                None => {
                    let stdout = io::stdout();
                    let mut out = stdout.lock();
                    export_transactions_csv(storage, user.id, range, &mut out)?;
                    out.flush()?;
                }
            }
        }
    }

    Ok(())
}
