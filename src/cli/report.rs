//! CLI commands for reports
//!
//! Each report prints a terminal table or, with `--output`, writes CSV.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::error::{FintrackError, FintrackResult};
use crate::models::{Month, User};
use crate::reports::{BudgetReport, CashFlowReport, DebtReport, SpendingReport};
use crate::services::PayoffStrategy;
use crate::storage::Storage;

use super::budget::scope_for;
use super::{parse_date, parse_month, today};

/// Report subcommands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Income, expenses and net per month
    #[command(alias = "cash-flow")]
    Cashflow {
        /// Last month of the report (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,
        /// Number of months
        #[arg(short = 'n', long, default_value = "6")]
        months: u32,
        /// Export to CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Spending by category
    Spending {
        /// Start date (YYYY-MM-DD)
        #[arg(short, long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(short, long)]
        end: Option<String>,
        /// Month to report on (alternative to start/end)
        #[arg(short, long, conflicts_with_all = ["start", "end"])]
        month: Option<String>,
        /// Show top N categories only
        #[arg(long)]
        top: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Budgets against spending for a month
    Budget {
        #[arg(short, long)]
        month: Option<String>,
        /// Family budgets instead of personal ones
        #[arg(short, long)]
        family: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Open debts with payoff projections
    Debt {
        /// avalanche or snowball
        #[arg(short, long, default_value = "avalanche")]
        strategy: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Handle report commands
pub fn handle_report_command(
    storage: &Storage,
    user: &User,
    cmd: ReportCommands,
) -> FintrackResult<()> {
    match cmd {
        ReportCommands::Cashflow {
            month,
            months,
            output,
        } => {
            let report =
                CashFlowReport::generate(storage, user.id, parse_month(month.as_deref())?, months)?;
            match output {
                Some(path) => write_csv(&path, "Cash flow", |w| report.export_csv(w)),
                None => {
                    println!("{}", report.format_terminal());
                    Ok(())
                }
            }
        }

        ReportCommands::Spending {
            start,
            end,
            month,
            top,
            output,
        } => {
            let (start_date, end_date) = match month {
                Some(month) => {
                    let month = parse_month(Some(&month))?;
                    (month.start_date(), month.end_date())
                }
                None => {
                    let start_date = match start {
                        Some(s) => parse_date(Some(&s))?,
                        None => Month::current().start_date(),
                    };
                    let end_date = match end {
                        Some(e) => parse_date(Some(&e))?,
                        None => today(),
                    };
                    (start_date, end_date)
                }
            };
            if start_date > end_date {
                return Err(FintrackError::Validation(format!(
                    "Start date {} is after end date {}",
                    start_date, end_date
                )));
            }

            let report = SpendingReport::generate(storage, user.id, start_date, end_date)?;
            if let Some(path) = output {
                return write_csv(&path, "Spending", |w| report.export_csv(w));
            }

            match top {
                Some(n) => {
                    println!(
                        "Top {} Spending Categories: {} to {}\n",
                        n, start_date, end_date
                    );
                    println!("{:<35} {:>12} {:>8}", "Category", "Amount", "%");
                    println!("{}", "-".repeat(60));
                    for cat in report.top_categories(n) {
                        println!(
                            "{:<35} {:>12} {:>7.1}%",
                            cat.category_name, cat.total_spending, cat.percentage
                        );
                    }
                    println!("\nTotal Spending: {}", report.total_spending);
                }
                None => println!("{}", report.format_terminal()),
            }
            Ok(())
        }

        ReportCommands::Budget {
            month,
            family,
            output,
        } => {
            let scope = scope_for(storage, user, family)?;
            let report =
                BudgetReport::generate(storage, user.id, scope, parse_month(month.as_deref())?)?;
            match output {
                Some(path) => write_csv(&path, "Budget", |w| report.export_csv(w)),
                None => {
                    println!("{}", report.format_terminal());
                    Ok(())
                }
            }
        }

        ReportCommands::Debt { strategy, output } => {
            let strategy: PayoffStrategy = strategy.parse().map_err(FintrackError::Validation)?;
            let report = DebtReport::generate(storage, user.id, strategy, Month::current())?;
            match output {
                Some(path) => write_csv(&path, "Debt", |w| report.export_csv(w)),
                None => {
                    println!("{}", report.format_terminal());
                    Ok(())
                }
            }
        }
    }
}

fn write_csv<F>(path: &Path, label: &str, export: F) -> FintrackResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> FintrackResult<()>,
{
    let file = File::create(path).map_err(|e| {
        FintrackError::Export(format!("Failed to create file {}: {}", path.display(), e))
    })?;
    let mut writer = BufWriter::new(file);
    export(&mut writer)?;
    writer.flush()?;
    println!("{} report exported to: {}", label, path.display());
    Ok(())
}
