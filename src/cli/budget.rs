//! Budget CLI commands
//!
//! Budgets are per-category monthly limits, either personal or shared by
//! the family (`--family`).

use std::collections::HashMap;

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::budget::{format_budget_alerts, format_budget_overview, format_transfer_list};
use crate::error::{FintrackError, FintrackResult};
use crate::models::{Budget, BudgetId, BudgetScope, Month, User};
use crate::services::{BudgetService, CategoryService, CreateBudgetInput};
use crate::storage::Storage;

use super::{category_names, parse_amount, parse_month, print_json};

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Set the limit for a category (creates or updates the budget)
    Set {
        /// Expense category name or ID
        category: String,
        /// Monthly limit
        amount: String,
        /// Month (YYYY-MM), defaults to the current month
        #[arg(short, long)]
        month: Option<String>,
        /// Alert when this percentage of the limit is spent
        #[arg(short, long)]
        threshold: Option<u8>,
        /// Notes
        #[arg(long, default_value = "")]
        notes: String,
        /// Shared family budget (head only)
        #[arg(short, long)]
        family: bool,
    },

    /// List budgets and their limits
    List {
        /// Only this month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,
        #[arg(short, long)]
        family: bool,
    },

    /// Spending against every budget of a month
    Overview {
        /// Month (YYYY-MM), defaults to the current month
        #[arg(short, long)]
        month: Option<String>,
        #[arg(short, long)]
        family: bool,
        #[arg(long)]
        json: bool,
    },

    /// Budgets that are near or over their limit
    Alerts {
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Move unspent limit from one category's budget to another's
    Transfer {
        /// Source category
        from: String,
        /// Destination category
        to: String,
        /// Amount to move
        amount: String,
        #[arg(short, long)]
        month: Option<String>,
        #[arg(short, long)]
        family: bool,
        /// Why the money moved
        #[arg(short, long, default_value = "")]
        note: String,
    },

    /// Show budget transfer history
    Transfers {
        #[arg(short, long)]
        month: Option<String>,
        #[arg(short, long)]
        family: bool,
    },

    /// Copy every budget of one month into another
    Copy {
        /// Source month (YYYY-MM)
        from: String,
        /// Destination month (YYYY-MM)
        to: String,
        #[arg(short, long)]
        family: bool,
    },

    /// Delete a category's budget for a month
    Delete {
        /// Category name or ID
        category: String,
        #[arg(short, long)]
        month: Option<String>,
        #[arg(short, long)]
        family: bool,
    },
}

pub(crate) fn scope_for(storage: &Storage, user: &User, family: bool) -> FintrackResult<BudgetScope> {
    BudgetService::new(storage).scope_for(user.id, family)
}

/// The budget for a category in a scope and month
fn budget_for(
    storage: &Storage,
    user: &User,
    scope: BudgetScope,
    category: &str,
    month: Month,
) -> FintrackResult<Budget> {
    let category = CategoryService::new(storage).resolve(user.id, category)?;
    storage
        .budgets
        .find_by_key(scope, category.id, month)?
        .ok_or_else(|| {
            FintrackError::budget_not_found(format!("{} ({}, {})", category.name, scope, month))
        })
}

/// Handle a budget command
pub fn handle_budget_command(
    storage: &Storage,
    settings: &Settings,
    user: &User,
    cmd: BudgetCommands,
) -> FintrackResult<()> {
    let service = BudgetService::new(storage);

    match cmd {
        BudgetCommands::Set {
            category,
            amount,
            month,
            threshold,
            notes,
            family,
        } => {
            let scope = scope_for(storage, user, family)?;
            let month = parse_month(month.as_deref())?;
            let limit = parse_amount(&amount)?;
            let category = CategoryService::new(storage).resolve(user.id, &category)?;

            match storage.budgets.find_by_key(scope, category.id, month)? {
                Some(existing) => {
                    let mut budget = service.update_limit(user.id, existing.id, limit)?;
                    if let Some(threshold) = threshold {
                        budget = service.update_threshold(user.id, existing.id, threshold)?;
                    }
                    println!(
                        "Updated {} budget for {} ({}): {}",
                        category.name, month, scope, budget.limit
                    );
                }
                None => {
                    let budget = service.create(
                        user.id,
                        CreateBudgetInput {
                            scope,
                            category_id: category.id,
                            month,
                            limit,
                            alert_threshold: threshold
                                .unwrap_or(settings.default_alert_threshold),
                            notes,
                        },
                    )?;
                    println!(
                        "Created {} budget for {} ({}): {}",
                        category.name, month, scope, budget.limit
                    );
                    println!("  Alert at {}% | ID: {}", budget.alert_threshold, budget.id);
                }
            }
        }

        BudgetCommands::List { month, family } => {
            let scope = scope_for(storage, user, family)?;
            let month = month.as_deref().map(|m| parse_month(Some(m))).transpose()?;
            let names = category_names(storage, user.id)?;

            let mut budgets = storage.budgets.get_for_scope(scope, month)?;
            if budgets.is_empty() {
                println!("No budgets set. Use 'fintrack budget set' to add one.");
                return Ok(());
            }
            budgets.sort_by(|a, b| b.month.cmp(&a.month).then(a.category_id.cmp(&b.category_id)));

            println!("Budgets ({})", scope);
            for budget in &budgets {
                println!(
                    "  {}  {:<20} {:>12}  alert {:>3}%  {}",
                    budget.month,
                    names
                        .get(&budget.category_id)
                        .map(String::as_str)
                        .unwrap_or("(unknown)"),
                    budget.limit,
                    budget.alert_threshold,
                    budget.id
                );
            }
        }

        BudgetCommands::Overview {
            month,
            family,
            json,
        } => {
            let scope = scope_for(storage, user, family)?;
            let overview = service.overview(user.id, scope, parse_month(month.as_deref())?)?;
            if json {
                print_json(&overview)?;
            } else {
                let names = category_names(storage, user.id)?;
                print!("{}", format_budget_overview(&overview, &names));
            }
        }

        BudgetCommands::Alerts { month } => {
            let alerts = service.alerts(user.id, parse_month(month.as_deref())?)?;
            let names = category_names(storage, user.id)?;
            print!("{}", format_budget_alerts(&alerts, &names));
        }

        BudgetCommands::Transfer {
            from,
            to,
            amount,
            month,
            family,
            note,
        } => {
            let scope = scope_for(storage, user, family)?;
            let month = parse_month(month.as_deref())?;
            let source = budget_for(storage, user, scope, &from, month)?;
            let target = budget_for(storage, user, scope, &to, month)?;

            let transfer = service.transfer(
                user.id,
                source.id,
                target.id,
                parse_amount(&amount)?,
                &note,
            )?;
            println!("Moved {} from {} to {} ({})", transfer.amount, from, to, month);
        }

        BudgetCommands::Transfers { month, family } => {
            let scope = scope_for(storage, user, family)?;
            let month = month.as_deref().map(|m| parse_month(Some(m))).transpose()?;
            let transfers = service.transfers(user.id, scope, month)?;

            let names = category_names(storage, user.id)?;
            let labels: HashMap<BudgetId, String> = storage
                .budgets
                .get_for_scope(scope, None)?
                .into_iter()
                .map(|b| {
                    let label = names
                        .get(&b.category_id)
                        .cloned()
                        .unwrap_or_else(|| b.id.to_string());
                    (b.id, label)
                })
                .collect();
            print!("{}", format_transfer_list(&transfers, &labels));
        }

        BudgetCommands::Copy { from, to, family } => {
            let scope = scope_for(storage, user, family)?;
            let from = parse_month(Some(&from))?;
            let to = parse_month(Some(&to))?;
            let copied = service.copy_month(user.id, scope, from, to)?;
            println!("Copied {} budget(s) from {} to {}", copied.len(), from, to);
        }

        BudgetCommands::Delete {
            category,
            month,
            family,
        } => {
            let scope = scope_for(storage, user, family)?;
            let month = parse_month(month.as_deref())?;
            let budget = budget_for(storage, user, scope, &category, month)?;
            service.delete(user.id, budget.id)?;
            println!("Deleted {} budget for {}", category, month);
        }
    }

    Ok(())
}
