//! Savings goal CLI commands

use clap::Subcommand;

use crate::display::plan::{format_goal_details, format_goal_list};
use crate::error::{FintrackError, FintrackResult};
use crate::models::{GoalKind, User};
use crate::services::{CreateGoalInput, GoalService};
use crate::storage::Storage;

use super::{parse_amount, parse_date, parse_signed_amount, print_json, today};

/// Goal subcommands
#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a savings goal
    Add {
        /// Goal name
        name: String,
        /// Target amount
        target: String,
        /// Target date (YYYY-MM-DD)
        #[arg(short, long)]
        by: Option<String>,
        /// emergency, retirement, purchase, travel, education, debt, other
        #[arg(short, long, default_value = "other")]
        kind: String,
        /// Amount already saved
        #[arg(long)]
        initial: Option<String>,
    },

    /// List goals
    List {
        /// Include archived goals
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },

    /// Add to (or, with a negative amount, withdraw from) a goal
    Contribute {
        /// Goal name or ID
        goal: String,
        /// Amount; negative to withdraw
        #[arg(allow_hyphen_values = true)]
        amount: String,
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long, default_value = "")]
        note: String,
    },

    /// Show progress and projections for a goal
    Show {
        /// Goal name or ID
        goal: String,
    },

    /// Archive a goal
    Archive {
        /// Goal name or ID
        goal: String,
    },

    /// Delete a goal and its contribution history
    Delete {
        /// Goal name or ID
        goal: String,
    },
}

/// Handle a goal command
pub fn handle_goal_command(
    storage: &Storage,
    user: &User,
    cmd: GoalCommands,
) -> FintrackResult<()> {
    let service = GoalService::new(storage);

    match cmd {
        GoalCommands::Add {
            name,
            target,
            by,
            kind,
            initial,
        } => {
            let kind: GoalKind = kind.parse().map_err(FintrackError::Validation)?;
            let goal = service.create(
                user.id,
                CreateGoalInput {
                    name,
                    kind,
                    target_amount: parse_amount(&target)?,
                    target_date: by.as_deref().map(|d| parse_date(Some(d))).transpose()?,
                    initial_amount: initial.as_deref().map(parse_amount).transpose()?,
                },
            )?;
            println!("Created goal: {}", goal);
            println!("  ID: {}", goal.id);
        }

        GoalCommands::List { all, json } => {
            let goals = service.list(user.id, all)?;
            if json {
                print_json(&goals)?;
            } else {
                print!("{}", format_goal_list(&goals));
            }
        }

        GoalCommands::Contribute {
            goal,
            amount,
            date,
            note,
        } => {
            let existing = service.find(user.id, &goal)?;
            let amount = parse_signed_amount(&amount)?;
            let updated = service.contribute(
                user.id,
                existing.id,
                amount,
                parse_date(date.as_deref())?,
                &note,
            )?;

            if amount.is_negative() {
                println!("Withdrew {} from '{}'", -amount, updated.name);
            } else {
                println!("Added {} to '{}'", amount, updated.name);
            }
            println!(
                "  Saved {} of {} ({:.1}%)",
                updated.saved_amount,
                updated.target_amount,
                updated.progress_percent()
            );
            if updated.is_completed() && !existing.is_completed() {
                println!("  Goal reached!");
            }
        }

        GoalCommands::Show { goal } => {
            let goal = service.find(user.id, &goal)?;
            let progress = service.progress(&goal, today());
            print!("{}", format_goal_details(&goal, &progress));
        }

        GoalCommands::Archive { goal } => {
            let existing = service.find(user.id, &goal)?;
            let archived = service.archive(user.id, existing.id)?;
            println!("Archived goal: {}", archived.name);
        }

        GoalCommands::Delete { goal } => {
            let existing = service.find(user.id, &goal)?;
            let deleted = service.delete(user.id, existing.id)?;
            println!("Deleted goal: {}", deleted.name);
        }
    }

    Ok(())
}
