//! Category CLI commands
//!
//! Built-in categories are listed for everyone; custom ones can be added,
//! renamed and archived by their creator.

use clap::Subcommand;

use crate::display::category::{format_category_list, format_category_tree};
use crate::error::{FintrackError, FintrackResult};
use crate::models::{CategoryKind, User};
use crate::services::CategoryService;
use crate::storage::Storage;

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List categories, grouped by income and expense
    List {
        /// Show a flat table with IDs and owners
        #[arg(long)]
        flat: bool,
        /// Include archived categories
        #[arg(long)]
        all: bool,
    },

    /// Create a custom category
    Add {
        /// Category name
        name: String,
        /// "expense" or "income"
        #[arg(short, long, default_value = "expense")]
        kind: String,
    },

    /// Rename a custom category
    Rename {
        /// Category name or ID
        category: String,
        /// New name
        new_name: String,
    },

    /// Archive a custom category (history is kept)
    Archive {
        /// Category name or ID
        category: String,
        /// Restore instead of archive
        #[arg(long)]
        restore: bool,
    },
}

/// Handle a category command
pub fn handle_category_command(
    storage: &Storage,
    user: &User,
    cmd: CategoryCommands,
) -> FintrackResult<()> {
    let service = CategoryService::new(storage);

    match cmd {
        CategoryCommands::List { flat, all } => {
            let categories: Vec<_> = service
                .list_visible(user.id)?
                .into_iter()
                .filter(|c| all || !c.archived)
                .collect();
            if flat {
                print!("{}", format_category_list(&categories));
            } else {
                print!("{}", format_category_tree(&categories));
            }
        }

        CategoryCommands::Add { name, kind } => {
            let kind: CategoryKind = kind.parse().map_err(FintrackError::Validation)?;
            let category = service.create(user.id, &name, kind)?;
            println!("Created {} category: {}", kind, category.name);
            println!("  ID: {}", category.id);
        }

        CategoryCommands::Rename { category, new_name } => {
            let existing = service.resolve(user.id, &category)?;
            let renamed = service.rename(user.id, existing.id, &new_name)?;
            println!("Renamed '{}' to '{}'", existing.name, renamed.name);
        }

        CategoryCommands::Archive { category, restore } => {
            let existing = service.resolve(user.id, &category)?;
            let updated = service.archive(user.id, existing.id, !restore)?;
            if updated.archived {
                println!("Archived category: {}", updated.name);
            } else {
                println!("Restored category: {}", updated.name);
            }
        }
    }

    Ok(())
}
