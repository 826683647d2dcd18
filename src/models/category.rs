//! Category model
//!
//! Every transaction and budget refers to a category. Built-in categories have
//! no owner and are visible to everyone; custom categories belong to a user and
//! are shared with that user's family group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{CategoryId, UserId};

pub const MAX_CATEGORY_NAME_LEN: usize = 50;

/// Whether a category (and the transactions filed under it) is money in or out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    #[default]
    Expense,
}

impl CategoryKind {
    pub fn is_income(&self) -> bool {
        matches!(self, Self::Income)
    }

    pub fn is_expense(&self) -> bool {
        matches!(self, Self::Expense)
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => f.pad("Income"),
            Self::Expense => f.pad("Expense"),
        }
    }
}

impl FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" | "credit" => Ok(Self::Income),
            "expense" | "out" | "debit" => Ok(Self::Expense),
            other => Err(format!("Unknown kind '{}' (expected income or expense)", other)),
        }
    }
}

/// Built-in expense categories seeded on first run
pub const BUILTIN_EXPENSE_CATEGORIES: &[&str] = &[
    "Housing",
    "Utilities",
    "Groceries",
    "Dining Out",
    "Transportation",
    "Healthcare",
    "Insurance",
    "Entertainment",
    "Shopping",
    "Education",
    "Travel",
    "Personal Care",
    "Gifts & Donations",
    "Debt Payments",
    "Miscellaneous",
];

/// Built-in income categories seeded on first run
pub const BUILTIN_INCOME_CATEGORIES: &[&str] = &[
    "Salary",
    "Freelance",
    "Investments",
    "Gifts Received",
    "Other Income",
];

/// Category used by imports when an expense category name is not recognised
pub const FALLBACK_EXPENSE_CATEGORY: &str = "Miscellaneous";

/// Category used by imports when an income category name is not recognised
pub const FALLBACK_INCOME_CATEGORY: &str = "Other Income";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,

    pub name: String,

    pub kind: CategoryKind,

    /// `None` for built-in categories
    #[serde(default)]
    pub owner: Option<UserId>,

    /// Archived categories stay attached to history but take no new entries
    #[serde(default)]
    pub archived: bool,

    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a custom category owned by `owner`
    pub fn new(name: impl Into<String>, kind: CategoryKind, owner: UserId) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into().trim().to_string(),
            kind,
            owner: Some(owner),
            archived: false,
            created_at: Utc::now(),
        }
    }

    /// Create a built-in category
    pub fn builtin(name: impl Into<String>, kind: CategoryKind) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            kind,
            owner: None,
            archived: false,
            created_at: Utc::now(),
        }
    }

    /// All built-in categories, expenses first
    pub fn builtins() -> Vec<Category> {
        BUILTIN_EXPENSE_CATEGORIES
            .iter()
            .map(|name| Self::builtin(*name, CategoryKind::Expense))
            .chain(
                BUILTIN_INCOME_CATEGORIES
                    .iter()
                    .map(|name| Self::builtin(*name, CategoryKind::Income)),
            )
            .collect()
    }

    pub fn is_builtin(&self) -> bool {
        self.owner.is_none()
    }

    /// Case-insensitive name comparison
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }

    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        if self.name.trim().is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }

        if self.name.len() > MAX_CATEGORY_NAME_LEN {
            return Err(CategoryValidationError::NameTooLong(self.name.len()));
        }

        Ok(())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.name)
    }
}

/// Validation errors for categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    EmptyName,
    NameTooLong(usize),
}

impl fmt::Display for CategoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Category name cannot be empty"),
            Self::NameTooLong(len) => write!(
                f,
                "Category name too long ({} chars, max {})",
                len, MAX_CATEGORY_NAME_LEN
            ),
        }
    }
}

impl std::error::Error for CategoryValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_category() {
        let owner = UserId::new();
        let category = Category::new("  Pets ", CategoryKind::Expense, owner);

        assert_eq!(category.name, "Pets");
        assert_eq!(category.owner, Some(owner));
        assert!(!category.is_builtin());
        assert!(!category.archived);
    }

    #[test]
    fn test_builtins() {
        let builtins = Category::builtins();
        assert_eq!(builtins.len(), 20);
        assert!(builtins.iter().all(Category::is_builtin));
        assert_eq!(
            builtins.iter().filter(|c| c.kind.is_income()).count(),
            BUILTIN_INCOME_CATEGORIES.len()
        );
        assert!(builtins.iter().any(|c| c.name == FALLBACK_EXPENSE_CATEGORY));
        assert!(builtins.iter().any(|c| c.name == FALLBACK_INCOME_CATEGORY));
    }

    #[test]
    fn test_validation() {
        let mut category = Category::new("Valid", CategoryKind::Expense, UserId::new());
        assert!(category.validate().is_ok());

        category.name = "   ".into();
        assert_eq!(category.validate(), Err(CategoryValidationError::EmptyName));

        category.name = "a".repeat(51);
        assert!(matches!(
            category.validate(),
            Err(CategoryValidationError::NameTooLong(51))
        ));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("Income".parse::<CategoryKind>().unwrap(), CategoryKind::Income);
        assert_eq!("debit".parse::<CategoryKind>().unwrap(), CategoryKind::Expense);
        assert!("transfer".parse::<CategoryKind>().is_err());
    }

    #[test]
    fn test_name_matches() {
        let category = Category::builtin("Dining Out", CategoryKind::Expense);
        assert!(category.name_matches("dining out"));
        assert!(!category.name_matches("Dining"));
    }
}
