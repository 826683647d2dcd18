//! Transaction model
//!
//! A transaction is a single income or expense entry. Amounts are always stored
//! positive; the kind decides the sign.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, TransactionId, UserId};
use super::money::Money;

pub use super::category::CategoryKind as TransactionKind;

pub const MAX_DESCRIPTION_LEN: usize = 255;
pub const MAX_TAGS: usize = 10;

/// A financial transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,

    /// The user who recorded the transaction
    pub user_id: UserId,

    pub kind: TransactionKind,

    /// Always positive
    pub amount: Money,

    pub category_id: CategoryId,

    pub date: NaiveDate,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub payee: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Import ID for duplicate detection during CSV import
    #[serde(default)]
    pub import_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        user_id: UserId,
        kind: TransactionKind,
        amount: Money,
        category_id: CategoryId,
        date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            user_id,
            kind,
            amount,
            category_id,
            date,
            description: String::new(),
            payee: String::new(),
            tags: Vec::new(),
            import_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Shorthand for an expense with a description
    pub fn expense(
        user_id: UserId,
        amount: Money,
        category_id: CategoryId,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        let mut txn = Self::new(user_id, TransactionKind::Expense, amount, category_id, date);
        txn.description = description.into();
        txn
    }

    /// Shorthand for an income entry with a description
    pub fn income(
        user_id: UserId,
        amount: Money,
        category_id: CategoryId,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        let mut txn = Self::new(user_id, TransactionKind::Income, amount, category_id, date);
        txn.description = description.into();
        txn
    }

    pub fn is_income(&self) -> bool {
        self.kind.is_income()
    }

    pub fn is_expense(&self) -> bool {
        self.kind.is_expense()
    }

    /// Amount with sign applied (negative for expenses)
    pub fn signed_amount(&self) -> Money {
        if self.is_expense() {
            -self.amount
        } else {
            self.amount
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Case-insensitive search over description, payee and tags
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.description.to_lowercase().contains(&needle)
            || self.payee.to_lowercase().contains(&needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if !self.amount.is_positive() {
            return Err(TransactionValidationError::NonPositiveAmount(self.amount));
        }

        let len = self.description.chars().count();
        if len > MAX_DESCRIPTION_LEN {
            return Err(TransactionValidationError::DescriptionTooLong(len));
        }

        if self.tags.len() > MAX_TAGS {
            return Err(TransactionValidationError::TooManyTags(self.tags.len()));
        }

        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(TransactionValidationError::EmptyTag);
        }

        Ok(())
    }

    /// Generate an import ID for duplicate detection
    pub fn generate_import_id(&self) -> String {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.date.hash(&mut hasher);
        self.signed_amount().cents().hash(&mut hasher);
        self.description.trim().to_lowercase().hash(&mut hasher);
        format!("imp-{:016x}", hasher.finish())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.date.format("%Y-%m-%d"),
            self.description,
            self.signed_amount()
        )
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    NonPositiveAmount(Money),
    DescriptionTooLong(usize),
    TooManyTags(usize),
    EmptyTag,
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount(amount) => {
                write!(f, "Transaction amount must be positive (got {})", amount)
            }
            Self::DescriptionTooLong(len) => write!(
                f,
                "Description too long ({} chars, max {})",
                len, MAX_DESCRIPTION_LEN
            ),
            Self::TooManyTags(n) => write!(f, "Too many tags ({}, max {})", n, MAX_TAGS),
            Self::EmptyTag => write!(f, "Tags cannot be empty"),
        }
    }
}

impl std::error::Error for TransactionValidationError {}
