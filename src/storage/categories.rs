//! Category repository
//!
//! Built-in categories (no owner) and user-defined ones share one file.

use crate::error::FintrackResult;
use crate::models::{Category, CategoryId, CategoryKind, UserId};

use super::repository::{JsonRepository, Record};

pub type CategoryRepository = JsonRepository<Category>;

impl Record for Category {
    type Id = CategoryId;

    fn id(&self) -> CategoryId {
        self.id
    }

    fn owner(&self) -> Option<UserId> {
        self.owner
    }
}

impl JsonRepository<Category> {
    pub fn builtins(&self) -> FintrackResult<Vec<Category>> {
        self.filter(Category::is_builtin)
    }

    pub fn find_builtin(&self, name: &str, kind: CategoryKind) -> FintrackResult<Option<Category>> {
        self.find(|c| c.is_builtin() && c.kind == kind && c.name_matches(name))
    }

    /// Built-ins plus categories owned by any of `owners`, sorted by name
    pub fn visible_to(&self, owners: &[UserId]) -> FintrackResult<Vec<Category>> {
        let mut categories = self.filter(|c| match c.owner {
            None => true,
            Some(owner) => owners.contains(&owner),
        })?;
        categories.sort_by(|a, b| {
            a.kind
                .is_income()
                .cmp(&b.kind.is_income())
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_visibility() {
        let temp_dir = TempDir::new().unwrap();
        let repo = CategoryRepository::new(temp_dir.path().join("categories.json"));
        for c in Category::builtins() {
            repo.upsert(c).unwrap();
        }
        let alice = UserId::new();
        let bob = UserId::new();
        repo.upsert(Category::new("Pets", CategoryKind::Expense, alice))
            .unwrap();
        repo.upsert(Category::new("Boats", CategoryKind::Expense, bob))
            .unwrap();

        let for_alice = repo.visible_to(&[alice]).unwrap();
        assert_eq!(for_alice.len(), Category::builtins().len() + 1);
        assert!(for_alice.iter().any(|c| c.name == "Pets"));
        assert!(!for_alice.iter().any(|c| c.name == "Boats"));
        // expenses sort before income
        assert!(for_alice[0].kind.is_expense());

        assert_eq!(repo.visible_to(&[alice, bob]).unwrap().len(), for_alice.len() + 1);
    }

    #[test]
    fn test_find_builtin() {
        let temp_dir = TempDir::new().unwrap();
        let repo = CategoryRepository::new(temp_dir.path().join("categories.json"));
        for c in Category::builtins() {
            repo.upsert(c).unwrap();
        }

        let groceries = repo.find_builtin("groceries", CategoryKind::Expense).unwrap();
        assert_eq!(groceries.unwrap().name, "Groceries");
        assert!(repo
            .find_builtin("groceries", CategoryKind::Income)
            .unwrap()
            .is_none());
        assert_eq!(repo.builtins().unwrap().len(), 20);
    }
}
