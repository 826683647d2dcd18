//! User service
//!
//! Profile reads and edits, and account deletion with its cascade.

use crate::audit::EntityType;
use crate::crypto::verify_password;
use crate::error::{FintrackError, FintrackResult};
use crate::models::user::{normalize, validate_email};
use crate::models::{BudgetScope, User, UserId, UserProfile};
use crate::storage::Storage;

/// Service for user accounts
pub struct UserService<'a> {
    storage: &'a Storage,
}

impl<'a> UserService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Get a user by ID
    pub fn get(&self, id: UserId) -> FintrackResult<User> {
        self.storage
            .users
            .get(id)?
            .ok_or_else(|| FintrackError::user_not_found(id.to_string()))
    }

    pub fn find_by_username(&self, username: &str) -> FintrackResult<User> {
        self.storage
            .users
            .find_by_username(username)?
            .ok_or_else(|| FintrackError::user_not_found(username))
    }

    pub fn profile(&self, id: UserId) -> FintrackResult<UserProfile> {
        Ok(self.get(id)?.profile())
    }

    /// Change display name and/or email
    pub fn update_profile(
        &self,
        id: UserId,
        display_name: Option<&str>,
        email: Option<&str>,
    ) -> FintrackResult<User> {
        let mut user = self.get(id)?;
        let before = user.profile();

        if let Some(name) = display_name {
            user.display_name = name.trim().to_string();
        }

        if let Some(email) = email {
            let email = normalize(email);
            validate_email(&email).map_err(|e| FintrackError::Validation(e.to_string()))?;
            if let Some(existing) = self.storage.users.find_by_email(&email)? {
                if existing.id != id {
                    return Err(FintrackError::Duplicate {
                        entity_type: "User",
                        identifier: email,
                    });
                }
            }
            user.email = email;
        }

        user.validate()
            .map_err(|e| FintrackError::Validation(e.to_string()))?;
        user.touch();

        self.storage.users.upsert(user.clone())?;
        self.storage.users.save()?;

        self.storage.log_update(
            Some(id),
            EntityType::User,
            user.id.to_string(),
            Some(user.username.clone()),
            &before,
            &user.profile(),
        )?;

        Ok(user)
    }

    /// Delete an account and everything it owns
    ///
    /// A head with other members must hand over headship first; a sole head
    /// takes the group (and its budgets) down with them.
    pub fn delete_account(&self, id: UserId, password: &str) -> FintrackResult<()> {
        let user = self.get(id)?;
        if !verify_password(password, &user.password_hash) {
            return Err(FintrackError::Unauthorized("Password is incorrect".into()));
        }

        if let Some(mut family) = self.storage.families.find_by_member(id)? {
            if family.is_head(id) {
                if family.members.len() > 1 {
                    return Err(FintrackError::Family(
                        "Transfer headship or dissolve the family before deleting this account"
                            .into(),
                    ));
                }
                self.storage
                    .budgets
                    .delete_scope(BudgetScope::family(family.id))?;
                self.storage.families.delete(family.id)?;
            } else {
                family
                    .remove_member(id)
                    .map_err(|e| FintrackError::Family(e.to_string()))?;
                self.storage.families.upsert(family)?;
            }
        }

        // Open invitations addressed to this user go away with the account
        for mut family in self.storage.families.with_pending_invitation(id)? {
            family.invitations.retain(|i| i.invitee_id != id);
            self.storage.families.upsert(family)?;
        }

        let transactions = self.storage.transactions.delete_by_user(id)?;
        let budgets = self.storage.budgets.delete_scope(BudgetScope::personal(id))?;
        let goals = self.storage.goals.delete_where(|g| g.user_id == id)?;
        let liabilities = self.storage.liabilities.delete_where(|l| l.user_id == id)?;
        let categories = self
            .storage
            .categories
            .delete_where(|c| c.owner == Some(id))?;
        self.storage.sessions.delete_for_user(id, None)?;
        self.storage.users.delete(id)?;

        self.storage.save_all()?;

        self.storage.log_delete(
            Some(id),
            EntityType::User,
            user.id.to_string(),
            Some(user.username.clone()),
            &user.profile(),
        )?;
        tracing::info!(
            user = %id,
            transactions,
            budgets,
            goals,
            liabilities,
            categories,
            "account deleted"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, CategoryKind, FamilyGroup, Goal, GoalKind, Money};
    use crate::services::testing::{create_test_storage, register};

    #[test]
    fn test_update_profile() {
        let (_temp_dir, storage) = create_test_storage();
        let service = UserService::new(&storage);
        let alice = register(&storage, "alice");
        register(&storage, "bob");

        let updated = service
            .update_profile(alice.id, Some("Alice A."), Some("New@Example.com"))
            .unwrap();
        assert_eq!(updated.display_name, "Alice A.");
        assert_eq!(updated.email, "new@example.com");

        let taken = service.update_profile(alice.id, None, Some("bob@example.com"));
        assert!(matches!(taken, Err(FintrackError::Duplicate { .. })));

        assert!(service
            .update_profile(alice.id, None, Some("not-an-email"))
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_delete_account_cascades() {
        let (_temp_dir, storage) = create_test_storage();
        let service = UserService::new(&storage);
        let alice = register(&storage, "alice");
        let bob = register(&storage, "bob");

        storage
            .categories
            .upsert(Category::new("Hobbies", CategoryKind::Expense, alice.id))
            .unwrap();
        storage
            .goals
            .upsert(Goal::new(
                alice.id,
                "Bike",
                GoalKind::Purchase,
                Money::from_cents(50_000),
                None,
            ))
            .unwrap();
        storage
            .goals
            .upsert(Goal::new(
                bob.id,
                "Trip",
                GoalKind::Travel,
                Money::from_cents(90_000),
                None,
            ))
            .unwrap();

        assert!(service.delete_account(alice.id, "wrong-password").is_err());
        service.delete_account(alice.id, "password123").unwrap();

        assert!(service.get(alice.id).unwrap_err().is_not_found());
        assert!(storage.goals.get_by_owner(alice.id).unwrap().is_empty());
        assert_eq!(storage.goals.get_by_owner(bob.id).unwrap().len(), 1);
        assert!(storage
            .categories
            .visible_to(&[alice.id])
            .unwrap()
            .iter()
            .all(|c| c.is_builtin()));
    }

    #[test]
    fn test_head_with_members_cannot_delete() {
        let (_temp_dir, storage) = create_test_storage();
        let service = UserService::new(&storage);
        let alice = register(&storage, "alice");
        let bob = register(&storage, "bob");

        let mut family = FamilyGroup::new("Home", alice.id);
        let invitation = family.invite(bob.id, alice.id).unwrap();
        family
            .resolve_invitation(invitation.id, crate::models::InvitationStatus::Accepted)
            .unwrap();
        storage.families.upsert(family.clone()).unwrap();

        let result = service.delete_account(alice.id, "password123");
        assert!(matches!(result, Err(FintrackError::Family(_))));

        // a plain member leaves the group on deletion
        service.delete_account(bob.id, "password123").unwrap();
        let family = storage.families.get(family.id).unwrap().unwrap();
        assert_eq!(family.member_ids(), vec![alice.id]);
    }
}
