//! Family group service
//!
//! Membership changes go through here so that the group record and each
//! user's `family_id` always agree. A user belongs to at most one family.

use serde::Serialize;

use crate::audit::EntityType;
use crate::error::{FintrackError, FintrackResult};
use crate::models::family::FamilyValidationError;
use crate::models::{
    BudgetScope, FamilyGroup, FamilyId, Invitation, InvitationId, InvitationStatus, Money, Month,
    UserId,
};
use crate::storage::Storage;

/// Service for family groups
pub struct FamilyService<'a> {
    storage: &'a Storage,
}

/// An open invitation as seen by the invitee
#[derive(Debug, Clone, Serialize)]
pub struct PendingInvitation {
    pub invitation: Invitation,
    pub family_id: FamilyId,
    pub family_name: String,
    pub invited_by: String,
}

/// One member's activity for a month
#[derive(Debug, Clone, Serialize)]
pub struct MemberSpending {
    pub user_id: UserId,
    pub name: String,
    pub is_head: bool,
    pub income: Money,
    pub expenses: Money,
    pub transactions: usize,
    /// Share of the family's expenses, as a percentage
    pub share: f64,
}

fn family_error(err: FamilyValidationError) -> FintrackError {
    match err {
        FamilyValidationError::NotHead => FintrackError::Forbidden(err.to_string()),
        FamilyValidationError::UnknownInvitation => {
            FintrackError::invitation_not_found(err.to_string())
        }
        other => FintrackError::Family(other.to_string()),
    }
}

impl<'a> FamilyService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn get_for_user(&self, user_id: UserId) -> FintrackResult<Option<FamilyGroup>> {
        self.storage.families.find_by_member(user_id)
    }

    fn require_family(&self, user_id: UserId) -> FintrackResult<FamilyGroup> {
        self.get_for_user(user_id)?
            .ok_or_else(|| FintrackError::Family("You are not in a family".into()))
    }

    fn require_head(&self, user_id: UserId) -> FintrackResult<FamilyGroup> {
        let family = self.require_family(user_id)?;
        if !family.is_head(user_id) {
            return Err(family_error(FamilyValidationError::NotHead));
        }
        Ok(family)
    }

    fn set_family_id(&self, user_id: UserId, family_id: Option<FamilyId>) -> FintrackResult<()> {
        if let Some(mut user) = self.storage.users.get(user_id)? {
            user.family_id = family_id;
            user.touch();
            self.storage.users.upsert(user)?;
        }
        Ok(())
    }

    /// Persist a changed group (and the users file, which membership changes
    /// touch) and audit the change
    fn commit(&self, actor: UserId, before: &FamilyGroup, family: &FamilyGroup) -> FintrackResult<()> {
        family.validate().map_err(family_error)?;
        self.storage.families.upsert(family.clone())?;
        self.storage.families.save()?;
        self.storage.users.save()?;
        self.storage.log_update(
            Some(actor),
            EntityType::Family,
            family.id.to_string(),
            Some(family.name.clone()),
            before,
            family,
        )
    }

    /// Start a family with `head` as its only member
    pub fn create_group(&self, head: UserId, name: &str) -> FintrackResult<FamilyGroup> {
        if self.get_for_user(head)?.is_some() {
            return Err(FintrackError::Family(
                "You already belong to a family".into(),
            ));
        }

        let family = FamilyGroup::new(name, head);
        family.validate().map_err(family_error)?;

        self.storage.families.upsert(family.clone())?;
        self.set_family_id(head, Some(family.id))?;
        self.storage.families.save()?;
        self.storage.users.save()?;

        self.storage.log_create(
            Some(head),
            EntityType::Family,
            family.id.to_string(),
            Some(family.name.clone()),
            &family,
        )?;

        Ok(family)
    }

    /// Invite a user by username
    pub fn invite(&self, head: UserId, username: &str) -> FintrackResult<Invitation> {
        let mut family = self.require_head(head)?;
        let invitee = self
            .storage
            .users
            .find_by_username(username)?
            .ok_or_else(|| FintrackError::user_not_found(username))?;

        if invitee.id != head {
            if let Some(other) = self.get_for_user(invitee.id)? {
                if other.id != family.id {
                    return Err(FintrackError::Family(format!(
                        "{} already belongs to another family",
                        invitee.username
                    )));
                }
            }
        }

        let before = family.clone();
        let invitation = family.invite(invitee.id, head).map_err(family_error)?;
        self.commit(head, &before, &family)?;

        Ok(invitation)
    }

    /// Open invitations addressed to a user
    pub fn pending_invitations(&self, user_id: UserId) -> FintrackResult<Vec<PendingInvitation>> {
        let mut pending = Vec::new();
        for family in self.storage.families.with_pending_invitation(user_id)? {
            if let Some(invitation) = family.pending_for(user_id) {
                let invited_by = self
                    .storage
                    .users
                    .get(invitation.invited_by)?
                    .map(|u| u.username)
                    .unwrap_or_default();
                pending.push(PendingInvitation {
                    invitation: invitation.clone(),
                    family_id: family.id,
                    family_name: family.name.clone(),
                    invited_by,
                });
            }
        }
        Ok(pending)
    }

    /// Accept or decline an invitation
    pub fn respond(
        &self,
        invitee: UserId,
        invitation_id: InvitationId,
        accept: bool,
    ) -> FintrackResult<FamilyGroup> {
        let not_found = || FintrackError::invitation_not_found(invitation_id.to_string());
        let mut family = self
            .storage
            .families
            .find_by_invitation(invitation_id)?
            .ok_or_else(not_found)?;

        // Only the invitee may answer; to anyone else it does not exist
        match family.invitation(invitation_id) {
            Some(invitation) if invitation.invitee_id == invitee => {}
            _ => return Err(not_found()),
        }

        if accept && self.get_for_user(invitee)?.is_some() {
            return Err(FintrackError::Family(
                "Leave your current family before joining another".into(),
            ));
        }

        let before = family.clone();
        let status = if accept {
            InvitationStatus::Accepted
        } else {
            InvitationStatus::Declined
        };
        family
            .resolve_invitation(invitation_id, status)
            .map_err(family_error)?;

        if accept {
            self.set_family_id(invitee, Some(family.id))?;
        }
        self.commit(invitee, &before, &family)?;
        Ok(family)
    }

    pub fn revoke(&self, head: UserId, invitation_id: InvitationId) -> FintrackResult<Invitation> {
        let mut family = self.require_head(head)?;
        let before = family.clone();
        let invitation = family
            .resolve_invitation(invitation_id, InvitationStatus::Revoked)
            .map_err(family_error)?;
        self.commit(head, &before, &family)?;
        Ok(invitation)
    }

    /// Remove another member from the head's family
    pub fn remove_member(&self, head: UserId, member: UserId) -> FintrackResult<FamilyGroup> {
        let mut family = self.require_head(head)?;
        let before = family.clone();
        family.remove_member(member).map_err(family_error)?;
        self.set_family_id(member, None)?;
        self.commit(head, &before, &family)?;
        Ok(family)
    }

    /// Leave the current family; the head has to hand over or dissolve instead
    pub fn leave(&self, member: UserId) -> FintrackResult<FamilyGroup> {
        let mut family = self.require_family(member)?;
        let before = family.clone();
        family.remove_member(member).map_err(family_error)?;
        self.set_family_id(member, None)?;
        self.commit(member, &before, &family)?;
        Ok(family)
    }

    pub fn transfer_head(&self, head: UserId, new_head: UserId) -> FintrackResult<FamilyGroup> {
        let mut family = self.require_head(head)?;
        let before = family.clone();
        family.transfer_head(new_head).map_err(family_error)?;
        self.commit(head, &before, &family)?;
        Ok(family)
    }

    /// Delete the family and its budgets; members keep their own data
    pub fn dissolve(&self, head: UserId) -> FintrackResult<FamilyGroup> {
        let family = self.require_head(head)?;

        let budgets = self
            .storage
            .budgets
            .delete_scope(BudgetScope::family(family.id))?;
        for member in family.member_ids() {
            self.set_family_id(member, None)?;
        }
        self.storage.families.delete(family.id)?;

        self.storage.budgets.save()?;
        self.storage.users.save()?;
        self.storage.families.save()?;

        self.storage.log_delete(
            Some(head),
            EntityType::Family,
            family.id.to_string(),
            Some(family.name.clone()),
            &family,
        )?;
        tracing::info!(family = %family.id, budgets, "family dissolved");

        Ok(family)
    }

    /// Per-member income and expenses for a month, biggest spender first
    pub fn member_spending(&self, actor: UserId, month: Month) -> FintrackResult<Vec<MemberSpending>> {
        let family = self.require_family(actor)?;
        let txns = self.storage.transactions.get_for_users_in_range(
            &family.member_ids(),
            month.start_date(),
            month.end_date(),
        )?;
        let family_expenses: Money = txns
            .iter()
            .filter(|t| t.is_expense())
            .map(|t| t.amount)
            .sum();

        let mut rows = Vec::with_capacity(family.members.len());
        for member in &family.members {
            let mine: Vec<_> = txns.iter().filter(|t| t.user_id == member.user_id).collect();
            let expenses: Money = mine.iter().filter(|t| t.is_expense()).map(|t| t.amount).sum();
            let income: Money = mine.iter().filter(|t| t.is_income()).map(|t| t.amount).sum();
            let name = self
                .storage
                .users
                .get(member.user_id)?
                .map(|u| u.name().to_string())
                .unwrap_or_else(|| member.user_id.to_string());

            rows.push(MemberSpending {
                user_id: member.user_id,
                name,
                is_head: family.is_head(member.user_id),
                income,
                expenses,
                transactions: mine.len(),
                share: expenses.percent_of(family_expenses),
            });
        }
        rows.sort_by(|a, b| b.expenses.cmp(&a.expenses));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Budget, Category, CategoryKind, Transaction, User};
    use crate::services::testing::{create_test_storage, register};
    use chrono::NaiveDate;

    fn family_id_of(storage: &Storage, user: &User) -> Option<FamilyId> {
        storage.users.get(user.id).unwrap().unwrap().family_id
    }

    fn join(service: &FamilyService, head: &User, member: &User) {
        let invitation = service.invite(head.id, &member.username).unwrap();
        service.respond(member.id, invitation.id, true).unwrap();
    }

    #[test]
    fn test_create_invite_accept() {
        let (_temp_dir, storage) = create_test_storage();
        let service = FamilyService::new(&storage);
        let alice = register(&storage, "alice");
        let bob = register(&storage, "bob");

        let family = service.create_group(alice.id, "Smiths").unwrap();
        assert_eq!(family_id_of(&storage, &alice), Some(family.id));
        assert!(service.create_group(alice.id, "Again").is_err());

        let invitation = service.invite(alice.id, "BOB").unwrap();
        let pending = service.pending_invitations(bob.id).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].family_name, "Smiths");
        assert_eq!(pending[0].invited_by, "alice");

        // nobody else can answer it
        assert!(service
            .respond(alice.id, invitation.id, true)
            .unwrap_err()
            .is_not_found());

        let family = service.respond(bob.id, invitation.id, true).unwrap();
        assert_eq!(family.members.len(), 2);
        assert_eq!(family_id_of(&storage, &bob), Some(family.id));
        assert!(service.pending_invitations(bob.id).unwrap().is_empty());
    }

    #[test]
    fn test_invite_rules() {
        let (_temp_dir, storage) = create_test_storage();
        let service = FamilyService::new(&storage);
        let alice = register(&storage, "alice");
        let bob = register(&storage, "bob");
        let carol = register(&storage, "carol");

        service.create_group(alice.id, "A").unwrap();
        service.create_group(carol.id, "C").unwrap();

        assert!(service.invite(alice.id, "nobody").unwrap_err().is_not_found());
        assert!(matches!(
            service.invite(alice.id, "carol"),
            Err(FintrackError::Family(_))
        ));

        join(&service, &alice, &bob);
        // members cannot invite
        assert!(service.invite(bob.id, "carol").unwrap_err().is_auth());
        assert!(matches!(
            service.invite(alice.id, "bob"),
            Err(FintrackError::Family(_))
        ));
    }

    #[test]
    fn test_decline_and_revoke() {
        let (_temp_dir, storage) = create_test_storage();
        let service = FamilyService::new(&storage);
        let alice = register(&storage, "alice");
        let bob = register(&storage, "bob");
        service.create_group(alice.id, "A").unwrap();

        let first = service.invite(alice.id, "bob").unwrap();
        service.respond(bob.id, first.id, false).unwrap();
        assert_eq!(family_id_of(&storage, &bob), None);

        let second = service.invite(alice.id, "bob").unwrap();
        let revoked = service.revoke(alice.id, second.id).unwrap();
        assert_eq!(revoked.status, InvitationStatus::Revoked);
        assert!(matches!(
            service.respond(bob.id, second.id, true),
            Err(FintrackError::Family(_))
        ));
    }

    #[test]
    fn test_leave_remove_transfer() {
        let (_temp_dir, storage) = create_test_storage();
        let service = FamilyService::new(&storage);
        let alice = register(&storage, "alice");
        let bob = register(&storage, "bob");
        let carol = register(&storage, "carol");
        service.create_group(alice.id, "A").unwrap();
        join(&service, &alice, &bob);
        join(&service, &alice, &carol);

        assert!(matches!(service.leave(alice.id), Err(FintrackError::Family(_))));

        service.leave(carol.id).unwrap();
        assert_eq!(family_id_of(&storage, &carol), None);

        let family = service.transfer_head(alice.id, bob.id).unwrap();
        assert!(family.is_head(bob.id));
        assert!(service.remove_member(alice.id, bob.id).unwrap_err().is_auth());

        let family = service.remove_member(bob.id, alice.id).unwrap();
        assert_eq!(family.member_ids(), vec![bob.id]);
        assert_eq!(family_id_of(&storage, &alice), None);
    }

    #[test]
    fn test_dissolve_removes_family_budgets() {
        let (_temp_dir, storage) = create_test_storage();
        let service = FamilyService::new(&storage);
        let alice = register(&storage, "alice");
        let bob = register(&storage, "bob");
        let family = service.create_group(alice.id, "A").unwrap();
        join(&service, &alice, &bob);

        let groceries = storage
            .categories
            .find_builtin("Groceries", CategoryKind::Expense)
            .unwrap()
            .unwrap();
        storage
            .budgets
            .upsert(Budget::new(
                BudgetScope::family(family.id),
                groceries.id,
                Month::new(2025, 3).unwrap(),
                Money::from_cents(10_000),
                80,
                alice.id,
            ))
            .unwrap();

        assert!(service.dissolve(bob.id).unwrap_err().is_auth());
        service.dissolve(alice.id).unwrap();

        assert!(storage.families.get(family.id).unwrap().is_none());
        assert_eq!(storage.budgets.count().unwrap(), 0);
        assert_eq!(family_id_of(&storage, &alice), None);
        assert_eq!(family_id_of(&storage, &bob), None);
    }

    #[test]
    fn test_member_spending() {
        let (_temp_dir, storage) = create_test_storage();
        let service = FamilyService::new(&storage);
        let alice = register(&storage, "alice");
        let bob = register(&storage, "bob");
        service.create_group(alice.id, "A").unwrap();
        join(&service, &alice, &bob);

        let food = Category::new("Food", CategoryKind::Expense, alice.id);
        let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        for (user, cents) in [(alice.id, 2_500), (bob.id, 7_500)] {
            storage
                .transactions
                .upsert(Transaction::expense(user, Money::from_cents(cents), food.id, date, ""))
                .unwrap();
        }

        let rows = service
            .member_spending(alice.id, Month::new(2025, 3).unwrap())
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_id, bob.id);
        assert!((rows[0].share - 75.0).abs() < 1e-9);
        assert!(rows[1].is_head);
    }
}
