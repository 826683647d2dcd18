//! Goal, liability and family repositories

use crate::error::FintrackResult;
use crate::models::{
    FamilyGroup, FamilyId, Goal, GoalId, InvitationId, Liability, LiabilityId, UserId,
};

use super::repository::{JsonRepository, Record};

pub type GoalRepository = JsonRepository<Goal>;
pub type LiabilityRepository = JsonRepository<Liability>;
pub type FamilyRepository = JsonRepository<FamilyGroup>;

impl Record for Goal {
    type Id = GoalId;

    fn id(&self) -> GoalId {
        self.id
    }

    fn owner(&self) -> Option<UserId> {
        Some(self.user_id)
    }
}

impl Record for Liability {
    type Id = LiabilityId;

    fn id(&self) -> LiabilityId {
        self.id
    }

    fn owner(&self) -> Option<UserId> {
        Some(self.user_id)
    }
}

impl Record for FamilyGroup {
    type Id = FamilyId;

    fn id(&self) -> FamilyId {
        self.id
    }

    fn owner(&self) -> Option<UserId> {
        Some(self.head_id)
    }
}

impl JsonRepository<FamilyGroup> {
    /// The group `user_id` belongs to, if any
    pub fn find_by_member(&self, user_id: UserId) -> FintrackResult<Option<FamilyGroup>> {
        self.find(|f| f.is_member(user_id))
    }

    pub fn find_by_invitation(&self, id: InvitationId) -> FintrackResult<Option<FamilyGroup>> {
        self.find(|f| f.invitation(id).is_some())
    }

    /// Groups holding a pending invitation for `user_id`
    pub fn with_pending_invitation(&self, user_id: UserId) -> FintrackResult<Vec<FamilyGroup>> {
        self.filter(|f| f.pending_for(user_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_family_lookups() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FamilyRepository::new(temp_dir.path().join("families.json"));
        let head = UserId::new();
        let member = UserId::new();
        let invitee = UserId::new();

        let mut family = FamilyGroup::new("Smiths", head);
        let invite = family.invite(member, head).unwrap().id;
        family
            .resolve_invitation(invite, crate::models::InvitationStatus::Accepted)
            .unwrap();
        let pending = family.invite(invitee, head).unwrap().id;
        repo.upsert(family.clone()).unwrap();

        assert_eq!(repo.find_by_member(member).unwrap().unwrap().id, family.id);
        assert!(repo.find_by_member(invitee).unwrap().is_none());
        assert_eq!(
            repo.find_by_invitation(pending).unwrap().unwrap().id,
            family.id
        );
        assert_eq!(repo.with_pending_invitation(invitee).unwrap().len(), 1);
        assert_eq!(repo.get_by_owner(head).unwrap().len(), 1);
    }
}
