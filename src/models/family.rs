//! Family group model
//!
//! A family links several user accounts under one head for shared budgeting.
//! The group owns its membership list and its invitations; the methods here
//! enforce the membership invariants that do not need other storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{FamilyId, InvitationId, UserId};

pub const MAX_FAMILY_MEMBERS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyRole {
    Head,
    Member,
}

impl fmt::Display for FamilyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => f.pad("Head"),
            Self::Member => f.pad("Member"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub user_id: UserId,
    pub role: FamilyRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Revoked,
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.pad("Pending"),
            Self::Accepted => f.pad("Accepted"),
            Self::Declined => f.pad("Declined"),
            Self::Revoked => f.pad("Revoked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    pub invitee_id: UserId,
    pub invited_by: UserId,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub responded_at: Option<DateTime<Utc>>,
}

impl Invitation {
    pub fn is_pending(&self) -> bool {
        self.status == InvitationStatus::Pending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyGroup {
    pub id: FamilyId,
    pub name: String,
    pub head_id: UserId,
    pub members: Vec<FamilyMember>,
    #[serde(default)]
    pub invitations: Vec<Invitation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FamilyGroup {
    /// Create a group whose only member is its head
    pub fn new(name: impl Into<String>, head_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: FamilyId::new(),
            name: name.into().trim().to_string(),
            head_id,
            members: vec![FamilyMember {
                user_id: head_id,
                role: FamilyRole::Head,
                joined_at: now,
            }],
            invitations: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_head(&self, user_id: UserId) -> bool {
        self.head_id == user_id
    }

    pub fn is_member(&self, user_id: UserId) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    pub fn member_ids(&self) -> Vec<UserId> {
        self.members.iter().map(|m| m.user_id).collect()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= MAX_FAMILY_MEMBERS
    }

    pub fn invitation(&self, id: InvitationId) -> Option<&Invitation> {
        self.invitations.iter().find(|i| i.id == id)
    }

    pub fn pending_for(&self, invitee: UserId) -> Option<&Invitation> {
        self.invitations
            .iter()
            .find(|i| i.invitee_id == invitee && i.is_pending())
    }

    /// Record a new pending invitation
    ///
    /// Membership of *other* groups is checked by the caller.
    pub fn invite(
        &mut self,
        invitee: UserId,
        invited_by: UserId,
    ) -> Result<Invitation, FamilyValidationError> {
        if !self.is_head(invited_by) {
            return Err(FamilyValidationError::NotHead);
        }
        if self.is_member(invitee) {
            return Err(FamilyValidationError::AlreadyMember);
        }
        if self.pending_for(invitee).is_some() {
            return Err(FamilyValidationError::AlreadyInvited);
        }
        if self.is_full() {
            return Err(FamilyValidationError::Full);
        }

        let invitation = Invitation {
            id: InvitationId::new(),
            invitee_id: invitee,
            invited_by,
            status: InvitationStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
        };
        self.invitations.push(invitation.clone());
        self.updated_at = Utc::now();
        Ok(invitation)
    }

    /// Close a pending invitation with `status`, adding the invitee when accepted
    pub fn resolve_invitation(
        &mut self,
        id: InvitationId,
        status: InvitationStatus,
    ) -> Result<Invitation, FamilyValidationError> {
        let full = self.is_full();
        let now = Utc::now();
        let invitation = self
            .invitations
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(FamilyValidationError::UnknownInvitation)?;

        if !invitation.is_pending() {
            return Err(FamilyValidationError::InvitationClosed(invitation.status));
        }
        if status == InvitationStatus::Accepted && full {
            return Err(FamilyValidationError::Full);
        }

        invitation.status = status;
        invitation.responded_at = Some(now);
        let resolved = invitation.clone();

        if status == InvitationStatus::Accepted {
            self.members.push(FamilyMember {
                user_id: resolved.invitee_id,
                role: FamilyRole::Member,
                joined_at: now,
            });
        }
        self.updated_at = now;
        Ok(resolved)
    }

    /// Remove a non-head member
    pub fn remove_member(&mut self, user_id: UserId) -> Result<(), FamilyValidationError> {
        if self.is_head(user_id) {
            return Err(FamilyValidationError::HeadCannotLeave);
        }
        let before = self.members.len();
        self.members.retain(|m| m.user_id != user_id);
        if self.members.len() == before {
            return Err(FamilyValidationError::NotMember);
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Hand headship to another existing member
    pub fn transfer_head(&mut self, new_head: UserId) -> Result<(), FamilyValidationError> {
        if !self.is_member(new_head) {
            return Err(FamilyValidationError::NotMember);
        }
        if self.is_head(new_head) {
            return Ok(());
        }
        for member in &mut self.members {
            member.role = if member.user_id == new_head {
                FamilyRole::Head
            } else {
                FamilyRole::Member
            };
        }
        self.head_id = new_head;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn validate(&self) -> Result<(), FamilyValidationError> {
        if self.name.trim().is_empty() {
            return Err(FamilyValidationError::EmptyName);
        }
        let heads: Vec<_> = self
            .members
            .iter()
            .filter(|m| m.role == FamilyRole::Head)
            .collect();
        if heads.len() != 1 || heads[0].user_id != self.head_id {
            return Err(FamilyValidationError::HeadMismatch);
        }
        if self.members.len() > MAX_FAMILY_MEMBERS {
            return Err(FamilyValidationError::Full);
        }
        Ok(())
    }
}

impl fmt::Display for FamilyGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} members)", self.name, self.members.len())
    }
}

/// Rule violations on a family group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyValidationError {
    EmptyName,
    HeadMismatch,
    NotHead,
    NotMember,
    AlreadyMember,
    AlreadyInvited,
    Full,
    UnknownInvitation,
    InvitationClosed(InvitationStatus),
    HeadCannotLeave,
}

impl fmt::Display for FamilyValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Family name cannot be empty"),
            Self::HeadMismatch => write!(f, "Family must have exactly one head"),
            Self::NotHead => write!(f, "Only the family head can do that"),
            Self::NotMember => write!(f, "User is not a member of this family"),
            Self::AlreadyMember => write!(f, "User is already a member of this family"),
            Self::AlreadyInvited => write!(f, "User already has a pending invitation"),
            Self::Full => write!(
                f,
                "Family already has the maximum of {} members",
                MAX_FAMILY_MEMBERS
            ),
            Self::UnknownInvitation => write!(f, "Invitation does not belong to this family"),
            Self::InvitationClosed(status) => {
                write!(f, "Invitation is no longer pending ({})", status)
            }
            Self::HeadCannotLeave => write!(
                f,
                "The family head must transfer headship or dissolve the family first"
            ),
        }
    }
}

impl std::error::Error for FamilyValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_group_has_single_head() {
        let head = UserId::new();
        let family = FamilyGroup::new("Smiths", head);
        assert!(family.is_head(head));
        assert!(family.is_member(head));
        assert_eq!(family.members.len(), 1);
        assert!(family.validate().is_ok());
    }

    #[test]
    fn test_invite_and_accept() {
        let head = UserId::new();
        let kid = UserId::new();
        let mut family = FamilyGroup::new("Smiths", head);

        let invite = family.invite(kid, head).unwrap();
        assert_eq!(family.invite(kid, head), Err(FamilyValidationError::AlreadyInvited));

        family
            .resolve_invitation(invite.id, InvitationStatus::Accepted)
            .unwrap();
        assert!(family.is_member(kid));
        assert!(matches!(
            family.resolve_invitation(invite.id, InvitationStatus::Declined),
            Err(FamilyValidationError::InvitationClosed(InvitationStatus::Accepted))
        ));
        assert_eq!(family.invite(kid, head), Err(FamilyValidationError::AlreadyMember));
    }

    #[test]
    fn test_only_head_invites() {
        let head = UserId::new();
        let mut family = FamilyGroup::new("Smiths", head);
        assert_eq!(
            family.invite(UserId::new(), UserId::new()),
            Err(FamilyValidationError::NotHead)
        );
    }

    #[test]
    fn test_member_limit() {
        let head = UserId::new();
        let mut family = FamilyGroup::new("Big", head);
        for _ in 1..MAX_FAMILY_MEMBERS {
            let invite = family.invite(UserId::new(), head).unwrap();
            family
                .resolve_invitation(invite.id, InvitationStatus::Accepted)
                .unwrap();
        }
        assert!(family.is_full());
        assert_eq!(family.invite(UserId::new(), head), Err(FamilyValidationError::Full));
    }

    #[test]
    fn test_transfer_head_and_remove() {
        let head = UserId::new();
        let member = UserId::new();
        let mut family = FamilyGroup::new("Smiths", head);
        let invite = family.invite(member, head).unwrap();
        family
            .resolve_invitation(invite.id, InvitationStatus::Accepted)
            .unwrap();

        assert_eq!(family.remove_member(head), Err(FamilyValidationError::HeadCannotLeave));

        family.transfer_head(member).unwrap();
        assert!(family.is_head(member));
        assert!(family.validate().is_ok());

        family.remove_member(head).unwrap();
        assert!(!family.is_member(head));
        assert_eq!(family.remove_member(head), Err(FamilyValidationError::NotMember));
    }
}
