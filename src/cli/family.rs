//! Family group CLI commands
//!
//! Invitations are addressed by username and answered by the invitee; the
//! head manages membership.

use std::collections::HashMap;

use clap::Subcommand;

use crate::display::family::{format_family_details, format_invitations, format_member_spending};
use crate::error::{FintrackError, FintrackResult};
use crate::models::{FamilyGroup, InvitationId, User, UserId};
use crate::services::{FamilyService, UserService};
use crate::storage::Storage;

use super::parse_month;

/// Family subcommands
#[derive(Subcommand)]
pub enum FamilyCommands {
    /// Create a family group with yourself as head
    Create {
        /// Family name
        name: String,
    },

    /// Show your family and its members
    Show,

    /// Invite a user to your family (head only)
    Invite {
        /// Username to invite
        username: String,
    },

    /// Invitations waiting for your answer
    Invitations,

    /// Accept an invitation
    Accept {
        /// Invitation ID or family name
        invitation: String,
    },

    /// Decline an invitation
    Decline {
        /// Invitation ID or family name
        invitation: String,
    },

    /// Withdraw a pending invitation (head only)
    Revoke {
        /// Invitation ID or the invitee's username
        invitation: String,
    },

    /// Remove a member (head only)
    Remove {
        username: String,
    },

    /// Leave your family
    Leave,

    /// Make another member the head (head only)
    Promote {
        username: String,
    },

    /// Dissolve the family and delete its shared budgets (head only)
    Dissolve {
        /// Required to confirm
        #[arg(long)]
        yes: bool,
    },

    /// Each member's spending for a month
    Spending {
        /// Month (YYYY-MM), defaults to the current month
        month: Option<String>,
    },
}

fn member_names(storage: &Storage, family: &FamilyGroup) -> FintrackResult<HashMap<UserId, String>> {
    let users = UserService::new(storage);
    let mut names = HashMap::new();
    for id in family.member_ids() {
        if let Ok(user) = users.get(id) {
            names.insert(id, user.username);
        }
    }
    for invitation in &family.invitations {
        if let Ok(user) = users.get(invitation.invitee_id) {
            names.insert(invitation.invitee_id, user.username);
        }
    }
    Ok(names)
}

/// An invitation to the user, by ID or family name
fn find_pending(
    service: &FamilyService,
    user: &User,
    identifier: &str,
) -> FintrackResult<InvitationId> {
    let pending = service.pending_invitations(user.id)?;
    pending
        .iter()
        .find(|p| {
            p.invitation.id.matches_short(identifier)
                || InvitationId::parse(identifier.trim()).ok() == Some(p.invitation.id)
                || p.family_name.eq_ignore_ascii_case(identifier.trim())
        })
        .map(|p| p.invitation.id)
        .ok_or_else(|| FintrackError::invitation_not_found(identifier))
}

/// Handle a family command
pub fn handle_family_command(
    storage: &Storage,
    user: &User,
    cmd: FamilyCommands,
) -> FintrackResult<()> {
    let service = FamilyService::new(storage);
    let users = UserService::new(storage);

    match cmd {
        FamilyCommands::Create { name } => {
            let family = service.create_group(user.id, &name)?;
            println!("Created family '{}' with you as head", family.name);
            println!("  Invite members with 'fintrack family invite <username>'");
        }

        FamilyCommands::Show => match service.get_for_user(user.id)? {
            Some(family) => {
                let names = member_names(storage, &family)?;
                print!("{}", format_family_details(&family, &names));
            }
            None => println!("You are not in a family group."),
        },

        FamilyCommands::Invite { username } => {
            let invitation = service.invite(user.id, &username)?;
            println!("Invited {} ({})", username, invitation.id);
        }

        FamilyCommands::Invitations => {
            let pending = service.pending_invitations(user.id)?;
            print!("{}", format_invitations(&pending));
        }

        FamilyCommands::Accept { invitation } => {
            let id = find_pending(&service, user, &invitation)?;
            let family = service.respond(user.id, id, true)?;
            println!("Joined family '{}'", family.name);
        }

        FamilyCommands::Decline { invitation } => {
            let id = find_pending(&service, user, &invitation)?;
            let family = service.respond(user.id, id, false)?;
            println!("Declined the invitation to '{}'", family.name);
        }

        FamilyCommands::Revoke { invitation } => {
            let family = service
                .get_for_user(user.id)?
                .ok_or_else(|| FintrackError::Family("You are not in a family group".into()))?;
            let invitee = users.find_by_username(&invitation).ok().map(|u| u.id);
            let id = family
                .invitations
                .iter()
                .filter(|i| i.is_pending())
                .find(|i| i.id.matches_short(&invitation) || Some(i.invitee_id) == invitee)
                .map(|i| i.id)
                .ok_or_else(|| FintrackError::invitation_not_found(&invitation))?;
            service.revoke(user.id, id)?;
            println!("Revoked invitation {}", id);
        }

        FamilyCommands::Remove { username } => {
            let member = users.find_by_username(&username)?;
            let family = service.remove_member(user.id, member.id)?;
            println!("Removed {} from '{}'", member.username, family.name);
        }

        FamilyCommands::Leave => {
            let family = service.leave(user.id)?;
            println!("Left family '{}'", family.name);
        }

        FamilyCommands::Promote { username } => {
            let member = users.find_by_username(&username)?;
            let family = service.transfer_head(user.id, member.id)?;
            println!("{} is now head of '{}'", member.username, family.name);
        }

        FamilyCommands::Dissolve { yes } => {
            if !yes {
                return Err(FintrackError::Validation(
                    "Dissolving deletes the family's shared budgets; re-run with --yes".into(),
                ));
            }
            let family = service.dissolve(user.id)?;
            println!("Dissolved family '{}'", family.name);
        }

        FamilyCommands::Spending { month } => {
            let month = parse_month(month.as_deref())?;
            let spending = service.member_spending(user.id, month)?;
            print!("{}", format_member_spending(month, &spending));
        }
    }

    Ok(())
}
