//! Family display formatting

use std::collections::HashMap;

use crate::models::{FamilyGroup, Month, UserId};
use crate::services::{MemberSpending, PendingInvitation};

use super::{format_bar, truncate};

/// Group name, members with roles, and pending invitations
pub fn format_family_details(family: &FamilyGroup, names: &HashMap<UserId, String>) -> String {
    let name_of = |id: &UserId| names.get(id).cloned().unwrap_or_else(|| id.to_string());
    let mut output = String::new();

    output.push_str(&format!("Family: {}\n", family.name));
    output.push_str(&format!("  ID: {}\n", family.id));
    output.push_str(&format!("\nMembers ({}):\n", family.members.len()));
    for member in &family.members {
        output.push_str(&format!(
            "  {:<24} {:<7} joined {}\n",
            name_of(&member.user_id),
            member.role,
            member.joined_at.format("%Y-%m-%d")
        ));
    }

    let pending: Vec<_> = family.invitations.iter().filter(|i| i.is_pending()).collect();
    if !pending.is_empty() {
        output.push_str("\nPending invitations:\n");
        for invitation in pending {
            output.push_str(&format!(
                "  {}  {} (sent {})\n",
                invitation.id,
                name_of(&invitation.invitee_id),
                invitation.created_at.format("%Y-%m-%d")
            ));
        }
    }

    output
}

pub fn format_invitations(invitations: &[PendingInvitation]) -> String {
    if invitations.is_empty() {
        return "No pending invitations.\n".to_string();
    }

    let mut output = String::new();
    for pending in invitations {
        output.push_str(&format!(
            "{}  {} invited you to '{}' on {}\n",
            pending.invitation.id,
            pending.invited_by,
            pending.family_name,
            pending.invitation.created_at.format("%Y-%m-%d")
        ));
    }
    output
}

/// Each member's income, spending and share of the family's spending
pub fn format_member_spending(month: Month, members: &[MemberSpending]) -> String {
    let mut output = format!("Family spending for {}\n", month);
    output.push_str(&format!(
        "{:<22} {:>12} {:>12} {:>6} {:>7}\n",
        "Member", "Income", "Expenses", "Txns", "Share"
    ));
    output.push_str(&"-".repeat(64));
    output.push('\n');

    for member in members {
        let name = if member.is_head {
            format!("{} *", truncate(&member.name, 20))
        } else {
            truncate(&member.name, 22)
        };
        output.push_str(&format!(
            "{:<22} {:>12} {:>12} {:>6} {:>6.1}% {}\n",
            name,
            member.income,
            member.expenses,
            member.transactions,
            member.share,
            format_bar(member.share, 100.0, 10)
        ));
    }
    output.push_str("\n* family head\n");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;

    #[test]
    fn test_family_details() {
        let head = UserId::new();
        let family = FamilyGroup::new("Rivera household", head);
        let names = HashMap::from([(head, "Ana".to_string())]);

        let text = format_family_details(&family, &names);
        assert!(text.starts_with("Family: Rivera household"));
        assert!(text.contains("Members (1):"));
        assert!(text.contains("Ana"));
        assert!(!text.contains("Pending invitations"));
    }

    #[test]
    fn test_member_spending() {
        let rows = vec![MemberSpending {
            user_id: UserId::new(),
            name: "Ana".into(),
            is_head: true,
            income: Money::from_cents(100_000),
            expenses: Money::from_cents(40_000),
            transactions: 7,
            share: 100.0,
        }];
        let text = format_member_spending(Month::new(2025, 8).unwrap(), &rows);
        assert!(text.contains("Ana *"));
        assert!(text.contains("100.0%"));
    }
}
