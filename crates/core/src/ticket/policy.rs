//! Authorization rules for ticket changes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{LifecycleAction, Ticket};

/// Reasons a requester may not change a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Forbidden {
    #[error("This ticket is already claimed")]
    ClaimedByOther,

    #[error("Nobody has claimed this ticket")]
    NotClaimed,

    #[error("You can't claim or release your own ticket")]
    OwnTicket,

    #[error("You've already claimed this ticket")]
    AlreadyClaimed,

    #[error("You can only update your own ticket")]
    NotOwner,
}

/// Check a lifecycle action against the ticket's current claim and ownership.
///
/// Rules are evaluated in order and the first failing one wins:
/// 1. a claim held by someone else blocks every action;
/// 2. an unclaimed ticket cannot be released;
/// 3. the poster can neither claim nor release their own ticket;
/// 4. the current claimant cannot claim again.
pub fn authorize_action(
    ticket: &Ticket,
    requester: &str,
    action: LifecycleAction,
) -> Result<(), Forbidden> {
    if ticket.is_claimed() && !ticket.is_claimed_by(requester) {
        return Err(Forbidden::ClaimedByOther);
    }

    if !ticket.is_claimed() && action == LifecycleAction::Release {
        return Err(Forbidden::NotClaimed);
    }

    if ticket.is_posted_by(requester) && action.affects_claim() {
        return Err(Forbidden::OwnTicket);
    }

    if ticket.is_claimed_by(requester) && action == LifecycleAction::Claim {
        return Err(Forbidden::AlreadyClaimed);
    }

    Ok(())
}

/// Who may change a ticket's content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePolicy {
    /// Any authenticated user may update any ticket.
    #[default]
    AnyUser,
    /// Only the poster may update a ticket.
    OwnerOnly,
}

impl UpdatePolicy {
    /// Whether the current ticket must be loaded before checking this policy.
    pub fn needs_ticket(&self) -> bool {
        matches!(self, UpdatePolicy::OwnerOnly)
    }

    pub fn authorize(&self, ticket: &Ticket, requester: &str) -> Result<(), Forbidden> {
        match self {
            UpdatePolicy::AnyUser => Ok(()),
            UpdatePolicy::OwnerOnly if ticket.is_posted_by(requester) => Ok(()),
            UpdatePolicy::OwnerOnly => Err(Forbidden::NotOwner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::TicketStatus;
    use chrono::Utc;

    fn ticket(posted_by: &str, claimed_by: Option<&str>) -> Ticket {
        let now = Utc::now();
        Ticket {
            id: 1,
            title: "VPN drops".to_string(),
            description: "Disconnects every ten minutes".to_string(),
            what_ive_tried: None,
            posted_by: posted_by.to_string(),
            claimed_by: claimed_by.map(str::to_string),
            status: TicketStatus::Open,
            categories: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_claim_unclaimed_ticket_of_someone_else() {
        let t = ticket("alice", None);
        assert_eq!(authorize_action(&t, "bob", LifecycleAction::Claim), Ok(()));
    }

    #[test]
    fn test_claimed_by_other_blocks_every_action() {
        let t = ticket("alice", Some("bob"));
        for action in [
            LifecycleAction::Claim,
            LifecycleAction::Release,
            LifecycleAction::Open,
            LifecycleAction::Close,
            LifecycleAction::Resolve,
        ] {
            assert_eq!(
                authorize_action(&t, "carol", action),
                Err(Forbidden::ClaimedByOther)
            );
        }
        // The poster is blocked too while someone else holds the claim
        assert_eq!(
            authorize_action(&t, "alice", LifecycleAction::Close),
            Err(Forbidden::ClaimedByOther)
        );
    }

    #[test]
    fn test_release_unclaimed_ticket() {
        let t = ticket("alice", None);
        assert_eq!(
            authorize_action(&t, "bob", LifecycleAction::Release),
            Err(Forbidden::NotClaimed)
        );
    }

    #[test]
    fn test_poster_cannot_claim_own_ticket() {
        let t = ticket("alice", None);
        assert_eq!(
            authorize_action(&t, "alice", LifecycleAction::Claim),
            Err(Forbidden::OwnTicket)
        );
    }

    #[test]
    fn test_poster_releasing_unclaimed_ticket_reports_not_claimed() {
        let t = ticket("alice", None);
        assert_eq!(
            authorize_action(&t, "alice", LifecycleAction::Release),
            Err(Forbidden::NotClaimed)
        );
    }

    #[test]
    fn test_claimant_cannot_claim_again() {
        let t = ticket("alice", Some("bob"));
        assert_eq!(
            authorize_action(&t, "bob", LifecycleAction::Claim),
            Err(Forbidden::AlreadyClaimed)
        );
    }

    #[test]
    fn test_claimant_can_release_and_change_status() {
        let t = ticket("alice", Some("bob"));
        assert_eq!(authorize_action(&t, "bob", LifecycleAction::Release), Ok(()));
        assert_eq!(authorize_action(&t, "bob", LifecycleAction::Resolve), Ok(()));
    }

    #[test]
    fn test_status_actions_on_unclaimed_ticket() {
        let t = ticket("alice", None);
        assert_eq!(authorize_action(&t, "alice", LifecycleAction::Close), Ok(()));
        assert_eq!(authorize_action(&t, "bob", LifecycleAction::Open), Ok(()));
    }

    #[test]
    fn test_forbidden_messages() {
        assert_eq!(
            Forbidden::ClaimedByOther.to_string(),
            "This ticket is already claimed"
        );
        assert_eq!(
            Forbidden::OwnTicket.to_string(),
            "You can't claim or release your own ticket"
        );
    }

    #[test]
    fn test_update_policy_any_user() {
        let t = ticket("alice", None);
        assert!(!UpdatePolicy::AnyUser.needs_ticket());
        assert_eq!(UpdatePolicy::AnyUser.authorize(&t, "mallory"), Ok(()));
    }

    #[test]
    fn test_update_policy_owner_only() {
        let t = ticket("alice", None);
        assert!(UpdatePolicy::OwnerOnly.needs_ticket());
        assert_eq!(UpdatePolicy::OwnerOnly.authorize(&t, "alice"), Ok(()));
        assert_eq!(
            UpdatePolicy::OwnerOnly.authorize(&t, "mallory"),
            Err(Forbidden::NotOwner)
        );
    }
}
