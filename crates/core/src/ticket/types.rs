//! Core ticket data types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ticket identifier assigned by the store.
pub type TicketId = i64;

/// Identifier of an authenticated user (the session subject).
pub type UserId = String;

// ============================================================================
// Status
// ============================================================================

/// Status of a ticket.
///
/// This is the closed set used both by list filtering and by the lifecycle
/// actions that change a ticket's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TicketStatus {
    Open,
    Closed,
    Resolved,
}

impl TicketStatus {
    /// Every status, in display order.
    pub const ALL: [TicketStatus; 3] = [
        TicketStatus::Open,
        TicketStatus::Closed,
        TicketStatus::Resolved,
    ];

    /// Parse a status, ignoring case. Returns `None` for anything outside the set.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_uppercase().as_str() {
            "OPEN" => Some(TicketStatus::Open),
            "CLOSED" => Some(TicketStatus::Closed),
            "RESOLVED" => Some(TicketStatus::Resolved),
            _ => None,
        }
    }

    /// Canonical (stored and serialized) representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "OPEN",
            TicketStatus::Closed => "CLOSED",
            TicketStatus::Resolved => "RESOLVED",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Lifecycle Actions
// ============================================================================

/// A named transition applied to a ticket through the action endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    /// Assign the ticket to the requester.
    Claim,
    /// Drop the current claim.
    Release,
    Open,
    Close,
    Resolve,
}

impl LifecycleAction {
    /// Parse an action name, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_uppercase().as_str() {
            "CLAIM" => Some(LifecycleAction::Claim),
            "RELEASE" => Some(LifecycleAction::Release),
            "OPEN" => Some(LifecycleAction::Open),
            "CLOSE" => Some(LifecycleAction::Close),
            "RESOLVE" => Some(LifecycleAction::Resolve),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleAction::Claim => "claim",
            LifecycleAction::Release => "release",
            LifecycleAction::Open => "open",
            LifecycleAction::Close => "close",
            LifecycleAction::Resolve => "resolve",
        }
    }

    /// True for the actions that touch the claim rather than the status.
    pub fn affects_claim(&self) -> bool {
        matches!(self, LifecycleAction::Claim | LifecycleAction::Release)
    }

    /// The stored change this action produces when issued by `requester`.
    pub fn change(&self, requester: &str) -> TicketChange {
        match self {
            LifecycleAction::Claim => TicketChange::SetClaimant(requester.to_string()),
            LifecycleAction::Release => TicketChange::ClearClaimant,
            LifecycleAction::Open => TicketChange::SetStatus(TicketStatus::Open),
            LifecycleAction::Close => TicketChange::SetStatus(TicketStatus::Closed),
            LifecycleAction::Resolve => TicketChange::SetStatus(TicketStatus::Resolved),
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single-field change written by the conditional update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketChange {
    SetClaimant(UserId),
    ClearClaimant,
    SetStatus(TicketStatus),
}

// ============================================================================
// Ticket
// ============================================================================

/// A support ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub what_ive_tried: Option<String>,
    /// Creator of the ticket. Never changes after creation.
    pub posted_by: UserId,
    /// User currently handling the ticket, if any.
    #[serde(default)]
    pub claimed_by: Option<UserId>,
    pub status: TicketStatus,
    #[serde(default)]
    pub categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn is_claimed(&self) -> bool {
        self.claimed_by.is_some()
    }

    pub fn is_posted_by(&self, user_id: &str) -> bool {
        self.posted_by == user_id
    }

    pub fn is_claimed_by(&self, user_id: &str) -> bool {
        self.claimed_by.as_deref() == Some(user_id)
    }
}

/// A comment attached to a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub ticket_id: TicketId,
    pub posted_by: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A ticket together with its comments, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketWithComments {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub comments: Vec<Comment>,
}
