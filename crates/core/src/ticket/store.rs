//! Ticket storage trait and types.

use thiserror::Error;

use crate::ticket::{
    Comment, Ticket, TicketChange, TicketId, TicketStatus, TicketWithComments, UserId,
};

/// Error type for ticket operations.
#[derive(Debug, Error)]
pub enum TicketError {
    /// Ticket not found.
    #[error("Ticket not found: {0}")]
    NotFound(TicketId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Fields of a ticket being created.
#[derive(Debug, Clone)]
pub struct NewTicket {
    /// User creating the ticket.
    pub posted_by: UserId,
    pub title: String,
    pub description: String,
    pub what_ive_tried: Option<String>,
}

/// Content changes for an existing ticket. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TicketUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub what_ive_tried: Option<String>,
}

/// A comment being attached to a ticket.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub posted_by: UserId,
    pub content: String,
}

/// Filter on whether a ticket currently has a claimant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimedFilter {
    Yes,
    No,
    /// Any value other than true/false, kept uppercased. Matches nothing.
    Other(String),
}

impl ClaimedFilter {
    /// Interpret a raw query value: `true`/`false` in any case become booleans.
    pub fn parse(value: &str) -> Self {
        let upper = value.to_uppercase();
        match upper.as_str() {
            "TRUE" => ClaimedFilter::Yes,
            "FALSE" => ClaimedFilter::No,
            _ => ClaimedFilter::Other(upper),
        }
    }
}

/// Filter for querying tickets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub claimed: Option<ClaimedFilter>,
    pub posted_by: Option<UserId>,
    pub claimed_by: Option<UserId>,
    /// Tickets associated with this category.
    pub category: Option<String>,
}

impl TicketFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_claimed(mut self, claimed: ClaimedFilter) -> Self {
        self.claimed = Some(claimed);
        self
    }

    pub fn with_posted_by(mut self, posted_by: impl Into<String>) -> Self {
        self.posted_by = Some(posted_by.into());
        self
    }

    pub fn with_claimed_by(mut self, claimed_by: impl Into<String>) -> Self {
        self.claimed_by = Some(claimed_by.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// True when no criterion is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Trait for ticket storage backends.
pub trait TicketStore: Send + Sync {
    /// All tickets, oldest first.
    fn find(&self) -> Result<Vec<Ticket>, TicketError>;

    /// Tickets matching every criterion of the filter, oldest first.
    fn find_by(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError>;

    /// Create a ticket (status `OPEN`, unclaimed) and associate its categories.
    fn add(&self, ticket: NewTicket, categories: &[String]) -> Result<Ticket, TicketError>;

    /// Apply content changes. `Some(categories)` replaces the category set.
    fn update(
        &self,
        id: TicketId,
        update: TicketUpdate,
        categories: Option<&[String]>,
        requester: &str,
    ) -> Result<Ticket, TicketError>;

    /// Write a single claim or status change keyed by id.
    fn assert_change(&self, id: TicketId, change: TicketChange) -> Result<Ticket, TicketError>;

    /// Delete a ticket posted by `requester`. Returns the number of rows removed.
    fn remove(&self, id: TicketId, requester: &str) -> Result<usize, TicketError>;

    fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>, TicketError>;

    fn find_by_id_with_comments(
        &self,
        id: TicketId,
    ) -> Result<Option<TicketWithComments>, TicketError>;

    /// Attach a comment to an existing ticket.
    fn add_comment(&self, id: TicketId, comment: NewComment) -> Result<Comment, TicketError>;

    /// Number of tickets per status. Statuses without tickets are omitted.
    fn count_by_status(&self) -> Result<Vec<(TicketStatus, u64)>, TicketError>;
}
