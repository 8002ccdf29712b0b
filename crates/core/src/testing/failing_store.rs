//! Ticket store whose every call fails.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ticket::{
    Comment, NewComment, NewTicket, Ticket, TicketChange, TicketError, TicketFilter, TicketId,
    TicketStatus, TicketStore, TicketUpdate, TicketWithComments,
};

/// A [`TicketStore`] that returns a database error from every operation.
///
/// Counts calls so tests can assert that validation failures never reach the store.
pub struct FailingTicketStore {
    message: String,
    calls: AtomicUsize,
}

impl FailingTicketStore {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of store operations attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T, TicketError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TicketError::Database(self.message.clone()))
    }
}

impl TicketStore for FailingTicketStore {
    fn find(&self) -> Result<Vec<Ticket>, TicketError> {
        self.fail()
    }

    fn find_by(&self, _filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        self.fail()
    }

    fn add(&self, _ticket: NewTicket, _categories: &[String]) -> Result<Ticket, TicketError> {
        self.fail()
    }

    fn update(
        &self,
        _id: TicketId,
        _update: TicketUpdate,
        _categories: Option<&[String]>,
        _requester: &str,
    ) -> Result<Ticket, TicketError> {
        self.fail()
    }

    fn assert_change(&self, _id: TicketId, _change: TicketChange) -> Result<Ticket, TicketError> {
        self.fail()
    }

    fn remove(&self, _id: TicketId, _requester: &str) -> Result<usize, TicketError> {
        self.fail()
    }

    fn find_by_id(&self, _id: TicketId) -> Result<Option<Ticket>, TicketError> {
        self.fail()
    }

    fn find_by_id_with_comments(
        &self,
        _id: TicketId,
    ) -> Result<Option<TicketWithComments>, TicketError> {
        self.fail()
    }

    fn add_comment(&self, _id: TicketId, _comment: NewComment) -> Result<Comment, TicketError> {
        self.fail()
    }

    fn count_by_status(&self) -> Result<Vec<(TicketStatus, u64)>, TicketError> {
        self.fail()
    }
}
