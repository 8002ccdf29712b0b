//! Testing utilities for exercising ticket consumers without a real database.
//!
//! # Example
//!
//! ```rust,ignore
//! use helpdesk_core::testing::FailingTicketStore;
//!
//! let store = Arc::new(FailingTicketStore::new("disk full"));
//! // Every store call now returns TicketError::Database("disk full")
//! ```

mod failing_store;

pub use failing_store::FailingTicketStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::ticket::NewTicket;

    /// A ticket request with reasonable defaults.
    pub fn new_ticket(posted_by: &str, title: &str) -> NewTicket {
        NewTicket {
            posted_by: posted_by.to_string(),
            title: title.to_string(),
            description: format!("Details about: {}", title),
            what_ive_tried: None,
        }
    }
}
