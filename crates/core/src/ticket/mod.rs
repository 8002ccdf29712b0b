//! Support tickets: types, storage and authorization rules.

mod policy;
mod sqlite_store;
mod store;
mod types;

pub use policy::{authorize_action, Forbidden, UpdatePolicy};
pub use sqlite_store::SqliteTicketStore;
pub use store::{
    ClaimedFilter, NewComment, NewTicket, TicketError, TicketFilter, TicketStore, TicketUpdate,
};
pub use types::{
    Comment, LifecycleAction, Ticket, TicketChange, TicketId, TicketStatus, TicketWithComments,
    UserId,
};
