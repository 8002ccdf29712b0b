//! HTTP surface of the helpdesk ticket service.

pub mod api;
pub mod metrics;
pub mod state;
