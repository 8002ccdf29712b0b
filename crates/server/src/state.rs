use std::sync::Arc;
use helpdesk_core::{Authenticator, Config, SanitizedConfig, TicketStore, UpdatePolicy};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    ticket_store: Arc<dyn TicketStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        ticket_store: Arc<dyn TicketStore>,
    ) -> Self {
        Self {
            config,
            authenticator,
            ticket_store,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn ticket_store(&self) -> &dyn TicketStore {
        self.ticket_store.as_ref()
    }

    pub fn update_policy(&self) -> UpdatePolicy {
        self.config.tickets.update_policy
    }
}
