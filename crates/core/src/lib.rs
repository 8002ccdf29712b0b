pub mod auth;
pub mod config;
pub mod testing;
pub mod ticket;

pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, Identity, JwtAuthenticator,
    NoneAuthenticator, SessionClaims,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod, Config,
    ConfigError, DatabaseConfig, SanitizedConfig, ServerConfig, TicketsConfig,
};
pub use ticket::{
    authorize_action, ClaimedFilter, Comment, Forbidden, LifecycleAction, NewComment, NewTicket,
    SqliteTicketStore, Ticket, TicketChange, TicketError, TicketFilter, TicketId, TicketStatus,
    TicketStore, TicketUpdate, TicketWithComments, UpdatePolicy, UserId,
};
