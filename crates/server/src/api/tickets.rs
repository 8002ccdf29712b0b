//! Ticket API handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use helpdesk_core::{
    authorize_action, ClaimedFilter, Comment, LifecycleAction, NewComment, NewTicket, Ticket,
    TicketError, TicketFilter, TicketId, TicketStatus, TicketStore, TicketUpdate,
    TicketWithComments,
};

use super::error::{ApiError, LookupError};
use super::middleware::AuthUser;
use crate::metrics::{TICKETS_CREATED_TOTAL, TICKET_ACTIONS_TOTAL};
use crate::state::AppState;

const LIST_FAILED: &str = "There was a problem getting the tickets";
const CREATE_FAILED: &str = "There was a problem creating the ticket";
const UPDATE_FAILED: &str = "There was a problem updating the ticket";
const DELETE_FAILED: &str = "There was a problem deleting the ticket";
const COMMENT_FAILED: &str = "There was a problem adding the comment";

const MISSING_TITLE: &str = "Please provide a title and description";

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing tickets
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListTicketsParams {
    /// OPEN, CLOSED or RESOLVED, any case
    pub status: Option<String>,
    /// "true" / "false", any case
    pub claimed: Option<String>,
    pub posted_by: Option<String>,
    pub claimed_by: Option<String>,
    pub category: Option<String>,
}

impl ListTicketsParams {
    /// Validate the raw query into a store filter.
    pub fn into_filter(self) -> Result<TicketFilter, ApiError> {
        let mut filter = TicketFilter::new();

        if let Some(status) = self.status {
            let status = TicketStatus::parse(&status)
                .ok_or_else(|| ApiError::Validation("Please provide a valid status".to_string()))?;
            filter = filter.with_status(status);
        }

        if let Some(claimed) = self.claimed {
            filter = filter.with_claimed(ClaimedFilter::parse(&claimed));
        }

        if let Some(posted_by) = self.posted_by {
            filter = filter.with_posted_by(posted_by);
        }

        if let Some(claimed_by) = self.claimed_by {
            filter = filter.with_claimed_by(claimed_by);
        }

        if let Some(category) = self.category {
            filter = filter.with_category(category);
        }

        Ok(filter)
    }
}

/// Request body for creating a ticket
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTicketBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub what_ive_tried: Option<String>,
    pub categories: Option<Vec<CategoryRef>>,
}

/// Request body for updating a ticket. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTicketBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub what_ive_tried: Option<String>,
    pub categories: Option<Vec<CategoryRef>>,
}

/// A category given by name or by numeric id. Both are stored as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Name(String),
    Id(i64),
}

impl From<CategoryRef> for String {
    fn from(category: CategoryRef) -> Self {
        match category {
            CategoryRef::Name(name) => name,
            CategoryRef::Id(id) => id.to_string(),
        }
    }
}

fn category_names(categories: Vec<CategoryRef>) -> Vec<String> {
    categories.into_iter().map(String::from).collect()
}

/// Request body for commenting on a ticket
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddCommentBody {
    pub content: Option<String>,
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_ticket_id(raw: &str) -> Result<TicketId, ApiError> {
    raw.parse::<TicketId>()
        .map_err(|_| ApiError::Validation("Please provide a valid ticket id".to_string()))
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    debug!("Rejected request body: {}", rejection.body_text());
    ApiError::Validation("Please provide a valid request body".to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Log a store failure with its cause and hide it behind a generic message.
fn store_failure(e: TicketError, message: &str) -> ApiError {
    error!("{}: {}", message, e);
    ApiError::Internal(message.to_string())
}

/// Load the current ticket before changing it. A missing ticket is an internal failure.
fn load_for_change(
    store: &dyn TicketStore,
    id: TicketId,
    message: &str,
) -> Result<Ticket, ApiError> {
    match store.find_by_id(id) {
        Ok(Some(ticket)) => Ok(ticket),
        Ok(None) => {
            warn!(ticket_id = id, "Ticket to change does not exist");
            Err(ApiError::Internal(message.to_string()))
        }
        Err(e) => Err(store_failure(e, message)),
    }
}

fn invalid_action() -> ApiError {
    ApiError::Validation("Please provide a valid action".to_string())
}

fn record_action(action: LifecycleAction, outcome: &str) {
    TICKET_ACTIONS_TOTAL
        .with_label_values(&[action.as_str(), outcome])
        .inc();
}

// ============================================================================
// Handlers
// ============================================================================

/// List tickets, optionally filtered
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListTicketsParams>, QueryRejection>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let Query(params) = params.map_err(|e| {
        debug!("Rejected ticket filter: {}", e.body_text());
        ApiError::Validation("Please provide a valid filter".to_string())
    })?;
    let filter = params.into_filter()?;

    let store = state.ticket_store();
    let tickets = if filter.is_empty() {
        store.find()
    } else {
        store.find_by(&filter)
    };

    tickets
        .map(Json)
        .map_err(|e| store_failure(e, LIST_FAILED))
}

/// Create a new ticket posted by the requester
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CreateTicketBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let Json(body) = payload.map_err(invalid_body)?;

    let (Some(title), Some(description)) = (non_empty(body.title), non_empty(body.description))
    else {
        return Err(ApiError::Validation(MISSING_TITLE.to_string()));
    };

    let new_ticket = NewTicket {
        posted_by: user_id,
        title,
        description,
        what_ive_tried: body.what_ive_tried,
    };
    let categories = body.categories.map(category_names).unwrap_or_default();

    let ticket = state
        .ticket_store()
        .add(new_ticket, &categories)
        .map_err(|e| store_failure(e, CREATE_FAILED))?;

    TICKETS_CREATED_TOTAL.inc();
    info!(ticket_id = ticket.id, posted_by = %ticket.posted_by, "Ticket created");

    Ok((StatusCode::CREATED, Json(ticket)))
}

/// Update a ticket's content and categories
pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTicketBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let id = parse_ticket_id(&id)?;
    let Json(body) = payload.map_err(invalid_body)?;

    if body.title.as_deref() == Some("") || body.description.as_deref() == Some("") {
        return Err(ApiError::Validation(MISSING_TITLE.to_string()));
    }

    let store = state.ticket_store();

    let policy = state.update_policy();
    if policy.needs_ticket() {
        let current = load_for_change(store, id, UPDATE_FAILED)?;
        policy.authorize(&current, &user_id)?;
    }

    let update = TicketUpdate {
        title: body.title,
        description: body.description,
        what_ive_tried: body.what_ive_tried,
    };

    let categories = body.categories.map(category_names);

    let ticket = store
        .update(id, update, categories.as_deref(), &user_id)
        .map_err(|e| store_failure(e, UPDATE_FAILED))?;

    info!(ticket_id = id, requester = %user_id, "Ticket updated");

    Ok((StatusCode::CREATED, Json(ticket)))
}

/// Apply a lifecycle action (claim, release, open, close, resolve)
pub async fn apply_action(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path((id, action)): Path<(String, String)>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let Some(action) = LifecycleAction::parse(&action) else {
        return Err(invalid_action());
    };
    let id = parse_ticket_id(&id)?;

    let store = state.ticket_store();

    let ticket = load_for_change(store, id, UPDATE_FAILED).inspect_err(|_| {
        record_action(action, "failed");
    })?;

    if let Err(reason) = authorize_action(&ticket, &user_id, action) {
        record_action(action, "forbidden");
        info!(ticket_id = id, requester = %user_id, %action, "Action denied: {}", reason);
        return Err(reason.into());
    }

    let updated = store
        .assert_change(id, action.change(&user_id))
        .map_err(|e| {
            record_action(action, "failed");
            store_failure(e, UPDATE_FAILED)
        })?;

    record_action(action, "applied");
    info!(ticket_id = id, requester = %user_id, %action, "Action applied");

    Ok((StatusCode::CREATED, Json(updated)))
}

/// `comments` in the action position of the lifecycle route
pub async fn reject_comments_action(AuthUser(_): AuthUser) -> ApiError {
    invalid_action()
}

/// Delete one of the requester's tickets
pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<usize>, ApiError> {
    let id = parse_ticket_id(&id)?;

    let count = state
        .ticket_store()
        .remove(id, &user_id)
        .map_err(|e| store_failure(e, DELETE_FAILED))?;

    if count == 0 {
        return Err(ApiError::NotFound("Ticket not found".to_string()));
    }

    info!(ticket_id = id, requester = %user_id, "Ticket deleted");
    Ok(Json(count))
}

/// Get a ticket by ID. A missing ticket yields `null`.
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Option<Ticket>>, LookupError> {
    let id = id
        .parse::<TicketId>()
        .map_err(|e| LookupError(format!("Invalid ticket id {:?}: {}", id, e)))?;

    state.ticket_store().find_by_id(id).map(Json).map_err(|e| {
        error!(ticket_id = id, "Failed to get ticket: {}", e);
        LookupError(e.to_string())
    })
}

/// Get a ticket with its comments. A missing ticket yields `null`.
pub async fn get_ticket_with_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Option<TicketWithComments>>, LookupError> {
    let id = id
        .parse::<TicketId>()
        .map_err(|e| LookupError(format!("Invalid ticket id {:?}: {}", id, e)))?;

    state
        .ticket_store()
        .find_by_id_with_comments(id)
        .map(Json)
        .map_err(|e| {
            error!(ticket_id = id, "Failed to get ticket comments: {}", e);
            LookupError(e.to_string())
        })
}

/// Comment on a ticket as the requester
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<AddCommentBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let id = parse_ticket_id(&id)?;
    let Json(body) = payload.map_err(invalid_body)?;

    let Some(content) = non_empty(body.content) else {
        return Err(ApiError::Validation("Please provide a comment".to_string()));
    };

    let comment = state
        .ticket_store()
        .add_comment(
            id,
            NewComment {
                posted_by: user_id,
                content,
            },
        )
        .map_err(|e| match e {
            TicketError::NotFound(_) => ApiError::NotFound("Ticket not found".to_string()),
            e => store_failure(e, COMMENT_FAILED),
        })?;

    Ok((StatusCode::CREATED, Json(comment)))
}
