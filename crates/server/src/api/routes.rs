use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::middleware::{auth_middleware, metrics_middleware};
use super::{handlers, tickets};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Readable without a session
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        .route("/tickets", get(tickets::list_tickets))
        .route("/tickets/{id}", get(tickets::get_ticket))
        .route("/tickets/{id}/comments", get(tickets::get_ticket_with_comments));

    // Require a verified session
    let protected_routes = Router::new()
        .route("/tickets", post(tickets::create_ticket))
        .route(
            "/tickets/{id}",
            put(tickets::update_ticket).delete(tickets::delete_ticket),
        )
        .route(
            "/tickets/{id}/comments",
            post(tickets::add_comment).patch(tickets::reject_comments_action),
        )
        .route("/tickets/{id}/{action}", patch(tickets::apply_action))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = public_routes.merge(protected_routes).with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
