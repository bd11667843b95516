pub mod auth;
pub mod database;
pub mod handlers;
pub mod listing;
pub mod query;
pub mod view;

use crate::database::DatabaseManager;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Builds the full route table over a database pool. Shared by the server
/// binary and the integration tests.
pub fn app(db_manager: Arc<DatabaseManager>) -> Router {
    Router::new()
        .route("/", get(handlers::handle_index))
        .route(
            "/login",
            get(handlers::handle_login_form).post(handlers::handle_login),
        )
        .route("/logout", post(handlers::handle_logout))
        .route(
            "/register",
            get(handlers::handle_register_form).post(handlers::handle_register),
        )
        .route(
            "/create",
            get(handlers::handle_create_form).post(handlers::handle_create),
        )
        .route("/listing/:id", get(handlers::handle_listing))
        .route("/listing/:id/place_bid", post(handlers::handle_place_bid))
        .route("/listing/:id/close", post(handlers::handle_close))
        .route("/listing/:id/comments", post(handlers::handle_post_comment))
        .route(
            "/add_to_watchlist/:id",
            post(handlers::handle_add_to_watchlist),
        )
        .route(
            "/remove_watchlist/:id",
            post(handlers::handle_remove_watchlist),
        )
        .route("/watchlist", get(handlers::handle_watchlist))
        .route("/categories", get(handlers::handle_categories))
        .route("/categories/:id", get(handlers::handle_category_listings))
        .with_state(db_manager)
}
