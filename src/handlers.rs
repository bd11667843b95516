// region:    --- Imports
use crate::auth::session::{removal_cookie, session_cookie, AuthSession, MaybeUser, SESSION_COOKIE};
use crate::auth::{self, AuthError, LoginCommand, RegisterCommand};
use crate::database::DatabaseManager;
use crate::listing::commands::{
    handle_add_to_watchlist as command_add_to_watchlist, handle_close_listing,
    handle_create_listing, handle_place_bid as command_place_bid,
    handle_post_comment as command_post_comment,
    handle_remove_from_watchlist as command_remove_from_watchlist, ActionError,
    CreateListingCommand, PlaceBidCommand, PostCommentCommand,
};
use crate::listing::model::{Listing, User};
use crate::query;
use crate::view;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Helpers

fn internal_error(context: &str, e: impl std::fmt::Display) -> Response {
    error!("{:<12} --> {}: {}", "Handler", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong.".to_string(),
    )
        .into_response()
}

fn not_found(user: Option<&User>) -> Response {
    (StatusCode::NOT_FOUND, Html(view::not_found_page(user))).into_response()
}

/// Builds the listing detail page: seller, comments, bid count, viewer's
/// watch state, and the final price/winner once the listing is closed.
async fn render_listing_page(
    db_manager: &DatabaseManager,
    listing: &Listing,
    user: Option<&User>,
    message: Option<&str>,
) -> Result<String, sqlx::Error> {
    let seller_name = query::handlers::get_user(db_manager, listing.seller_id)
        .await?
        .map(|u| u.username)
        .unwrap_or_default();
    let comments = query::handlers::get_listing_comments(db_manager, listing.id).await?;
    let bid_count = query::handlers::count_bids(db_manager, listing.id).await?;
    let is_watching = match user {
        Some(user) => query::handlers::is_watched(db_manager, user.id, listing.id).await?,
        None => false,
    };

    let (final_price, winner_name) = if listing.is_active {
        (None, None)
    } else {
        let highest = query::handlers::get_highest_bid(db_manager, listing.id).await?;
        let final_price = highest.map(|b| b.amount).unwrap_or(listing.starting_bid);
        let winner_name = match listing.winner_id {
            Some(winner_id) => query::handlers::get_user(db_manager, winner_id)
                .await?
                .map(|u| u.username),
            None => None,
        };
        (Some(final_price), winner_name)
    };

    let page = view::ListingPage {
        listing,
        seller_name: &seller_name,
        comments: &comments,
        bid_count,
        is_watching,
        final_price,
        winner_name: winner_name.as_deref(),
    };
    Ok(view::listing_page(&page, user, message))
}

/// Re-renders the listing page with a validation message, falling back to
/// 404 when the listing vanished.
async fn rerender_listing(
    db_manager: &DatabaseManager,
    listing_id: i64,
    user: &User,
    message: &str,
) -> Response {
    match query::handlers::get_listing(db_manager, listing_id).await {
        Ok(Some(listing)) => {
            match render_listing_page(db_manager, &listing, Some(user), Some(message)).await {
                Ok(html) => Html(html).into_response(),
                Err(e) => internal_error("render listing", e),
            }
        }
        Ok(None) => not_found(Some(user)),
        Err(e) => internal_error("load listing", e),
    }
}

// endregion: --- Helpers

// region:    --- Browsing Handlers

/// Front page: every listing, open and closed
pub async fn handle_index(
    State(db_manager): State<Arc<DatabaseManager>>,
    MaybeUser(user): MaybeUser,
) -> impl IntoResponse {
    info!("{:<12} --> index", "Handler");
    match query::handlers::get_all_listings(&db_manager).await {
        Ok(listings) => Html(view::index_page(&listings, user.as_ref())).into_response(),
        Err(e) => internal_error("list listings", e),
    }
}

/// Listing detail page
pub async fn handle_listing(
    State(db_manager): State<Arc<DatabaseManager>>,
    MaybeUser(user): MaybeUser,
    Path(listing_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> listing page id: {}", "Handler", listing_id);
    match query::handlers::get_listing(&db_manager, listing_id).await {
        Ok(Some(listing)) => {
            match render_listing_page(&db_manager, &listing, user.as_ref(), None).await {
                Ok(html) => Html(html).into_response(),
                Err(e) => internal_error("render listing", e),
            }
        }
        Ok(None) => not_found(user.as_ref()),
        Err(e) => internal_error("load listing", e),
    }
}

/// All categories
pub async fn handle_categories(
    State(db_manager): State<Arc<DatabaseManager>>,
    MaybeUser(user): MaybeUser,
) -> impl IntoResponse {
    info!("{:<12} --> categories", "Handler");
    match query::handlers::get_categories(&db_manager).await {
        Ok(categories) => Html(view::categories_page(&categories, user.as_ref())).into_response(),
        Err(e) => internal_error("list categories", e),
    }
}

/// Active listings in one category
pub async fn handle_category_listings(
    State(db_manager): State<Arc<DatabaseManager>>,
    MaybeUser(user): MaybeUser,
    Path(category_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> category page id: {}", "Handler", category_id);
    let category = match query::handlers::get_category(&db_manager, category_id).await {
        Ok(Some(category)) => category,
        Ok(None) => return not_found(user.as_ref()),
        Err(e) => return internal_error("load category", e),
    };
    match query::handlers::get_category_listings(&db_manager, category_id).await {
        Ok(listings) => {
            Html(view::category_page(&category, &listings, user.as_ref())).into_response()
        }
        Err(e) => internal_error("list category listings", e),
    }
}

// endregion: --- Browsing Handlers

// region:    --- Auth Handlers

pub async fn handle_login_form() -> impl IntoResponse {
    Html(view::login_page(None))
}

/// Verifies credentials, opens a session and sets the cookie.
pub async fn handle_login(
    State(db_manager): State<Arc<DatabaseManager>>,
    jar: CookieJar,
    Form(cmd): Form<LoginCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> login attempt", "Handler");
    match auth::handle_login(&db_manager, cmd).await {
        Ok(user) => match auth::create_session(&db_manager, user.id).await {
            Ok(token) => (jar.add(session_cookie(token)), Redirect::to("/")).into_response(),
            Err(e) => internal_error("create session", e),
        },
        Err(AuthError::Rejected(msg)) => Html(view::login_page(Some(&msg))).into_response(),
        Err(e) => internal_error("login", e),
    }
}

/// Drops the session row and clears the cookie.
pub async fn handle_logout(
    State(db_manager): State<Arc<DatabaseManager>>,
    jar: CookieJar,
) -> impl IntoResponse {
    info!("{:<12} --> logout", "Handler");
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = auth::delete_session(&db_manager, cookie.value()).await {
            return internal_error("delete session", e);
        }
    }
    (jar.remove(removal_cookie()), Redirect::to("/")).into_response()
}

pub async fn handle_register_form() -> impl IntoResponse {
    Html(view::register_page(None))
}

/// Creates the account and signs it in right away.
pub async fn handle_register(
    State(db_manager): State<Arc<DatabaseManager>>,
    jar: CookieJar,
    Form(cmd): Form<RegisterCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> register attempt", "Handler");
    match auth::handle_register(&db_manager, cmd).await {
        Ok(user) => match auth::create_session(&db_manager, user.id).await {
            Ok(token) => (jar.add(session_cookie(token)), Redirect::to("/")).into_response(),
            Err(e) => internal_error("create session", e),
        },
        Err(AuthError::Rejected(msg)) => Html(view::register_page(Some(&msg))).into_response(),
        Err(e) => internal_error("register", e),
    }
}

// endregion: --- Auth Handlers

// region:    --- Command Handlers

pub async fn handle_create_form(AuthSession(user): AuthSession) -> impl IntoResponse {
    Html(view::create_page(&user, None))
}

/// New listing submission
pub async fn handle_create(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthSession(user): AuthSession,
    Form(cmd): Form<CreateListingCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> create listing attempt", "Handler");
    match handle_create_listing(&db_manager, cmd, user.id).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(ActionError::Rejected(msg)) => {
            Html(view::create_page(&user, Some(&msg))).into_response()
        }
        Err(e) => internal_error("create listing", e),
    }
}

/// Bid submission
pub async fn handle_place_bid(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthSession(user): AuthSession,
    Path(listing_id): Path<i64>,
    Form(cmd): Form<PlaceBidCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> bid attempt listing id: {}", "Handler", listing_id);
    match command_place_bid(&db_manager, listing_id, user.id, cmd).await {
        Ok(_) => Redirect::to(&format!("/listing/{}", listing_id)).into_response(),
        Err(ActionError::Rejected(msg)) => {
            rerender_listing(&db_manager, listing_id, &user, &msg).await
        }
        Err(ActionError::NotFound) => not_found(Some(&user)),
        Err(e) => internal_error("place bid", e),
    }
}

/// Close submission. Only the seller gets through; anyone else is
/// bounced back to the listing with nothing changed.
pub async fn handle_close(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthSession(user): AuthSession,
    Path(listing_id): Path<i64>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> close attempt listing id: {}",
        "Handler", listing_id
    );
    match handle_close_listing(&db_manager, listing_id, user.id).await {
        Ok(_) | Err(ActionError::Forbidden) => {
            Redirect::to(&format!("/listing/{}", listing_id)).into_response()
        }
        Err(ActionError::NotFound) => not_found(Some(&user)),
        Err(e) => internal_error("close listing", e),
    }
}

/// Comment submission
pub async fn handle_post_comment(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthSession(user): AuthSession,
    Path(listing_id): Path<i64>,
    Form(cmd): Form<PostCommentCommand>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> comment attempt listing id: {}",
        "Handler", listing_id
    );
    match command_post_comment(&db_manager, listing_id, user.id, cmd).await {
        Ok(_) => Redirect::to(&format!("/listing/{}", listing_id)).into_response(),
        Err(ActionError::Rejected(msg)) => {
            rerender_listing(&db_manager, listing_id, &user, &msg).await
        }
        Err(ActionError::NotFound) => not_found(Some(&user)),
        Err(e) => internal_error("post comment", e),
    }
}

/// Watchlist add
pub async fn handle_add_to_watchlist(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthSession(user): AuthSession,
    Path(listing_id): Path<i64>,
) -> impl IntoResponse {
    match command_add_to_watchlist(&db_manager, user.id, listing_id).await {
        Ok(()) => Redirect::to(&format!("/listing/{}", listing_id)).into_response(),
        Err(ActionError::NotFound) => not_found(Some(&user)),
        Err(e) => internal_error("add to watchlist", e),
    }
}

/// Watchlist remove
pub async fn handle_remove_watchlist(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthSession(user): AuthSession,
    Path(listing_id): Path<i64>,
) -> impl IntoResponse {
    match command_remove_from_watchlist(&db_manager, user.id, listing_id).await {
        Ok(()) => Redirect::to(&format!("/listing/{}", listing_id)).into_response(),
        Err(e) => internal_error("remove from watchlist", e),
    }
}

/// Watchlist page
pub async fn handle_watchlist(
    State(db_manager): State<Arc<DatabaseManager>>,
    AuthSession(user): AuthSession,
) -> impl IntoResponse {
    info!("{:<12} --> watchlist user id: {}", "Handler", user.id);
    match query::handlers::get_watchlist(&db_manager, user.id).await {
        Ok(listings) => Html(view::watchlist_page(&listings, &user)).into_response(),
        Err(e) => internal_error("load watchlist", e),
    }
}

// endregion: --- Command Handlers
