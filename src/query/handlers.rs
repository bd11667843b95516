// region:    --- Imports
use super::queries;
use crate::database::DatabaseManager;
use crate::listing::model::{Bid, Category, Comment, Listing, User};
use sqlx::Error as SqlxError;
use sqlx::Row;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// All listings, active and closed
pub async fn get_all_listings(db_manager: &DatabaseManager) -> Result<Vec<Listing>, SqlxError> {
    info!("{:<12} --> all listings", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Listing>(queries::GET_ALL_LISTINGS)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// Single listing; None when the id is unknown
pub async fn get_listing(
    db_manager: &DatabaseManager,
    listing_id: i64,
) -> Result<Option<Listing>, SqlxError> {
    info!("{:<12} --> listing id: {}", "Query", listing_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Listing>(queries::GET_LISTING)
                    .bind(listing_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// Active listings filed under a category
pub async fn get_category_listings(
    db_manager: &DatabaseManager,
    category_id: i64,
) -> Result<Vec<Listing>, SqlxError> {
    info!("{:<12} --> category listings id: {}", "Query", category_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Listing>(queries::GET_ACTIVE_LISTINGS_BY_CATEGORY)
                    .bind(category_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// Highest bid on a listing
pub async fn get_highest_bid(
    db_manager: &DatabaseManager,
    listing_id: i64,
) -> Result<Option<Bid>, SqlxError> {
    info!("{:<12} --> highest bid listing id: {}", "Query", listing_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Bid>(queries::GET_HIGHEST_BID)
                    .bind(listing_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// Number of bids placed on a listing
pub async fn count_bids(db_manager: &DatabaseManager, listing_id: i64) -> Result<i64, SqlxError> {
    info!("{:<12} --> bid count listing id: {}", "Query", listing_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let result = sqlx::query(queries::COUNT_BIDS)
                    .bind(listing_id)
                    .fetch_one(&mut **tx)
                    .await?;

                Ok(result.get("bid_count"))
            })
        })
        .await
}

/// Comments on a listing, oldest first
pub async fn get_listing_comments(
    db_manager: &DatabaseManager,
    listing_id: i64,
) -> Result<Vec<Comment>, SqlxError> {
    info!("{:<12} --> comments listing id: {}", "Query", listing_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Comment>(queries::GET_LISTING_COMMENTS)
                    .bind(listing_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// All categories
pub async fn get_categories(db_manager: &DatabaseManager) -> Result<Vec<Category>, SqlxError> {
    info!("{:<12} --> all categories", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Category>(queries::GET_CATEGORIES)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// Single category; None when the id is unknown
pub async fn get_category(
    db_manager: &DatabaseManager,
    category_id: i64,
) -> Result<Option<Category>, SqlxError> {
    info!("{:<12} --> category id: {}", "Query", category_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Category>(queries::GET_CATEGORY)
                    .bind(category_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// Listings on a user's watchlist
pub async fn get_watchlist(
    db_manager: &DatabaseManager,
    user_id: i64,
) -> Result<Vec<Listing>, SqlxError> {
    info!("{:<12} --> watchlist user id: {}", "Query", user_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Listing>(queries::GET_WATCHLIST)
                    .bind(user_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// Whether a listing is on a user's watchlist
pub async fn is_watched(
    db_manager: &DatabaseManager,
    user_id: i64,
    listing_id: i64,
) -> Result<bool, SqlxError> {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let result = sqlx::query(queries::IS_WATCHED)
                    .bind(user_id)
                    .bind(listing_id)
                    .fetch_one(&mut **tx)
                    .await?;

                let n: i64 = result.get("n");
                Ok(n > 0)
            })
        })
        .await
}

/// User lookup by id
pub async fn get_user(
    db_manager: &DatabaseManager,
    user_id: i64,
) -> Result<Option<User>, SqlxError> {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, User>(queries::GET_USER_BY_ID)
                    .bind(user_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// User lookup by username
pub async fn get_user_by_username(
    db_manager: &DatabaseManager,
    username: &str,
) -> Result<Option<User>, SqlxError> {
    let username = username.to_string();
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, User>(queries::GET_USER_BY_USERNAME)
                    .bind(username)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// User owning a session token
pub async fn get_session_user(
    db_manager: &DatabaseManager,
    token: &str,
) -> Result<Option<User>, SqlxError> {
    let token = token.to_string();
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, User>(queries::GET_SESSION_USER)
                    .bind(token)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

// endregion: --- Query Handlers
