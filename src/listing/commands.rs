/// Listing write path:
/// 1. create listing
/// 2. place bid
/// 3. close listing
/// 4. post comment
/// 5. watch / unwatch
// region:    --- Imports
use crate::database::DatabaseManager;
use crate::listing::model::{parse_amount, Bid, Comment, Listing};
use crate::query::handlers as query;
use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Errors

/// Outcome of a rejected write. `Rejected` carries the message shown when
/// the originating form is re-rendered; the other variants map to a
/// redirect, a 404 and a 500 at the handler boundary.
#[derive(Debug)]
pub enum ActionError {
    Rejected(String),
    Forbidden,
    NotFound,
    Database(sqlx::Error),
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::Rejected(msg) => write!(f, "{}", msg),
            ActionError::Forbidden => write!(f, "not allowed"),
            ActionError::NotFound => write!(f, "not found"),
            ActionError::Database(e) => write!(f, "database error: {}", e),
        }
    }
}

impl std::error::Error for ActionError {}

impl From<sqlx::Error> for ActionError {
    fn from(e: sqlx::Error) -> Self {
        ActionError::Database(e)
    }
}

// endregion: --- Errors

// region:    --- Commands

/// New listing form payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreateListingCommand {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub starting_bid: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub category: String,
}

/// Bid form payload
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceBidCommand {
    pub bid: Option<String>,
}

/// Comment form payload
#[derive(Debug, Clone, Deserialize)]
pub struct PostCommentCommand {
    #[serde(default)]
    pub message: String,
}

/// Result of closing a listing
#[derive(Debug, Clone)]
pub struct CloseOutcome {
    pub final_price: i64,
    pub winner_id: Option<i64>,
}

/// 1. Creates a listing owned by `seller_id`. The category is free text:
/// it resolves to an existing category by name, or a new one is filed.
pub async fn handle_create_listing(
    db_manager: &DatabaseManager,
    cmd: CreateListingCommand,
    seller_id: i64,
) -> Result<Listing, ActionError> {
    info!("{:<12} --> create listing: {:?}", "Command", cmd.title);

    if cmd.title.trim().is_empty()
        || cmd.description.trim().is_empty()
        || cmd.starting_bid.trim().is_empty()
    {
        return Err(ActionError::Rejected(
            "all fields must be completed.".to_string(),
        ));
    }

    let starting_bid = match parse_amount(&cmd.starting_bid) {
        Some(v) => v,
        None => {
            return Err(ActionError::Rejected(
                "Starting bid must be a valid number.".to_string(),
            ))
        }
    };
    if starting_bid <= 0 {
        return Err(ActionError::Rejected(
            "Starting bid must be a positive number.".to_string(),
        ));
    }

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let category_name = cmd.category.trim().to_string();
                let category_id = if category_name.is_empty() {
                    None
                } else {
                    let existing: Option<(i64,)> =
                        sqlx::query_as("SELECT id FROM categories WHERE name = $1")
                            .bind(&category_name)
                            .fetch_optional(&mut **tx)
                            .await?;
                    match existing {
                        Some((id,)) => Some(id),
                        None => {
                            let (id,): (i64,) = sqlx::query_as(
                                "INSERT INTO categories (name) VALUES ($1) RETURNING id",
                            )
                            .bind(&category_name)
                            .fetch_one(&mut **tx)
                            .await?;
                            Some(id)
                        }
                    }
                };

                let listing = sqlx::query_as::<_, Listing>(
                    "INSERT INTO listings (title, description, starting_bid, current_price, image_url, category_id, is_active, winner_id, seller_id, created_at)
                     VALUES ($1, $2, $3, NULL, $4, $5, 1, NULL, $6, $7)
                     RETURNING id, title, description, starting_bid, current_price, image_url, category_id, is_active, winner_id, seller_id, created_at",
                )
                .bind(cmd.title.trim())
                .bind(cmd.description.trim())
                .bind(starting_bid)
                .bind(cmd.image_url.trim())
                .bind(category_id)
                .bind(seller_id)
                .bind(Utc::now())
                .fetch_one(&mut **tx)
                .await?;

                Ok(listing)
            })
        })
        .await
}

/// 2. Places a bid. The amount must strictly exceed the effective current
/// price read just before the write; two overlapping bids can both pass
/// that comparison.
pub async fn handle_place_bid(
    db_manager: &DatabaseManager,
    listing_id: i64,
    bidder_id: i64,
    cmd: PlaceBidCommand,
) -> Result<Bid, ActionError> {
    info!(
        "{:<12} --> place bid listing id: {} bidder id: {}",
        "Command", listing_id, bidder_id
    );

    let listing = query::get_listing(db_manager, listing_id)
        .await?
        .ok_or(ActionError::NotFound)?;

    let raw = cmd.bid.as_deref().unwrap_or("").trim().to_string();
    if raw.is_empty() {
        return Err(ActionError::Rejected(
            "Please enter a bid amount.".to_string(),
        ));
    }

    let amount = match parse_amount(&raw) {
        Some(v) => v,
        None => return Err(ActionError::Rejected("Enter a valid number.".to_string())),
    };

    if amount <= listing.effective_price() {
        warn!(
            "{:<12} --> low bid {} against price {} on listing {}",
            "Command",
            amount,
            listing.effective_price(),
            listing_id
        );
        return Err(ActionError::Rejected(
            "Bid must be higher than the current price.".to_string(),
        ));
    }

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let bid = sqlx::query_as::<_, Bid>(
                    "INSERT INTO bids (listing_id, bidder_id, amount, created_at)
                     VALUES ($1, $2, $3, $4)
                     RETURNING id, listing_id, bidder_id, amount, created_at",
                )
                .bind(listing_id)
                .bind(bidder_id)
                .bind(amount)
                .bind(Utc::now())
                .fetch_one(&mut **tx)
                .await?;

                sqlx::query("UPDATE listings SET current_price = $1 WHERE id = $2")
                    .bind(amount)
                    .bind(listing_id)
                    .execute(&mut **tx)
                    .await?;

                Ok(bid)
            })
        })
        .await
}

/// 3. Closes a listing. Seller only. The highest bid wins; without bids
/// the final price is the starting bid and no winner is recorded.
pub async fn handle_close_listing(
    db_manager: &DatabaseManager,
    listing_id: i64,
    user_id: i64,
) -> Result<CloseOutcome, ActionError> {
    info!(
        "{:<12} --> close listing id: {} by user id: {}",
        "Command", listing_id, user_id
    );

    let listing = query::get_listing(db_manager, listing_id)
        .await?
        .ok_or(ActionError::NotFound)?;

    if listing.seller_id != user_id {
        warn!(
            "{:<12} --> close refused, user {} is not the seller of listing {}",
            "Command", user_id, listing_id
        );
        return Err(ActionError::Forbidden);
    }

    let highest = query::get_highest_bid(db_manager, listing_id).await?;

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                match highest {
                    Some(bid) => {
                        sqlx::query(
                            "UPDATE listings SET is_active = 0, winner_id = $1 WHERE id = $2",
                        )
                        .bind(bid.bidder_id)
                        .bind(listing_id)
                        .execute(&mut **tx)
                        .await?;

                        Ok(CloseOutcome {
                            final_price: bid.amount,
                            winner_id: Some(bid.bidder_id),
                        })
                    }
                    None => {
                        sqlx::query("UPDATE listings SET is_active = 0 WHERE id = $1")
                            .bind(listing_id)
                            .execute(&mut **tx)
                            .await?;

                        Ok(CloseOutcome {
                            final_price: listing.starting_bid,
                            winner_id: None,
                        })
                    }
                }
            })
        })
        .await
}

/// 4. Appends a comment to a listing.
pub async fn handle_post_comment(
    db_manager: &DatabaseManager,
    listing_id: i64,
    author_id: i64,
    cmd: PostCommentCommand,
) -> Result<Comment, ActionError> {
    info!(
        "{:<12} --> comment listing id: {} author id: {}",
        "Command", listing_id, author_id
    );

    if query::get_listing(db_manager, listing_id).await?.is_none() {
        return Err(ActionError::NotFound);
    }

    let message = cmd.message.trim().to_string();
    if message.is_empty() {
        return Err(ActionError::Rejected(
            "Comment cannot be empty.".to_string(),
        ));
    }

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let (id,): (i64,) = sqlx::query_as(
                    "INSERT INTO comments (listing_id, author_id, message, created_at)
                     VALUES ($1, $2, $3, $4)
                     RETURNING id",
                )
                .bind(listing_id)
                .bind(author_id)
                .bind(&message)
                .bind(Utc::now())
                .fetch_one(&mut **tx)
                .await?;

                sqlx::query_as::<_, Comment>(
                    "SELECT c.id, c.listing_id, c.author_id, u.username as author_name, c.message, c.created_at
                     FROM comments c JOIN users u ON u.id = c.author_id
                     WHERE c.id = $1",
                )
                .bind(id)
                .fetch_one(&mut **tx)
                .await
                .map_err(ActionError::from)
            })
        })
        .await
}

/// 5a. Adds a listing to a user's watchlist. Idempotent.
pub async fn handle_add_to_watchlist(
    db_manager: &DatabaseManager,
    user_id: i64,
    listing_id: i64,
) -> Result<(), ActionError> {
    info!(
        "{:<12} --> watch listing id: {} user id: {}",
        "Command", listing_id, user_id
    );

    if query::get_listing(db_manager, listing_id).await?.is_none() {
        return Err(ActionError::NotFound);
    }

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query(
                    "INSERT OR IGNORE INTO watchlist (user_id, listing_id) VALUES ($1, $2)",
                )
                .bind(user_id)
                .bind(listing_id)
                .execute(&mut **tx)
                .await?;
                Ok(())
            })
        })
        .await
}

/// 5b. Removes a listing from a user's watchlist. Idempotent.
pub async fn handle_remove_from_watchlist(
    db_manager: &DatabaseManager,
    user_id: i64,
    listing_id: i64,
) -> Result<(), ActionError> {
    info!(
        "{:<12} --> unwatch listing id: {} user id: {}",
        "Command", listing_id, user_id
    );

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query("DELETE FROM watchlist WHERE user_id = $1 AND listing_id = $2")
                    .bind(user_id)
                    .bind(listing_id)
                    .execute(&mut **tx)
                    .await?;
                Ok(())
            })
        })
        .await
}

// endregion: --- Commands
