/// Every listing, newest last
pub const GET_ALL_LISTINGS: &str = "SELECT id, title, description, starting_bid, current_price, image_url, category_id, is_active, winner_id, seller_id, created_at FROM listings ORDER BY id";

/// Single listing lookup
pub const GET_LISTING: &str = "SELECT id, title, description, starting_bid, current_price, image_url, category_id, is_active, winner_id, seller_id, created_at FROM listings WHERE id = $1";

/// Active listings within one category
pub const GET_ACTIVE_LISTINGS_BY_CATEGORY: &str = "SELECT id, title, description, starting_bid, current_price, image_url, category_id, is_active, winner_id, seller_id, created_at FROM listings WHERE category_id = $1 AND is_active = 1 ORDER BY id";

/// Highest bid on a listing, ties resolved by insertion order
pub const GET_HIGHEST_BID: &str = r#"
    SELECT id, listing_id, bidder_id, amount, created_at
    FROM bids
    WHERE listing_id = $1
    ORDER BY amount DESC, id ASC
    LIMIT 1
"#;

/// Number of bids on a listing
pub const COUNT_BIDS: &str = "SELECT COUNT(*) as bid_count FROM bids WHERE listing_id = $1";

/// Comments on a listing with author names, oldest first
pub const GET_LISTING_COMMENTS: &str = r#"
    SELECT c.id, c.listing_id, c.author_id, u.username as author_name, c.message, c.created_at
    FROM comments c
    JOIN users u ON u.id = c.author_id
    WHERE c.listing_id = $1
    ORDER BY c.id
"#;

/// All categories by name
pub const GET_CATEGORIES: &str = "SELECT id, name FROM categories ORDER BY name";

/// Single category lookup
pub const GET_CATEGORY: &str = "SELECT id, name FROM categories WHERE id = $1";

/// Listings on a user's watchlist
pub const GET_WATCHLIST: &str = r#"
    SELECT l.id, l.title, l.description, l.starting_bid, l.current_price, l.image_url,
           l.category_id, l.is_active, l.winner_id, l.seller_id, l.created_at
    FROM listings l
    JOIN watchlist w ON w.listing_id = l.id
    WHERE w.user_id = $1
    ORDER BY l.id
"#;

/// Watchlist membership check
pub const IS_WATCHED: &str =
    "SELECT COUNT(*) as n FROM watchlist WHERE user_id = $1 AND listing_id = $2";

/// User lookups
pub const GET_USER_BY_ID: &str =
    "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1";
pub const GET_USER_BY_USERNAME: &str =
    "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1";

/// User owning a session token
pub const GET_SESSION_USER: &str = r#"
    SELECT u.id, u.username, u.email, u.password_hash, u.created_at
    FROM users u
    JOIN sessions s ON s.user_id = u.id
    WHERE s.token = $1
"#;
