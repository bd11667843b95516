use auction_market::auth::{self, AuthError, LoginCommand, RegisterCommand};
use auction_market::database::DatabaseManager;
use auction_market::listing::commands::{
    handle_add_to_watchlist, handle_close_listing, handle_create_listing, handle_place_bid,
    handle_post_comment, handle_remove_from_watchlist, ActionError, CreateListingCommand,
    PlaceBidCommand, PostCommentCommand,
};
use auction_market::listing::model::{Listing, User};
use auction_market::query;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

/// Fresh in-memory database with the schema applied
async fn setup() -> Arc<DatabaseManager> {
    let db_manager = Arc::new(
        DatabaseManager::in_memory()
            .await
            .expect("Failed to open in-memory database"),
    );
    db_manager
        .initialize_database()
        .await
        .expect("Failed to initialize schema");
    db_manager
}

/// Test account
async fn create_user(db_manager: &DatabaseManager, username: &str) -> User {
    auth::handle_register(
        db_manager,
        RegisterCommand {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "secret".to_string(),
            confirmation: "secret".to_string(),
        },
    )
    .await
    .expect("Failed to register test user")
}

/// Test listing with a $50.00 starting bid
async fn create_test_listing(db_manager: &DatabaseManager, seller: &User) -> Listing {
    handle_create_listing(
        db_manager,
        CreateListingCommand {
            title: "Vintage radio".to_string(),
            description: "Still hums.".to_string(),
            starting_bid: "50.00".to_string(),
            image_url: String::new(),
            category: "Electronics".to_string(),
        },
        seller.id,
    )
    .await
    .expect("Failed to create test listing")
}

/// Inserts a bid row directly, bypassing validation, to shape histories
async fn insert_bid(db_manager: &DatabaseManager, listing_id: i64, bidder_id: i64, amount: i64) {
    let result: Result<(), sqlx::Error> = db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query(
                    "INSERT INTO bids (listing_id, bidder_id, amount, created_at)
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(listing_id)
                .bind(bidder_id)
                .bind(amount)
                .bind(chrono::Utc::now())
                .execute(&mut **tx)
                .await
                .map(|_| ())
            })
        })
        .await;
    result.unwrap()
}

fn bid_cmd(amount: &str) -> PlaceBidCommand {
    PlaceBidCommand {
        bid: Some(amount.to_string()),
    }
}

#[tokio::test]
async fn new_listing_has_no_current_price() {
    let db = setup().await;
    let seller = create_user(&db, "seller").await;
    let listing = create_test_listing(&db, &seller).await;

    assert!(listing.is_active);
    assert_eq!(listing.current_price, None);
    assert_eq!(listing.starting_bid, 5000);
    assert_eq!(listing.winner_id, None);
    assert_eq!(listing.effective_price(), 5000);
}

#[tokio::test]
async fn create_listing_rejects_bad_input() {
    let db = setup().await;
    let seller = create_user(&db, "seller").await;

    let cases = [
        ("", "desc", "10", "all fields must be completed."),
        ("title", "", "10", "all fields must be completed."),
        ("title", "desc", "", "all fields must be completed."),
        ("title", "desc", "ten", "Starting bid must be a valid number."),
        ("title", "desc", "0", "Starting bid must be a positive number."),
        ("title", "desc", "-5", "Starting bid must be a valid number."),
    ];
    for (title, description, starting_bid, expected) in cases {
        let result = handle_create_listing(
            &db,
            CreateListingCommand {
                title: title.to_string(),
                description: description.to_string(),
                starting_bid: starting_bid.to_string(),
                image_url: String::new(),
                category: String::new(),
            },
            seller.id,
        )
        .await;
        match result {
            Err(ActionError::Rejected(msg)) => assert_eq!(msg, expected),
            other => panic!("expected rejection, got {:?}", other.map(|l| l.id)),
        }
    }

    let listings = query::handlers::get_all_listings(&db).await.unwrap();
    assert!(listings.is_empty(), "rejected forms must not persist");
}

#[tokio::test]
async fn create_listing_reuses_existing_category() {
    let db = setup().await;
    let seller = create_user(&db, "seller").await;
    let first = create_test_listing(&db, &seller).await;
    let second = create_test_listing(&db, &seller).await;

    assert_eq!(first.category_id, second.category_id);
    let categories = query::handlers::get_categories(&db).await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "Electronics");
}

#[tokio::test]
async fn bid_must_exceed_effective_price() {
    let db = setup().await;
    let seller = create_user(&db, "seller").await;
    let bidder = create_user(&db, "bidder").await;
    let listing = create_test_listing(&db, &seller).await;

    // equal to the starting bid is not enough
    let result = handle_place_bid(&db, listing.id, bidder.id, bid_cmd("50.00")).await;
    assert!(matches!(result, Err(ActionError::Rejected(_))));

    // rejected bids leave no record and no price change
    assert_eq!(query::handlers::count_bids(&db, listing.id).await.unwrap(), 0);
    let reloaded = query::handlers::get_listing(&db, listing.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.current_price, None);

    // a higher bid is recorded and moves the price
    let bid = handle_place_bid(&db, listing.id, bidder.id, bid_cmd("55.50"))
        .await
        .unwrap();
    assert_eq!(bid.amount, 5550);
    let reloaded = query::handlers::get_listing(&db, listing.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.current_price, Some(5550));

    // the next bid is measured against the new price
    let result = handle_place_bid(&db, listing.id, bidder.id, bid_cmd("55.50")).await;
    assert!(matches!(result, Err(ActionError::Rejected(_))));
    let accepted = handle_place_bid(&db, listing.id, bidder.id, bid_cmd("60"))
        .await
        .unwrap();
    assert_eq!(accepted.amount, 6000);
}

#[tokio::test]
async fn bid_rejects_missing_and_malformed_amounts() {
    let db = setup().await;
    let seller = create_user(&db, "seller").await;
    let bidder = create_user(&db, "bidder").await;
    let listing = create_test_listing(&db, &seller).await;

    let missing = handle_place_bid(&db, listing.id, bidder.id, PlaceBidCommand { bid: None }).await;
    match missing {
        Err(ActionError::Rejected(msg)) => assert_eq!(msg, "Please enter a bid amount."),
        other => panic!("expected rejection, got {:?}", other.map(|b| b.id)),
    }

    let garbage = handle_place_bid(&db, listing.id, bidder.id, bid_cmd("a lot")).await;
    match garbage {
        Err(ActionError::Rejected(msg)) => assert_eq!(msg, "Enter a valid number."),
        other => panic!("expected rejection, got {:?}", other.map(|b| b.id)),
    }

    let unknown = handle_place_bid(&db, 9999, bidder.id, bid_cmd("60")).await;
    assert!(matches!(unknown, Err(ActionError::NotFound)));
}

#[tokio::test]
async fn closing_picks_the_highest_bid() {
    let db = setup().await;
    let seller = create_user(&db, "seller").await;
    let low = create_user(&db, "low").await;
    let high = create_user(&db, "high").await;
    let mid = create_user(&db, "mid").await;
    let listing = create_test_listing(&db, &seller).await;

    insert_bid(&db, listing.id, low.id, 1000).await;
    insert_bid(&db, listing.id, high.id, 2500).await;
    insert_bid(&db, listing.id, mid.id, 1500).await;

    let outcome = handle_close_listing(&db, listing.id, seller.id)
        .await
        .unwrap();
    assert_eq!(outcome.final_price, 2500);
    assert_eq!(outcome.winner_id, Some(high.id));

    let closed = query::handlers::get_listing(&db, listing.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!closed.is_active);
    assert_eq!(closed.winner_id, Some(high.id));
}

#[tokio::test]
async fn closing_without_bids_keeps_starting_price() {
    let db = setup().await;
    let seller = create_user(&db, "seller").await;
    let listing = create_test_listing(&db, &seller).await;

    let outcome = handle_close_listing(&db, listing.id, seller.id)
        .await
        .unwrap();
    assert_eq!(outcome.final_price, listing.starting_bid);
    assert_eq!(outcome.winner_id, None);

    let closed = query::handlers::get_listing(&db, listing.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!closed.is_active);
    assert_eq!(closed.winner_id, None);
    assert_eq!(closed.current_price, None);
}

#[tokio::test]
async fn only_the_seller_can_close() {
    let db = setup().await;
    let seller = create_user(&db, "seller").await;
    let intruder = create_user(&db, "intruder").await;
    let bidder = create_user(&db, "bidder").await;
    let listing = create_test_listing(&db, &seller).await;
    handle_place_bid(&db, listing.id, bidder.id, bid_cmd("60"))
        .await
        .unwrap();

    let result = handle_close_listing(&db, listing.id, intruder.id).await;
    assert!(matches!(result, Err(ActionError::Forbidden)));

    let unchanged = query::handlers::get_listing(&db, listing.id)
        .await
        .unwrap()
        .unwrap();
    assert!(unchanged.is_active);
    assert_eq!(unchanged.winner_id, None);
    assert_eq!(unchanged.current_price, Some(6000));
}

#[tokio::test]
async fn watchlist_toggle_round_trip() {
    let db = setup().await;
    let seller = create_user(&db, "seller").await;
    let watcher = create_user(&db, "watcher").await;
    let listing = create_test_listing(&db, &seller).await;

    assert!(!query::handlers::is_watched(&db, watcher.id, listing.id)
        .await
        .unwrap());

    handle_add_to_watchlist(&db, watcher.id, listing.id)
        .await
        .unwrap();
    // adding twice is a no-op
    handle_add_to_watchlist(&db, watcher.id, listing.id)
        .await
        .unwrap();
    assert!(query::handlers::is_watched(&db, watcher.id, listing.id)
        .await
        .unwrap());
    let watched = query::handlers::get_watchlist(&db, watcher.id).await.unwrap();
    assert_eq!(watched.len(), 1);

    handle_remove_from_watchlist(&db, watcher.id, listing.id)
        .await
        .unwrap();
    assert!(!query::handlers::is_watched(&db, watcher.id, listing.id)
        .await
        .unwrap());
    assert!(query::handlers::get_watchlist(&db, watcher.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn comments_append_in_order() {
    let db = setup().await;
    let seller = create_user(&db, "seller").await;
    let commenter = create_user(&db, "commenter").await;
    let listing = create_test_listing(&db, &seller).await;

    let empty = handle_post_comment(
        &db,
        listing.id,
        commenter.id,
        PostCommentCommand {
            message: "   ".to_string(),
        },
    )
    .await;
    assert!(matches!(empty, Err(ActionError::Rejected(_))));

    for text in ["First!", "Is shipping included?"] {
        handle_post_comment(
            &db,
            listing.id,
            commenter.id,
            PostCommentCommand {
                message: text.to_string(),
            },
        )
        .await
        .unwrap();
    }

    let comments = query::handlers::get_listing_comments(&db, listing.id)
        .await
        .unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].message, "First!");
    assert_eq!(comments[0].author_name, "commenter");
    assert_eq!(comments[1].message, "Is shipping included?");
}

#[tokio::test]
async fn registration_rejects_mismatch_and_duplicates() {
    let db = setup().await;

    let mismatch = auth::handle_register(
        &db,
        RegisterCommand {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "one".to_string(),
            confirmation: "two".to_string(),
        },
    )
    .await;
    match mismatch {
        Err(AuthError::Rejected(msg)) => assert_eq!(msg, "Passwords must match."),
        other => panic!("expected rejection, got {:?}", other.map(|u| u.id)),
    }
    assert!(query::handlers::get_user_by_username(&db, "alice")
        .await
        .unwrap()
        .is_none());

    create_user(&db, "alice").await;
    let duplicate = auth::handle_register(
        &db,
        RegisterCommand {
            username: "alice".to_string(),
            email: "other@example.com".to_string(),
            password: "secret".to_string(),
            confirmation: "secret".to_string(),
        },
    )
    .await;
    match duplicate {
        Err(AuthError::Rejected(msg)) => assert_eq!(msg, "Username already taken."),
        other => panic!("expected rejection, got {:?}", other.map(|u| u.id)),
    }
}

#[tokio::test]
async fn login_verifies_the_password() {
    let db = setup().await;
    create_user(&db, "bob").await;

    let ok = auth::handle_login(
        &db,
        LoginCommand {
            username: "bob".to_string(),
            password: "secret".to_string(),
        },
    )
    .await;
    assert!(ok.is_ok());

    let bad = auth::handle_login(
        &db,
        LoginCommand {
            username: "bob".to_string(),
            password: "wrong".to_string(),
        },
    )
    .await;
    match bad {
        Err(AuthError::Rejected(msg)) => assert_eq!(msg, "Invalid username and/or password."),
        other => panic!("expected rejection, got {:?}", other.map(|u| u.id)),
    }
}

#[tokio::test]
async fn category_browsing_hides_closed_listings() {
    let db = setup().await;
    let seller = create_user(&db, "seller").await;
    let open = create_test_listing(&db, &seller).await;
    let closed = create_test_listing(&db, &seller).await;
    handle_close_listing(&db, closed.id, seller.id).await.unwrap();

    let category_id = open.category_id.unwrap();
    let listings = query::handlers::get_category_listings(&db, category_id)
        .await
        .unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].id, open.id);

    // the front page still shows both
    let all = query::handlers::get_all_listings(&db).await.unwrap();
    assert_eq!(all.len(), 2);
}

// region:    --- HTTP-level tests

fn form_request(path: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn index_renders_for_visitors() {
    let db = setup().await;
    let app = auction_market::app(Arc::clone(&db));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unauthenticated_bid_redirects_to_login() {
    let db = setup().await;
    let seller = create_user(&db, "seller").await;
    let listing = create_test_listing(&db, &seller).await;
    let app = auction_market::app(Arc::clone(&db));

    let response = app
        .oneshot(form_request(
            &format!("/listing/{}/place_bid", listing.id),
            "bid=60",
            None,
        ))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(response.headers()[header::LOCATION], "/login");
    assert_eq!(query::handlers::count_bids(&db, listing.id).await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_listing_returns_not_found() {
    let db = setup().await;
    let app = auction_market::app(Arc::clone(&db));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/listing/42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn register_and_bid_through_the_browser_flow() {
    let db = setup().await;
    let seller = create_user(&db, "seller").await;
    let listing = create_test_listing(&db, &seller).await;

    // register sets the session cookie and redirects home
    let response = auction_market::app(Arc::clone(&db))
        .oneshot(form_request(
            "/register",
            "username=carol&email=carol%40example.com&password=pw&confirmation=pw",
            None,
        ))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(response.headers()[header::LOCATION], "/");
    let set_cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .to_string();
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    // a valid bid redirects back to the listing
    let response = auction_market::app(Arc::clone(&db))
        .oneshot(form_request(
            &format!("/listing/{}/place_bid", listing.id),
            "bid=72.50",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers()[header::LOCATION],
        format!("/listing/{}", listing.id)
    );

    let reloaded = query::handlers::get_listing(&db, listing.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.current_price, Some(7250));

    // a low bid re-renders the listing form instead of redirecting
    let response = auction_market::app(Arc::clone(&db))
        .oneshot(form_request(
            &format!("/listing/{}/place_bid", listing.id),
            "bid=10",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_clears_the_session() {
    let db = setup().await;
    let app = auction_market::app(Arc::clone(&db));

    let response = app
        .oneshot(form_request(
            "/register",
            "username=dave&email=&password=pw&confirmation=pw",
            None,
        ))
        .await
        .unwrap();
    let set_cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .to_string();
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    let token = cookie.split_once('=').unwrap().1.to_string();

    let user = query::handlers::get_session_user(&db, &token).await.unwrap();
    assert!(user.is_some());

    let response = auction_market::app(Arc::clone(&db))
        .oneshot(form_request("/logout", "", Some(&cookie)))
        .await
        .unwrap();
    assert!(response.status().is_redirection());

    let user = query::handlers::get_session_user(&db, &token).await.unwrap();
    assert!(user.is_none());
}

// endregion: --- HTTP-level tests
