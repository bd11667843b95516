/// Server-side HTML rendering. Pages are assembled as plain strings with
/// escaping applied to every user-supplied value.
// region:    --- Imports
use crate::listing::model::{format_amount, Category, Comment, Listing, User};
// endregion: --- Imports

// region:    --- Helpers

/// Escapes text for safe interpolation into HTML bodies and attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn nav(user: Option<&User>) -> String {
    let mut nav = String::from(
        r#"<nav>
  <a href="/">Active Listings</a>
  <a href="/categories">Categories</a>
"#,
    );
    match user {
        Some(user) => {
            nav.push_str(r#"  <a href="/watchlist">Watchlist</a>
"#);
            nav.push_str(r#"  <a href="/create">Create Listing</a>
"#);
            nav.push_str(&format!(
                "  <span>Signed in as <strong>{}</strong></span>\n",
                escape(&user.username)
            ));
            nav.push_str(
                r#"  <form action="/logout" method="post"><button type="submit">Log Out</button></form>
"#,
            );
        }
        None => {
            nav.push_str(r#"  <a href="/login">Log In</a>
"#);
            nav.push_str(r#"  <a href="/register">Register</a>
"#);
        }
    }
    nav.push_str("</nav>");
    nav
}

fn layout(title: &str, user: Option<&User>, message: Option<&str>, body: &str) -> String {
    let message_html = match message {
        Some(msg) => format!("<p class=\"message\">{}</p>\n", escape(msg)),
        None => String::new(),
    };
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title} - Auctions</title>
</head>
<body>
{nav}
<h1>{title}</h1>
{message}{body}
</body>
</html>
"#,
        title = escape(title),
        nav = nav(user),
        message = message_html,
        body = body,
    )
}

fn listing_card(listing: &Listing) -> String {
    let image = if listing.image_url.is_empty() {
        String::new()
    } else {
        format!(
            "    <img src=\"{}\" alt=\"{}\">\n",
            escape(&listing.image_url),
            escape(&listing.title)
        )
    };
    let status = if listing.is_active { "" } else { " (closed)" };
    format!(
        r#"  <div class="listing">
    <h2><a href="/listing/{id}">{title}</a>{status}</h2>
{image}    <p>{description}</p>
    <p>Price: {price}</p>
  </div>
"#,
        id = listing.id,
        title = escape(&listing.title),
        status = status,
        image = image,
        description = escape(&listing.description),
        price = format_amount(listing.effective_price()),
    )
}

fn listing_list(listings: &[Listing]) -> String {
    if listings.is_empty() {
        return "<p>No listings.</p>".to_string();
    }
    listings.iter().map(listing_card).collect()
}

// endregion: --- Helpers

// region:    --- Pages

pub fn index_page(listings: &[Listing], user: Option<&User>) -> String {
    layout("Auctions", user, None, &listing_list(listings))
}

pub fn login_page(message: Option<&str>) -> String {
    let body = r#"<form action="/login" method="post">
  <input type="text" name="username" placeholder="Username">
  <input type="password" name="password" placeholder="Password">
  <button type="submit">Log In</button>
</form>
<p>Don't have an account? <a href="/register">Register here.</a></p>"#;
    layout("Log In", None, message, body)
}

pub fn register_page(message: Option<&str>) -> String {
    let body = r#"<form action="/register" method="post">
  <input type="text" name="username" placeholder="Username">
  <input type="email" name="email" placeholder="Email Address">
  <input type="password" name="password" placeholder="Password">
  <input type="password" name="confirmation" placeholder="Confirm Password">
  <button type="submit">Register</button>
</form>
<p>Already have an account? <a href="/login">Log In here.</a></p>"#;
    layout("Register", None, message, body)
}

pub fn create_page(user: &User, message: Option<&str>) -> String {
    let body = r#"<form action="/create" method="post">
  <input type="text" name="title" placeholder="Title">
  <textarea name="description" placeholder="Description"></textarea>
  <input type="text" name="starting_bid" placeholder="Starting Bid">
  <input type="url" name="image_url" placeholder="Image URL (optional)">
  <input type="text" name="category" placeholder="Category (optional)">
  <button type="submit">Create Listing</button>
</form>"#;
    layout("Create Listing", Some(user), message, body)
}

pub struct ListingPage<'a> {
    pub listing: &'a Listing,
    pub seller_name: &'a str,
    pub comments: &'a [Comment],
    pub bid_count: i64,
    pub is_watching: bool,
    /// Set only when the listing is closed
    pub final_price: Option<i64>,
    pub winner_name: Option<&'a str>,
}

pub fn listing_page(page: &ListingPage<'_>, user: Option<&User>, message: Option<&str>) -> String {
    let listing = page.listing;
    let is_seller = user.map(|u| u.id == listing.seller_id).unwrap_or(false);
    let mut body = String::new();

    if !listing.image_url.is_empty() {
        body.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\">\n",
            escape(&listing.image_url),
            escape(&listing.title)
        ));
    }
    body.push_str(&format!("<p>{}</p>\n", escape(&listing.description)));
    body.push_str(&format!(
        "<p>Listed by <strong>{}</strong></p>\n",
        escape(page.seller_name)
    ));
    body.push_str(&format!(
        "<p>Current price: {} ({} bid(s))</p>\n",
        format_amount(listing.effective_price()),
        page.bid_count
    ));

    if listing.is_active {
        if user.is_some() {
            body.push_str(&format!(
                r#"<form action="/listing/{id}/place_bid" method="post">
  <input type="text" name="bid" placeholder="Bid">
  <button type="submit">Place Bid</button>
</form>
"#,
                id = listing.id
            ));
            if is_seller {
                body.push_str(&format!(
                    "<form action=\"/listing/{}/close\" method=\"post\"><button type=\"submit\">Close Auction</button></form>\n",
                    listing.id
                ));
            }
            if page.is_watching {
                body.push_str(&format!(
                    "<form action=\"/remove_watchlist/{}\" method=\"post\"><button type=\"submit\">Remove from Watchlist</button></form>\n",
                    listing.id
                ));
            } else {
                body.push_str(&format!(
                    "<form action=\"/add_to_watchlist/{}\" method=\"post\"><button type=\"submit\">Add to Watchlist</button></form>\n",
                    listing.id
                ));
            }
        } else {
            body.push_str("<p><a href=\"/login\">Log in</a> to bid.</p>\n");
        }
    } else {
        body.push_str("<p><strong>This auction is closed.</strong></p>\n");
        if let Some(final_price) = page.final_price {
            body.push_str(&format!(
                "<p>Final price: {}</p>\n",
                format_amount(final_price)
            ));
        }
        match page.winner_name {
            Some(winner) => {
                body.push_str(&format!("<p>Winner: <strong>{}</strong></p>\n", escape(winner)))
            }
            None => body.push_str("<p>No bids were placed.</p>\n"),
        }
    }

    body.push_str("<h2>Comments</h2>\n");
    if page.comments.is_empty() {
        body.push_str("<p>No comments yet.</p>\n");
    } else {
        body.push_str("<ul>\n");
        for comment in page.comments {
            body.push_str(&format!(
                "  <li><strong>{}</strong>: {}</li>\n",
                escape(&comment.author_name),
                escape(&comment.message)
            ));
        }
        body.push_str("</ul>\n");
    }
    if user.is_some() {
        body.push_str(&format!(
            r#"<form action="/listing/{id}/comments" method="post">
  <textarea name="message" placeholder="Add a comment"></textarea>
  <button type="submit">Post Comment</button>
</form>
"#,
            id = listing.id
        ));
    }

    layout(&listing.title, user, message, &body)
}

pub fn watchlist_page(listings: &[Listing], user: &User) -> String {
    layout("Watchlist", Some(user), None, &listing_list(listings))
}

pub fn categories_page(categories: &[Category], user: Option<&User>) -> String {
    let body = if categories.is_empty() {
        "<p>No categories.</p>".to_string()
    } else {
        let items: String = categories
            .iter()
            .map(|c| {
                format!(
                    "  <li><a href=\"/categories/{}\">{}</a></li>\n",
                    c.id,
                    escape(&c.name)
                )
            })
            .collect();
        format!("<ul>\n{}</ul>", items)
    };
    layout("Categories", user, None, &body)
}

pub fn category_page(category: &Category, listings: &[Listing], user: Option<&User>) -> String {
    layout(&category.name, user, None, &listing_list(listings))
}

pub fn not_found_page(user: Option<&User>) -> String {
    layout("Not Found", user, None, "<p>Nothing here.</p>")
}

// endregion: --- Pages
