use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Account model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

// Listing model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub starting_bid: i64,
    pub current_price: Option<i64>,
    pub image_url: String,
    pub category_id: Option<i64>,
    pub is_active: bool,
    pub winner_id: Option<i64>,
    pub seller_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    /// Current price if any bid was placed, else the starting bid.
    pub fn effective_price(&self) -> i64 {
        self.current_price.unwrap_or(self.starting_bid)
    }
}

// Bid model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub listing_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

// Comment model, joined with the author's username for display
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub listing_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

// Category model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Parses a decimal money string ("12", "12.5", "12.50") into cents.
/// Signs, empty input, more than two fraction digits and any other
/// garbage are rejected.
pub fn parse_amount(input: &str) -> Option<i64> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if whole.len() > 12
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !frac.chars().all(|c| c.is_ascii_digit())
        || frac.len() > 2
    {
        return None;
    }
    let whole_part: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().ok()?
    };
    let frac_part: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };
    Some(whole_part * 100 + frac_part)
}

/// Formats cents as a dollar string, e.g. 1250 -> "$12.50".
pub fn format_amount(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_amount_accepts_decimal_forms() {
        assert_eq!(parse_amount("12"), Some(1200));
        assert_eq!(parse_amount("12.5"), Some(1250));
        assert_eq!(parse_amount("12.50"), Some(1250));
        assert_eq!(parse_amount(" 0.99 "), Some(99));
        assert_eq!(parse_amount(".50"), Some(50));
        assert_eq!(parse_amount("7."), Some(700));
    }

    #[test]
    fn parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("."), None);
        assert_eq!(parse_amount("-5"), None);
        assert_eq!(parse_amount("+5"), None);
        assert_eq!(parse_amount("12.345"), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("12,50"), None);
        assert_eq!(parse_amount("1e3"), None);
    }

    #[test]
    fn format_amount_pads_cents() {
        assert_eq!(format_amount(1250), "$12.50");
        assert_eq!(format_amount(99), "$0.99");
        assert_eq!(format_amount(100000), "$1000.00");
    }
}
