//! Input validation for the conversation steps.

use std::sync::LazyLock;

use regex::Regex;

/// Phone shape: optional leading `+`, then at least 10 characters drawn
/// from digits, spaces, and hyphens.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s-]{10,}$").expect("phone regex"));

pub fn is_phone_shaped(text: &str) -> bool {
    PHONE_RE.is_match(text)
}

/// Listing price: a finite number strictly greater than zero.
pub fn parse_listing_price(text: &str) -> Option<f64> {
    let price: f64 = text.trim().parse().ok()?;
    (price.is_finite() && price > 0.0).then_some(price)
}

/// Search price bound: a finite number, zero allowed.
pub fn parse_search_price(text: &str) -> Option<f64> {
    let price: f64 = text.trim().parse().ok()?;
    (price.is_finite() && price >= 0.0).then_some(price)
}
