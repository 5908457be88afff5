//! Rating extraction and NPS bucketing.
//!
//! Parsing is strict: after trimming, the whole reply must be an integer in
//! 1..=10. A reply like `"Great service! 9"` is not a rating, and neither is
//! `"9 great"`.

use super::model::{Category, IncomingMessage};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 10;

/// Extract a 1-10 rating from a free-text reply.
pub fn extract_rating(text: &str) -> Option<u8> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Digits only, so the only parse failure left is overflow.
    let value: u32 = trimmed.parse().ok()?;
    if (MIN_RATING as u32..=MAX_RATING as u32).contains(&value) {
        Some(value as u8)
    } else {
        None
    }
}

/// Bucket a rating into its NPS tier. Expects a rating already in 1..=10.
pub fn categorize(rating: u8) -> Category {
    match rating {
        9..=u8::MAX => Category::Promoter,
        7..=8 => Category::Passive,
        _ => Category::Detractor,
    }
}

/// Classify a validated message body.
pub fn classify(from: &str, body: &str) -> IncomingMessage {
    let rating = extract_rating(body);
    IncomingMessage {
        from: from.to_string(),
        body: body.to_string(),
        rating,
        category: rating.map(categorize),
    }
}
