//! Reply, survey and notification-email templates.
//!
//! Everything here is pure: same input, same text.

use chrono::{DateTime, Utc};

use super::model::Category;
use super::rating::categorize;

const RATING_PROMPT: &str = "👋 *Thank you for your message!*

📊 Please reply with a number between *1 and 10* to rate your experience:

1️⃣ = Very Poor
5️⃣ = Average
🔟 = Excellent

_Just send the number (e.g., \"8\")_";

const SURVEY_INVITE: &str = "🙏 Thank you for choosing us!

On a scale of 1 to 10, how likely are you to recommend us to others?

🌟 9-10: Very Likely - You're amazing!
😊 7-8: Likely - We appreciate you!
😞 1-6: Unlikely - Help us improve!

Simply reply with your rating (1-10).";

/// WhatsApp reply for a classified message.
pub fn compose_reply(rating: Option<u8>) -> String {
    let Some(rating) = rating else {
        return RATING_PROMPT.to_string();
    };

    match categorize(rating) {
        Category::Promoter => format!(
            "🌟 *WOW! Thank you!* 🌟

You rated us *{rating}/10* - that's amazing!

We're thrilled you had such a great experience with us! Your feedback means the world to our team! 💙

_Keep being awesome!_ ✨"
        ),
        Category::Passive => format!(
            "😊 *Thank you for the feedback!*

You gave us *{rating}/10* - we really appreciate you taking the time to share your thoughts with us.

We're always working to improve and make your experience even better! 🚀

_Thanks for choosing us!_ 💙"
        ),
        Category::Detractor => format!(
            "🙏 *Thank you for your honest feedback*

You rated us *{rating}/10* and we really appreciate your honesty.

We take all feedback seriously and will work hard to improve your experience. Our team will review this right away! 📈

_We value your input!_ 💙"
        ),
    }
}

/// Outbound survey invitation.
pub fn survey_invite() -> &'static str {
    SURVEY_INVITE
}

/// Subject line of the support-team notification.
pub fn email_subject(rating: Option<u8>) -> &'static str {
    match rating.map(categorize) {
        None => "New WhatsApp Feedback Received",
        Some(Category::Promoter) => "🌟 Excellent Feedback Received (NPS 9-10)",
        Some(Category::Passive) => "😊 Positive Feedback Received (NPS 7-8)",
        Some(Category::Detractor) => "⚠️ Improvement Needed - Feedback Received (NPS 1-6)",
    }
}

fn rating_label(rating: Option<u8>) -> String {
    match rating {
        Some(r) => format!("{r}/10"),
        None => "Not provided".to_string(),
    }
}

fn rating_emoji(rating: Option<u8>) -> &'static str {
    match rating.map(categorize) {
        None => "",
        Some(Category::Promoter) => "🌟",
        Some(Category::Passive) => "😊",
        Some(Category::Detractor) => "😞",
    }
}

/// Plain-text notification body.
pub fn email_text(from: &str, body: &str, rating: Option<u8>) -> String {
    format!(
        "New feedback received:\n\nFrom: {from}\nRating: {}\nFeedback: {body}",
        rating_label(rating)
    )
}

/// HTML notification body. Sender and feedback text are escaped.
pub fn email_html(from: &str, body: &str, rating: Option<u8>, received_at: DateTime<Utc>) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333;">New WhatsApp Feedback {emoji}</h2>
  <div style="background: #f5f5f5; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <p><strong>From:</strong> {from}</p>
    <p><strong>Rating:</strong> {rating}</p>
    <p><strong>Feedback:</strong></p>
    <p style="background: white; padding: 15px; border-radius: 4px; border-left: 4px solid #007bff;">{body}</p>
  </div>
  <p style="color: #666; font-size: 12px;">Received on {received}</p>
</div>"#,
        emoji = rating_emoji(rating),
        from = escape_html(from),
        rating = rating_label(rating),
        body = escape_html(body),
        received = received_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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
