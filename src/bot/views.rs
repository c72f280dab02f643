//! Telegram rendering of dispatcher replies
//!
//! Keyboards and HTML captions for rendered posts.

use crate::dispatcher::{FollowUpControl, RenderedPost};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Inline keyboard carrying the post's follow-up control
#[must_use]
pub fn follow_up_keyboard(control: &FollowUpControl) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        control.label.clone(),
        control.action.clone(),
    )]])
}

/// HTML caption: linked title plus attribution
#[must_use]
pub fn post_caption(post: &RenderedPost) -> String {
    format!(
        "<a href=\"{}\">{}</a>\nRequested by {}",
        html_escape::encode_double_quoted_attribute(&post.link),
        html_escape::encode_text(&post.title),
        html_escape::encode_text(&post.attribution),
    )
}

/// Text used when Telegram refuses to embed the image itself
#[must_use]
pub fn post_fallback_text(post: &RenderedPost) -> String {
    format!(
        "{}\n{}",
        post_caption(post),
        html_escape::encode_text(&post.image_url)
    )
}

/// Whether the URL should be sent as an animation rather than a photo
#[must_use]
pub fn is_animation(image_url: &str) -> bool {
    let path = image_url
        .split(['?', '#'])
        .next()
        .unwrap_or(image_url)
        .to_ascii_lowercase();
    path.ends_with(".gif") || path.ends_with(".gifv")
}
