//! Post composition workflow and activity-feed reads.
//!
//! Same prepare/commit split as the application flow: prepare opens the
//! share box and types the draft into the editor but never clicks
//! publish; commit clicks publish and charges the session rate limit.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AutomationError;
use crate::human;
use crate::nav;
use crate::selectors;
use crate::session::PageHandle;
use crate::workflow::{commit_pending, CommitSurface, RateLimiter};

/// How much of the draft the preview echoes back.
const PREVIEW_CHARS: usize = 280;

/// LinkedIn's post length ceiling. Drafts beyond this are refused before
/// the share box is opened.
pub const MAX_POST_CHARS: usize = 3000;

/// Character count of `text` when it exceeds [`MAX_POST_CHARS`]. Counts
/// scalar values, not bytes, so multibyte text is not penalized.
pub fn draft_too_long(text: &str) -> Option<usize> {
    let characters = text.chars().count();
    (characters > MAX_POST_CHARS).then_some(characters)
}

/// Preview of a typed-but-unpublished post.
#[derive(Debug, Clone, Serialize)]
pub struct PostPreview {
    pub characters: usize,
    pub preview: String,
    pub publish_visible: bool,
}

/// Declared outcomes of the post prepare phase.
#[derive(Debug, Clone)]
pub enum PostPrepareOutcome {
    /// Draft typed into the editor, publish control visible.
    Ready(PostPreview),
    /// A required control never appeared; names the missing piece.
    Unavailable { what: &'static str },
    /// Draft exceeds [`MAX_POST_CHARS`]; nothing was opened or typed.
    TooLong { characters: usize },
}

/// Open the share box and type `text` into the editor, stopping short of
/// the publish click. Checks the rate limit up front so a prepare that
/// could never be committed fails before touching the page.
pub async fn prepare_post(
    page: &PageHandle,
    limiter: &RateLimiter,
    text: &str,
) -> Result<PostPrepareOutcome, AutomationError> {
    limiter.check()?;

    if let Some(characters) = draft_too_long(text) {
        return Ok(PostPrepareOutcome::TooLong { characters });
    }

    nav::to_feed(page).await?;
    human::jitter(1000, 2000).await;

    let start = selectors::start_post_button(page);
    if !start.is_visible(Duration::from_secs(10)).await {
        return Ok(PostPrepareOutcome::Unavailable { what: "share box" });
    }
    start.click().await?;
    human::jitter(1500, 2500).await;

    let editor = selectors::post_editor(page);
    if !editor.is_visible(Duration::from_secs(10)).await {
        return Ok(PostPrepareOutcome::Unavailable { what: "post editor" });
    }
    editor.fill_multiline(text).await?;
    human::jitter(500, 1000).await;

    let publish_visible = selectors::post_publish_button(page)
        .is_visible(Duration::from_secs(3))
        .await;
    if !publish_visible {
        debug!("publish control not visible after typing draft");
    }

    let preview: String = text.chars().take(PREVIEW_CHARS).collect();
    Ok(PostPrepareOutcome::Ready(PostPreview {
        characters: text.chars().count(),
        preview,
        publish_visible,
    }))
}

/// The feed share box as a commit surface.
struct ShareBoxSurface<'a> {
    page: &'a PageHandle,
}

#[async_trait]
impl CommitSurface for ShareBoxSurface<'_> {
    async fn commit_visible(&self) -> bool {
        selectors::post_publish_button(self.page)
            .is_visible(Duration::from_secs(5))
            .await
    }

    async fn commit(&self) -> Result<(), AutomationError> {
        selectors::post_publish_button(self.page).click().await?;
        human::jitter(3000, 5000).await;
        Ok(())
    }
}

/// Publish the draft left by [`prepare_post`]. Like the application
/// commit, the pending draft is whatever the page actually shows: no
/// visible publish control means nothing to commit. A successful click
/// charges one unit against the session limit.
pub async fn commit_post(
    page: &PageHandle,
    limiter: &mut RateLimiter,
) -> Result<u32, AutomationError> {
    limiter.check()?;

    commit_pending(&ShareBoxSurface { page }, "post").await?;

    limiter.record_commit();
    info!(
        posts_used = limiter.count(),
        posts_max = limiter.max(),
        "post published"
    );
    Ok(limiter.count())
}

/// One post scraped from the user's activity feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPost {
    pub text: String,
    pub reactions: String,
    pub comments: String,
}

/// Read the user's most recent posts from their activity page. Engagement
/// counts are returned as the page renders them ("1,234" stays a string).
pub async fn get_my_posts(
    page: &PageHandle,
    limit: usize,
) -> Result<Vec<ActivityPost>, AutomationError> {
    nav::to_my_activity(page).await?;
    nav::scroll_to_load(page).await;

    if !selectors::activity_post_items(page)
        .is_visible(Duration::from_secs(10))
        .await
    {
        debug!("no activity posts rendered");
        return Ok(Vec::new());
    }

    let script = format!(
        r#"(() => {{
            const items = Array.from(document.querySelectorAll(".feed-shared-update-v2")).slice(0, {limit});
            return items.map((el) => {{
                const body = el.querySelector(".update-components-text, .feed-shared-inline-show-more-text");
                const reactions = el.querySelector(".social-details-social-counts__reactions-count");
                const comments = el.querySelector(".social-details-social-counts__comments");
                return {{
                    text: body ? body.innerText.trim() : "",
                    reactions: reactions ? reactions.innerText.trim() : "0",
                    comments: comments ? comments.innerText.trim().split(" ")[0] : "0",
                }};
            }});
        }})()"#
    );

    let posts = page
        .page()
        .evaluate(script)
        .await?
        .into_value::<Vec<ActivityPost>>()
        .map_err(|e| AutomationError::Driver(format!("activity extraction: {e}")))?;

    info!(count = posts.len(), "read activity posts");
    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundary() {
        let text = "ç".repeat(300);
        let preview: String = text.chars().take(PREVIEW_CHARS).collect();
        assert_eq!(preview.chars().count(), PREVIEW_CHARS);
    }

    #[test]
    fn length_gate_counts_chars_not_bytes() {
        // 3000 two-byte chars are exactly at the ceiling.
        assert_eq!(draft_too_long(&"ç".repeat(MAX_POST_CHARS)), None);
        assert_eq!(
            draft_too_long(&"ç".repeat(MAX_POST_CHARS + 1)),
            Some(MAX_POST_CHARS + 1)
        );
    }

    #[test]
    fn activity_post_deserializes_from_probe_shape() {
        let raw = r#"{"text":"hello","reactions":"1,234","comments":"7"}"#;
        let post: ActivityPost = serde_json::from_str(raw).unwrap();
        assert_eq!(post.reactions, "1,234");
    }
}
