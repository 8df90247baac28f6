//! Shared navigation helpers for LinkedIn pages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::AutomationError;
use crate::human;
use crate::session::PageHandle;

const NAV_TIMEOUT: Duration = Duration::from_secs(15);

/// Navigate to the feed page.
pub async fn to_feed(page: &PageHandle) -> Result<(), AutomationError> {
    page.goto_bounded(crate::auth::FEED_URL, NAV_TIMEOUT).await?;
    human::jitter(1000, 2000).await;
    Ok(())
}

/// Navigate to a specific job posting.
pub async fn to_job_view(page: &PageHandle, job_id: &str) -> Result<(), AutomationError> {
    page.goto_bounded(&job_view_url(job_id), NAV_TIMEOUT).await?;
    human::jitter(1000, 2000).await;
    Ok(())
}

pub fn job_view_url(job_id: &str) -> String {
    format!("https://www.linkedin.com/jobs/view/{job_id}/")
}

/// Navigate to the logged-in user's activity page (recent posts).
pub async fn to_my_activity(page: &PageHandle) -> Result<(), AutomationError> {
    page.goto_bounded(
        "https://www.linkedin.com/in/me/recent-activity/all/",
        NAV_TIMEOUT,
    )
    .await?;
    human::jitter(1500, 2500).await;
    Ok(())
}

/// Date-posted filter, mapped to LinkedIn's `f_TPR` parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DatePosted {
    #[serde(rename = "past-24h")]
    Past24h,
    #[serde(rename = "past-week")]
    PastWeek,
    #[serde(rename = "past-month")]
    PastMonth,
}

impl DatePosted {
    fn param(self) -> &'static str {
        match self {
            DatePosted::Past24h => "r86400",
            DatePosted::PastWeek => "r604800",
            DatePosted::PastMonth => "r2592000",
        }
    }
}

/// Workplace filter, mapped to LinkedIn's `f_WT` parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Workplace {
    OnSite,
    Remote,
    Hybrid,
}

impl Workplace {
    fn param(self) -> &'static str {
        match self {
            Workplace::OnSite => "1",
            Workplace::Remote => "2",
            Workplace::Hybrid => "3",
        }
    }
}

/// Build the jobs search URL. Filters are translated to LinkedIn's
/// internal `f_` parameters.
pub fn jobs_search_url(
    keywords: &str,
    location: Option<&str>,
    date_posted: Option<DatePosted>,
    workplace: Option<Workplace>,
) -> String {
    let mut params = format!("keywords={}", urlencoding::encode(keywords));
    if let Some(location) = location {
        params.push_str(&format!("&location={}", urlencoding::encode(location)));
    }
    if let Some(date_posted) = date_posted {
        params.push_str(&format!("&f_TPR={}", date_posted.param()));
    }
    if let Some(workplace) = workplace {
        params.push_str(&format!("&f_WT={}", workplace.param()));
    }
    format!("https://www.linkedin.com/jobs/search/?{params}")
}

/// Navigate to the jobs search page with the given query.
pub async fn to_jobs_search(
    page: &PageHandle,
    keywords: &str,
    location: Option<&str>,
    date_posted: Option<DatePosted>,
    workplace: Option<Workplace>,
) -> Result<(), AutomationError> {
    let url = jobs_search_url(keywords, location, date_posted, workplace);
    page.goto_bounded(&url, NAV_TIMEOUT).await?;
    human::jitter(1500, 2500).await;
    Ok(())
}

/// Scroll down progressively to trigger lazy-loading of sections, then
/// return to the top.
pub async fn scroll_to_load(page: &PageHandle) {
    for _ in 0..8 {
        page.scroll_by(400).await;
        human::jitter(300, 600).await;
    }
    page.scroll_to_top().await;
    human::jitter(300, 500).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_keywords_and_location() {
        let url = jobs_search_url("Software Engineer", Some("São Paulo"), None, None);
        assert!(url.starts_with("https://www.linkedin.com/jobs/search/?"));
        assert!(url.contains("keywords=Software%20Engineer"));
        assert!(url.contains("location=S%C3%A3o%20Paulo"));
        assert!(!url.contains("f_TPR"));
        assert!(!url.contains("f_WT"));
    }

    #[test]
    fn search_url_maps_filters() {
        let url = jobs_search_url(
            "rust",
            None,
            Some(DatePosted::PastWeek),
            Some(Workplace::Remote),
        );
        assert!(url.contains("f_TPR=r604800"));
        assert!(url.contains("f_WT=2"));
    }

    #[test]
    fn date_posted_parses_kebab_case() {
        let parsed: DatePosted = serde_json::from_str("\"past-24h\"").unwrap();
        assert_eq!(parsed, DatePosted::Past24h);
    }

    #[test]
    fn job_view_url_embeds_id() {
        assert_eq!(
            job_view_url("1234567890"),
            "https://www.linkedin.com/jobs/view/1234567890/"
        );
    }
}
