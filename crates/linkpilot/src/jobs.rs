//! Jobs search and job-details reads.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AutomationError;
use crate::nav::{self, DatePosted, Workplace};
use crate::selectors;
use crate::session::PageHandle;

/// Cap on scraped results per search.
const MAX_RESULTS: usize = 25;

/// Placeholder for details the page did not render. Reads degrade field
/// by field instead of failing the whole call.
const NOT_FOUND: &str = "(not found)";

/// One row from the jobs search results list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCard {
    pub job_id: String,
    pub title: String,
    pub company: String,
}

/// Full details of a single job posting.
#[derive(Debug, Clone, Serialize)]
pub struct JobDetails {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub metadata: String,
    pub description: String,
    pub url: String,
}

/// Run a jobs search and scrape the first page of results. Job ids come
/// from the card's `data-occludable-job-id` attribute, falling back to
/// the `/jobs/view/<id>` link when the attribute is missing.
pub async fn search_jobs(
    page: &PageHandle,
    keywords: &str,
    location: Option<&str>,
    date_posted: Option<DatePosted>,
    workplace: Option<Workplace>,
) -> Result<Vec<JobCard>, AutomationError> {
    nav::to_jobs_search(page, keywords, location, date_posted, workplace).await?;
    nav::scroll_to_load(page).await;

    if !selectors::job_results_list(page)
        .is_visible(Duration::from_secs(10))
        .await
    {
        debug!(keywords, "no job results rendered");
        return Ok(Vec::new());
    }

    let script = format!(
        r#"(() => {{
            const cards = Array.from(
                document.querySelectorAll("[data-occludable-job-id], .job-card-container")
            ).slice(0, {MAX_RESULTS});
            const seen = new Set();
            const out = [];
            for (const card of cards) {{
                let id = card.getAttribute("data-occludable-job-id");
                const link = card.querySelector('a[href*="/jobs/view/"]');
                if (!id && link) {{
                    const m = link.href.match(/\/jobs\/view\/(\d+)/);
                    if (m) id = m[1];
                }}
                if (!id || seen.has(id)) continue;
                seen.add(id);
                const title = card.querySelector(".job-card-list__title, .job-card-container__link strong, a[href*='/jobs/view/']");
                const company = card.querySelector(".job-card-container__primary-description, .artdeco-entity-lockup__subtitle");
                out.push({{
                    job_id: id,
                    title: title ? title.innerText.trim() : "{NOT_FOUND}",
                    company: company ? company.innerText.trim() : "{NOT_FOUND}",
                }});
            }}
            return out;
        }})()"#
    );

    let cards = page
        .page()
        .evaluate(script)
        .await?
        .into_value::<Vec<JobCard>>()
        .map_err(|e| AutomationError::Driver(format!("job results extraction: {e}")))?;

    info!(keywords, count = cards.len(), "jobs search scraped");
    Ok(cards)
}

/// Read the details panel of one job posting. The title is required (its
/// absence means the page never loaded); every other field degrades to a
/// placeholder when missing.
pub async fn get_job_details(
    page: &PageHandle,
    job_id: &str,
) -> Result<JobDetails, AutomationError> {
    nav::to_job_view(page, job_id).await?;

    let title = selectors::job_details_title(page)
        .text(Duration::from_secs(10))
        .await
        .ok_or_else(|| {
            AutomationError::Navigation(format!("job {job_id} did not load a details page"))
        })?;

    let company = selectors::job_details_company(page)
        .text(Duration::from_secs(2))
        .await
        .unwrap_or_else(|| NOT_FOUND.to_string());
    let metadata = selectors::job_details_metadata(page)
        .text(Duration::from_secs(2))
        .await
        .unwrap_or_else(|| NOT_FOUND.to_string());
    let description = selectors::job_details_description(page)
        .text(Duration::from_secs(5))
        .await
        .unwrap_or_else(|| NOT_FOUND.to_string());

    Ok(JobDetails {
        job_id: job_id.to_string(),
        title: title.trim().to_string(),
        company: company.trim().to_string(),
        metadata: metadata.trim().to_string(),
        description: description.trim().to_string(),
        url: nav::job_view_url(job_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_card_deserializes_from_probe_shape() {
        let raw = r#"[{"job_id":"41","title":"Rust Engineer","company":"Acme"}]"#;
        let cards: Vec<JobCard> = serde_json::from_str(raw).unwrap();
        assert_eq!(cards[0].job_id, "41");
    }
}
