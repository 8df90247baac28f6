pub use crate::utils::LinkPilotWrapper;
use crate::utils::{
    EmptyArgs, GetJobDetailsArgs, GetMyPostsArgs, LoginArgs, PrepareApplicationArgs,
    PreparePostArgs, SearchJobsArgs,
};
use linkpilot::{
    apply, auth, jobs, nav, post, ApplicationRequest, AutomationError, DatePosted,
    PostPrepareOutcome, PrepareOutcome, RateLimiter, SessionManager, SessionOptions, Workplace,
};
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{tool, Error as McpError, ServerHandler};
use rmcp::{tool_handler, tool_router};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const MANUAL_LOGIN_TIMEOUT: Duration = Duration::from_secs(300);

/// Render a declared automation failure as a tool error with remediation
/// guidance the calling model can act on.
fn automation_failure(e: AutomationError) -> CallToolResult {
    let message = match &e {
        AutomationError::Unauthenticated => {
            "Not logged in to LinkedIn. Run the `login` tool and complete the login \
             (including any 2FA prompt) in the browser window it opens."
                .to_string()
        }
        AutomationError::RateLimitExceeded { max } => format!(
            "Post limit reached for this session ({max} posts). Restart the server to post again."
        ),
        AutomationError::NoPendingAction(what) => format!(
            "No pending {what} to commit. Run the matching prepare tool first and check its preview."
        ),
        other => format!("Automation failed: {other}"),
    };
    CallToolResult::error(vec![Content::text(message)])
}

#[tool_router]
impl LinkPilotWrapper {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            sessions: Arc::new(SessionManager::new()),
            options,
            post_limiter: Arc::new(Mutex::new(RateLimiter::default())),
            tool_router: Self::tool_router(),
        }
    }

    /// Acquire an authenticated page, mapping failure to a tool error.
    async fn authenticated_page(
        &self,
    ) -> Result<Result<linkpilot::session::PageHandle, CallToolResult>, McpError> {
        match auth::ensure_logged_in(&self.sessions, &self.options).await {
            Ok(page) => Ok(Ok(page)),
            Err(e @ AutomationError::Session(_)) => Err(McpError::internal_error(
                "Failed to launch the automation browser",
                serde_json::to_value(e.to_string()).ok(),
            )),
            Err(e) => Ok(Err(automation_failure(e))),
        }
    }

    #[tool(
        description = "Open a visible browser window on the LinkedIn login page and wait for the user to log in manually (2FA and captcha included). The session cookie is stored in a persistent profile, so this is only needed once per profile. Read-only until the user acts."
    )]
    pub async fn login(
        &self,
        Parameters(args): Parameters<LoginArgs>,
    ) -> Result<CallToolResult, McpError> {
        let timeout = args
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(MANUAL_LOGIN_TIMEOUT);

        match auth::wait_for_manual_login(&self.sessions, &self.options, timeout).await {
            Ok(true) => Ok(CallToolResult::success(vec![Content::json(json!({
                "status": "logged_in",
                "note": "Session stored in the persistent profile; subsequent tools can run headless.",
            }))?])),
            Ok(false) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Login was not completed within {}s. Run `login` again, optionally with a larger timeout_ms.",
                timeout.as_secs()
            ))])),
            Err(e) => Ok(automation_failure(e)),
        }
    }

    #[tool(
        description = "Check whether the current browser profile holds a valid LinkedIn session. Read-only."
    )]
    pub async fn check_session(
        &self,
        Parameters(_args): Parameters<EmptyArgs>,
    ) -> Result<CallToolResult, McpError> {
        let page = match self.sessions.acquire(&self.options).await {
            Ok(page) => page,
            Err(e) => return Ok(automation_failure(e)),
        };
        let verdict = auth::classify(&page).await;
        Ok(CallToolResult::success(vec![Content::json(json!({
            "status": format!("{verdict:?}"),
            "logged_in": verdict == linkpilot::AuthVerdict::LoggedIn,
        }))?]))
    }

    #[tool(
        description = "Close the automation browser and drop the in-memory session. The persistent profile (cookies) is kept on disk."
    )]
    pub async fn logout(
        &self,
        Parameters(_args): Parameters<EmptyArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.sessions.release().await;
        Ok(CallToolResult::success(vec![Content::text(
            "Browser session closed. The on-disk profile was kept; use `login` after deleting it to switch accounts.",
        )]))
    }

    #[tool(
        description = "Prepare an Easy Apply application for a job: open the form, fill the known fields, optionally attach a resume, and navigate to the final step WITHOUT submitting. Returns a preview; call `commit_application` to actually submit. Changes page state but submits nothing."
    )]
    pub async fn prepare_application(
        &self,
        Parameters(args): Parameters<PrepareApplicationArgs>,
    ) -> Result<CallToolResult, McpError> {
        let page = match self.authenticated_page().await? {
            Ok(page) => page,
            Err(failure) => return Ok(failure),
        };

        let request = ApplicationRequest {
            job_id: args.job_id.clone(),
            full_name: args.full_name,
            email: args.email,
            phone: args.phone,
            message: args.message,
            resume_path: args.resume_path,
        };

        match apply::prepare_application(&page, &request).await {
            Ok(PrepareOutcome::Ready(preview)) => {
                Ok(CallToolResult::success(vec![Content::json(json!({
                    "status": "ready_to_commit",
                    "preview": preview,
                    "next": "Review the preview with the user, then call `commit_application` to submit.",
                }))?]))
            }
            Ok(PrepareOutcome::NoEasyApply) => Ok(CallToolResult::error(vec![Content::text(
                format!(
                    "Job {} has no Easy Apply option (external posting, closed, or already applied). \
                     Apply manually at {}",
                    args.job_id,
                    nav::job_view_url(&args.job_id)
                ),
            )])),
            Ok(PrepareOutcome::ComplexForm) => Ok(CallToolResult::error(vec![Content::text(
                format!(
                    "The application form for job {} has custom questions this tool cannot answer. \
                     Nothing was filled or submitted; complete it manually at {}",
                    args.job_id,
                    nav::job_view_url(&args.job_id)
                ),
            )])),
            Ok(PrepareOutcome::Stuck { steps_taken }) => {
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Got stuck after {steps_taken} form steps without reaching the submit button. \
                     Nothing was submitted; finish manually at {}",
                    nav::job_view_url(&args.job_id)
                ))]))
            }
            Err(e) => Ok(automation_failure(e)),
        }
    }

    #[tool(
        description = "Submit the application prepared by `prepare_application`. IRREVERSIBLE: this sends the application to the employer. Fails if no prepared application is pending."
    )]
    pub async fn commit_application(
        &self,
        Parameters(_args): Parameters<EmptyArgs>,
    ) -> Result<CallToolResult, McpError> {
        let page = match self.authenticated_page().await? {
            Ok(page) => page,
            Err(failure) => return Ok(failure),
        };

        match apply::commit_application(&page).await {
            Ok(()) => Ok(CallToolResult::success(vec![Content::json(json!({
                "status": "submitted",
            }))?])),
            Err(e) => Ok(automation_failure(e)),
        }
    }

    #[tool(
        description = "Type a post draft into the LinkedIn share box WITHOUT publishing. Returns a preview; call `commit_post` to publish. Refused once the session post limit is reached."
    )]
    pub async fn prepare_post(
        &self,
        Parameters(args): Parameters<PreparePostArgs>,
    ) -> Result<CallToolResult, McpError> {
        let page = match self.authenticated_page().await? {
            Ok(page) => page,
            Err(failure) => return Ok(failure),
        };

        let limiter = self.post_limiter.lock().await;
        match post::prepare_post(&page, &limiter, &args.text).await {
            Ok(PostPrepareOutcome::Ready(preview)) => {
                Ok(CallToolResult::success(vec![Content::json(json!({
                    "status": "ready_to_commit",
                    "preview": preview,
                    "next": "Review the draft with the user, then call `commit_post` to publish.",
                }))?]))
            }
            Ok(PostPrepareOutcome::TooLong { characters }) => {
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "The draft is {characters} characters; LinkedIn posts are capped at {} characters. \
                     Shorten the draft and prepare again.",
                    post::MAX_POST_CHARS
                ))]))
            }
            Ok(PostPrepareOutcome::Unavailable { what }) => {
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Could not open the {what} on the feed page. The page layout may have changed \
                     or the session may be degraded; try `check_session`."
                ))]))
            }
            Err(e) => Ok(automation_failure(e)),
        }
    }

    #[tool(
        description = "Publish the post drafted by `prepare_post`. IRREVERSIBLE: the post goes live on the user's profile. Counts against the session post limit. Fails if no drafted post is pending."
    )]
    pub async fn commit_post(
        &self,
        Parameters(_args): Parameters<EmptyArgs>,
    ) -> Result<CallToolResult, McpError> {
        let page = match self.authenticated_page().await? {
            Ok(page) => page,
            Err(failure) => return Ok(failure),
        };

        let mut limiter = self.post_limiter.lock().await;
        match post::commit_post(&page, &mut limiter).await {
            Ok(posts_used) => Ok(CallToolResult::success(vec![Content::json(json!({
                "status": "published",
                "posts_used": posts_used,
                "posts_max": limiter.max(),
            }))?])),
            Err(e) => Ok(automation_failure(e)),
        }
    }

    #[tool(
        description = "Search LinkedIn jobs by keywords with optional location, date-posted and workplace filters. Read-only; returns up to 25 results with job ids usable in `get_job_details` and `prepare_application`."
    )]
    pub async fn search_jobs(
        &self,
        Parameters(args): Parameters<SearchJobsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let date_posted = match parse_filter::<DatePosted>(args.date_posted.as_deref()) {
            Ok(v) => v,
            Err(raw) => {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Unknown date_posted filter '{raw}'. Use 'past-24h', 'past-week' or 'past-month'."
                ))]))
            }
        };
        let workplace = match parse_filter::<Workplace>(args.workplace.as_deref()) {
            Ok(v) => v,
            Err(raw) => {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Unknown workplace filter '{raw}'. Use 'on-site', 'remote' or 'hybrid'."
                ))]))
            }
        };

        let page = match self.authenticated_page().await? {
            Ok(page) => page,
            Err(failure) => return Ok(failure),
        };

        match jobs::search_jobs(
            &page,
            &args.keywords,
            args.location.as_deref(),
            date_posted,
            workplace,
        )
        .await
        {
            Ok(cards) => Ok(CallToolResult::success(vec![Content::json(json!({
                "count": cards.len(),
                "jobs": cards,
            }))?])),
            Err(e) => Ok(automation_failure(e)),
        }
    }

    #[tool(description = "Fetch title, company, metadata and description of one job posting by id. Read-only.")]
    pub async fn get_job_details(
        &self,
        Parameters(args): Parameters<GetJobDetailsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let page = match self.authenticated_page().await? {
            Ok(page) => page,
            Err(failure) => return Ok(failure),
        };

        match jobs::get_job_details(&page, &args.job_id).await {
            Ok(details) => Ok(CallToolResult::success(vec![Content::json(&details)?])),
            Err(e) => Ok(automation_failure(e)),
        }
    }

    #[tool(
        description = "Read the user's most recent posts from their activity page, with engagement counts. Read-only."
    )]
    pub async fn get_my_posts(
        &self,
        Parameters(args): Parameters<GetMyPostsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let page = match self.authenticated_page().await? {
            Ok(page) => page,
            Err(failure) => return Ok(failure),
        };

        match post::get_my_posts(&page, args.effective_limit()).await {
            Ok(posts) => Ok(CallToolResult::success(vec![Content::json(json!({
                "count": posts.len(),
                "posts": posts,
            }))?])),
            Err(e) => Ok(automation_failure(e)),
        }
    }
}

/// Parse an optional kebab-case filter string into its enum. Returns the
/// raw input on failure so the error message can echo it back.
fn parse_filter<T: serde::de::DeserializeOwned>(raw: Option<&str>) -> Result<Option<T>, String> {
    match raw {
        None => Ok(None),
        Some(s) => serde_json::from_value::<T>(serde_json::Value::String(s.to_string()))
            .map(Some)
            .map_err(|_| s.to_string()),
    }
}

#[tool_handler]
impl ServerHandler for LinkPilotWrapper {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(get_server_instructions().to_string()),
        }
    }
}

fn get_server_instructions() -> &'static str {
    "
You control a real LinkedIn account through a persistent browser profile. Treat every write as acting on the user's professional identity.

**Golden rules**

1. **NOTHING IRREVERSIBLE WITHOUT A PREPARE + EXPLICIT COMMIT.** Applications and posts are two-phase: `prepare_*` fills everything and returns a preview but never submits; `commit_*` performs the irreversible click. Always show the preview to the user and get their confirmation before committing.

2. **LOGIN IS MANUAL.** Never ask for, accept, or type LinkedIn credentials. If a tool reports the session is not authenticated, run `login`: it opens a visible browser window for the user to log in themselves (including 2FA). The session persists on disk afterwards.

3. **A PREPARE CAN DECLINE.** `prepare_application` may report that the job has no Easy Apply option, that the form has custom questions it cannot answer, or that it got stuck. These are final for this tool - hand the user the job URL from the message instead of retrying.

4. **RESPECT THE POST LIMIT.** At most 3 posts can be published per server session. A refused prepare means the limit is spent; do not try to work around it.

5. **READS ARE SAFE.** `check_session`, `search_jobs`, `get_job_details` and `get_my_posts` never change account state and can be used freely.
"
}
