use anyhow::Result;
use linkpilot::{RateLimiter, SessionManager, SessionOptions};
use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct EmptyArgs {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LoginArgs {
    #[schemars(
        description = "How long to wait for the manual login to complete, in milliseconds. Defaults to 300000 (5 minutes)."
    )]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PrepareApplicationArgs {
    #[schemars(description = "LinkedIn job id (the numeric id from the job URL)")]
    pub job_id: String,
    #[schemars(description = "Full name to fill into the application form")]
    pub full_name: String,
    #[schemars(description = "Email address to fill into the application form")]
    pub email: String,
    #[schemars(description = "Optional phone number")]
    pub phone: Option<String>,
    #[schemars(description = "Optional free-text message / cover note")]
    pub message: Option<String>,
    #[schemars(description = "Optional absolute path to a resume file to attach")]
    pub resume_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PreparePostArgs {
    #[schemars(description = "Post body. Line breaks are preserved. Capped at 3000 characters.")]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchJobsArgs {
    #[schemars(description = "Search keywords, e.g. 'rust engineer'")]
    pub keywords: String,
    #[schemars(description = "Optional location filter, e.g. 'Berlin'")]
    pub location: Option<String>,
    #[schemars(description = "Optional date-posted filter: 'past-24h', 'past-week' or 'past-month'")]
    pub date_posted: Option<String>,
    #[schemars(description = "Optional workplace filter: 'on-site', 'remote' or 'hybrid'")]
    pub workplace: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetJobDetailsArgs {
    #[schemars(description = "LinkedIn job id (the numeric id from the job URL)")]
    pub job_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetMyPostsArgs {
    #[schemars(description = "Maximum number of posts to return (default 5, capped at 20)")]
    pub limit: Option<usize>,
}

impl GetMyPostsArgs {
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(5).min(20)
    }
}

#[derive(Clone)]
pub struct LinkPilotWrapper {
    pub sessions: Arc<SessionManager>,
    pub options: SessionOptions,
    pub post_limiter: Arc<Mutex<RateLimiter>>,
    pub tool_router: rmcp::handler::server::tool::ToolRouter<Self>,
}

pub fn init_logging() -> Result<()> {
    let log_level = env::var("LOG_LEVEL")
        .map(|level| match level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    // stdout carries the MCP transport; logs must go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    Ok(())
}
