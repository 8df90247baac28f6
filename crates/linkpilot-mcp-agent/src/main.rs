use anyhow::Result;
use clap::Parser;
use linkpilot::{auth, SessionManager, SessionOptions};
use linkpilot_mcp_agent::server::LinkPilotWrapper;
use linkpilot_mcp_agent::utils::init_logging;
use rmcp::{transport::stdio, ServiceExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "LinkPilot MCP Server - guarded LinkedIn automation via Model Context Protocol"
)]
struct Args {
    /// Directory for the persistent browser profile (cookies, session).
    #[arg(long, env = "LINKPILOT_PROFILE_DIR")]
    profile_dir: Option<PathBuf>,

    /// Run the browser with a visible window instead of headless.
    #[arg(long)]
    headed: bool,

    /// Run the interactive login flow and exit instead of serving.
    #[arg(long)]
    login: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging()?;

    let options = SessionOptions {
        headless: !args.headed,
        profile_dir: args
            .profile_dir
            .unwrap_or_else(linkpilot::session::default_profile_dir),
    };

    if args.login {
        return run_login(options).await;
    }

    tracing::info!("Initializing LinkPilot MCP server...");
    let wrapper = LinkPilotWrapper::new(options);
    let sessions = wrapper.sessions.clone();

    let service = wrapper.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Serving error: {:?}", e);
    })?;

    let served: Result<()> = tokio::select! {
        result = service.waiting() => {
            result.map(|_| ()).map_err(Into::into)
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            Ok(())
        }
    };

    // Always close the browser on the way out so the profile is flushed,
    // transport errors included.
    sessions.release().await;
    served
}

/// One-shot interactive login, for first-time setup outside an MCP client.
async fn run_login(options: SessionOptions) -> Result<()> {
    let sessions = Arc::new(SessionManager::new());
    tracing::info!("Opening LinkedIn login page; complete the login in the browser window");

    let logged_in =
        auth::wait_for_manual_login(&sessions, &options, Duration::from_secs(300)).await?;
    sessions.release().await;

    if logged_in {
        println!("Login confirmed. The session is stored in the profile directory.");
        Ok(())
    } else {
        anyhow::bail!("login was not completed within 5 minutes");
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(_) => {
                tokio::signal::ctrl_c().await.ok();
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}
