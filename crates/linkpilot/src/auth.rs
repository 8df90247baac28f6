//! Authentication state machine.
//!
//! Session state is observable only through the page address, so the
//! verdict is recomputed on every check and never cached. Two ordered,
//! disjoint pattern sets classify the address; blocked paths are checked
//! first so that a login wall inside an otherwise authenticated-looking
//! URL still reads as logged out.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::errors::AutomationError;
use crate::human;
use crate::session::{PageHandle, SessionManager, SessionOptions};

pub const FEED_URL: &str = "https://www.linkedin.com/feed/";
pub const LOGIN_URL: &str = "https://www.linkedin.com/login";

/// Address fragments that imply a login wall, checkpoint or auth wall.
const BLOCKED_PATHS: [&str; 4] = ["/login", "/checkpoint", "/authwall", "/uas/login"];

/// Address fragments of known authenticated-only areas.
const LOGGED_IN_PATHS: [&str; 6] = [
    "/feed",
    "/mynetwork",
    "/jobs",
    "/messaging",
    "/notifications",
    "/in/",
];

/// Benign warm-up destinations visited before a manual login, so the
/// fresh browser fingerprint looks organically used.
const WARM_UP_SITES: [&str; 2] = ["https://www.google.com", "https://www.github.com"];

const NAV_TIMEOUT: Duration = Duration::from_secs(15);
const REDIRECT_QUIESCENCE: Duration = Duration::from_millis(1500);
const LOGIN_POLL_INTERVAL: Duration = Duration::from_secs(2);

const MAX_AUTH_ATTEMPTS: u32 = 3;
const AUTH_BACKOFF_BASE: Duration = Duration::from_secs(2);

/// Classification of the current page address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthVerdict {
    LoggedOut,
    LoggedIn,
    /// Transient: resolved by an active probe before being returned to
    /// callers.
    Unknown,
}

/// Pure address classification. Blocked paths take precedence over
/// authenticated paths; anything else is `Unknown`.
pub fn classify_url(url: &str) -> AuthVerdict {
    if BLOCKED_PATHS.iter().any(|p| url.contains(p)) {
        return AuthVerdict::LoggedOut;
    }
    if LOGGED_IN_PATHS.iter().any(|p| url.contains(p)) {
        return AuthVerdict::LoggedIn;
    }
    AuthVerdict::Unknown
}

/// Linear backoff before re-checking authentication: `attempt × base`.
pub fn auth_backoff(attempt: u32) -> Duration {
    AUTH_BACKOFF_BASE * attempt
}

/// Classify the live session, resolving `Unknown` with an active probe:
/// navigate to the feed, wait out client-side redirects, then apply the
/// blocked-path check only. Navigation failure is treated as logged out.
pub async fn classify(page: &PageHandle) -> AuthVerdict {
    if let Some(url) = page.current_url().await {
        match classify_url(&url) {
            AuthVerdict::Unknown => {}
            verdict => return verdict,
        }
    }

    if let Err(e) = page.goto_bounded(FEED_URL, NAV_TIMEOUT).await {
        warn!("feed probe failed, treating as logged out: {e}");
        return AuthVerdict::LoggedOut;
    }
    tokio::time::sleep(REDIRECT_QUIESCENCE).await;

    let final_url = page.current_url().await.unwrap_or_default();
    if BLOCKED_PATHS.iter().any(|p| final_url.contains(p)) {
        AuthVerdict::LoggedOut
    } else {
        AuthVerdict::LoggedIn
    }
}

/// Acquire a session and confirm it is authenticated, retrying up to
/// three times with linear backoff. Persistent-profile cookies may still
/// be loading on first paint, so a single negative check is not trusted.
pub async fn ensure_logged_in(
    manager: &SessionManager,
    opts: &SessionOptions,
) -> Result<PageHandle, AutomationError> {
    for attempt in 1..=MAX_AUTH_ATTEMPTS {
        let page = manager.acquire(opts).await?;
        if classify(&page).await == AuthVerdict::LoggedIn {
            return Ok(page);
        }
        debug!(attempt, "authentication check negative");
        if attempt < MAX_AUTH_ATTEMPTS {
            tokio::time::sleep(auth_backoff(attempt)).await;
        }
    }
    Err(AutomationError::Unauthenticated)
}

/// Visit a couple of benign sites with jittered dwell time. Individual
/// failures are not critical.
pub async fn warm_up(page: &PageHandle) {
    for site in WARM_UP_SITES {
        if let Err(e) = page.goto_bounded(site, Duration::from_secs(10)).await {
            debug!("warm-up visit to {site} failed: {e}");
        }
        human::jitter(1000, 3000).await;
    }
}

/// Force an interactive session, open the LinkedIn login page, and poll
/// until the user has logged in (2FA and captcha included) or `timeout`
/// elapses. Returns whether login succeeded; only an unrecoverable
/// navigation failure during setup is an error.
pub async fn wait_for_manual_login(
    manager: &SessionManager,
    opts: &SessionOptions,
    timeout: Duration,
) -> Result<bool, AutomationError> {
    let page = manager.acquire(&opts.with_headless(false)).await?;

    warm_up(&page).await;

    page.goto_bounded(LOGIN_URL, NAV_TIMEOUT).await?;
    info!("waiting for manual login (timeout {timeout:?})");

    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if classify(&page).await == AuthVerdict::LoggedIn {
            info!("manual login confirmed");
            return Ok(true);
        }
        tokio::time::sleep(LOGIN_POLL_INTERVAL).await;
    }

    warn!("manual login timed out");
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_paths_classify_logged_out() {
        for url in [
            "https://www.linkedin.com/login",
            "https://www.linkedin.com/checkpoint/challenge/abc",
            "https://www.linkedin.com/authwall?trk=x",
            "https://www.linkedin.com/uas/login?session_redirect=%2Ffeed%2F",
        ] {
            assert_eq!(classify_url(url), AuthVerdict::LoggedOut, "{url}");
        }
    }

    #[test]
    fn authenticated_paths_classify_logged_in() {
        for url in [
            "https://www.linkedin.com/feed/",
            "https://www.linkedin.com/mynetwork/grow/",
            "https://www.linkedin.com/jobs/view/123/",
            "https://www.linkedin.com/messaging/thread/1/",
            "https://www.linkedin.com/notifications/",
            "https://www.linkedin.com/in/someone/",
        ] {
            assert_eq!(classify_url(url), AuthVerdict::LoggedIn, "{url}");
        }
    }

    #[test]
    fn blocked_wins_over_authenticated() {
        // A login redirect that mentions the feed must still read as
        // logged out.
        assert_eq!(
            classify_url("https://www.linkedin.com/uas/login?session_redirect=/feed/"),
            AuthVerdict::LoggedOut
        );
    }

    #[test]
    fn unrelated_urls_are_unknown() {
        assert_eq!(
            classify_url("https://www.linkedin.com/"),
            AuthVerdict::Unknown
        );
        assert_eq!(classify_url("about:blank"), AuthVerdict::Unknown);
    }

    #[test]
    fn backoff_is_linear_in_attempt() {
        assert_eq!(auth_backoff(1), Duration::from_secs(2));
        assert_eq!(auth_backoff(2), Duration::from_secs(4));
        assert_eq!(auth_backoff(3), Duration::from_secs(6));
    }
}
