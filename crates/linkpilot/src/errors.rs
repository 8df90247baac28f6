use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    /// Authentication retries exhausted. Surfaced to the caller, never
    /// retried further.
    #[error("not logged in to LinkedIn; run the `login` tool first")]
    Unauthenticated,

    /// Timeout or network error during a page transition.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Commit invoked while no prepared action is observable on the page.
    #[error("no pending {0} to commit; run the prepare step first")]
    NoPendingAction(&'static str),

    /// Publish ceiling reached for this process lifetime.
    #[error("rate limit reached: {max} posts already published this session")]
    RateLimitExceeded { max: u32 },

    /// Browser context creation or teardown failure. Fatal: a locked
    /// profile directory usually means a concurrent instance.
    #[error("browser session error: {0}")]
    Session(String),

    /// A control required for forward progress could not be resolved.
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// Error bubbled up from the CDP driver.
    #[error("browser driver error: {0}")]
    Driver(String),
}

impl From<chromiumoxide::error::CdpError> for AutomationError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AutomationError::Driver(err.to_string())
    }
}
