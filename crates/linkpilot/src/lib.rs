//! LinkedIn browser automation with a guarded, two-phase write model.
//!
//! The crate drives a real Chrome profile over CDP and exposes three
//! layers:
//!
//! - **Session**: a lazily launched, persistent browser profile
//!   ([`session::SessionManager`]) plus the authentication state machine
//!   ([`auth`]) that classifies and repairs login state.
//! - **Workflow**: bounded multi-step navigation and the prepare/commit
//!   split ([`workflow`], [`apply`], [`post`]). Nothing irreversible
//!   happens in a prepare, and every commit re-derives the pending action
//!   from what the page actually shows.
//! - **Reads**: jobs search and activity scraping ([`jobs`],
//!   [`post::get_my_posts`]) that degrade field by field instead of
//!   failing whole calls.

pub mod apply;
pub mod auth;
pub mod errors;
pub mod human;
pub mod jobs;
pub mod locator;
pub mod nav;
pub mod post;
pub mod selectors;
pub mod session;
pub mod workflow;

pub use apply::{ApplicationPreview, ApplicationRequest, PrepareOutcome};
pub use auth::AuthVerdict;
pub use errors::AutomationError;
pub use jobs::{JobCard, JobDetails};
pub use nav::{DatePosted, Workplace};
pub use post::{ActivityPost, PostPrepareOutcome, PostPreview};
pub use session::{SessionManager, SessionOptions};
pub use workflow::{RateLimiter, StepOutcome, MAX_POSTS_PER_SESSION};
