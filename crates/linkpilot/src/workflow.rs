//! Guarded workflow engine: bounded step navigation and the session-wide
//! publish rate limit.
//!
//! Multi-page submission surfaces expose three kinds of controls: a
//! terminal commit control, a "review" control, and a "next" control.
//! [`navigate_steps`] walks them under a hard step bound, always
//! preferring the commit control, and stops *before* committing. The
//! commit itself is a separate, explicitly invoked operation. That split
//! is the central safety property of the engine: discovery is retryable
//! and inspectable, committing is irreversible.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::errors::AutomationError;

/// Default step bound for multi-step submission forms.
pub const DEFAULT_MAX_STEPS: u32 = 10;

/// Ceiling on posts published per process lifetime.
pub const MAX_POSTS_PER_SESSION: u32 = 3;

/// The three control kinds a step surface can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
    /// Terminal control: the workflow is ready to commit.
    Commit,
    /// Intermediate "review" affordance.
    Review,
    /// Intermediate "next" affordance.
    Next,
}

/// Outcome of the bounded step-navigation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A commit control is visible; `steps_taken` intermediate steps were
    /// navigated to reach it. Nothing has been committed.
    CommitReady { steps_taken: u32 },
    /// No recognizable control, or the step bound was exceeded. Not safe
    /// to retry blindly: an unrecognized intermediate state usually means
    /// a required field the engine cannot fill.
    Stuck { steps_taken: u32 },
}

/// A bounded multi-step UI surface, probed one control at a time.
#[async_trait]
pub trait StepSurface {
    /// Whether the given control is currently visible.
    async fn control_visible(&self, control: StepControl) -> bool;

    /// Click the given control.
    async fn click(&self, control: StepControl) -> Result<(), AutomationError>;

    /// Wait for the surface to settle after an intermediate click.
    async fn settle(&self);
}

/// Walk a step surface for at most `max_steps` iterations.
///
/// Per iteration the commit control wins the tie-break, so a form that
/// exposes both a stale "next" affordance and a visible commit control
/// never loops unnecessarily. Running out of controls, or out of steps,
/// yields [`StepOutcome::Stuck`], never a silent truncation.
pub async fn navigate_steps<S>(surface: &S, max_steps: u32) -> Result<StepOutcome, AutomationError>
where
    S: StepSurface + ?Sized,
{
    let mut steps_taken = 0u32;

    for _ in 0..max_steps {
        if surface.control_visible(StepControl::Commit).await {
            debug!(steps_taken, "commit control visible");
            return Ok(StepOutcome::CommitReady { steps_taken });
        }

        let next = if surface.control_visible(StepControl::Review).await {
            StepControl::Review
        } else if surface.control_visible(StepControl::Next).await {
            StepControl::Next
        } else {
            info!(steps_taken, "no recognizable control on step surface");
            return Ok(StepOutcome::Stuck { steps_taken });
        };

        surface.click(next).await?;
        surface.settle().await;
        steps_taken += 1;
    }

    info!(max_steps, "step bound exceeded without a terminal control");
    Ok(StepOutcome::Stuck { steps_taken })
}

/// A surface holding a pending irreversible action. The pending action is
/// whatever the page actually shows, never a stored flag: a commit control
/// that is not visible means there is nothing to commit.
#[async_trait]
pub trait CommitSurface {
    /// Whether a commit control is currently visible.
    async fn commit_visible(&self) -> bool;

    /// Click the commit control and wait out the submission.
    async fn commit(&self) -> Result<(), AutomationError>;
}

/// Commit the pending action on `surface`, or fail with
/// [`AutomationError::NoPendingAction`] without touching the surface when
/// no commit control is visible. `what` names the workflow in the error.
pub async fn commit_pending<S>(surface: &S, what: &'static str) -> Result<(), AutomationError>
where
    S: CommitSurface + ?Sized,
{
    if !surface.commit_visible().await {
        return Err(AutomationError::NoPendingAction(what));
    }
    surface.commit().await?;
    info!(what, "pending action committed");
    Ok(())
}

/// Process-scoped publish counter. Incremented only on a successful
/// commit, never on a prepare; reset only by process restart.
#[derive(Debug)]
pub struct RateLimiter {
    count: u32,
    max: u32,
}

impl RateLimiter {
    pub fn new(max: u32) -> Self {
        Self { count: 0, max }
    }

    /// Refuse further prepares once the ceiling is reached.
    pub fn check(&self) -> Result<(), AutomationError> {
        if self.count >= self.max {
            return Err(AutomationError::RateLimitExceeded { max: self.max });
        }
        Ok(())
    }

    /// Record one successful commit.
    pub fn record_commit(&mut self) {
        self.count += 1;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn max(&self) -> u32 {
        self.max
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(MAX_POSTS_PER_SESSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted surface: `commit_at` controls when the terminal control
    /// appears; until then a "next" control (and optionally a "review"
    /// control first) is visible.
    struct ScriptedSurface {
        /// Number of intermediate steps before the commit control shows.
        commit_after: Option<u32>,
        review_steps: u32,
        advanced: AtomicU32,
        commit_clicks: AtomicU32,
    }

    impl ScriptedSurface {
        fn new(commit_after: Option<u32>) -> Self {
            Self {
                commit_after,
                review_steps: 0,
                advanced: AtomicU32::new(0),
                commit_clicks: AtomicU32::new(0),
            }
        }

        fn steps(&self) -> u32 {
            self.advanced.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StepSurface for ScriptedSurface {
        async fn control_visible(&self, control: StepControl) -> bool {
            let at = self.steps();
            match control {
                StepControl::Commit => self.commit_after.is_some_and(|n| at >= n),
                StepControl::Review => at < self.review_steps,
                StepControl::Next => true,
            }
        }

        async fn click(&self, control: StepControl) -> Result<(), AutomationError> {
            if control == StepControl::Commit {
                self.commit_clicks.fetch_add(1, Ordering::SeqCst);
            } else {
                self.advanced.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }

        async fn settle(&self) {}
    }

    #[tokio::test]
    async fn commit_wins_tie_break_immediately() {
        // Commit visible from the start even though "next" is also
        // visible: zero steps taken.
        let surface = ScriptedSurface::new(Some(0));
        let outcome = navigate_steps(&surface, DEFAULT_MAX_STEPS).await.unwrap();
        assert_eq!(outcome, StepOutcome::CommitReady { steps_taken: 0 });
        assert_eq!(surface.steps(), 0);
    }

    #[tokio::test]
    async fn walks_intermediate_steps_until_commit() {
        let surface = ScriptedSurface::new(Some(3));
        let outcome = navigate_steps(&surface, DEFAULT_MAX_STEPS).await.unwrap();
        assert_eq!(outcome, StepOutcome::CommitReady { steps_taken: 3 });
    }

    #[tokio::test]
    async fn review_is_preferred_over_next() {
        let mut surface = ScriptedSurface::new(Some(2));
        surface.review_steps = 1;
        let outcome = navigate_steps(&surface, DEFAULT_MAX_STEPS).await.unwrap();
        assert_eq!(outcome, StepOutcome::CommitReady { steps_taken: 2 });
    }

    #[tokio::test]
    async fn twelve_step_form_is_stuck_at_bound() {
        // Commit would only appear after 12 steps; the bound is 10.
        let surface = ScriptedSurface::new(Some(12));
        let outcome = navigate_steps(&surface, 10).await.unwrap();
        assert_eq!(outcome, StepOutcome::Stuck { steps_taken: 10 });
        assert_eq!(surface.steps(), 10);
        // The commit control was never clicked.
        assert_eq!(surface.commit_clicks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unrecognizable_surface_is_stuck() {
        struct Blank;
        #[async_trait]
        impl StepSurface for Blank {
            async fn control_visible(&self, _: StepControl) -> bool {
                false
            }
            async fn click(&self, _: StepControl) -> Result<(), AutomationError> {
                panic!("nothing should be clicked on a blank surface");
            }
            async fn settle(&self) {}
        }
        let outcome = navigate_steps(&Blank, 5).await.unwrap();
        assert_eq!(outcome, StepOutcome::Stuck { steps_taken: 0 });
    }

    #[test]
    fn rate_limiter_refuses_after_ceiling() {
        let mut limiter = RateLimiter::new(3);
        for _ in 0..3 {
            limiter.check().unwrap();
            limiter.record_commit();
        }
        assert_eq!(limiter.count(), 3);
        match limiter.check() {
            Err(AutomationError::RateLimitExceeded { max }) => assert_eq!(max, 3),
            other => panic!("expected rate limit error, got {other:?}"),
        }
    }

    /// Commit surface that records clicks; the control is only visible
    /// when `pending` is set.
    struct PendingSurface {
        pending: bool,
        commits: AtomicU32,
    }

    impl PendingSurface {
        fn new(pending: bool) -> Self {
            Self {
                pending,
                commits: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl CommitSurface for PendingSurface {
        async fn commit_visible(&self) -> bool {
            self.pending
        }

        async fn commit(&self) -> Result<(), AutomationError> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn commit_without_pending_action_fails_without_mutation() {
        let surface = PendingSurface::new(false);
        match commit_pending(&surface, "application").await {
            Err(AutomationError::NoPendingAction("application")) => {}
            other => panic!("expected NoPendingAction, got {other:?}"),
        }
        assert_eq!(surface.commits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn commit_with_pending_action_clicks_once() {
        let surface = PendingSurface::new(true);
        commit_pending(&surface, "post").await.unwrap();
        assert_eq!(surface.commits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rate_limiter_counts_only_commits() {
        let mut limiter = RateLimiter::default();
        // Any number of checks (prepares) must not consume quota.
        for _ in 0..10 {
            limiter.check().unwrap();
        }
        assert_eq!(limiter.count(), 0);
        limiter.record_commit();
        assert_eq!(limiter.count(), 1);
    }
}
