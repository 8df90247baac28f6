//! End-to-end exercises of the guarded workflow engine against simulated
//! form surfaces, covering the prepare/commit safety properties without a
//! live browser.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use linkpilot::apply::{fill_form, ApplicationRequest, FillOutcome, FormSurface};
use linkpilot::selectors::FormField;
use linkpilot::workflow::{
    commit_pending, navigate_steps, CommitSurface, RateLimiter, StepControl, StepOutcome,
    StepSurface, DEFAULT_MAX_STEPS,
};
use linkpilot::AutomationError;
use tokio::sync::Mutex;

/// A three-step Easy Apply form: name and phone fields on the first page,
/// then next, next, review, submit.
struct SimulatedEasyApply {
    step: AtomicU32,
    filled: Mutex<Vec<&'static str>>,
    submitted: AtomicU32,
}

impl SimulatedEasyApply {
    fn new() -> Self {
        Self {
            step: AtomicU32::new(0),
            filled: Mutex::new(Vec::new()),
            submitted: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl FormSurface for SimulatedEasyApply {
    async fn complex_marker_visible(&self) -> bool {
        false
    }

    async fn field_visible(&self, field: FormField) -> bool {
        matches!(field, FormField::Name | FormField::Phone)
    }

    async fn fill_field(&self, field: FormField, _value: &str) -> Result<(), AutomationError> {
        self.filled.lock().await.push(field.as_str());
        Ok(())
    }
}

#[async_trait]
impl StepSurface for SimulatedEasyApply {
    async fn control_visible(&self, control: StepControl) -> bool {
        let step = self.step.load(Ordering::SeqCst);
        match control {
            StepControl::Next => step < 2,
            StepControl::Review => step == 2,
            StepControl::Commit => step >= 3,
        }
    }

    async fn click(&self, control: StepControl) -> Result<(), AutomationError> {
        match control {
            StepControl::Commit => {
                self.submitted.fetch_add(1, Ordering::SeqCst);
            }
            StepControl::Next | StepControl::Review => {
                self.step.fetch_add(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }

    async fn settle(&self) {}
}

#[tokio::test]
async fn full_prepare_flow_stops_short_of_submitting() {
    let form = SimulatedEasyApply::new();
    let request = ApplicationRequest {
        job_id: "4200".to_string(),
        full_name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        phone: Some("+1 555 0100".to_string()),
        message: None,
        resume_path: None,
    };

    let outcome = fill_form(&form, &request.bindings()).await;
    assert_eq!(
        outcome,
        FillOutcome::Filled {
            filled: vec!["name", "phone"],
            skipped: vec!["email"],
        }
    );

    let outcome = navigate_steps(&form, DEFAULT_MAX_STEPS).await.unwrap();
    assert_eq!(outcome, StepOutcome::CommitReady { steps_taken: 3 });

    // The commit control was reached but never clicked.
    assert_eq!(form.submitted.load(Ordering::SeqCst), 0);
}

/// A form whose first page carries a dropdown the engine cannot answer.
/// Nothing is ever fillable or committable on it.
struct ComplexOnlyForm {
    fills: AtomicU32,
    commits: AtomicU32,
}

#[async_trait]
impl FormSurface for ComplexOnlyForm {
    async fn complex_marker_visible(&self) -> bool {
        true
    }

    async fn field_visible(&self, _field: FormField) -> bool {
        true
    }

    async fn fill_field(&self, _field: FormField, _value: &str) -> Result<(), AutomationError> {
        self.fills.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl CommitSurface for ComplexOnlyForm {
    async fn commit_visible(&self) -> bool {
        false
    }

    async fn commit(&self) -> Result<(), AutomationError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn complex_form_then_commit_finds_nothing_pending() {
    let form = ComplexOnlyForm {
        fills: AtomicU32::new(0),
        commits: AtomicU32::new(0),
    };
    let request = ApplicationRequest {
        job_id: "4300".to_string(),
        full_name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        phone: None,
        message: None,
        resume_path: None,
    };

    let outcome = fill_form(&form, &request.bindings()).await;
    assert_eq!(outcome, FillOutcome::ComplexForm);
    assert_eq!(form.fills.load(Ordering::SeqCst), 0);

    // The aborted prepare left nothing behind, so a commit refuses.
    match commit_pending(&form, "application").await {
        Err(AutomationError::NoPendingAction("application")) => {}
        other => panic!("expected NoPendingAction, got {other:?}"),
    }
    assert_eq!(form.commits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn post_quota_spends_on_commit_not_prepare() {
    let mut limiter = RateLimiter::new(3);

    // Any number of prepares is fine while nothing commits.
    for _ in 0..10 {
        limiter.check().unwrap();
    }

    for _ in 0..3 {
        limiter.check().unwrap();
        limiter.record_commit();
    }

    match limiter.check() {
        Err(AutomationError::RateLimitExceeded { max: 3 }) => {}
        other => panic!("expected rate limit refusal, got {other:?}"),
    }
}
