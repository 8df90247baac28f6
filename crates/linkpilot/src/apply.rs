//! Easy Apply workflow: prepare, then explicitly commit.
//!
//! Prepare navigates to the job, opens the application modal, fills the
//! fields it understands, walks the multi-step form up to the commit
//! control and stops there, returning a preview for human review.
//! Committing is a separate operation that clicks the submit control and
//! nothing else, trusting the state left by prepare.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::AutomationError;
use crate::human;
use crate::nav;
use crate::selectors::{self, FormField};
use crate::session::PageHandle;
use crate::workflow::{
    commit_pending, navigate_steps, CommitSurface, StepControl, StepOutcome, StepSurface,
    DEFAULT_MAX_STEPS,
};

/// Field bindings and attachments for one application.
#[derive(Debug, Clone)]
pub struct ApplicationRequest {
    pub job_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub resume_path: Option<String>,
}

impl ApplicationRequest {
    /// Semantic field bindings in fill order. Optional fields are bound
    /// only when a value was provided.
    pub fn bindings(&self) -> Vec<(FormField, String)> {
        let mut bindings = vec![
            (FormField::Name, self.full_name.clone()),
            (FormField::Email, self.email.clone()),
        ];
        if let Some(phone) = &self.phone {
            bindings.push((FormField::Phone, phone.clone()));
        }
        if let Some(message) = &self.message {
            bindings.push((FormField::Message, message.clone()));
        }
        bindings
    }
}

/// Structured preview returned by a successful prepare, for the caller to
/// surface to the human before the commit call.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationPreview {
    pub job_id: String,
    pub filled: Vec<&'static str>,
    pub skipped: Vec<&'static str>,
    pub resume_attached: bool,
    pub steps_taken: u32,
    pub commit_visible: bool,
}

/// Declared outcomes of the prepare phase. None of these are errors: each
/// is a state the caller must handle (and can safely report to a human).
#[derive(Debug, Clone)]
pub enum PrepareOutcome {
    /// The form is filled and the commit control is visible.
    Ready(ApplicationPreview),
    /// The job exposes no Easy Apply affordance (closed, external, or
    /// already applied).
    NoEasyApply,
    /// The complex-form marker matched; nothing was touched.
    ComplexForm,
    /// Step bound exceeded or no recognizable control. Do not retry
    /// blindly; hand the human the job URL for manual completion.
    Stuck { steps_taken: u32 },
}

/// A form surface that can be probed field by field. Split out from the
/// live modal so the fill policy is testable without a browser.
#[async_trait]
pub trait FormSurface {
    async fn complex_marker_visible(&self) -> bool;
    async fn field_visible(&self, field: FormField) -> bool;
    async fn fill_field(&self, field: FormField, value: &str) -> Result<(), AutomationError>;
}

/// Result of filling the understood subset of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOutcome {
    /// Dynamic/required fields the engine does not understand; aborted
    /// before touching anything.
    ComplexForm,
    Filled {
        filled: Vec<&'static str>,
        skipped: Vec<&'static str>,
    },
}

/// Fill every binding whose target field is present on the live form.
/// Absent fields are skipped, not errors: a missing optional field is a
/// typed outcome here, never an exception. The complex-form check runs
/// before any field is touched.
pub async fn fill_form<S>(surface: &S, bindings: &[(FormField, String)]) -> FillOutcome
where
    S: FormSurface + ?Sized,
{
    if surface.complex_marker_visible().await {
        return FillOutcome::ComplexForm;
    }

    let mut filled = Vec::new();
    let mut skipped = Vec::new();
    for (field, value) in bindings {
        if !surface.field_visible(*field).await {
            debug!(field = field.as_str(), "field absent, skipping");
            skipped.push(field.as_str());
            continue;
        }
        match surface.fill_field(*field, value).await {
            Ok(()) => filled.push(field.as_str()),
            Err(e) => {
                // A fill that fails mid-way degrades to "skipped": only
                // failures on the required path abort the operation.
                debug!(field = field.as_str(), "fill failed, skipping: {e}");
                skipped.push(field.as_str());
            }
        }
        human::jitter(400, 700).await;
    }

    FillOutcome::Filled { filled, skipped }
}

/// The live Easy Apply modal, backing both the field filler and the step
/// navigator.
pub struct EasyApplySurface<'a> {
    page: &'a PageHandle,
}

impl<'a> EasyApplySurface<'a> {
    pub fn new(page: &'a PageHandle) -> Self {
        Self { page }
    }
}

#[async_trait]
impl FormSurface for EasyApplySurface<'_> {
    async fn complex_marker_visible(&self) -> bool {
        selectors::easy_apply_complex_form_marker(self.page)
            .is_visible(Duration::from_secs(1))
            .await
    }

    async fn field_visible(&self, field: FormField) -> bool {
        selectors::easy_apply_form_field(self.page, field)
            .is_visible(Duration::from_secs(2))
            .await
    }

    async fn fill_field(&self, field: FormField, value: &str) -> Result<(), AutomationError> {
        selectors::easy_apply_form_field(self.page, field)
            .fill_paced(value)
            .await
    }
}

#[async_trait]
impl StepSurface for EasyApplySurface<'_> {
    async fn control_visible(&self, control: StepControl) -> bool {
        let locator = match control {
            StepControl::Commit => selectors::easy_apply_submit_button(self.page),
            StepControl::Review => selectors::easy_apply_review_button(self.page),
            StepControl::Next => selectors::easy_apply_next_button(self.page),
        };
        locator.is_visible(Duration::from_secs(2)).await
    }

    async fn click(&self, control: StepControl) -> Result<(), AutomationError> {
        let locator = match control {
            StepControl::Commit => selectors::easy_apply_submit_button(self.page),
            StepControl::Review => selectors::easy_apply_review_button(self.page),
            StepControl::Next => selectors::easy_apply_next_button(self.page),
        };
        locator.click().await
    }

    async fn settle(&self) {
        human::jitter(1500, 2500).await;
    }
}

#[async_trait]
impl CommitSurface for EasyApplySurface<'_> {
    async fn commit_visible(&self) -> bool {
        selectors::easy_apply_submit_button(self.page)
            .is_visible(Duration::from_secs(5))
            .await
    }

    async fn commit(&self) -> Result<(), AutomationError> {
        selectors::easy_apply_submit_button(self.page).click().await?;
        human::jitter(3000, 4000).await;
        Ok(())
    }
}

/// Prepare an application: everything up to, but never including, the
/// submit click.
pub async fn prepare_application(
    page: &PageHandle,
    request: &ApplicationRequest,
) -> Result<PrepareOutcome, AutomationError> {
    nav::to_job_view(page, &request.job_id).await?;
    human::jitter(1500, 2500).await;

    let apply_button = selectors::easy_apply_button(page);
    if !apply_button.is_visible(Duration::from_secs(10)).await {
        info!(job_id = %request.job_id, "no Easy Apply control on job page");
        return Ok(PrepareOutcome::NoEasyApply);
    }
    apply_button.click().await?;
    human::jitter(1000, 2000).await;

    if !selectors::easy_apply_modal(page)
        .is_visible(Duration::from_secs(10))
        .await
    {
        info!(job_id = %request.job_id, "application modal did not open");
        return Ok(PrepareOutcome::Stuck { steps_taken: 0 });
    }
    human::jitter(500, 1000).await;

    let surface = EasyApplySurface::new(page);

    let (filled, skipped) = match fill_form(&surface, &request.bindings()).await {
        FillOutcome::ComplexForm => {
            // Leave the page clean; a later commit must find nothing.
            if selectors::dismiss_modal(page).click().await.is_err() {
                debug!("could not dismiss application modal");
            }
            return Ok(PrepareOutcome::ComplexForm);
        }
        FillOutcome::Filled { filled, skipped } => (filled, skipped),
    };

    let mut resume_attached = false;
    if let Some(resume_path) = &request.resume_path {
        resume_attached = selectors::easy_apply_file_input(page)
            .set_input_files(resume_path)
            .await;
        if resume_attached {
            human::jitter(1000, 1500).await;
        } else {
            debug!("resume upload not available, skipping");
        }
    }

    match navigate_steps(&surface, DEFAULT_MAX_STEPS).await? {
        StepOutcome::CommitReady { steps_taken } => Ok(PrepareOutcome::Ready(ApplicationPreview {
            job_id: request.job_id.clone(),
            filled,
            skipped,
            resume_attached,
            steps_taken,
            commit_visible: true,
        })),
        StepOutcome::Stuck { steps_taken } => Ok(PrepareOutcome::Stuck { steps_taken }),
    }
}

/// Commit the application prepared by [`prepare_application`]. The
/// pending action exists only as observable UI state: if no submit
/// control is visible, there is nothing to commit and this fails cleanly
/// without touching the page further.
pub async fn commit_application(page: &PageHandle) -> Result<(), AutomationError> {
    commit_pending(&EasyApplySurface::new(page), "application").await?;
    info!("application submitted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Mutex;

    struct FakeForm {
        complex: bool,
        present: Vec<FormField>,
        fills: Mutex<Vec<(FormField, String)>>,
        probes: AtomicU32,
    }

    impl FakeForm {
        fn with_fields(present: Vec<FormField>) -> Self {
            Self {
                complex: false,
                present,
                fills: Mutex::new(Vec::new()),
                probes: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl FormSurface for FakeForm {
        async fn complex_marker_visible(&self) -> bool {
            self.complex
        }

        async fn field_visible(&self, field: FormField) -> bool {
            self.probes.fetch_add(1, Ordering::SeqCst);
            self.present.contains(&field)
        }

        async fn fill_field(&self, field: FormField, value: &str) -> Result<(), AutomationError> {
            self.fills.lock().await.push((field, value.to_string()));
            Ok(())
        }
    }

    fn request() -> ApplicationRequest {
        ApplicationRequest {
            job_id: "123".to_string(),
            full_name: "A".to_string(),
            email: "a@b.com".to_string(),
            phone: None,
            message: None,
            resume_path: None,
        }
    }

    #[tokio::test]
    async fn absent_fields_are_skipped_silently() {
        let form = FakeForm::with_fields(vec![FormField::Name]);
        let outcome = fill_form(&form, &request().bindings()).await;
        assert_eq!(
            outcome,
            FillOutcome::Filled {
                filled: vec!["name"],
                skipped: vec!["email"],
            }
        );
        let fills = form.fills.lock().await;
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0], (FormField::Name, "A".to_string()));
    }

    #[tokio::test]
    async fn complex_form_short_circuits_before_any_field() {
        let mut form = FakeForm::with_fields(vec![FormField::Name, FormField::Email]);
        form.complex = true;
        let outcome = fill_form(&form, &request().bindings()).await;
        assert_eq!(outcome, FillOutcome::ComplexForm);
        // No field was even probed, let alone filled.
        assert_eq!(form.probes.load(Ordering::SeqCst), 0);
        assert!(form.fills.lock().await.is_empty());
    }

    #[tokio::test]
    async fn fill_failure_degrades_to_skipped() {
        struct Flaky;
        #[async_trait]
        impl FormSurface for Flaky {
            async fn complex_marker_visible(&self) -> bool {
                false
            }
            async fn field_visible(&self, _: FormField) -> bool {
                true
            }
            async fn fill_field(&self, _: FormField, _: &str) -> Result<(), AutomationError> {
                Err(AutomationError::ElementNotFound("gone".to_string()))
            }
        }
        let outcome = fill_form(&Flaky, &request().bindings()).await;
        assert_eq!(
            outcome,
            FillOutcome::Filled {
                filled: vec![],
                skipped: vec!["name", "email"],
            }
        );
    }

    #[test]
    fn bindings_include_optionals_only_when_set() {
        let mut req = request();
        assert_eq!(req.bindings().len(), 2);

        req.phone = Some("+55 11 99999-0000".to_string());
        req.message = Some("hello".to_string());
        let bindings = req.bindings();
        assert_eq!(bindings.len(), 4);
        assert_eq!(bindings[2].0, FormField::Phone);
        assert_eq!(bindings[3].0, FormField::Message);
    }
}
