//! Locator catalog for LinkedIn UI affordances.
//!
//! Centralized so that a markup change touches one file. Matching prefers
//! aria-labels, roles and visible text over bare CSS classes; LinkedIn's
//! UI language here is Portuguese (BR) with English fallbacks.
//!
//! The catalog is deliberately a pluggable classifier: nothing asserts
//! these patterns are stable or complete, and callers must treat a miss
//! as "fail safely", never "retry harder".

use crate::locator::{Locator, Strategy};
use crate::session::PageHandle;

const MODAL: &str = r#".artdeco-modal[role="dialog"]"#;

fn clickable(page: &PageHandle, label: &'static str, needles: &[&str]) -> Locator {
    Locator::new(
        page.page().clone(),
        label,
        vec![Strategy::ClickableText {
            scope: None,
            needles: needles.iter().map(|n| n.to_string()).collect(),
        }],
    )
}

fn clickable_in_modal(page: &PageHandle, label: &'static str, needles: &[&str]) -> Locator {
    Locator::new(
        page.page().clone(),
        label,
        vec![Strategy::ClickableText {
            scope: Some(MODAL.to_string()),
            needles: needles.iter().map(|n| n.to_string()).collect(),
        }],
    )
}

// -- Modals / overlays --

pub fn dismiss_modal(page: &PageHandle) -> Locator {
    Locator::css(
        page.page().clone(),
        "dismiss modal",
        "button[aria-label=\"Fechar\"], button[aria-label=\"Dismiss\"], \
         button[aria-label=\"Close\"], button.artdeco-modal__dismiss",
    )
}

// -- Easy Apply --

pub fn easy_apply_button(page: &PageHandle) -> Locator {
    clickable(
        page,
        "Easy Apply button",
        &["candidatura simplificada", "easy apply"],
    )
}

pub fn easy_apply_modal(page: &PageHandle) -> Locator {
    Locator::css(page.page().clone(), "Easy Apply modal", MODAL)
}

/// Marker for dynamic/required fields the engine does not understand:
/// dropdowns and radio groups inside the application modal. Presence
/// short-circuits prepare before any field is touched.
pub fn easy_apply_complex_form_marker(page: &PageHandle) -> Locator {
    Locator::css(
        page.page().clone(),
        "complex form marker",
        format!("{MODAL} select, {MODAL} fieldset [type=\"radio\"]"),
    )
}

/// Semantic field names the application form filler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Email,
    Phone,
    Message,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Email => "email",
            FormField::Phone => "phone",
            FormField::Message => "message",
        }
    }
}

pub fn easy_apply_form_field(page: &PageHandle, field: FormField) -> Locator {
    let selector = match field {
        FormField::Name => format!(r#"{MODAL} input[id*="name" i]"#),
        FormField::Email => {
            format!(r#"{MODAL} input[type="email"], {MODAL} input[id*="email" i]"#)
        }
        FormField::Phone => {
            format!(r#"{MODAL} input[type="tel"], {MODAL} input[id*="phone" i]"#)
        }
        FormField::Message => format!("{MODAL} textarea"),
    };
    Locator::css(page.page().clone(), field.as_str(), selector)
}

pub fn easy_apply_file_input(page: &PageHandle) -> Locator {
    Locator::css(
        page.page().clone(),
        "resume file input",
        format!(r#"{MODAL} input[type="file"]"#),
    )
}

pub fn easy_apply_next_button(page: &PageHandle) -> Locator {
    clickable_in_modal(page, "next step", &["avançar", "próximo", "next"])
}

pub fn easy_apply_review_button(page: &PageHandle) -> Locator {
    clickable_in_modal(page, "review step", &["revisar", "verificar", "review"])
}

pub fn easy_apply_submit_button(page: &PageHandle) -> Locator {
    // Keep the needle specific: "enviar" alone also matches "Enviar
    // mensagem" elsewhere in the modal.
    clickable_in_modal(
        page,
        "submit application",
        &["enviar candidatura", "submit application"],
    )
}

// -- Post creation (feed page) --

pub fn start_post_button(page: &PageHandle) -> Locator {
    clickable(
        page,
        "start a post",
        &[
            "comece uma publica",
            "criar publica",
            "iniciar publica",
            "start a post",
        ],
    )
}

pub fn post_editor(page: &PageHandle) -> Locator {
    // Quill-based contenteditable; the parent class changes more often
    // than the editor class itself.
    Locator::css(page.page().clone(), "post editor", ".ql-editor")
}

pub fn post_publish_button(page: &PageHandle) -> Locator {
    Locator::new(
        page.page().clone(),
        "publish post",
        vec![
            Strategy::Css(".share-actions__primary-action".to_string()),
            Strategy::ClickableText {
                scope: None,
                needles: vec!["publicar".to_string(), "post".to_string()],
            },
        ],
    )
}

// -- Activity feed (own posts) --

pub fn activity_post_items(page: &PageHandle) -> Locator {
    Locator::css(
        page.page().clone(),
        "activity posts",
        ".feed-shared-update-v2",
    )
}

// -- Jobs search --

pub fn job_results_list(page: &PageHandle) -> Locator {
    Locator::css(
        page.page().clone(),
        "job results list",
        ".scaffold-layout__list-container ul",
    )
}

pub fn job_details_title(page: &PageHandle) -> Locator {
    Locator::css(
        page.page().clone(),
        "job title",
        ".job-details-jobs-unified-top-card__job-title h1, \
         .jobs-unified-top-card__job-title",
    )
}

pub fn job_details_company(page: &PageHandle) -> Locator {
    Locator::css(
        page.page().clone(),
        "job company",
        ".job-details-jobs-unified-top-card__company-name a, \
         .jobs-unified-top-card__company-name a",
    )
}

pub fn job_details_metadata(page: &PageHandle) -> Locator {
    Locator::css(
        page.page().clone(),
        "job metadata",
        ".job-details-jobs-unified-top-card__primary-description-container, \
         .jobs-unified-top-card__subtitle-primary-grouping",
    )
}

pub fn job_details_description(page: &PageHandle) -> Locator {
    Locator::css(
        page.page().clone(),
        "job description",
        "#job-details, .jobs-description__content, .jobs-description-content",
    )
}
