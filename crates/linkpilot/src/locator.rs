//! Element locator capability.
//!
//! A [`Locator`] binds a semantic UI affordance ("the Easy Apply button")
//! to an ordered list of resolution strategies against the live page. The
//! rest of the crate never touches concrete markup: it asks a locator
//! whether the element is visible, clicks it, types into it, or reads its
//! text. Probe failures at optional sites degrade to `false`/`None`; only
//! the action methods return errors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use tracing::{debug, trace};

use crate::errors::AutomationError;
use crate::human;

/// Poll interval for visibility waits.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Attribute used to hand a JS-resolved element over to the CDP side.
const HIT_ATTR: &str = "data-lp-hit";

static HIT_SEQ: AtomicU64 = AtomicU64::new(0);

/// One way of resolving an element. Strategies are tried in order; the
/// first one that yields a visible element wins.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// A CSS selector, possibly a comma list of fallbacks.
    Css(String),
    /// A clickable element (button, link, `role="button"`) whose visible
    /// text or aria-label contains one of the needles, case-insensitively.
    /// Optionally scoped to the first element matching `scope`.
    ClickableText {
        scope: Option<String>,
        needles: Vec<String>,
    },
}

impl Strategy {
    fn probe_script(&self, mode: &ProbeMode) -> String {
        match self {
            Strategy::Css(selector) => {
                let sel = serde_json::to_string(selector).unwrap_or_default();
                format!(
                    r#"(() => {{
    const visible = (el) => {{
        const r = el.getBoundingClientRect();
        const st = window.getComputedStyle(el);
        return r.width > 0 && r.height > 0
            && st.visibility !== 'hidden' && st.display !== 'none';
    }};
    let count = 0;
    for (const el of document.querySelectorAll({sel})) {{
        if (!visible(el)) continue;
        count += 1;
        {action}
    }}
    return {tail};
}})()"#,
                    action = mode.per_match(),
                    tail = mode.tail(),
                )
            }
            Strategy::ClickableText { scope, needles } => {
                let needles: Vec<String> = needles.iter().map(|n| n.to_lowercase()).collect();
                let needles = serde_json::to_string(&needles).unwrap_or_default();
                let scope = serde_json::to_string(&scope.clone().unwrap_or_default())
                    .unwrap_or_default();
                format!(
                    r#"(() => {{
    const visible = (el) => {{
        const r = el.getBoundingClientRect();
        const st = window.getComputedStyle(el);
        return r.width > 0 && r.height > 0
            && st.visibility !== 'hidden' && st.display !== 'none';
    }};
    const scopeSel = {scope};
    const root = scopeSel ? document.querySelector(scopeSel) : document;
    if (!root) return {empty};
    const needles = {needles};
    let count = 0;
    for (const el of root.querySelectorAll('button, a, [role="button"]')) {{
        const text = ((el.innerText || '') + ' '
            + (el.getAttribute('aria-label') || '')).toLowerCase();
        if (!needles.some((n) => text.includes(n))) continue;
        if (!visible(el)) continue;
        count += 1;
        {action}
    }}
    return {tail};
}})()"#,
                    empty = mode.empty(),
                    action = mode.per_match(),
                    tail = mode.tail(),
                )
            }
        }
    }
}

enum ProbeMode {
    /// Return `true` if at least one visible match exists.
    Exists,
    /// Tag the first visible match with [`HIT_ATTR`] and return `true`.
    Mark(String),
    /// Return the number of visible matches.
    Count,
}

impl ProbeMode {
    fn per_match(&self) -> String {
        match self {
            ProbeMode::Exists => "return true;".into(),
            ProbeMode::Mark(tag) => {
                format!("el.setAttribute('{HIT_ATTR}', '{tag}'); return true;")
            }
            ProbeMode::Count => String::new(),
        }
    }

    fn tail(&self) -> &'static str {
        match self {
            ProbeMode::Exists | ProbeMode::Mark(_) => "false",
            ProbeMode::Count => "count",
        }
    }

    fn empty(&self) -> &'static str {
        match self {
            ProbeMode::Exists | ProbeMode::Mark(_) => "false",
            ProbeMode::Count => "0",
        }
    }
}

/// A semantic handle on zero-or-one-or-many elements of the live page.
#[derive(Clone)]
pub struct Locator {
    page: Page,
    label: &'static str,
    strategies: Vec<Strategy>,
}

impl Locator {
    pub fn new(page: Page, label: &'static str, strategies: Vec<Strategy>) -> Self {
        Self {
            page,
            label,
            strategies,
        }
    }

    pub fn css(page: Page, label: &'static str, selector: impl Into<String>) -> Self {
        Self::new(page, label, vec![Strategy::Css(selector.into())])
    }

    async fn eval_bool(&self, script: String) -> bool {
        match self.page.evaluate(script).await {
            Ok(result) => result.into_value::<bool>().unwrap_or(false),
            Err(e) => {
                trace!(label = self.label, "probe evaluation failed: {e}");
                false
            }
        }
    }

    /// Single visibility probe, no waiting.
    pub async fn is_visible_now(&self) -> bool {
        for strategy in &self.strategies {
            if self.eval_bool(strategy.probe_script(&ProbeMode::Exists)).await {
                return true;
            }
        }
        false
    }

    /// Poll for visibility until `timeout` elapses. Absorbs probe errors;
    /// a `false` answer is a typed outcome, not an exception.
    pub async fn is_visible(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.is_visible_now().await {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                debug!(label = self.label, ?timeout, "element did not become visible");
                return false;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Number of visible matches for the first strategy that yields any.
    pub async fn count(&self) -> usize {
        for strategy in &self.strategies {
            let script = strategy.probe_script(&ProbeMode::Count);
            if let Ok(result) = self.page.evaluate(script).await {
                let n = result.into_value::<usize>().unwrap_or(0);
                if n > 0 {
                    return n;
                }
            }
        }
        0
    }

    /// Resolve the first visible match into a CDP element handle.
    async fn resolve(&self) -> Option<Element> {
        let tag = format!("lp{}", HIT_SEQ.fetch_add(1, Ordering::Relaxed));
        for strategy in &self.strategies {
            if !self
                .eval_bool(strategy.probe_script(&ProbeMode::Mark(tag.clone())))
                .await
            {
                continue;
            }
            let hit_selector = format!("[{HIT_ATTR}=\"{tag}\"]");
            if let Ok(element) = self.page.find_element(&hit_selector).await {
                return Some(element);
            }
        }
        None
    }

    async fn require(&self) -> Result<Element, AutomationError> {
        self.resolve()
            .await
            .ok_or_else(|| AutomationError::ElementNotFound(self.label.to_string()))
    }

    /// Scroll into view and click the first visible match.
    pub async fn click(&self) -> Result<(), AutomationError> {
        let element = self.require().await?;
        // Scrolling can fail on elements that are already in view.
        let _ = element.scroll_into_view().await;
        element.click().await?;
        Ok(())
    }

    /// Focus the element, pause, then type the value with human pacing.
    pub async fn fill_paced(&self, value: &str) -> Result<(), AutomationError> {
        let element = self.require().await?;
        let _ = element.scroll_into_view().await;
        element.click().await?;
        human::jitter(300, 500).await;
        human::type_text(&element, value).await
    }

    /// Focus the element and type multi-line text, pressing Enter between
    /// lines. Within a line the per-key pacing is tighter than
    /// [`fill_paced`](Self::fill_paced): composing a post reads as flow
    /// typing, not field-by-field form entry.
    pub async fn fill_multiline(&self, value: &str) -> Result<(), AutomationError> {
        let element = self.require().await?;
        let _ = element.scroll_into_view().await;
        element.click().await?;
        human::jitter(300, 500).await;
        for (i, line) in value.split('\n').enumerate() {
            if i > 0 {
                element.press_key("Enter").await?;
                human::jitter(80, 160).await;
            }
            human::type_paced(&element, line, 10, 25).await?;
        }
        Ok(())
    }

    /// Inner text of the first visible match, waiting up to `timeout` for
    /// it to appear. `None` when absent or unreadable.
    pub async fn text(&self, timeout: Duration) -> Option<String> {
        if !self.is_visible(timeout).await {
            return None;
        }
        let element = self.resolve().await?;
        element.inner_text().await.ok().flatten()
    }

    /// Best-effort file attachment through the DOM file-input protocol.
    /// Hidden inputs are fine here: file inputs are resolved without the
    /// visibility filter. Returns whether a file was attached.
    pub async fn set_input_files(&self, path: &str) -> bool {
        // File inputs are typically display:none behind a styled button,
        // so resolve by plain CSS without the visibility probe.
        for strategy in &self.strategies {
            let Strategy::Css(selector) = strategy else {
                continue;
            };
            let Ok(element) = self.page.find_element(selector.as_str()).await else {
                continue;
            };
            let params = SetFileInputFilesParams::builder()
                .files(vec![path.to_string()])
                .backend_node_id(element.backend_node_id)
                .build();
            let Ok(params) = params else { continue };
            if self.page.execute(params).await.is_ok() {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_probe_escapes_quotes() {
        let strategy = Strategy::Css(r#"button[aria-label="Fechar"]"#.to_string());
        let script = strategy.probe_script(&ProbeMode::Exists);
        assert!(script.contains(r#""button[aria-label=\"Fechar\"]""#));
        assert!(script.contains("return true;"));
    }

    #[test]
    fn clickable_text_needles_are_lowercased() {
        let strategy = Strategy::ClickableText {
            scope: None,
            needles: vec!["Easy Apply".to_string()],
        };
        let script = strategy.probe_script(&ProbeMode::Exists);
        assert!(script.contains(r#"["easy apply"]"#));
    }

    #[test]
    fn count_mode_returns_count_expression() {
        let strategy = Strategy::Css(".feed-shared-update-v2".to_string());
        let script = strategy.probe_script(&ProbeMode::Count);
        assert!(script.trim_end().ends_with("})()"));
        assert!(script.contains("return count;"));
    }
}
