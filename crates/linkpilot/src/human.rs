//! Human-like pacing for page interactions.
//!
//! Every UI interaction in this crate is threaded through these delays so
//! that navigation, clicks and keystrokes land at an organic rhythm rather
//! than machine speed.

use std::time::Duration;

use chromiumoxide::element::Element;
use rand::Rng;

use crate::errors::AutomationError;

/// Per-keystroke pacing bounds for standard form fields.
pub const KEYSTROKE_MIN_MS: u64 = 30;
pub const KEYSTROKE_MAX_MS: u64 = 100;

/// A random duration in `min_ms..=max_ms`, both bounds attainable.
fn jitter_duration(min_ms: u64, max_ms: u64) -> Duration {
    let delay_ms = if max_ms > min_ms {
        rand::thread_rng().gen_range(min_ms..=max_ms)
    } else {
        min_ms
    };
    Duration::from_millis(delay_ms)
}

/// Sleep for a random duration between `min_ms` and `max_ms`, inclusive.
pub async fn jitter(min_ms: u64, max_ms: u64) {
    tokio::time::sleep(jitter_duration(min_ms, max_ms)).await;
}

/// Type text into an element one character at a time with randomized
/// inter-keystroke delays.
pub async fn type_paced(
    element: &Element,
    text: &str,
    min_ms: u64,
    max_ms: u64,
) -> Result<(), AutomationError> {
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        element.type_str(ch.encode_utf8(&mut buf)).await?;
        jitter(min_ms, max_ms).await;
    }
    Ok(())
}

/// Type text with the default form-field pacing.
pub async fn type_text(element: &Element, text: &str) -> Result<(), AutomationError> {
    type_paced(element, text, KEYSTROKE_MIN_MS, KEYSTROKE_MAX_MS).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn jitter_handles_degenerate_range() {
        // min == max must not panic in gen_range
        jitter(1, 1).await;
    }

    #[test]
    fn jitter_covers_both_bounds() {
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..200 {
            let d = jitter_duration(1, 2).as_millis();
            assert!((1..=2).contains(&d));
            seen_min |= d == 1;
            seen_max |= d == 2;
        }
        assert!(seen_min && seen_max);
    }
}
