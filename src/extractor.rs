// Bounded-wait field extraction against a rendering session.
use crate::browser::RenderingSession;
use crate::model::{ExtractError, NOT_AVAILABLE, ProductFields};
use crate::strategy::{FieldRule, SiteStrategy};
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout};
use tracing::debug;

/// Polls `session` until an element satisfying `rule` shows up, or the
/// rule's timeout runs out. A found element's trimmed text is the value,
/// even when empty.
///
/// A probe that hangs is cut off at the deadline as well. Hard lookup
/// errors (bad selector, dead session) end the wait immediately.
pub async fn extract_field(
    session: &mut dyn RenderingSession,
    rule: &FieldRule,
    poll_interval: Duration,
) -> Result<String, ExtractError> {
    let started = Instant::now();
    let deadline = started + rule.timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match timeout(remaining, session.probe(rule.selector, rule.condition)).await {
            Ok(Ok(Some(text))) => return rule.transform.apply(&text),
            Ok(Ok(None)) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => break,
        }

        if !session.is_live() {
            break;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        sleep(poll_interval.min(remaining)).await;
    }

    Err(ExtractError::Timeout {
        selector: rule.selector.to_string(),
        waited_ms: started.elapsed().as_millis(),
    })
}

/// The one place an extraction failure becomes the sentinel.
pub async fn extract_or_sentinel(
    session: &mut dyn RenderingSession,
    field: &str,
    rule: &FieldRule,
    poll_interval: Duration,
) -> String {
    match extract_field(session, rule, poll_interval).await {
        Ok(text) => text,
        Err(e) => {
            debug!("{} unavailable: {}", field, e);
            NOT_AVAILABLE.to_string()
        }
    }
}

/// Runs the three field rules of a strategy one after another. Each field
/// falls back on its own.
pub async fn extract_product(
    session: &mut dyn RenderingSession,
    strategy: &SiteStrategy,
    poll_interval: Duration,
) -> ProductFields {
    let product_name = extract_or_sentinel(session, "product name", &strategy.title, poll_interval).await;
    let mrp = extract_or_sentinel(session, "mrp", &strategy.mrp, poll_interval).await;
    let offer_price = extract_or_sentinel(session, "offer price", &strategy.offer_price, poll_interval).await;
    ProductFields {
        product_name,
        mrp,
        offer_price,
    }
}
