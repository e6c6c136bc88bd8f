use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::error::Result;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Run `op` up to `max_retries` additional times after the first attempt,
/// backing off linearly between attempts. Only transient errors are retried;
/// deterministic failures (unsupported language, validation, unintelligible
/// audio) surface immediately.
pub async fn with_retries<T, F, Fut>(max_retries: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_retries => {
                attempt += 1;
                let delay = RETRY_BASE_DELAY * attempt;
                warn!(
                    "Transient failure (attempt {}/{}), retrying in {:?}: {}",
                    attempt, max_retries, delay, e
                );
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
