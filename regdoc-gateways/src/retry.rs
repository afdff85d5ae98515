//! Bounded exponential backoff shared by every gateway's transport retry
//! policy (§4.3: "exponential backoff, max 3 attempts").

use std::future::Future;
use std::time::Duration;

const BASE_DELAY: Duration = Duration::from_millis(200);

/// Runs `op` up to `max_attempts` times, doubling the delay between
/// attempts. Logs a `warn` on each retry and an `error` once attempts are
/// exhausted, per the corpus logging convention (§7).
pub async fn with_retry<T, E, F, Fut>(max_attempts: u32, operation: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts => {
                tracing::warn!(operation, attempt, error = %err, "upstream call failed, retrying");
                tokio::time::sleep(BASE_DELAY * 2u32.pow(attempt - 1)).await;
            }
            Err(err) => {
                tracing::error!(operation, attempt, error = %err, "upstream call failed, retries exhausted");
                return Err(err);
            }
        }
    }
}
