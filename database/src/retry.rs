use std::{future::Future, pin::Pin, time::Duration};

use tokio::time::sleep;

pub type RetryFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

const MAX_DELAY: Duration = Duration::from_secs(5);

/// Runs `operation` until it succeeds or `max_retries` extra attempts have failed,
/// doubling the pause between attempts up to five seconds.
pub async fn retry_with_backoff<F, T, E>(
    mut operation: F,
    max_retries: usize,
    initial_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> RetryFuture<T, E>,
    E: std::fmt::Display,
{
    let mut delay = initial_delay;
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    attempt,
                    max_retries,
                    ?delay,
                    "Attempt failed: {}. Retrying...",
                    e
                );
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(e) => return Err(e),
        }
    }
}
