//! Linear-backoff retry policy shared by every HTTP-calling adapter.
//!
//! Mirrors the original `AsyncRetry`: only the configured error set is
//! retried, cancellation is never swallowed (a cancelled task future simply
//! never resolves the retry loop instead of being caught and retried), and
//! backoff is `delay * attempt`.

use std::future::Future;
use std::time::Duration;

/// The outcome of an exhausted retry loop: the last error encountered.
#[derive(Debug)]
pub struct RetryError<E>(pub E);

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "retries exhausted: {}", self.0)
    }
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for RetryError<E> {}

/// Run `op` up to `max_retries + 1` times. Between attempts, sleep
/// `delay * attempt`. `should_retry` decides whether a given error is worth
/// retrying at all; errors it rejects propagate immediately without
/// consuming further attempts.
pub async fn retry_with_backoff<T, E, F, Fut, ShouldRetry>(
    max_retries: u32,
    delay: Duration,
    mut op: F,
    should_retry: ShouldRetry,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    ShouldRetry: Fn(&E) -> bool,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_retries || !should_retry(&err) {
                    return Err(RetryError(err));
                }
                attempt += 1;
                tokio::time::sleep(delay * attempt).await;
            }
        }
    }
}
