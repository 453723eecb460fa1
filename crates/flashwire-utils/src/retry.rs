use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Exponential backoff delay for the given zero-based attempt:
/// `initial * 2^attempt`.
pub fn backoff_delay(initial: Duration, attempt: u32) -> Duration {
    let millis = initial.as_millis() as u64;
    Duration::from_millis(millis.saturating_mul(1u64 << attempt.min(16)))
}

/// Run `op` up to `attempts` times, sleeping with exponential backoff
/// between failures. The last error is returned when every attempt fails.
pub async fn with_backoff<F, Fut, T, E>(
    label: &str,
    attempts: u32,
    initial_delay: Duration,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = attempts.max(1);
    let mut last_err = None;
    for attempt in 0..attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt + 1 < attempts {
                    let delay = backoff_delay(initial_delay, attempt);
                    debug!(
                        operation = label,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying after failure"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(err);
            }
        }
    }
    Err(last_err.expect("at least one attempt ran"))
}
