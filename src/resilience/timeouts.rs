//! Deadline enforcement for upstream calls.
//!
//! Every bureau call goes through [`with_deadline`]; an unbounded call is a
//! bug. Timeouts map to [`FetchError::Timeout`] so the breaker counts them
//! like any other upstream failure.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::credit::FetchError;

/// Run `fut`, giving up after `deadline`.
pub async fn with_deadline<T, Fut>(deadline: Duration, fut: Fut) -> Result<T, FetchError>
where
    Fut: Future<Output = Result<T, FetchError>>,
{
    match timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(deadline)),
    }
}
