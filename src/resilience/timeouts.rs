//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap backend calls with a deadline
//! - Cancel operations cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Timed-out requests return 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

use crate::http::client::ForwardError;

/// Run a backend call under `limit`.
///
/// The inner future is dropped on expiry, which closes its connection.
pub async fn with_deadline<T, F>(limit: Duration, call: F) -> Result<T, ForwardError>
where
    F: Future<Output = Result<T, ForwardError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ForwardError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_fast_calls() {
        let result = with_deadline(Duration::from_secs(1), async { Ok::<_, ForwardError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn passes_through_inner_errors() {
        let result: Result<(), _> = with_deadline(Duration::from_secs(1), async {
            Err(ForwardError::Connect("refused".into()))
        })
        .await;
        assert!(matches!(result, Err(ForwardError::Connect(_))));
    }

    #[tokio::test]
    async fn expires_slow_calls() {
        let result = with_deadline(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, ForwardError>(())
        })
        .await;
        assert!(matches!(result, Err(ForwardError::Timeout(d)) if d == Duration::from_millis(50)));
    }
}
