//! Timeout enforcement for storage calls.
//!
//! Every store call made while serving a request runs under the configured
//! `storage.timeout_ms` deadline. An elapsed deadline is reported as
//! `StoreError::Timeout`, distinct from backend failures.

use std::future::Future;
use std::time::Duration;

use crate::storage::{StoreError, StoreResult};

/// Run `fut`, failing with [`StoreError::Timeout`] once `limit` elapses.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_within_deadline() {
        let value = with_deadline(Duration::from_millis(200), async { Ok::<_, StoreError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_passes_through_errors() {
        let err = with_deadline(Duration::from_millis(200), async {
            Err::<(), _>(StoreError::Backend("boom".into()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn test_times_out() {
        let err = with_deadline(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, StoreError>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Timeout(d) if d == Duration::from_millis(50)));
    }
}
