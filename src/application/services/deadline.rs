use std::future::Future;
use std::time::Duration;

use crate::domain::errors::{RagError, RagResult};

/// Runs one external call under its own deadline. Expiry is transient.
pub async fn with_timeout<T, E, F>(limit: Duration, operation: &str, call: F) -> RagResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<RagError>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            tracing::warn!("{} timed out after {:?}", operation, limit);
            Err(RagError::transient(format!(
                "{} timed out after {}ms",
                operation,
                limit.as_millis()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_expired_call_is_transient() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, RagError>(1)
        };
        let err = with_timeout(Duration::from_secs(1), "search", slow)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_inner_error_is_converted() {
        let failing = async { Err::<(), _>(RagError::permanent("401")) };
        let err = with_timeout(Duration::from_secs(1), "embed", failing)
            .await
            .unwrap_err();
        assert_eq!(err, RagError::permanent("401"));
    }
}
