//! Per-call deadline for store operations.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Deadline applied when the configuration does not set one.
pub const DEFAULT_STORE_DEADLINE: Duration = Duration::from_secs(3);

/// A store call did not finish within its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("store call exceeded its {0:?} deadline")]
pub struct DeadlineExceeded(pub Duration);

/// Runs `call`, failing with `DeadlineExceeded` once `deadline` elapses.
///
/// The call is dropped on expiry; an open transaction inside it rolls back.
/// No retry is attempted.
pub(crate) async fn bounded<T, E, F>(deadline: Duration, call: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<DeadlineExceeded>,
{
    if let Ok(result) = tokio::time::timeout(deadline, call).await {
        result
    } else {
        tracing::warn!(?deadline, "Store call timed out");
        Err(DeadlineExceeded(deadline).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum TestError {
        Timeout(DeadlineExceeded),
    }

    impl From<DeadlineExceeded> for TestError {
        fn from(e: DeadlineExceeded) -> Self {
            Self::Timeout(e)
        }
    }

    #[tokio::test]
    async fn test_completes_within_deadline() {
        let result: Result<u8, TestError> =
            bounded(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_times_out() {
        let deadline = Duration::from_millis(20);
        let result: Result<u8, TestError> = bounded(deadline, async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(1)
        })
        .await;

        assert_eq!(result, Err(TestError::Timeout(DeadlineExceeded(deadline))));
    }
}
