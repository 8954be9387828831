//! # Conflict Retry
//!
//! Inventory and bill writes are compare-and-set: a write that loses a race
//! comes back as a conflict instead of overwriting. The engines answer a
//! conflict by re-reading and trying again, a bounded number of times.
//!
//! ```text
//! attempt 0 ──► Conflict ──► attempt 1 ──► Conflict ──► ... ──► attempt N ──► Conflict
//!                                                                    │
//!      any other result is returned as-is                            ▼
//!                                                           Err(Conflict) to caller
//! ```

use std::future::Future;

use tracing::debug;

use splash_db::DbError;

/// Errors that can tell a lost compare-and-set apart from a real failure.
pub trait Retryable {
    fn is_conflict(&self) -> bool;
}

impl Retryable for DbError {
    fn is_conflict(&self) -> bool {
        DbError::is_conflict(self)
    }
}

/// Runs `op` until it stops reporting a conflict, at most
/// `max_retries + 1` times.
///
/// `op` must re-read whatever it compares against on every call; replaying a
/// stale revision would just conflict again.
pub async fn retry_on_conflict<T, E, F, Fut>(
    what: &str,
    max_retries: u32,
    mut op: F,
) -> Result<T, E>
where
    E: Retryable,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(e) if e.is_conflict() && attempt < max_retries => {
                attempt += 1;
                debug!(what = %what, attempt = attempt, "Write conflict, retrying");
                tokio::task::yield_now().await;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Conflict,
        Broken,
    }

    impl Retryable for TestError {
        fn is_conflict(&self) -> bool {
            *self == TestError::Conflict
        }
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let result: Result<u32, TestError> = retry_on_conflict("test", 3, move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(TestError::Conflict)
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let result: Result<(), TestError> = retry_on_conflict("test", 2, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TestError::Conflict)
        })
        .await;

        assert_eq!(result, Err(TestError::Conflict));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let calls = &calls;

        let result: Result<(), TestError> = retry_on_conflict("test", 5, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TestError::Broken)
        })
        .await;

        assert_eq!(result, Err(TestError::Broken));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
