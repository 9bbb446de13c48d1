//! Cancellation helpers shared by the session manager and backends

use std::future::Future;

use tokio_util::sync::CancellationToken;

/// Run `fut` unless `cancel` fires first, in which case `cancelled` is returned.
///
/// An already-cancelled token short-circuits without polling `fut`.
pub(crate) async fn or_cancelled<F, T, E>(
    cancel: &CancellationToken,
    cancelled: E,
    fut: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    if cancel.is_cancelled() {
        return Err(cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(cancelled),
        result = fut => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_precancelled_token_skips_future() {
        let polled = AtomicBool::new(false);
        let token = CancellationToken::new();
        token.cancel();

        let result: Result<(), &str> = or_cancelled(&token, "cancelled", async {
            polled.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;

        assert_eq!(result, Err("cancelled"));
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancel_while_running() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result: Result<(), &str> = or_cancelled(&token, "cancelled", async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        })
        .await;

        assert_eq!(result, Err("cancelled"));
    }

    #[tokio::test]
    async fn test_completes_without_cancel() {
        let token = CancellationToken::new();
        let result = or_cancelled(&token, "cancelled", async { Ok::<_, &str>(7) }).await;
        tokio_test::assert_ok!(result);
    }
}
