//! Remote calls checked for readiness without awaiting
//!
//! A [`RemoteCall`] runs its request as a tokio task and hands the response
//! back through a oneshot channel. Polling is a `try_recv` on that channel:
//! the only point where the polling loop touches the I/O side.

use std::future::Future;

use acm_client::ClientError;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::pollable::Readiness;

/// What a finished remote call produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome<T> {
    Value(T),
    /// The service answered 404
    NotFound,
    /// Any other error, already rendered to a message
    Failed(String),
}

impl<T> From<Result<T, ClientError>> for CallOutcome<T> {
    fn from(result: Result<T, ClientError>) -> Self {
        match result {
            Ok(value) => CallOutcome::Value(value),
            Err(e) if e.is_not_found() => CallOutcome::NotFound,
            Err(e) => CallOutcome::Failed(e.to_string()),
        }
    }
}

/// An in-flight request
///
/// Yields its outcome exactly once; owners replace the call with a fresh
/// one to retry. Dropping an unfinished call aborts its task.
#[derive(Debug)]
pub struct RemoteCall<T> {
    rx: oneshot::Receiver<Result<T, ClientError>>,
    handle: JoinHandle<()>,
    settled: bool,
}

impl<T: Send + 'static> RemoteCall<T> {
    /// Issue a request on the current tokio runtime
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime, like `tokio::spawn`.
    pub fn spawn<F>(request: F) -> Self
    where
        F: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            // Receiver gone means the owning operation was dropped
            let _ = tx.send(request.await);
        });

        Self {
            rx,
            handle,
            settled: false,
        }
    }
}

impl<T> RemoteCall<T> {
    /// Check whether the response has arrived
    ///
    /// Never blocks. After returning `Ready` once, the call is spent and
    /// reports a failure if polled again.
    pub fn poll(&mut self) -> Readiness<CallOutcome<T>> {
        if self.settled {
            return Readiness::Ready(CallOutcome::Failed(
                "remote call polled after it settled".to_string(),
            ));
        }

        match self.rx.try_recv() {
            Ok(result) => {
                self.settled = true;
                Readiness::Ready(result.into())
            }
            Err(TryRecvError::Empty) => Readiness::NotReady,
            Err(TryRecvError::Closed) => {
                self.settled = true;
                warn!("remote call task ended without a response");
                Readiness::Ready(CallOutcome::Failed(
                    "remote call task ended without a response".to_string(),
                ))
            }
        }
    }
}

impl<T> Drop for RemoteCall<T> {
    fn drop(&mut self) {
        if !self.settled {
            self.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::settle;

    #[tokio::test]
    async fn test_not_ready_until_task_runs() {
        let mut call = RemoteCall::spawn(async { Ok::<_, ClientError>(5) });

        // current-thread runtime: the task has not been scheduled yet
        assert_eq!(call.poll(), Readiness::NotReady);

        settle().await;
        assert_eq!(call.poll(), Readiness::Ready(CallOutcome::Value(5)));
    }

    #[tokio::test]
    async fn test_not_found_is_distinguished_from_failure() {
        let mut missing =
            RemoteCall::spawn(async { Err::<u32, _>(ClientError::NotFound("/r".into())) });
        let mut broken =
            RemoteCall::spawn(async { Err::<u32, _>(ClientError::api_error(500, "boom")) });
        settle().await;

        assert_eq!(missing.poll(), Readiness::Ready(CallOutcome::NotFound));
        assert!(matches!(
            broken.poll(),
            Readiness::Ready(CallOutcome::Failed(msg)) if msg.contains("500")
        ));
    }

    #[tokio::test]
    async fn test_panicked_task_becomes_failure() {
        let mut call = RemoteCall::spawn(async {
            if true {
                panic!("request task blew up");
            }
            Ok::<u32, ClientError>(1)
        });
        settle().await;

        assert!(matches!(
            call.poll(),
            Readiness::Ready(CallOutcome::Failed(_))
        ));
    }

    #[tokio::test]
    async fn test_spent_call_does_not_yield_twice() {
        let mut call = RemoteCall::spawn(async { Ok::<_, ClientError>("v") });
        settle().await;

        assert_eq!(call.poll(), Readiness::Ready(CallOutcome::Value("v")));
        assert!(matches!(
            call.poll(),
            Readiness::Ready(CallOutcome::Failed(_))
        ));
    }
}
