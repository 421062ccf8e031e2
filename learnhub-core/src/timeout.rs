use crate::CoreError;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Result of racing a task against a deadline.
#[derive(Debug)]
pub enum Raced<T> {
    Done(T),
    /// The deadline fired first. The task keeps running; `Pending` can be
    /// awaited later to pick up its result.
    TimedOut(Pending<T>),
}

#[derive(Debug)]
pub struct Pending<T> {
    handle: JoinHandle<T>,
}

impl<T> Pending<T> {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn wait(self) -> Result<T, CoreError> {
        self.handle
            .await
            .map_err(|e| CoreError::unavailable(format!("task failed: {e}")))
    }

    pub async fn wait_for(self, duration: Duration) -> Result<Raced<T>, CoreError> {
        race_handle(self.handle, duration).await
    }
}

/// Runs `task` on the current runtime and waits at most `duration` for it.
/// Timing out does not cancel the task.
pub async fn race_with_timeout<F>(task: F, duration: Duration) -> Result<Raced<F::Output>, CoreError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    race_handle(tokio::spawn(task), duration).await
}

async fn race_handle<T>(mut handle: JoinHandle<T>, duration: Duration) -> Result<Raced<T>, CoreError> {
    match tokio::time::timeout(duration, &mut handle).await {
        Ok(Ok(v)) => Ok(Raced::Done(v)),
        Ok(Err(e)) => Err(CoreError::unavailable(format!("task failed: {e}"))),
        Err(_) => {
            tracing::debug!(?duration, "task exceeded deadline, leaving it running");
            Ok(Raced::TimedOut(Pending { handle }))
        }
    }
}
