//! Task poller.
//!
//! A cancellable control loop that re-fetches a task's status on a fixed
//! interval until the task reaches a terminal state. Each successful query
//! replaces the held snapshot in full; the latest response is always
//! authoritative. At most one query is in flight at any time: the query is
//! awaited inline, so a slow response defers the next tick rather than
//! overlapping it.

use std::sync::Arc;
use std::time::Duration;

use meshprint_core::{ApiKey, GenerationTask, TaskId};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ClientError;
use crate::generation::StatusSource;

/// Default delay between status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Poller configuration.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between status queries.
    pub interval: Duration,

    /// Maximum number of status queries before giving up. `None` polls
    /// until the task is terminal, matching the service's own lack of a
    /// deadline.
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

/// Polling errors.
#[derive(Debug, Error)]
pub enum PollError {
    /// A status query failed; the loop stops without retrying.
    #[error("status query failed: {0}")]
    Query(#[from] ClientError),

    /// Polling was cancelled by the caller.
    #[error("polling cancelled")]
    Cancelled,

    /// The attempt cap was reached before a terminal status.
    #[error("task not terminal after {0} status queries")]
    AttemptsExhausted(u32),
}

/// Handle to a running polling loop.
///
/// Dropping the handle does not stop the loop; call [`PollHandle::cancel`]
/// for deterministic teardown.
pub struct PollHandle {
    updates: watch::Receiver<Option<GenerationTask>>,
    cancel: CancellationToken,
    join: JoinHandle<Result<GenerationTask, PollError>>,
}

impl PollHandle {
    /// Subscribe to snapshot updates. The receiver holds `None` until the
    /// first query resolves.
    pub fn updates(&self) -> watch::Receiver<Option<GenerationTask>> {
        self.updates.clone()
    }

    /// The most recently applied snapshot, if any.
    pub fn latest(&self) -> Option<GenerationTask> {
        self.updates.borrow().clone()
    }

    /// Stop the loop. No further queries are issued after this returns,
    /// and the result of any in-flight query is discarded.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the loop to finish and return the terminal snapshot.
    ///
    /// A panic inside the loop is resumed on the caller rather than
    /// reported as cancellation.
    pub async fn join(self) -> Result<GenerationTask, PollError> {
        match self.join.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(PollError::Cancelled),
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        }
    }
}

/// Spawns polling loops.
pub struct Poller;

impl Poller {
    /// Start polling the given task. The first query is issued immediately,
    /// then every `config.interval` until a terminal status, a query error,
    /// cancellation, or the attempt cap.
    pub fn spawn<S: StatusSource>(
        source: Arc<S>,
        task_id: TaskId,
        key: ApiKey,
        config: PollConfig,
    ) -> PollHandle {
        let cancel = CancellationToken::new();
        let (tx, rx) = watch::channel(None);
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut attempts: u32 = 0;

            loop {
                // First tick resolves immediately; later ticks pace the loop.
                tokio::select! {
                    _ = token.cancelled() => return Err(PollError::Cancelled),
                    _ = ticker.tick() => {}
                }

                // Cancellation during the query discards its result: the
                // snapshot is never applied after cancel().
                let snapshot = tokio::select! {
                    _ = token.cancelled() => return Err(PollError::Cancelled),
                    result = source.fetch_status(&task_id, &key) => result?,
                };

                attempts += 1;
                debug!(
                    task_id = %task_id,
                    status = ?snapshot.status,
                    progress = snapshot.progress,
                    "Applied status snapshot"
                );

                let terminal = snapshot.is_terminal();
                tx.send_replace(Some(snapshot.clone()));

                if terminal {
                    return Ok(snapshot);
                }

                if let Some(max) = config.max_attempts {
                    if attempts >= max {
                        return Err(PollError::AttemptsExhausted(max));
                    }
                }
            }
        });

        PollHandle {
            updates: rx,
            cancel,
            join,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use meshprint_core::{ModelUrls, TaskStatus};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    fn snapshot(id: &str, status: TaskStatus, progress: u8) -> GenerationTask {
        let mut task = GenerationTask::pending(TaskId::new(id));
        task.status = status;
        task.progress = progress;
        task
    }

    /// Plays back a scripted sequence of responses, repeating the last one.
    struct ScriptedSource {
        script: Mutex<Vec<Result<GenerationTask, ()>>>,
        calls: AtomicU32,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<GenerationTask, ()>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch_status(
            &self,
            _id: &TaskId,
            _key: &ApiKey,
        ) -> Result<GenerationTask, ClientError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            let script = self.script.lock().unwrap();
            let step = script.get(n).or_else(|| script.last()).cloned().unwrap();
            step.map_err(|_| ClientError::Upstream {
                status: 500,
                message: "boom".into(),
            })
        }
    }

    fn fast_config() -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(5),
            max_attempts: None,
        }
    }

    #[tokio::test]
    async fn test_polls_until_succeeded_then_stops() {
        // Scenario A: pending, then succeeded with a glb url.
        let mut done = snapshot("t1", TaskStatus::Succeeded, 100);
        done.model_urls = ModelUrls {
            glb: Some("https://cdn.example/m.glb".into()),
            ..ModelUrls::default()
        };
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(snapshot("t1", TaskStatus::Pending, 0)),
            Ok(done.clone()),
        ]));

        let handle = Poller::spawn(
            source.clone(),
            TaskId::new("t1"),
            ApiKey::new("k"),
            fast_config(),
        );
        let result = handle.join().await.unwrap();

        assert_eq!(result.status, TaskStatus::Succeeded);
        assert_eq!(result.model_urls.glb.as_deref(), Some("https://cdn.example/m.glb"));
        assert_eq!(source.calls(), 2);

        // No further queries once terminal.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_terminal_on_first_query_issues_single_query() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(snapshot(
            "t1",
            TaskStatus::Canceled,
            0,
        ))]));

        let handle = Poller::spawn(
            source.clone(),
            TaskId::new("t1"),
            ApiKey::new("k"),
            fast_config(),
        );
        let result = handle.join().await.unwrap();

        assert_eq!(result.status, TaskStatus::Canceled);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_task_carries_error_message_verbatim() {
        let mut failed = snapshot("t1", TaskStatus::Failed, 30);
        failed.task_error = Some(meshprint_core::TaskError {
            message: "mesh generation rejected".into(),
        });
        let source = Arc::new(ScriptedSource::new(vec![Ok(failed)]));

        let handle = Poller::spawn(source, TaskId::new("t1"), ApiKey::new("k"), fast_config());
        let result = handle.join().await.unwrap();

        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(result.error_message(), Some("mesh generation rejected"));
    }

    #[tokio::test]
    async fn test_query_error_stops_loop_without_retry() {
        let source = Arc::new(ScriptedSource::new(vec![Err(())]));

        let handle = Poller::spawn(
            source.clone(),
            TaskId::new("t1"),
            ApiKey::new("k"),
            fast_config(),
        );
        let err = handle.join().await.unwrap_err();

        assert!(matches!(err, PollError::Query(ClientError::Upstream { status: 500, .. })));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_attempt_cap() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(snapshot(
            "t1",
            TaskStatus::InProgress,
            50,
        ))]));

        let handle = Poller::spawn(
            source.clone(),
            TaskId::new("t1"),
            ApiKey::new("k"),
            PollConfig {
                interval: Duration::from_millis(5),
                max_attempts: Some(3),
            },
        );
        let err = handle.join().await.unwrap_err();

        assert!(matches!(err, PollError::AttemptsExhausted(3)));
        assert_eq!(source.calls(), 3);
    }

    /// Blocks inside fetch_status until cancelled, flagging entry.
    struct HangingSource {
        entered: Arc<Notify>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl StatusSource for HangingSource {
        async fn fetch_status(
            &self,
            id: &TaskId,
            _key: &ApiKey,
        ) -> Result<GenerationTask, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            // Simulate a request that never resolves before cancellation.
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(GenerationTask::pending(id.clone()))
        }
    }

    /// Panics on every status query.
    struct PanickingSource;

    #[async_trait]
    impl StatusSource for PanickingSource {
        async fn fetch_status(
            &self,
            _id: &TaskId,
            _key: &ApiKey,
        ) -> Result<GenerationTask, ClientError> {
            panic!("status source blew up");
        }
    }

    #[tokio::test]
    async fn test_panic_in_loop_propagates_instead_of_reporting_cancelled() {
        let handle = Poller::spawn(
            Arc::new(PanickingSource),
            TaskId::new("t1"),
            ApiKey::new("k"),
            fast_config(),
        );

        // join() must resume the panic, not swallow it as Cancelled.
        let outer = tokio::spawn(async move { handle.join().await });
        let err = outer.await.unwrap_err();
        assert!(err.is_panic());
    }

    #[tokio::test]
    async fn test_cancel_discards_in_flight_query() {
        let entered = Arc::new(Notify::new());
        let source = Arc::new(HangingSource {
            entered: entered.clone(),
            calls: AtomicU32::new(0),
        });

        let handle = Poller::spawn(
            source.clone(),
            TaskId::new("t1"),
            ApiKey::new("k"),
            fast_config(),
        );

        // Wait until the query is in flight, then cancel.
        entered.notified().await;
        handle.cancel();

        let updates = handle.updates();
        let err = handle.join().await.unwrap_err();
        assert!(matches!(err, PollError::Cancelled));

        // No snapshot was applied and no further query was issued.
        assert!(updates.borrow().is_none());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
